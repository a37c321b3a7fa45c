use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::auth::session::{SessionKeys, SESSION_COOKIE};
use crate::error::AppError;

/// Extracts and validates the session cookie, returning the user ID.
/// Rejects with 401 when the cookie is missing or the token fails
/// verification.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => {
                warn!("missing or invalid session");
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Like [`AuthUser`] but never rejects; anonymous requests resolve to
/// `None`. Used by routes that shape their response per requester.
pub struct MaybeUser(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(session_user(parts, state).await))
    }
}

async fn session_user<S>(parts: &mut Parts, state: &S) -> Option<Uuid>
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    let jar = CookieJar::from_request_parts(parts, state).await.ok()?;
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    let keys = SessionKeys::from_ref(state);
    keys.verify(&token).map(|claims| claims.sub)
}
