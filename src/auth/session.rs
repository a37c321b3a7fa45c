use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Payload carried by the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,  // user ID
    pub iat: usize, // issued at
    pub exp: usize, // expiration time
}

/// Holds session signing and verification keys with config data.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl_days: i64,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let secret = state.config.session.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_days: state.config.session.ttl_days,
        }
    }
}

impl SessionKeys {
    /// Sign a session token for the given user.
    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::days(self.ttl_days);
        let claims = SessionClaims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session signed");
        Ok(token)
    }

    /// Verify a session token. Every failure class (malformed, bad
    /// signature, expired) resolves to `None` so callers treat it as
    /// "no session" rather than an error.
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        match decode::<SessionClaims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => {
                debug!(user_id = %data.claims.sub, "session verified");
                Some(data.claims)
            }
            Err(e) => {
                debug!(error = %e, "session token rejected");
                None
            }
        }
    }

    /// Build the session cookie holding a freshly signed token.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .max_age(TimeDuration::days(self.ttl_days))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Lax)
            .build()
    }
}

/// Expired cookie that removes the session on the client.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE)
        .path("/")
        .max_age(TimeDuration::ZERO)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRef;

    fn make_keys() -> SessionKeys {
        let state = AppState::fake();
        SessionKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign session");
        let claims = keys.verify(&token).expect("verify session");
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let token = keys.sign(Uuid::new_v4()).expect("sign session");

        let other = SessionKeys {
            encoding: EncodingKey::from_secret(b"another-secret"),
            decoding: DecodingKey::from_secret(b"another-secret"),
            ttl_days: 7,
        };
        assert!(other.verify(&token).is_none());
    }

    #[tokio::test]
    async fn verify_rejects_malformed_token() {
        let keys = make_keys();
        assert!(keys.verify("not-a-token").is_none());
        assert!(keys.verify("").is_none());
    }

    #[tokio::test]
    async fn verify_rejects_expired_token() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc();
        // Well past the default validation leeway
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            iat: (now.unix_timestamp() - 7200) as usize,
            exp: (now.unix_timestamp() - 3600) as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_none());
    }

    #[tokio::test]
    async fn session_cookie_flags() {
        let keys = make_keys();
        let cookie = keys.session_cookie("token".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(TimeDuration::days(7)));
    }
}
