use std::time::Duration;

use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument, warn};

use crate::auth::csrf::{self, CSRF_COOKIE};
use crate::auth::dto::{AuthResponse, CsrfResponse, LoginRequest, RegisterRequest};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{self, SessionKeys};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::users::repo::User;

const LOGIN_MAX_ATTEMPTS: u32 = 3;
const REGISTER_MAX_ATTEMPTS: u32 = 5;
const RATE_WINDOW: Duration = Duration::from_secs(60);

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/csrf", get(issue_csrf))
        .route("/logout", post(logout))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let ip = client_ip(&headers);
    if !state
        .rate_limiter
        .check(&format!("register:{ip}"), REGISTER_MAX_ATTEMPTS, RATE_WINDOW)
    {
        warn!(%ip, "registration rate limited");
        return Err(AppError::RateLimited(
            "Too many attempts. Please try again later.".into(),
        ));
    }

    let registration = payload.validate()?;

    let csrf_ok = jar
        .get(CSRF_COOKIE)
        .map(|c| csrf::verify(c.value(), &registration.csrf_token))
        .unwrap_or(false);
    if !csrf_ok {
        warn!("csrf validation failed");
        return Err(AppError::Forbidden("Invalid form submission".into()));
    }

    if User::find_by_email(&state.db, &registration.email)
        .await?
        .is_some()
    {
        warn!(email = %registration.email, "registration duplicate email");
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let hash = hash_password(&registration.password)?;
    let user = User::create(
        &state.db,
        &registration.email,
        &hash,
        registration.name.as_deref(),
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { user: user.into() }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let ip = client_ip(&headers);
    if !state
        .rate_limiter
        .check(&format!("login:{ip}"), LOGIN_MAX_ATTEMPTS, RATE_WINDOW)
    {
        warn!(%ip, "login rate limited");
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".into(),
        ));
    }

    let creds = payload.validate()?;

    // Unknown email and bad password are indistinguishable to the client
    let Some(user) = User::find_by_email(&state.db, &creds.email).await? else {
        warn!(email = %creds.email, "login unknown email");
        return Err(AppError::Unauthorized);
    };
    if !verify_password(&creds.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized);
    }

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    let cookie = keys.session_cookie(token);

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((jar.add(cookie), Json(AuthResponse { user: user.into() })))
}

#[instrument(skip(jar))]
pub async fn issue_csrf(jar: CookieJar) -> impl IntoResponse {
    let issued = csrf::issue();
    (
        jar.add(csrf::secret_cookie(issued.secret)),
        Json(CsrfResponse {
            token: issued.token,
        }),
    )
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(session::removal_cookie()),
        Json(serde_json::json!({ "success": true })),
    )
}

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "127.0.0.1".into())
}
