use axum::Router;

use crate::state::AppState;

pub mod csrf;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod rate_limit;
pub mod session;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
