use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::AppResult;
use crate::search::repo;
use crate::state::AppState;
use crate::wishlists::repo::Occasion;

const RESULT_LIMIT: i64 = 5;
const MIN_QUERY_LEN: usize = 2;

pub fn search_routes() -> Router<AppState> {
    Router::new().route("/searchbar", get(searchbar))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResult {
    pub id: Uuid,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WishlistOwner {
    pub id: Uuid,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WishlistResult {
    pub id: Uuid,
    pub title: String,
    pub occasion: Occasion,
    pub user: WishlistOwner,
}

#[derive(Debug, Serialize, Default)]
pub struct SearchResponse {
    pub users: Vec<UserResult>,
    pub wishlists: Vec<WishlistResult>,
}

#[instrument(skip(state))]
async fn searchbar(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let query = params.q.unwrap_or_default();
    if query.chars().count() < MIN_QUERY_LEN {
        return Ok(Json(SearchResponse::default()));
    }

    let users = repo::search_users(&state.db, &query, RESULT_LIMIT).await?;
    let wishlists = repo::search_wishlists(&state.db, &query, RESULT_LIMIT).await?;

    Ok(Json(SearchResponse {
        users: users
            .into_iter()
            .map(|u| UserResult {
                id: u.id,
                name: u.name,
                image: u.image,
            })
            .collect(),
        wishlists: wishlists
            .into_iter()
            .map(|w| WishlistResult {
                id: w.id,
                title: w.title,
                occasion: w.occasion,
                user: WishlistOwner {
                    id: w.owner_id,
                    name: w.owner_name,
                },
            })
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_response_serializes_both_lists() {
        let json = serde_json::to_string(&SearchResponse::default()).unwrap();
        assert_eq!(json, r#"{"users":[],"wishlists":[]}"#);
    }
}
