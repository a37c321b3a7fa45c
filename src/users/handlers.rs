use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::{AuthUser, MaybeUser};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::users::dto::{MeResponse, ProfileUpdateResponse, PublicProfile, UpdateProfileRequest};
use crate::users::repo::User;
use crate::wishlists::dto::ProfileWishlist;
use crate::wishlists::handlers::group_items;
use crate::wishlists::repo::{Wishlist, WishlistItem};
use crate::wishlists::visibility::ItemView;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me).put(update_me))
        .route("/users/:user_id", get(public_profile))
}

#[instrument(skip(state))]
async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(MeResponse { user: user.into() }))
}

#[instrument(skip(state, payload))]
async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileUpdateResponse>> {
    let update = payload.validate()?;

    // The new email may already belong to someone else
    if let Some(existing) = User::find_by_email(&state.db, &update.email).await? {
        if existing.id != user_id {
            return Err(AppError::Conflict("Email is already in use".into()));
        }
    }

    let user = User::update_profile(
        &state.db,
        user_id,
        &update.name,
        &update.email,
        update.image.as_deref(),
    )
    .await?;

    info!(user_id = %user_id, "profile updated");
    Ok(Json(ProfileUpdateResponse {
        success: true,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
async fn public_profile(
    State(state): State<AppState>,
    MaybeUser(requester): MaybeUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<PublicProfile>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let wishlists = Wishlist::list_by_owner(&state.db, user_id).await?;
    let ids: Vec<Uuid> = wishlists.iter().map(|w| w.id).collect();
    let mut grouped = group_items(WishlistItem::list_for_wishlists(&state.db, &ids).await?);

    let wishlists = wishlists
        .into_iter()
        .map(|w| {
            let items = grouped
                .remove(&w.id)
                .unwrap_or_default()
                .into_iter()
                .map(|row| ItemView::from_row(row, requester, user_id))
                .collect();
            ProfileWishlist {
                id: w.id,
                title: w.title,
                description: w.description,
                occasion: w.occasion,
                items,
            }
        })
        .collect();

    Ok(Json(PublicProfile {
        name: user.name,
        image: user.image,
        wishlists,
    }))
}
