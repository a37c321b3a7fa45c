use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::{AuthUser, MaybeUser};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::wishlists::dto::{
    CreateItemRequest, CreateWishlistRequest, ExternalItemRequest, ItemForm, OwnerInfo,
    PublicWishlist, PurchaseHistoryEntry, PurchaseRequest, WishlistResponse, WishlistWithItems,
};
use crate::wishlists::repo::{ItemWithPurchaser, Wishlist, WishlistItem};
use crate::wishlists::visibility::{self, ItemView};

const PUBLIC_FEED_LIMIT: i64 = 10;

pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/wishlist",
            get(list_own).post(create_wishlist).delete(delete_wishlist),
        )
        .route("/wishlist/public", get(public_feed))
        .route("/wishlist/items", post(create_item))
        .route("/wishlist/items/purchase", post(purchase_item))
        .route("/wishlist/items/external", post(create_external_item))
        .route("/wishlist/items/:id", patch(update_item).delete(delete_item))
        .route("/purchases", get(purchase_history))
}

#[instrument(skip(state))]
async fn list_own(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<WishlistWithItems>>> {
    let wishlists = Wishlist::list_by_owner(&state.db, user_id).await?;
    let ids: Vec<Uuid> = wishlists.iter().map(|w| w.id).collect();
    let mut grouped = group_items(WishlistItem::list_for_wishlists(&state.db, &ids).await?);

    let payload = wishlists
        .into_iter()
        .map(|w| {
            let items = grouped
                .remove(&w.id)
                .unwrap_or_default()
                .into_iter()
                .map(|row| ItemView::from_row(row, Some(user_id), user_id))
                .collect();
            WishlistWithItems {
                wishlist: w.into(),
                items,
            }
        })
        .collect();
    Ok(Json(payload))
}

#[instrument(skip(state, payload))]
async fn create_wishlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateWishlistRequest>,
) -> AppResult<impl IntoResponse> {
    let new = payload.validate()?;
    let wishlist = Wishlist::create(
        &state.db,
        user_id,
        &new.title,
        new.description.as_deref(),
        new.occasion,
    )
    .await?;

    info!(user_id = %user_id, wishlist_id = %wishlist.id, "wishlist created");
    Ok((
        StatusCode::CREATED,
        Json(WishlistResponse::from(wishlist)),
    ))
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    id: Option<Uuid>,
}

#[instrument(skip(state))]
async fn delete_wishlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<DeleteParams>,
) -> AppResult<Json<serde_json::Value>> {
    let id = params
        .id
        .ok_or_else(|| AppError::validation("id", "Wishlist ID is required"))?;

    let wishlist = Wishlist::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Wishlist not found".into()))?;
    if wishlist.user_id != user_id {
        return Err(AppError::Forbidden(
            "Not authorized to delete this wishlist".into(),
        ));
    }

    Wishlist::delete_with_items(&state.db, id).await?;
    info!(user_id = %user_id, wishlist_id = %id, "wishlist deleted");
    Ok(Json(serde_json::json!({ "success": true })))
}

#[instrument(skip(state, payload))]
async fn create_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateItemRequest>,
) -> AppResult<impl IntoResponse> {
    let wishlist_id = payload
        .wishlist_id
        .ok_or_else(|| AppError::validation("wishlistId", "Wishlist ID must be provided"))?;
    let fields = payload.form.validate()?;

    // A non-owned wishlist reads the same as a missing one
    let owned = Wishlist::find_by_id(&state.db, wishlist_id)
        .await?
        .filter(|w| w.user_id == user_id);
    if owned.is_none() {
        return Err(AppError::NotFound("Wishlist not found".into()));
    }

    let item = WishlistItem::create(
        &state.db,
        wishlist_id,
        &fields.title,
        fields.description.as_deref(),
        fields.price,
        fields.url.as_deref(),
        fields.priority,
    )
    .await?;

    info!(user_id = %user_id, item_id = %item.id, "wishlist item created");
    Ok((
        StatusCode::CREATED,
        Json(ItemView::shaped(item, None, Some(user_id), user_id)),
    ))
}

#[instrument(skip(state, payload))]
async fn update_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<ItemForm>,
) -> AppResult<Json<ItemView>> {
    let fields = payload.validate()?;

    let found = WishlistItem::find_with_owner(&state.db, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".into()))?;
    if found.owner_id != user_id {
        return Err(AppError::Forbidden(
            "Not authorized to update this item".into(),
        ));
    }

    let item = WishlistItem::update_fields(
        &state.db,
        item_id,
        &fields.title,
        fields.description.as_deref(),
        fields.price,
        fields.url.as_deref(),
        fields.priority,
    )
    .await?;

    Ok(Json(ItemView::shaped(item, None, Some(user_id), user_id)))
}

#[instrument(skip(state))]
async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let found = WishlistItem::find_with_owner(&state.db, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".into()))?;
    if found.owner_id != user_id {
        return Err(AppError::Forbidden(
            "Not authorized to delete this item".into(),
        ));
    }

    WishlistItem::delete(&state.db, item_id).await?;
    info!(user_id = %user_id, item_id = %item_id, "wishlist item deleted");
    Ok(Json(serde_json::json!({ "success": true })))
}

#[instrument(skip(state, payload))]
async fn purchase_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<PurchaseRequest>,
) -> AppResult<Json<ItemView>> {
    let item_id = payload
        .item_id
        .ok_or_else(|| AppError::validation("itemId", "Item ID must be provided"))?;

    let found = WishlistItem::find_with_owner(&state.db, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".into()))?;
    visibility::authorize_transition(&found.item, found.owner_id, user_id, payload.cancel)?;

    let purchased_by = if payload.cancel { None } else { Some(user_id) };
    WishlistItem::set_purchased(&state.db, item_id, purchased_by).await?;

    let row = WishlistItem::find_with_purchaser(&state.db, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".into()))?;

    info!(
        user_id = %user_id,
        item_id = %item_id,
        cancel = payload.cancel,
        "purchase state changed"
    );
    Ok(Json(ItemView::from_row(row, Some(user_id), found.owner_id)))
}

#[instrument(skip(state, payload))]
async fn create_external_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ExternalItemRequest>,
) -> AppResult<impl IntoResponse> {
    let fields = payload.validate()?;

    let wishlist = Wishlist::find_by_id(&state.db, fields.wishlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Wishlist not found".into()))?;
    if wishlist.user_id == user_id {
        return Err(AppError::Forbidden(
            "Cannot add external items to your own wishlist".into(),
        ));
    }

    let item = WishlistItem::create_external(
        &state.db,
        fields.wishlist_id,
        &fields.title,
        fields.description.as_deref(),
        fields.price,
        user_id,
    )
    .await?;

    let row = WishlistItem::find_with_purchaser(&state.db, item.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".into()))?;

    info!(user_id = %user_id, item_id = %item.id, "external item added");
    Ok((
        StatusCode::CREATED,
        Json(ItemView::from_row(row, Some(user_id), wishlist.user_id)),
    ))
}

#[instrument(skip(state))]
async fn public_feed(
    State(state): State<AppState>,
    MaybeUser(requester): MaybeUser,
) -> AppResult<impl IntoResponse> {
    let rows = Wishlist::public_feed(&state.db, requester, PUBLIC_FEED_LIMIT).await?;
    let ids: Vec<Uuid> = rows.iter().map(|r| r.wishlist.id).collect();
    let mut grouped = group_items(WishlistItem::list_for_wishlists(&state.db, &ids).await?);

    let payload: Vec<PublicWishlist> = rows
        .into_iter()
        .map(|r| {
            let owner = r.wishlist.user_id;
            let items = grouped
                .remove(&r.wishlist.id)
                .unwrap_or_default()
                .into_iter()
                .map(|row| ItemView::from_row(row, requester, owner))
                .collect();
            PublicWishlist {
                id: r.wishlist.id,
                title: r.wishlist.title,
                description: r.wishlist.description,
                occasion: r.wishlist.occasion,
                created_at: r.wishlist.created_at,
                user: OwnerInfo {
                    id: owner,
                    name: r.owner_name,
                    image: r.owner_image,
                },
                items,
            }
        })
        .collect();

    Ok((
        [(header::CACHE_CONTROL, "public, max-age=60")],
        Json(payload),
    ))
}

#[instrument(skip(state))]
async fn purchase_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<PurchaseHistoryEntry>>> {
    let rows = WishlistItem::purchase_history(&state.db, user_id).await?;
    let payload = rows
        .into_iter()
        .map(|r| PurchaseHistoryEntry {
            id: r.id,
            title: r.title,
            description: r.description,
            price: r.price,
            url: r.url,
            wishlist_title: r.wishlist_title,
            owner_name: r.owner_name.unwrap_or_else(|| "Unknown user".into()),
            created_at: r.created_at,
        })
        .collect();
    Ok(Json(payload))
}

pub(crate) fn group_items(
    rows: Vec<ItemWithPurchaser>,
) -> HashMap<Uuid, Vec<ItemWithPurchaser>> {
    let mut grouped: HashMap<Uuid, Vec<ItemWithPurchaser>> = HashMap::new();
    for row in rows {
        grouped.entry(row.item.wishlist_id).or_default().push(row);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn row(wishlist_id: Uuid) -> ItemWithPurchaser {
        let now = OffsetDateTime::now_utc();
        ItemWithPurchaser {
            item: crate::wishlists::repo::WishlistItem {
                id: Uuid::new_v4(),
                wishlist_id,
                title: "Socks".into(),
                description: None,
                price: None,
                url: None,
                priority: None,
                purchased: false,
                purchased_by: None,
                is_external: false,
                created_at: now,
                updated_at: now,
            },
            purchaser_name: None,
            purchaser_image: None,
        }
    }

    #[test]
    fn group_items_partitions_by_wishlist() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let grouped = group_items(vec![row(a), row(b), row(a)]);
        assert_eq!(grouped[&a].len(), 2);
        assert_eq!(grouped[&b].len(), 1);
        assert!(grouped.get(&Uuid::new_v4()).is_none());
    }
}
