use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "occasion")]
pub enum Occasion {
    Christmas,
    Birthday,
    #[sqlx(rename = "Father's Day")]
    #[serde(rename = "Father's Day")]
    FathersDay,
    #[sqlx(rename = "Mother's Day")]
    #[serde(rename = "Mother's Day")]
    MothersDay,
    #[sqlx(rename = "Valentine's Day")]
    #[serde(rename = "Valentine's Day")]
    ValentinesDay,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "priority", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wishlist {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub occasion: Occasion,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WishlistItem {
    pub id: Uuid,
    pub wishlist_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub url: Option<String>,
    pub priority: Option<Priority>,
    pub purchased: bool,
    pub purchased_by: Option<Uuid>,
    pub is_external: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Item joined with its purchaser's display fields (null when
/// unpurchased or the purchaser has no profile data).
#[derive(Debug, FromRow)]
pub struct ItemWithPurchaser {
    #[sqlx(flatten)]
    pub item: WishlistItem,
    pub purchaser_name: Option<String>,
    pub purchaser_image: Option<String>,
}

/// Item joined with the owning wishlist's owner, for ownership checks.
#[derive(Debug, FromRow)]
pub struct ItemWithOwner {
    #[sqlx(flatten)]
    pub item: WishlistItem,
    pub owner_id: Uuid,
}

/// Public feed row: wishlist plus its owner's display fields.
#[derive(Debug, FromRow)]
pub struct WishlistWithOwner {
    #[sqlx(flatten)]
    pub wishlist: Wishlist,
    pub owner_name: Option<String>,
    pub owner_image: Option<String>,
}

/// Purchase history row: item plus wishlist title and owner name.
#[derive(Debug, FromRow)]
pub struct PurchaseRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub url: Option<String>,
    pub created_at: OffsetDateTime,
    pub wishlist_title: String,
    pub owner_name: Option<String>,
}

const ITEM_COLUMNS: &str = "i.id, i.wishlist_id, i.title, i.description, i.price, i.url, \
     i.priority, i.purchased, i.purchased_by, i.is_external, i.created_at, i.updated_at";

impl Wishlist {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        description: Option<&str>,
        occasion: Occasion,
    ) -> anyhow::Result<Wishlist> {
        let wishlist = sqlx::query_as::<_, Wishlist>(
            r#"
            INSERT INTO wishlists (user_id, title, description, occasion)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, occasion, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(occasion)
        .fetch_one(db)
        .await?;
        Ok(wishlist)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Wishlist>> {
        let wishlist = sqlx::query_as::<_, Wishlist>(
            r#"
            SELECT id, user_id, title, description, occasion, created_at, updated_at
            FROM wishlists
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(wishlist)
    }

    pub async fn list_by_owner(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Wishlist>> {
        let rows = sqlx::query_as::<_, Wishlist>(
            r#"
            SELECT id, user_id, title, description, occasion, created_at, updated_at
            FROM wishlists
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Newest wishlists from other users, with owner display fields.
    pub async fn public_feed(
        db: &PgPool,
        exclude_user: Option<Uuid>,
        limit: i64,
    ) -> anyhow::Result<Vec<WishlistWithOwner>> {
        let rows = sqlx::query_as::<_, WishlistWithOwner>(
            r#"
            SELECT w.id, w.user_id, w.title, w.description, w.occasion,
                   w.created_at, w.updated_at,
                   u.name AS owner_name, u.image AS owner_image
            FROM wishlists w
            JOIN users u ON u.id = w.user_id
            WHERE $1::uuid IS NULL OR w.user_id <> $1
            ORDER BY w.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(exclude_user)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Remove a wishlist and all of its items in one transaction, so a
    /// failure mid-way leaves neither partially applied.
    pub async fn delete_with_items(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM wishlist_items WHERE wishlist_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM wishlists WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

impl WishlistItem {
    pub async fn create(
        db: &PgPool,
        wishlist_id: Uuid,
        title: &str,
        description: Option<&str>,
        price: Option<f64>,
        url: Option<&str>,
        priority: Option<Priority>,
    ) -> anyhow::Result<WishlistItem> {
        let item = sqlx::query_as::<_, WishlistItem>(
            r#"
            INSERT INTO wishlist_items (wishlist_id, title, description, price, url, priority)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, wishlist_id, title, description, price, url, priority,
                      purchased, purchased_by, is_external, created_at, updated_at
            "#,
        )
        .bind(wishlist_id)
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(url)
        .bind(priority)
        .fetch_one(db)
        .await?;
        Ok(item)
    }

    /// Insert an item that is already purchased by `purchaser`,
    /// without the owner ever seeing it as requested.
    pub async fn create_external(
        db: &PgPool,
        wishlist_id: Uuid,
        title: &str,
        description: Option<&str>,
        price: Option<f64>,
        purchaser: Uuid,
    ) -> anyhow::Result<WishlistItem> {
        let item = sqlx::query_as::<_, WishlistItem>(
            r#"
            INSERT INTO wishlist_items
                (wishlist_id, title, description, price, purchased, purchased_by, is_external)
            VALUES ($1, $2, $3, $4, TRUE, $5, TRUE)
            RETURNING id, wishlist_id, title, description, price, url, priority,
                      purchased, purchased_by, is_external, created_at, updated_at
            "#,
        )
        .bind(wishlist_id)
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(purchaser)
        .fetch_one(db)
        .await?;
        Ok(item)
    }

    pub async fn find_with_owner(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ItemWithOwner>> {
        let row = sqlx::query_as::<_, ItemWithOwner>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}, w.user_id AS owner_id
            FROM wishlist_items i
            JOIN wishlists w ON w.id = i.wishlist_id
            WHERE i.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_with_purchaser(
        db: &PgPool,
        id: Uuid,
    ) -> anyhow::Result<Option<ItemWithPurchaser>> {
        let row = sqlx::query_as::<_, ItemWithPurchaser>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}, u.name AS purchaser_name, u.image AS purchaser_image
            FROM wishlist_items i
            LEFT JOIN users u ON u.id = i.purchased_by
            WHERE i.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list_for_wishlists(
        db: &PgPool,
        wishlist_ids: &[Uuid],
    ) -> anyhow::Result<Vec<ItemWithPurchaser>> {
        let rows = sqlx::query_as::<_, ItemWithPurchaser>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}, u.name AS purchaser_name, u.image AS purchaser_image
            FROM wishlist_items i
            LEFT JOIN users u ON u.id = i.purchased_by
            WHERE i.wishlist_id = ANY($1)
            ORDER BY i.created_at
            "#
        ))
        .bind(wishlist_ids)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn update_fields(
        db: &PgPool,
        id: Uuid,
        title: &str,
        description: Option<&str>,
        price: Option<f64>,
        url: Option<&str>,
        priority: Option<Priority>,
    ) -> anyhow::Result<WishlistItem> {
        let item = sqlx::query_as::<_, WishlistItem>(
            r#"
            UPDATE wishlist_items
            SET title = $2, description = $3, price = $4, url = $5, priority = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING id, wishlist_id, title, description, price, url, priority,
                      purchased, purchased_by, is_external, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(url)
        .bind(priority)
        .fetch_one(db)
        .await?;
        Ok(item)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM wishlist_items WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Flip purchase state; `purchased` tracks whether a purchaser is
    /// recorded, keeping the CHECK constraint satisfied.
    pub async fn set_purchased(
        db: &PgPool,
        id: Uuid,
        purchased_by: Option<Uuid>,
    ) -> anyhow::Result<WishlistItem> {
        let item = sqlx::query_as::<_, WishlistItem>(
            r#"
            UPDATE wishlist_items
            SET purchased = $2::uuid IS NOT NULL, purchased_by = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, wishlist_id, title, description, price, url, priority,
                      purchased, purchased_by, is_external, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(purchased_by)
        .fetch_one(db)
        .await?;
        Ok(item)
    }

    /// Items the given user has purchased, newest activity first.
    pub async fn purchase_history(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<PurchaseRow>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT i.id, i.title, i.description, i.price, i.url, i.created_at,
                   w.title AS wishlist_title, u.name AS owner_name
            FROM wishlist_items i
            JOIN wishlists w ON w.id = i.wishlist_id
            JOIN users u ON u.id = w.user_id
            WHERE i.purchased_by = $1 AND i.purchased
            ORDER BY i.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
