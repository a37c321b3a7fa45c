use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::wishlists::repo::Occasion;

#[derive(Debug, FromRow)]
pub struct UserHit {
    pub id: Uuid,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct WishlistHit {
    pub id: Uuid,
    pub title: String,
    pub occasion: Occasion,
    pub owner_id: Uuid,
    pub owner_name: Option<String>,
}

/// Top users whose display name contains `query`, case-insensitive.
pub async fn search_users(db: &PgPool, query: &str, limit: i64) -> anyhow::Result<Vec<UserHit>> {
    let rows = sqlx::query_as::<_, UserHit>(
        r#"
        SELECT id, name, image
        FROM users
        WHERE name ILIKE '%' || $1 || '%'
        ORDER BY name
        LIMIT $2
        "#,
    )
    .bind(query)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Top wishlists matching `query` on their own title or on the
/// owner's display name.
pub async fn search_wishlists(
    db: &PgPool,
    query: &str,
    limit: i64,
) -> anyhow::Result<Vec<WishlistHit>> {
    let rows = sqlx::query_as::<_, WishlistHit>(
        r#"
        SELECT w.id, w.title, w.occasion, u.id AS owner_id, u.name AS owner_name
        FROM wishlists w
        JOIN users u ON u.id = w.user_id
        WHERE w.title ILIKE '%' || $1 || '%' OR u.name ILIKE '%' || $1 || '%'
        ORDER BY w.title
        LIMIT $2
        "#,
    )
    .bind(query)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
