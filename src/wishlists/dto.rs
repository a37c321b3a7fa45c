use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, FieldError};
use crate::wishlists::repo::{Occasion, Priority, Wishlist};
use crate::wishlists::visibility::ItemView;

/// Request body for creating a wishlist.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWishlistRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub occasion: Option<Occasion>,
}

#[derive(Debug)]
pub struct NewWishlist {
    pub title: String,
    pub description: Option<String>,
    pub occasion: Occasion,
}

impl CreateWishlistRequest {
    pub fn validate(self) -> Result<NewWishlist, AppError> {
        let mut errors = Vec::new();

        let title = self.title.unwrap_or_default().trim().to_string();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title.chars().count() > 25 {
            errors.push(FieldError::new("title", "Title cannot exceed 25 characters"));
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(d) = &description {
            if d.chars().count() > 75 {
                errors.push(FieldError::new(
                    "description",
                    "Description cannot exceed 75 characters",
                ));
            }
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(NewWishlist {
            title,
            description,
            occasion: self.occasion.unwrap_or(Occasion::Other),
        })
    }
}

/// Fields shared by item create and update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub url: Option<String>,
    pub priority: Option<Priority>,
}

#[derive(Debug)]
pub struct ItemFields {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub url: Option<String>,
    pub priority: Option<Priority>,
}

impl ItemForm {
    pub fn validate(self) -> Result<ItemFields, AppError> {
        let mut errors = Vec::new();

        let title = self.title.unwrap_or_default().trim().to_string();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title.chars().count() > 25 {
            errors.push(FieldError::new("title", "Title cannot exceed 25 characters"));
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(d) = &description {
            if d.chars().count() > 150 {
                errors.push(FieldError::new(
                    "description",
                    "Description cannot exceed 150 characters",
                ));
            }
        }

        if let Some(p) = self.price {
            if p < 0.0 {
                errors.push(FieldError::new("price", "Price cannot be negative"));
            } else if p > 10_000.0 {
                errors.push(FieldError::new("price", "Price is too high"));
            }
        }

        let url = self.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        if let Some(u) = &url {
            if u.chars().count() > 500 {
                errors.push(FieldError::new("url", "URL is too long"));
            } else if !is_http_url(u) {
                errors.push(FieldError::new("url", "Please enter a valid URL"));
            }
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(ItemFields {
            title,
            description,
            price: self.price,
            url,
            priority: self.priority,
        })
    }
}

fn is_http_url(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://"))
        && !url.contains(char::is_whitespace)
        && url.len() > "https://".len()
}

/// Request body for adding an item to one of the requester's lists.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub wishlist_id: Option<Uuid>,
    #[serde(flatten)]
    pub form: ItemForm,
}

/// Purchase or cancel transition request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub cancel: bool,
}

/// Pre-purchased item added by a non-owner.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalItemRequest {
    pub wishlist_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug)]
pub struct ExternalItemFields {
    pub wishlist_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
}

impl ExternalItemRequest {
    pub fn validate(self) -> Result<ExternalItemFields, AppError> {
        let mut errors = Vec::new();

        let wishlist_id = self.wishlist_id;
        if wishlist_id.is_none() {
            errors.push(FieldError::new("wishlistId", "Wishlist ID must be provided"));
        }

        let title = self.title.unwrap_or_default().trim().to_string();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title.chars().count() > 25 {
            errors.push(FieldError::new("title", "Title cannot exceed 25 characters"));
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(d) = &description {
            if d.chars().count() > 150 {
                errors.push(FieldError::new(
                    "description",
                    "Description cannot exceed 150 characters",
                ));
            }
        }

        if let Some(p) = self.price {
            if !(0.0..=10_000.0).contains(&p) {
                errors.push(FieldError::new("price", "Price must be between 0 and 10000"));
            }
        }

        match wishlist_id {
            Some(wishlist_id) if errors.is_empty() => Ok(ExternalItemFields {
                wishlist_id,
                title,
                description,
                price: self.price,
            }),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

/// A wishlist serialized for its owner, items already shaped.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub occasion: Occasion,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Wishlist> for WishlistResponse {
    fn from(w: Wishlist) -> Self {
        Self {
            id: w.id,
            user_id: w.user_id,
            title: w.title,
            description: w.description,
            occasion: w.occasion,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistWithItems {
    #[serde(flatten)]
    pub wishlist: WishlistResponse,
    pub items: Vec<ItemView>,
}

/// Owner display fields on public payloads.
#[derive(Debug, Serialize)]
pub struct OwnerInfo {
    pub id: Uuid,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicWishlist {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub occasion: Occasion,
    pub created_at: OffsetDateTime,
    pub user: OwnerInfo,
    pub items: Vec<ItemView>,
}

/// Wishlist as embedded in a public profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileWishlist {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub occasion: Occasion,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseHistoryEntry {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub url: Option<String>,
    pub wishlist_title: String,
    pub owner_name: String,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wishlist_title_required_and_capped() {
        let err = CreateWishlistRequest {
            title: None,
            description: None,
            occasion: None,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = CreateWishlistRequest {
            title: Some("x".repeat(26)),
            description: None,
            occasion: None,
        }
        .validate()
        .unwrap_err();
        match err {
            AppError::Validation(details) => assert_eq!(details[0].field, "title"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn wishlist_occasion_defaults_to_other() {
        let new = CreateWishlistRequest {
            title: Some("Christmas list".into()),
            description: None,
            occasion: None,
        }
        .validate()
        .expect("should validate");
        assert_eq!(new.occasion, Occasion::Other);
    }

    #[test]
    fn item_form_bounds() {
        let err = ItemForm {
            title: Some("Bike".into()),
            description: Some("y".repeat(151)),
            price: Some(10_001.0),
            url: Some("ftp://example.com".into()),
            priority: None,
        }
        .validate()
        .unwrap_err();
        match err {
            AppError::Validation(details) => {
                assert!(details.iter().any(|d| d.field == "description"));
                assert!(details.iter().any(|d| d.field == "price"));
                assert!(details.iter().any(|d| d.field == "url"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn item_form_accepts_optional_fields_absent() {
        let fields = ItemForm {
            title: Some("Bike".into()),
            description: None,
            price: None,
            url: None,
            priority: None,
        }
        .validate()
        .expect("should validate");
        assert_eq!(fields.title, "Bike");
        assert!(fields.price.is_none());
    }

    #[test]
    fn item_form_rejects_negative_price() {
        let err = ItemForm {
            title: Some("Bike".into()),
            description: None,
            price: Some(-1.0),
            url: None,
            priority: None,
        }
        .validate()
        .unwrap_err();
        match err {
            AppError::Validation(details) => assert_eq!(details[0].field, "price"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn external_item_requires_wishlist_id() {
        let err = ExternalItemRequest {
            wishlist_id: None,
            title: Some("Surprise".into()),
            description: None,
            price: None,
        }
        .validate()
        .unwrap_err();
        match err {
            AppError::Validation(details) => assert_eq!(details[0].field, "wishlistId"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn occasion_serde_uses_display_names() {
        let json = serde_json::to_string(&Occasion::FathersDay).unwrap();
        assert_eq!(json, "\"Father's Day\"");
        let back: Occasion = serde_json::from_str("\"Valentine's Day\"").unwrap();
        assert_eq!(back, Occasion::ValentinesDay);
    }

    #[test]
    fn priority_serde_is_uppercase() {
        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, "\"HIGH\"");
    }
}
