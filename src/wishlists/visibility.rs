use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::wishlists::repo::{ItemWithPurchaser, Priority, WishlistItem};

/// Purchaser display fields attached to a purchased item.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaserInfo {
    pub name: Option<String>,
    pub image: Option<String>,
}

/// A wishlist item as serialized in responses. The purchaser fields
/// are shaped per requester: the list owner sees that an item is
/// purchased but never by whom.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: Uuid,
    pub wishlist_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub url: Option<String>,
    pub priority: Option<Priority>,
    pub purchased: bool,
    pub purchased_by: Option<Uuid>,
    pub purchased_by_user: Option<PurchaserInfo>,
    pub is_external: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl ItemView {
    /// Shape an item for `requester` against the wishlist `owner`.
    /// Owners keep `purchased` (completion progress) but lose every
    /// trace of purchaser identity; everyone else sees it all.
    pub fn shaped(
        item: WishlistItem,
        purchaser: Option<PurchaserInfo>,
        requester: Option<Uuid>,
        owner: Uuid,
    ) -> Self {
        let is_owner = requester == Some(owner);
        Self {
            id: item.id,
            wishlist_id: item.wishlist_id,
            title: item.title,
            description: item.description,
            price: item.price,
            url: item.url,
            priority: item.priority,
            purchased: item.purchased,
            purchased_by: if is_owner { None } else { item.purchased_by },
            purchased_by_user: if is_owner { None } else { purchaser },
            is_external: item.is_external,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }

    pub fn from_row(row: ItemWithPurchaser, requester: Option<Uuid>, owner: Uuid) -> Self {
        let purchaser = row.item.purchased_by.map(|_| PurchaserInfo {
            name: row.purchaser_name,
            image: row.purchaser_image,
        });
        Self::shaped(row.item, purchaser, requester, owner)
    }
}

/// Authorize a purchase-state transition before any write.
///
/// Available -> Purchased: any authenticated non-owner.
/// Purchased -> Available: only the recorded purchaser.
pub fn authorize_transition(
    item: &WishlistItem,
    owner: Uuid,
    requester: Uuid,
    cancel: bool,
) -> Result<(), AppError> {
    if owner == requester {
        return Err(AppError::Forbidden(
            "Cannot mark your own items as purchased".into(),
        ));
    }
    if cancel {
        if item.purchased_by != Some(requester) {
            return Err(AppError::Forbidden(
                "Only the original purchaser can cancel".into(),
            ));
        }
    } else if item.purchased {
        return Err(AppError::Conflict("Item is already purchased".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn item(wishlist_id: Uuid, purchased_by: Option<Uuid>) -> WishlistItem {
        let now = OffsetDateTime::now_utc();
        WishlistItem {
            id: Uuid::new_v4(),
            wishlist_id,
            title: "Robot vacuum".into(),
            description: None,
            price: Some(100.0),
            url: None,
            priority: Some(Priority::High),
            purchased: purchased_by.is_some(),
            purchased_by,
            is_external: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_sees_purchased_flag_but_never_purchaser() {
        let owner = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        let view = ItemView::shaped(
            item(Uuid::new_v4(), Some(buyer)),
            Some(PurchaserInfo {
                name: Some("Bob".into()),
                image: None,
            }),
            Some(owner),
            owner,
        );
        assert!(view.purchased);
        assert!(view.purchased_by.is_none());
        assert!(view.purchased_by_user.is_none());
    }

    #[test]
    fn non_owner_sees_purchaser_identity() {
        let owner = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        let view = ItemView::shaped(
            item(Uuid::new_v4(), Some(buyer)),
            Some(PurchaserInfo {
                name: Some("Bob".into()),
                image: Some("bob.png".into()),
            }),
            Some(buyer),
            owner,
        );
        assert_eq!(view.purchased_by, Some(buyer));
        let purchaser = view.purchased_by_user.expect("purchaser visible");
        assert_eq!(purchaser.name.as_deref(), Some("Bob"));
        assert_eq!(purchaser.image.as_deref(), Some("bob.png"));
    }

    #[test]
    fn anonymous_requester_is_treated_as_non_owner() {
        let owner = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        let view = ItemView::shaped(item(Uuid::new_v4(), Some(buyer)), None, None, owner);
        assert_eq!(view.purchased_by, Some(buyer));
    }

    #[test]
    fn owner_serialization_omits_purchaser_fields_content() {
        let owner = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        let view = ItemView::shaped(
            item(Uuid::new_v4(), Some(buyer)),
            Some(PurchaserInfo {
                name: Some("Bob".into()),
                image: None,
            }),
            Some(owner),
            owner,
        );
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains(&buyer.to_string()));
        assert!(!json.contains("Bob"));
        assert!(json.contains("\"purchased\":true"));
    }

    #[test]
    fn owner_cannot_purchase_own_item() {
        let owner = Uuid::new_v4();
        let it = item(Uuid::new_v4(), None);
        let err = authorize_transition(&it, owner, owner, false).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn non_owner_may_purchase_available_item() {
        let owner = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        let it = item(Uuid::new_v4(), None);
        assert!(authorize_transition(&it, owner, buyer, false).is_ok());
    }

    #[test]
    fn double_purchase_is_a_conflict() {
        let owner = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let it = item(Uuid::new_v4(), Some(first));
        let err = authorize_transition(&it, owner, second, false).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn only_recorded_purchaser_may_cancel() {
        let owner = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let it = item(Uuid::new_v4(), Some(buyer));

        assert!(authorize_transition(&it, owner, buyer, true).is_ok());
        let err = authorize_transition(&it, owner, stranger, true).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn cancel_on_available_item_is_rejected() {
        let owner = Uuid::new_v4();
        let requester = Uuid::new_v4();
        let it = item(Uuid::new_v4(), None);
        let err = authorize_transition(&it, owner, requester, true).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
