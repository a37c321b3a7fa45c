use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::dto::is_valid_email;
use crate::error::{AppError, FieldError};
use crate::users::repo::User;
use crate::wishlists::dto::ProfileWishlist;

/// User as exposed to clients. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

/// Request body for profile settings update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfileUpdate, AppError> {
        let mut errors = Vec::new();

        let name = self.name.unwrap_or_default().trim().to_string();
        if name.len() < 2 || name.len() > 50 {
            errors.push(FieldError::new(
                "name",
                "Name must be between 2 and 50 characters",
            ));
        }

        let email = self.email.unwrap_or_default().trim().to_lowercase();
        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Invalid email address"));
        }

        let image = self.image.filter(|i| !i.trim().is_empty());

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(ProfileUpdate { name, email, image })
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub success: bool,
    pub user: PublicUser,
}

/// Public profile page payload: display info plus the user's
/// wishlists with requester-shaped items.
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub name: Option<String>,
    pub image: Option<String>,
    pub wishlists: Vec<ProfileWishlist>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_drops_password_hash() {
        let json = serde_json::to_string(&PublicUser {
            id: Uuid::new_v4(),
            name: Some("Alice".into()),
            email: "alice@example.com".into(),
            image: None,
        })
        .unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("alice@example.com"));
    }

    #[test]
    fn update_rejects_short_name_and_bad_email() {
        let req = UpdateProfileRequest {
            name: Some("A".into()),
            email: Some("nope".into()),
            image: None,
        };
        match req.validate().unwrap_err() {
            AppError::Validation(details) => {
                assert!(details.iter().any(|d| d.field == "name"));
                assert!(details.iter().any(|d| d.field == "email"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn update_normalizes_email_and_keeps_image() {
        let req = UpdateProfileRequest {
            name: Some("Alice".into()),
            email: Some("Alice@Example.COM".into()),
            image: Some("https://img.example/a.png".into()),
        };
        let update = req.validate().expect("should validate");
        assert_eq!(update.email, "alice@example.com");
        assert_eq!(update.image.as_deref(), Some("https://img.example/a.png"));
    }

    #[test]
    fn update_blank_image_becomes_none() {
        let req = UpdateProfileRequest {
            name: Some("Alice".into()),
            email: Some("alice@example.com".into()),
            image: Some("  ".into()),
        };
        let update = req.validate().expect("should validate");
        assert!(update.image.is_none());
    }
}
