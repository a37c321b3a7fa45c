use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldError};
use crate::users::dto::PublicUser;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated login credentials, email normalized to lowercase.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(self) -> Result<Credentials, AppError> {
        let mut errors = Vec::new();

        let email = self.email.unwrap_or_default().trim().to_lowercase();
        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Invalid email address"));
        }

        let password = self.password.unwrap_or_default().trim().to_string();
        if password.len() < 8 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 8 characters",
            ));
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(Credentials { email, password })
    }
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub csrf_token: Option<String>,
}

#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub csrf_token: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, AppError> {
        let mut errors = Vec::new();

        let email = self.email.unwrap_or_default().trim().to_lowercase();
        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Invalid email address"));
        }

        let password = self.password.unwrap_or_default().trim().to_string();
        if password.len() < 8 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 8 characters",
            ));
        }

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let csrf_token = self.csrf_token.unwrap_or_default();
        if csrf_token.is_empty() {
            errors.push(FieldError::new("csrfToken", "Missing CSRF token"));
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(Registration {
            email,
            password,
            name,
            csrf_token,
        })
    }
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct CsrfResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("user@host"));
    }

    #[test]
    fn login_normalizes_email() {
        let req = LoginRequest {
            email: Some("  User@Example.COM ".into()),
            password: Some("password123".into()),
        };
        let creds = req.validate().expect("should validate");
        assert_eq!(creds.email, "user@example.com");
    }

    #[test]
    fn login_rejects_short_password_and_bad_email() {
        let req = LoginRequest {
            email: Some("bad".into()),
            password: Some("short".into()),
        };
        let err = req.validate().unwrap_err();
        match err {
            AppError::Validation(details) => {
                assert_eq!(details.len(), 2);
                assert!(details.iter().any(|d| d.field == "email"));
                assert!(details.iter().any(|d| d.field == "password"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_requires_csrf_token() {
        let req = RegisterRequest {
            email: Some("user@example.com".into()),
            password: Some("password123".into()),
            name: None,
            csrf_token: None,
        };
        let err = req.validate().unwrap_err();
        match err {
            AppError::Validation(details) => {
                assert!(details.iter().any(|d| d.field == "csrfToken"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_blank_name_becomes_none() {
        let req = RegisterRequest {
            email: Some("user@example.com".into()),
            password: Some("password123".into()),
            name: Some("   ".into()),
            csrf_token: Some("tok".into()),
        };
        let reg = req.validate().expect("should validate");
        assert!(reg.name.is_none());
    }
}
