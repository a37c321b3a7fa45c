use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const CSRF_COOKIE: &str = "csrf_secret";

const SECRET_LEN: usize = 32;
const SALT_LEN: usize = 8;

/// A freshly issued CSRF pair: the secret goes into an HTTP-only
/// cookie, the public token is embedded in the form.
#[derive(Debug)]
pub struct IssuedCsrf {
    pub secret: String,
    pub token: String,
}

/// Generate a new secret and a public token derived from it.
pub fn issue() -> IssuedCsrf {
    let mut secret_bytes = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut secret_bytes);
    let secret = URL_SAFE_NO_PAD.encode(secret_bytes);

    let mut salt_bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = URL_SAFE_NO_PAD.encode(salt_bytes);

    let token = derive_token(&secret, &salt);
    IssuedCsrf { secret, token }
}

/// Check a submitted token against the secret from the cookie.
pub fn verify(secret: &str, token: &str) -> bool {
    let Some((salt, mac_b64)) = token.split_once('.') else {
        return false;
    };
    let Ok(mac_bytes) = URL_SAFE_NO_PAD.decode(mac_b64) else {
        return false;
    };
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key size");
    mac.update(salt.as_bytes());
    mac.verify_slice(&mac_bytes).is_ok()
}

fn derive_token(secret: &str, salt: &str) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key size");
    mac.update(salt.as_bytes());
    let digest = mac.finalize().into_bytes();
    format!("{salt}.{}", URL_SAFE_NO_PAD.encode(digest))
}

/// Build the cookie carrying the server-held CSRF secret.
pub fn secret_cookie(secret: String) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, secret))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify_roundtrip() {
        let issued = issue();
        assert!(verify(&issued.secret, &issued.token));
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let a = issue();
        let b = issue();
        assert_ne!(a.token, b.token);
        assert_ne!(a.secret, b.secret);
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let a = issue();
        let b = issue();
        assert!(!verify(&b.secret, &a.token));
    }

    #[test]
    fn verify_rejects_malformed_token() {
        let issued = issue();
        assert!(!verify(&issued.secret, "no-separator"));
        assert!(!verify(&issued.secret, ""));
        assert!(!verify(&issued.secret, "salt.!!!not-base64!!!"));
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let issued = issue();
        let mut tampered = issued.token.clone();
        tampered.push('A');
        assert!(!verify(&issued.secret, &tampered));
    }

    #[test]
    fn secret_cookie_flags() {
        let cookie = secret_cookie("s3cret".into());
        assert_eq!(cookie.name(), CSRF_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }
}
