pub mod health;
pub use self::health::{health, root};

pub mod send_otp;
pub use self::send_otp::send_otp;

pub mod verify_otp;
pub use self::verify_otp::verify_otp;

pub mod rate_limit;

mod error;
pub use self::error::ApiError;

#[cfg(test)]
pub(crate) mod test_support;

// common functions for the handlers
use axum::http::HeaderMap;
use regex::Regex;

/// Permissive email shape check: something@something.something. Deliberately
/// not an RFC validator; the identity provider is the authority.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Client identity for rate limiting: first `x-forwarded-for` entry,
/// falling back to `x-real-ip`.
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(std::string::ToString::to_string)
}
