use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Request-terminal failures surfaced as an HTTP status plus a short
/// message. Nothing here is retried.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    /// Missing or malformed email in an issuance request.
    InvalidInput,
    /// Reset issuance for an email the provider does not know.
    /// 500 rather than 404, kept as-is; see DESIGN.md.
    IdentityNotFound,
    /// Passcode email dispatch failed; the stored record stays put.
    NotificationFailed,
    /// No record for the email, or the presented code does not match.
    InvalidOtp,
    /// The record existed but was past its expiry.
    OtpExpired,
    /// Reset verification without a new password.
    InvalidRequest,
    /// The identity provider failed; carries its message.
    Provider(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::InvalidOtp | Self::InvalidRequest => {
                StatusCode::BAD_REQUEST
            }
            Self::OtpExpired => StatusCode::GONE,
            Self::IdentityNotFound | Self::NotificationFailed | Self::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput => "Invalid email".to_string(),
            Self::IdentityNotFound => "Email not registered".to_string(),
            Self::NotificationFailed => "Failed to send OTP".to_string(),
            Self::InvalidOtp => "Invalid OTP".to_string(),
            Self::OtpExpired => "OTP expired".to_string(),
            Self::InvalidRequest => "Invalid request".to_string(),
            Self::Provider(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}
