//! Passcode issuance endpoint.

use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};

use super::{valid_email, ApiError};
use crate::identity::IdentityProvider;
use crate::konfirmo::{
    email::{otp_message, Mailer},
    ApiConfig,
};
use crate::otp::{self, now_millis, store::OtpStore, OtpAction, OtpRecord};

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
    #[serde(default)]
    pub action: OtpAction,
}

/// Issue a passcode for `email` and dispatch it by mail.
///
/// Reset issuance first confirms the email is known to the identity
/// provider; nothing is stored or sent when it is not. A failed dispatch
/// leaves the stored record behind until the sweep or the next issuance
/// replaces it.
#[instrument(skip(store, identity, mailer, config, payload))]
pub async fn send_otp(
    Extension(store): Extension<Arc<OtpStore>>,
    Extension(identity): Extension<Arc<dyn IdentityProvider>>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Extension(config): Extension<Arc<ApiConfig>>,
    payload: Option<Json<SendOtpRequest>>,
) -> Result<Json<Value>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::InvalidInput);
    };

    if !valid_email(&request.email) {
        return Err(ApiError::InvalidInput);
    }

    if request.action == OtpAction::Reset {
        identity
            .get_by_email(&request.email)
            .await
            .map_err(|err| {
                error!("identity lookup failed: {err}");
                ApiError::IdentityNotFound
            })?;
    }

    let code = otp::generate();
    let expires_at = now_millis() + config.otp_expiry_minutes * 60_000;

    store.put(
        &request.email,
        OtpRecord {
            code: code.clone(),
            expires_at,
            action: request.action,
        },
    );

    let (subject, html) = otp_message(request.action, &code, config.otp_expiry_minutes);

    mailer
        .send(&request.email, &subject, &html)
        .await
        .map_err(|err| {
            error!("passcode dispatch failed: {err}");
            ApiError::NotificationFailed
        })?;

    // Accepted for dispatch, not confirmed delivered
    Ok(Json(json!({ "success": true })))
}
