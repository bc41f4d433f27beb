//! Passcode verification endpoint.

use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};

use super::ApiError;
use crate::identity::{IdentityProvider, IdentityUpdate};
use crate::otp::{now_millis, store::OtpStore, OtpAction};

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,
}

/// Verify a presented passcode and apply its action via the identity
/// provider.
///
/// The record is consumed on success and on expiry, but deliberately not
/// on a wrong code, a reset without a new password, or a provider
/// failure; see DESIGN.md for the asymmetry.
#[instrument(skip(store, identity, payload))]
pub async fn verify_otp(
    Extension(store): Extension<Arc<OtpStore>>,
    Extension(identity): Extension<Arc<dyn IdentityProvider>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Result<Json<Value>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::InvalidOtp);
    };

    // Exact string comparison, no case folding
    let Some(record) = store.get(&request.email) else {
        return Err(ApiError::InvalidOtp);
    };

    if record.code != request.otp {
        return Err(ApiError::InvalidOtp);
    }

    if now_millis() > record.expires_at {
        store.delete(&request.email);
        return Err(ApiError::OtpExpired);
    }

    let update = match record.action {
        OtpAction::Verify => IdentityUpdate::email_verified(),
        OtpAction::Reset => {
            let Some(password) = request.new_password.filter(|password| !password.is_empty())
            else {
                // Record stays put in this branch
                return Err(ApiError::InvalidRequest);
            };

            IdentityUpdate::password(password)
        }
    };

    let user = identity
        .get_by_email(&request.email)
        .await
        .map_err(|err| provider_error("identity lookup failed", &err))?;

    identity
        .update_user(&user.id, update)
        .await
        .map_err(|err| provider_error("identity update failed", &err))?;

    store.delete(&request.email);

    Ok(Json(json!({ "success": true })))
}

fn provider_error(context: &str, err: &anyhow::Error) -> ApiError {
    error!("{context}: {err}");
    ApiError::Provider(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::konfirmo::handlers::test_support::{identity_ext, MockIdentityProvider};
    use crate::otp::OtpRecord;

    fn live_record(code: &str, action: OtpAction) -> OtpRecord {
        OtpRecord {
            code: code.to_string(),
            expires_at: now_millis() + 60_000,
            action,
        }
    }

    fn request(email: &str, otp: &str, new_password: Option<&str>) -> Option<Json<VerifyOtpRequest>> {
        Some(Json(VerifyOtpRequest {
            email: email.to_string(),
            otp: otp.to_string(),
            new_password: new_password.map(std::string::ToString::to_string),
        }))
    }

    #[tokio::test]
    async fn test_verify_consumes_record() {
        let store = Arc::new(OtpStore::new());
        let identity = Arc::new(MockIdentityProvider::with_user("uid-1", "a@b.com"));

        store.put("a@b.com", live_record("1234", OtpAction::Verify));

        let result = verify_otp(
            Extension(store.clone()),
            identity_ext(&identity),
            request("a@b.com", "1234", None),
        )
        .await;

        assert!(result.is_ok());
        assert!(identity.verified_ids().contains(&"uid-1".to_string()));
        assert_eq!(store.get("a@b.com"), None);

        // Consumed: the same code no longer verifies
        let result = verify_otp(
            Extension(store.clone()),
            identity_ext(&identity),
            request("a@b.com", "1234", None),
        )
        .await;
        assert_eq!(result.unwrap_err(), ApiError::InvalidOtp);
    }

    #[tokio::test]
    async fn test_verify_wrong_code_keeps_record() {
        let store = Arc::new(OtpStore::new());
        let identity = Arc::new(MockIdentityProvider::with_user("uid-1", "a@b.com"));

        store.put("a@b.com", live_record("1234", OtpAction::Verify));

        let result = verify_otp(
            Extension(store.clone()),
            identity_ext(&identity),
            request("a@b.com", "9999", None),
        )
        .await;

        assert_eq!(result.unwrap_err(), ApiError::InvalidOtp);
        assert!(store.get("a@b.com").is_some());

        // Correct follow-up attempt still succeeds
        let result = verify_otp(
            Extension(store.clone()),
            identity_ext(&identity),
            request("a@b.com", "1234", None),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_verify_expired_deletes_record() {
        let store = Arc::new(OtpStore::new());
        let identity = Arc::new(MockIdentityProvider::with_user("uid-1", "a@b.com"));

        store.put(
            "a@b.com",
            OtpRecord {
                code: "1234".to_string(),
                expires_at: now_millis().saturating_sub(1),
                action: OtpAction::Verify,
            },
        );

        let result = verify_otp(
            Extension(store.clone()),
            identity_ext(&identity),
            request("a@b.com", "1234", None),
        )
        .await;

        assert_eq!(result.unwrap_err(), ApiError::OtpExpired);
        assert_eq!(store.get("a@b.com"), None);

        // Once removed the failure downgrades to invalid
        let result = verify_otp(
            Extension(store),
            identity_ext(&identity),
            request("a@b.com", "1234", None),
        )
        .await;
        assert_eq!(result.unwrap_err(), ApiError::InvalidOtp);
    }

    #[tokio::test]
    async fn test_reset_requires_new_password() {
        let store = Arc::new(OtpStore::new());
        let identity = Arc::new(MockIdentityProvider::with_user("uid-1", "a@b.com"));

        store.put("a@b.com", live_record("1234", OtpAction::Reset));

        for new_password in [None, Some("")] {
            let result = verify_otp(
                Extension(store.clone()),
                identity_ext(&identity),
                request("a@b.com", "1234", new_password),
            )
            .await;

            assert_eq!(result.unwrap_err(), ApiError::InvalidRequest);
            assert!(store.get("a@b.com").is_some());
        }

        let result = verify_otp(
            Extension(store.clone()),
            identity_ext(&identity),
            request("a@b.com", "1234", Some("n3w-p4ss")),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(
            identity.password_for("uid-1"),
            Some("n3w-p4ss".to_string())
        );
        assert_eq!(store.get("a@b.com"), None);
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_record() {
        let store = Arc::new(OtpStore::new());
        let identity = Arc::new(MockIdentityProvider::with_user("uid-1", "a@b.com").failing_updates());

        store.put("a@b.com", live_record("1234", OtpAction::Verify));

        let result = verify_otp(
            Extension(store.clone()),
            identity_ext(&identity),
            request("a@b.com", "1234", None),
        )
        .await;

        match result.unwrap_err() {
            ApiError::Provider(message) => assert!(message.contains("update rejected")),
            other => panic!("expected provider error, got {other:?}"),
        }

        assert!(store.get("a@b.com").is_some());
    }

    #[tokio::test]
    async fn test_verify_unknown_identity_is_provider_error() {
        let store = Arc::new(OtpStore::new());
        let identity = Arc::new(MockIdentityProvider::default());

        store.put("a@b.com", live_record("1234", OtpAction::Verify));

        let result = verify_otp(
            Extension(store.clone()),
            identity_ext(&identity),
            request("a@b.com", "1234", None),
        )
        .await;

        assert!(matches!(result.unwrap_err(), ApiError::Provider(_)));
        assert!(store.get("a@b.com").is_some());
    }

    #[tokio::test]
    async fn test_missing_body_is_invalid_otp() {
        let store = Arc::new(OtpStore::new());
        let identity = Arc::new(MockIdentityProvider::default());

        let result = verify_otp(Extension(store), identity_ext(&identity), None).await;

        assert_eq!(result.unwrap_err(), ApiError::InvalidOtp);
    }
}
