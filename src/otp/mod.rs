pub mod store;
pub mod sweep;

use rand::Rng;
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Inclusive passcode range. Four decimal digits with no leading zeros, so
/// generation and verification share the same space. The small space is a
/// known limitation of the format, not something to widen here.
pub const OTP_MIN: u32 = 1000;
pub const OTP_MAX: u32 = 9999;

/// Intended effect of a verified passcode.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OtpAction {
    #[default]
    Verify,
    Reset,
}

/// One issued passcode, keyed by email in the store. The latest issuance
/// for an email overwrites any prior record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpRecord {
    pub code: String,
    /// Absolute expiry, milliseconds since the Unix epoch.
    pub expires_at: u64,
    pub action: OtpAction,
}

/// Generate a random passcode as its decimal string.
#[must_use]
pub fn generate() -> String {
    rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX).to_string()
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}
