//! In-memory passcode store.
//!
//! One record per email, newest issuance wins. Expiry is enforced twice:
//! the verification handler rejects records past `expires_at` on lookup,
//! and the sweeper physically removes them on a fixed period. Records live
//! only here; callers get clones.

use super::OtpRecord;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct OtpStore {
    records: Mutex<HashMap<String, OtpRecord>>,
}

impl OtpStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `email`.
    pub fn put(&self, email: &str, record: OtpRecord) {
        self.lock().insert(email.to_string(), record);
    }

    #[must_use]
    pub fn get(&self, email: &str) -> Option<OtpRecord> {
        self.lock().get(email).cloned()
    }

    /// Remove the record for `email`, if any.
    pub fn delete(&self, email: &str) {
        self.lock().remove(email);
    }

    /// Remove every record with `expires_at < now`, returning the count.
    pub fn sweep_expired(&self, now: u64) -> usize {
        let mut records = self.lock();
        let before = records.len();

        records.retain(|_, record| record.expires_at >= now);

        before - records.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A poisoned lock only means a panic mid-map-operation; the map itself
    // is still usable.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, OtpRecord>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
