//! Per-device session record persisted in the session store.

use autoban_core::types::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One login on one device.
///
/// Persisted as JSON under `session:{user_id}:{device_id}`; `last_used`
/// serializes as RFC 3339. At most one record exists per (user, device):
/// saving again overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub device_id: String,
    /// The currently valid refresh token for this device, in encoded form.
    pub refresh_token: String,
    /// Updated on every successful refresh.
    pub last_used: Timestamp,
    /// Always `true` for records written by the auth flow; deletion is the
    /// revocation mechanism.
    pub is_active: bool,
}

impl Session {
    /// A fresh, active session for a login that just happened.
    pub fn new(user_id: String, device_id: String, refresh_token: String) -> Self {
        Self {
            user_id,
            device_id,
            refresh_token,
            last_used: Utc::now(),
            is_active: true,
        }
    }

    /// Replace the refresh token after a successful refresh and bump `last_used`.
    ///
    /// Returns the token that was current before rotation.
    pub fn rotate(&mut self, refresh_token: String) -> String {
        self.last_used = Utc::now();
        std::mem::replace(&mut self.refresh_token, refresh_token)
    }
}
