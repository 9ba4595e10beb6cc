use crate::helpers::time::now_i64;

/// Early-renewal buffer subtracted from the platform-advertised lifetime,
/// so we never race the platform's own clock.
pub const SAFETY_MARGIN_SECS: i64 = 300;

/// Lifetime the platform advertises for an access_token; used when the
/// token response omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 7200;

/// Short-lived bearer token with its computed expiration.
#[derive(Debug, Clone)]
pub struct Credential {
    pub value: String,
    pub expires_at: i64, // UNIX timestamp
}

impl Credential {
    pub fn new(value: String, expires_at: i64) -> Self {
        Self { value, expires_at }
    }

    /// A credential is usable only while `now < expires_at - safety margin`.
    /// An invalid credential must never be attached to a request.
    pub fn is_valid(&self) -> bool {
        now_i64() < self.expires_at - SAFETY_MARGIN_SECS
    }
}
