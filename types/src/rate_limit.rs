use serde::{Deserialize, Serialize};

/// Quota metadata reported by the hashing server on every response.
///
/// Each response replaces the previous value wholesale; fields the server did
/// not send are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub max_request_count: Option<u64>,
    pub rate_limit_seconds: Option<u64>,
    /// Unix time (seconds) at which the current rate period ends.
    pub period_end: Option<u64>,
    pub requests_remaining: Option<u64>,
    /// Unix time (seconds) at which the hashing key expires.
    pub token_expiration: Option<u64>,
}

impl RateLimitInfo {
    /// Whether the server reported the current period as exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.requests_remaining == Some(0)
    }
}
