use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub pin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Unix timestamp after which the token is no longer accepted.
    pub expires_at: i64,
}

/// Destructive admin actions (release, delete) re-confirm the PIN even with a
/// valid session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinActionRequest {
    pub pin: String,
}
