use serde::{Deserialize, Serialize};

/// Body of a webhook delivery. The banking bots post `{"mensaje": "..."}`;
/// `message` is accepted as an alias, and a non-JSON body is treated as the
/// raw notification text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "mensaje", alias = "message")]
    pub message: Option<String>,
}
