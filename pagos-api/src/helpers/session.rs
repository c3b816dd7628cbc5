use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_TTL_HOURS: i64 = 2;

/// In-memory store of admin bearer tokens. Tokens expire after a fixed TTL
/// and die with the process.
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub async fn create(&self) -> (String, DateTime<Utc>) {
        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = super::pin::hex_encode(&raw);
        let expires_at = Utc::now() + self.ttl;

        let mut sessions = self.sessions.lock().await;
        sessions.insert(token.clone(), expires_at);

        (token, expires_at)
    }

    /// Expired tokens are dropped on the lookup that finds them.
    pub async fn is_valid(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(token) {
            Some(expires_at) if *expires_at > Utc::now() => true,
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    pub async fn revoke(&self, token: &str) {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_token_is_valid_until_revoked() {
        let manager = SessionManager::new(DEFAULT_TTL_HOURS);
        let (token, _) = manager.create().await;

        assert!(manager.is_valid(&token).await);
        assert!(!manager.is_valid("not-a-token").await);

        manager.revoke(&token).await;
        assert!(!manager.is_valid(&token).await);
    }

    #[tokio::test]
    async fn zero_ttl_token_is_expired() {
        let manager = SessionManager::new(0);
        let (token, _) = manager.create().await;

        assert!(!manager.is_valid(&token).await);
    }
}
