use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Stale entries are swept once the map grows past this size.
const PRUNE_THRESHOLD: usize = 10_000;

struct Window {
    started_at: i64,
    window_secs: i64,
    count: u32,
}

/// Fixed-window request counters keyed by (scope, client).
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<(String, String), Window>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Records one call of `scope` by `client` and returns false when the
    /// client already used up `max` calls within the current window.
    pub async fn check(&self, scope: &str, client: &str, max: u32, window_secs: i64) -> bool {
        let now = Utc::now().timestamp();
        let mut windows = self.windows.lock().await;

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| now - w.started_at < w.window_secs);
        }

        let window = windows
            .entry((scope.to_string(), client.to_string()))
            .or_insert(Window {
                started_at: now,
                window_secs,
                count: 0,
            });

        if now - window.started_at >= window_secs {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= max {
            return false;
        }
        window.count += 1;
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
