use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};

use crate::core::config::AssistantConfig;
use crate::core::error::{AppError, Result};

#[derive(Debug, Clone, Copy)]
struct Window {
    start: i64,
    count: i64,
}

/// Snapshot of a user's quota in the current window
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    pub used: i64,
    pub remaining: i64,
    pub max_requests: i64,
    pub window_secs: i64,
    pub resets_at: DateTime<Utc>,
}

/// Fixed-window rate limiter keyed by user id. Windows are aligned to
/// wall-clock multiples of the window length, so every user's window rolls
/// over at the same instant. State is in-memory and resets on restart.
pub struct RateLimitService {
    max_requests: i64,
    window_secs: i64,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimitService {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            max_requests: config.rate_limit_max_requests,
            window_secs: config.rate_limit_window_secs,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn window_start(&self, now: i64) -> i64 {
        now - now.rem_euclid(self.window_secs)
    }

    /// Consume one request from the user's quota, or fail with 429
    pub fn check_and_increment(&self, user_id: &str) -> Result<()> {
        self.check_and_increment_at(user_id, Utc::now().timestamp())
    }

    fn check_and_increment_at(&self, user_id: &str, now: i64) -> Result<()> {
        let start = self.window_start(now);
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| AppError::Internal("Rate limiter state lock poisoned".to_string()))?;

        // All windows share the same alignment, so any entry not at the
        // current start is stale; drop them so the map tracks active users only
        windows.retain(|_, w| w.start == start);

        let window = windows
            .entry(user_id.to_string())
            .or_insert(Window { start, count: 0 });

        if window.count >= self.max_requests {
            let resets_at = start + self.window_secs;
            return Err(AppError::RateLimitExceeded(format!(
                "Rate limit of {} requests per {} seconds exceeded, resets at {}",
                self.max_requests,
                self.window_secs,
                Utc.timestamp_opt(resets_at, 0).single().unwrap_or_default()
            )));
        }

        window.count += 1;
        Ok(())
    }

    pub fn status(&self, user_id: &str) -> Result<RateLimitStatus> {
        self.status_at(user_id, Utc::now().timestamp())
    }

    fn status_at(&self, user_id: &str, now: i64) -> Result<RateLimitStatus> {
        let start = self.window_start(now);
        let windows = self
            .windows
            .lock()
            .map_err(|_| AppError::Internal("Rate limiter state lock poisoned".to_string()))?;

        let used = match windows.get(user_id) {
            Some(window) if window.start == start => window.count,
            _ => 0,
        };

        Ok(RateLimitStatus {
            used,
            remaining: (self.max_requests - used).max(0),
            max_requests: self.max_requests,
            window_secs: self.window_secs,
            resets_at: Utc
                .timestamp_opt(start + self.window_secs, 0)
                .single()
                .unwrap_or_default(),
        })
    }
}
