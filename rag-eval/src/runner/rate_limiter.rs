//! Sliding-window request limiter for judgment clients

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);

/// Rate limiter allowing at most `requests_per_minute` acquisitions in any
/// sixty-second window (or a custom window). A limit of zero disables
/// throttling.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    last_requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(requests_per_minute: u32) -> Self {
        Self::with_window(requests_per_minute, WINDOW)
    }

    /// Allow `requests` acquisitions per `window` instead of per minute
    pub fn with_window(requests: u32, window: Duration) -> Self {
        Self {
            limit: requests,
            window,
            last_requests: Mutex::new(VecDeque::new()),
        }
    }

    /// Acquire permission to make a request
    pub async fn acquire(&self) -> RateLimitGuard {
        loop {
            if let Some(wait) = self.check_request_limit().await {
                tracing::debug!("Rate limit reached, waiting {}ms", wait.as_millis());
                tokio::time::sleep(wait).await;
                continue;
            }
            return RateLimitGuard { _private: () };
        }
    }

    /// Record the request if there is room, otherwise return how long to wait
    async fn check_request_limit(&self) -> Option<Duration> {
        let mut last = self.last_requests.lock().await;
        let now = Instant::now();

        // Remove requests older than the window
        while let Some(&front) = last.front() {
            if now.duration_since(front) > self.window {
                last.pop_front();
            } else {
                break;
            }
        }

        if self.limit > 0 && last.len() >= self.limit as usize {
            if let Some(&oldest) = last.front() {
                let elapsed = now.duration_since(oldest);
                return Some(self.window.saturating_sub(elapsed) + Duration::from_millis(10));
            }
        }

        last.push_back(now);
        None
    }

    /// Requests recorded in the current window
    pub async fn recent_requests(&self) -> usize {
        self.last_requests.lock().await.len()
    }
}

/// Guard returned when rate limit permission is acquired
pub struct RateLimitGuard {
    _private: (),
}
