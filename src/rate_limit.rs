//! Windowed rate limiting for upload requests.
//!
//! Tracks request timestamps per client address and denies once the window
//! is full. Used by the upload route (100 requests per 15 minutes).

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Configuration for rate limiting.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the time window.
    pub max_requests: u32,
    /// Time window for counting requests.
    pub window: Duration,
}

impl RateLimitConfig {
    /// Create a new rate limit configuration.
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed.
    Allowed,
    /// Request is denied due to rate limit.
    Denied {
        /// Time until the window frees a slot.
        retry_after: Duration,
    },
}

impl RateLimitResult {
    /// Check if the request is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed)
    }
}

/// Tracks request timestamps for a single client.
#[derive(Debug)]
struct ClientRequests {
    timestamps: Vec<Instant>,
}

impl ClientRequests {
    fn new() -> Self {
        Self {
            timestamps: Vec::new(),
        }
    }

    /// Drop timestamps outside the window.
    fn cleanup(&mut self, window: Duration) {
        let cutoff = Instant::now() - window;
        self.timestamps.retain(|&t| t > cutoff);
    }

    fn count_in_window(&self, window: Duration) -> usize {
        let cutoff = Instant::now() - window;
        self.timestamps.iter().filter(|&&t| t > cutoff).count()
    }

    fn oldest_in_window(&self, window: Duration) -> Option<Instant> {
        let cutoff = Instant::now() - window;
        self.timestamps
            .iter()
            .filter(|&&t| t > cutoff)
            .min()
            .copied()
    }

    fn record(&mut self) {
        self.timestamps.push(Instant::now());
    }
}

/// Per-client request rate limiter.
#[derive(Debug)]
pub struct UploadRateLimiter {
    config: RateLimitConfig,
    clients: RwLock<HashMap<String, ClientRequests>>,
}

impl UploadRateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Check and record in one operation.
    ///
    /// Returns `Allowed` and records the request, or `Denied` without
    /// recording.
    pub fn check_and_record(&self, client: &str) -> RateLimitResult {
        let mut clients = self.clients.write().unwrap();
        let requests = clients
            .entry(client.to_string())
            .or_insert_with(ClientRequests::new);

        requests.cleanup(self.config.window);

        let count = requests.count_in_window(self.config.window);
        if count >= self.config.max_requests as usize {
            if let Some(oldest) = requests.oldest_in_window(self.config.window) {
                let elapsed = oldest.elapsed();
                let retry_after = if elapsed < self.config.window {
                    self.config.window - elapsed
                } else {
                    Duration::ZERO
                };
                return RateLimitResult::Denied { retry_after };
            }
        }

        requests.record();
        RateLimitResult::Allowed
    }

    /// Drop stale entries for all clients. Call periodically to free memory.
    pub fn cleanup(&self) {
        let mut clients = self.clients.write().unwrap();

        for requests in clients.values_mut() {
            requests.cleanup(self.config.window);
        }

        clients.retain(|_, requests| !requests.timestamps.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = UploadRateLimiter::new(RateLimitConfig::new(3, 60));

        assert!(limiter.check_and_record("1.2.3.4").is_allowed());
        assert!(limiter.check_and_record("1.2.3.4").is_allowed());
        assert!(limiter.check_and_record("1.2.3.4").is_allowed());
        assert!(!limiter.check_and_record("1.2.3.4").is_allowed());
    }

    #[test]
    fn test_denied_reports_retry_after() {
        let limiter = UploadRateLimiter::new(RateLimitConfig::new(1, 60));

        limiter.check_and_record("1.2.3.4");
        match limiter.check_and_record("1.2.3.4") {
            RateLimitResult::Denied { retry_after } => {
                assert!(retry_after <= Duration::from_secs(60));
                assert!(retry_after > Duration::ZERO);
            }
            RateLimitResult::Allowed => panic!("expected denial"),
        }
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = UploadRateLimiter::new(RateLimitConfig::new(1, 60));

        assert!(limiter.check_and_record("1.2.3.4").is_allowed());
        assert!(limiter.check_and_record("5.6.7.8").is_allowed());
        assert!(!limiter.check_and_record("1.2.3.4").is_allowed());
    }

    #[test]
    fn test_denied_request_is_not_recorded() {
        let limiter = UploadRateLimiter::new(RateLimitConfig::new(2, 60));

        limiter.check_and_record("1.2.3.4");
        limiter.check_and_record("1.2.3.4");
        // Denied attempts must not extend the window
        for _ in 0..10 {
            assert!(!limiter.check_and_record("1.2.3.4").is_allowed());
        }
    }

    #[test]
    fn test_cleanup_drops_idle_clients() {
        let limiter = UploadRateLimiter::new(RateLimitConfig::new(1, 0));

        limiter.check_and_record("1.2.3.4");
        limiter.cleanup();

        let clients = limiter.clients.read().unwrap();
        assert!(clients.is_empty());
    }
}
