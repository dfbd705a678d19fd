use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window request counter keyed by client address.
///
/// Process-local and never evicted; a restart forgets every window.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Counts the request and returns whether it may proceed
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        // a poisoned map only means another request panicked mid-update
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        match entries.get_mut(key) {
            None => {
                entries.insert(key.to_string(), Window { count: 1, started: now });
                true
            }
            Some(entry) if now.duration_since(entry.started) > self.window => {
                *entry = Window { count: 1, started: now };
                true
            }
            Some(entry) if entry.count >= self.max_requests => false,
            Some(entry) => {
                entry.count += 1;
                true
            }
        }
    }
}

/// Raw `x-forwarded-for` value, else the peer address, else `"unknown"`
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn allows_up_to_max_then_rejects() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(!limiter.check_at("1.2.3.4", now));
        // rejected requests do not extend the window
        assert!(!limiter.check_at("1.2.3.4", now + Duration::from_secs(60)));
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("ip", now));
        assert!(!limiter.check_at("ip", now + Duration::from_secs(30)));
        assert!(limiter.check_at("ip", now + Duration::from_secs(61)));
        assert!(!limiter.check_at("ip", now + Duration::from_secs(62)));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("a"));
        assert!(limiter.check("b"));
        assert!(!limiter.check("a"));
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.1");
        assert_eq!(client_ip(&headers, None), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.9, 10.0.0.1");
    }
}
