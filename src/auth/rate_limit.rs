use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry {
    count: u32,
    window_start: Instant,
}

/// Fixed-window attempt counter keyed by arbitrary strings
/// (e.g. `login:<ip>`). State is process-local and unbounded:
/// stale keys are never evicted and nothing is shared across
/// processes, which is fine at this deployment's scale.
#[derive(Clone, Default)]
pub struct RateLimiter {
    attempts: Arc<Mutex<HashMap<String, Entry>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt for `key` and report whether it is allowed.
    /// The first attempt after `window` has elapsed since the window
    /// opened resets the counter to 1.
    pub fn check(&self, key: &str, max_attempts: u32, window: Duration) -> bool {
        self.check_at(key, max_attempts, window, Instant::now())
    }

    fn check_at(&self, key: &str, max_attempts: u32, window: Duration, now: Instant) -> bool {
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match attempts.get_mut(key) {
            None => {
                attempts.insert(
                    key.to_string(),
                    Entry {
                        count: 1,
                        window_start: now,
                    },
                );
                true
            }
            Some(entry) if now.duration_since(entry.window_start) > window => {
                entry.count = 1;
                entry.window_start = now;
                true
            }
            Some(entry) if entry.count >= max_attempts => false,
            Some(entry) => {
                entry.count += 1;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(60_000);

    #[test]
    fn allows_up_to_max_attempts_then_denies() {
        let limiter = RateLimiter::new();
        let now = Instant::now();

        assert!(limiter.check_at("login:1.2.3.4", 3, WINDOW, now));
        assert!(limiter.check_at("login:1.2.3.4", 3, WINDOW, now));
        assert!(limiter.check_at("login:1.2.3.4", 3, WINDOW, now));
        assert!(!limiter.check_at("login:1.2.3.4", 3, WINDOW, now));
    }

    #[test]
    fn resets_after_window_elapses() {
        let limiter = RateLimiter::new();
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("k", 3, WINDOW, now));
        }
        assert!(!limiter.check_at("k", 3, WINDOW, now));

        let later = now + WINDOW + Duration::from_millis(1);
        assert!(limiter.check_at("k", 3, WINDOW, later));

        // Counter restarted at 1, so two more fit in the new window
        assert!(limiter.check_at("k", 3, WINDOW, later));
        assert!(limiter.check_at("k", 3, WINDOW, later));
        assert!(!limiter.check_at("k", 3, WINDOW, later));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new();
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("a", 3, WINDOW, now));
        }
        assert!(!limiter.check_at("a", 3, WINDOW, now));
        assert!(limiter.check_at("b", 3, WINDOW, now));
    }

    #[test]
    fn clones_share_state() {
        let limiter = RateLimiter::new();
        let other = limiter.clone();
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("shared", 3, WINDOW, now));
        }
        assert!(!other.check_at("shared", 3, WINDOW, now));
    }
}
