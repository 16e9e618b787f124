use std::time::{Duration, Instant};

use dashmap::DashMap;

const WINDOW: Duration = Duration::from_secs(15 * 60);
const MAX_FAILURES: u32 = 5;

/// Per-username login brute force limiter. Keys are usernames as stored,
/// so matching is case-sensitive like the lookup itself.
pub struct LoginRateLimiter {
    /// username -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if a login attempt is allowed. 5 failures per 15 minutes.
    /// Does not increment the counter; call `record_failure()` on a bad password.
    /// The error carries the seconds until the window resets.
    pub fn check(&self, username: &str) -> Result<(), u64> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(username) else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > WINDOW {
            return Ok(());
        }

        if *count >= MAX_FAILURES {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(WINDOW.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record_failure(&self, username: &str) {
        let now = Instant::now();

        let mut entry = self.entries.entry(username.to_string()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    /// Forget a username after a successful login.
    pub fn reset(&self, username: &str) {
        self.entries.remove(username);
    }

    /// Remove stale entries older than the given duration.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_five_failures() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..4 {
            limiter.record_failure("john_doe");
            assert!(limiter.check("john_doe").is_ok());
        }
        limiter.record_failure("john_doe");
        let retry_after = limiter.check("john_doe").unwrap_err();
        assert!(retry_after > 0 && retry_after <= WINDOW.as_secs());
        assert!(limiter.check("jane_smith").is_ok());
    }

    #[test]
    fn usernames_differing_in_case_are_separate() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..5 {
            limiter.record_failure("Bob");
        }
        assert!(limiter.check("Bob").is_err());
        assert!(limiter.check("bob").is_ok());
    }

    #[test]
    fn reset_clears_failures() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..5 {
            limiter.record_failure("mike");
        }
        assert!(limiter.check("mike").is_err());
        limiter.reset("mike");
        assert!(limiter.check("mike").is_ok());
    }

    #[test]
    fn cleanup_drops_old_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failure("mike");
        limiter.cleanup(Duration::ZERO);
        assert!(limiter.is_empty());
    }
}
