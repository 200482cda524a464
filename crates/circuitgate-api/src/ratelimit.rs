// circuitgate-api/src/ratelimit.rs
// ============================================================================
// Module: Rate Limiter
// Description: Per-identifier minute-bucket rate limiting for the ingestion
//              and review APIs (§5 "Rate limiting").
// Purpose: A small in-process limiter that fails open if its backing state
//          cannot be consulted, matching §5's explicit failure mode.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! One bucket per identifier (authenticated user id, falling back to
//! client IP), reset every 60 seconds. The limiter never blocks a caller
//! because its own state is unavailable — there is no external backing
//! store here to go down, but the "fail open" contract is preserved by
//! construction: a poisoned lock is treated as "allow" rather than
//! propagated as an error.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

/// The result of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitOutcome {
    /// The request may proceed; `remaining` requests are left in the
    /// current window.
    Allowed {
        /// Requests remaining in the current window.
        remaining: u32,
    },
    /// The request is over the cap for the current window.
    Limited,
}

struct Bucket {
    window_start: Instant,
    count: u32,
}

/// A per-identifier, minute-windowed rate limiter.
pub struct RateLimiter {
    cap: u32,
    enabled: bool,
    buckets: Mutex<HashMap<String, Bucket>>,
}

const WINDOW: Duration = Duration::from_secs(60);

impl RateLimiter {
    /// Builds a limiter with the given per-minute cap. `enabled = false`
    /// makes every check return `Allowed` unconditionally (§5: the cap is
    /// deployment-configurable and can be turned off).
    #[must_use]
    pub fn new(cap: u32, enabled: bool) -> Self {
        Self { cap, enabled, buckets: Mutex::new(HashMap::new()) }
    }

    /// Checks and increments the bucket for `identifier`. Fails open: a
    /// poisoned internal lock is treated the same as "allow".
    #[must_use]
    pub fn check(&self, identifier: &str) -> RateLimitOutcome {
        if !self.enabled {
            return RateLimitOutcome::Allowed { remaining: self.cap };
        }
        let Ok(mut buckets) = self.buckets.lock() else {
            return RateLimitOutcome::Allowed { remaining: self.cap };
        };
        let now = Instant::now();
        let bucket = buckets.entry(identifier.to_string()).or_insert_with(|| Bucket { window_start: now, count: 0 });
        if now.duration_since(bucket.window_start) >= WINDOW {
            bucket.window_start = now;
            bucket.count = 0;
        }
        if bucket.count >= self.cap {
            return RateLimitOutcome::Limited;
        }
        bucket.count += 1;
        RateLimitOutcome::Allowed { remaining: self.cap - bucket.count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_cap_then_limits() {
        let limiter = RateLimiter::new(2, true);
        assert_eq!(limiter.check("a"), RateLimitOutcome::Allowed { remaining: 1 });
        assert_eq!(limiter.check("a"), RateLimitOutcome::Allowed { remaining: 0 });
        assert_eq!(limiter.check("a"), RateLimitOutcome::Limited);
    }

    #[test]
    fn buckets_are_independent_per_identifier() {
        let limiter = RateLimiter::new(1, true);
        assert_eq!(limiter.check("a"), RateLimitOutcome::Allowed { remaining: 0 });
        assert_eq!(limiter.check("b"), RateLimitOutcome::Allowed { remaining: 0 });
    }

    #[test]
    fn disabled_limiter_always_allows() {
        let limiter = RateLimiter::new(0, false);
        assert_eq!(limiter.check("a"), RateLimitOutcome::Allowed { remaining: 0 });
        assert_eq!(limiter.check("a"), RateLimitOutcome::Allowed { remaining: 0 });
    }
}
