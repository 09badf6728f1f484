//! Per-service rate-limit ceilings (spec.md §6, "rate-limit ceilings in
//! requests per minute/hour/day (0 meaning unlimited)").
//!
//! Each configured ceiling becomes an independent `governor` limiter; a
//! call is rejected the moment any one of the three windows it belongs to
//! is exhausted. A ceiling of `0` means that window is never constructed,
//! so it never rejects.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter as GovernorLimiter};

type DirectLimiter = GovernorLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// The three independent ceilings one service may be configured with.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitConfig {
    pub per_minute: u32,
    pub per_hour: u32,
    pub per_day: u32,
}

impl RateLimitConfig {
    /// `true` when every ceiling is `0` (unlimited).
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.per_minute == 0 && self.per_hour == 0 && self.per_day == 0
    }
}

fn build(count: u32, period: Duration) -> Option<DirectLimiter> {
    let count = NonZeroU32::new(count)?;
    Some(GovernorLimiter::direct(Quota::with_period(period / count.get())?.allow_burst(count)))
}

/// One service's rate limiter, holding up to three independent windows.
pub struct ServiceRateLimiter {
    minute: Option<DirectLimiter>,
    hour: Option<DirectLimiter>,
    day: Option<DirectLimiter>,
}

impl ServiceRateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            minute: build(config.per_minute, Duration::from_secs(60)),
            hour: build(config.per_hour, Duration::from_secs(3600)),
            day: build(config.per_day, Duration::from_secs(86_400)),
        }
    }

    /// `true` if a call is allowed right now under every configured
    /// window. Each window's token is consumed as soon as it admits the
    /// call, so a rejection from a later (coarser) window still spends
    /// the token already taken from an earlier (finer) one; ceilings are
    /// meant as independent caps, not a single atomic admission test.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        for limiter in [&self.minute, &self.hour, &self.day].into_iter().flatten() {
            if limiter.check().is_err() {
                return false;
            }
        }
        true
    }
}
