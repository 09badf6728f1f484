//! Retryability, backoff, and `Retry-After` handling (spec.md §4.3 step 6;
//! spec.md §8, "Boundary behaviors").

use std::time::Duration;

use chrono::{DateTime, Utc};

const IDEMPOTENT_METHODS: &[&str] = &["GET", "HEAD", "PUT", "DELETE", "OPTIONS"];

/// Whether `method` is one of the idempotent HTTP methods spec.md §4.3
/// step 6 grants network-error retries to.
#[must_use]
pub fn is_idempotent(method: &str) -> bool {
    IDEMPOTENT_METHODS.contains(&method.to_ascii_uppercase().as_str())
}

/// The default maximum number of total attempts for `method` when the
/// configured `retries` is `0` (spec.md §4.3 step 6: "default: two total
/// attempts for all, more for read-only methods"). Read-only here means
/// idempotent.
#[must_use]
pub fn max_attempts(method: &str, configured_retries: u32) -> u32 {
    let baseline = if is_idempotent(method) { 3 } else { 2 };
    (1 + configured_retries).max(baseline)
}

/// Whether a network/connection-level failure should be retried for
/// `method` (spec.md §4.3 step 6, §8: "GET + connection error retries;
/// POST + connection error does not").
#[must_use]
pub fn retry_on_network_error(method: &str) -> bool {
    is_idempotent(method)
}

/// Whether an HTTP `status` response should be retried for `method`
/// (spec.md §4.3 step 6, §8: "POST + 503 retries; POST + 500 does not").
#[must_use]
pub fn retry_on_status(method: &str, status: u16) -> bool {
    match status {
        429 => true,
        503 if method.eq_ignore_ascii_case("POST") => true,
        500..=599 => is_idempotent(method),
        _ => false,
    }
}

/// Exponential backoff with jitter for the given zero-based `attempt`
/// (spec.md §8: attempts 0..5 fall into `[500,750]`, `[1000,1250]`,
/// `[2000,2250]`, `[4000,4250]`, `[8000,8250]`, `{10000}` ms).
///
/// Base 500 ms doubling per attempt, capped at 10 s; jitter is uniform in
/// `[0, 250)` ms, added after the cap (so the capped 10 s attempt carries
/// no jitter headroom, matching the `{10000}` singleton boundary).
#[must_use]
pub fn backoff(attempt: u32) -> Duration {
    const BASE_MS: u64 = 500;
    const CAP_MS: u64 = 10_000;
    const JITTER_MS: u64 = 250;

    let exponential = BASE_MS.saturating_mul(1u64 << attempt.min(32));
    let capped = exponential.min(CAP_MS);
    let jitter = if capped < CAP_MS {
        rand::random::<u64>() % JITTER_MS
    } else {
        0
    };
    Duration::from_millis(capped + jitter)
}

/// Parse a `Retry-After` header value (delta-seconds or an HTTP-date) into
/// a delay, capped at 30 s (spec.md §4.3 step 6, §8: "`Retry-After: 60`
/// produces a delay of exactly 30 s"). Past dates or unparseable values
/// return `None` so the caller falls back to exponential backoff.
#[must_use]
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    const CAP_SECONDS: u64 = 30;

    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds.min(CAP_SECONDS)));
    }

    if let Ok(when) = DateTime::parse_from_rfc2822(value.trim()) {
        let when = when.with_timezone(&Utc);
        let delta = when.signed_duration_since(now);
        let seconds = delta.num_seconds();
        if seconds <= 0 {
            return None;
        }
        return Some(Duration::from_secs((seconds as u64).min(CAP_SECONDS)));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_methods_recognized() {
        assert!(is_idempotent("GET"));
        assert!(is_idempotent("get"));
        assert!(is_idempotent("DELETE"));
        assert!(!is_idempotent("POST"));
        assert!(!is_idempotent("PATCH"));
    }

    #[test]
    fn get_plus_connection_error_retries() {
        assert!(retry_on_network_error("GET"));
    }

    #[test]
    fn post_plus_connection_error_does_not_retry() {
        assert!(!retry_on_network_error("POST"));
    }

    #[test]
    fn post_plus_503_retries() {
        assert!(retry_on_status("POST", 503));
    }

    #[test]
    fn post_plus_500_does_not_retry() {
        assert!(!retry_on_status("POST", 500));
    }

    #[test]
    fn post_plus_502_does_not_retry() {
        assert!(!retry_on_status("POST", 502));
    }

    #[test]
    fn get_plus_500_retries() {
        assert!(retry_on_status("GET", 500));
    }

    #[test]
    fn status_429_always_retries() {
        assert!(retry_on_status("POST", 429));
        assert!(retry_on_status("PATCH", 429));
    }

    #[test]
    fn non_retryable_4xx_never_retries() {
        assert!(!retry_on_status("GET", 404));
        assert!(!retry_on_status("POST", 400));
    }

    #[test]
    fn backoff_boundaries_match_spec() {
        for attempt in 0..5u32 {
            let base = 500u128 << attempt;
            let delay = backoff(attempt).as_millis();
            assert!(
                delay as u128 >= base && (delay as u128) < base + 250,
                "attempt {attempt}: {delay}ms not in [{base},{})",
                base + 250
            );
        }
        assert_eq!(backoff(5).as_millis(), 10_000);
        assert_eq!(backoff(6).as_millis(), 10_000);
    }

    #[test]
    fn retry_after_delta_seconds_capped_at_thirty() {
        let now = Utc::now();
        assert_eq!(parse_retry_after("60", now).unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn retry_after_zero_is_immediate() {
        let now = Utc::now();
        assert_eq!(parse_retry_after("0", now).unwrap(), Duration::from_secs(0));
    }

    #[test]
    fn retry_after_past_date_is_none() {
        let now = Utc::now();
        let past = (now - chrono::Duration::hours(1)).to_rfc2822();
        assert!(parse_retry_after(&past, now).is_none());
    }

    #[test]
    fn retry_after_unparseable_is_none() {
        let now = Utc::now();
        assert!(parse_retry_after("not-a-date", now).is_none());
    }

    #[test]
    fn default_max_attempts_idempotent_is_three() {
        assert_eq!(max_attempts("GET", 0), 3);
    }

    #[test]
    fn default_max_attempts_non_idempotent_is_two() {
        assert_eq!(max_attempts("POST", 0), 2);
    }

    #[test]
    fn configured_retries_can_raise_ceiling() {
        assert_eq!(max_attempts("POST", 5), 6);
    }
}
