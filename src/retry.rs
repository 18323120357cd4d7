use std::time::Duration;

use rand::Rng;

const RETRY_AFTER_FALLBACK: Duration = Duration::from_secs(10);

/// Delay schedule for catalog requests. Pure arithmetic so callers decide
/// when to sleep and tests can pin the bounds.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff with a ±25% jitter, capped at `max_delay`.
    /// `attempt` counts from 1.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let raw = self.base_delay.as_secs_f64() * f64::from(2u32.pow(exponent));
        let capped = raw.min(self.max_delay.as_secs_f64());
        let jittered = capped * rand::thread_rng().gen_range(0.75..=1.25);
        Duration::from_secs_f64(jittered.min(self.max_delay.as_secs_f64()))
    }

    /// Delay to honor after a 429, from the server hint when one was sent,
    /// plus a 1-3s buffer so a fleet of workers does not return in lockstep.
    pub fn retry_after(&self, hinted: Option<Duration>) -> Duration {
        let base = hinted.unwrap_or(RETRY_AFTER_FALLBACK);
        base + Duration::from_secs_f64(rand::thread_rng().gen_range(1.0..=3.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_stays_inside_jitter_bounds() {
        let policy = RetryPolicy::default();
        for attempt in 1..=6 {
            let expected = f64::from(2u32.pow(attempt - 1));
            let delay = policy.backoff(attempt).as_secs_f64();
            assert!(delay >= expected * 0.75, "attempt {attempt}: {delay} too small");
            assert!(delay <= expected * 1.25, "attempt {attempt}: {delay} too large");
        }
    }

    #[test]
    fn backoff_never_exceeds_the_cap() {
        let policy = RetryPolicy::default();
        for attempt in 7..=12 {
            assert!(policy.backoff(attempt) <= policy.max_delay);
        }
    }

    #[test]
    fn retry_after_buffers_the_hint() {
        let policy = RetryPolicy::default();
        let delay = policy.retry_after(Some(Duration::from_secs(30))).as_secs_f64();
        assert!((31.0..=33.0).contains(&delay));

        let fallback = policy.retry_after(None).as_secs_f64();
        assert!((11.0..=13.0).contains(&fallback));
    }
}
