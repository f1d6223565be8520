//! Exponential backoff with jitter between direct fetch attempts.

use std::time::Duration;

use rand::Rng;

/// Upper bound on any single backoff sleep.
const MAX_DELAY: Duration = Duration::from_secs(60);

/// `base_secs ^ retry` seconds plus up to `jitter_ms` of random jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub base_secs: f64,
    pub jitter_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_secs: 1.2,
            jitter_ms: 500,
        }
    }
}

impl BackoffPolicy {
    /// Deterministic part of the delay before retry number `retry` (1-based).
    #[must_use]
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.base_secs.max(0.0).powi(exponent);
        if !secs.is_finite() || secs >= MAX_DELAY.as_secs_f64() {
            return MAX_DELAY;
        }
        Duration::from_secs_f64(secs)
    }

    /// Full delay for retry number `retry`, jitter included, capped at 60 s.
    pub fn delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.random_range(0..self.jitter_ms))
        };
        (self.base_delay(retry) + jitter).min(MAX_DELAY)
    }

    /// Start a schedule whose successive delays never decrease.
    #[must_use]
    pub fn schedule(self) -> BackoffSchedule {
        BackoffSchedule {
            policy: self,
            previous: Duration::ZERO,
        }
    }
}

/// Delays for one fetch, clamped so each is at least the previous one.
///
/// Jitter alone could otherwise make retry 2 sleep less than retry 1, and a
/// base below 1.0 would shrink the exponential term.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    policy: BackoffPolicy,
    previous: Duration,
}

impl BackoffSchedule {
    pub fn next_delay<R: Rng + ?Sized>(&mut self, retry: u32, rng: &mut R) -> Duration {
        let delay = self.policy.delay(retry, rng).max(self.previous);
        self.previous = delay;
        delay
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn base_delay_grows_exponentially() {
        let policy = BackoffPolicy {
            base_secs: 2.0,
            jitter_ms: 0,
        };
        assert_eq!(policy.base_delay(1), Duration::from_secs(2));
        assert_eq!(policy.base_delay(2), Duration::from_secs(4));
        assert_eq!(policy.base_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn base_delay_is_capped() {
        let policy = BackoffPolicy {
            base_secs: 10.0,
            jitter_ms: 0,
        };
        assert_eq!(policy.base_delay(5), MAX_DELAY);
    }

    #[test]
    fn zero_base_means_no_sleep() {
        let policy = BackoffPolicy {
            base_secs: 0.0,
            jitter_ms: 0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(policy.delay(1, &mut rng), Duration::ZERO);
        assert_eq!(policy.delay(4, &mut rng), Duration::ZERO);
    }

    #[test]
    fn jitter_stays_within_bound() {
        let policy = BackoffPolicy {
            base_secs: 1.0,
            jitter_ms: 500,
        };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let delay = policy.delay(1, &mut rng);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay < Duration::from_millis(1500));
        }
    }

    #[test]
    fn schedule_is_non_decreasing() {
        let policy = BackoffPolicy {
            base_secs: 1.2,
            jitter_ms: 2_000,
        };
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut schedule = policy.schedule();
            let mut last = Duration::ZERO;
            for retry in 1..=6 {
                let delay = schedule.next_delay(retry, &mut rng);
                assert!(delay >= last, "seed {seed}: {delay:?} < {last:?}");
                last = delay;
            }
        }
    }

    #[test]
    fn schedule_clamps_sub_unit_base() {
        let policy = BackoffPolicy {
            base_secs: 0.5,
            jitter_ms: 0,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let mut schedule = policy.schedule();
        let first = schedule.next_delay(1, &mut rng);
        let second = schedule.next_delay(2, &mut rng);
        assert_eq!(first, Duration::from_millis(500));
        assert_eq!(second, first);
    }
}
