//! Exponential backoff for transient transport failures.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Cap on a single delay.
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Fixed extra delay as a fraction of the capped delay (0.0 = none).
    pub padding_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(15),
            multiplier: 2.0,
            padding_fraction: 0.1,
        }
    }
}

impl RetryConfig {
    /// Fail on the first error.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay before retry number `attempt` (1-based), `None` once retries
    /// are exhausted.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.config.max_retries {
            return None;
        }
        let base_ms = self.config.initial_backoff.as_millis() as f64
            * self.config.multiplier.powi((attempt - 1) as i32);
        let capped = base_ms.min(self.config.max_backoff.as_millis() as f64);
        let padding_ms = capped * self.config.padding_fraction;
        Some(Duration::from_millis((capped + padding_ms) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32, max_backoff: Duration) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(100),
            max_backoff,
            multiplier: 2.0,
            padding_fraction: 0.0,
        })
    }

    #[test]
    fn doubles_until_exhausted() {
        let p = policy(3, Duration::from_secs(30));
        assert_eq!(p.next_delay(1), Some(Duration::from_millis(100)));
        assert_eq!(p.next_delay(2), Some(Duration::from_millis(200)));
        assert_eq!(p.next_delay(3), Some(Duration::from_millis(400)));
        assert_eq!(p.next_delay(4), None);
    }

    #[test]
    fn capped_at_max_backoff() {
        let p = policy(10, Duration::from_millis(500));
        assert_eq!(p.next_delay(8), Some(Duration::from_millis(500)));
    }

    #[test]
    fn padding_is_added_to_capped_delay() {
        let p = RetryPolicy::new(RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(300),
            multiplier: 2.0,
            padding_fraction: 0.5,
        });
        assert_eq!(p.next_delay(1), Some(Duration::from_millis(300)));
        assert_eq!(p.next_delay(2), Some(Duration::from_millis(450)));
    }

    #[test]
    fn none_never_retries() {
        assert_eq!(RetryPolicy::new(RetryConfig::none()).next_delay(1), None);
    }
}
