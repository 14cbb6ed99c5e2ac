//! Backoff strategies for request retries and resource-status polling.
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum RetryStrategy {
    ExponentialBackoff {
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    },
    LinearBackoff {
        initial_delay: Duration,
        increment: Duration,
    },
    FixedDelay(Duration),
    NoRetry,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::ExponentialBackoff {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryStrategy {
    /// The backoff `waitUntilStatus` polling uses: starts at 3s, caps
    /// at 30s, honoring any server `Retry-After` instead when present
    /// (applied by the caller, not here).
    pub fn polling() -> Self {
        Self::ExponentialBackoff {
            initial_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                multiplier,
            } => {
                let delay_ms = initial_delay.as_millis() as f64 * multiplier.powi(attempt as i32);
                Duration::from_millis(delay_ms as u64).min(*max_delay)
            }
            RetryStrategy::LinearBackoff {
                initial_delay,
                increment,
            } => initial_delay.saturating_add(increment.saturating_mul(attempt)),
            RetryStrategy::FixedDelay(delay) => *delay,
            RetryStrategy::NoRetry => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_increases() {
        let strategy = RetryStrategy::default();
        assert!(strategy.delay(0) < strategy.delay(1));
        assert!(strategy.delay(1) < strategy.delay(2));
    }

    #[test]
    fn polling_strategy_starts_at_three_seconds_caps_at_thirty() {
        let strategy = RetryStrategy::polling();
        assert_eq!(strategy.delay(0), Duration::from_secs(3));
        assert_eq!(strategy.delay(10), Duration::from_secs(30));
    }
}
