//! Pluggable time and randomness, so polling backoff and ARI renewal
//! windows are deterministic under test.
use jiff::{Span, Timestamp};
use std::sync::Arc;

/// Source of the current instant and of sleeping, abstracted so tests
/// can run a simulated clock instead of `tokio::time::sleep`.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
    async fn sleep(&self, duration: std::time::Duration);
}

/// Real-time clock backed by `tokio::time`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    async fn sleep(&self, duration: std::time::Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Source of randomness, abstracted so `RenewalInfo::get_random_proposal`
/// is reproducible under test.
pub trait Rng: Send + Sync {
    /// A uniform value in `[0.0, 1.0)`.
    fn next_f64(&self) -> f64;
}

/// Real randomness backed by the `rand` crate's thread RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRng;

impl Rng for SystemRng {
    fn next_f64(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Pick a uniformly random instant within `[start, end)` using `rng`.
pub fn random_instant_in(start: Timestamp, end: Timestamp, rng: &dyn Rng) -> Timestamp {
    if end <= start {
        return start;
    }
    let span_seconds = (end.as_second() - start.as_second()).max(0);
    let offset = (span_seconds as f64 * rng.next_f64()) as i64;
    start
        .checked_add(Span::new().seconds(offset))
        .unwrap_or(start)
}

pub type ClockRef = Arc<dyn Clock>;
pub type RngRef = Arc<dyn Rng>;

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRng(f64);
    impl Rng for FixedRng {
        fn next_f64(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn random_instant_in_clamps_to_start_at_zero() {
        let start: Timestamp = "2026-01-01T00:00:00Z".parse().unwrap();
        let end: Timestamp = "2026-01-02T00:00:00Z".parse().unwrap();
        let rng = FixedRng(0.0);
        assert_eq!(random_instant_in(start, end, &rng), start);
    }

    #[test]
    fn random_instant_in_degenerate_range_returns_start() {
        let t: Timestamp = "2026-01-01T00:00:00Z".parse().unwrap();
        let rng = FixedRng(0.5);
        assert_eq!(random_instant_in(t, t, &rng), t);
    }
}
