//! Randomized delays between requests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Shortest delay the gate will ever hand out
pub const MIN_DELAY: Duration = Duration::from_millis(500);

/// Computes the pause before the next request
///
/// Each delay is `base + uniform(-jitter, +jitter)`, clamped to at least
/// [`MIN_DELAY`]. The random source is injectable so tests can replay a
/// sequence.
#[derive(Debug, Clone)]
pub struct RateGate<R = StdRng> {
    base: f64,
    jitter: f64,
    rng: R,
}

impl RateGate<StdRng> {
    /// Creates a gate seeded from system entropy
    ///
    /// `base` and `jitter` are in seconds.
    pub fn new(base: f64, jitter: f64) -> Self {
        Self::with_rng(base, jitter, StdRng::from_entropy())
    }

    /// Creates a gate with a fixed seed; equal seeds yield equal sequences
    pub fn seeded(base: f64, jitter: f64, seed: u64) -> Self {
        Self::with_rng(base, jitter, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RateGate<R> {
    pub fn with_rng(base: f64, jitter: f64, rng: R) -> Self {
        Self {
            base: base.max(0.0),
            jitter: jitter.abs(),
            rng,
        }
    }

    /// Returns the next delay
    pub fn next_delay(&mut self) -> Duration {
        let offset = if self.jitter > 0.0 {
            self.rng.gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        };

        let seconds = (self.base + offset).max(MIN_DELAY.as_secs_f64());
        Duration::from_secs_f64(seconds)
    }
}
