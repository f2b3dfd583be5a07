//! Randomized politeness delays.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A uniformly random pause between `min` and `max` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl DelayRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// No delay at all.
    pub const fn none() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Pick a duration from the range. Negative or reversed bounds are clamped.
    pub fn sample(&self) -> Duration {
        let min = if self.min.is_finite() { self.min.max(0.0) } else { 0.0 };
        let max = if self.max.is_finite() { self.max.max(min) } else { min };
        let secs = if max > min {
            rand::rng().random_range(min..=max)
        } else {
            min
        };
        Duration::from_secs_f64(secs)
    }

    pub async fn sleep(&self) {
        let pause = self.sample();
        if pause.is_zero() {
            return;
        }
        debug!("Sleeping {:?}", pause);
        tokio::time::sleep(pause).await;
    }
}
