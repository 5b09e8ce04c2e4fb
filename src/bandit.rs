// src/bandit.rs
//
// Single stochastic unit ("bandit"): one entity with a fixed base success
// probability, like a slot machine arm. A draw may be scaled by an external
// multiplier; the effective probability is always clamped into [0, 1].

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bandit {
    base_rate: f64,
}

impl Bandit {
    /// Create a unit with the given base success probability.
    pub fn new(base_rate: f64) -> SimResult<Self> {
        if !(0.0..=1.0).contains(&base_rate) {
            return Err(SimError::InvalidProbability {
                name: "base_rate",
                value: base_rate,
            });
        }
        Ok(Self { base_rate })
    }

    /// Build one unit per rate.
    pub fn from_rates(rates: &[f64]) -> SimResult<Vec<Self>> {
        rates.iter().map(|r| Bandit::new(*r)).collect()
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// Probability of success under `multiplier`.
    ///
    /// Floors at 0 as well as capping at 1, so negative multipliers never
    /// succeed. NaN products are treated as 0.
    pub fn effective_rate(&self, multiplier: f64) -> f64 {
        let p = self.base_rate * multiplier;
        if p.is_nan() {
            0.0
        } else {
            p.clamp(0.0, 1.0)
        }
    }

    /// One Bernoulli draw with probability `effective_rate(multiplier)`.
    pub fn action<R: Rng + ?Sized>(&self, multiplier: f64, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.effective_rate(multiplier)
    }
}
