// src/env/behaviour.rs
//
// Built-in cohort behaviours.
//
// Each holds a (interaction, conversion) pair per strategy and scales it with
// a function of the timestep:
// - StaticBehaviour: unscaled
// - WeeklySine: sin(2π·(t mod 7)/7) + 1, a weekly swing between 0 and ~2
// - LinearTrend: 0.5 + min(0.0025·t, 1), rising to a plateau

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::cohort::Behaviour;
use crate::error::{SimError, SimResult};

/// Per-strategy (interaction, conversion) probabilities.
pub type StrategyParams = Vec<(f64, f64)>;

fn params_for(params: &[(f64, f64)], strategy: usize) -> SimResult<(f64, f64)> {
    params.get(strategy).copied().ok_or_else(|| SimError::InvalidAction {
        action: strategy.to_string(),
        space: format!("behaviour with {} strategies", params.len()),
    })
}

fn scaled(params: (f64, f64), modifier: f64) -> (f64, f64) {
    (params.0 * modifier, params.1 * modifier)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticBehaviour {
    pub params: StrategyParams,
}

impl StaticBehaviour {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }
}

impl Behaviour for StaticBehaviour {
    fn probabilities(&self, strategy: usize, _timestep: u64) -> SimResult<(f64, f64)> {
        params_for(&self.params, strategy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySine {
    pub params: StrategyParams,
}

impl WeeklySine {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    /// Multiplier applied at `timestep`.
    pub fn modifier(timestep: u64) -> f64 {
        let day_of_week = (timestep % 7) as f64;
        ((day_of_week / 7.0) * 2.0 * PI).sin() + 1.0
    }
}

impl Behaviour for WeeklySine {
    fn probabilities(&self, strategy: usize, timestep: u64) -> SimResult<(f64, f64)> {
        Ok(scaled(params_for(&self.params, strategy)?, Self::modifier(timestep)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub params: StrategyParams,
}

impl LinearTrend {
    pub const BASE: f64 = 0.5;
    pub const SLOPE: f64 = 0.0025;
    pub const MAX_RISE: f64 = 1.0;

    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    /// Multiplier applied at `timestep`.
    pub fn modifier(timestep: u64) -> f64 {
        Self::BASE + (timestep as f64 * Self::SLOPE).min(Self::MAX_RISE)
    }
}

impl Behaviour for LinearTrend {
    fn probabilities(&self, strategy: usize, timestep: u64) -> SimResult<(f64, f64)> {
        Ok(scaled(params_for(&self.params, strategy)?, Self::modifier(timestep)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StrategyParams {
        vec![(0.5, 0.2), (0.5, 0.3)]
    }

    #[test]
    fn test_static_returns_configured_pair() {
        let b = StaticBehaviour::new(params());
        assert_eq!(b.probabilities(1, 100).unwrap(), (0.5, 0.3));
        assert!(b.probabilities(2, 0).is_err());
    }

    #[test]
    fn test_weekly_sine_stays_in_range_and_repeats() {
        let b = WeeklySine::new(params());
        for t in 0..28 {
            let (i, c) = b.probabilities(0, t).unwrap();
            assert!((0.0..=1.0).contains(&i), "t={} interaction={}", t, i);
            assert!((0.0..=1.0).contains(&c), "t={} conversion={}", t, c);
            assert_eq!(b.probabilities(0, t).unwrap(), b.probabilities(0, t + 7).unwrap());
        }
        assert!((WeeklySine::modifier(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_trend_plateaus() {
        assert_eq!(LinearTrend::modifier(0), 0.5);
        assert!((LinearTrend::modifier(200) - 1.0).abs() < 1e-12);
        assert_eq!(LinearTrend::modifier(400), 1.5);
        assert_eq!(LinearTrend::modifier(10_000), 1.5);

        let b = LinearTrend::new(params());
        let (i, c) = b.probabilities(0, 1_000).unwrap();
        assert!((i - 0.75).abs() < 1e-12);
        assert!((c - 0.3).abs() < 1e-12);
    }
}
