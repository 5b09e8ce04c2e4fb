// src/modifier.rs
//
// Per-step multiplicative modifiers.
//
// A modifier returns its contribution for the next logical timestep and
// advances its own state each time `step()` is called. Environments hold an
// ordered list of them and multiply the results together, advancing every
// modifier exactly once per environment step.
//
// Variants:
// - Periodic: looks up a caller-supplied function of the timestep
// - RandomWalk: bounded walk driven by independent fair coin flips

use std::fmt;

use rand::{Rng, RngCore};

use crate::error::{SimError, SimResult};
use crate::rng::seeded_rng;

/// Number of days in the weekly cycle.
pub const DAYS_PER_WEEK: usize = 7;

/// A stateful source of per-step multipliers.
pub trait Modifier: Send {
    /// Return the multiplier for the current timestep, then advance.
    fn step(&mut self) -> f64;

    /// Replace any owned random stream with one seeded from `seed`.
    ///
    /// Deterministic modifiers ignore this.
    fn reseed(&mut self, _seed: u64) {}
}

/// Product of one `step()` per modifier, in order.
pub fn combined_multiplier(modifiers: &mut [Box<dyn Modifier>]) -> f64 {
    modifiers.iter_mut().fold(1.0, |acc, m| acc * m.step())
}

/// Build a 7-day periodicity function from exactly seven multipliers.
///
/// The day index is `timestep mod 7`.
pub fn weekly_periodicity(multipliers: &[f64]) -> SimResult<impl Fn(u64) -> f64 + Send + Sync> {
    if multipliers.len() != DAYS_PER_WEEK {
        return Err(SimError::InvalidPeriodicity {
            len: multipliers.len(),
        });
    }
    let mut week = [0.0; DAYS_PER_WEEK];
    week.copy_from_slice(multipliers);
    Ok(move |timestep: u64| week[(timestep % DAYS_PER_WEEK as u64) as usize])
}

/// Modifier driven by a fixed function of the timestep.
pub struct Periodic {
    timestep: u64,
    periodicity: Box<dyn Fn(u64) -> f64 + Send + Sync>,
}

impl Periodic {
    pub fn new(periodicity: impl Fn(u64) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            timestep: 0,
            periodicity: Box::new(periodicity),
        }
    }

    /// Weekly cycle over seven multipliers.
    pub fn weekly(multipliers: &[f64]) -> SimResult<Self> {
        Ok(Self::new(weekly_periodicity(multipliers)?))
    }

    /// Timestep the next `step()` will evaluate.
    pub fn timestep(&self) -> u64 {
        self.timestep
    }
}

impl Modifier for Periodic {
    fn step(&mut self) -> f64 {
        let multiplier = (self.periodicity)(self.timestep);
        self.timestep += 1;
        multiplier
    }
}

impl fmt::Debug for Periodic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Periodic")
            .field("timestep", &self.timestep)
            .finish_non_exhaustive()
    }
}

/// Starting value of a random walk unless overridden.
pub const RANDOM_WALK_START: f64 = 1.0;

/// Bounded random walk.
///
/// Each step flips a fair coin: below 0.5 moves down by `step_size`,
/// otherwise up; the result is clamped into `[lower, upper]`.
pub struct RandomWalk {
    current: f64,
    lower: f64,
    upper: f64,
    step_size: f64,
    rng: Box<dyn RngCore + Send>,
}

impl RandomWalk {
    /// Walk starting at 1.0 (clamped into the bounds).
    pub fn new(
        lower: f64,
        upper: f64,
        step_size: f64,
        rng: impl RngCore + Send + 'static,
    ) -> SimResult<Self> {
        if !(lower <= upper) {
            return Err(SimError::InvalidParameter {
                name: "lower".to_string(),
                reason: format!("lower bound {lower} exceeds upper bound {upper}"),
            });
        }
        if !(step_size >= 0.0) || !step_size.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "step_size".to_string(),
                reason: format!("must be finite and non-negative, got {step_size}"),
            });
        }
        Ok(Self {
            current: RANDOM_WALK_START.clamp(lower, upper),
            lower,
            upper,
            step_size,
            rng: Box::new(rng),
        })
    }

    /// Override the starting value (clamped into the bounds).
    pub fn with_start(mut self, start: f64) -> Self {
        self.current = start.clamp(self.lower, self.upper);
        self
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

impl Modifier for RandomWalk {
    fn step(&mut self) -> f64 {
        let direction = if self.rng.gen::<f64>() < 0.5 { -1.0 } else { 1.0 };
        self.current = (self.current + direction * self.step_size).clamp(self.lower, self.upper);
        self.current
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = Box::new(seeded_rng(seed));
    }
}

impl fmt::Debug for RandomWalk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomWalk")
            .field("current", &self.current)
            .field("lower", &self.lower)
            .field("upper", &self.upper)
            .field("step_size", &self.step_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRng;

    const DOWN: f64 = 0.0;
    const UP: f64 = 0.9;

    #[test]
    fn test_weekly_periodicity_cycles() {
        let week = [1.0, 1.0, 1.0, 1.0, 1.0, 1.2, 1.2];
        let mut modifier = Periodic::weekly(&week).unwrap();
        for t in 0..30 {
            assert_eq!(modifier.step(), week[t % 7], "timestep {}", t);
        }
        assert_eq!(modifier.timestep(), 30);
    }

    #[test]
    fn test_weekly_periodicity_rejects_wrong_length() {
        assert!(matches!(
            Periodic::weekly(&[1.0; 6]),
            Err(SimError::InvalidPeriodicity { len: 6 })
        ));
        assert!(Periodic::weekly(&[1.0; 8]).is_err());
        assert!(weekly_periodicity(&[]).is_err());
    }

    #[test]
    fn test_random_walk_forced_sequence() {
        let rng = ScriptedRng::from_units(&[DOWN, DOWN, UP, UP]);
        let mut walk = RandomWalk::new(0.0, 1.0, 1.0, rng).unwrap();
        let seq: Vec<f64> = (0..4).map(|_| walk.step()).collect();
        assert_eq!(seq, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_random_walk_never_leaves_bounds() {
        let mut walk = RandomWalk::new(0.8, 1.2, 0.07, seeded_rng(11)).unwrap();
        for _ in 0..2_000 {
            let v = walk.step();
            assert!((0.8..=1.2).contains(&v), "left bounds: {}", v);
        }
    }

    #[test]
    fn test_random_walk_start_is_clamped() {
        let walk = RandomWalk::new(2.0, 3.0, 0.1, seeded_rng(1)).unwrap();
        assert_eq!(walk.current(), 2.0);
        let walk = walk.with_start(10.0);
        assert_eq!(walk.current(), 3.0);
    }

    #[test]
    fn test_random_walk_rejects_bad_bounds() {
        assert!(RandomWalk::new(1.0, 0.0, 0.1, seeded_rng(1)).is_err());
        assert!(RandomWalk::new(0.0, 1.0, -0.1, seeded_rng(1)).is_err());
    }

    #[test]
    fn test_reseed_makes_walks_identical() {
        let mut a = RandomWalk::new(0.0, 2.0, 0.1, seeded_rng(1)).unwrap();
        let mut b = RandomWalk::new(0.0, 2.0, 0.1, seeded_rng(99)).unwrap();
        a.reseed(5);
        b.reseed(5);
        for _ in 0..20 {
            assert_eq!(a.step(), b.step());
        }
    }

    #[test]
    fn test_combined_multiplier_advances_each_once() {
        let mut modifiers: Vec<Box<dyn Modifier>> = vec![
            Box::new(Periodic::new(|t| t as f64 + 1.0)),
            Box::new(Periodic::new(|_| 2.0)),
        ];
        assert_eq!(combined_multiplier(&mut modifiers), 2.0);
        assert_eq!(combined_multiplier(&mut modifiers), 4.0);
        assert_eq!(combined_multiplier(&mut modifiers), 6.0);
        assert_eq!(combined_multiplier(&mut []), 1.0);
    }
}
