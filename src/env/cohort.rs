// src/env/cohort.rs
//
// Cohort-level binomial process ("discrete strategy binomial").
//
// A whole cohort of `cohort_size` entities is exposed to one of a fixed set
// of named strategies per step. A behaviour maps (strategy, timestep) to an
// interaction probability and a conversion probability, and the step draws
//
//   interactions ~ Binomial(cohort_size, p_interaction)
//   conversions  ~ Binomial(interactions, p_conversion)
//
// Conversions are conditioned on interactions, never drawn independently.
// The process is episodic: after `episode_length` steps it must be reset.

use std::fmt;

use rand_distr::{Binomial, Distribution};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Environment, Info, StepResult};
use crate::error::{SimError, SimResult};
use crate::rng::{entropy_rng, seeded_rng, SimRng};
use crate::space::ActionSpace;

/// Info key carrying the interaction probability used for a step.
pub const INFO_INTERACTION_PROBABILITY: &str = "interaction_probability";
/// Info key carrying the conversion probability used for a step.
pub const INFO_CONVERSION_PROBABILITY: &str = "conversion_probability";

/// Maps (strategy index, timestep) to (interaction, conversion) probabilities.
pub trait Behaviour: Send {
    fn probabilities(&self, strategy: usize, timestep: u64) -> SimResult<(f64, f64)>;
}

impl<F> Behaviour for F
where
    F: Fn(usize, u64) -> (f64, f64) + Send,
{
    fn probabilities(&self, strategy: usize, timestep: u64) -> SimResult<(f64, f64)> {
        Ok(self(strategy, timestep))
    }
}

/// Observation of one cohort step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CohortObservation {
    pub interactions: u64,
    pub conversions: u64,
}

impl CohortObservation {
    pub fn new(interactions: u64, conversions: u64) -> Self {
        Self {
            interactions,
            conversions,
        }
    }
}

fn check_probability(name: &'static str, value: f64) -> SimResult<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SimError::InvalidProbability { name, value })
    }
}

fn binomial_draw(n: u64, p: f64, name: &'static str, rng: &mut SimRng) -> SimResult<u64> {
    let dist = Binomial::new(n, p).map_err(|_| SimError::InvalidProbability { name, value: p })?;
    Ok(dist.sample(rng))
}

pub struct CohortProcess {
    cohort_size: u64,
    episode_length: u64,
    strategies: Vec<String>,
    behaviour: Box<dyn Behaviour>,
    timestep: u64,
    rng: SimRng,
}

impl CohortProcess {
    /// Create a process drawing from an entropy-seeded stream.
    pub fn new<S: Into<String>>(
        cohort_size: u64,
        episode_length: u64,
        strategies: impl IntoIterator<Item = S>,
        behaviour: impl Behaviour + 'static,
    ) -> SimResult<Self> {
        Self::with_rng(cohort_size, episode_length, strategies, behaviour, entropy_rng())
    }

    pub fn with_rng<S: Into<String>>(
        cohort_size: u64,
        episode_length: u64,
        strategies: impl IntoIterator<Item = S>,
        behaviour: impl Behaviour + 'static,
        rng: SimRng,
    ) -> SimResult<Self> {
        if episode_length == 0 {
            return Err(SimError::InvalidParameter {
                name: "episode_length".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(Self {
            cohort_size,
            episode_length,
            strategies: strategies.into_iter().map(Into::into).collect(),
            behaviour: Box::new(behaviour),
            timestep: 0,
            rng,
        })
    }

    pub fn cohort_size(&self) -> u64 {
        self.cohort_size
    }

    pub fn episode_length(&self) -> u64 {
        self.episode_length
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn strategies(&self) -> &[String] {
        &self.strategies
    }

    /// Index of a strategy by key.
    pub fn strategy_index(&self, key: &str) -> Option<usize> {
        self.strategies.iter().position(|s| s == key)
    }

    /// Whether the episode has ended and a reset is required.
    pub fn is_done(&self) -> bool {
        self.timestep >= self.episode_length
    }
}

impl Environment for CohortProcess {
    type Observation = CohortObservation;
    type Action = usize;

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(self.strategies.len())
    }

    fn reset(&mut self) -> CohortObservation {
        self.timestep = 0;
        CohortObservation::default()
    }

    fn step(&mut self, action: &usize) -> SimResult<StepResult<CohortObservation>> {
        if self.is_done() {
            return Err(SimError::ResetNeeded);
        }
        if *action >= self.strategies.len() {
            return Err(SimError::invalid_action(action, self.action_space()));
        }

        let (p_interaction, p_conversion) = self.behaviour.probabilities(*action, self.timestep)?;
        let p_interaction = check_probability(INFO_INTERACTION_PROBABILITY, p_interaction)?;
        let p_conversion = check_probability(INFO_CONVERSION_PROBABILITY, p_conversion)?;

        let interactions = binomial_draw(
            self.cohort_size,
            p_interaction,
            INFO_INTERACTION_PROBABILITY,
            &mut self.rng,
        )?;
        let conversions = binomial_draw(
            interactions,
            p_conversion,
            INFO_CONVERSION_PROBABILITY,
            &mut self.rng,
        )?;

        self.timestep += 1;
        let done = self.is_done();
        if done {
            debug!(
                episode_length = self.episode_length,
                "cohort episode finished"
            );
        }

        let mut info = Info::new();
        info.insert(INFO_INTERACTION_PROBABILITY.to_string(), p_interaction.into());
        info.insert(INFO_CONVERSION_PROBABILITY.to_string(), p_conversion.into());

        Ok(StepResult {
            observation: CohortObservation::new(interactions, conversions),
            reward: conversions as f64,
            done,
            info,
        })
    }

    fn seed(&mut self, seed: u64) {
        self.rng = seeded_rng(seed);
    }
}

impl fmt::Debug for CohortProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CohortProcess")
            .field("cohort_size", &self.cohort_size)
            .field("episode_length", &self.episode_length)
            .field("strategies", &self.strategies)
            .field("timestep", &self.timestep)
            .finish_non_exhaustive()
    }
}
