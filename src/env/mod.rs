// src/env/mod.rs
//
// Environment capability.
//
// The simulation driver depends only on this trait; concrete environments are
// distinct types rather than a hierarchy:
// - single: bandit environments (flat, contextual, timestep-contextual)
// - cohort: cohort-level binomial process with episode boundaries
// - behaviour: built-in cohort behaviour functions

pub mod behaviour;
pub mod cohort;
pub mod single;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::space::ActionSpace;

/// Diagnostic mapping attached to a step (environment or agent side).
///
/// BTreeMap keeps key order stable for tabular export.
pub type Info = BTreeMap<String, serde_json::Value>;

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult<O> {
    /// The observation after taking the action.
    pub observation: O,
    /// The reward for this step.
    pub reward: f64,
    /// Whether the episode has terminated.
    pub done: bool,
    /// Additional information about the step.
    pub info: Info,
}

/// An environment an agent acts against, one step at a time.
pub trait Environment {
    /// What the agent sees.
    type Observation;
    /// What the agent chooses.
    type Action;

    /// Declared action space; `step` rejects anything outside it.
    fn action_space(&self) -> ActionSpace;

    /// Start (or restart) and return the initial observation.
    fn reset(&mut self) -> Self::Observation;

    /// Advance one timestep under `action`.
    fn step(&mut self, action: &Self::Action) -> SimResult<StepResult<Self::Observation>>;

    /// Reseed every random stream owned by this environment.
    fn seed(&mut self, seed: u64);
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    type Observation = E::Observation;
    type Action = E::Action;

    fn action_space(&self) -> ActionSpace {
        (**self).action_space()
    }

    fn reset(&mut self) -> Self::Observation {
        (**self).reset()
    }

    fn step(&mut self, action: &Self::Action) -> SimResult<StepResult<Self::Observation>> {
        (**self).step(action)
    }

    fn seed(&mut self, seed: u64) {
        (**self).seed(seed)
    }
}

pub use behaviour::{LinearTrend, StaticBehaviour, WeeklySine};
pub use cohort::{Behaviour, CohortObservation, CohortProcess};
pub use single::{
    weekly_with_trend, Context, ContextualBandits, FlatBandits, TimestepContextualBandits,
};
