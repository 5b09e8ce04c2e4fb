// src/env/single.rs
//
// Environments where each step is an interaction with a single entity.
//
// Three drop-in variants of widening capability:
// - FlatBandits: action = unit index, multiplier 1.0
// - ContextualBandits: action = (unit, one category per context dimension),
//   multiplier = product of the selected category weights
// - TimestepContextualBandits: action = unit index, multiplier = product of an
//   ordered list of modifiers, every one of which advances on every step
//
// None of these is episodic: `done` is always false.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Environment, Info, StepResult};
use crate::bandit::Bandit;
use crate::error::{SimError, SimResult};
use crate::modifier::{combined_multiplier, Modifier, Periodic, RandomWalk};
use crate::rng::{derive_seed, entropy_rng, seeded_rng, SimRng};
use crate::space::ActionSpace;

fn bandit_step(observation: bool) -> StepResult<bool> {
    StepResult {
        observation,
        reward: if observation { 1.0 } else { 0.0 },
        done: false,
        info: Info::new(),
    }
}

// ============================================================================
// Flat
// ============================================================================

/// N independent units, each with a static success rate.
#[derive(Debug, Clone)]
pub struct FlatBandits {
    bandits: Vec<Bandit>,
    rng: SimRng,
}

impl FlatBandits {
    pub fn new(bandits: Vec<Bandit>) -> Self {
        Self::with_rng(bandits, entropy_rng())
    }

    pub fn with_rng(bandits: Vec<Bandit>, rng: SimRng) -> Self {
        Self { bandits, rng }
    }

    pub fn bandits(&self) -> &[Bandit] {
        &self.bandits
    }
}

impl Environment for FlatBandits {
    type Observation = bool;
    type Action = usize;

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(self.bandits.len())
    }

    fn reset(&mut self) -> bool {
        false
    }

    fn step(&mut self, action: &usize) -> SimResult<StepResult<bool>> {
        let bandit = self
            .bandits
            .get(*action)
            .ok_or_else(|| SimError::invalid_action(action, self.action_space()))?;
        Ok(bandit_step(bandit.action(1.0, &mut self.rng)))
    }

    fn seed(&mut self, seed: u64) {
        self.rng = seeded_rng(seed);
    }
}

// ============================================================================
// Context
// ============================================================================

/// One named context dimension: ordered category labels and their weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDimension {
    pub name: String,
    pub categories: Vec<String>,
    pub weights: Vec<f64>,
}

/// Ordered set of context dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    dimensions: Vec<ContextDimension>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dimension; categories keep the order given.
    pub fn with_dimension<S, L>(
        mut self,
        name: S,
        categories: impl IntoIterator<Item = (L, f64)>,
    ) -> Self
    where
        S: Into<String>,
        L: Into<String>,
    {
        let (labels, weights): (Vec<String>, Vec<f64>) =
            categories.into_iter().map(|(l, w)| (l.into(), w)).unzip();
        self.dimensions.push(ContextDimension {
            name: name.into(),
            categories: labels,
            weights,
        });
        self
    }

    pub fn dimensions(&self) -> &[ContextDimension] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Index of `label` within `dimension`.
    pub fn category_index(&self, dimension: &str, label: &str) -> Option<usize> {
        self.dimensions
            .iter()
            .find(|d| d.name == dimension)
            .and_then(|d| d.categories.iter().position(|c| c == label))
    }

    /// Product of the selected weights, one index per dimension in order.
    ///
    /// None if the arity is wrong or any index is out of range.
    pub fn multiplier(&self, indices: &[usize]) -> Option<f64> {
        if indices.len() != self.dimensions.len() {
            return None;
        }
        self.dimensions
            .iter()
            .zip(indices)
            .try_fold(1.0, |acc, (dim, idx)| dim.weights.get(*idx).map(|w| acc * w))
    }

    /// Resolve a label selection into category indices, in dimension order.
    ///
    /// Every dimension must be selected exactly once with a known label.
    pub fn resolve(&self, selection: &[(&str, &str)]) -> SimResult<Vec<usize>> {
        let chosen: BTreeMap<&str, &str> = selection.iter().copied().collect();
        if chosen.len() != selection.len() {
            return Err(SimError::InvalidAction {
                action: format!("{selection:?}"),
                space: "context dimension selected twice".to_string(),
            });
        }
        if let Some((extra, _)) = selection
            .iter()
            .find(|(name, _)| !self.dimensions.iter().any(|d| d.name == *name))
        {
            return Err(SimError::InvalidAction {
                action: format!("{selection:?}"),
                space: format!("unknown context dimension '{extra}'"),
            });
        }
        self.dimensions
            .iter()
            .map(|dim| {
                let label = chosen.get(dim.name.as_str()).ok_or_else(|| SimError::InvalidAction {
                    action: format!("{selection:?}"),
                    space: format!("missing context dimension '{}'", dim.name),
                })?;
                dim.categories
                    .iter()
                    .position(|c| c.as_str() == *label)
                    .ok_or_else(|| SimError::InvalidAction {
                        action: format!("{selection:?}"),
                        space: format!("unknown category '{}' in dimension '{}'", label, dim.name),
                    })
            })
            .collect()
    }
}

// ============================================================================
// Contextual
// ============================================================================

/// Units whose rates are scaled by a static context chosen with the action.
#[derive(Debug, Clone)]
pub struct ContextualBandits {
    bandits: Vec<Bandit>,
    context: Context,
    rng: SimRng,
}

impl ContextualBandits {
    pub fn new(bandits: Vec<Bandit>, context: Context) -> Self {
        Self::with_rng(bandits, context, entropy_rng())
    }

    pub fn with_rng(bandits: Vec<Bandit>, context: Context, rng: SimRng) -> Self {
        Self {
            bandits,
            context,
            rng,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Build an action from a unit index and a label per dimension.
    pub fn action_for(&self, unit: usize, selection: &[(&str, &str)]) -> SimResult<Vec<usize>> {
        let mut action = Vec::with_capacity(1 + self.context.len());
        action.push(unit);
        action.extend(self.context.resolve(selection)?);
        if !self.action_space().contains_indices(&action) {
            return Err(SimError::invalid_action(&action, self.action_space()));
        }
        Ok(action)
    }
}

impl Environment for ContextualBandits {
    type Observation = bool;
    type Action = Vec<usize>;

    fn action_space(&self) -> ActionSpace {
        let mut bounds = Vec::with_capacity(1 + self.context.len());
        bounds.push(self.bandits.len());
        bounds.extend(self.context.dimensions().iter().map(|d| d.weights.len()));
        ActionSpace::MultiDiscrete(bounds)
    }

    fn reset(&mut self) -> bool {
        false
    }

    fn step(&mut self, action: &Vec<usize>) -> SimResult<StepResult<bool>> {
        let space = self.action_space();
        if !space.contains_indices(action) {
            return Err(SimError::invalid_action(action, space));
        }
        let multiplier = self
            .context
            .multiplier(&action[1..])
            .ok_or_else(|| SimError::invalid_action(action, &space))?;
        let observation = self.bandits[action[0]].action(multiplier, &mut self.rng);
        Ok(bandit_step(observation))
    }

    fn seed(&mut self, seed: u64) {
        self.rng = seeded_rng(seed);
    }
}

// ============================================================================
// Timestep-contextual
// ============================================================================

/// Units whose rates are scaled by modifiers that evolve with the timestep.
///
/// Modifiers keep their state across `reset()`: drift is relative to the
/// environment instance, not the episode.
pub struct TimestepContextualBandits {
    bandits: Vec<Bandit>,
    modifiers: Vec<Box<dyn Modifier>>,
    timestep: u64,
    rng: SimRng,
}

impl TimestepContextualBandits {
    pub fn new(bandits: Vec<Bandit>, modifiers: Vec<Box<dyn Modifier>>) -> Self {
        Self::with_rng(bandits, modifiers, entropy_rng())
    }

    pub fn with_rng(bandits: Vec<Bandit>, modifiers: Vec<Box<dyn Modifier>>, rng: SimRng) -> Self {
        Self {
            bandits,
            modifiers,
            timestep: 0,
            rng,
        }
    }

    /// Steps taken since construction.
    pub fn timestep(&self) -> u64 {
        self.timestep
    }
}

impl Environment for TimestepContextualBandits {
    type Observation = bool;
    type Action = usize;

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(self.bandits.len())
    }

    fn reset(&mut self) -> bool {
        false
    }

    fn step(&mut self, action: &usize) -> SimResult<StepResult<bool>> {
        if *action >= self.bandits.len() {
            return Err(SimError::invalid_action(action, self.action_space()));
        }
        let multiplier = combined_multiplier(&mut self.modifiers);
        self.timestep += 1;
        let observation = self.bandits[*action].action(multiplier, &mut self.rng);
        Ok(bandit_step(observation))
    }

    fn seed(&mut self, seed: u64) {
        self.rng = seeded_rng(seed);
        for (i, modifier) in self.modifiers.iter_mut().enumerate() {
            modifier.reseed(derive_seed(seed, i));
        }
    }
}

/// Two low-rate units under a bounded random-walk trend and a weekend uplift.
pub fn weekly_with_trend() -> SimResult<TimestepContextualBandits> {
    let bandits = Bandit::from_rates(&[0.01, 0.02])?;
    let modifiers: Vec<Box<dyn Modifier>> = vec![
        Box::new(RandomWalk::new(0.8, 1.2, 0.01, entropy_rng())?),
        Box::new(Periodic::weekly(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.2, 1.2])?),
    ];
    Ok(TimestepContextualBandits::new(bandits, modifiers))
}
