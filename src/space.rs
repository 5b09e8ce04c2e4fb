// src/space.rs
//
// Declared action spaces.
//
// - Discrete(n): a single index in 0..n
// - MultiDiscrete(bounds): one index per slot, slot i in 0..bounds[i]
//
// Environments check membership before doing anything with an action;
// agents use the space to know what they may choose.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSpace {
    Discrete(usize),
    MultiDiscrete(Vec<usize>),
}

impl ActionSpace {
    /// Membership for a single index.
    pub fn contains_index(&self, action: usize) -> bool {
        match self {
            ActionSpace::Discrete(n) => action < *n,
            ActionSpace::MultiDiscrete(_) => false,
        }
    }

    /// Membership for a tuple of indices.
    pub fn contains_indices(&self, action: &[usize]) -> bool {
        match self {
            ActionSpace::Discrete(_) => false,
            ActionSpace::MultiDiscrete(bounds) => {
                action.len() == bounds.len() && action.iter().zip(bounds).all(|(a, b)| a < b)
            }
        }
    }

    /// Number of slots in an action (1 for discrete spaces).
    pub fn arity(&self) -> usize {
        match self {
            ActionSpace::Discrete(_) => 1,
            ActionSpace::MultiDiscrete(bounds) => bounds.len(),
        }
    }

    /// Whether no valid action exists.
    pub fn is_empty(&self) -> bool {
        match self {
            ActionSpace::Discrete(n) => *n == 0,
            ActionSpace::MultiDiscrete(bounds) => bounds.iter().any(|b| *b == 0),
        }
    }

    /// Uniformly sample one index per slot. Returns None for an empty space.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec<usize>> {
        if self.is_empty() {
            return None;
        }
        let sampled = match self {
            ActionSpace::Discrete(n) => vec![rng.gen_range(0..*n)],
            ActionSpace::MultiDiscrete(bounds) => {
                bounds.iter().map(|b| rng.gen_range(0..*b)).collect()
            }
        };
        Some(sampled)
    }
}

impl fmt::Display for ActionSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSpace::Discrete(n) => write!(f, "Discrete({n})"),
            ActionSpace::MultiDiscrete(bounds) => write!(f, "MultiDiscrete({bounds:?})"),
        }
    }
}
