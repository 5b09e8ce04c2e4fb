// src/agent.rs
//
// Agent capability and baseline agents.
//
// Agents map the previous observation to an action plus a diagnostic info
// mapping. The driver makes no assumption about agent internals. Learning
// agents live outside this crate; the baselines here exist so environments
// can be exercised end to end:
// - RandomAgent: uniform over the declared action space
// - FixedAgent: always the same action

use rand::Rng;

use crate::env::Info;
use crate::rng::{entropy_rng, seeded_rng, SimRng};
use crate::space::ActionSpace;

/// Chooses an action given the previous observation.
pub trait Agent<O, A> {
    /// Returns (chosen action, extra information).
    fn act(&mut self, previous_observation: &O) -> (A, Info);
}

impl<O, A, G: Agent<O, A> + ?Sized> Agent<O, A> for Box<G> {
    fn act(&mut self, previous_observation: &O) -> (A, Info) {
        (**self).act(previous_observation)
    }
}

/// Uniformly random choice over an action space.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    space: ActionSpace,
    rng: SimRng,
}

impl RandomAgent {
    pub fn new(space: ActionSpace) -> Self {
        Self {
            space,
            rng: entropy_rng(),
        }
    }

    pub fn with_seed(space: ActionSpace, seed: u64) -> Self {
        Self {
            space,
            rng: seeded_rng(seed),
        }
    }

    pub fn space(&self) -> &ActionSpace {
        &self.space
    }
}

// Scalar actions only exist in a non-empty discrete space. Anything else
// yields 0, which the environment rejects as outside its space.
impl<O> Agent<O, usize> for RandomAgent {
    fn act(&mut self, _previous_observation: &O) -> (usize, Info) {
        let action = match self.space {
            ActionSpace::Discrete(n) if n > 0 => self.rng.gen_range(0..n),
            _ => 0,
        };
        (action, Info::new())
    }
}

impl<O> Agent<O, Vec<usize>> for RandomAgent {
    fn act(&mut self, _previous_observation: &O) -> (Vec<usize>, Info) {
        (self.space.sample(&mut self.rng).unwrap_or_default(), Info::new())
    }
}

/// Always plays the same action.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedAgent<A> {
    action: A,
}

impl<A: Clone> FixedAgent<A> {
    pub fn new(action: A) -> Self {
        Self { action }
    }
}

impl<O, A: Clone> Agent<O, A> for FixedAgent<A> {
    fn act(&mut self, _previous_observation: &O) -> (A, Info) {
        (self.action.clone(), Info::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_agent_stays_in_space() {
        let space = ActionSpace::Discrete(3);
        let mut agent = RandomAgent::with_seed(space.clone(), 1);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let (a, info): (usize, Info) = agent.act(&());
            assert!(space.contains_index(a));
            assert!(info.is_empty());
            seen[a] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_scalar_random_agent_needs_discrete_space() {
        let mut agent = RandomAgent::with_seed(ActionSpace::MultiDiscrete(vec![1, 5]), 3);
        for _ in 0..20 {
            let (a, _): (usize, Info) = agent.act(&());
            assert_eq!(a, 0);
        }
        let mut empty = RandomAgent::with_seed(ActionSpace::Discrete(0), 3);
        assert_eq!(Agent::<(), usize>::act(&mut empty, &()).0, 0);
    }

    #[test]
    fn test_random_agent_multi_discrete() {
        let space = ActionSpace::MultiDiscrete(vec![2, 4]);
        let mut agent = RandomAgent::with_seed(space.clone(), 5);
        for _ in 0..50 {
            let (a, _): (Vec<usize>, Info) = agent.act(&false);
            assert!(space.contains_indices(&a));
        }
    }

    #[test]
    fn test_random_agent_seeded_reproducible() {
        let mut a = RandomAgent::with_seed(ActionSpace::Discrete(10), 42);
        let mut b = RandomAgent::with_seed(ActionSpace::Discrete(10), 42);
        for _ in 0..20 {
            let (x, _): (usize, Info) = a.act(&0u64);
            let (y, _): (usize, Info) = b.act(&0u64);
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_fixed_agent() {
        let mut agent = FixedAgent::new(2usize);
        assert_eq!(Agent::<(), usize>::act(&mut agent, &()).0, 2);
        let mut boxed: Box<dyn Agent<(), usize>> = Box::new(FixedAgent::new(1usize));
        assert_eq!(boxed.act(&()).0, 1);
    }
}
