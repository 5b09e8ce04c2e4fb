// src/simulation.rs
//
// Simulation driver: one agent against one environment for a single episode.
//
// Running -> Done when the environment reports `done`;
// Running -> StoppedEarly when `max_iters` steps pass without it. The latter
// is returned as an error and never as a truncated history.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::env::Environment;
use crate::error::{SimError, SimResult};
use crate::history::History;

/// Default step ceiling per run.
pub const DEFAULT_MAX_ITERS: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub max_iters: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iters: DEFAULT_MAX_ITERS,
        }
    }
}

impl RunConfig {
    pub fn new(max_iters: u64) -> Self {
        Self { max_iters }
    }
}

/// Driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Done,
    StoppedEarly,
}

/// A completed run.
#[derive(Debug, Clone)]
pub struct SimulationRun<O, A> {
    pub history: History<O, A>,
    pub elapsed: Duration,
}

impl<O, A> SimulationRun<O, A> {
    /// Steps taken, excluding the reset record.
    pub fn num_steps(&self) -> usize {
        self.history.len().saturating_sub(1)
    }
}

/// Run `agent` on `env` until the episode ends.
///
/// The returned history opens with a record holding only the reset
/// observation, followed by one record per step.
pub fn run<E, G>(
    agent: &mut G,
    env: &mut E,
    config: &RunConfig,
) -> SimResult<SimulationRun<E::Observation, E::Action>>
where
    E: Environment + ?Sized,
    E::Observation: Clone,
    E::Action: Clone,
    G: Agent<E::Observation, E::Action> + ?Sized,
{
    let mut observation = env.reset();
    let mut history = History::new();
    history.append(None, Some(observation.clone()), None, None, None, None);

    let start = Instant::now();
    let mut state = RunState::Running;
    for _ in 0..config.max_iters {
        let (action, agent_info) = agent.act(&observation);
        let result = env.step(&action)?;
        history.append(
            Some(action),
            Some(result.observation.clone()),
            Some(result.reward),
            Some(result.done),
            Some(result.info),
            Some(agent_info),
        );
        observation = result.observation;
        if result.done {
            state = RunState::Done;
            break;
        }
    }
    let elapsed = start.elapsed();
    if state == RunState::Running {
        state = RunState::StoppedEarly;
    }
    debug!(?state, steps = history.len().saturating_sub(1), "simulation loop exited");

    match state {
        RunState::Done => {
            info!(
                steps = history.len() - 1,
                elapsed_ms = elapsed.as_millis() as u64,
                "run finished"
            );
            Ok(SimulationRun { history, elapsed })
        }
        _ => {
            warn!(max_iters = config.max_iters, "environment never signalled done");
            Err(SimError::StoppedEarly {
                max_iters: config.max_iters,
            })
        }
    }
}
