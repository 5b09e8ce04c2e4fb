// src/history.rs
//
// Append-only record of one simulation run.
//
// Every field of a record is optional: the driver opens each history with a
// record holding only the reset observation. Columns are stored in parallel
// vectors so the learner-visible views borrow contiguous slices.

use serde::Serialize;
use serde_json::Value;

use crate::env::cohort::CohortObservation;
use crate::env::Info;
use crate::error::{SimError, SimResult};
use crate::table::Table;

/// Prefix applied to agent info columns in the tabular projection.
pub const AGENT_INFO_PREFIX: &str = "agent_";

/// Flattens an observation into fixed-arity table cells.
pub trait Components {
    fn components(&self) -> Vec<Value>;
}

impl Components for bool {
    fn components(&self) -> Vec<Value> {
        vec![Value::Bool(*self)]
    }
}

impl Components for u64 {
    fn components(&self) -> Vec<Value> {
        vec![Value::from(*self)]
    }
}

impl Components for f64 {
    fn components(&self) -> Vec<Value> {
        vec![Value::from(*self)]
    }
}

impl<T: Components> Components for Vec<T> {
    fn components(&self) -> Vec<Value> {
        self.iter().flat_map(Components::components).collect()
    }
}

impl<A: Components, B: Components> Components for (A, B) {
    fn components(&self) -> Vec<Value> {
        let mut out = self.0.components();
        out.extend(self.1.components());
        out
    }
}

impl Components for CohortObservation {
    fn components(&self) -> Vec<Value> {
        vec![Value::from(self.interactions), Value::from(self.conversions)]
    }
}

/// Action, observation, reward and done sequences, all the same length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservableView<'a, O, A> {
    pub actions: &'a [Option<A>],
    pub observations: &'a [Option<O>],
    pub rewards: &'a [Option<f64>],
    pub dones: &'a [Option<bool>],
}

/// Observable sequences plus environment and agent info.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullView<'a, O, A> {
    pub actions: &'a [Option<A>],
    pub observations: &'a [Option<O>],
    pub rewards: &'a [Option<f64>],
    pub dones: &'a [Option<bool>],
    pub env_infos: &'a [Option<Info>],
    pub agent_infos: &'a [Option<Info>],
}

impl<'a, O, A> FullView<'a, O, A> {
    pub fn observable(&self) -> ObservableView<'a, O, A> {
        ObservableView {
            actions: self.actions,
            observations: self.observations,
            rewards: self.rewards,
            dones: self.dones,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct History<O, A> {
    actions: Vec<Option<A>>,
    observations: Vec<Option<O>>,
    rewards: Vec<Option<f64>>,
    dones: Vec<Option<bool>>,
    env_infos: Vec<Option<Info>>,
    agent_infos: Vec<Option<Info>>,
}

impl<O, A> Default for History<O, A> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            observations: Vec::new(),
            rewards: Vec::new(),
            dones: Vec::new(),
            env_infos: Vec::new(),
            agent_infos: Vec::new(),
        }
    }
}

impl<O, A> History<O, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        action: Option<A>,
        observation: Option<O>,
        reward: Option<f64>,
        done: Option<bool>,
        env_info: Option<Info>,
        agent_info: Option<Info>,
    ) {
        self.actions.push(action);
        self.observations.push(observation);
        self.rewards.push(reward);
        self.dones.push(done);
        self.env_infos.push(env_info);
        self.agent_infos.push(agent_info);
    }

    /// Number of records, including the initial reset record.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn observable(&self) -> ObservableView<'_, O, A> {
        ObservableView {
            actions: &self.actions,
            observations: &self.observations,
            rewards: &self.rewards,
            dones: &self.dones,
        }
    }

    pub fn all(&self) -> FullView<'_, O, A> {
        FullView {
            actions: &self.actions,
            observations: &self.observations,
            rewards: &self.rewards,
            dones: &self.dones,
            env_infos: &self.env_infos,
            agent_infos: &self.agent_infos,
        }
    }

    /// Latest non-null observation.
    pub fn last_observation(&self) -> Option<&O> {
        self.observations.iter().rev().find_map(Option::as_ref)
    }
}

impl<O: Components, A: Serialize> History<O, A> {
    /// Project into one row per record.
    ///
    /// Columns are `action`, `obs_0..obs_{k-1}`, `reward`, `done`, then the
    /// environment info keys and the agent info keys (prefixed with
    /// [`AGENT_INFO_PREFIX`]) found in the second record. The first record's
    /// info is null, so it cannot be used for key discovery. Keys missing from
    /// a later record produce null cells.
    pub fn to_tabular(&self) -> SimResult<Table> {
        let arity = self
            .observations
            .iter()
            .flatten()
            .next()
            .map(|o| o.components().len())
            .unwrap_or(0);
        let env_keys = info_keys(self.env_infos.get(1));
        let agent_keys = info_keys(self.agent_infos.get(1));

        let mut columns = Vec::with_capacity(3 + arity + env_keys.len() + agent_keys.len());
        columns.push("action".to_string());
        columns.extend((0..arity).map(|i| format!("obs_{}", i)));
        columns.push("reward".to_string());
        columns.push("done".to_string());
        columns.extend(env_keys.iter().cloned());
        columns.extend(agent_keys.iter().map(|k| format!("{}{}", AGENT_INFO_PREFIX, k)));
        let mut table = Table::new(columns);

        for step in 0..self.len() {
            let mut row = Vec::with_capacity(table.columns().len());
            row.push(match &self.actions[step] {
                Some(a) => serde_json::to_value(a)?,
                None => Value::Null,
            });
            match &self.observations[step] {
                Some(o) => {
                    let cells = o.components();
                    if cells.len() != arity {
                        return Err(SimError::RaggedObservation {
                            step,
                            expected: arity,
                            found: cells.len(),
                        });
                    }
                    row.extend(cells);
                }
                None => row.extend(std::iter::repeat(Value::Null).take(arity)),
            }
            row.push(self.rewards[step].map_or(Value::Null, Value::from));
            row.push(self.dones[step].map_or(Value::Null, Value::Bool));
            push_info(&mut row, &env_keys, self.env_infos[step].as_ref());
            push_info(&mut row, &agent_keys, self.agent_infos[step].as_ref());
            table.push_row(row)?;
        }
        Ok(table)
    }
}

fn info_keys(info: Option<&Option<Info>>) -> Vec<String> {
    info.and_then(Option::as_ref)
        .map(|i| i.keys().cloned().collect())
        .unwrap_or_default()
}

fn push_info(row: &mut Vec<Value>, keys: &[String], info: Option<&Info>) {
    row.extend(
        keys.iter()
            .map(|k| info.and_then(|i| i.get(k)).cloned().unwrap_or(Value::Null)),
    );
}
