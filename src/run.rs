// src/run.rs
//
// Orchestration: every registered agent against every environment of the
// supplied suites. Each pair gets a fresh environment, a fresh agent built
// for that environment's action space, and its own output files.
//
// With a run seed, environments are seeded with it and the agent at index i
// gets `derive_seed(seed, i)`, so the two never share a stream.
//
// Pairs run one after another. A pair that fails aborts the whole call
// before anything is written for it; files of earlier pairs stay on disk.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::RunParams;
use crate::env::Environment;
use crate::error::SimResult;
use crate::history::Components;
use crate::registry::{
    ensure_unique_ids, AgentRegistry, EnvRegistry, Overrides, Spec, SEED_OVERRIDE,
};
use crate::rng::derive_seed;
use crate::simulation;
use crate::store::{self, RunFiles, RunSummary};
use crate::table::Table;

/// Outcome of one agent × environment pair.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub env_id: String,
    pub agent_id: String,
    pub summary: RunSummary,
    pub files: RunFiles,
    pub table: Table,
    pub elapsed: Duration,
}

/// Run every agent on every environment in `env_suites`.
pub fn run<O, A>(
    agents: &AgentRegistry<O, A>,
    env_suites: &[EnvRegistry<O, A>],
    params: &RunParams,
) -> SimResult<Vec<RunReport>>
where
    O: Components + Clone,
    A: Serialize + Clone,
{
    params.validate()?;
    ensure_unique_ids(env_suites)?;

    let config = params.run_config();
    let no_overrides = Overrides::new();
    let mut reports = Vec::new();

    for env_spec in env_suites.iter().flat_map(|suite| suite.all()) {
        for (agent_index, agent_spec) in agents.all().iter().enumerate() {
            let mut env = env_spec.make(&no_overrides)?;
            if let Some(seed) = params.seed {
                env.seed(seed);
            }
            let agent_overrides = match params.seed {
                Some(seed) => Overrides::from([(
                    SEED_OVERRIDE.to_string(),
                    Value::from(derive_seed(seed, agent_index)),
                )]),
                None => Overrides::new(),
            };
            let mut agent = agent_spec.make(&env.action_space(), &agent_overrides)?;

            info!(env_id = env_spec.id(), agent_id = agent_spec.id(), "starting run");
            let outcome = simulation::run(&mut agent, &mut env, &config)?;
            let table = outcome.history.to_tabular()?;
            let summary =
                store::summarise(&table, outcome.elapsed, env_spec.id(), agent_spec.id());
            let files = store::write(&params.output_directory, &table, &summary)?;

            reports.push(RunReport {
                env_id: env_spec.id().to_string(),
                agent_id: agent_spec.id().to_string(),
                summary,
                files,
                table,
                elapsed: outcome.elapsed,
            });
        }
    }

    info!(runs = reports.len(), "all runs finished");
    Ok(reports)
}
