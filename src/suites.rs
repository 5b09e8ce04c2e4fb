// src/suites.rs
//
// Built-in registries.
//
// The time-period-step suite is a grid of cohort environments: two strategies
// with a shared interaction probability and per-strategy conversion rates,
// under each built-in behaviour. Baseline agents cover random and fixed play.

use serde_json::Value;

use crate::agent::{FixedAgent, RandomAgent};
use crate::env::cohort::{CohortObservation, CohortProcess};
use crate::env::{LinearTrend, StaticBehaviour, WeeklySine};
use crate::error::{SimError, SimResult};
use crate::registry::{
    ensure_known_overrides, override_u64, AgentRegistry, AgentSpec, BoxedAgent, BoxedEnv,
    EnvRegistry, EnvSpec, Overrides, SEED_OVERRIDE,
};
use crate::space::ActionSpace;

pub const DEFAULT_COHORT_SIZE: u64 = 10_000;
pub const DEFAULT_EPISODE_LENGTH: u64 = 365;
pub const INTERACTION_PROBABILITY: f64 = 0.5;
pub const STRATEGIES: [&str; 2] = ["a", "b"];

/// Conversion probability of strategy a and b.
pub const CONVERSION_PAIRS: [(f64, f64); 3] = [(0.2, 0.3), (0.02, 0.03), (0.002, 0.003)];

pub const COHORT_SIZE_KEY: &str = "cohort_size";
pub const EPISODE_LENGTH_KEY: &str = "episode_length";

/// Behaviour families of the time-period-step suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteBehaviour {
    Static,
    MatchingSin7,
    NonStationaryTrend,
}

impl SuiteBehaviour {
    pub const ALL: [SuiteBehaviour; 3] = [
        SuiteBehaviour::Static,
        SuiteBehaviour::MatchingSin7,
        SuiteBehaviour::NonStationaryTrend,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SuiteBehaviour::Static => "Static",
            SuiteBehaviour::MatchingSin7 => "Matching_sin7",
            SuiteBehaviour::NonStationaryTrend => "NonStationaryTrend",
        }
    }

    fn build(
        self,
        cohort_size: u64,
        episode_length: u64,
        conversions: (f64, f64),
    ) -> SimResult<CohortProcess> {
        let params = vec![
            (INTERACTION_PROBABILITY, conversions.0),
            (INTERACTION_PROBABILITY, conversions.1),
        ];
        match self {
            SuiteBehaviour::Static => CohortProcess::new(
                cohort_size,
                episode_length,
                STRATEGIES,
                StaticBehaviour::new(params),
            ),
            SuiteBehaviour::MatchingSin7 => CohortProcess::new(
                cohort_size,
                episode_length,
                STRATEGIES,
                WeeklySine::new(params),
            ),
            SuiteBehaviour::NonStationaryTrend => CohortProcess::new(
                cohort_size,
                episode_length,
                STRATEGIES,
                LinearTrend::new(params),
            ),
        }
    }
}

/// Id of one suite environment.
pub fn time_period_step_id(behaviour: SuiteBehaviour, conversions: (f64, f64)) -> String {
    format!(
        "TimePeriodStep:{}:conv_1:{}:conv_2:{}-v0",
        behaviour.label(),
        conversions.0,
        conversions.1
    )
}

fn make_cohort_env(
    behaviour: SuiteBehaviour,
    conversions: (f64, f64),
    overrides: &Overrides,
) -> SimResult<BoxedEnv<CohortObservation, usize>> {
    ensure_known_overrides(overrides, &[COHORT_SIZE_KEY, EPISODE_LENGTH_KEY])?;
    let cohort_size = override_u64(overrides, COHORT_SIZE_KEY)?.unwrap_or(DEFAULT_COHORT_SIZE);
    let episode_length =
        override_u64(overrides, EPISODE_LENGTH_KEY)?.unwrap_or(DEFAULT_EPISODE_LENGTH);
    let env = behaviour.build(cohort_size, episode_length, conversions)?;
    Ok(Box::new(env))
}

/// Every behaviour × conversion pair as a cohort environment.
pub fn time_period_step_suite() -> SimResult<EnvRegistry<CohortObservation, usize>> {
    let mut registry = EnvRegistry::new();
    for behaviour in SuiteBehaviour::ALL {
        for conversions in CONVERSION_PAIRS {
            let id = time_period_step_id(behaviour, conversions);
            registry.register(EnvSpec::new(&id, move |o: &Overrides| {
                make_cohort_env(behaviour, conversions, o)
            })?)?;
        }
    }
    Ok(registry)
}

pub const RANDOM_AGENT_ID: &str = "Random-v0";
pub const FIXED_AGENT_ID: &str = "Fixed-v0";

fn fixed_action(space: &ActionSpace, overrides: &Overrides) -> SimResult<usize> {
    let action = override_u64(overrides, "action")?.unwrap_or(0);
    let action = usize::try_from(action).map_err(|_| SimError::InvalidOverride {
        key: "action".to_string(),
        reason: format!("{} does not fit an index", action),
    })?;
    if !space.contains_index(action) {
        return Err(SimError::InvalidOverride {
            key: "action".to_string(),
            reason: format!("{} is outside {}", action, space),
        });
    }
    Ok(action)
}

/// Random and fixed agents over a discrete action space.
pub fn baseline_agents<O: 'static>() -> SimResult<AgentRegistry<O, usize>> {
    let mut registry = AgentRegistry::new();
    registry.register(AgentSpec::new(
        RANDOM_AGENT_ID,
        |space: &ActionSpace, o: &Overrides| {
            ensure_known_overrides(o, &[SEED_OVERRIDE])?;
            if !matches!(space, ActionSpace::Discrete(_)) {
                return Err(SimError::InvalidParameter {
                    name: "action_space".to_string(),
                    reason: format!("{} needs a discrete space, got {}", RANDOM_AGENT_ID, space),
                });
            }
            let agent: BoxedAgent<O, usize> = match override_u64(o, SEED_OVERRIDE)? {
                Some(seed) => Box::new(RandomAgent::with_seed(space.clone(), seed)),
                None => Box::new(RandomAgent::new(space.clone())),
            };
            Ok(agent)
        },
    )?)?;
    registry.register(AgentSpec::new(
        FIXED_AGENT_ID,
        |space: &ActionSpace, o: &Overrides| {
            ensure_known_overrides(o, &["action", SEED_OVERRIDE])?;
            let agent: BoxedAgent<O, usize> =
                Box::new(FixedAgent::new(fixed_action(space, o)?));
            Ok(agent)
        },
    )?)?;
    Ok(registry)
}

/// Overrides holding a single `key = value` entry.
pub fn single_override(key: &str, value: impl Into<Value>) -> Overrides {
    [(key.to_string(), value.into())].into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::env::Environment;
    use crate::registry::Spec;

    #[test]
    fn test_suite_ids() {
        let suite = time_period_step_suite().unwrap();
        assert_eq!(suite.len(), 9);
        let ids: Vec<&str> = suite.ids().collect();
        assert_eq!(ids[0], "TimePeriodStep:Static:conv_1:0.2:conv_2:0.3-v0");
        assert!(ids.contains(&"TimePeriodStep:Matching_sin7:conv_1:0.02:conv_2:0.03-v0"));
        assert!(ids.contains(&"TimePeriodStep:NonStationaryTrend:conv_1:0.002:conv_2:0.003-v0"));
        assert!(suite.all().iter().all(|s| s.version() == 0));
    }

    #[test]
    fn test_suite_overrides() {
        let suite = time_period_step_suite().unwrap();
        let id = time_period_step_id(SuiteBehaviour::Static, (0.2, 0.3));
        let mut overrides = single_override(COHORT_SIZE_KEY, 0u64);
        overrides.insert(EPISODE_LENGTH_KEY.to_string(), 2u64.into());
        let mut env = suite.make(&id, &overrides).unwrap();
        assert_eq!(env.action_space(), ActionSpace::Discrete(2));
        env.reset();
        assert!(!env.step(&0).unwrap().done);
        let last = env.step(&1).unwrap();
        assert!(last.done);
        assert_eq!(last.observation, CohortObservation::new(0, 0));

        assert!(suite.make(&id, &single_override("colour", "red")).is_err());
        assert!(suite.make(&id, &single_override(EPISODE_LENGTH_KEY, 0u64)).is_err());
    }

    #[test]
    fn test_baseline_agents() {
        let agents = baseline_agents::<CohortObservation>().unwrap();
        let space = ActionSpace::Discrete(2);
        let mut fixed = agents
            .make(FIXED_AGENT_ID, &space, &single_override("action", 1u64))
            .unwrap();
        assert_eq!(fixed.act(&CohortObservation::default()).0, 1);
        assert!(agents
            .make(FIXED_AGENT_ID, &space, &single_override("action", 5u64))
            .is_err());
        assert!(agents
            .make(FIXED_AGENT_ID, &space, &single_override(SEED_OVERRIDE, 9u64))
            .is_ok());

        let multi = ActionSpace::MultiDiscrete(vec![2, 2]);
        assert!(agents.make(RANDOM_AGENT_ID, &multi, &Overrides::new()).is_err());

        let mut random = agents
            .make(RANDOM_AGENT_ID, &space, &single_override(SEED_OVERRIDE, 3u64))
            .unwrap();
        for _ in 0..10 {
            assert!(random.act(&CohortObservation::default()).0 < 2);
        }
    }
}
