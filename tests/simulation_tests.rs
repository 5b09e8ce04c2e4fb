// tests/simulation_tests.rs
//
// Driver and history tests against real environments.
//
// - Cohort episodes end the run after exactly `episode_length` steps
// - Exhausting `max_iters` is an error, never a truncated history
// - Tabular projection column layout

use conversim::env::cohort::{INFO_CONVERSION_PROBABILITY, INFO_INTERACTION_PROBABILITY};
use conversim::simulation::run;
use conversim::{
    seeded_rng, CohortObservation, CohortProcess, Environment, ErrorKind, FixedAgent,
    RandomAgent, RunConfig, SimError,
};
use serde_json::Value;

fn always_never(strategy: usize, _timestep: u64) -> (f64, f64) {
    match strategy {
        0 => (0.0, 0.0),
        1 => (0.0, 1.0),
        2 => (1.0, 0.0),
        _ => (1.0, 1.0),
    }
}

fn cohort(episode_length: u64) -> CohortProcess {
    CohortProcess::with_rng(
        10,
        episode_length,
        ["never_never", "never_always", "always_never", "always_always"],
        always_never,
        seeded_rng(3),
    )
    .unwrap()
}

/// Test: an environment done after n steps yields a history of n + 1 records.
#[test]
fn test_history_length_is_steps_plus_one() {
    for n in [1u64, 5, 30] {
        let mut env = cohort(n);
        let mut agent = FixedAgent::new(3usize);
        let outcome = run(&mut agent, &mut env, &RunConfig::new(n)).unwrap();
        assert_eq!(outcome.history.len() as u64, n + 1, "episode_length {}", n);

        let obs = outcome.history.observable();
        assert_eq!(obs.observations[0], Some(CohortObservation::default()));
        assert!(obs.observations[1..]
            .iter()
            .all(|o| *o == Some(CohortObservation::new(10, 10))));
        assert!(obs.rewards[1..].iter().all(|r| *r == Some(10.0)));
    }
}

/// Test: max_iters = n - 1 on an n-step episode fails with the exhausted-budget error.
#[test]
fn test_budget_exhausted() {
    let mut env = cohort(5);
    let mut agent = FixedAgent::new(0usize);
    let err = run(&mut agent, &mut env, &RunConfig::new(4)).unwrap_err();
    assert!(matches!(err, SimError::StoppedEarly { max_iters: 4 }));
    assert_eq!(err.kind(), ErrorKind::ExhaustedBudget);
}

/// Test: the driver resets the environment, so a finished episode can be rerun.
#[test]
fn test_rerun_after_episode() {
    let mut env = cohort(3);
    let mut agent = FixedAgent::new(2usize);
    run(&mut agent, &mut env, &RunConfig::default()).unwrap();
    assert!(env.is_done());
    let again = run(&mut agent, &mut env, &RunConfig::default()).unwrap();
    assert_eq!(again.history.len(), 4);
}

/// Test: stepping past the episode without reset is a needs-reset error.
#[test]
fn test_needs_reset() {
    let mut env = cohort(5);
    for _ in 0..5 {
        env.step(&3).unwrap();
    }
    let err = env.step(&3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NeedsReset);
    env.reset();
    for i in 0..5 {
        let r = env.step(&3).unwrap();
        assert_eq!(r.observation, CohortObservation::new(10, 10));
        assert_eq!(r.done, i == 4);
    }
}

/// Test: tabular column count = action + obs arity + reward + done + info keys.
#[test]
fn test_tabular_projection() {
    let mut env = cohort(4);
    let mut agent = RandomAgent::with_seed(env.action_space(), 8);
    let outcome = run(&mut agent, &mut env, &RunConfig::default()).unwrap();
    let table = outcome.history.to_tabular().unwrap();

    // Random agent reports no info, cohort env reports two probabilities.
    assert_eq!(table.columns().len(), 1 + 2 + 1 + 1 + 2);
    assert_eq!(table.len(), 5);
    assert!(table.column(INFO_INTERACTION_PROBABILITY).is_some());
    assert!(table.column(INFO_CONVERSION_PROBABILITY).is_some());

    let first = &table.rows()[0];
    for (name, cell) in table.columns().iter().zip(first) {
        if name.starts_with("obs_") {
            assert_eq!(*cell, Value::from(0u64));
        } else {
            assert!(cell.is_null(), "first row column {} should be null", name);
        }
    }
    let actions = table.column("action").unwrap();
    assert!(actions[1..].iter().all(|a| a.as_u64().map_or(false, |a| a < 4)));
}
