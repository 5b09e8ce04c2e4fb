//! Conversim core library.
//!
//! Customer-interaction simulator: stochastic units ("bandits") adjusted by
//! per-step modifiers, contextual and timestep-contextual bandit
//! environments, an episodic cohort binomial process, a simulation driver
//! that records every transition into a [`History`], and a thin run layer
//! that executes agent × environment suites and persists the results. The
//! binary (`src/main.rs`) is a small CLI around [`run::run`].

pub mod agent;
pub mod bandit;
pub mod config;
pub mod env;
pub mod error;
pub mod history;
pub mod logging;
pub mod modifier;
pub mod plot;
pub mod registry;
pub mod rng;
pub mod run;
pub mod simulation;
pub mod space;
pub mod store;
pub mod suites;
pub mod table;

// --- Re-exports for ergonomic external use ---------------------------------

pub use agent::{Agent, FixedAgent, RandomAgent};

pub use bandit::Bandit;

pub use config::{ParamLayer, RunParams};

pub use env::{
    weekly_with_trend, Behaviour, CohortObservation, CohortProcess, Context, ContextualBandits,
    Environment, FlatBandits, Info, LinearTrend, StaticBehaviour, StepResult,
    TimestepContextualBandits, WeeklySine,
};

pub use error::{ErrorKind, SimError, SimResult};

pub use history::{Components, FullView, History, ObservableView};

pub use logging::init_tracing;

pub use modifier::{Modifier, Periodic, RandomWalk};

pub use plot::{PlotColumns, PlotSpec};

pub use registry::{AgentRegistry, AgentSpec, EnvRegistry, EnvSpec, Overrides, Spec};

pub use rng::{derive_seed, seeded_rng, ScriptedRng, SimRng};

pub use run::RunReport;

pub use simulation::{RunConfig, RunState, SimulationRun};

pub use space::ActionSpace;

pub use store::{RunFiles, RunSummary};

pub use table::Table;
