// src/error.rs
//
// Error taxonomy for the simulator.
//
// Every failure is deterministic given the same inputs and is never retried.
// Variants group into four kinds (see `ErrorKind`):
// - ContractViolation: caller/programmer error (bad action, bad id, bad config)
// - ExhaustedBudget:   a run hit `max_iters` without the environment finishing
// - NeedsReset:        an episodic environment was stepped past its end
// - Io:                persistence failures in the output layer

use thiserror::Error;

/// Coarse classification of a `SimError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ContractViolation,
    ExhaustedBudget,
    NeedsReset,
    Io,
}

/// Errors raised by environments, the driver and the run layer.
#[derive(Debug, Error)]
pub enum SimError {
    /// Action outside the declared action space.
    #[error("Invalid action {action} for action space {space}")]
    InvalidAction { action: String, space: String },

    /// Weekly periodicity built from the wrong number of multipliers.
    #[error("There are 7 days in a week, so the periodicity needs 7 multipliers (got {len})")]
    InvalidPeriodicity { len: usize },

    /// A behaviour produced something that is not a probability.
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    /// Constructor argument out of range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Registration id does not follow `[namespace/]name-vN`.
    #[error("Attempted to register malformed id: {id} (ids must match {pattern})")]
    MalformedId { id: String, pattern: String },

    /// The same id appears twice in a registry or across suites of one run.
    #[error("Duplicate id across registries: {id}")]
    DuplicateId { id: String },

    /// Lookup of an id that was never registered.
    #[error("No spec registered under id: {id}")]
    UnknownId { id: String },

    /// Required run parameters missing.
    #[error("Missing run parameters: {}", keys.join(", "))]
    MissingParams { keys: Vec<String> },

    /// Run parameter or factory override that cannot be used.
    #[error("Invalid override '{key}': {reason}")]
    InvalidOverride { key: String, reason: String },

    /// Observations of different arity cannot share a table.
    #[error("Observation at step {step} has {found} components, expected {expected}")]
    RaggedObservation {
        step: usize,
        expected: usize,
        found: usize,
    },

    /// Episodic environment stepped after its episode ended.
    #[error("Environment needs resetting before use")]
    ResetNeeded,

    /// The environment never signalled done within the iteration ceiling.
    #[error("Run stopped after {max_iters} iterations before the environment finished")]
    StoppedEarly { max_iters: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// Map this error onto the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::StoppedEarly { .. } => ErrorKind::ExhaustedBudget,
            SimError::ResetNeeded => ErrorKind::NeedsReset,
            SimError::Io(_) | SimError::Json(_) => ErrorKind::Io,
            _ => ErrorKind::ContractViolation,
        }
    }

    pub(crate) fn invalid_action(
        action: impl std::fmt::Debug,
        space: impl std::fmt::Debug,
    ) -> Self {
        SimError::InvalidAction {
            action: format!("{action:?}"),
            space: format!("{space:?}"),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(SimError::ResetNeeded.kind(), ErrorKind::NeedsReset);
        assert_eq!(
            SimError::StoppedEarly { max_iters: 3 }.kind(),
            ErrorKind::ExhaustedBudget
        );
        assert_eq!(
            SimError::InvalidPeriodicity { len: 3 }.kind(),
            ErrorKind::ContractViolation
        );
        assert_eq!(
            SimError::DuplicateId { id: "a-v0".into() }.kind(),
            ErrorKind::ContractViolation
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(SimError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_missing_params_message_lists_keys() {
        let err = SimError::MissingParams {
            keys: vec!["output_directory".to_string()],
        };
        assert!(err.to_string().contains("output_directory"));
    }
}
