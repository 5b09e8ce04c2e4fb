// src/config.rs
//
// Run parameters.
//
// Resolved from up to three layers with precedence CLI > environment >
// default. `output_directory` has no default and must come from one of the
// explicit layers.
//
// Environment variables:
// - CONVERSIM_OUTPUT_DIR
// - CONVERSIM_MAX_ITERS
// - CONVERSIM_SEED

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{SimError, SimResult};
use crate::simulation::{RunConfig, DEFAULT_MAX_ITERS};

pub const OUTPUT_DIRECTORY_KEY: &str = "output_directory";
pub const MAX_ITERS_KEY: &str = "max_iters";
pub const SEED_KEY: &str = "seed";

pub const ENV_OUTPUT_DIR: &str = "CONVERSIM_OUTPUT_DIR";
pub const ENV_MAX_ITERS: &str = "CONVERSIM_MAX_ITERS";
pub const ENV_SEED: &str = "CONVERSIM_SEED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    /// Directory receiving trajectory and summary files.
    pub output_directory: PathBuf,
    /// Step ceiling per agent × environment run.
    pub max_iters: u64,
    /// Seed applied to every environment before it runs.
    pub seed: Option<u64>,
}

impl RunParams {
    pub fn new(output_directory: impl Into<PathBuf>) -> Self {
        Self {
            output_directory: output_directory.into(),
            max_iters: DEFAULT_MAX_ITERS,
            seed: None,
        }
    }

    pub fn with_max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.max_iters == 0 {
            return Err(SimError::InvalidOverride {
                key: MAX_ITERS_KEY.to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }
        Ok(())
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(self.max_iters)
    }

    /// Build from string key/value pairs; unknown keys are rejected.
    pub fn from_map(map: &BTreeMap<String, String>) -> SimResult<Self> {
        let mut layer = ParamLayer::default();
        for (key, raw) in map {
            match key.as_str() {
                OUTPUT_DIRECTORY_KEY => layer.output_directory = Some(PathBuf::from(raw)),
                MAX_ITERS_KEY => layer.max_iters = Some(parse_u64(MAX_ITERS_KEY, raw)?),
                SEED_KEY => layer.seed = Some(parse_u64(SEED_KEY, raw)?),
                _ => {
                    return Err(SimError::InvalidOverride {
                        key: key.clone(),
                        reason: "unknown run parameter".to_string(),
                    })
                }
            }
        }
        layer.resolve()
    }
}

fn parse_u64(key: &str, raw: &str) -> SimResult<u64> {
    raw.trim().parse::<u64>().map_err(|_| SimError::InvalidOverride {
        key: key.to_string(),
        reason: format!("could not parse {:?} as a non-negative integer", raw),
    })
}

/// One partially filled layer of run parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamLayer {
    pub output_directory: Option<PathBuf>,
    pub max_iters: Option<u64>,
    pub seed: Option<u64>,
}

impl ParamLayer {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read variables through `lookup`; values that do not parse are skipped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut layer = ParamLayer::default();

        if let Some(raw) = lookup(ENV_OUTPUT_DIR) {
            if raw.trim().is_empty() {
                warn!(var = ENV_OUTPUT_DIR, "empty value ignored");
            } else {
                info!(var = ENV_OUTPUT_DIR, value = %raw, "run parameter from environment");
                layer.output_directory = Some(PathBuf::from(raw));
            }
        }

        for (var, slot) in [
            (ENV_MAX_ITERS, &mut layer.max_iters),
            (ENV_SEED, &mut layer.seed),
        ] {
            if let Some(raw) = lookup(var) {
                match raw.trim().parse::<u64>() {
                    Ok(v) => {
                        info!(var, value = v, "run parameter from environment");
                        *slot = Some(v);
                    }
                    Err(_) => {
                        warn!(
                            var,
                            value = %raw,
                            "could not parse as a non-negative integer; ignored"
                        );
                    }
                }
            }
        }

        layer
    }

    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: ParamLayer) -> Self {
        Self {
            output_directory: self.output_directory.or(fallback.output_directory),
            max_iters: self.max_iters.or(fallback.max_iters),
            seed: self.seed.or(fallback.seed),
        }
    }

    /// Apply defaults and validate.
    pub fn resolve(self) -> SimResult<RunParams> {
        let output_directory = self.output_directory.ok_or_else(|| SimError::MissingParams {
            keys: vec![OUTPUT_DIRECTORY_KEY.to_string()],
        })?;
        let params = RunParams {
            output_directory,
            max_iters: self.max_iters.unwrap_or(DEFAULT_MAX_ITERS),
            seed: self.seed,
        };
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_map_defaults() {
        let params = RunParams::from_map(&map(&[("output_directory", "/tmp/out")])).unwrap();
        assert_eq!(params.output_directory, PathBuf::from("/tmp/out"));
        assert_eq!(params.max_iters, 100_000);
        assert_eq!(params.seed, None);
        assert_eq!(params.run_config().max_iters, 100_000);
    }

    #[test]
    fn test_from_map_missing_output_directory() {
        let err = RunParams::from_map(&map(&[("max_iters", "10")])).unwrap_err();
        match err {
            SimError::MissingParams { keys } => assert_eq!(keys, vec!["output_directory"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_from_map_rejects_bad_values() {
        for (key, value) in [("max_iters", "0"), ("max_iters", "-3"), ("colour", "red")] {
            let raw = map(&[("output_directory", "o"), (key, value)]);
            assert!(RunParams::from_map(&raw).is_err(), "{key}={value}");
        }
        let raw = map(&[("output_directory", "o"), ("max_iters", "7"), ("seed", "9")]);
        let p = RunParams::from_map(&raw).unwrap();
        assert_eq!((p.max_iters, p.seed), (7, Some(9)));
    }

    #[test]
    fn test_env_layer_skips_unparseable() {
        let vars = map(&[
            (ENV_OUTPUT_DIR, "env_out"),
            (ENV_MAX_ITERS, "lots"),
            (ENV_SEED, "11"),
        ]);
        let layer = ParamLayer::from_lookup(|k| vars.get(k).cloned());
        assert_eq!(layer.output_directory, Some(PathBuf::from("env_out")));
        assert_eq!(layer.max_iters, None);
        assert_eq!(layer.seed, Some(11));
    }

    #[test]
    fn test_cli_overrides_env() {
        let cli = ParamLayer {
            output_directory: Some("cli_out".into()),
            max_iters: None,
            seed: Some(1),
        };
        let env = ParamLayer {
            output_directory: Some("env_out".into()),
            max_iters: Some(50),
            seed: Some(2),
        };
        let params = cli.or(env).resolve().unwrap();
        assert_eq!(params.output_directory, PathBuf::from("cli_out"));
        assert_eq!(params.max_iters, 50);
        assert_eq!(params.seed, Some(1));
    }
}
