// src/store.rs
//
// Summarising and persisting finished runs.
//
// Each agent × environment run produces two files in the output directory:
//   agent_id=<agent>__env_id=<env>.json          columnar trajectory
//   agent_id=<agent>__env_id=<env>__summary.csv  one-row summary
// Path separators in ids are replaced with '_'.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::SimResult;
use crate::table::Table;

/// One-row description of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Mean of the non-null rewards; None when no step produced one.
    pub avg_reward: Option<f64>,
    /// Steps taken, excluding the reset row.
    pub num_steps: usize,
    pub time_seconds: f64,
    pub env_id: String,
    pub agent_id: String,
}

impl RunSummary {
    pub const COLUMNS: [&'static str; 5] =
        ["avg_reward", "num_steps", "time_seconds", "env_id", "agent_id"];

    pub fn to_table(&self) -> SimResult<Table> {
        let mut table = Table::new(Self::COLUMNS.iter().map(|c| c.to_string()).collect());
        table.push_row(vec![
            self.avg_reward.map_or(Value::Null, Value::from),
            Value::from(self.num_steps),
            Value::from(self.time_seconds),
            Value::from(self.env_id.clone()),
            Value::from(self.agent_id.clone()),
        ])?;
        Ok(table)
    }
}

/// Summarise a tabular history.
pub fn summarise(
    history: &Table,
    elapsed: Duration,
    env_id: &str,
    agent_id: &str,
) -> RunSummary {
    let rewards: Vec<f64> = history
        .column("reward")
        .unwrap_or_default()
        .into_iter()
        .filter_map(Value::as_f64)
        .collect();
    let avg_reward = if rewards.is_empty() {
        None
    } else {
        Some(rewards.iter().sum::<f64>() / rewards.len() as f64)
    };
    RunSummary {
        avg_reward,
        num_steps: history.len().saturating_sub(1),
        time_seconds: elapsed.as_secs_f64(),
        env_id: env_id.to_string(),
        agent_id: agent_id.to_string(),
    }
}

/// Paths written for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFiles {
    pub trajectory: PathBuf,
    pub summary: PathBuf,
}

fn sanitise(id: &str) -> String {
    id.replace(['/', '\\'], "_")
}

/// Common file stem for an agent × environment pair.
pub fn file_stem(agent_id: &str, env_id: &str) -> String {
    format!("agent_id={}__env_id={}", sanitise(agent_id), sanitise(env_id))
}

pub fn run_files(output_directory: &Path, agent_id: &str, env_id: &str) -> RunFiles {
    let stem = file_stem(agent_id, env_id);
    RunFiles {
        trajectory: output_directory.join(format!("{stem}.json")),
        summary: output_directory.join(format!("{stem}__summary.csv")),
    }
}

fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %err, "could not remove partial output");
    }
}

/// Create `path` and fill it; a file left half written is removed.
fn write_file<F>(path: &Path, fill: F) -> SimResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> SimResult<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    let result = fill(&mut writer).and_then(|()| Ok(writer.flush()?));
    if result.is_err() {
        drop(writer);
        discard(path);
    }
    result
}

/// Write the trajectory and summary files, creating the directory if needed.
///
/// Either both files are written or neither is left behind.
pub fn write(
    output_directory: &Path,
    history: &Table,
    summary: &RunSummary,
) -> SimResult<RunFiles> {
    fs::create_dir_all(output_directory)?;
    let files = run_files(output_directory, &summary.agent_id, &summary.env_id);

    write_file(&files.trajectory, |w| history.write_columnar_json(w))?;
    let summary_table = summary.to_table();
    let written =
        summary_table.and_then(|table| write_file(&files.summary, |w| table.write_csv(w)));
    if let Err(err) = written {
        discard(&files.trajectory);
        return Err(err);
    }

    info!(
        trajectory = %files.trajectory.display(),
        summary = %files.summary.display(),
        "run output written"
    );
    Ok(files)
}
