// src/main.rs
//
// Thin CLI around the conversim library.
// Runs baseline agents over the built-in time-period-step suite and writes
// one trajectory + summary per agent × environment pair.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use conversim::config::ParamLayer;
use conversim::plot::{PlotColumns, PlotSpec};
use conversim::suites::{baseline_agents, time_period_step_suite};
use conversim::{init_tracing, CohortObservation};

/// Command-line arguments for the conversim binary.
#[derive(Parser, Debug)]
#[command(name = "conversim", about = "Run agents on simulated customer-interaction environments")]
struct Cli {
    /// Directory for trajectory and summary files (env: CONVERSIM_OUTPUT_DIR).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Step ceiling per run (env: CONVERSIM_MAX_ITERS, default 100000).
    #[arg(long)]
    max_iters: Option<u64>,

    /// Seed applied to every environment (env: CONVERSIM_SEED).
    #[arg(long)]
    seed: Option<u64>,

    /// Agent id to run; repeat for several. Defaults to every baseline agent.
    #[arg(long = "agent")]
    agents: Vec<String>,

    /// Environment id to run; repeat for several. Defaults to the whole suite.
    #[arg(long = "env")]
    envs: Vec<String>,

    /// Print the registered agent and environment ids, then exit.
    #[arg(long)]
    list: bool,

    /// Also write a plot description next to each trajectory.
    #[arg(long)]
    plot: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut suite = time_period_step_suite().context("building environment suite")?;
    let mut agents = baseline_agents::<CohortObservation>().context("building agent registry")?;

    if cli.list {
        for id in agents.ids() {
            println!("agent {id}");
        }
        for id in suite.ids() {
            println!("env   {id}");
        }
        return Ok(());
    }

    for id in cli.agents.iter().chain(&cli.envs) {
        if agents.get(id).is_none() && suite.get(id).is_none() {
            bail!("unknown id: {id} (use --list to see registered ids)");
        }
    }
    if !cli.agents.is_empty() {
        agents.retain(|id| cli.agents.iter().any(|a| a == id));
    }
    if !cli.envs.is_empty() {
        suite.retain(|id| cli.envs.iter().any(|e| e == id));
    }

    let cli_layer = ParamLayer {
        output_directory: cli.output_dir.clone(),
        max_iters: cli.max_iters,
        seed: cli.seed,
    };
    let params = cli_layer
        .or(ParamLayer::from_env())
        .resolve()
        .context("resolving run parameters")?;

    let reports = conversim::run::run(&agents, &[suite], &params).context("running suites")?;

    for report in &reports {
        if cli.plot {
            let path = report
                .files
                .trajectory
                .with_file_name(format!(
                    "{}__plot.json",
                    conversim::store::file_stem(&report.agent_id, &report.env_id)
                ));
            PlotSpec::from_table(&report.table, &PlotColumns::All)
                .write_to_file(&path)
                .with_context(|| format!("writing plot {}", path.display()))?;
        }
        println!(
            "{:<12} {:<60} avg_reward={:<10} steps={}",
            report.agent_id,
            report.env_id,
            report
                .summary
                .avg_reward
                .map_or_else(|| "n/a".to_string(), |r| format!("{r:.3}")),
            report.summary.num_steps
        );
    }
    info!(runs = reports.len(), output = %params.output_directory.display(), "done");
    Ok(())
}
