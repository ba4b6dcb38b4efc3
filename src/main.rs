use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nestegg::core::{
    Lever, RetirementPlan, SolveTarget, build_drawdown, compute_projections, solve,
};
use nestegg::store::JsonFileStore;

#[derive(Debug, Parser)]
#[command(name = "nestegg", version, about = "Deterministic retirement projections")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, env = "PORT", default_value_t = 3001)]
        port: u16,
        #[arg(long, env = "NESTEGG_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,
    },
    /// Print the projection report for a plan file.
    Project {
        #[arg(long)]
        plan: PathBuf,
    },
    /// Print the retirement drawdown from a given starting nest egg.
    Drawdown {
        #[arg(long)]
        plan: PathBuf,
        #[arg(long)]
        nest_egg: f64,
    },
    /// Solve for the lever value that reaches a target.
    Solve {
        #[arg(long)]
        plan: PathBuf,
        #[arg(long, value_enum)]
        target: CliTarget,
        #[arg(long, allow_negative_numbers = true)]
        target_value: f64,
        #[arg(long, value_enum)]
        lever: CliLever,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTarget {
    EndBalance,
    MonthlySpend,
    RetireEarlier,
}

impl From<CliTarget> for SolveTarget {
    fn from(value: CliTarget) -> Self {
        match value {
            CliTarget::EndBalance => SolveTarget::EndBalance,
            CliTarget::MonthlySpend => SolveTarget::MonthlySpend,
            CliTarget::RetireEarlier => SolveTarget::RetireEarlier,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliLever {
    WithdrawalRate,
    AnnualContribution,
    RetirementAge,
    MonthlySpending,
}

impl From<CliLever> for Lever {
    fn from(value: CliLever) -> Self {
        match value {
            CliLever::WithdrawalRate => Lever::WithdrawalRate,
            CliLever::AnnualContribution => Lever::AnnualContribution,
            CliLever::RetirementAge => Lever::RetirementAge,
            CliLever::MonthlySpending => Lever::MonthlySpending,
        }
    }
}

fn read_plan(path: &Path) -> Result<RetirementPlan> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read plan file {}", path.display()))?;
    let plan: RetirementPlan = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid plan", path.display()))?;
    plan.validate()?;
    Ok(plan)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Serve { port, data_dir } => {
            let store = JsonFileStore::new(&data_dir)
                .with_context(|| format!("failed to open data dir {}", data_dir.display()))?;
            info!(dir = %store.dir().display(), "plan store ready");
            nestegg::api::run_http_server(port, Arc::new(store))
                .await
                .context("server error")?;
        }
        Command::Project { plan } => {
            let plan = read_plan(&plan)?;
            print_json(&compute_projections(&plan))?;
        }
        Command::Drawdown { plan, nest_egg } => {
            anyhow::ensure!(
                nest_egg.is_finite() && nest_egg >= 0.0,
                "--nest-egg must be a non-negative amount"
            );
            let plan = read_plan(&plan)?;
            print_json(&build_drawdown(&plan, nest_egg))?;
        }
        Command::Solve {
            plan,
            target,
            target_value,
            lever,
        } => {
            anyhow::ensure!(target_value.is_finite(), "--target-value must be finite");
            let plan = read_plan(&plan)?;
            print_json(&solve(&plan, target.into(), target_value, lever.into()))?;
        }
    }
    Ok(())
}
