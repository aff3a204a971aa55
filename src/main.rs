use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xenobots::simulation::ecosystem::Ecosystem;
use xenobots::simulation::params::Params;

/// Headless xenobot evolution.
#[derive(Debug, Parser)]
#[command(name = "xenobots", version, about)]
struct Args {
    /// JSON file with simulation parameters; missing options use defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the simulation RNG.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of generations to run.
    #[arg(long, default_value_t = 10)]
    generations: u32,
    /// Print the per-generation statistics as JSON when done.
    #[arg(long)]
    stats_json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut params = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<Params>(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => Params::default(),
    };
    if args.seed.is_some() {
        params.seed = args.seed;
    }

    let mut ecosystem = Ecosystem::new(params).context("invalid simulation parameters")?;
    info!(generations = args.generations, "running headless");

    while ecosystem.generation() < args.generations {
        ecosystem.step_fixed();
    }

    let stats = ecosystem.population_stats(ecosystem.generation());
    info!(
        generation = stats.generation,
        organisms = stats.total,
        best_fitness = stats.best_fitness,
        structural = stats.cell_counts.structural,
        actuator = stats.cell_counts.actuator,
        signaling = stats.cell_counts.signaling,
        "finished"
    );

    if args.stats_json {
        let records: Vec<_> = ecosystem.history().records().iter().collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    }
    Ok(())
}
