// pendula_sim/src/main.rs

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pendula_sim::cli::Cli;
use pendula_sim::prelude::*;

fn main() -> ExitCode {
    // A good filter for focusing on our crates' logs; `RUST_LOG` overrides it.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pendula_core=info,pendula_sim=debug")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SimError> {
    let mut config = ScenarioConfig::load(cli.scenario.as_deref())?;
    if let Some(steps) = cli.steps {
        config.simulation.steps = steps;
    }

    // Without an explicit seed, pick one and log it so the run can be replayed.
    let seed = cli
        .seed
        .or(config.simulation.seed)
        .unwrap_or_else(rand::random);
    info!(seed, "Starting Pendula simulation");

    let report = run_scenario(&config, seed)?;
    report.log_summary();

    if let Some(path) = &cli.output {
        report.write_json(path)?;
    }
    Ok(())
}
