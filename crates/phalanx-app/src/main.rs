use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::error;

use phalanx_app::game_loop::{self, RunOptions};
use phalanx_app::logging::{init_logging, parse_log_level, LogConfig, LogFormat};
use phalanx_app::scenario::{Scenario, ScenarioError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SummaryFormat {
    /// Team totals only.
    Brief,
    /// Team totals and every placed unit.
    Units,
    /// The full summary as JSON.
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "phalanx", version, about = "Headless squad battle simulator")]
struct Cli {
    /// Scenario file (JSON). Runs the bundled skirmish when omitted.
    scenario: Option<PathBuf>,

    /// Override the scenario's step count.
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Override the scenario's RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Pace ticks in real time instead of running flat out.
    #[arg(long)]
    realtime: bool,

    /// Keep running after the battle is decided.
    #[arg(long)]
    no_early_stop: bool,

    #[arg(long, value_enum, default_value_t = SummaryFormat::Brief)]
    summary: SummaryFormat,

    /// trace, debug, info, warn or error. RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// compact or json.
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log = LogConfig {
        level: parse_log_level(&cli.log_level),
        format: cli.log_format,
    };
    if let Err(e) = init_logging(&log) {
        eprintln!("error: failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), ScenarioError> {
    let mut scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::skirmish()?,
    };
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }

    let options = RunOptions {
        ticks: cli.ticks.unwrap_or(scenario.ticks),
        realtime: cli.realtime,
        stop_when_decided: !cli.no_early_stop,
    };
    let mut battle = scenario.build()?;
    let summary = game_loop::run(&mut battle, &options);

    match cli.summary {
        SummaryFormat::Brief => print!("{summary}"),
        SummaryFormat::Units => print!("{summary:#}"),
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}
