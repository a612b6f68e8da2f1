use std::path::PathBuf;
use std::process::ExitCode;

use bubble_replay::{ReplayOptions, ReplayResult, Scenario, load_config, replay};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Replays a message-bubble interaction scenario and prints the emitted intents.
#[derive(Debug, Parser)]
#[command(name = "bubble-replay", version)]
struct Args {
    /// Scenario JSON file.
    scenario: PathBuf,

    /// Bubble config file; defaults to the user config directory when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop at the last event instead of letting the return spring settle.
    #[arg(long)]
    no_settle: bool,

    /// Fail on snapshots with inconsistent reactions.
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bubble_engine=info,bubble_replay=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!("replay failed: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> ReplayResult<Vec<String>> {
    let config = load_config(args.config.as_deref())?;
    let scenario = Scenario::load(&args.scenario)?;
    let options = ReplayOptions {
        settle: !args.no_settle,
        strict: args.strict,
    };

    replay(scenario, config, options)?.to_json_lines()
}
