use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod telemetry;

use config::Config;

#[derive(Parser)]
#[command(name = "calendar", about = "Spring project release calendar")]
enum CliCommand {
    /// Serve the calendar, refreshing releases in the background.
    Run(CliArgs),
    /// Poll every source once and print the releases as JSON.
    Poll(CliArgs),
}

#[derive(clap::Args)]
struct CliArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("could not start runtime: {0}")]
    Runtime(std::io::Error),
    #[error("{0}")]
    Metrics(String),
    #[error(transparent)]
    Releases(#[from] releases::ReleasesError),
    #[error("could not serialize releases: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "calendar failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: CliCommand) -> Result<(), CliError> {
    let (CliCommand::Run(args) | CliCommand::Poll(args)) = &cli;
    let config = Config::from_file(&args.config_file_path)?;

    let _sentry = telemetry::init_logging(&config.common.logging);
    if let Some(metrics) = &config.common.metrics {
        telemetry::init_metrics(metrics).map_err(CliError::Metrics)?;
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    match cli {
        CliCommand::Run(_) => {
            tracing::info!("starting release calendar");
            rt.block_on(releases::run(config.releases))?;
        }
        CliCommand::Poll(_) => {
            let found = rt.block_on(releases::poll_once(config.releases))?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
    }
    Ok(())
}
