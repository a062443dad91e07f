//! Drizzle CLI - Test console for Drizzle measure plugins.

mod commands;
mod config;
mod discovery;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

use commands::MeasureKind;
use commands::run::RunOptions;
use config::HarnessConfig;

#[derive(Parser)]
#[command(name = "drizzle")]
#[command(
    author,
    version,
    about = "Drives Rainmeter measures outside Rainmeter with a console host"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the harness configuration (drizzle.json is auto-detected if not specified)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a measure through Initialize, Reload, Update, GetString, CustomFunc and Finalize
    Run {
        /// Measure to drive
        #[arg(value_enum)]
        measure: MeasureKind,

        /// Number of Reload/Update/GetString cycles
        #[arg(short = 'n', long, default_value = "3")]
        cycles: usize,

        /// Delay between cycles in milliseconds
        #[arg(short, long, default_value = "1000")]
        interval_ms: u64,

        /// Set a measure option, overriding the configuration file
        #[arg(short, long = "option", value_name = "KEY=VALUE", value_parser = config::parse_key_value)]
        options: Vec<(String, String)>,

        /// Set a skin variable, overriding the configuration file
        #[arg(long = "variable", value_name = "KEY=VALUE", value_parser = config::parse_key_value)]
        variables: Vec<(String, String)>,

        /// Print a JSON report instead of the call trace
        #[arg(long)]
        json: bool,
    },

    /// List all available measures
    List {
        /// Show the options each measure reads
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error("drizzle failed");
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

/// `warn` by default, `debug` with `--verbose`; `RUST_LOG` overrides both.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::List { detailed } => commands::list::execute(detailed),

        Commands::Run {
            measure,
            cycles,
            interval_ms,
            options,
            variables,
            json,
        } => {
            let host = HarnessConfig::resolve(cli.config.as_deref())?
                .with_overrides(&options, &variables)
                .into_host(!json);

            let options = RunOptions {
                cycles,
                interval: Duration::from_millis(interval_ms),
                json,
            };
            commands::run::execute(measure, host, options).await?;

            if !json {
                output::success("Finalize completed, no live measures remain");
            }
            Ok(())
        }
    }
}
