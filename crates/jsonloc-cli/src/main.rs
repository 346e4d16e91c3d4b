//! # jsonloc CLI entry point
//!
//! Parses command-line arguments, initialises logging on stderr and
//! dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jsonloc_cli::config::Config;
use jsonloc_cli::locate::{run_locate, LocateArgs};
use jsonloc_cli::validate::{run_validate, ValidateArgs};
use jsonloc_cli::{exit_code, LogFormat};

/// Validate JSON document trees against schemas and point every error at
/// the line it refers to.
#[derive(Parser, Debug)]
#[command(name = "jsonloc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log line format on stderr.
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate every document below the roots against its directory's schema.
    Validate(ValidateArgs),

    /// Print the source line of a JSON Pointer within one file.
    Locate(LocateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    tracing::debug!("jsonloc v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Validate(args) => load_config(cli.config.as_deref())
            .and_then(|config| run_validate(&args, config, cli.verbose)),
        Commands::Locate(args) => run_locate(&args),
    };

    if let Err(e) = &result {
        tracing::error!("{e:#}");
    }
    ExitCode::from(exit_code(&result))
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}
