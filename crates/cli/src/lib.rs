pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reimbly_core::config::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "reimbly",
    about = "Reimbly reimbursement workflow CLI",
    long_about = "Inspect configuration and replay reimbursement operation logs against an in-memory report store.",
    after_help = "Examples:\n  reimbly config\n  reimbly replay operations.jsonl --audit"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Apply a JSON-lines operation log to a fresh report store")]
    Replay {
        #[arg(help = "Path to the operation log (one JSON operation per line)")]
        file: PathBuf,
        #[arg(long, help = "Append the audit trail to the output")]
        audit: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Replay { file, audit } => commands::replay::run(&file, audit),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber once; later calls are no-ops.
pub fn init_logging(config: &AppConfig) {
    use reimbly_core::config::LogFormat::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(config.logging.level.trim().to_ascii_lowercase())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
