// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quire - turn a day's notes into a journal entry.
//!
//! This is the binary entry point.

mod doctor;
mod extract;
mod generate;
mod input;
mod provider;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quire_config::QuireConfig;

/// Quire - turn a day's notes into a journal entry.
#[derive(Parser, Debug)]
#[command(name = "quire", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a journal entry from notes given as arguments or stdin lines.
    Generate {
        /// Print a structured entry as JSON instead of streaming markdown.
        #[arg(long)]
        structured: bool,
        text: Vec<String>,
    },
    /// Extract memories from notes and print what was stored.
    Extract { text: Vec<String> },
    /// Validate configuration and check provider connectivity.
    Doctor,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => quire_config::load_and_validate_path(path),
        None => quire_config::load_and_validate(),
    };
    let config: QuireConfig = match loaded {
        Ok(config) => config,
        Err(errors) => {
            quire_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.journal.log_level);

    let result = match cli.command {
        Commands::Generate { structured, text } => match input::fragments(text) {
            Ok(fragments) => generate::run(&config, &fragments, structured).await,
            Err(e) => Err(e),
        },
        Commands::Extract { text } => match input::fragments(text) {
            Ok(fragments) => extract::run(&config, &fragments).await,
            Err(e) => Err(e),
        },
        Commands::Doctor => doctor::run(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("quire: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Installs the tracing subscriber on stderr so stdout carries only output.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quire={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
