// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! busline - inspect and exercise bus match rules

mod commands;

use anyhow::Result;
use busline_core::BusConfig;
use clap::{Parser, Subcommand};
use commands::{replay, rule};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "busline",
    version,
    about = "busline builds bus match rules and replays traffic through them"
)]
struct Cli {
    /// Connection configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a match rule from JSON criteria and print its wire text
    Rule(rule::RuleArgs),
    /// Subscribe criteria on an in-memory bus and replay messages through it
    Replay(replay::ReplayArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => BusConfig::load(path)?,
        None => BusConfig::default(),
    };
    setup_logging(&config);

    match cli.command {
        Commands::Rule(args) => rule::rule(args),
        Commands::Replay(args) => replay::replay(args, config),
    }
}

fn setup_logging(config: &BusConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
