// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # pattern-cortex CLI
//!
//! The `pcortex` binary opens the configured knowledge store in-process,
//! runs one operation and prints the result as JSON on stdout.
//!
//! ## Commands
//!
//! - `pcortex pattern save|get|list|search|apply|reinforce|extract`
//! - `pcortex episode save|get|similar`
//! - `pcortex config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

use pattern_cortex::domain::KnowledgeConfigManifest;
use pattern_cortex_cli::commands::{self, ConfigCommand, EpisodeCommand, PatternCommand};
use pattern_cortex_cli::embedded::EmbeddedStore;
use pattern_cortex_cli::logging::init_logging;

/// pattern-cortex - reusable patterns learned from recorded episodes
#[derive(Parser)]
#[command(name = "pcortex")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pattern operations
    #[command(name = "pattern")]
    Pattern {
        #[command(subcommand)]
        command: PatternCommand,
    },

    /// Episode operations
    #[command(name = "episode")]
    Episode {
        #[command(subcommand)]
        command: EpisodeCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Pattern { command }) => {
            let store = open_store(cli.config, cli.log_level.as_deref()).await?;
            let result = commands::pattern::execute(command, &store).await;
            finish(store, result).await
        }
        Some(Commands::Episode { command }) => {
            let store = open_store(cli.config, cli.log_level.as_deref()).await?;
            let result = commands::episode::execute(command, &store).await;
            finish(store, result).await
        }
        Some(Commands::Config { command }) => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "text")?;
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

async fn open_store(config_path: Option<PathBuf>, log_level: Option<&str>) -> Result<EmbeddedStore> {
    let config = KnowledgeConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    let level = log_level.unwrap_or(config.spec.logging.level.as_str());
    init_logging(level, &config.spec.logging.format)?;

    info!(
        store = %config.metadata.name,
        backend = config.spec.storage.backend_name(),
        "Opening knowledge store"
    );
    EmbeddedStore::open(config).await
}

/// Close the store, then print the result. A command error wins over a
/// close error.
async fn finish(store: EmbeddedStore, result: Result<Value>) -> Result<()> {
    let closed = store.close().await;
    let value = result?;
    closed?;
    commands::print_json(&value)
}
