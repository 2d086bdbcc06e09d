// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use pattern_cortex::domain::{KnowledgeConfigManifest, StorageConfig};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./pattern-cortex.yaml)
        #[arg(short, long, default_value = "./pattern-cortex.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, force } => generate(output, force).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = KnowledgeConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if as_yaml {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. PCORTEX_CONFIG_PATH: {}",
            std::env::var("PCORTEX_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./pattern-cortex.yaml");
        println!("  4. ~/.pattern-cortex/config.yaml");
        println!("  5. /etc/pattern-cortex/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Store:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!();

    println!("{}", "Storage:".bold());
    println!("  Backend: {}", config.spec.storage.backend_name());
    match &config.spec.storage {
        StorageConfig::Json { path } => println!("  Path: {}", path.display()),
        StorageConfig::Sqlite {
            url,
            max_connections,
        } => {
            println!("  URL: {}", url);
            println!("  Max connections: {}", max_connections);
        }
    }
    println!();

    println!("{}", "Search:".bold());
    println!(
        "  Similar episode limit: {}",
        config.spec.search.similar_episode_limit
    );
    println!();

    println!("{}", "Logging:".bold());
    println!("  Level: {}", config.spec.logging.level);
    println!("  Format: {}", config.spec.logging.format);

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = KnowledgeConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it",
            output.display()
        );
    }

    KnowledgeConfigManifest::default()
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("pattern-cortex.yaml");

        generate(output.clone(), false).await.unwrap();
        validate(Some(output.clone())).await.unwrap();

        let loaded = KnowledgeConfigManifest::from_yaml_file(&output).unwrap();
        assert_eq!(loaded.spec.storage.backend_name(), "json");
    }

    #[tokio::test]
    async fn test_generate_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("pattern-cortex.yaml");
        std::fs::write(&output, "keep me").unwrap();

        assert!(generate(output.clone(), false).await.is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me");

        generate(output.clone(), true).await.unwrap();
        assert!(std::fs::read_to_string(&output).unwrap().contains("KnowledgeConfig"));
    }

    #[tokio::test]
    async fn test_validate_rejects_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(
            &path,
            "apiVersion: pattern-cortex/v1\nkind: NodeConfig\nmetadata:\n  name: x\n",
        )
        .unwrap();

        let err = validate(Some(path)).await.unwrap_err();
        assert!(err.to_string().contains("validation"));
    }
}
