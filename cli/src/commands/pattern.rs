// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pattern commands
//!
//! Commands: save, get, list, search, apply, reinforce, extract

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;

use pattern_cortex::application::KnowledgeService;
use pattern_cortex::domain::{EpisodeId, Pattern, PatternId};

use super::load_document;
use crate::embedded::EmbeddedStore;

#[derive(Subcommand)]
pub enum PatternCommand {
    /// Create or replace a pattern from a JSON file
    Save {
        /// Pattern JSON (createdAt defaults to now)
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Show one pattern
    Get {
        #[arg(value_name = "PATTERN_ID")]
        id: String,
    },

    /// List all patterns, highest confidence first
    List,

    /// Rank patterns against a free-text context
    Search {
        #[arg(value_name = "CONTEXT")]
        query: String,

        /// Maximum number of matches
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Record one application of a pattern
    Apply {
        #[arg(value_name = "PATTERN_ID")]
        id: String,
    },

    /// Report the outcome of an application
    Reinforce {
        #[arg(value_name = "PATTERN_ID")]
        id: String,

        #[arg(long, value_enum)]
        outcome: ReportedOutcome,
    },

    /// Synthesize a pattern from stored episodes
    Extract {
        /// Episode id (repeatable)
        #[arg(long = "episode", value_name = "EPISODE_ID", required = true)]
        episodes: Vec<String>,

        #[arg(long)]
        name: String,

        #[arg(long)]
        problem: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportedOutcome {
    Success,
    Failure,
}

pub async fn execute(command: PatternCommand, store: &EmbeddedStore) -> Result<Value> {
    let service = store.service();

    let value = match command {
        PatternCommand::Save { file } => {
            let pattern: Pattern = load_document(&file, "createdAt")?;
            serde_json::to_value(service.save_pattern(pattern).await?)?
        }
        PatternCommand::Get { id } => serde_json::to_value(service.get_pattern(&PatternId::new(id)).await?)?,
        PatternCommand::List => serde_json::to_value(service.get_all_patterns().await?)?,
        PatternCommand::Search { query, limit } => {
            let mut matches = service.search_patterns(&query).await?;
            if let Some(limit) = limit {
                matches.truncate(limit);
            }
            serde_json::to_value(matches)?
        }
        PatternCommand::Apply { id } => serde_json::to_value(service.apply_pattern(&PatternId::new(id)).await?)?,
        PatternCommand::Reinforce { id, outcome } => {
            let id = PatternId::new(id);
            let success = outcome == ReportedOutcome::Success;
            match service.reinforce_pattern(&id, success).await? {
                Some(confidence) => json!({
                    "patternId": id,
                    "success": success,
                    "confidence": confidence,
                }),
                None => Value::Null,
            }
        }
        PatternCommand::Extract {
            episodes,
            name,
            problem,
        } => {
            let ids: Vec<EpisodeId> = episodes.into_iter().map(EpisodeId::new).collect();
            serde_json::to_value(
                service
                    .extract_pattern_from_episodes(&ids, &name, &problem)
                    .await?,
            )?
        }
    };

    Ok(value)
}
