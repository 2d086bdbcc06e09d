// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Episode commands
//!
//! Commands: save, get, similar

use anyhow::Result;
use clap::Subcommand;
use serde_json::Value;
use std::path::PathBuf;

use pattern_cortex::application::KnowledgeService;
use pattern_cortex::domain::{Episode, EpisodeId};

use super::load_document;
use crate::embedded::EmbeddedStore;

#[derive(Subcommand)]
pub enum EpisodeCommand {
    /// Record an episode from a JSON file
    Save {
        /// Episode JSON (timestamp defaults to now)
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Show one episode
    Get {
        #[arg(value_name = "EPISODE_ID")]
        id: String,
    },

    /// Episodes whose context resembles CONTEXT
    Similar {
        #[arg(value_name = "CONTEXT")]
        query: String,

        /// Maximum number of episodes (default: spec.search.similar_episode_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

pub async fn execute(command: EpisodeCommand, store: &EmbeddedStore) -> Result<Value> {
    let service = store.service();

    let value = match command {
        EpisodeCommand::Save { file } => {
            let episode: Episode = load_document(&file, "timestamp")?;
            serde_json::to_value(service.save_episode(episode).await?)?
        }
        EpisodeCommand::Get { id } => serde_json::to_value(service.get_episode(&EpisodeId::new(id)).await?)?,
        EpisodeCommand::Similar { query, limit } => {
            let limit = limit.unwrap_or(store.config().spec.search.similar_episode_limit);
            serde_json::to_value(service.find_similar_episodes(&query, limit).await?)?
        }
    };

    Ok(value)
}
