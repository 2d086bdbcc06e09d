// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository interface for the knowledge store
//!
//! One contract, two interchangeable implementations selected at construction
//! time:
//!
//! | Implementation | Storage |
//! |----------------|---------|
//! | `JsonFileRepository` | whole-store JSON snapshot file |
//! | `SqliteKnowledgeRepository` | `patterns` / `episodes` tables |
//!
//! Scoring and extraction live above this trait in the application layer and
//! never inside a backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Episode, EpisodeId, Pattern, PatternId};

#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    /// Prepare storage and seed the example patterns when the store holds no
    /// pattern. Safe to call repeatedly; only the first call does work.
    async fn initialize(&self) -> Result<(), RepositoryError>;

    /// Save pattern (create or replace by id)
    async fn save_pattern(&self, pattern: &Pattern) -> Result<(), RepositoryError>;

    async fn find_pattern(&self, id: &PatternId) -> Result<Option<Pattern>, RepositoryError>;

    /// All patterns, highest confidence first, ties by ascending id
    async fn list_patterns(&self) -> Result<Vec<Pattern>, RepositoryError>;

    async fn count_patterns(&self) -> Result<usize, RepositoryError>;

    /// Increment the usage count and set the last-used time in one step.
    /// Returns the updated pattern, or `None` for an unknown id.
    async fn record_pattern_use(
        &self,
        id: &PatternId,
        used_at: DateTime<Utc>,
    ) -> Result<Option<Pattern>, RepositoryError>;

    /// Add `delta` to the confidence, clamped to the confidence bounds, in one
    /// step. Returns the new confidence, or `None` for an unknown id.
    async fn adjust_confidence(
        &self,
        id: &PatternId,
        delta: f64,
    ) -> Result<Option<f64>, RepositoryError>;

    /// Save episode (create or replace by id)
    async fn save_episode(&self, episode: &Episode) -> Result<(), RepositoryError>;

    async fn find_episode(&self, id: &EpisodeId) -> Result<Option<Episode>, RepositoryError>;

    /// All episodes, newest first, ties by ascending id
    async fn list_episodes(&self) -> Result<Vec<Episode>, RepositoryError>;

    /// Flush and release the storage handle
    async fn close(&self) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(_) | sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
                RepositoryError::Unavailable(err.to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::Io(err.to_string())
    }
}
