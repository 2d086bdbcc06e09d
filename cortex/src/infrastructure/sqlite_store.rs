// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # SQLite Knowledge Repository
//!
//! `KnowledgeRepository` backed by the `patterns` and `episodes` tables.
//! List-valued fields (context, examples, relations, actions, pattern ids)
//! are stored as JSON text. Every logical operation is a single statement:
//! upserts use `ON CONFLICT`, apply and reinforce are one `UPDATE` each so no
//! read-modify-write race exists between concurrent callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::domain::{
    seed_patterns, Episode, EpisodeId, Pattern, PatternId, MAX_CONFIDENCE, MIN_CONFIDENCE,
};
use crate::infrastructure::db::Database;
use crate::infrastructure::repository::{KnowledgeRepository, RepositoryError};

const PATTERN_COLUMNS: &str = "id, name, context, problem, solution, examples, relations, \
                               confidence, usage_count, created_at, last_used_at";

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS patterns (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        context TEXT NOT NULL,
        problem TEXT NOT NULL,
        solution TEXT NOT NULL,
        examples TEXT NOT NULL DEFAULT '[]',
        relations TEXT NOT NULL DEFAULT '[]',
        confidence REAL NOT NULL,
        usage_count INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        last_used_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS episodes (
        id TEXT PRIMARY KEY,
        timestamp TEXT NOT NULL,
        context TEXT NOT NULL,
        actions TEXT NOT NULL DEFAULT '[]',
        outcome TEXT NOT NULL,
        pattern_ids TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_episodes_timestamp ON episodes (timestamp DESC)",
];

pub struct SqliteKnowledgeRepository {
    db: Database,
    initialized: OnceCell<()>,
}

impl SqliteKnowledgeRepository {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            initialized: OnceCell::new(),
        }
    }

    async fn ensure_initialized(&self) -> Result<(), RepositoryError> {
        self.initialized
            .get_or_try_init(|| self.migrate_and_seed())
            .await
            .map(|_| ())
    }

    async fn migrate_and_seed(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(self.db.get_pool())
                .await
                .map_err(|e| RepositoryError::Unavailable(format!("Failed to create schema: {}", e)))?;
        }

        if self.query_pattern_count().await? == 0 {
            for pattern in seed_patterns() {
                self.upsert_pattern(&pattern).await?;
            }
            info!("Seeded empty database with example patterns");
        }

        info!("SQLite knowledge store ready");
        Ok(())
    }

    async fn query_pattern_count(&self) -> Result<usize, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patterns")
            .fetch_one(self.db.get_pool())
            .await?;
        Ok(count.max(0) as usize)
    }

    async fn upsert_pattern(&self, pattern: &Pattern) -> Result<(), RepositoryError> {
        let context = serde_json::to_string(&pattern.context)?;
        let examples = serde_json::to_string(&pattern.examples)?;
        let relations = serde_json::to_string(&pattern.relations)?;

        sqlx::query(
            r#"
            INSERT INTO patterns (
                id, name, context, problem, solution, examples, relations,
                confidence, usage_count, created_at, last_used_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                context = excluded.context,
                problem = excluded.problem,
                solution = excluded.solution,
                examples = excluded.examples,
                relations = excluded.relations,
                confidence = excluded.confidence,
                usage_count = excluded.usage_count,
                created_at = excluded.created_at,
                last_used_at = excluded.last_used_at
            "#,
        )
        .bind(pattern.id.as_str())
        .bind(&pattern.name)
        .bind(context)
        .bind(&pattern.problem)
        .bind(&pattern.solution)
        .bind(examples)
        .bind(relations)
        .bind(pattern.confidence)
        .bind(i64::try_from(pattern.usage_count).unwrap_or(i64::MAX))
        .bind(pattern.created_at)
        .bind(pattern.last_used_at)
        .execute(self.db.get_pool())
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save pattern {}: {}", pattern.id, e)))?;

        Ok(())
    }
}

fn pattern_from_row(row: &SqliteRow) -> Result<Pattern, RepositoryError> {
    let id: String = row.try_get("id")?;
    let context: String = row.try_get("context")?;
    let examples: String = row.try_get("examples")?;
    let relations: String = row.try_get("relations")?;
    let usage_count: i64 = row.try_get("usage_count")?;

    Ok(Pattern {
        id: PatternId(id),
        name: row.try_get("name")?,
        context: serde_json::from_str(&context)?,
        problem: row.try_get("problem")?,
        solution: row.try_get("solution")?,
        examples: serde_json::from_str(&examples)?,
        relations: serde_json::from_str(&relations)?,
        confidence: row.try_get("confidence")?,
        usage_count: usage_count.max(0) as u64,
        created_at: row.try_get("created_at")?,
        last_used_at: row.try_get("last_used_at")?,
    })
}

fn episode_from_row(row: &SqliteRow) -> Result<Episode, RepositoryError> {
    let id: String = row.try_get("id")?;
    let actions: String = row.try_get("actions")?;
    let pattern_ids: String = row.try_get("pattern_ids")?;

    Ok(Episode {
        id: EpisodeId(id),
        timestamp: row.try_get("timestamp")?,
        context: row.try_get("context")?,
        actions: serde_json::from_str(&actions)?,
        outcome: row.try_get("outcome")?,
        pattern_ids: serde_json::from_str(&pattern_ids)?,
    })
}

#[async_trait]
impl KnowledgeRepository for SqliteKnowledgeRepository {
    async fn initialize(&self) -> Result<(), RepositoryError> {
        self.ensure_initialized().await
    }

    async fn save_pattern(&self, pattern: &Pattern) -> Result<(), RepositoryError> {
        self.ensure_initialized().await?;
        self.upsert_pattern(pattern).await
    }

    async fn find_pattern(&self, id: &PatternId) -> Result<Option<Pattern>, RepositoryError> {
        self.ensure_initialized().await?;
        let row = sqlx::query(&format!("SELECT {} FROM patterns WHERE id = ?1", PATTERN_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(self.db.get_pool())
            .await?;

        row.as_ref().map(pattern_from_row).transpose()
    }

    async fn list_patterns(&self) -> Result<Vec<Pattern>, RepositoryError> {
        self.ensure_initialized().await?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM patterns ORDER BY confidence DESC, id ASC",
            PATTERN_COLUMNS
        ))
        .fetch_all(self.db.get_pool())
        .await?;

        rows.iter().map(pattern_from_row).collect()
    }

    async fn count_patterns(&self) -> Result<usize, RepositoryError> {
        self.ensure_initialized().await?;
        self.query_pattern_count().await
    }

    async fn record_pattern_use(
        &self,
        id: &PatternId,
        used_at: DateTime<Utc>,
    ) -> Result<Option<Pattern>, RepositoryError> {
        self.ensure_initialized().await?;
        let row = sqlx::query(&format!(
            "UPDATE patterns SET usage_count = usage_count + 1, last_used_at = ?1 \
             WHERE id = ?2 RETURNING {}",
            PATTERN_COLUMNS
        ))
        .bind(used_at)
        .bind(id.as_str())
        .fetch_optional(self.db.get_pool())
        .await?;

        debug!(pattern_id = %id, found = row.is_some(), "Recorded pattern use");
        row.as_ref().map(pattern_from_row).transpose()
    }

    async fn adjust_confidence(
        &self,
        id: &PatternId,
        delta: f64,
    ) -> Result<Option<f64>, RepositoryError> {
        self.ensure_initialized().await?;
        let confidence: Option<f64> = sqlx::query_scalar(
            "UPDATE patterns SET confidence = MIN(?3, MAX(?2, confidence + ?1)) \
             WHERE id = ?4 RETURNING confidence",
        )
        .bind(delta)
        .bind(MIN_CONFIDENCE)
        .bind(MAX_CONFIDENCE)
        .bind(id.as_str())
        .fetch_optional(self.db.get_pool())
        .await?;

        Ok(confidence)
    }

    async fn save_episode(&self, episode: &Episode) -> Result<(), RepositoryError> {
        self.ensure_initialized().await?;
        let actions = serde_json::to_string(&episode.actions)?;
        let pattern_ids = serde_json::to_string(&episode.pattern_ids)?;

        sqlx::query(
            r#"
            INSERT INTO episodes (id, timestamp, context, actions, outcome, pattern_ids)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (id) DO UPDATE SET
                timestamp = excluded.timestamp,
                context = excluded.context,
                actions = excluded.actions,
                outcome = excluded.outcome,
                pattern_ids = excluded.pattern_ids
            "#,
        )
        .bind(episode.id.as_str())
        .bind(episode.timestamp)
        .bind(&episode.context)
        .bind(actions)
        .bind(&episode.outcome)
        .bind(pattern_ids)
        .execute(self.db.get_pool())
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save episode {}: {}", episode.id, e)))?;

        Ok(())
    }

    async fn find_episode(&self, id: &EpisodeId) -> Result<Option<Episode>, RepositoryError> {
        self.ensure_initialized().await?;
        let row = sqlx::query(
            "SELECT id, timestamp, context, actions, outcome, pattern_ids FROM episodes WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(self.db.get_pool())
        .await?;

        row.as_ref().map(episode_from_row).transpose()
    }

    async fn list_episodes(&self) -> Result<Vec<Episode>, RepositoryError> {
        self.ensure_initialized().await?;
        let rows = sqlx::query(
            "SELECT id, timestamp, context, actions, outcome, pattern_ids FROM episodes \
             ORDER BY timestamp DESC, id ASC",
        )
        .fetch_all(self.db.get_pool())
        .await?;

        rows.iter().map(episode_from_row).collect()
    }

    async fn close(&self) -> Result<(), RepositoryError> {
        if !self.db.is_closed() {
            self.db.close().await;
            debug!("SQLite pool closed");
        }
        Ok(())
    }
}
