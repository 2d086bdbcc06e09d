// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! JSON snapshot repository
//!
//! Keeps the whole store in memory and rewrites a single JSON file after every
//! write. A missing file is an empty store; a file that cannot be parsed is an
//! error. Concurrent processes writing the same file are not coordinated:
//! the last writer wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

use crate::domain::{seed_patterns, Episode, EpisodeId, Pattern, PatternId};
use crate::infrastructure::repository::{KnowledgeRepository, RepositoryError};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    patterns: BTreeMap<PatternId, Pattern>,
    #[serde(default)]
    episodes: BTreeMap<EpisodeId, Episode>,
}

pub struct JsonFileRepository {
    path: PathBuf,
    state: RwLock<Snapshot>,
    initialized: OnceCell<()>,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(Snapshot::default()),
            initialized: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_initialized(&self) -> Result<(), RepositoryError> {
        self.initialized
            .get_or_try_init(|| self.load_and_seed())
            .await
            .map(|_| ())
    }

    async fn load_and_seed(&self) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RepositoryError::Unavailable(format!(
                    "Failed to create data directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut snapshot = match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<Snapshot>(&bytes).map_err(|e| {
                RepositoryError::Serialization(format!(
                    "Failed to parse snapshot {}: {}",
                    self.path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot file yet, starting empty");
                Snapshot::default()
            }
            Err(e) => {
                return Err(RepositoryError::Unavailable(format!(
                    "Failed to read snapshot {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if snapshot.patterns.is_empty() {
            for pattern in seed_patterns() {
                snapshot.patterns.insert(pattern.id.clone(), pattern);
            }
            self.persist(&snapshot).await?;
            info!(path = %self.path.display(), "Seeded empty store with example patterns");
        }

        info!(
            path = %self.path.display(),
            patterns = snapshot.patterns.len(),
            episodes = snapshot.episodes.len(),
            "JSON snapshot store ready"
        );
        *self.state.write().await = snapshot;
        Ok(())
    }

    /// Write through a temp file so a crash never leaves a truncated snapshot.
    async fn persist(&self, snapshot: &Snapshot) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    /// Apply `change` to a copy of the state and install the copy only once it
    /// is on disk. `None` from `change` means nothing to write.
    async fn commit<T, F>(&self, change: F) -> Result<Option<T>, RepositoryError>
    where
        T: Send,
        F: FnOnce(&mut Snapshot) -> Option<T> + Send,
    {
        self.ensure_initialized().await?;
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let Some(out) = change(&mut next) else {
            return Ok(None);
        };
        self.persist(&next).await?;
        *state = next;
        Ok(Some(out))
    }
}

#[async_trait]
impl KnowledgeRepository for JsonFileRepository {
    async fn initialize(&self) -> Result<(), RepositoryError> {
        self.ensure_initialized().await
    }

    async fn save_pattern(&self, pattern: &Pattern) -> Result<(), RepositoryError> {
        self.commit(|next| {
            next.patterns.insert(pattern.id.clone(), pattern.clone());
            Some(())
        })
        .await
        .map(|_| ())
    }

    async fn find_pattern(&self, id: &PatternId) -> Result<Option<Pattern>, RepositoryError> {
        self.ensure_initialized().await?;
        Ok(self.state.read().await.patterns.get(id).cloned())
    }

    async fn list_patterns(&self) -> Result<Vec<Pattern>, RepositoryError> {
        self.ensure_initialized().await?;
        // BTreeMap iteration is id order, so the stable sort leaves ties by id
        let mut patterns: Vec<Pattern> = self.state.read().await.patterns.values().cloned().collect();
        patterns.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(patterns)
    }

    async fn count_patterns(&self) -> Result<usize, RepositoryError> {
        self.ensure_initialized().await?;
        Ok(self.state.read().await.patterns.len())
    }

    async fn record_pattern_use(
        &self,
        id: &PatternId,
        used_at: DateTime<Utc>,
    ) -> Result<Option<Pattern>, RepositoryError> {
        self.commit(|next| {
            let pattern = next.patterns.get_mut(id)?;
            pattern.record_use(used_at);
            Some(pattern.clone())
        })
        .await
    }

    async fn adjust_confidence(
        &self,
        id: &PatternId,
        delta: f64,
    ) -> Result<Option<f64>, RepositoryError> {
        self.commit(|next| {
            let pattern = next.patterns.get_mut(id)?;
            pattern.adjust_confidence(delta);
            Some(pattern.confidence)
        })
        .await
    }

    async fn save_episode(&self, episode: &Episode) -> Result<(), RepositoryError> {
        self.commit(|next| {
            next.episodes.insert(episode.id.clone(), episode.clone());
            Some(())
        })
        .await
        .map(|_| ())
    }

    async fn find_episode(&self, id: &EpisodeId) -> Result<Option<Episode>, RepositoryError> {
        self.ensure_initialized().await?;
        Ok(self.state.read().await.episodes.get(id).cloned())
    }

    async fn list_episodes(&self) -> Result<Vec<Episode>, RepositoryError> {
        self.ensure_initialized().await?;
        let mut episodes: Vec<Episode> = self.state.read().await.episodes.values().cloned().collect();
        episodes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(episodes)
    }

    async fn close(&self) -> Result<(), RepositoryError> {
        if self.initialized.initialized() {
            let state = self.state.read().await;
            self.persist(&state).await?;
            debug!(path = %self.path.display(), "JSON snapshot store flushed");
        }
        Ok(())
    }
}
