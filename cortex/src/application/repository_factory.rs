// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory
//!
//! Creates the concrete `KnowledgeRepository` selected by the storage
//! configuration. The domain layer only names the backend; this layer owns
//! the mapping to infrastructure types.

use std::sync::Arc;

use crate::domain::StorageConfig;
use crate::infrastructure::{
    Database, JsonFileRepository, KnowledgeRepository, RepositoryError, SqliteKnowledgeRepository,
};

/// Creates a KnowledgeRepository implementation based on the configured backend.
///
/// The SQLite pool is opened here; schema creation and seeding still happen
/// lazily on first use or on `initialize`.
pub async fn create_repository(
    storage: &StorageConfig,
) -> Result<Arc<dyn KnowledgeRepository>, RepositoryError> {
    match storage {
        StorageConfig::Json { path } => {
            tracing::info!(path = %path.display(), "Using JSON snapshot storage");
            Ok(Arc::new(JsonFileRepository::new(path.clone())))
        }
        StorageConfig::Sqlite {
            url,
            max_connections,
        } => {
            tracing::info!(url = %url, max_connections, "Using SQLite storage");
            let db = Database::connect(url, *max_connections).await?;
            Ok(Arc::new(SqliteKnowledgeRepository::new(db)))
        }
    }
}
