// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Embedded store
//!
//! Builds the repository and knowledge service in-process from a loaded
//! configuration. One store is opened per CLI invocation and closed before
//! exit so the JSON snapshot is flushed and the SQLite pool shut down.

use anyhow::{Context, Result};
use std::sync::Arc;

use pattern_cortex::application::{create_repository, StandardKnowledgeService};
use pattern_cortex::domain::KnowledgeConfigManifest;
use pattern_cortex::infrastructure::TracingEventBus;

pub struct EmbeddedStore {
    config: KnowledgeConfigManifest,
    service: StandardKnowledgeService,
}

impl EmbeddedStore {
    pub async fn open(config: KnowledgeConfigManifest) -> Result<Self> {
        config
            .validate()
            .context("Configuration validation failed")?;

        let backend = config.spec.storage.backend_name();
        let repository = create_repository(&config.spec.storage)
            .await
            .with_context(|| format!("Failed to open {} storage", backend))?;

        let service = StandardKnowledgeService::new(repository, Arc::new(TracingEventBus));
        service.initialize().await?;

        tracing::debug!(backend, store = %config.metadata.name, "Knowledge store ready");
        Ok(Self { config, service })
    }

    pub fn service(&self) -> &StandardKnowledgeService {
        &self.service
    }

    pub fn config(&self) -> &KnowledgeConfigManifest {
        &self.config
    }

    pub async fn close(self) -> Result<()> {
        self.service.close().await
    }
}
