// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Event bus for publishing knowledge store domain events

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::KnowledgeEvent;

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: KnowledgeEvent) -> Result<()>;
}

/// Emits every event as a structured `tracing` record under the
/// `pattern_cortex::events` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventBus;

#[async_trait]
impl EventBus for TracingEventBus {
    async fn publish(&self, event: KnowledgeEvent) -> Result<()> {
        let payload = serde_json::to_string(&event)?;
        tracing::info!(
            target: "pattern_cortex::events",
            event_type = event.event_type(),
            timestamp = %event.timestamp(),
            payload = %payload,
            "knowledge event"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventBus;

#[async_trait]
impl EventBus for NoopEventBus {
    async fn publish(&self, _event: KnowledgeEvent) -> Result<()> {
        Ok(())
    }
}
