// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer: storage backends and event publication

pub mod repository;
pub mod json_store;
pub mod db;
pub mod sqlite_store;
pub mod event_bus;

pub use repository::{KnowledgeRepository, RepositoryError};
pub use json_store::JsonFileRepository;
pub use db::Database;
pub use sqlite_store::SqliteKnowledgeRepository;
pub use event_bus::{EventBus, NoopEventBus, TracingEventBus};
