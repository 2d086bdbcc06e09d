// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod extraction;
pub mod knowledge_service;
pub mod relevance;
pub mod repository_factory;

pub use extraction::{extract_pattern, find_related_patterns};
pub use knowledge_service::{KnowledgeService, StandardKnowledgeService, DEFAULT_SIMILAR_EPISODE_LIMIT};
pub use relevance::{rank_episodes, rank_patterns, PatternMatch};
pub use repository_factory::create_repository;
