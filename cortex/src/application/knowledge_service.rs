// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # KnowledgeService: Pattern & Episode Store Operations
//!
//! Application service exposed to the transport layer. Every operation reads
//! and writes through a [`KnowledgeRepository`] and publishes a
//! [`KnowledgeEvent`] after each successful write.
//!
//! ## Reinforcement
//!
//! - `apply_pattern` bumps `usage_count` and touches `last_used_at`.
//! - `reinforce_pattern` moves confidence by +0.05 on success and −0.02 on
//!   failure, clamped to [0.1, 1.0].
//!
//! Unknown ids are lookup misses: they return `None` and publish nothing.
//!
//! ## Extraction
//!
//! `extract_pattern_from_episodes` resolves episode ids, synthesizes a
//! pattern, links it to every stored pattern sharing a context tag and
//! persists the result in one composed call.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::application::extraction::{extract_pattern, find_related_patterns, RELATED_PATTERN_STRENGTH};
use crate::application::relevance::{rank_episodes, rank_patterns, PatternMatch};
use crate::domain::{
    reinforcement_delta, Episode, EpisodeId, KnowledgeEvent, Pattern, PatternId, PatternRelation,
    MAX_CONFIDENCE, MIN_CONFIDENCE,
};
use crate::infrastructure::{EventBus, KnowledgeRepository};

/// Default number of episodes returned by similarity search
pub const DEFAULT_SIMILAR_EPISODE_LIMIT: usize = 5;

#[async_trait]
pub trait KnowledgeService: Send + Sync {
    /// Create or replace a pattern by id. The pattern is stored as given.
    async fn save_pattern(&self, pattern: Pattern) -> Result<Pattern>;

    async fn get_pattern(&self, id: &PatternId) -> Result<Option<Pattern>>;

    /// All stored patterns, highest confidence first
    async fn get_all_patterns(&self) -> Result<Vec<Pattern>>;

    /// Patterns relevant to a free-text context, most relevant first
    async fn search_patterns(&self, context: &str) -> Result<Vec<PatternMatch>>;

    /// Record one application of a pattern
    async fn apply_pattern(&self, id: &PatternId) -> Result<Option<Pattern>>;

    /// Report an application outcome. Returns the new confidence.
    async fn reinforce_pattern(&self, id: &PatternId, success: bool) -> Result<Option<f64>>;

    async fn save_episode(&self, episode: Episode) -> Result<Episode>;

    async fn get_episode(&self, id: &EpisodeId) -> Result<Option<Episode>>;

    /// Episodes whose context resembles `context`, most similar first
    async fn find_similar_episodes(&self, context: &str, limit: usize) -> Result<Vec<Episode>>;

    /// Synthesize, link and persist a pattern from stored episodes
    async fn extract_pattern_from_episodes(
        &self,
        episode_ids: &[EpisodeId],
        name: &str,
        problem: &str,
    ) -> Result<Option<Pattern>>;
}

/// Standard implementation of KnowledgeService
pub struct StandardKnowledgeService {
    repository: Arc<dyn KnowledgeRepository>,
    event_bus: Arc<dyn EventBus>,
}

impl StandardKnowledgeService {
    pub fn new(repository: Arc<dyn KnowledgeRepository>, event_bus: Arc<dyn EventBus>) -> Self {
        Self {
            repository,
            event_bus,
        }
    }

    /// Open the backing store and seed it if empty. Safe to call repeatedly.
    pub async fn initialize(&self) -> Result<()> {
        self.repository
            .initialize()
            .await
            .context("Failed to initialize knowledge store")
    }

    pub async fn close(&self) -> Result<()> {
        self.repository
            .close()
            .await
            .context("Failed to close knowledge store")
    }

    async fn publish(&self, event: KnowledgeEvent) -> Result<()> {
        let event_type = event.event_type();
        self.event_bus
            .publish(event)
            .await
            .with_context(|| format!("Failed to publish {} event", event_type))
    }
}

#[async_trait]
impl KnowledgeService for StandardKnowledgeService {
    async fn save_pattern(&self, pattern: Pattern) -> Result<Pattern> {
        if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&pattern.confidence) {
            tracing::warn!(
                pattern_id = %pattern.id,
                confidence = pattern.confidence,
                "Pattern confidence outside [0.1, 1.0], stored as given"
            );
        }

        self.repository
            .save_pattern(&pattern)
            .await
            .with_context(|| format!("Failed to save pattern {}", pattern.id))?;

        tracing::info!(pattern_id = %pattern.id, confidence = pattern.confidence, "Pattern saved");

        self.publish(KnowledgeEvent::PatternSaved {
            pattern_id: pattern.id.clone(),
            confidence: pattern.confidence,
            timestamp: Utc::now(),
        })
        .await?;

        Ok(pattern)
    }

    async fn get_pattern(&self, id: &PatternId) -> Result<Option<Pattern>> {
        self.repository
            .find_pattern(id)
            .await
            .with_context(|| format!("Failed to load pattern {}", id))
    }

    async fn get_all_patterns(&self) -> Result<Vec<Pattern>> {
        self.repository
            .list_patterns()
            .await
            .context("Failed to list patterns")
    }

    async fn search_patterns(&self, context: &str) -> Result<Vec<PatternMatch>> {
        let patterns = self.get_all_patterns().await?;
        let candidates = patterns.len();
        let matches = rank_patterns(patterns, context);

        tracing::debug!(candidates, matches = matches.len(), "Pattern search");
        Ok(matches)
    }

    async fn apply_pattern(&self, id: &PatternId) -> Result<Option<Pattern>> {
        let updated = self
            .repository
            .record_pattern_use(id, Utc::now())
            .await
            .with_context(|| format!("Failed to apply pattern {}", id))?;

        let Some(pattern) = updated else {
            tracing::debug!(pattern_id = %id, "Apply skipped, pattern not found");
            return Ok(None);
        };

        tracing::info!(pattern_id = %id, usage_count = pattern.usage_count, "Pattern applied");

        self.publish(KnowledgeEvent::PatternApplied {
            pattern_id: pattern.id.clone(),
            usage_count: pattern.usage_count,
            timestamp: Utc::now(),
        })
        .await?;

        Ok(Some(pattern))
    }

    async fn reinforce_pattern(&self, id: &PatternId, success: bool) -> Result<Option<f64>> {
        let delta = reinforcement_delta(success);
        let adjusted = self
            .repository
            .adjust_confidence(id, delta)
            .await
            .with_context(|| format!("Failed to reinforce pattern {}", id))?;

        let Some(confidence) = adjusted else {
            tracing::debug!(pattern_id = %id, "Reinforcement skipped, pattern not found");
            return Ok(None);
        };

        tracing::info!(pattern_id = %id, success, confidence, "Pattern reinforced");

        self.publish(KnowledgeEvent::PatternReinforced {
            pattern_id: id.clone(),
            success,
            delta,
            confidence,
            timestamp: Utc::now(),
        })
        .await?;

        Ok(Some(confidence))
    }

    async fn save_episode(&self, episode: Episode) -> Result<Episode> {
        self.repository
            .save_episode(&episode)
            .await
            .with_context(|| format!("Failed to save episode {}", episode.id))?;

        tracing::info!(episode_id = %episode.id, "Episode recorded");

        self.publish(KnowledgeEvent::EpisodeRecorded {
            episode_id: episode.id.clone(),
            pattern_ids: episode.pattern_ids.clone(),
            timestamp: Utc::now(),
        })
        .await?;

        Ok(episode)
    }

    async fn get_episode(&self, id: &EpisodeId) -> Result<Option<Episode>> {
        self.repository
            .find_episode(id)
            .await
            .with_context(|| format!("Failed to load episode {}", id))
    }

    async fn find_similar_episodes(&self, context: &str, limit: usize) -> Result<Vec<Episode>> {
        let episodes = self
            .repository
            .list_episodes()
            .await
            .context("Failed to list episodes")?;

        let similar = rank_episodes(episodes, context, limit);
        tracing::debug!(limit, found = similar.len(), "Episode similarity search");
        Ok(similar)
    }

    async fn extract_pattern_from_episodes(
        &self,
        episode_ids: &[EpisodeId],
        name: &str,
        problem: &str,
    ) -> Result<Option<Pattern>> {
        let mut episodes = Vec::with_capacity(episode_ids.len());
        for id in episode_ids {
            match self.get_episode(id).await? {
                Some(episode) => episodes.push(episode),
                None => tracing::warn!(episode_id = %id, "Unknown episode skipped during extraction"),
            }
        }

        let Some(mut pattern) = extract_pattern(&episodes, name, problem) else {
            tracing::info!(
                episode_count = episodes.len(),
                "Extraction needs at least two episodes"
            );
            return Ok(None);
        };

        let existing = self.get_all_patterns().await?;
        if let Some(previous) = existing.iter().find(|p| p.id == pattern.id) {
            tracing::warn!(
                pattern_id = %pattern.id,
                usage_count = previous.usage_count,
                "Extracted pattern replaces a stored pattern with the same id"
            );
            pattern.created_at = previous.created_at;
            pattern.usage_count = previous.usage_count;
            pattern.last_used_at = previous.last_used_at;
        }
        let related = find_related_patterns(&pattern, &existing);
        pattern.relations = related
            .iter()
            .cloned()
            .map(|id| PatternRelation::leads_to(id, RELATED_PATTERN_STRENGTH))
            .collect();

        self.repository
            .save_pattern(&pattern)
            .await
            .with_context(|| format!("Failed to save extracted pattern {}", pattern.id))?;

        tracing::info!(
            pattern_id = %pattern.id,
            episode_count = episodes.len(),
            related = related.len(),
            confidence = pattern.confidence,
            "Pattern extracted"
        );

        self.publish(KnowledgeEvent::PatternExtracted {
            pattern_id: pattern.id.clone(),
            source_episodes: episodes.iter().map(|e| e.id.clone()).collect(),
            related_patterns: related,
            confidence: pattern.confidence,
            timestamp: Utc::now(),
        })
        .await?;

        Ok(Some(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RelationType;
    use crate::infrastructure::{Database, SqliteKnowledgeRepository};
    use std::sync::Mutex;

    // Mock EventBus for testing
    struct MockEventBus {
        events: Arc<Mutex<Vec<KnowledgeEvent>>>,
    }

    impl MockEventBus {
        fn new() -> Self {
            Self {
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn get_events(&self) -> Vec<KnowledgeEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventBus for MockEventBus {
        async fn publish(&self, event: KnowledgeEvent) -> Result<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    struct FailingEventBus;

    #[async_trait]
    impl EventBus for FailingEventBus {
        async fn publish(&self, _event: KnowledgeEvent) -> Result<()> {
            anyhow::bail!("bus offline")
        }
    }

    async fn service() -> (StandardKnowledgeService, Arc<MockEventBus>) {
        let db = Database::in_memory().await.unwrap();
        let repo = Arc::new(SqliteKnowledgeRepository::new(db));
        let event_bus = Arc::new(MockEventBus::new());
        let service = StandardKnowledgeService::new(repo, event_bus.clone());
        service.initialize().await.unwrap();
        (service, event_bus)
    }

    fn episode(id: &str, context: &str, actions: &[&str], outcome: &str) -> Episode {
        Episode::new(
            EpisodeId::new(id),
            context,
            actions.iter().map(|a| a.to_string()).collect(),
            outcome,
        )
    }

    #[tokio::test]
    async fn test_seeded_store() {
        let (service, _) = service().await;

        let patterns = service.get_all_patterns().await.unwrap();
        let ids: Vec<&str> = patterns.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["progressive-disclosure", "concrete-before-abstract"]);
    }

    #[tokio::test]
    async fn test_reinforce_success_then_failure() {
        let (service, event_bus) = service().await;
        let id = PatternId::new("progressive-disclosure");

        service.reinforce_pattern(&id, true).await.unwrap();
        let confidence = service.reinforce_pattern(&id, false).await.unwrap().unwrap();

        assert!((confidence - 0.88).abs() < 1e-9);
        let stored = service.get_pattern(&id).await.unwrap().unwrap();
        assert!((stored.confidence - 0.88).abs() < 1e-9);

        let events = event_bus.get_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), "pattern_reinforced");
    }

    #[tokio::test]
    async fn test_reinforce_stays_within_bounds() {
        let (service, _) = service().await;
        let id = PatternId::new("concrete-before-abstract");

        for _ in 0..10 {
            service.reinforce_pattern(&id, true).await.unwrap();
        }
        assert_eq!(service.get_pattern(&id).await.unwrap().unwrap().confidence, 1.0);

        for _ in 0..100 {
            service.reinforce_pattern(&id, false).await.unwrap();
        }
        let floor = service.get_pattern(&id).await.unwrap().unwrap().confidence;
        assert!((floor - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_save_pattern_keeps_confidence_as_given() {
        let (service, event_bus) = service().await;
        let id = PatternId::new("eager");
        let pattern = Pattern::new(id.clone(), "Eager", vec![], "p", "s", 1.7);

        let saved = service.save_pattern(pattern).await.unwrap();
        assert_eq!(saved.confidence, 1.7);

        let stored = service.get_pattern(&id).await.unwrap().unwrap();
        assert_eq!(stored.confidence, 1.7);
        assert_eq!(event_bus.get_events()[0].event_type(), "pattern_saved");

        // reinforcement is what pulls it back into range
        let confidence = service.reinforce_pattern(&id, true).await.unwrap().unwrap();
        assert_eq!(confidence, 1.0);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_soft_misses() {
        let (service, event_bus) = service().await;
        let missing = PatternId::new("missing");

        assert!(service.apply_pattern(&missing).await.unwrap().is_none());
        assert!(service.reinforce_pattern(&missing, true).await.unwrap().is_none());
        assert!(service.get_pattern(&missing).await.unwrap().is_none());
        assert!(service
            .get_episode(&EpisodeId::new("missing"))
            .await
            .unwrap()
            .is_none());
        assert!(event_bus.get_events().is_empty());
    }

    #[tokio::test]
    async fn test_apply_pattern_counts_uses() {
        let (service, event_bus) = service().await;
        let id = PatternId::new("progressive-disclosure");

        let first = service.apply_pattern(&id).await.unwrap().unwrap();
        let second = service.apply_pattern(&id).await.unwrap().unwrap();

        assert_eq!(first.usage_count, 1);
        assert_eq!(second.usage_count, 2);
        assert!(second.last_used_at.unwrap() >= first.last_used_at.unwrap());

        let events = event_bus.get_events();
        assert_eq!(
            events[1],
            KnowledgeEvent::PatternApplied {
                pattern_id: id,
                usage_count: 2,
                timestamp: events[1].timestamp(),
            }
        );
    }

    #[tokio::test]
    async fn test_search_seed_patterns() {
        let (service, _) = service().await;

        let matches = service
            .search_patterns("user is learning something new")
            .await
            .unwrap();
        assert_eq!(matches[0].pattern.id.as_str(), "progressive-disclosure");
        assert!(matches[0].relevance > 0.0);
    }

    #[tokio::test]
    async fn test_extract_links_related_patterns() {
        let (service, event_bus) = service().await;

        service
            .save_episode(episode(
                "e1",
                "teaching recursion to a new student",
                &["show example", "explain base case"],
                "student understood",
            ))
            .await
            .unwrap();
        service
            .save_episode(episode(
                "e2",
                "teaching closures",
                &["show example", "explain base case", "quiz"],
                "completed",
            ))
            .await
            .unwrap();

        let ids = vec![EpisodeId::new("e1"), EpisodeId::new("nope"), EpisodeId::new("e2")];
        let pattern = service
            .extract_pattern_from_episodes(&ids, "Example First", "Abstract rules do not stick")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(pattern.id.as_str(), "example-first");
        assert_eq!(pattern.confidence, 0.9);
        assert_eq!(pattern.context[0], "teaching");
        assert_eq!(
            pattern.solution,
            "Apply the following action sequence: show example → explain base case"
        );
        // "teaching" is a tag of concrete-before-abstract
        assert_eq!(pattern.relations.len(), 1);
        assert_eq!(pattern.relations[0].pattern_id.as_str(), "concrete-before-abstract");
        assert_eq!(pattern.relations[0].relation_type, RelationType::LeadsTo);
        assert_eq!(pattern.relations[0].strength, 0.5);

        let stored = service.get_pattern(&pattern.id).await.unwrap().unwrap();
        assert_eq!(stored.relations, pattern.relations);
        assert_eq!(stored.examples, pattern.examples);

        let events = event_bus.get_events();
        assert_eq!(events.last().unwrap().event_type(), "pattern_extracted");
    }

    #[tokio::test]
    async fn test_extract_with_one_resolved_episode_is_absent() {
        let (service, event_bus) = service().await;
        service
            .save_episode(episode("e1", "ctx", &["a"], "solved"))
            .await
            .unwrap();

        let ids = vec![EpisodeId::new("e1"), EpisodeId::new("ghost")];
        let result = service
            .extract_pattern_from_episodes(&ids, "Lonely", "p")
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(service.get_all_patterns().await.unwrap().len(), 2);
        assert_eq!(event_bus.get_events().len(), 1);
    }

    #[tokio::test]
    async fn test_extract_over_existing_id_keeps_usage_history() {
        let (service, _) = service().await;
        let id = PatternId::new("small-reviews");
        let earlier = Pattern::new(id.clone(), "Small Reviews", vec![], "p", "s", 0.4);
        service.save_pattern(earlier).await.unwrap();
        service.apply_pattern(&id).await.unwrap();
        service.apply_pattern(&id).await.unwrap();
        let before = service.get_pattern(&id).await.unwrap().unwrap();

        service
            .save_episode(episode("r1", "reviewing a large refactor", &["split", "review"], "completed"))
            .await
            .unwrap();
        service
            .save_episode(episode("r2", "reviewing dependency bumps", &["split", "review"], "solved"))
            .await
            .unwrap();

        let ids = vec![EpisodeId::new("r1"), EpisodeId::new("r2")];
        let extracted = service
            .extract_pattern_from_episodes(&ids, "Small Reviews", "Large diffs hide bugs")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(extracted.id, id);
        assert_eq!(extracted.confidence, 0.9);

        let stored = service.get_pattern(&id).await.unwrap().unwrap();
        assert_eq!(stored.problem, "Large diffs hide bugs");
        assert_eq!(stored.usage_count, 2);
        assert_eq!(stored.created_at, before.created_at);
        assert_eq!(stored.last_used_at, before.last_used_at);
        assert_eq!(service.get_all_patterns().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_find_similar_episodes_respects_limit() {
        let (service, _) = service().await;
        for (id, context) in [("a", "runtime panics in async code"), ("b", "async runtime"), ("c", "css grid")] {
            service
                .save_episode(episode(id, context, &[], "ok"))
                .await
                .unwrap();
        }

        let similar = service
            .find_similar_episodes("async runtime", DEFAULT_SIMILAR_EPISODE_LIMIT)
            .await
            .unwrap();
        let ids: Vec<&str> = similar.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let top = service.find_similar_episodes("async runtime", 1).await.unwrap();
        assert_eq!(top.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_failure_is_hard_error() {
        let db = Database::in_memory().await.unwrap();
        let repo = Arc::new(SqliteKnowledgeRepository::new(db));
        let service = StandardKnowledgeService::new(repo, Arc::new(FailingEventBus));

        let err = service
            .save_episode(episode("e1", "ctx", &[], "ok"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("episode_recorded"));
    }
}
