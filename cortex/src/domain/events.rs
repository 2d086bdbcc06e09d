// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the knowledge store
//! Published to the EventBus after every successful write

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::episode::EpisodeId;
use super::pattern::PatternId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KnowledgeEvent {
    /// A pattern was created or replaced by an explicit save
    PatternSaved {
        pattern_id: PatternId,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// A pattern was applied to a new interaction
    PatternApplied {
        pattern_id: PatternId,
        usage_count: u64,
        timestamp: DateTime<Utc>,
    },

    /// Confidence was adjusted after an application outcome was reported
    PatternReinforced {
        pattern_id: PatternId,
        success: bool,
        delta: f64,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// A pattern was synthesized from a cluster of episodes
    PatternExtracted {
        pattern_id: PatternId,
        source_episodes: Vec<EpisodeId>,
        related_patterns: Vec<PatternId>,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// An episode was stored
    EpisodeRecorded {
        episode_id: EpisodeId,
        pattern_ids: Vec<PatternId>,
        timestamp: DateTime<Utc>,
    },
}

impl KnowledgeEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            KnowledgeEvent::PatternSaved { timestamp, .. } => *timestamp,
            KnowledgeEvent::PatternApplied { timestamp, .. } => *timestamp,
            KnowledgeEvent::PatternReinforced { timestamp, .. } => *timestamp,
            KnowledgeEvent::PatternExtracted { timestamp, .. } => *timestamp,
            KnowledgeEvent::EpisodeRecorded { timestamp, .. } => *timestamp,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            KnowledgeEvent::PatternSaved { .. } => "pattern_saved",
            KnowledgeEvent::PatternApplied { .. } => "pattern_applied",
            KnowledgeEvent::PatternReinforced { .. } => "pattern_reinforced",
            KnowledgeEvent::PatternExtracted { .. } => "pattern_extracted",
            KnowledgeEvent::EpisodeRecorded { .. } => "episode_recorded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = KnowledgeEvent::PatternReinforced {
            pattern_id: PatternId::new("progressive-disclosure"),
            success: true,
            delta: 0.05,
            confidence: 0.9,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "pattern_reinforced");
        assert_eq!(json["pattern_id"], "progressive-disclosure");

        let deserialized: KnowledgeEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.event_type(), deserialized.event_type());
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_event_type_names() {
        let event = KnowledgeEvent::EpisodeRecorded {
            episode_id: EpisodeId::new("ep-1"),
            pattern_ids: vec![],
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type(), "episode_recorded");
    }
}
