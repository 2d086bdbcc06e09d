// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pattern::{ExampleOutcome, PatternId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(pub String);

impl EpisodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EpisodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Record of one interaction. Episodes are never mutated once stored; saving
/// an existing id replaces the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: EpisodeId,
    pub timestamp: DateTime<Utc>,
    /// Free-text description of the situation (a sentence, not a tag list)
    pub context: String,
    /// Steps taken, in order
    pub actions: Vec<String>,
    pub outcome: String,
    #[serde(default)]
    pub pattern_ids: Vec<PatternId>,
}

impl Episode {
    pub fn new(
        id: EpisodeId,
        context: impl Into<String>,
        actions: Vec<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            id,
            timestamp: Utc::now(),
            context: context.into(),
            actions,
            outcome: outcome.into(),
            pattern_ids: Vec::new(),
        }
    }

    pub fn with_patterns(mut self, pattern_ids: Vec<PatternId>) -> Self {
        self.pattern_ids = pattern_ids;
        self
    }

    pub fn categorized_outcome(&self) -> ExampleOutcome {
        ExampleOutcome::categorize(&self.outcome)
    }
}
