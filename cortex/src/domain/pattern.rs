// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pattern aggregate: a reusable problem/solution record with confidence and
//! usage tracking.
//!
//! Confidence always stays within [`MIN_CONFIDENCE`, `MAX_CONFIDENCE`] once a
//! pattern has been adjusted by reinforcement; every adjustment goes through
//! [`clamp_confidence`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Confidence gained when an application of the pattern succeeded.
pub const SUCCESS_ADJUSTMENT: f64 = 0.05;
/// Confidence lost when an application of the pattern failed.
pub const FAILURE_ADJUSTMENT: f64 = -0.02;

/// Identifier of a pattern.
///
/// Used as a weak reference from relations and episodes: nothing guarantees
/// the referenced pattern exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(pub String);

impl PatternId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an id from a human readable name: lower-cased, each whitespace
    /// character becomes a hyphen, everything that is not alphanumeric or a
    /// hyphen is dropped.
    pub fn from_name(name: &str) -> Self {
        let id = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_whitespace() { '-' } else { c })
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect::<String>();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatternId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Result category of an example application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExampleOutcome {
    Success,
    Failure,
    Partial,
}

impl ExampleOutcome {
    /// Categorize a free-text outcome description. Case-insensitive substring
    /// match; success vocabulary is checked before failure vocabulary.
    pub fn categorize(outcome: &str) -> Self {
        const SUCCESS_TERMS: [&str; 4] = ["success", "understood", "completed", "solved"];
        const FAILURE_TERMS: [&str; 4] = ["fail", "error", "confused", "stuck"];

        let lowered = outcome.to_lowercase();
        if SUCCESS_TERMS.iter().any(|term| lowered.contains(term)) {
            ExampleOutcome::Success
        } else if FAILURE_TERMS.iter().any(|term| lowered.contains(term)) {
            ExampleOutcome::Failure
        } else {
            ExampleOutcome::Partial
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternExample {
    pub input: String,
    pub output: String,
    pub outcome: ExampleOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    LeadsTo,
    RefinedBy,
    ConflictsWith,
    Requires,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRelation {
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    pub pattern_id: PatternId,
    /// Relation strength in [0, 1]
    pub strength: f64,
}

impl PatternRelation {
    pub fn leads_to(pattern_id: PatternId, strength: f64) -> Self {
        Self {
            relation_type: RelationType::LeadsTo,
            pattern_id,
            strength,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: PatternId,
    pub name: String,
    /// Situations the pattern applies to. Order is kept for display only.
    pub context: Vec<String>,
    pub problem: String,
    pub solution: String,
    #[serde(default)]
    pub examples: Vec<PatternExample>,
    #[serde(default)]
    pub relations: Vec<PatternRelation>,
    pub confidence: f64,
    #[serde(default)]
    pub usage_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Pattern {
    pub fn new(
        id: PatternId,
        name: impl Into<String>,
        context: Vec<String>,
        problem: impl Into<String>,
        solution: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            context,
            problem: problem.into(),
            solution: solution.into(),
            examples: Vec::new(),
            relations: Vec::new(),
            confidence,
            usage_count: 0,
            created_at: Utc::now(),
            last_used_at: None,
        }
    }

    /// Record one application of the pattern.
    pub fn record_use(&mut self, used_at: DateTime<Utc>) {
        self.usage_count += 1;
        self.last_used_at = Some(used_at);
    }

    /// Apply a confidence delta, keeping the result within bounds.
    pub fn adjust_confidence(&mut self, delta: f64) {
        self.confidence = clamp_confidence(self.confidence + delta);
    }
}

pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_CONFIDENCE;
    }
    value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Confidence delta for a reported application outcome.
pub fn reinforcement_delta(success: bool) -> f64 {
    if success {
        SUCCESS_ADJUSTMENT
    } else {
        FAILURE_ADJUSTMENT
    }
}

/// Patterns every fresh store starts with.
pub fn seed_patterns() -> Vec<Pattern> {
    let mut progressive = Pattern::new(
        PatternId::new("progressive-disclosure"),
        "Progressive Disclosure",
        vec![
            "user is learning".to_string(),
            "complex topic".to_string(),
            "new concept".to_string(),
        ],
        "Presenting everything at once overwhelms someone who is still building a mental model.",
        "Start with the essential idea, then reveal detail in layers as understanding grows.",
        0.85,
    );
    progressive.examples.push(PatternExample {
        input: "Explain how async runtimes work".to_string(),
        output: "Describe futures first, then polling, then executors and wakers".to_string(),
        outcome: ExampleOutcome::Success,
    });
    progressive
        .relations
        .push(PatternRelation::leads_to(PatternId::new("concrete-before-abstract"), 0.7));

    let mut concrete = Pattern::new(
        PatternId::new("concrete-before-abstract"),
        "Concrete Before Abstract",
        vec![
            "explaining concepts".to_string(),
            "teaching".to_string(),
            "abstract idea".to_string(),
        ],
        "Abstract definitions do not stick without something tangible to anchor them.",
        "Show a specific worked example first, then generalize to the underlying principle.",
        0.8,
    );
    concrete.examples.push(PatternExample {
        input: "What is a trait object?".to_string(),
        output: "Walk through a Vec<Box<dyn Shape>> before defining dynamic dispatch".to_string(),
        outcome: ExampleOutcome::Success,
    });

    vec![progressive, concrete]
}
