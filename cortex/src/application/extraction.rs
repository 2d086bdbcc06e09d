// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Pattern Extraction
//!
//! Synthesizes a candidate [`Pattern`] from a cluster of episodes:
//!
//! 1. **Context**: tokens longer than three characters that occur in at least
//!    half of the episode contexts, first five in order of first appearance,
//!    `"general"` when none qualify.
//! 2. **Action sequences**: adjacent action pairs (`"a → b"`) that occur in
//!    at least 30% of episodes, first three.
//! 3. **Examples**: the first three episodes with their categorized outcome.
//! 4. **Solution**: the first common sequence, else the first successful
//!    episode's actions, else a generic instruction.
//! 5. **Confidence**: share of successful episodes, capped at 0.9.
//!
//! Relations are not attached here; see [`find_related_patterns`].

use std::collections::{HashMap, HashSet};

use crate::domain::{
    Episode, ExampleOutcome, Pattern, PatternExample, PatternId, MIN_CONFIDENCE,
};

/// Fewer episodes than this produce no pattern
pub const MIN_EPISODES: usize = 2;

/// Strength of the `leads_to` relations attached after extraction
pub const RELATED_PATTERN_STRENGTH: f64 = 0.5;

const MIN_TOKEN_CHARS: usize = 4;
const CONTEXT_SUPPORT: f64 = 0.5;
const MAX_CONTEXT_TAGS: usize = 5;
const SEQUENCE_SUPPORT: f64 = 0.3;
const MAX_SEQUENCES: usize = 3;
const MAX_EXAMPLES: usize = 3;
const MAX_INITIAL_CONFIDENCE: f64 = 0.9;

const FALLBACK_CONTEXT: &str = "general";
const FALLBACK_SOLUTION: &str = "Analyze the context and apply appropriate actions based on examples";

/// Returns `None` when fewer than [`MIN_EPISODES`] episodes are given.
pub fn extract_pattern(episodes: &[Episode], name: &str, problem: &str) -> Option<Pattern> {
    if episodes.len() < MIN_EPISODES {
        return None;
    }

    let outcomes: Vec<ExampleOutcome> = episodes.iter().map(Episode::categorized_outcome).collect();

    let mut context = common_context_terms(episodes);
    if context.is_empty() {
        context.push(FALLBACK_CONTEXT.to_string());
    }

    let sequences = common_action_sequences(episodes);
    let solution = synthesize_solution(&sequences, episodes, &outcomes);

    let examples = episodes
        .iter()
        .zip(&outcomes)
        .take(MAX_EXAMPLES)
        .map(|(episode, outcome)| PatternExample {
            input: episode.context.clone(),
            output: episode.actions.join(" → "),
            outcome: *outcome,
        })
        .collect();

    let successes = outcomes.iter().filter(|o| **o == ExampleOutcome::Success).count();
    let success_rate = successes as f64 / episodes.len() as f64;
    // Stored confidence never drops below the reinforcement floor
    let confidence = success_rate.min(MAX_INITIAL_CONFIDENCE).max(MIN_CONFIDENCE);

    let mut pattern = Pattern::new(
        PatternId::from_name(name),
        name,
        context,
        problem,
        solution,
        confidence,
    );
    pattern.examples = examples;
    Some(pattern)
}

/// Ids of stored patterns sharing a context tag with `pattern`, where sharing
/// means one tag contains the other. Comparison is case-sensitive.
pub fn find_related_patterns(pattern: &Pattern, all_patterns: &[Pattern]) -> Vec<PatternId> {
    all_patterns
        .iter()
        .filter(|other| other.id != pattern.id)
        .filter(|other| {
            pattern.context.iter().any(|tag| {
                other
                    .context
                    .iter()
                    .any(|other_tag| other_tag.contains(tag.as_str()) || tag.contains(other_tag.as_str()))
            })
        })
        .map(|other| other.id.clone())
        .collect()
}

fn common_context_terms(episodes: &[Episode]) -> Vec<String> {
    let documents = episodes.iter().map(|episode| {
        episode
            .context
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
            .collect::<Vec<_>>()
    });

    frequent_items(documents, episodes.len(), CONTEXT_SUPPORT, MAX_CONTEXT_TAGS)
}

fn common_action_sequences(episodes: &[Episode]) -> Vec<String> {
    let documents = episodes.iter().map(|episode| {
        episode
            .actions
            .windows(2)
            .map(|pair| format!("{} → {}", pair[0], pair[1]))
            .collect::<Vec<_>>()
    });

    frequent_items(documents, episodes.len(), SEQUENCE_SUPPORT, MAX_SEQUENCES)
}

/// Items present in at least `support` of the documents, each document
/// counted once per item, in order of first appearance, at most `max_items`.
fn frequent_items(
    documents: impl Iterator<Item = Vec<String>>,
    total: usize,
    support: f64,
    max_items: usize,
) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for document in documents {
        let mut seen = HashSet::new();
        for item in document {
            if !seen.insert(item.clone()) {
                continue;
            }
            let count = counts.entry(item.clone()).or_insert(0);
            if *count == 0 {
                order.push(item);
            }
            *count += 1;
        }
    }

    order
        .into_iter()
        .filter(|item| counts[item] as f64 / total as f64 >= support)
        .take(max_items)
        .collect()
}

fn synthesize_solution(
    sequences: &[String],
    episodes: &[Episode],
    outcomes: &[ExampleOutcome],
) -> String {
    if let Some(sequence) = sequences.first() {
        return format!("Apply the following action sequence: {}", sequence);
    }

    episodes
        .iter()
        .zip(outcomes)
        .find(|(_, outcome)| **outcome == ExampleOutcome::Success)
        .map(|(episode, _)| format!("Follow approach: {}", episode.actions.join(", then ")))
        .unwrap_or_else(|| FALLBACK_SOLUTION.to_string())
}
