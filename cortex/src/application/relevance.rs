// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Relevance Scoring
//!
//! Literal substring heuristics for ranking stored patterns and episodes
//! against a free-text context. There is no stemming or per-word matching.
//!
//! ## Pattern relevance
//!
//! raw = 0.3 per context tag contained in the query
//!     + 0.2 if the pattern name is contained in the query
//!     + 0.2 if the problem contains the query or the query contains the problem
//!
//! relevance = min(1.0, raw × confidence); zero scores are dropped.
//!
//! ## Episode similarity
//!
//! score = 0.5 if either context contains the other
//!       + 0.1 per distinct whitespace token shared by both

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{Episode, Pattern};

const TAG_WEIGHT: f64 = 0.3;
const NAME_WEIGHT: f64 = 0.2;
const PROBLEM_WEIGHT: f64 = 0.2;

const CONTAINMENT_BASE: f64 = 0.5;
const SHARED_TOKEN_WEIGHT: f64 = 0.1;

/// A pattern ranked against a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern: Pattern,
    /// Heuristic score in (0, 1]
    pub relevance: f64,
    pub reason: String,
}

/// Score one pattern against an already lower-cased query.
pub fn score_pattern(pattern: &Pattern, query: &str) -> (f64, Vec<String>) {
    let mut raw = 0.0;
    let mut matched = Vec::new();

    for tag in &pattern.context {
        if query.contains(tag.to_lowercase().as_str()) {
            raw += TAG_WEIGHT;
            matched.push(tag.clone());
        }
    }

    if query.contains(pattern.name.to_lowercase().as_str()) {
        raw += NAME_WEIGHT;
    }

    let problem = pattern.problem.to_lowercase();
    if query.contains(problem.as_str()) || problem.contains(query) {
        raw += PROBLEM_WEIGHT;
    }

    ((raw * pattern.confidence).min(1.0), matched)
}

/// Rank patterns by relevance to `query`, highest first. Patterns scoring
/// zero are excluded; ties keep the input order.
pub fn rank_patterns(patterns: Vec<Pattern>, query: &str) -> Vec<PatternMatch> {
    let query = query.to_lowercase();

    let mut matches: Vec<PatternMatch> = patterns
        .into_iter()
        .filter_map(|pattern| {
            let (relevance, matched) = score_pattern(&pattern, &query);
            if relevance == 0.0 {
                return None;
            }
            let reason = if matched.is_empty() {
                "Partial match on name or problem".to_string()
            } else {
                format!("Matches contexts: {}", matched.join(", "))
            };
            Some(PatternMatch {
                pattern,
                relevance,
                reason,
            })
        })
        .collect();

    matches.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    matches
}

/// Similarity between an already lower-cased query and an episode context.
pub fn score_episode(episode: &Episode, query: &str, query_tokens: &HashSet<&str>) -> f64 {
    let context = episode.context.to_lowercase();

    let mut score = 0.0;
    if context.contains(query) || query.contains(context.as_str()) {
        score += CONTAINMENT_BASE;
    }

    let context_tokens: HashSet<&str> = context.split_whitespace().collect();
    let shared = query_tokens.intersection(&context_tokens).count();
    score + shared as f64 * SHARED_TOKEN_WEIGHT
}

/// Most similar episodes first. The top `limit` are taken before zero scores
/// are dropped, so fewer than `limit` may come back.
pub fn rank_episodes(episodes: Vec<Episode>, query: &str, limit: usize) -> Vec<Episode> {
    let query = query.to_lowercase();
    let query_tokens: HashSet<&str> = query.split_whitespace().collect();

    let mut scored: Vec<(Episode, f64)> = episodes
        .into_iter()
        .map(|episode| {
            let score = score_episode(&episode, &query, &query_tokens);
            (episode, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(limit)
        .filter(|(_, score)| *score > 0.0)
        .map(|(episode, _)| episode)
        .collect()
}
