// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pattern Cortex
//!
//! Stores reusable problem/solution patterns and interaction episodes,
//! ranks them against free-text context, reinforces pattern confidence from
//! reported outcomes and synthesizes new patterns from clusters of episodes.
//!
//! # Architecture
//!
//! - **domain:** entities, events, configuration
//! - **application:** relevance scoring, extraction, the knowledge service
//! - **infrastructure:** storage backends and the event bus

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
