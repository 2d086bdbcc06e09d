// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain model for the knowledge store: patterns, episodes, events and
//! configuration. No I/O happens in this layer.

pub mod pattern;
pub mod episode;
pub mod events;
pub mod config;

pub use pattern::*;
pub use episode::*;
pub use events::*;
pub use config::*;
