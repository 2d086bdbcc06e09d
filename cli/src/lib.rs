// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! pattern-cortex CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Parses commands, opens the configured store in-process and
//!   renders results as JSON

pub mod commands;
pub mod embedded;
pub mod logging;
