// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the pattern-cortex CLI

pub mod config;
pub mod episode;
pub mod pattern;

pub use self::config::ConfigCommand;
pub use self::episode::EpisodeCommand;
pub use self::pattern::PatternCommand;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Print a command result as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render result")?;
    println!("{}", rendered);
    Ok(())
}

/// Read a JSON document from disk. When the document is an object missing
/// `timestamp_field`, the current time is filled in.
pub fn load_document<T: DeserializeOwned>(path: &Path, timestamp_field: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    if let Some(object) = value.as_object_mut() {
        object
            .entry(timestamp_field)
            .or_insert_with(|| serde_json::Value::String(Utc::now().to_rfc3339()));
    }

    serde_json::from_value(value)
        .with_context(|| format!("{} does not describe a valid document", path.display()))
}
