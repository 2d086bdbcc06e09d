// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use pattern_cortex::domain::{KnowledgeConfigManifest, StorageConfig};
use pattern_cortex_cli::commands::episode::{self, EpisodeCommand};
use pattern_cortex_cli::commands::pattern::{self, PatternCommand, ReportedOutcome};
use pattern_cortex_cli::embedded::EmbeddedStore;
use serde_json::Value;
use tempfile::TempDir;

async fn open(dir: &TempDir) -> EmbeddedStore {
    let mut config = KnowledgeConfigManifest::default();
    config.spec.storage = StorageConfig::Json {
        path: dir.path().join("knowledge.json"),
    };
    EmbeddedStore::open(config).await.unwrap()
}

fn write(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn unknown_pattern_prints_null() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir).await;

    let got = pattern::execute(PatternCommand::Get { id: "nope".into() }, &store)
        .await
        .unwrap();
    assert_eq!(got, Value::Null);

    let reinforced = pattern::execute(
        PatternCommand::Reinforce {
            id: "nope".into(),
            outcome: ReportedOutcome::Success,
        },
        &store,
    )
    .await
    .unwrap();
    assert_eq!(reinforced, Value::Null);
}

#[tokio::test]
async fn save_pattern_file_without_created_at() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir).await;
    let file = write(
        &dir,
        "pattern.json",
        r#"{
            "id": "pair-programming",
            "name": "Pair Programming",
            "context": ["onboarding"],
            "problem": "Knowledge stays in one head",
            "solution": "Work on the same change together",
            "confidence": 0.7
        }"#,
    );

    let saved = pattern::execute(PatternCommand::Save { file }, &store)
        .await
        .unwrap();
    assert_eq!(saved["id"], "pair-programming");
    assert!(saved["createdAt"].is_string());

    let listed = pattern::execute(PatternCommand::List, &store).await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn search_respects_limit() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir).await;

    let matches = pattern::execute(
        PatternCommand::Search {
            query: "teaching a user is learning an abstract idea".into(),
            limit: Some(1),
        },
        &store,
    )
    .await
    .unwrap();

    let matches = matches.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0]["relevance"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn reinforce_reports_confidence() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir).await;

    let result = pattern::execute(
        PatternCommand::Reinforce {
            id: "progressive-disclosure".into(),
            outcome: ReportedOutcome::Failure,
        },
        &store,
    )
    .await
    .unwrap();

    assert_eq!(result["patternId"], "progressive-disclosure");
    assert_eq!(result["success"], false);
    assert!((result["confidence"].as_f64().unwrap() - 0.83).abs() < 1e-9);
}

#[tokio::test]
async fn episodes_then_extract() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir).await;

    for (name, body) in [
        (
            "e1.json",
            r#"{"id": "e1", "context": "reviewing a large refactor", "actions": ["split commits", "review"], "outcome": "completed"}"#,
        ),
        (
            "e2.json",
            r#"{"id": "e2", "context": "reviewing dependency bumps", "actions": ["split commits", "review"], "outcome": "stuck"}"#,
        ),
    ] {
        let file = write(&dir, name, body);
        episode::execute(EpisodeCommand::Save { file }, &store)
            .await
            .unwrap();
    }

    let similar = episode::execute(
        EpisodeCommand::Similar {
            query: "reviewing a large refactor".into(),
            limit: None,
        },
        &store,
    )
    .await
    .unwrap();
    assert_eq!(similar[0]["id"], "e1");

    let extracted = pattern::execute(
        PatternCommand::Extract {
            episodes: vec!["e1".into(), "e2".into()],
            name: "Small Reviews".into(),
            problem: "Large diffs hide bugs".into(),
        },
        &store,
    )
    .await
    .unwrap();

    assert_eq!(extracted["id"], "small-reviews");
    assert_eq!(extracted["context"][0], "reviewing");
    assert_eq!(
        extracted["solution"],
        "Apply the following action sequence: split commits → review"
    );
    assert!((extracted["confidence"].as_f64().unwrap() - 0.5).abs() < 1e-9);

    store.close().await.unwrap();
}
