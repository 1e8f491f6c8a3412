// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quire extract` command implementation.
//!
//! Runs one extraction into a fresh in-memory repository and prints the
//! ingest report, the stored rows and any merge candidates as JSON.

use std::sync::Arc;

use chrono::Utc;
use quire_config::QuireConfig;
use quire_context::PromptBuilder;
use quire_core::{Fragment, QuireError};
use quire_memory::policy::date_from_timestamp_ms;
use quire_memory::{InMemoryRepository, MemoryExtractor, MemoryKind, MergeCandidateFinder};
use tracing::warn;

use crate::provider;

pub async fn run(config: &QuireConfig, fragments: &[Fragment]) -> Result<(), QuireError> {
    if !config.memory.enabled {
        warn!("memory is disabled in configuration, nothing to extract");
        return Ok(());
    }

    let provider = provider::build(&config.provider)?;
    let repository = Arc::new(InMemoryRepository::new());
    let extractor = MemoryExtractor::from_config(
        repository.clone(),
        PromptBuilder::from_config(&config.journal),
        &config.memory,
    );

    let source_id = uuid::Uuid::new_v4().to_string();
    let default_date = fragments
        .iter()
        .map(|f| f.timestamp_ms)
        .min()
        .and_then(date_from_timestamp_ms)
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());

    let report = extractor
        .extract(provider.as_ref(), fragments, &source_id, &default_date)
        .await?;
    let candidates = MergeCandidateFinder::from_config(&config.memory)
        .find(repository.as_ref())
        .await?;

    let output = serde_json::json!({
        "source_id": source_id,
        "report": report,
        "memories": {
            "semantic": repository.snapshot(MemoryKind::Semantic).await,
            "episodic": repository.snapshot(MemoryKind::Episodic).await,
            "procedural": repository.snapshot(MemoryKind::Procedural).await,
        },
        "merge_candidates": candidates,
    });
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| QuireError::Internal(format!("failed to encode report: {e}")))?;
    println!("{json}");
    Ok(())
}
