// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-based memory extraction from journal fragments.
//!
//! Asks the provider for a JSON extraction result, then folds every item
//! into the repository through the dedup policies in one unit of work.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quire_config::MemoryConfig;
use quire_context::PromptBuilder;
use quire_core::{
    parse_extraction, CompletionProvider, Fragment, MemoryExtractionResult, PluginAdapter, QuireError,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::policy;
use crate::repository::MemoryRepository;
use crate::types::IngestReport;

/// Attempts at one ingest when a concurrent commit invalidates its reads.
const INGEST_ATTEMPTS: usize = 3;

/// Extracts and stores long-term memories.
///
/// Calls on one extractor are serialized; separate extractors share only
/// the repository.
pub struct MemoryExtractor {
    repository: Arc<dyn MemoryRepository>,
    prompts: PromptBuilder,
    max_tokens: u32,
    lock: Mutex<()>,
}

impl MemoryExtractor {
    pub fn new(repository: Arc<dyn MemoryRepository>, prompts: PromptBuilder, max_tokens: u32) -> Self {
        Self {
            repository,
            prompts,
            max_tokens,
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(
        repository: Arc<dyn MemoryRepository>,
        prompts: PromptBuilder,
        config: &MemoryConfig,
    ) -> Self {
        Self::new(repository, prompts, config.extraction_max_tokens)
    }

    /// Runs one extraction call and ingests its result.
    ///
    /// A response that does not decode as an extraction result ingests
    /// nothing. Transport and API errors propagate.
    pub async fn extract(
        &self,
        provider: &dyn CompletionProvider,
        fragments: &[Fragment],
        source_id: &str,
        default_date: &str,
    ) -> Result<IngestReport, QuireError> {
        let _guard = self.lock.lock().await;

        let request = self.prompts.build_extraction(fragments)?.into_request(self.max_tokens);
        debug!(
            provider = provider.name(),
            model = provider.model(),
            fragments = fragments.len(),
            "requesting memory extraction"
        );
        let text = provider.complete_json(request).await?;
        let result = parse_extraction(&text);

        self.ingest_locked(&result, source_id, default_date).await
    }

    /// Folds an extraction result into the repository and commits.
    pub async fn ingest(
        &self,
        result: &MemoryExtractionResult,
        source_id: &str,
        default_date: &str,
    ) -> Result<IngestReport, QuireError> {
        let _guard = self.lock.lock().await;
        self.ingest_locked(result, source_id, default_date).await
    }

    async fn ingest_locked(
        &self,
        result: &MemoryExtractionResult,
        source_id: &str,
        default_date: &str,
    ) -> Result<IngestReport, QuireError> {
        if result.is_empty() {
            debug!(source_id, "extraction produced no memories");
            return Ok(IngestReport::default());
        }

        let now = Utc::now();
        let mut attempt = 1;
        let report = loop {
            match self.ingest_once(result, source_id, default_date, now).await {
                Err(e) if e.is_conflict() && attempt < INGEST_ATTEMPTS => {
                    warn!(source_id, attempt, error = %e, "memory ingest conflicted, rerunning");
                    attempt += 1;
                }
                other => break other?,
            }
        };

        info!(
            source_id,
            semantic_inserted = report.semantic.inserted,
            semantic_updated = report.semantic.updated,
            episodic_inserted = report.episodic.inserted,
            episodic_skipped = report.episodic.skipped,
            procedural_inserted = report.procedural.inserted,
            procedural_updated = report.procedural.updated,
            "memories ingested"
        );
        Ok(report)
    }

    /// One pass of the dedup policies over a fresh unit of work.
    async fn ingest_once(
        &self,
        result: &MemoryExtractionResult,
        source_id: &str,
        default_date: &str,
        now: DateTime<Utc>,
    ) -> Result<IngestReport, QuireError> {
        let mut report = IngestReport::default();
        let mut unit = self.repository.begin().await?;

        for item in &result.semantic {
            let outcome = policy::ingest_semantic(unit.as_mut(), item, source_id, now).await?;
            report.semantic.record(outcome);
        }
        for item in &result.episodic {
            let outcome =
                policy::ingest_episodic(unit.as_mut(), item, source_id, default_date, now).await?;
            report.episodic.record(outcome);
        }
        for item in &result.procedural {
            let outcome = policy::ingest_procedural(unit.as_mut(), item, source_id, now).await?;
            report.procedural.record(outcome);
        }

        unit.save().await?;
        Ok(report)
    }
}
