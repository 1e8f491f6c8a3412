// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for the Quire journaling pipeline.
//!
//! [`PromptBuilder`] combines:
//! - a style (language, tone) from `[journal]` config,
//! - the fragments, ordered by time and capped,
//! - optional context blocks from registered [`ContextSource`]s,
//!
//! into a system/user [`Prompt`] for either streaming markdown or
//! structured JSON output.

pub mod source;

mod timeline;
mod templates;

use chrono::{FixedOffset, Offset, Utc};
use quire_config::JournalConfig;
use quire_core::{CompletionRequest, Fragment, QuireError};
use tracing::{debug, warn};

pub use source::ContextSource;

/// Output shape requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Free markdown, consumed incrementally.
    Streaming,
    /// One JSON object with the journal fields.
    Structured,
}

/// Writing style settings.
#[derive(Debug, Clone)]
pub struct PromptStyle {
    pub language: String,
    pub tone: String,
    pub max_fragments: usize,
    /// Offset used for `HH:MM` prefixes and entry dates.
    pub utc_offset: FixedOffset,
}

impl From<&JournalConfig> for PromptStyle {
    fn from(config: &JournalConfig) -> Self {
        Self {
            language: config.language.clone(),
            tone: config.tone.clone(),
            max_fragments: config.max_fragments.max(1),
            utc_offset: utc(),
        }
    }
}

impl Default for PromptStyle {
    fn default() -> Self {
        Self::from(&JournalConfig::default())
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// An assembled prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn into_request(self, max_tokens: u32) -> CompletionRequest {
        CompletionRequest::new(self.system, self.user, max_tokens)
    }
}

/// Builds journal and extraction prompts.
pub struct PromptBuilder {
    style: PromptStyle,
    sources: Vec<Box<dyn ContextSource>>,
}

impl PromptBuilder {
    pub fn new(style: PromptStyle) -> Self {
        Self {
            style,
            sources: Vec::new(),
        }
    }

    pub fn from_config(config: &JournalConfig) -> Self {
        Self::new(PromptStyle::from(config))
    }

    /// Registers a context source. Sources are queried in registration order.
    pub fn add_source(&mut self, source: Box<dyn ContextSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Box<dyn ContextSource>) -> Self {
        self.add_source(source);
        self
    }

    pub fn style(&self) -> &PromptStyle {
        &self.style
    }

    /// Assembles the journal prompt.
    ///
    /// Fails only when `fragments` is empty; context source errors are
    /// logged and ignored.
    pub async fn build_journal(
        &self,
        fragments: &[Fragment],
        mode: OutputMode,
    ) -> Result<Prompt, QuireError> {
        let selected = self.select(fragments)?;
        let context = self.gather_context(fragments).await;

        let mut user = String::new();
        let first = selected.first().map(|f| f.timestamp_ms);
        if let Some(date) = first.and_then(|ts| timeline::date_of(ts, self.style.utc_offset)) {
            user.push_str(&format!("Date: {date}\n\n"));
        }
        for block in &context {
            user.push_str(block.trim());
            user.push_str("\n\n");
        }
        user.push_str("## Notes\n");
        user.push_str(&timeline::render(&selected, self.style.utc_offset));

        Ok(Prompt {
            system: templates::journal_system(&self.style, mode == OutputMode::Structured),
            user,
        })
    }

    /// Assembles the memory extraction prompt. Context sources are not
    /// consulted, so known memories are not echoed back as new ones.
    pub fn build_extraction(&self, fragments: &[Fragment]) -> Result<Prompt, QuireError> {
        let selected = self.select(fragments)?;

        let mut user = String::new();
        let first = selected.first().map(|f| f.timestamp_ms);
        if let Some(date) = first.and_then(|ts| timeline::date_of(ts, self.style.utc_offset)) {
            user.push_str(&format!("Date of these notes: {date}\n\n"));
        }
        user.push_str("## Notes\n");
        user.push_str(&timeline::render(&selected, self.style.utc_offset));

        Ok(Prompt {
            system: templates::extraction_system(&self.style),
            user,
        })
    }

    /// Entry date (`YYYY-MM-DD`) of the earliest fragment.
    pub fn entry_date(&self, fragments: &[Fragment]) -> Option<String> {
        let earliest = fragments.iter().map(|f| f.timestamp_ms).min()?;
        timeline::date_of(earliest, self.style.utc_offset)
    }

    fn select<'a>(&self, fragments: &'a [Fragment]) -> Result<Vec<&'a Fragment>, QuireError> {
        if fragments.is_empty() {
            return Err(QuireError::Internal(
                "cannot build a prompt without fragments".into(),
            ));
        }
        let selected = timeline::select(fragments, self.style.max_fragments);
        if selected.len() < fragments.len() {
            debug!(
                total = fragments.len(),
                kept = selected.len(),
                "fragment cap reached, keeping the most recent"
            );
        }
        Ok(selected)
    }

    async fn gather_context(&self, fragments: &[Fragment]) -> Vec<String> {
        let mut blocks = Vec::new();
        for source in &self.sources {
            match source.context(fragments).await {
                Ok(Some(block)) if !block.trim().is_empty() => blocks.push(block),
                Ok(_) => {}
                Err(e) => {
                    warn!(source = source.name(), error = %e, "context retrieval failed, continuing without it");
                }
            }
        }
        blocks
    }
}
