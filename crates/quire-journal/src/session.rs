// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized journal generation over one provider.
//!
//! A session accepts one generation at a time. Concurrent callers on the
//! same session wait for the previous call to finish; for streaming calls
//! that means until the returned stream is exhausted or dropped. Separate
//! sessions share nothing and run in parallel.

use std::sync::Arc;

use futures::StreamExt;
use quire_config::QuireConfig;
use quire_context::{OutputMode, PromptBuilder};
use quire_core::{
    parse_journal, CompletionProvider, Fragment, JournalOutput, PluginAdapter, QuireError, TextStream,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Drives journal generation for one provider.
pub struct JournalSession {
    provider: Arc<dyn CompletionProvider>,
    prompts: PromptBuilder,
    max_tokens: u32,
    gate: Arc<Mutex<()>>,
}

impl JournalSession {
    pub fn new(provider: Arc<dyn CompletionProvider>, prompts: PromptBuilder, max_tokens: u32) -> Self {
        Self {
            provider,
            prompts,
            max_tokens,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Builds a session using `[journal]` style and `[provider].max_tokens`.
    pub fn from_config(provider: Arc<dyn CompletionProvider>, config: &QuireConfig) -> Self {
        Self::new(
            provider,
            PromptBuilder::from_config(&config.journal),
            config.provider.max_tokens,
        )
    }

    pub fn prompts_mut(&mut self) -> &mut PromptBuilder {
        &mut self.prompts
    }

    pub fn provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.provider
    }

    /// Streams a markdown journal entry.
    ///
    /// The session stays busy until the stream is consumed or dropped.
    /// Dropping it also cancels the underlying HTTP read.
    pub async fn stream_journal(&self, fragments: &[Fragment]) -> Result<TextStream, QuireError> {
        let guard = Arc::clone(&self.gate).lock_owned().await;

        let prompt = self.prompts.build_journal(fragments, OutputMode::Streaming).await?;
        debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            fragments = fragments.len(),
            "streaming journal"
        );
        let stream = self.provider.stream(prompt.into_request(self.max_tokens)).await?;

        Ok(Box::pin(stream.map(move |item| {
            let _held = &guard;
            item
        })))
    }

    /// Generates a structured entry in JSON mode.
    ///
    /// Never fails on decoding; transport and API errors propagate.
    pub async fn generate_journal(&self, fragments: &[Fragment]) -> Result<JournalOutput, QuireError> {
        let _guard = self.gate.lock().await;

        let prompt = self.prompts.build_journal(fragments, OutputMode::Structured).await?;
        let text = self
            .provider
            .complete_json(prompt.into_request(self.max_tokens))
            .await?;
        let output = parse_journal(&text);

        info!(
            provider = self.provider.name(),
            model = self.provider.model(),
            title = %output.title,
            "journal entry generated"
        );
        Ok(output)
    }
}

/// Text gathered from a stream, with the error that ended it early.
#[derive(Debug, Default)]
pub struct Collected {
    pub text: String,
    pub chunks: usize,
    pub error: Option<QuireError>,
}

impl Collected {
    /// The text if the stream finished cleanly.
    pub fn into_result(self) -> Result<String, QuireError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.text),
        }
    }
}

/// Concatenates chunks until the stream ends or yields an error.
/// Text received before the error is kept.
pub async fn collect_stream(mut stream: TextStream) -> Collected {
    let mut collected = Collected::default();
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                collected.text.push_str(&chunk);
                collected.chunks += 1;
            }
            Err(e) => {
                collected.error = Some(e);
                break;
            }
        }
    }
    debug!(chunks = collected.chunks, failed = collected.error.is_some(), "stream collected");
    collected
}
