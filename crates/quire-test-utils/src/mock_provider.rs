// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! Replies are popped from a FIFO queue shared by `stream` and
//! `complete_json`. Every request is recorded for later inspection.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream;
use quire_core::{
    CompletionProvider, CompletionRequest, HealthStatus, PluginAdapter, ProviderFamily,
    QuireError, TextStream,
};
use tokio::sync::Mutex;

const DEFAULT_TEXT: &str = "mock response";

/// One scripted provider reply.
#[derive(Debug)]
pub enum Reply {
    /// Returned by `complete_json`; streamed as a single chunk.
    Text(String),
    /// Streamed item by item; `complete_json` concatenates the chunks up
    /// to the first error and returns that error if there is one.
    Chunks(Vec<Result<String, QuireError>>),
    /// Returned from the call itself, before any chunk.
    Fail(QuireError),
}

/// A scripted [`CompletionProvider`].
///
/// When the queue is empty, `"mock response"` is returned.
pub struct MockProvider {
    family: ProviderFamily,
    model: String,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    probe_ok: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            family: ProviderFamily::ChatCompletion,
            model: "mock-model".to_string(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            probe_ok: true,
        }
    }

    pub fn with_family(mut self, family: ProviderFamily) -> Self {
        self.family = family;
        self
    }

    /// Makes `probe` report rejected credentials.
    pub fn rejecting_credentials(mut self) -> Self {
        self.probe_ok = false;
        self
    }

    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.replies.get_mut().push_back(reply);
        self
    }

    pub fn with_json(self, text: impl Into<String>) -> Self {
        self.with_reply(Reply::Text(text.into()))
    }

    pub fn with_chunks<I, S>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_reply(Reply::Chunks(
            chunks.into_iter().map(|c| Ok(c.into())).collect(),
        ))
    }

    pub fn with_error(self, error: QuireError) -> Self {
        self.with_reply(Reply::Fail(error))
    }

    /// Queues a reply after construction.
    pub async fn push_reply(&self, reply: Reply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_reply(&self, request: CompletionRequest) -> Reply {
        self.requests.lock().await.push(request);
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Reply::Text(DEFAULT_TEXT.to_string()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, QuireError> {
        Ok(if self.probe_ok {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy("credentials rejected".into())
        })
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn family(&self) -> ProviderFamily {
        self.family
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn stream(&self, request: CompletionRequest) -> Result<TextStream, QuireError> {
        let items = match self.next_reply(request).await {
            Reply::Text(text) => vec![Ok(text)],
            Reply::Chunks(items) => items,
            Reply::Fail(e) => return Err(e),
        };
        Ok(Box::pin(stream::iter(items)))
    }

    async fn complete_json(&self, request: CompletionRequest) -> Result<String, QuireError> {
        match self.next_reply(request).await {
            Reply::Text(text) => Ok(text),
            Reply::Chunks(items) => items.into_iter().collect(),
            Reply::Fail(e) => Err(e),
        }
    }

    async fn probe(&self) -> Result<bool, QuireError> {
        Ok(self.probe_ok)
    }
}
