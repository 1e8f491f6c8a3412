// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion provider trait for the LLM protocol families.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::QuireError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, ProviderFamily};

/// Incremental text chunks decoded from a streaming response.
///
/// Dropping the stream aborts the underlying transport read.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, QuireError>> + Send>>;

/// Adapter for an LLM completion service.
///
/// Implementations build provider-specific requests and decode the
/// provider's wire format into plain text.
#[async_trait]
pub trait CompletionProvider: PluginAdapter {
    /// The wire protocol family this adapter speaks.
    fn family(&self) -> ProviderFamily;

    /// Model identifier sent with every request.
    fn model(&self) -> &str;

    /// Sends a streaming request and returns decoded text chunks.
    async fn stream(&self, request: CompletionRequest) -> Result<TextStream, QuireError>;

    /// Sends a non-streaming JSON-mode request and returns the text payload
    /// located at the provider-specific field path.
    async fn complete_json(&self, request: CompletionRequest) -> Result<String, QuireError>;

    /// Cheap credential check bounded by a short timeout.
    async fn probe(&self) -> Result<bool, QuireError>;
}
