// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pluggable sources of extra prompt context, such as retrieved memories.

use async_trait::async_trait;
use quire_core::{Fragment, QuireError};

/// Supplies an optional context block for the fragments being journaled.
///
/// Retrieval is best-effort: [`PromptBuilder`](crate::PromptBuilder) logs an
/// `Err` and continues as if the source returned `Ok(None)`.
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Returns a ready-to-insert markdown block, or `None` when nothing
    /// relevant was found.
    async fn context(&self, fragments: &[Fragment]) -> Result<Option<String>, QuireError>;
}
