// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Quire journaling pipeline.
//!
//! This crate provides the error type, the shared data model, the provider
//! traits every LLM adapter implements, and the structured-output parser
//! used to decode JSON-mode responses.

pub mod error;
pub mod output;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::QuireError;
pub use output::{parse_extraction, parse_journal, strip_code_fence};
pub use types::{
    CompletionRequest, EpisodicItem, Fragment, FragmentKind, HealthStatus, JournalOutput,
    MemoryExtractionResult, ProceduralItem, ProviderFamily, ProviderKind, SemanticItem,
};

pub use traits::{CompletionProvider, PluginAdapter, TextStream};
