// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory for the Quire journaling pipeline.
//!
//! Provides:
//! - persisted semantic, episodic and procedural memory types,
//! - an abstract unit-of-work repository with an in-process implementation,
//! - LLM extraction folded in through per-type dedup policies,
//! - merge review (candidate finding and consolidation),
//! - retrieval of relevant memories as prompt context.

pub mod extractor;
pub mod merge;
pub mod policy;
pub mod repository;
pub mod retrieval;
pub mod similarity;
pub mod store;
pub mod types;

pub use extractor::MemoryExtractor;
pub use merge::{MergeCandidateFinder, MergeExecutor};
pub use repository::{clear, MemoryQuery, MemoryRepository, MemoryUnit, QueryFilter};
pub use retrieval::MemoryContextSource;
pub use similarity::similarity;
pub use store::InMemoryRepository;
pub use types::{
    EpisodicMemory, IngestOutcome, IngestReport, KindCounts, MemoryKind, MemoryRecord,
    MergeCandidateGroup, ProceduralMemory, SemanticMemory,
};
