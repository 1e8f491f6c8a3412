// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Abstract memory repository.
//!
//! A [`MemoryRepository`] hands out units of work. A [`MemoryUnit`] stages
//! inserts, updates and deletes; reads inside the unit observe its own
//! staged writes, and [`MemoryUnit::save`] makes all of them visible
//! together or not at all. Dropping a unit without saving discards it.

use async_trait::async_trait;
use quire_core::QuireError;
use tracing::info;

use crate::types::{EpisodicMemory, MemoryKind, MemoryRecord, ProceduralMemory, SemanticMemory};

/// Row predicate within one memory table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    All,
    /// Semantic rows with this exact key.
    Key(String),
    /// Episodic rows with this exact date string.
    Date(String),
    /// Procedural rows with this exact pattern.
    Pattern(String),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryQuery {
    pub kind: MemoryKind,
    pub filter: QueryFilter,
}

impl MemoryQuery {
    pub fn all(kind: MemoryKind) -> Self {
        Self {
            kind,
            filter: QueryFilter::All,
        }
    }

    pub fn by_id(kind: MemoryKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            filter: QueryFilter::Id(id.into()),
        }
    }

    pub fn semantic_key(key: impl Into<String>) -> Self {
        Self {
            kind: MemoryKind::Semantic,
            filter: QueryFilter::Key(key.into()),
        }
    }

    pub fn episodic_date(date: impl Into<String>) -> Self {
        Self {
            kind: MemoryKind::Episodic,
            filter: QueryFilter::Date(date.into()),
        }
    }

    pub fn procedural_pattern(pattern: impl Into<String>) -> Self {
        Self {
            kind: MemoryKind::Procedural,
            filter: QueryFilter::Pattern(pattern.into()),
        }
    }

    /// True if `record` is in the queried table and passes the filter.
    /// A filter that does not apply to the table matches nothing.
    pub fn matches(&self, record: &MemoryRecord) -> bool {
        if record.kind() != self.kind {
            return false;
        }
        match (&self.filter, record) {
            (QueryFilter::All, _) => true,
            (QueryFilter::Id(id), r) => r.id() == id,
            (QueryFilter::Key(key), MemoryRecord::Semantic(m)) => &m.key == key,
            (QueryFilter::Date(date), MemoryRecord::Episodic(m)) => &m.date == date,
            (QueryFilter::Pattern(pattern), MemoryRecord::Procedural(m)) => &m.pattern == pattern,
            _ => false,
        }
    }
}

/// One transaction-scoped batch of reads and staged writes.
#[async_trait]
pub trait MemoryUnit: Send + Sync {
    /// Committed rows plus this unit's staged writes, in insertion order.
    async fn fetch_all(&self, query: &MemoryQuery) -> Result<Vec<MemoryRecord>, QuireError>;

    async fn insert(&mut self, record: MemoryRecord) -> Result<(), QuireError>;

    /// Writes back a mutated row, matched by kind and id.
    async fn update(&mut self, record: MemoryRecord) -> Result<(), QuireError>;

    async fn delete(&mut self, record: &MemoryRecord) -> Result<(), QuireError>;

    /// Applies every staged write atomically. On error nothing is applied.
    ///
    /// Fails with [`QuireError::Conflict`] when rows this unit read were
    /// changed by another unit that committed first.
    async fn save(&mut self) -> Result<(), QuireError>;

    async fn semantic(&self, filter: QueryFilter) -> Result<Vec<SemanticMemory>, QuireError> {
        let query = MemoryQuery {
            kind: MemoryKind::Semantic,
            filter,
        };
        Ok(self
            .fetch_all(&query)
            .await?
            .into_iter()
            .filter_map(|r| match r {
                MemoryRecord::Semantic(m) => Some(m),
                _ => None,
            })
            .collect())
    }

    async fn episodic(&self, filter: QueryFilter) -> Result<Vec<EpisodicMemory>, QuireError> {
        let query = MemoryQuery {
            kind: MemoryKind::Episodic,
            filter,
        };
        Ok(self
            .fetch_all(&query)
            .await?
            .into_iter()
            .filter_map(|r| match r {
                MemoryRecord::Episodic(m) => Some(m),
                _ => None,
            })
            .collect())
    }

    async fn procedural(&self, filter: QueryFilter) -> Result<Vec<ProceduralMemory>, QuireError> {
        let query = MemoryQuery {
            kind: MemoryKind::Procedural,
            filter,
        };
        Ok(self
            .fetch_all(&query)
            .await?
            .into_iter()
            .filter_map(|r| match r {
                MemoryRecord::Procedural(m) => Some(m),
                _ => None,
            })
            .collect())
    }
}

/// Source of units of work over the persisted memory tables.
#[async_trait]
pub trait MemoryRepository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn MemoryUnit>, QuireError>;
}

/// Deletes every row of one kind in a single unit. Returns the count.
pub async fn clear(repository: &dyn MemoryRepository, kind: MemoryKind) -> Result<usize, QuireError> {
    let mut unit = repository.begin().await?;
    let rows = unit.fetch_all(&MemoryQuery::all(kind)).await?;
    for row in &rows {
        unit.delete(row).await?;
    }
    unit.save().await?;
    info!(kind = %kind, count = rows.len(), "memory table cleared");
    Ok(rows.len())
}
