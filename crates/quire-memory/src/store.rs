// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process memory repository.

use std::sync::Arc;

use async_trait::async_trait;
use quire_core::QuireError;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::repository::{MemoryQuery, MemoryRepository, MemoryUnit};
use crate::types::{MemoryKind, MemoryRecord};

#[derive(Debug, Clone, Default)]
struct Tables {
    semantic: Vec<MemoryRecord>,
    episodic: Vec<MemoryRecord>,
    procedural: Vec<MemoryRecord>,
}

impl Tables {
    fn table(&self, kind: MemoryKind) -> &Vec<MemoryRecord> {
        match kind {
            MemoryKind::Semantic => &self.semantic,
            MemoryKind::Episodic => &self.episodic,
            MemoryKind::Procedural => &self.procedural,
        }
    }

    fn table_mut(&mut self, kind: MemoryKind) -> &mut Vec<MemoryRecord> {
        match kind {
            MemoryKind::Semantic => &mut self.semantic,
            MemoryKind::Episodic => &mut self.episodic,
            MemoryKind::Procedural => &mut self.procedural,
        }
    }
}

#[derive(Debug, Clone)]
enum StagedOp {
    Insert(MemoryRecord),
    Update(MemoryRecord),
    Delete { kind: MemoryKind, id: String },
}

impl StagedOp {
    fn kind(&self) -> MemoryKind {
        match self {
            StagedOp::Insert(r) | StagedOp::Update(r) => r.kind(),
            StagedOp::Delete { kind, .. } => *kind,
        }
    }

    /// Applies the op to one table, rejecting conflicting writes.
    fn apply(&self, rows: &mut Vec<MemoryRecord>) -> Result<(), QuireError> {
        match self {
            StagedOp::Insert(record) => {
                if rows.iter().any(|r| r.id() == record.id()) {
                    return Err(QuireError::storage(format!(
                        "duplicate {} id {}",
                        record.kind(),
                        record.id()
                    )));
                }
                rows.push(record.clone());
            }
            StagedOp::Update(record) => {
                let slot = rows
                    .iter_mut()
                    .find(|r| r.id() == record.id())
                    .ok_or_else(|| QuireError::MemoryNotFound {
                        id: record.id().to_string(),
                    })?;
                *slot = record.clone();
            }
            StagedOp::Delete { id, .. } => {
                let index = rows
                    .iter()
                    .position(|r| r.id() == id)
                    .ok_or_else(|| QuireError::MemoryNotFound { id: id.clone() })?;
                rows.remove(index);
            }
        }
        Ok(())
    }
}

/// Memory tables held in process memory.
///
/// Clones share the same tables. Commits take the write lock, so units are
/// applied one at a time. Units are optimistic: every committed read is
/// remembered, and `save` fails with [`QuireError::Conflict`] if another
/// unit changed any of those rows in the meantime.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed row count for one kind.
    pub async fn count(&self, kind: MemoryKind) -> usize {
        self.tables.read().await.table(kind).len()
    }

    /// Committed rows for one kind, in insertion order.
    pub async fn snapshot(&self, kind: MemoryKind) -> Vec<MemoryRecord> {
        self.tables.read().await.table(kind).clone()
    }
}

#[async_trait]
impl MemoryRepository for InMemoryRepository {
    async fn begin(&self) -> Result<Box<dyn MemoryUnit>, QuireError> {
        Ok(Box::new(InMemoryUnit {
            tables: Arc::clone(&self.tables),
            staged: Vec::new(),
            reads: Mutex::new(Vec::new()),
        }))
    }
}

struct InMemoryUnit {
    tables: Arc<RwLock<Tables>>,
    staged: Vec<StagedOp>,
    /// Committed rows each query returned, before staged writes.
    reads: Mutex<Vec<(MemoryQuery, Vec<MemoryRecord>)>>,
}

fn committed_matches(tables: &Tables, query: &MemoryQuery) -> Vec<MemoryRecord> {
    tables
        .table(query.kind)
        .iter()
        .filter(|r| query.matches(r))
        .cloned()
        .collect()
}

#[async_trait]
impl MemoryUnit for InMemoryUnit {
    async fn fetch_all(&self, query: &MemoryQuery) -> Result<Vec<MemoryRecord>, QuireError> {
        let mut rows = self.tables.read().await.table(query.kind).clone();
        let seen: Vec<MemoryRecord> = rows.iter().filter(|r| query.matches(r)).cloned().collect();
        self.reads.lock().await.push((query.clone(), seen));

        for op in self.staged.iter().filter(|op| op.kind() == query.kind) {
            op.apply(&mut rows)?;
        }
        Ok(rows.into_iter().filter(|r| query.matches(r)).collect())
    }

    async fn insert(&mut self, record: MemoryRecord) -> Result<(), QuireError> {
        self.staged.push(StagedOp::Insert(record));
        Ok(())
    }

    async fn update(&mut self, record: MemoryRecord) -> Result<(), QuireError> {
        self.staged.push(StagedOp::Update(record));
        Ok(())
    }

    async fn delete(&mut self, record: &MemoryRecord) -> Result<(), QuireError> {
        self.staged.push(StagedOp::Delete {
            kind: record.kind(),
            id: record.id().to_string(),
        });
        Ok(())
    }

    async fn save(&mut self) -> Result<(), QuireError> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let mut guard = self.tables.write().await;
        for (query, seen) in self.reads.get_mut().iter() {
            if committed_matches(&guard, query) != *seen {
                debug!(kind = %query.kind, filter = ?query.filter, "memory unit read went stale");
                return Err(QuireError::Conflict {
                    message: format!("{} rows matching {:?} changed", query.kind, query.filter),
                });
            }
        }

        let mut next = guard.clone();
        for op in &self.staged {
            op.apply(next.table_mut(op.kind()))?;
        }
        *guard = next;

        debug!(ops = self.staged.len(), "memory unit committed");
        self.staged.clear();
        self.reads.get_mut().clear();
        Ok(())
    }
}
