// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted memory types and merge review results.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use quire_core::{EpisodicItem, ProceduralItem, SemanticItem};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// The three memory tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MemoryKind {
    Semantic,
    Episodic,
    Procedural,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A durable key/value fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticMemory {
    pub id: String,
    pub key: String,
    pub value: String,
    pub confidence: f64,
    /// Ids of the fragments or entries this fact was seen in.
    pub source_ids: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SemanticMemory {
    pub fn from_item(item: &SemanticItem, source_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            key: item.key.trim().to_string(),
            value: item.value.clone(),
            confidence: item.confidence,
            source_ids: BTreeSet::from([source_id.to_string()]),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A dated event. Carries exactly one source id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicMemory {
    pub id: String,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    /// `YYYY-MM-DD`, or whatever date string the extraction supplied.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub source_id: String,
    pub created_at: DateTime<Utc>,
}

impl EpisodicMemory {
    pub fn from_item(item: &EpisodicItem, date: String, source_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            event: item.event.trim().to_string(),
            emotion: item.emotion.clone(),
            date,
            context: item.context.clone(),
            source_id: source_id.to_string(),
            created_at: now,
        }
    }
}

/// A behavioral pattern with a sighting counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceduralMemory {
    pub id: String,
    pub pattern: String,
    pub preference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    /// Never decreases.
    pub frequency: u32,
    pub source_ids: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProceduralMemory {
    pub fn from_item(item: &ProceduralItem, source_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            pattern: item.pattern.trim().to_string(),
            preference: item.preference.clone(),
            trigger: item.trigger.clone(),
            frequency: 1,
            source_ids: BTreeSet::from([source_id.to_string()]),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A row of any memory table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MemoryRecord {
    Semantic(SemanticMemory),
    Episodic(EpisodicMemory),
    Procedural(ProceduralMemory),
}

impl MemoryRecord {
    pub fn kind(&self) -> MemoryKind {
        match self {
            MemoryRecord::Semantic(_) => MemoryKind::Semantic,
            MemoryRecord::Episodic(_) => MemoryKind::Episodic,
            MemoryRecord::Procedural(_) => MemoryKind::Procedural,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            MemoryRecord::Semantic(m) => &m.id,
            MemoryRecord::Episodic(m) => &m.id,
            MemoryRecord::Procedural(m) => &m.id,
        }
    }
}

impl From<SemanticMemory> for MemoryRecord {
    fn from(m: SemanticMemory) -> Self {
        MemoryRecord::Semantic(m)
    }
}

impl From<EpisodicMemory> for MemoryRecord {
    fn from(m: EpisodicMemory) -> Self {
        MemoryRecord::Episodic(m)
    }
}

impl From<ProceduralMemory> for MemoryRecord {
    fn from(m: ProceduralMemory) -> Self {
        MemoryRecord::Procedural(m)
    }
}

/// A proposed cluster of probable duplicates awaiting a merge decision.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeCandidateGroup {
    pub kind: MemoryKind,
    /// Shared key, shared date, or seed pattern.
    pub group_key: String,
    /// Member ids in first-appearance order.
    pub ids: Vec<String>,
    /// Content suggested for the surviving row.
    pub suggestion: Option<String>,
}

/// What a dedup policy did with one extracted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted,
    Updated,
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl KindCounts {
    pub fn record(&mut self, outcome: IngestOutcome) {
        match outcome {
            IngestOutcome::Inserted => self.inserted += 1,
            IngestOutcome::Updated => self.updated += 1,
            IngestOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Per-kind tallies of one ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub semantic: KindCounts,
    pub episodic: KindCounts,
    pub procedural: KindCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_reports_kind_and_id() {
        let now = Utc::now();
        let item = SemanticItem {
            key: " pet.name ".into(),
            value: "Max".into(),
            confidence: 0.8,
        };
        let memory = SemanticMemory::from_item(&item, "entry-1", now);
        assert_eq!(memory.key, "pet.name");
        assert_eq!(memory.source_ids.len(), 1);

        let record = MemoryRecord::from(memory.clone());
        assert_eq!(record.kind(), MemoryKind::Semantic);
        assert_eq!(record.id(), memory.id);
    }

    #[test]
    fn procedural_starts_at_frequency_one() {
        let item = ProceduralItem {
            pattern: "evening walk".into(),
            preference: "after dinner".into(),
            trigger: None,
        };
        let memory = ProceduralMemory::from_item(&item, "e1", Utc::now());
        assert_eq!(memory.frequency, 1);
        assert_ne!(memory.id, ProceduralMemory::from_item(&item, "e1", Utc::now()).id);
    }

    #[test]
    fn record_serializes_with_kind_tag() {
        let item = EpisodicItem {
            event: "Went to the park".into(),
            date: "2026-03-01".into(),
            emotion: Some("happy".into()),
            context: None,
        };
        let record = MemoryRecord::from(EpisodicMemory::from_item(
            &item,
            "2026-03-01".into(),
            "e1",
            Utc::now(),
        ));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "episodic");
        assert_eq!(json["event"], "Went to the park");
        assert!(json.get("context").is_none());
    }

    #[test]
    fn counts_accumulate() {
        let mut counts = KindCounts::default();
        counts.record(IngestOutcome::Inserted);
        counts.record(IngestOutcome::Skipped);
        counts.record(IngestOutcome::Skipped);
        assert_eq!(counts, KindCounts { inserted: 1, updated: 0, skipped: 2 });
    }
}
