// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deduplication policies applied when folding extracted items into the
//! memory tables.
//!
//! - Semantic: exact key match, first write wins, sources are unioned.
//! - Episodic: same-date rows whose events contain one another
//!   (case-insensitive) suppress the incoming event.
//! - Procedural: exact pattern match bumps the frequency counter.

use chrono::{DateTime, NaiveDate, Utc};
use quire_core::{EpisodicItem, ProceduralItem, QuireError, SemanticItem};
use tracing::debug;

use crate::repository::{MemoryUnit, QueryFilter};
use crate::similarity::similarity;
use crate::types::{EpisodicMemory, IngestOutcome, ProceduralMemory, SemanticMemory};

const ISO_DATE: &str = "%Y-%m-%d";

/// Returns the trimmed date if it starts with a `YYYY-MM-DD` calendar date,
/// otherwise `default_date`.
pub fn normalize_date(raw: &str, default_date: &str) -> String {
    let trimmed = raw.trim();
    let looks_iso = trimmed
        .get(..10)
        .is_some_and(|prefix| NaiveDate::parse_from_str(prefix, ISO_DATE).is_ok());
    if looks_iso {
        trimmed.to_string()
    } else {
        default_date.to_string()
    }
}

/// UTC calendar date of a millisecond timestamp as `YYYY-MM-DD`.
pub fn date_from_timestamp_ms(timestamp_ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms).map(|t| t.format(ISO_DATE).to_string())
}

/// Case-insensitive containment in either direction.
pub fn events_overlap(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

pub async fn ingest_semantic(
    unit: &mut dyn MemoryUnit,
    item: &SemanticItem,
    source_id: &str,
    now: DateTime<Utc>,
) -> Result<IngestOutcome, QuireError> {
    let key = item.key.trim();
    if key.is_empty() {
        return Ok(IngestOutcome::Skipped);
    }

    let existing = unit.semantic(QueryFilter::Key(key.to_string())).await?;
    match existing.into_iter().next() {
        Some(mut row) => {
            if row.value != item.value {
                debug!(key, kept = %row.value, ignored = %item.value, "conflicting fact, keeping first value");
            }
            row.source_ids.insert(source_id.to_string());
            row.updated_at = now;
            unit.update(row.into()).await?;
            Ok(IngestOutcome::Updated)
        }
        None => {
            unit.insert(SemanticMemory::from_item(item, source_id, now).into())
                .await?;
            Ok(IngestOutcome::Inserted)
        }
    }
}

pub async fn ingest_episodic(
    unit: &mut dyn MemoryUnit,
    item: &EpisodicItem,
    source_id: &str,
    default_date: &str,
    now: DateTime<Utc>,
) -> Result<IngestOutcome, QuireError> {
    let event = item.event.trim();
    if event.is_empty() {
        return Ok(IngestOutcome::Skipped);
    }

    let date = normalize_date(&item.date, default_date);
    let same_day = unit.episodic(QueryFilter::Date(date.clone())).await?;
    for row in same_day.iter().filter(|r| !r.event.trim().is_empty()) {
        let score = similarity(event, &row.event);
        if events_overlap(event, &row.event) {
            debug!(date = %date, existing = %row.id, score, "episodic duplicate suppressed");
            return Ok(IngestOutcome::Skipped);
        }
        debug!(date = %date, existing = %row.id, score, "episodic event kept distinct");
    }

    unit.insert(EpisodicMemory::from_item(item, date, source_id, now).into())
        .await?;
    Ok(IngestOutcome::Inserted)
}

pub async fn ingest_procedural(
    unit: &mut dyn MemoryUnit,
    item: &ProceduralItem,
    source_id: &str,
    now: DateTime<Utc>,
) -> Result<IngestOutcome, QuireError> {
    let pattern = item.pattern.trim();
    if pattern.is_empty() {
        return Ok(IngestOutcome::Skipped);
    }

    let existing = unit
        .procedural(QueryFilter::Pattern(pattern.to_string()))
        .await?;
    match existing.into_iter().next() {
        Some(mut row) => {
            row.frequency = row.frequency.saturating_add(1);
            row.source_ids.insert(source_id.to_string());
            row.updated_at = now;
            debug!(pattern, frequency = row.frequency, "procedural pattern seen again");
            unit.update(row.into()).await?;
            Ok(IngestOutcome::Updated)
        }
        None => {
            unit.insert(ProceduralMemory::from_item(item, source_id, now).into())
                .await?;
            Ok(IngestOutcome::Inserted)
        }
    }
}
