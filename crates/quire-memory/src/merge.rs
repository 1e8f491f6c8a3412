// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merge review: finding probable duplicates and consolidating them.
//!
//! The finder runs on demand over the whole persisted set and never writes.
//! Clustering is greedy and seed-based: each unvisited row starts a cluster
//! and pulls in later unvisited rows similar enough to that seed. Rows are
//! not compared with each other, so groups are not transitive closures.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use quire_config::MemoryConfig;
use quire_core::QuireError;
use tracing::{debug, info};

use crate::repository::{MemoryQuery, MemoryRepository, MemoryUnit, QueryFilter};
use crate::similarity::similarity;
use crate::types::{
    EpisodicMemory, MemoryKind, MemoryRecord, MergeCandidateGroup, ProceduralMemory,
    SemanticMemory,
};

pub const DEFAULT_EPISODIC_THRESHOLD: f64 = 0.45;
pub const DEFAULT_PROCEDURAL_THRESHOLD: f64 = 0.55;

/// Greedy seed clustering. Returns index clusters of size two or more,
/// in first-appearance order.
pub fn seed_clusters<T>(items: &[T], text: impl Fn(&T) -> &str, threshold: f64) -> Vec<Vec<usize>> {
    let mut visited = vec![false; items.len()];
    let mut clusters = Vec::new();

    for seed in 0..items.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut cluster = vec![seed];
        let seed_text = text(&items[seed]);

        for other in seed + 1..items.len() {
            if !visited[other] && similarity(seed_text, text(&items[other])) > threshold {
                visited[other] = true;
                cluster.push(other);
            }
        }

        if cluster.len() > 1 {
            clusters.push(cluster);
        }
    }
    clusters
}

/// Groups rows by a string key, preserving the order keys first appear in.
fn partition<'a, T>(items: &'a [T], key: impl Fn(&T) -> &str) -> Vec<(String, Vec<&'a T>)> {
    let mut groups: Vec<(String, Vec<&'a T>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in items {
        let k = key(item);
        match index.get(k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(k.to_string(), groups.len());
                groups.push((k.to_string(), vec![item]));
            }
        }
    }
    groups
}

/// First element with the strictly greatest score.
fn first_max<'a, T>(items: impl IntoIterator<Item = &'a T>, score: impl Fn(&T) -> f64) -> Option<&'a T>
where
    T: 'a,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let s = score(item);
        if best.is_none_or(|(_, b)| s > b) {
            best = Some((item, s));
        }
    }
    best.map(|(item, _)| item)
}

pub fn semantic_groups(rows: &[SemanticMemory]) -> Vec<MergeCandidateGroup> {
    partition(rows, |m| m.key.as_str())
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(key, members)| MergeCandidateGroup {
            kind: MemoryKind::Semantic,
            suggestion: first_max(members.iter().copied(), |m| m.confidence).map(|m| m.value.clone()),
            ids: members.iter().map(|m| m.id.clone()).collect(),
            group_key: key,
        })
        .collect()
}

pub fn episodic_groups(rows: &[EpisodicMemory], threshold: f64) -> Vec<MergeCandidateGroup> {
    let mut groups = Vec::new();
    for (date, members) in partition(rows, |m| m.date.as_str()) {
        for cluster in seed_clusters(&members, |m| m.event.as_str(), threshold) {
            let picked: Vec<&EpisodicMemory> = cluster.iter().map(|&i| members[i]).collect();
            groups.push(MergeCandidateGroup {
                kind: MemoryKind::Episodic,
                group_key: date.clone(),
                ids: picked.iter().map(|m| m.id.clone()).collect(),
                suggestion: first_max(picked.iter().copied(), |m| m.event.chars().count() as f64)
                    .map(|m| m.event.clone()),
            });
        }
    }
    groups
}

pub fn procedural_groups(rows: &[ProceduralMemory], threshold: f64) -> Vec<MergeCandidateGroup> {
    seed_clusters(rows, |m| m.pattern.as_str(), threshold)
        .into_iter()
        .map(|cluster| {
            let picked: Vec<&ProceduralMemory> = cluster.iter().map(|&i| &rows[i]).collect();
            MergeCandidateGroup {
                kind: MemoryKind::Procedural,
                group_key: picked[0].pattern.clone(),
                ids: picked.iter().map(|m| m.id.clone()).collect(),
                suggestion: first_max(picked.iter().copied(), |m| f64::from(m.frequency))
                    .map(|m| m.pattern.clone()),
            }
        })
        .collect()
}

/// Surfaces clusters of probable duplicates for manual review.
#[derive(Debug, Clone, Copy)]
pub struct MergeCandidateFinder {
    pub episodic_threshold: f64,
    pub procedural_threshold: f64,
}

impl Default for MergeCandidateFinder {
    fn default() -> Self {
        Self {
            episodic_threshold: DEFAULT_EPISODIC_THRESHOLD,
            procedural_threshold: DEFAULT_PROCEDURAL_THRESHOLD,
        }
    }
}

impl MergeCandidateFinder {
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            episodic_threshold: config.episodic_similarity_threshold,
            procedural_threshold: config.procedural_similarity_threshold,
        }
    }

    /// Semantic groups first, then episodic, then procedural.
    pub async fn find(
        &self,
        repository: &dyn MemoryRepository,
    ) -> Result<Vec<MergeCandidateGroup>, QuireError> {
        let unit = repository.begin().await?;
        let semantic = unit.semantic(QueryFilter::All).await?;
        let episodic = unit.episodic(QueryFilter::All).await?;
        let procedural = unit.procedural(QueryFilter::All).await?;

        let mut groups = semantic_groups(&semantic);
        groups.extend(episodic_groups(&episodic, self.episodic_threshold));
        groups.extend(procedural_groups(&procedural, self.procedural_threshold));

        debug!(groups = groups.len(), "merge candidates found");
        Ok(groups)
    }
}

/// Consolidates a chosen group into one keeper row.
pub struct MergeExecutor {
    repository: Arc<dyn MemoryRepository>,
}

impl MergeExecutor {
    pub fn new(repository: Arc<dyn MemoryRepository>) -> Self {
        Self { repository }
    }

    /// Merges `discard_ids` into `keeper_id` within one kind and commits.
    ///
    /// Semantic and procedural keepers absorb the discarded rows' source
    /// ids (procedural also their frequencies). Episodic discards are only
    /// deleted. The keeper's own id in `discard_ids` is ignored. Returns
    /// the keeper as persisted.
    pub async fn merge(
        &self,
        kind: MemoryKind,
        keeper_id: &str,
        discard_ids: &[String],
    ) -> Result<MemoryRecord, QuireError> {
        let mut unit = self.repository.begin().await?;
        let keeper = fetch_one(unit.as_ref(), kind, keeper_id).await?;

        let mut seen = HashSet::new();
        let mut discards = Vec::new();
        for id in discard_ids {
            if id == keeper_id || !seen.insert(id.as_str()) {
                continue;
            }
            discards.push(fetch_one(unit.as_ref(), kind, id).await?);
        }

        let now = Utc::now();
        let keeper = match keeper {
            MemoryRecord::Semantic(mut k) => {
                for d in &discards {
                    if let MemoryRecord::Semantic(d) = d {
                        k.source_ids.extend(d.source_ids.iter().cloned());
                    }
                }
                k.updated_at = now;
                let record = MemoryRecord::from(k);
                unit.update(record.clone()).await?;
                record
            }
            MemoryRecord::Procedural(mut k) => {
                for d in &discards {
                    if let MemoryRecord::Procedural(d) = d {
                        k.source_ids.extend(d.source_ids.iter().cloned());
                        k.frequency = k.frequency.saturating_add(d.frequency);
                    }
                }
                k.updated_at = now;
                let record = MemoryRecord::from(k);
                unit.update(record.clone()).await?;
                record
            }
            episodic @ MemoryRecord::Episodic(_) => episodic,
        };

        for d in &discards {
            unit.delete(d).await?;
        }
        unit.save().await?;

        info!(kind = %kind, keeper = keeper_id, discarded = discards.len(), "memories merged");
        Ok(keeper)
    }

    /// Merges every other member of `group` into `keeper_id`.
    pub async fn merge_group(
        &self,
        group: &MergeCandidateGroup,
        keeper_id: &str,
    ) -> Result<MemoryRecord, QuireError> {
        if !group.ids.iter().any(|id| id == keeper_id) {
            return Err(QuireError::MemoryNotFound {
                id: keeper_id.to_string(),
            });
        }
        self.merge(group.kind, keeper_id, &group.ids).await
    }
}

async fn fetch_one(unit: &dyn MemoryUnit, kind: MemoryKind, id: &str) -> Result<MemoryRecord, QuireError> {
    unit.fetch_all(&MemoryQuery::by_id(kind, id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| QuireError::MemoryNotFound { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn fact(id: &str, key: &str, value: &str, confidence: f64) -> SemanticMemory {
        let now = Utc::now();
        SemanticMemory {
            id: id.into(),
            key: key.into(),
            value: value.into(),
            confidence,
            source_ids: BTreeSet::from([format!("src-{id}")]),
            created_at: now,
            updated_at: now,
        }
    }

    fn event(id: &str, text: &str, date: &str) -> EpisodicMemory {
        EpisodicMemory {
            id: id.into(),
            event: text.into(),
            emotion: None,
            date: date.into(),
            context: None,
            source_id: format!("src-{id}"),
            created_at: Utc::now(),
        }
    }

    fn habit(id: &str, pattern: &str, frequency: u32) -> ProceduralMemory {
        let now = Utc::now();
        ProceduralMemory {
            id: id.into(),
            pattern: pattern.into(),
            preference: "p".into(),
            trigger: None,
            frequency,
            source_ids: BTreeSet::from([format!("src-{id}")]),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn seed_clustering_is_not_transitive() {
        // b is close to a and c, but c is far from a
        let items = ["aaaa", "aaab", "aabb"];
        let clusters = seed_clusters(&items, |s| *s, 0.7);
        assert_eq!(clusters, vec![vec![0, 1]]);
    }

    #[test]
    fn singletons_are_dropped() {
        let items = ["walk", "xyzzy"];
        assert!(seed_clusters(&items, |s| *s, 0.5).is_empty());
    }

    #[test]
    fn semantic_groups_by_key_with_highest_confidence_value() {
        let rows = vec![
            fact("1", "pet.name", "Max", 0.6),
            fact("2", "home.city", "Lyon", 0.9),
            fact("3", "pet.name", "Maxi", 0.8),
            fact("4", "pet.name", "M", 0.8),
        ];
        let groups = semantic_groups(&rows);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_key, "pet.name");
        assert_eq!(groups[0].ids, vec!["1", "3", "4"]);
        assert_eq!(groups[0].suggestion.as_deref(), Some("Maxi"));
    }

    #[test]
    fn episodic_groups_stay_within_a_date() {
        let rows = vec![
            event("1", "Went to the park", "2026-03-01"),
            event("2", "Went to the park", "2026-03-02"),
            event("3", "I went to the park with Ana", "2026-03-01"),
            event("4", "Paid the electricity bill", "2026-03-01"),
        ];
        let groups = episodic_groups(&rows, DEFAULT_EPISODIC_THRESHOLD);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_key, "2026-03-01");
        assert_eq!(groups[0].ids, vec!["1", "3"]);
        assert_eq!(groups[0].suggestion.as_deref(), Some("I went to the park with Ana"));
    }

    #[test]
    fn procedural_groups_span_dates_and_suggest_most_frequent() {
        let rows = vec![
            habit("1", "morning coffee", 1),
            habit("2", "evening run", 2),
            habit("3", "morning coffees", 4),
        ];
        let groups = procedural_groups(&rows, DEFAULT_PROCEDURAL_THRESHOLD);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_key, "morning coffee");
        assert_eq!(groups[0].ids, vec!["1", "3"]);
        assert_eq!(groups[0].suggestion.as_deref(), Some("morning coffees"));
    }
}
