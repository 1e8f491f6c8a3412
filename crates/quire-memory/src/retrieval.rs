// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory retrieval as a prompt context source.
//!
//! Scores every persisted memory by word overlap with the fragment text and
//! injects the best ones as a "Relevant Memories" block.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use quire_config::MemoryConfig;
use quire_context::ContextSource;
use quire_core::{Fragment, FragmentKind, QuireError};
use tracing::debug;

use crate::repository::{MemoryRepository, QueryFilter};

const MIN_WORD_CHARS: usize = 3;

/// Lowercased words of at least three chars.
fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
        .map(str::to_lowercase)
        .collect()
}

fn overlap(query: &HashSet<String>, text: &str) -> usize {
    words(text).intersection(query).count()
}

struct Scored {
    score: f64,
    line: String,
}

/// [`ContextSource`] backed by the memory repository.
pub struct MemoryContextSource {
    repository: Arc<dyn MemoryRepository>,
    limit: usize,
}

impl MemoryContextSource {
    pub fn new(repository: Arc<dyn MemoryRepository>, limit: usize) -> Self {
        Self { repository, limit }
    }

    pub fn from_config(repository: Arc<dyn MemoryRepository>, config: &MemoryConfig) -> Self {
        Self::new(repository, config.retrieval_limit)
    }

    async fn score(&self, query: &HashSet<String>) -> Result<Vec<Scored>, QuireError> {
        let unit = self.repository.begin().await?;
        let mut scored = Vec::new();

        for m in unit.semantic(QueryFilter::All).await? {
            let hits = overlap(query, &format!("{} {}", m.key, m.value));
            if hits > 0 {
                scored.push(Scored {
                    score: hits as f64 * m.confidence,
                    line: format!("- Fact: {} = {}", m.key, m.value),
                });
            }
        }

        for m in unit.episodic(QueryFilter::All).await? {
            let text = format!("{} {}", m.event, m.context.as_deref().unwrap_or_default());
            let hits = overlap(query, &text);
            if hits > 0 {
                let emotion = m.emotion.map(|e| format!(" [{e}]")).unwrap_or_default();
                scored.push(Scored {
                    score: hits as f64,
                    line: format!("- Event ({}): {}{emotion}", m.date, m.event),
                });
            }
        }

        for m in unit.procedural(QueryFilter::All).await? {
            let text = format!(
                "{} {} {}",
                m.pattern,
                m.preference,
                m.trigger.as_deref().unwrap_or_default()
            );
            let hits = overlap(query, &text);
            if hits > 0 {
                scored.push(Scored {
                    score: hits as f64 * (1.0 + f64::from(m.frequency.max(1)).ln()),
                    line: format!("- Habit: {} ({}), seen {} times", m.pattern, m.preference, m.frequency),
                });
            }
        }

        Ok(scored)
    }
}

#[async_trait]
impl ContextSource for MemoryContextSource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn context(&self, fragments: &[Fragment]) -> Result<Option<String>, QuireError> {
        if self.limit == 0 {
            return Ok(None);
        }

        let query: HashSet<String> = fragments
            .iter()
            .filter(|f| f.kind == FragmentKind::Text)
            .flat_map(|f| words(&f.content))
            .collect();
        if query.is_empty() {
            return Ok(None);
        }

        let mut scored = self.score(&query).await?;
        if scored.is_empty() {
            return Ok(None);
        }
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.limit);
        debug!(memories = scored.len(), "relevant memories retrieved");

        let mut block = String::from("## Relevant Memories\n");
        for s in &scored {
            block.push_str(&s.line);
            block.push('\n');
        }
        Ok(Some(block))
    }
}

#[cfg(test)]
mod tests {
    use quire_core::{EpisodicItem, ProceduralItem, SemanticItem};

    use super::*;
    use crate::extractor::MemoryExtractor;
    use crate::store::InMemoryRepository;

    async fn seeded() -> Arc<InMemoryRepository> {
        let repo = Arc::new(InMemoryRepository::new());
        let extractor = MemoryExtractor::new(
            repo.clone(),
            quire_context::PromptBuilder::new(Default::default()),
            256,
        );
        let result = quire_core::MemoryExtractionResult {
            semantic: vec![
                SemanticItem {
                    key: "pet.name".into(),
                    value: "Max the dog".into(),
                    confidence: 0.9,
                },
                SemanticItem {
                    key: "dog.breed".into(),
                    value: "beagle".into(),
                    confidence: 0.2,
                },
            ],
            episodic: vec![EpisodicItem {
                event: "Took the dog to the vet".into(),
                date: "2026-02-10".into(),
                emotion: Some("worried".into()),
                context: None,
            }],
            procedural: vec![ProceduralItem {
                pattern: "tea at night".into(),
                preference: "chamomile".into(),
                trigger: None,
            }],
        };
        extractor.ingest(&result, "seed", "2026-02-10").await.unwrap();
        repo
    }

    #[tokio::test]
    async fn ranks_overlapping_memories() {
        let repo = seeded().await;
        let source = MemoryContextSource::new(repo, 10);
        let fragments = vec![Fragment::text("1", "Walked the dog, Max was happy", 0)];

        let block = source.context(&fragments).await.unwrap().unwrap();
        assert!(block.starts_with("## Relevant Memories\n"));
        let fact = block.find("Fact: pet.name = Max the dog").unwrap();
        let event = block.find("Event (2026-02-10): Took the dog to the vet [worried]").unwrap();
        let breed = block.find("Fact: dog.breed").unwrap();
        assert!(fact < event);
        assert!(event < breed);
        assert!(!block.contains("chamomile"));
    }

    #[tokio::test]
    async fn limit_caps_the_block() {
        let repo = seeded().await;
        let source = MemoryContextSource::new(repo, 1);
        let fragments = vec![Fragment::text("1", "the dog Max", 0)];
        let block = source.context(&fragments).await.unwrap().unwrap();
        assert_eq!(block.lines().count(), 2);
    }

    #[tokio::test]
    async fn nothing_relevant_is_none() {
        let repo = seeded().await;
        let source = MemoryContextSource::new(repo, 10);
        let fragments = vec![Fragment::text("1", "quarterly taxes", 0)];
        assert!(source.context(&fragments).await.unwrap().is_none());
    }
}
