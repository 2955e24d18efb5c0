//! Merging of near-identical old memories.
//!
//! Candidates are memories older than a cutoff, compared only within the same
//! type. Promises are never touched. For each qualifying pair the stronger
//! record is kept (higher importance, newer on a tie), it inherits the other's
//! links, and the weaker record is deleted when applying.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::store::{MemoryStore, SearchFilter};
use super::types::{truncate_preview, Memory, MemoryType};
use crate::error::Result;

/// Neighbours inspected per candidate.
const NEIGHBOURS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct ConsolidateOptions {
    pub threshold: f64,
    pub min_age_days: i64,
    pub apply: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationStatus {
    Proposed,
    Consolidated,
}

#[derive(Debug, Clone, Serialize)]
pub struct Consolidation {
    pub keep: Uuid,
    pub remove: Uuid,
    pub keep_preview: String,
    pub remove_preview: String,
    pub similarity: f64,
    pub status: ConsolidationStatus,
}

/// Pick which of two duplicates survives.
fn choose<'a>(a: &'a Memory, b: &'a Memory) -> (&'a Memory, &'a Memory) {
    if a.importance > b.importance {
        (a, b)
    } else if b.importance > a.importance {
        (b, a)
    } else if a.created_at > b.created_at {
        (a, b)
    } else {
        (b, a)
    }
}

pub async fn consolidate(
    store: &dyn MemoryStore,
    options: ConsolidateOptions,
) -> Result<Vec<Consolidation>> {
    let cutoff = Utc::now() - Duration::days(options.min_age_days.max(0));
    let candidates: HashMap<Uuid, Memory> = store
        .list_older_than(cutoff)
        .await?
        .into_iter()
        .filter(|m| m.memory_type != MemoryType::Promise)
        .map(|m| (m.id, m))
        .collect();

    // Stable, oldest-first iteration over the candidate set.
    let mut order: Vec<&Memory> = candidates.values().collect();
    order.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut removed: HashSet<Uuid> = HashSet::new();
    let mut actions = Vec::new();

    for first in order {
        if removed.contains(&first.id) {
            continue;
        }
        let Some(embedding) = store.embedding(first.id).await? else {
            continue;
        };
        let filter = SearchFilter {
            memory_type: Some(first.memory_type),
            ..Default::default()
        };
        let hits = store.search(&embedding, NEIGHBOURS, &filter).await?;

        let partner = hits.into_iter().find(|h| {
            h.memory.id != first.id
                && h.similarity >= options.threshold
                && !removed.contains(&h.memory.id)
                && candidates.contains_key(&h.memory.id)
        });
        let Some(hit) = partner else { continue };

        let second = &candidates[&hit.memory.id];
        let (keep, remove) = choose(first, second);
        let status = if options.apply {
            for link in remove.related_to.iter().filter(|l| **l != keep.id) {
                store.add_link(keep.id, *link).await?;
            }
            store.delete(remove.id).await?;
            tracing::info!(keep = %keep.id, remove = %remove.id, "consolidated duplicate memory");
            ConsolidationStatus::Consolidated
        } else {
            ConsolidationStatus::Proposed
        };

        removed.insert(remove.id);
        actions.push(Consolidation {
            keep: keep.id,
            remove: remove.id,
            keep_preview: truncate_preview(&keep.content, 50),
            remove_preview: truncate_preview(&remove.content, 50),
            similarity: hit.similarity,
            status,
        });
    }

    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::SourceType;

    fn memory(importance: f64, age_days: i64) -> Memory {
        let at = Utc::now() - Duration::days(age_days);
        Memory {
            id: Uuid::now_v7(),
            content: "Deploys run from main".into(),
            memory_type: MemoryType::Fact,
            importance,
            tags: vec![],
            source: "direct".into(),
            source_type: SourceType::UserStated,
            confidence: 1.0,
            related_to: vec![],
            project: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn higher_importance_is_kept() {
        let a = memory(0.4, 10);
        let b = memory(0.7, 20);
        assert_eq!(choose(&a, &b).0.id, b.id);
        assert_eq!(choose(&b, &a).0.id, b.id);
    }

    #[test]
    fn tie_keeps_newer() {
        let old = memory(0.5, 30);
        let new = memory(0.5, 8);
        assert_eq!(choose(&old, &new).0.id, new.id);
        assert_eq!(choose(&new, &old).0.id, new.id);
    }
}
