//! Recall queries and result ranking.
//!
//! Stores return hits by cosine similarity. Decay is applied here, after the
//! fetch, and only re-orders results when the caller asks for
//! [`Ranking::Weighted`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decay::effective_importance;
use super::store::{ScoredMemory, SearchFilter};
use super::types::Memory;

/// Upper bound on results per recall.
pub const MAX_RECALL_LIMIT: usize = 50;

/// How recall results are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// Database order: descending similarity.
    #[default]
    Similarity,
    /// `similarity * effective_importance`, descending.
    Weighted,
}

impl std::str::FromStr for Ranking {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "similarity" => Ok(Ranking::Similarity),
            "weighted" => Ok(Ranking::Weighted),
            other => Err(format!("unknown ranking: {other}")),
        }
    }
}

/// A recall request.
#[derive(Debug, Clone, Default)]
pub struct RecallQuery {
    pub query: String,
    pub limit: Option<usize>,
    pub filter: SearchFilter,
    pub ranking: Ranking,
}

impl RecallQuery {
    pub fn new(query: impl Into<String>) -> Self {
        RecallQuery {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// A single recall result.
#[derive(Debug, Clone, Serialize)]
pub struct RecallHit {
    #[serde(flatten)]
    pub memory: Memory,
    pub similarity: f64,
    pub effective_importance: f64,
}

/// Response from recall and project_recall.
#[derive(Debug, Serialize)]
pub struct RecallResponse {
    pub query: String,
    pub results: Vec<RecallHit>,
    pub ranking: Ranking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Resolve a requested limit: `default` when unset, then clamped to `1..=50`.
pub fn clamp_limit(requested: Option<usize>, default: usize) -> usize {
    requested
        .unwrap_or(default)
        .clamp(1, MAX_RECALL_LIMIT)
}

/// Attach effective importance to raw hits and apply `ranking`.
///
/// Hits arrive in similarity order. Weighted ranking uses a stable sort, so
/// equal scores keep that order.
pub fn rank(
    hits: Vec<ScoredMemory>,
    ranking: Ranking,
    now: DateTime<Utc>,
    half_life_days: f64,
) -> Vec<RecallHit> {
    let mut out: Vec<RecallHit> = hits
        .into_iter()
        .map(|h| RecallHit {
            effective_importance: effective_importance(&h.memory, now, half_life_days),
            similarity: h.similarity,
            memory: h.memory,
        })
        .collect();

    if ranking == Ranking::Weighted {
        out.sort_by(|a, b| {
            let sa = a.similarity * a.effective_importance;
            let sb = b.similarity * b.effective_importance;
            sb.total_cmp(&sa)
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::{MemoryType, SourceType};
    use chrono::Duration;
    use uuid::Uuid;

    fn scored(content: &str, t: MemoryType, importance: f64, age_days: i64, similarity: f64) -> ScoredMemory {
        let at = Utc::now() - Duration::days(age_days);
        ScoredMemory {
            memory: Memory {
                id: Uuid::now_v7(),
                content: content.into(),
                memory_type: t,
                importance,
                tags: vec![],
                source: "direct".into(),
                source_type: SourceType::UserStated,
                confidence: 1.0,
                related_to: vec![],
                project: None,
                created_at: at,
                updated_at: at,
            },
            similarity,
        }
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(None, 5), 5);
        assert_eq!(clamp_limit(Some(0), 5), 1);
        assert_eq!(clamp_limit(Some(500), 5), MAX_RECALL_LIMIT);
        assert_eq!(clamp_limit(Some(12), 5), 12);
    }

    #[test]
    fn similarity_ranking_keeps_order() {
        let hits = vec![
            scored("close but stale", MemoryType::Fact, 0.9, 90, 0.9),
            scored("further but fresh", MemoryType::Fact, 0.9, 0, 0.7),
        ];
        let ranked = rank(hits, Ranking::Similarity, Utc::now(), 30.0);
        assert_eq!(ranked[0].memory.content, "close but stale");
        assert!(ranked[0].effective_importance < 0.2);
    }

    #[test]
    fn weighted_ranking_prefers_fresh_memories() {
        let hits = vec![
            scored("close but stale", MemoryType::Fact, 0.9, 90, 0.9),
            scored("further but fresh", MemoryType::Fact, 0.9, 0, 0.7),
        ];
        let ranked = rank(hits, Ranking::Weighted, Utc::now(), 30.0);
        assert_eq!(ranked[0].memory.content, "further but fresh");
    }

    #[test]
    fn promises_do_not_decay_in_results() {
        let hits = vec![scored("A deal is a deal", MemoryType::Promise, 1.0, 365, 0.5)];
        let ranked = rank(hits, Ranking::Similarity, Utc::now(), 30.0);
        assert_eq!(ranked[0].effective_importance, 1.0);
    }

    #[test]
    fn ranking_parses() {
        assert_eq!("Weighted".parse::<Ranking>().unwrap(), Ranking::Weighted);
        assert!("random".parse::<Ranking>().is_err());
    }
}
