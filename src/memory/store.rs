//! Storage backend seam.
//!
//! [`MemoryStore`] is what the engine talks to. Two implementations exist:
//! [`PgStore`](super::postgres::PgStore) over Postgres + pgvector and
//! [`LocalStore`](super::local::LocalStore), an in-process store persisted to
//! a JSON file. Both rank by cosine similarity and apply the same filters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{Memory, MemoryType, NewMemory};
use crate::error::Result;

/// Filters pushed down into the similarity query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub memory_type: Option<MemoryType>,
    pub min_importance: f64,
    pub min_confidence: f64,
    /// Exact project match when set.
    pub project: Option<String>,
}

impl SearchFilter {
    pub fn matches(&self, memory: &Memory) -> bool {
        if let Some(t) = self.memory_type {
            if memory.memory_type != t {
                return false;
            }
        }
        if memory.importance < self.min_importance || memory.confidence < self.min_confidence {
            return false;
        }
        match &self.project {
            Some(p) => memory.project.as_deref() == Some(p.as_str()),
            None => true,
        }
    }
}

/// A memory paired with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMemory {
    pub memory: Memory,
    pub similarity: f64,
}

/// Async storage backend for memory records.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Short backend name for logs and stats (`"postgres"`, `"local"`).
    fn backend(&self) -> &'static str;

    /// Insert a validated memory with its embedding. Returns the stored record.
    async fn insert(&self, memory: &NewMemory, embedding: &[f32]) -> Result<Memory>;

    async fn get(&self, id: Uuid) -> Result<Option<Memory>>;

    /// The stored embedding of `id`, if the record exists.
    async fn embedding(&self, id: Uuid) -> Result<Option<Vec<f32>>>;

    /// Nearest neighbours of `query`, most similar first, at most `limit` rows.
    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredMemory>>;

    /// Delete a record. Returns `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Overwrite importance. Returns the updated record, or `None` if missing.
    async fn set_importance(&self, id: Uuid, importance: f64) -> Result<Option<Memory>>;

    /// Overwrite (or clear) the project tag. Returns the updated record, or `None` if missing.
    async fn set_project(&self, id: Uuid, project: Option<&str>) -> Result<Option<Memory>>;

    /// Append `to` to the `related_to` set of `from` if absent.
    /// Returns `true` when the set changed. A missing `from` is not an error.
    async fn add_link(&self, from: Uuid, to: Uuid) -> Result<bool>;

    /// All records, newest first, optionally capped.
    async fn list(&self, limit: Option<usize>) -> Result<Vec<Memory>>;

    /// Records created before `cutoff`, oldest first.
    async fn list_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<Memory>>;

    async fn count(&self) -> Result<u64>;
}

/// Cosine similarity of two vectors. Zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
