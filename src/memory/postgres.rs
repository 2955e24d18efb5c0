//! Postgres + pgvector memory store.
//!
//! Ranking goes through the `match_memories` SQL function so the ivfflat
//! index does the nearest-neighbour work.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use uuid::Uuid;

use super::store::{MemoryStore, ScoredMemory, SearchFilter};
use super::types::{Memory, MemoryType, NewMemory, SourceType};
use crate::embedding::EMBEDDING_DIM;
use crate::error::{Error, Result};

const SELECT_COLUMNS: &str = "id, content, memory_type, importance, tags, source, source_type, \
     confidence, related_to, project, created_at, updated_at";

#[derive(FromRow)]
struct MemoryRow {
    id: Uuid,
    content: String,
    memory_type: String,
    importance: f64,
    tags: Vec<String>,
    source: String,
    source_type: String,
    confidence: f64,
    related_to: Vec<Uuid>,
    project: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct MatchRow {
    #[sqlx(flatten)]
    row: MemoryRow,
    similarity: f64,
}

impl TryFrom<MemoryRow> for Memory {
    type Error = Error;

    fn try_from(r: MemoryRow) -> Result<Self> {
        let memory_type: MemoryType = r
            .memory_type
            .parse()
            .map_err(|e: String| Error::Storage(e))?;
        let source_type: SourceType = r
            .source_type
            .parse()
            .map_err(|e: String| Error::Storage(e))?;
        Ok(Memory {
            id: r.id,
            content: r.content,
            memory_type,
            importance: r.importance,
            tags: r.tags,
            source: r.source,
            source_type,
            confidence: r.confidence,
            related_to: r.related_to,
            project: r.project,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Memory store backed by PostgreSQL + pgvector.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Delete every record. Returns the number removed.
    pub async fn clear(&self) -> Result<u64> {
        let done = sqlx::query("DELETE FROM memories")
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}

#[async_trait]
impl MemoryStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, memory: &NewMemory, embedding: &[f32]) -> Result<Memory> {
        if embedding.len() != EMBEDDING_DIM {
            return Err(Error::Embedding(format!(
                "expected {EMBEDDING_DIM} dimensions, got {}",
                embedding.len()
            )));
        }
        let sql = format!(
            "INSERT INTO memories \
             (id, content, memory_type, importance, tags, source, source_type, confidence, project, embedding) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {SELECT_COLUMNS}"
        );
        let row: MemoryRow = sqlx::query_as(&sql)
            .bind(Uuid::now_v7())
            .bind(&memory.content)
            .bind(memory.memory_type.as_str())
            .bind(memory.importance)
            .bind(&memory.tags)
            .bind(&memory.source)
            .bind(memory.source_type.as_str())
            .bind(memory.confidence)
            .bind(&memory.project)
            .bind(Vector::from(embedding.to_vec()))
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Memory>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM memories WHERE id = $1");
        let row: Option<MemoryRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Memory::try_from).transpose()
    }

    async fn embedding(&self, id: Uuid) -> Result<Option<Vec<f32>>> {
        let row: Option<(Vector,)> = sqlx::query_as("SELECT embedding FROM memories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(v,)| v.to_vec()))
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredMemory>> {
        let rows: Vec<MatchRow> =
            sqlx::query_as("SELECT * FROM match_memories($1, $2, $3, $4, $5, $6)")
                .bind(Vector::from(query.to_vec()))
                .bind(limit as i32)
                .bind(filter.memory_type.map(|t| t.as_str()))
                .bind(filter.min_importance)
                .bind(filter.project.as_deref())
                .bind(filter.min_confidence)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|r| {
                Ok(ScoredMemory {
                    memory: r.row.try_into()?,
                    similarity: r.similarity,
                })
            })
            .collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM memories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn set_importance(&self, id: Uuid, importance: f64) -> Result<Option<Memory>> {
        let sql = format!(
            "UPDATE memories SET importance = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        );
        let row: Option<MemoryRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(importance)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Memory::try_from).transpose()
    }

    async fn set_project(&self, id: Uuid, project: Option<&str>) -> Result<Option<Memory>> {
        let sql = format!(
            "UPDATE memories SET project = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        );
        let row: Option<MemoryRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(project)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Memory::try_from).transpose()
    }

    async fn add_link(&self, from: Uuid, to: Uuid) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE memories SET related_to = array_append(related_to, $2), updated_at = NOW() \
             WHERE id = $1 AND NOT ($2 = ANY(related_to))",
        )
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list(&self, limit: Option<usize>) -> Result<Vec<Memory>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories ORDER BY created_at DESC, id DESC LIMIT $1"
        );
        let rows: Vec<MemoryRow> = sqlx::query_as(&sql)
            .bind(limit.map(|l| l as i64))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Memory::try_from).collect()
    }

    async fn list_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<Memory>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories WHERE created_at < $1 \
             ORDER BY created_at, id"
        );
        let rows: Vec<MemoryRow> = sqlx::query_as(&sql)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Memory::try_from).collect()
    }

    async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
