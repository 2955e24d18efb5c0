//! Postgres connection pool, schema setup, and backend selection.

pub mod migrations;
pub mod schema;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::{ContinuousConfig, StorageConfig};
use crate::memory::local::LocalStore;
use crate::memory::postgres::PgStore;
use crate::memory::store::MemoryStore;

/// Connect to Postgres, verify pgvector, and run pending migrations.
pub async fn connect(config: &StorageConfig) -> Result<PgPool> {
    tracing::info!("initializing PostgreSQL connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("database did not answer")?;

    migrations::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let has_vector: Option<(String,)> =
        sqlx::query_as("SELECT extname::text FROM pg_extension WHERE extname = 'vector'")
            .fetch_optional(&pool)
            .await?;
    anyhow::ensure!(
        has_vector.is_some(),
        "pgvector extension is not installed. Run: CREATE EXTENSION vector;"
    );

    tracing::info!("database ready");
    Ok(pool)
}

/// Open the configured backend.
///
/// Postgres when selected and a URL is set; otherwise the local JSON store.
/// A configured but unreachable database is an error, not a silent fallback.
pub async fn open_store(config: &ContinuousConfig) -> Result<Arc<dyn MemoryStore>> {
    if config.uses_postgres() {
        let pool = connect(&config.storage).await?;

        match migrations::get_embedding_model(&pool).await? {
            Some(stored) if stored != config.embedding.model => {
                tracing::warn!(
                    stored = %stored,
                    configured = %config.embedding.model,
                    "embedding model changed; stored vectors were produced by a different model"
                );
            }
            Some(_) => {}
            None => migrations::set_embedding_model(&pool, &config.embedding.model).await?,
        }

        return Ok(Arc::new(PgStore::new(pool)));
    }

    if config.storage.backend.eq_ignore_ascii_case("postgres") {
        tracing::warn!("no database URL configured, falling back to local store");
    }
    let path = config.resolved_local_path();
    let store = LocalStore::open(&path)
        .with_context(|| format!("failed to open local store at {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Result of a database health check.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub pgvector_version: Option<String>,
    pub embedding_model: Option<String>,
    pub memory_count: i64,
    pub has_vector_index: bool,
}

/// Run diagnostics against a connected pool.
pub async fn check_database_health(pool: &PgPool) -> Result<HealthReport> {
    let schema_version = migrations::get_schema_version(pool).await?;
    let pgvector_version: Option<(String,)> =
        sqlx::query_as("SELECT extversion::text FROM pg_extension WHERE extname = 'vector'")
            .fetch_optional(pool)
            .await?;
    let embedding_model = migrations::get_embedding_model(pool).await?;
    let (memory_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memories")
        .fetch_one(pool)
        .await?;
    let (has_vector_index,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM pg_indexes WHERE indexname = 'idx_memories_embedding')",
    )
    .fetch_one(pool)
    .await?;

    Ok(HealthReport {
        schema_version,
        pgvector_version: pgvector_version.map(|(v,)| v),
        embedding_model,
        memory_count,
        has_vector_index,
    })
}
