//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`]. Each step runs in
//! its own transaction.

use sqlx::postgres::PgPool;
use sqlx::{Postgres, Transaction};

use super::schema;
use crate::error::Result;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Get the current schema version. A fresh database reports 0.
pub async fn get_schema_version(pool: &PgPool) -> Result<u32> {
    sqlx::query(schema::SCHEMA_META_SQL).execute(pool).await?;
    let row: Option<(String,)> =
        sqlx::query_as("SELECT value FROM schema_meta WHERE key = 'schema_version'")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v.parse().ok()).unwrap_or(0))
}

async fn set_schema_version(tx: &mut Transaction<'_, Postgres>, version: u32) -> Result<()> {
    sqlx::query(
        "INSERT INTO schema_meta (key, value) VALUES ('schema_version', $1) \
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
    )
    .bind(version.to_string())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Get the stored embedding model identifier, if any.
pub async fn get_embedding_model(pool: &PgPool) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT value FROM schema_meta WHERE key = 'embedding_model'")
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(v,)| v))
}

/// Record the embedding model the stored vectors were produced with.
pub async fn set_embedding_model(pool: &PgPool, model: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO schema_meta (key, value) VALUES ('embedding_model', $1) \
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
    )
    .bind(model)
    .execute(pool)
    .await?;
    Ok(())
}

/// Run any pending migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let mut version = get_schema_version(pool).await?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        let statements = match next {
            1 => schema::V1_STATEMENTS,
            2 => schema::V2_STATEMENTS,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        };

        let mut tx = pool.begin().await?;
        for sql in statements.iter().copied() {
            sqlx::query(sql).execute(&mut *tx).await?;
        }
        set_schema_version(&mut tx, next).await?;
        tx.commit().await?;

        version = next;
    }

    if let Err(e) = sqlx::query(schema::VECTOR_INDEX_SQL).execute(pool).await {
        tracing::warn!(error = %e, "could not create ivfflat index; similarity search will scan");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_version_has_statements() {
        for v in 1..=CURRENT_SCHEMA_VERSION {
            let statements = match v {
                1 => schema::V1_STATEMENTS,
                2 => schema::V2_STATEMENTS,
                _ => &[][..],
            };
            assert!(!statements.is_empty(), "migration {v} is empty");
        }
    }

    #[test]
    fn search_function_takes_six_arguments() {
        let create = schema::V2_STATEMENTS
            .iter()
            .find(|s| s.contains("CREATE OR REPLACE FUNCTION match_memories"))
            .expect("v2 defines match_memories");
        for arg in [
            "query_embedding",
            "match_count",
            "filter_type",
            "min_importance",
            "filter_project",
            "min_confidence",
        ] {
            assert!(create.contains(arg), "missing argument {arg}");
        }
        assert!(create.contains("ORDER BY m.embedding <=> query_embedding"));
    }
}
