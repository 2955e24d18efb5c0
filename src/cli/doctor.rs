//! CLI `doctor` command: check configuration, storage and model files.

use anyhow::{Context, Result};

use crate::config::ContinuousConfig;
use crate::db;
use crate::embedding::local::model_files;

pub async fn doctor(config: &ContinuousConfig) -> Result<()> {
    println!("Continuous Health Report");
    println!("========================");
    println!();

    let (model, tokenizer) = model_files(&config.embedding);
    println!("Embedding model:   {}", config.embedding.model);
    for path in [&model, &tokenizer] {
        let state = if path.exists() { "ok" } else { "MISSING" };
        println!("  {:<16} {state}", path.display());
    }
    if !model.exists() || !tokenizer.exists() {
        println!("  Run `continuous model download` to fetch them.");
    }
    println!();

    println!(
        "Identity file:     {}",
        config.resolved_identity_path().display()
    );
    println!();

    if !config.uses_postgres() {
        let path = config.resolved_local_path();
        println!("Storage:           local ({})", path.display());
        if config.storage.backend.eq_ignore_ascii_case("postgres") {
            println!("  No database URL set; set CONTINUOUS_DATABASE_URL to use Postgres.");
        }
        return Ok(());
    }

    let pool = db::connect(&config.storage)
        .await
        .context("database check failed")?;
    let report = db::check_database_health(&pool)
        .await
        .context("failed to run health check")?;

    println!("Storage:           postgres");
    println!("Schema version:    {}", report.schema_version);
    println!(
        "pgvector:          {}",
        report.pgvector_version.as_deref().unwrap_or("(not installed)")
    );
    println!(
        "Vector index:      {}",
        if report.has_vector_index { "present" } else { "missing (sequential scan)" }
    );
    println!("Memories:          {}", report.memory_count);
    println!(
        "Stored model:      {}",
        report.embedding_model.as_deref().unwrap_or("(not set)")
    );
    if let Some(stored) = &report.embedding_model {
        if stored != &config.embedding.model {
            println!("  WARNING: configured model differs; stored vectors are not comparable.");
        }
    }
    Ok(())
}
