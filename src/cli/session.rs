//! CLI `start` and `end`: the session hooks.

use std::path::Path;

use anyhow::{Context, Result};

use crate::memory::MemoryEngine;

/// Print the session briefing to stdout.
pub async fn start(engine: &MemoryEngine, project: Option<&str>) -> Result<()> {
    println!("{}", engine.briefing(project).await?);
    Ok(())
}

/// Extract memories from a transcript file and optionally store a summary.
pub async fn end(
    engine: &MemoryEngine,
    conversation: Option<&Path>,
    summary: Option<&str>,
    project: Option<&str>,
) -> Result<()> {
    let transcript = match conversation {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript {}", path.display()))?,
        None => String::new(),
    };
    anyhow::ensure!(
        !transcript.trim().is_empty() || summary.is_some_and(|s| !s.trim().is_empty()),
        "nothing to do: pass --conversation or --summary"
    );

    let result = engine.end_session(&transcript, summary, project).await?;

    println!("Extracted {} memories", result.extracted.len());
    for m in &result.extracted {
        println!("  - [{}] {}", m.memory_type, m.preview(80));
    }
    if let Some(id) = result.summary_id {
        println!("Session summary stored: {id}");
    }
    println!("{} memories stored", result.total_memories);
    Ok(())
}
