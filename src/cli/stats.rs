use anyhow::Result;

use crate::memory::MemoryEngine;

/// Display memory statistics in the terminal.
pub async fn stats(engine: &MemoryEngine) -> Result<()> {
    let response = engine.stats().await?;

    println!("Memory Statistics ({})", response.backend);
    println!("{}", "=".repeat(40));
    println!("  Total memories:      {}", response.total_memories);
    println!("  Average importance:  {:.2}", response.average_importance);
    println!();

    println!("By Type:");
    for (t, count) in &response.by_type {
        println!("  {t:<14} {count}");
    }
    println!();

    println!("By Source:");
    for (s, count) in &response.by_source_type {
        println!("  {s:<14} {count}");
    }

    if !response.by_project.is_empty() {
        println!();
        println!("By Project:");
        for (p, count) in &response.by_project {
            println!("  {p:<14} {count}");
        }
    }

    if let Some(oldest) = response.oldest_memory {
        println!();
        println!("Oldest memory:         {}", oldest.to_rfc3339());
    }
    if let Some(newest) = response.newest_memory {
        println!("Newest memory:         {}", newest.to_rfc3339());
    }
    Ok(())
}

pub async fn reflect(engine: &MemoryEngine) -> Result<()> {
    println!("{}", engine.reflect().await?);
    Ok(())
}

pub fn identity(engine: &MemoryEngine) -> Result<()> {
    println!("{}", engine.identity()?);
    Ok(())
}
