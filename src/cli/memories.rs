//! CLI `remember`, `recall` and `forget` commands.

use anyhow::Result;

use crate::memory::search::{Ranking, RecallQuery};
use crate::memory::types::{parse_id, parse_tag_list, truncate_preview, MemoryType, NewMemory};
use crate::memory::MemoryEngine;

pub struct RememberArgs<'a> {
    pub content: &'a str,
    pub memory_type: MemoryType,
    pub importance: Option<f64>,
    pub tags: Option<&'a str>,
    pub project: Option<&'a str>,
}

pub async fn remember(engine: &MemoryEngine, args: RememberArgs<'_>) -> Result<()> {
    let mut memory = NewMemory::new(args.content, args.memory_type)
        .with_tags(args.tags.map(parse_tag_list).unwrap_or_default())
        .with_project(args.project.map(str::to_string));
    if let Some(importance) = args.importance {
        memory = memory.with_importance(importance);
    }

    let stored = engine.remember(memory).await?;
    println!("Remembered: {}", truncate_preview(&stored.content, 60));
    println!("  ID: {}", stored.id);
    Ok(())
}

pub struct RecallArgs<'a> {
    pub query: &'a str,
    pub limit: Option<usize>,
    pub memory_type: Option<MemoryType>,
    pub project: Option<&'a str>,
    pub weighted: bool,
}

pub async fn recall(engine: &MemoryEngine, args: RecallArgs<'_>) -> Result<()> {
    let mut query = RecallQuery::new(args.query);
    query.limit = args.limit;
    query.filter.memory_type = args.memory_type;
    query.filter.project = args.project.map(str::to_string);
    if args.weighted {
        query.ranking = Ranking::Weighted;
    }

    let response = engine.recall(query).await?;
    if response.results.is_empty() {
        println!("No memories found.");
        return Ok(());
    }

    println!("Memories for: {}\n", response.query);
    for (i, hit) in response.results.iter().enumerate() {
        let m = &hit.memory;
        println!(
            "  {}. [{}] {} (similarity {:.2}, importance {:.2} -> {:.2})",
            i + 1,
            m.memory_type,
            m.id,
            hit.similarity,
            m.importance,
            hit.effective_importance,
        );
        println!("     {}", truncate_preview(&m.content, 120));
        if let Some(project) = &m.project {
            println!("     project: {project}");
        }
        println!();
    }
    Ok(())
}

pub async fn forget(engine: &MemoryEngine, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let response = engine.forget(id).await?;
    if response.deleted {
        println!("Forgot {id}");
    } else {
        println!("No memory with ID {id}");
    }
    Ok(())
}
