//! CLI `graph` command: print the link neighbourhood of a memory.

use anyhow::Result;

use crate::memory::types::parse_id;
use crate::memory::MemoryEngine;

pub async fn graph(engine: &MemoryEngine, id: &str, depth: Option<usize>) -> Result<()> {
    let graph = engine.graph(parse_id(id)?, depth).await?;

    println!("Nodes ({}):", graph.nodes.len());
    for node in &graph.nodes {
        println!(
            "  {} [{}] {:.2}  {}",
            node.id, node.memory_type, node.importance, node.preview
        );
    }

    if !graph.edges.is_empty() {
        println!();
        println!("Edges ({}):", graph.edges.len());
        for edge in &graph.edges {
            let dangling = if graph.node(edge.to).is_none() {
                "  (missing)"
            } else {
                ""
            };
            println!("  {} -> {}{dangling}", edge.from, edge.to);
        }
    }
    Ok(())
}
