//! Similarity-driven linking between memories and traversal of the
//! resulting `related_to` graph.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;
use uuid::Uuid;

use super::store::{MemoryStore, SearchFilter};
use super::types::{truncate_preview, MemoryType};
use crate::error::{Error, Result};

pub const DEFAULT_GRAPH_DEPTH: usize = 2;
pub const MAX_GRAPH_DEPTH: usize = 5;
const PREVIEW_CHARS: usize = 100;

/// Link `id` to its closest neighbours.
///
/// Neighbours need similarity of at least `threshold`; at most `limit` are
/// taken. Both directions are written, each only if absent, so repeating the
/// call changes nothing. Returns the IDs that are now linked from `id`.
pub async fn link_memory(
    store: &dyn MemoryStore,
    id: Uuid,
    threshold: f64,
    limit: usize,
) -> Result<Vec<Uuid>> {
    let embedding = store
        .embedding(id)
        .await?
        .ok_or_else(|| Error::invalid(format!("memory not found: {id}")))?;

    // One extra slot because the memory finds itself first.
    let hits = store
        .search(&embedding, limit + 1, &SearchFilter::default())
        .await?;

    let mut linked = Vec::new();
    for hit in hits
        .into_iter()
        .filter(|h| h.memory.id != id && h.similarity >= threshold)
        .take(limit)
    {
        let other = hit.memory.id;
        store.add_link(id, other).await?;
        store.add_link(other, id).await?;
        tracing::debug!(from = %id, to = %other, similarity = hit.similarity, "linked memories");
        linked.push(other);
    }
    Ok(linked)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GraphNode {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    pub importance: f64,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    pub from: Uuid,
    pub to: Uuid,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct MemoryGraph {
    pub root: Option<Uuid>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl MemoryGraph {
    pub fn node(&self, id: Uuid) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Breadth-first walk over `related_to` from `root`, at most `depth` hops.
///
/// Read-only. A reference to a deleted memory still yields an edge, just no node.
pub async fn memory_graph(store: &dyn MemoryStore, root: Uuid, depth: usize) -> Result<MemoryGraph> {
    let depth = depth.min(MAX_GRAPH_DEPTH);
    let mut graph = MemoryGraph {
        root: Some(root),
        ..Default::default()
    };
    let mut seen_edges = HashSet::new();
    let mut visited = HashSet::from([root]);
    let mut queue = VecDeque::from([(root, 0usize)]);

    while let Some((id, hops)) = queue.pop_front() {
        let Some(memory) = store.get(id).await? else {
            continue;
        };
        graph.nodes.push(GraphNode {
            id,
            memory_type: memory.memory_type,
            importance: memory.importance,
            preview: truncate_preview(&memory.content, PREVIEW_CHARS),
        });

        if hops == depth {
            continue;
        }
        for next in memory.related_to {
            if seen_edges.insert(GraphEdge { from: id, to: next }) {
                graph.edges.push(GraphEdge { from: id, to: next });
            }
            if visited.insert(next) {
                queue.push_back((next, hops + 1));
            }
        }
    }

    if graph.nodes.is_empty() {
        return Err(Error::invalid(format!("memory not found: {root}")));
    }
    Ok(graph)
}
