//! Aggregate counts for `memory_stats` and the plain-text `reflect` report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::{truncate_preview, Memory, MemoryType, SourceType};

/// Stored importance at or above which a memory counts as high-importance.
pub const HIGH_IMPORTANCE: f64 = 0.8;

/// Response from memory_stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_memories: u64,
    /// Every memory type, zero-filled.
    pub by_type: BTreeMap<String, u64>,
    pub by_source_type: BTreeMap<String, u64>,
    pub by_project: BTreeMap<String, u64>,
    pub average_importance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_memory: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_memory: Option<DateTime<Utc>>,
    pub backend: String,
}

pub fn memory_stats(memories: &[Memory], backend: &str) -> StatsResponse {
    let mut by_type: BTreeMap<String, u64> = MemoryType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), 0))
        .collect();
    let mut by_source_type: BTreeMap<String, u64> = SourceType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), 0))
        .collect();
    let mut by_project = BTreeMap::new();

    for m in memories {
        *by_type.entry(m.memory_type.as_str().to_string()).or_default() += 1;
        *by_source_type
            .entry(m.source_type.as_str().to_string())
            .or_default() += 1;
        if let Some(p) = &m.project {
            *by_project.entry(p.clone()).or_default() += 1;
        }
    }

    let average_importance = if memories.is_empty() {
        0.0
    } else {
        memories.iter().map(|m| m.importance).sum::<f64>() / memories.len() as f64
    };

    StatsResponse {
        total_memories: memories.len() as u64,
        by_type,
        by_source_type,
        by_project,
        average_importance,
        oldest_memory: memories.iter().map(|m| m.created_at).min(),
        newest_memory: memories.iter().map(|m| m.created_at).max(),
        backend: backend.to_string(),
    }
}

/// Plain-text overview of what is stored.
pub fn reflect(memories: &[Memory]) -> String {
    if memories.is_empty() {
        return "No memories yet. We're just getting started.".to_string();
    }

    let mut lines = vec![
        format!("I have {} memories stored.", memories.len()),
        String::new(),
        "By type:".to_string(),
    ];

    let mut counts: Vec<(MemoryType, usize)> = MemoryType::ALL
        .iter()
        .map(|t| (*t, memories.iter().filter(|m| m.memory_type == *t).count()))
        .filter(|(_, n)| *n > 0)
        .collect();
    // Stable sort keeps declaration order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    lines.extend(counts.iter().map(|(t, n)| format!("  - {t}: {n}")));

    let important: Vec<&Memory> = memories
        .iter()
        .filter(|m| m.importance >= HIGH_IMPORTANCE)
        .take(5)
        .collect();
    if !important.is_empty() {
        lines.push(String::new());
        lines.push("High-importance memories:".to_string());
        lines.extend(
            important
                .iter()
                .map(|m| format!("  - {}", truncate_preview(&m.content, 80))),
        );
    }

    let mut projects: BTreeMap<&str, usize> = BTreeMap::new();
    for p in memories.iter().filter_map(|m| m.project.as_deref()) {
        *projects.entry(p).or_default() += 1;
    }
    if !projects.is_empty() {
        let mut projects: Vec<_> = projects.into_iter().collect();
        projects.sort_by(|a, b| b.1.cmp(&a.1));
        lines.push(String::new());
        lines.push("Projects:".to_string());
        lines.extend(
            projects
                .iter()
                .take(5)
                .map(|(p, n)| format!("  - {p}: {n}")),
        );
    }

    lines.join("\n")
}
