//! Pattern-based memory extraction from conversation transcripts.
//!
//! Runs a fixed set of case-insensitive regexes per memory family over the
//! text, cleans each capture, and drops near-duplicates by word-set Jaccard
//! similarity.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::types::{MemoryType, NewMemory, SourceType};

/// `source` recorded on every auto-extracted memory.
pub const EXTRACTION_SOURCE: &str = "conversation_extraction";

const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;
const DUPLICATE_JACCARD: f64 = 0.8;

struct Family {
    memory_type: MemoryType,
    importance: f64,
    confidence: f64,
    /// Captures must be longer than this many characters.
    min_len: usize,
    prefix: &'static str,
    patterns: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(&format!("(?im){p}")) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!(pattern = %p, error = %e, "bad extraction pattern");
                None
            }
        })
        .collect()
}

static FAMILIES: LazyLock<Vec<Family>> = LazyLock::new(|| {
    vec![
        Family {
            memory_type: MemoryType::Decision,
            importance: 0.7,
            confidence: 0.7,
            min_len: 10,
            prefix: "Decision: ",
            patterns: compile(&[
                r"(?:we |I )?(?:decided|chose|went with|picked|selected|will use|going with)\s+(.+?)(?:\.|$)",
                r"(?:the |our )?decision(?:is| was)?\s*(?:to |:)\s*(.+?)(?:\.|$)",
                r"let's (?:go with|use|do)\s+(.+?)(?:\.|$)",
            ]),
        },
        Family {
            memory_type: MemoryType::Preference,
            importance: 0.6,
            confidence: 0.6,
            min_len: 10,
            prefix: "Preference: ",
            patterns: compile(&[
                r"(?:I |user )?(?:prefer|like|want|always|never)\s+(.+?)(?:\.|$)",
                r"(?:my |his |her |their )?preference is\s+(.+?)(?:\.|$)",
            ]),
        },
        Family {
            memory_type: MemoryType::Fact,
            importance: 0.5,
            confidence: 0.5,
            min_len: 15,
            prefix: "",
            patterns: compile(&[
                r"(?:turns out|actually|found out|discovered|learned)\s+(?:that\s+)?(.+?)(?:\.|$)",
                r"(?:the |this )?(?:code|file|function|api|system)\s+(?:is|does|has)\s+(.+?)(?:\.|$)",
            ]),
        },
        Family {
            memory_type: MemoryType::Promise,
            importance: 1.0,
            confidence: 0.8,
            min_len: 10,
            prefix: "Promise: ",
            patterns: compile(&[
                r"(?:I |we )(?:promise|commit|guarantee|will definitely)\s+(.+?)(?:\.|$)",
                r"(?:deal|agreement|commitment)(?::|\s+is)\s+(.+?)(?:\.|$)",
            ]),
        },
    ]
});

/// Extracts candidate memories from free text.
#[derive(Debug, Clone)]
pub struct ConversationExtractor {
    min_confidence: f64,
}

impl Default for ConversationExtractor {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl ConversationExtractor {
    pub fn with_min_confidence(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Extract memories tagged with `project`, in family order
    /// (decisions, preferences, facts, promises), near-duplicates removed.
    pub fn extract(&self, text: &str, project: Option<&str>) -> Vec<NewMemory> {
        let mut found = Vec::new();
        for family in FAMILIES.iter().filter(|f| f.confidence >= self.min_confidence) {
            for re in &family.patterns {
                for caps in re.captures_iter(text) {
                    let Some(m) = caps.get(1) else { continue };
                    let cleaned = clean_capture(m.as_str());
                    if cleaned.chars().count() <= family.min_len {
                        continue;
                    }
                    found.push(
                        NewMemory::new(format!("{}{cleaned}", family.prefix), family.memory_type)
                            .with_importance(family.importance)
                            .with_confidence(family.confidence)
                            .with_source(EXTRACTION_SOURCE)
                            .with_source_type(SourceType::AutoExtracted)
                            .with_project(project.map(str::to_string)),
                    );
                }
            }
        }
        dedup(found)
    }
}

/// Collapse whitespace, strip surrounding punctuation and quotes, capitalise.
fn clean_capture(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| ".,;:\"'".contains(c));
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Word-set Jaccard similarity. Empty sets never match.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let (a, b) = (word_set(a), word_set(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(&b).count() as f64;
    shared / a.union(&b).count() as f64
}

fn dedup(memories: Vec<NewMemory>) -> Vec<NewMemory> {
    let mut kept: Vec<NewMemory> = Vec::with_capacity(memories.len());
    for m in memories {
        if !kept
            .iter()
            .any(|k| jaccard(&k.content, &m.content) >= DUPLICATE_JACCARD)
        {
            kept.push(m);
        }
    }
    kept
}
