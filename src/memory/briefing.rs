//! Markdown context printed at the start of a session.

use chrono::{DateTime, Utc};

use super::decay::effective_importance;
use super::stats::HIGH_IMPORTANCE;
use super::types::Memory;

const CORE_LIMIT: usize = 5;
const RECENT_LIMIT: usize = 3;
const PROJECT_LIMIT: usize = 5;

pub struct BriefingInput<'a> {
    pub identity: &'a str,
    /// All stored memories, in any order.
    pub memories: &'a [Memory],
    pub project: Option<&'a str>,
    pub now: DateTime<Utc>,
    pub half_life_days: f64,
}

pub fn render_briefing(input: &BriefingInput<'_>) -> String {
    let mut lines = vec![
        "# Continuous Memory Context".to_string(),
        String::new(),
        input.identity.to_string(),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    let mut core: Vec<(f64, &Memory)> = input
        .memories
        .iter()
        .map(|m| (effective_importance(m, input.now, input.half_life_days), m))
        .filter(|(eff, _)| *eff >= HIGH_IMPORTANCE)
        .collect();
    core.sort_by(|a, b| b.0.total_cmp(&a.0));
    if !core.is_empty() {
        lines.push("## Core Memories".to_string());
        lines.push(String::new());
        for (_, m) in core.iter().take(CORE_LIMIT) {
            lines.push(format!("- **[{}]** {}", m.memory_type, m.content));
        }
        lines.push(String::new());
    }

    let mut newest: Vec<&Memory> = input.memories.iter().collect();
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    if !newest.is_empty() {
        lines.push("## Recent".to_string());
        lines.push(String::new());
        for m in newest.iter().take(RECENT_LIMIT) {
            lines.push(format!("- {}", m.preview(100)));
        }
        lines.push(String::new());
    }

    if let Some(project) = input.project {
        let scoped: Vec<&&Memory> = newest
            .iter()
            .filter(|m| m.project.as_deref() == Some(project))
            .take(PROJECT_LIMIT)
            .collect();
        if !scoped.is_empty() {
            lines.push(format!("## Project: {project}"));
            lines.push(String::new());
            for m in scoped {
                lines.push(format!("- {}", m.to_context()));
            }
            lines.push(String::new());
        }
    }

    lines.push(format!("*{} memories stored*", input.memories.len()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::{MemoryType, SourceType};
    use chrono::Duration;
    use uuid::Uuid;

    fn memory(content: &str, t: MemoryType, importance: f64, age_days: i64, project: Option<&str>) -> Memory {
        let at = Utc::now() - Duration::days(age_days);
        Memory {
            id: Uuid::now_v7(),
            content: content.into(),
            memory_type: t,
            importance,
            tags: vec![],
            source: "direct".into(),
            source_type: SourceType::UserStated,
            confidence: 1.0,
            related_to: vec![],
            project: project.map(str::to_string),
            created_at: at,
            updated_at: at,
        }
    }

    fn render(memories: &[Memory], project: Option<&str>) -> String {
        render_briefing(&BriefingInput {
            identity: "# Who I Am",
            memories,
            project,
            now: Utc::now(),
            half_life_days: 30.0,
        })
    }

    #[test]
    fn empty_store_has_identity_and_footer() {
        let text = render(&[], None);
        assert!(text.starts_with("# Continuous Memory Context\n\n# Who I Am"));
        assert!(!text.contains("## Core Memories"));
        assert!(!text.contains("## Recent"));
        assert!(text.ends_with("*0 memories stored*"));
    }

    #[test]
    fn decayed_memories_drop_out_of_core() {
        let memories = vec![
            memory("A deal is a deal", MemoryType::Promise, 1.0, 120, None),
            memory("Old but once important", MemoryType::Fact, 0.9, 60, None),
            memory("Fresh and important", MemoryType::Decision, 0.9, 0, None),
        ];
        let text = render(&memories, None);
        assert!(text.contains("- **[promise]** A deal is a deal"));
        assert!(text.contains("- **[decision]** Fresh and important"));
        assert!(!text.contains("**[fact]**"));
    }

    #[test]
    fn recent_and_project_sections() {
        let memories = vec![
            memory("Oldest", MemoryType::Fact, 0.5, 10, Some("vesper")),
            memory("Middle", MemoryType::Fact, 0.5, 5, None),
            memory("Newer", MemoryType::Fact, 0.5, 2, None),
            memory("Newest", MemoryType::Fact, 0.5, 1, Some("vesper")),
        ];
        let text = render(&memories, Some("vesper"));
        assert!(text.contains("## Recent\n\n- Newest\n- Newer\n- Middle\n"));
        assert!(text.contains("## Project: vesper\n\n- Fact: Newest\n- Fact: Oldest"));
        assert!(text.ends_with("*4 memories stored*"));
    }
}
