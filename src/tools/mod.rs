pub mod boost_memory;
pub mod briefing;
pub mod check_contradiction;
pub mod forget;
pub mod link_memories;
pub mod memory_graph;
pub mod project_recall;
pub mod recall;
pub mod remember;
pub mod tag_project;

use std::sync::Arc;

use boost_memory::BoostMemoryParams;
use briefing::BriefingParams;
use check_contradiction::CheckContradictionParams;
use forget::ForgetParams;
use link_memories::LinkMemoriesParams;
use memory_graph::MemoryGraphParams;
use project_recall::ProjectRecallParams;
use recall::RecallParams;
use remember::RememberParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use tag_project::TagProjectParams;

use crate::error::Error;
use crate::memory::search::{Ranking, RecallQuery};
use crate::memory::store::SearchFilter;
use crate::memory::types::{parse_id, MemoryType, NewMemory, SourceType};
use crate::memory::MemoryEngine;

/// Tool errors travel to the client as plain strings.
fn tool_error(e: Error) -> String {
    if e.is_retryable() {
        format!("{e} (temporary, retry later)")
    } else {
        e.to_string()
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

fn parse_type(raw: Option<&str>) -> Result<MemoryType, String> {
    match raw {
        Some(t) => t.parse().map_err(|e: String| e),
        None => Ok(MemoryType::Fact),
    }
}

/// The MCP tool surface. Every tool is a thin wrapper over [`MemoryEngine`].
#[derive(Clone)]
pub struct ContinuousTools {
    tool_router: ToolRouter<Self>,
    engine: Arc<MemoryEngine>,
}

#[tool_router]
impl ContinuousTools {
    pub fn new(engine: Arc<MemoryEngine>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
        }
    }

    #[tool(description = "Store a memory. Types: promise, person, project, preference, fact, decision, conversation, learning. Returns the stored record with its ID.")]
    pub async fn remember(
        &self,
        Parameters(params): Parameters<RememberParams>,
    ) -> Result<String, String> {
        let memory_type = parse_type(params.r#type.as_deref())?;
        let mut memory = NewMemory::new(params.content, memory_type)
            .with_tags(params.tags.unwrap_or_default())
            .with_project(params.project);
        if let Some(importance) = params.importance {
            memory = memory.with_importance(importance);
        }
        if let Some(confidence) = params.confidence {
            memory = memory.with_confidence(confidence);
        }
        if let Some(source) = params.source {
            memory = memory.with_source(source);
        }
        if let Some(st) = params.source_type {
            memory = memory.with_source_type(st.parse::<SourceType>().map_err(|e: String| e)?);
        }

        tracing::info!(memory_type = %memory_type, "remember called");

        if params.check_contradictions.unwrap_or(false) {
            let outcome = self
                .engine
                .remember_checked(memory)
                .await
                .map_err(tool_error)?;
            to_json(&outcome)
        } else {
            let stored = self.engine.remember(memory).await.map_err(tool_error)?;
            to_json(&stored)
        }
    }

    #[tool(description = "Search memories by meaning. Results carry similarity and decayed (effective) importance.")]
    pub async fn recall(
        &self,
        Parameters(params): Parameters<RecallParams>,
    ) -> Result<String, String> {
        let memory_type = params
            .r#type
            .as_deref()
            .map(str::parse::<MemoryType>)
            .transpose()
            .map_err(|e: String| e)?;
        let ranking = params
            .ranking
            .as_deref()
            .map(str::parse::<Ranking>)
            .transpose()
            .map_err(|e: String| e)?
            .unwrap_or_default();

        tracing::info!(query = %params.query, "recall called");

        let query = RecallQuery {
            query: params.query,
            limit: params.limit,
            filter: SearchFilter {
                memory_type,
                min_importance: params.min_importance.unwrap_or(0.0),
                min_confidence: params.min_confidence.unwrap_or(0.0),
                project: params.project.filter(|p| !p.trim().is_empty()),
            },
            ranking,
        };
        let response = self.engine.recall(query).await.map_err(tool_error)?;
        to_json(&response)
    }

    #[tool(description = "Delete a memory by ID. Deleting an unknown ID reports deleted=false.")]
    pub async fn forget(
        &self,
        Parameters(params): Parameters<ForgetParams>,
    ) -> Result<String, String> {
        let id = parse_id(&params.memory_id).map_err(tool_error)?;
        let response = self.engine.forget(id).await.map_err(tool_error)?;
        to_json(&response)
    }

    #[tool(description = "Summarise what is stored: counts by type, high-importance memories, projects.")]
    pub async fn reflect(&self) -> Result<String, String> {
        self.engine.reflect().await.map_err(tool_error)
    }

    #[tool(description = "Return the identity document: who I am, who I work with, and what we agreed.")]
    pub async fn identity(&self) -> Result<String, String> {
        self.engine.identity().map_err(tool_error)
    }

    #[tool(description = "Memory statistics as JSON: totals by type, source type and project, average importance, date range.")]
    pub async fn memory_stats(&self) -> Result<String, String> {
        let stats = self.engine.stats().await.map_err(tool_error)?;
        to_json(&stats)
    }

    #[tool(description = "Session-start context in markdown: identity, core memories, recent memories and the current project.")]
    pub async fn briefing(
        &self,
        Parameters(params): Parameters<BriefingParams>,
    ) -> Result<String, String> {
        self.engine
            .briefing(params.project.as_deref())
            .await
            .map_err(tool_error)
    }

    #[tool(description = "Link a memory to its most similar memories (mutual links). Returns the linked IDs.")]
    pub async fn link_memories(
        &self,
        Parameters(params): Parameters<LinkMemoriesParams>,
    ) -> Result<String, String> {
        let id = parse_id(&params.memory_id).map_err(tool_error)?;
        let linked = self.engine.link(id).await.map_err(tool_error)?;
        to_json(&serde_json::json!({ "memory_id": id, "linked": linked }))
    }

    #[tool(description = "Raise (or lower) a memory's importance. Default +0.1, capped to 0.0-1.0.")]
    pub async fn boost_memory(
        &self,
        Parameters(params): Parameters<BoostMemoryParams>,
    ) -> Result<String, String> {
        let id = parse_id(&params.memory_id).map_err(tool_error)?;
        let memory = self
            .engine
            .boost(id, params.amount)
            .await
            .map_err(tool_error)?;
        to_json(&memory)
    }

    #[tool(description = "Walk the links around a memory. Returns nodes (id, type, importance, preview) and edges.")]
    pub async fn memory_graph(
        &self,
        Parameters(params): Parameters<MemoryGraphParams>,
    ) -> Result<String, String> {
        let id = parse_id(&params.memory_id).map_err(tool_error)?;
        let graph = self
            .engine
            .graph(id, params.depth)
            .await
            .map_err(tool_error)?;
        to_json(&graph)
    }

    #[tool(description = "Find stored memories of the same type that a new statement may contradict, with reasons.")]
    pub async fn check_contradiction(
        &self,
        Parameters(params): Parameters<CheckContradictionParams>,
    ) -> Result<String, String> {
        let memory_type = parse_type(params.r#type.as_deref())?;
        let candidates = self
            .engine
            .check_contradiction(&params.content, memory_type)
            .await
            .map_err(tool_error)?;
        let likely = candidates.iter().filter(|c| c.is_likely_conflict()).count();
        to_json(&serde_json::json!({
            "candidates": candidates,
            "likely_conflicts": likely,
        }))
    }

    #[tool(description = "Search memories within one project. The project is detected from the working directory when omitted.")]
    pub async fn project_recall(
        &self,
        Parameters(params): Parameters<ProjectRecallParams>,
    ) -> Result<String, String> {
        let response = self
            .engine
            .project_recall(&params.query, params.project.as_deref(), params.limit)
            .await
            .map_err(tool_error)?;
        to_json(&response)
    }

    #[tool(description = "Set or clear the project a memory belongs to.")]
    pub async fn tag_project(
        &self,
        Parameters(params): Parameters<TagProjectParams>,
    ) -> Result<String, String> {
        let id = parse_id(&params.memory_id).map_err(tool_error)?;
        let memory = self
            .engine
            .tag_project(id, params.project.as_deref())
            .await
            .map_err(tool_error)?;
        to_json(&memory)
    }
}

#[tool_handler]
impl ServerHandler for ContinuousTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Continuous is a long-term memory server. Call briefing at the start of a \
                 session, remember to store, recall or project_recall to search."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_defaults_to_fact() {
        assert_eq!(parse_type(None).unwrap(), MemoryType::Fact);
        assert_eq!(parse_type(Some("Promise")).unwrap(), MemoryType::Promise);
        assert!(parse_type(Some("event")).is_err());
    }

    #[test]
    fn transient_errors_are_marked() {
        let msg = tool_error(Error::TransientIo("pool timed out".into()));
        assert!(msg.contains("retry"));
        let msg = tool_error(Error::invalid("bad id"));
        assert!(!msg.contains("retry"));
    }
}
