//! The memory engine and everything it is built from.
//!
//! [`MemoryEngine`] is the single entry point used by the MCP tools and the
//! CLI. It validates input, embeds text off the async runtime, and delegates
//! persistence and nearest-neighbour ranking to a [`MemoryStore`] backend.

pub mod briefing;
pub mod consolidate;
pub mod contradiction;
pub mod decay;
pub mod extract;
pub mod forget;
pub mod links;
pub mod local;
pub mod postgres;
pub mod search;
pub mod stats;
pub mod store;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::config::ContinuousConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};
use briefing::{render_briefing, BriefingInput};
use consolidate::{ConsolidateOptions, Consolidation};
use contradiction::{conflict_reasons, ContradictionCandidate};
use extract::ConversationExtractor;
use forget::ForgetResponse;
use links::MemoryGraph;
use search::{clamp_limit, rank, RecallQuery, RecallResponse};
use stats::StatsResponse;
use store::{MemoryStore, SearchFilter};
use types::{check_unit, clamp_unit, normalize_project, Memory, MemoryType, NewMemory, SourceType};

/// Neighbours fetched when looking for contradictions.
const CONTRADICTION_CANDIDATES: usize = 10;

/// Tunables the engine needs, lifted out of [`ContinuousConfig`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub default_limit: usize,
    pub half_life_days: f64,
    pub link_threshold: f64,
    pub link_limit: usize,
    pub contradiction_threshold: f64,
    pub consolidate_threshold: f64,
    pub consolidate_min_age_days: i64,
    pub identity_path: PathBuf,
    pub known_projects: Vec<String>,
    /// Forced project (config or `CONTINUOUS_PROJECT`).
    pub current_project: Option<String>,
    /// Directory used for project detection.
    pub working_dir: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&ContinuousConfig::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &ContinuousConfig) -> Self {
        let r = &config.retrieval;
        Self {
            default_limit: r.default_limit,
            half_life_days: r.half_life_days,
            link_threshold: r.link_threshold,
            link_limit: r.link_limit,
            contradiction_threshold: r.contradiction_threshold,
            consolidate_threshold: r.consolidate_threshold,
            consolidate_min_age_days: r.consolidate_min_age_days,
            identity_path: config.resolved_identity_path(),
            known_projects: config.projects.known.clone(),
            current_project: normalize_project(Some(&config.projects.current)),
            working_dir: std::env::current_dir().unwrap_or_default(),
        }
    }
}

/// Result of remember when contradiction checking was requested.
#[derive(Debug, Clone, Serialize)]
pub struct RememberOutcome {
    pub memory: Memory,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub possible_contradictions: Vec<ContradictionCandidate>,
}

/// Result of ending a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub extracted: Vec<Memory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_id: Option<Uuid>,
    pub total_memories: u64,
}

pub struct MemoryEngine {
    store: Arc<dyn MemoryStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    settings: EngineSettings,
}

impl MemoryEngine {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            settings,
        }
    }

    pub fn store(&self) -> &dyn MemoryStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Embed on the blocking pool; inference is CPU-bound.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| Error::Embedding(format!("embedding task failed: {e}")))?
            .map_err(|e| Error::Embedding(format!("{e:#}")))
    }

    /// Validate, embed and store one memory.
    pub async fn remember(&self, memory: NewMemory) -> Result<Memory> {
        let memory = memory.validate()?;
        let embedding = self.embed(&memory.content).await?;
        self.insert(&memory, &embedding).await
    }

    /// Like [`remember`](Self::remember), but first reports stored memories
    /// the new one may contradict. The write happens either way.
    pub async fn remember_checked(&self, memory: NewMemory) -> Result<RememberOutcome> {
        let memory = memory.validate()?;
        let embedding = self.embed(&memory.content).await?;
        let possible_contradictions = self
            .contradictions_for(&memory.content, memory.memory_type, &embedding)
            .await?;
        let memory = self.insert(&memory, &embedding).await?;
        Ok(RememberOutcome {
            memory,
            possible_contradictions,
        })
    }

    async fn insert(&self, memory: &NewMemory, embedding: &[f32]) -> Result<Memory> {
        let stored = self.store.insert(memory, embedding).await?;
        tracing::info!(
            id = %stored.id,
            memory_type = %stored.memory_type,
            importance = stored.importance,
            backend = self.store.backend(),
            "memory stored"
        );
        Ok(stored)
    }

    pub async fn recall(&self, query: RecallQuery) -> Result<RecallResponse> {
        let text = query.query.trim();
        if text.is_empty() {
            return Err(Error::invalid("query must not be empty"));
        }
        check_unit("min_importance", query.filter.min_importance)?;
        check_unit("min_confidence", query.filter.min_confidence)?;
        let limit = clamp_limit(query.limit, self.settings.default_limit);

        let embedding = self.embed(text).await?;
        let hits = self.store.search(&embedding, limit, &query.filter).await?;
        let results = rank(hits, query.ranking, Utc::now(), self.settings.half_life_days);
        tracing::debug!(results = results.len(), limit, ranking = ?query.ranking, "recall");

        Ok(RecallResponse {
            query: text.to_string(),
            results,
            ranking: query.ranking,
            project: query.filter.project.clone(),
        })
    }

    /// Recall scoped to `project`, or to the detected project when omitted.
    pub async fn project_recall(
        &self,
        query: &str,
        project: Option<&str>,
        limit: Option<usize>,
    ) -> Result<RecallResponse> {
        let project = self
            .detect_project(project)
            .ok_or_else(|| Error::invalid("no project given and none detected"))?;
        let mut q = RecallQuery::new(query);
        q.limit = limit;
        q.filter.project = Some(project);
        self.recall(q).await
    }

    pub fn detect_project(&self, explicit: Option<&str>) -> Option<String> {
        crate::project::detect_project(
            explicit,
            self.settings.current_project.as_deref(),
            &self.settings.working_dir,
            &self.settings.known_projects,
        )
    }

    pub async fn forget(&self, id: Uuid) -> Result<ForgetResponse> {
        forget::forget(self.store.as_ref(), id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Memory>> {
        self.store.get(id).await
    }

    async fn require(&self, id: Uuid) -> Result<Memory> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::invalid(format!("memory not found: {id}")))
    }

    /// Add `amount` (default 0.1, within `[-1, 1]`) to stored importance.
    /// The result is clamped; promises stay at 1.0.
    pub async fn boost(&self, id: Uuid, amount: Option<f64>) -> Result<Memory> {
        let amount = amount.unwrap_or(0.1);
        if amount.is_nan() || !(-1.0..=1.0).contains(&amount) {
            return Err(Error::invalid(format!(
                "boost amount must be between -1.0 and 1.0, got {amount}"
            )));
        }
        let current = self.require(id).await?;
        let importance = if current.memory_type == MemoryType::Promise {
            1.0
        } else {
            clamp_unit(current.importance + amount)
        };
        let updated = self
            .store
            .set_importance(id, importance)
            .await?
            .ok_or_else(|| Error::invalid(format!("memory not found: {id}")))?;
        tracing::info!(id = %id, from = current.importance, to = importance, "importance boosted");
        Ok(updated)
    }

    /// Set or clear (`None` / blank) the project of a memory.
    pub async fn tag_project(&self, id: Uuid, project: Option<&str>) -> Result<Memory> {
        let project = normalize_project(project);
        self.store
            .set_project(id, project.as_deref())
            .await?
            .ok_or_else(|| Error::invalid(format!("memory not found: {id}")))
    }

    pub async fn check_contradiction(
        &self,
        content: &str,
        memory_type: MemoryType,
    ) -> Result<Vec<ContradictionCandidate>> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::invalid("content must not be empty"));
        }
        let embedding = self.embed(content).await?;
        self.contradictions_for(content, memory_type, &embedding)
            .await
    }

    async fn contradictions_for(
        &self,
        content: &str,
        memory_type: MemoryType,
        embedding: &[f32],
    ) -> Result<Vec<ContradictionCandidate>> {
        let filter = SearchFilter {
            memory_type: Some(memory_type),
            ..Default::default()
        };
        let hits = self
            .store
            .search(embedding, CONTRADICTION_CANDIDATES, &filter)
            .await?;
        Ok(hits
            .into_iter()
            .filter(|h| h.similarity >= self.settings.contradiction_threshold)
            .map(|h| ContradictionCandidate {
                reasons: conflict_reasons(&h.memory.content, content),
                memory: h.memory,
                similarity: h.similarity,
            })
            .collect())
    }

    pub async fn link(&self, id: Uuid) -> Result<Vec<Uuid>> {
        links::link_memory(
            self.store.as_ref(),
            id,
            self.settings.link_threshold,
            self.settings.link_limit,
        )
        .await
    }

    pub async fn graph(&self, id: Uuid, depth: Option<usize>) -> Result<MemoryGraph> {
        let depth = depth.unwrap_or(links::DEFAULT_GRAPH_DEPTH);
        links::memory_graph(self.store.as_ref(), id, depth).await
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        let all = self.store.list(None).await?;
        Ok(stats::memory_stats(&all, self.store.backend()))
    }

    pub async fn reflect(&self) -> Result<String> {
        let all = self.store.list(None).await?;
        Ok(stats::reflect(&all))
    }

    pub fn identity(&self) -> Result<String> {
        crate::identity::load_identity(&self.settings.identity_path)
    }

    /// Markdown context for the start of a session.
    pub async fn briefing(&self, project: Option<&str>) -> Result<String> {
        let identity = self.identity()?;
        let all = self.store.list(None).await?;
        let project = self.detect_project(project);
        Ok(render_briefing(&BriefingInput {
            identity: &identity,
            memories: &all,
            project: project.as_deref(),
            now: Utc::now(),
            half_life_days: self.settings.half_life_days,
        }))
    }

    /// Merge near-duplicates. `None` fields fall back to settings.
    pub async fn consolidate(
        &self,
        threshold: Option<f64>,
        min_age_days: Option<i64>,
        apply: bool,
    ) -> Result<Vec<Consolidation>> {
        let threshold = check_unit(
            "threshold",
            threshold.unwrap_or(self.settings.consolidate_threshold),
        )?;
        let options = ConsolidateOptions {
            threshold,
            min_age_days: min_age_days.unwrap_or(self.settings.consolidate_min_age_days),
            apply,
        };
        consolidate::consolidate(self.store.as_ref(), options).await
    }

    /// Store what the extractor finds in `transcript`, plus an optional summary.
    pub async fn end_session(
        &self,
        transcript: &str,
        summary: Option<&str>,
        project: Option<&str>,
    ) -> Result<SessionSummary> {
        let project = self.detect_project(project);
        let candidates = ConversationExtractor::default().extract(transcript, project.as_deref());

        let mut extracted = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            extracted.push(self.remember(candidate).await?);
        }

        let summary_id = match summary.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => {
                let memory = NewMemory::new(
                    format!("Session ended {}: {text}", Utc::now().format("%Y-%m-%d %H:%M UTC")),
                    MemoryType::Conversation,
                )
                .with_source("session_end")
                .with_source_type(SourceType::UserStated)
                .with_project(project.clone());
                Some(self.remember(memory).await?.id)
            }
            None => None,
        };

        let total_memories = self.store.count().await?;
        tracing::info!(
            extracted = extracted.len(),
            summary = summary_id.is_some(),
            total_memories,
            "session ended"
        );
        Ok(SessionSummary {
            extracted,
            summary_id,
            total_memories,
        })
    }
}
