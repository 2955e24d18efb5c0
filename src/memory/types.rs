//! Core memory type definitions.
//!
//! Defines [`MemoryType`] (the eight memory categories), [`SourceType`] (how a
//! memory came to be known), [`Memory`] (a stored record) and [`NewMemory`]
//! (a validated record waiting for its embedding).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Importance given to a memory stored without one, whatever its type.
pub const DEFAULT_IMPORTANCE: f64 = 0.5;

/// The kinds of memory a session can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// A commitment. Always importance 1.0 and never decays.
    Promise,
    /// Something about a person.
    Person,
    /// Something about a project.
    Project,
    /// How someone likes things done.
    Preference,
    /// A discrete piece of information.
    Fact,
    /// A choice that was made.
    Decision,
    /// Summary of a conversation.
    Conversation,
    /// Something discovered or understood.
    Learning,
}

impl MemoryType {
    pub const ALL: [MemoryType; 8] = [
        Self::Promise,
        Self::Person,
        Self::Project,
        Self::Preference,
        Self::Fact,
        Self::Decision,
        Self::Conversation,
        Self::Learning,
    ];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Promise => "promise",
            Self::Person => "person",
            Self::Project => "project",
            Self::Preference => "preference",
            Self::Fact => "fact",
            Self::Decision => "decision",
            Self::Conversation => "conversation",
            Self::Learning => "learning",
        }
    }

    /// Label used when a memory is rendered into session context.
    pub fn context_label(&self) -> &'static str {
        match self {
            Self::Promise => "Promise:",
            Self::Person => "About person:",
            Self::Project => "About project:",
            Self::Preference => "Preference:",
            Self::Fact => "Fact:",
            Self::Decision => "Decision:",
            Self::Conversation => "From conversation:",
            Self::Learning => "Learned:",
        }
    }

    /// Promises are exempt from read-time decay.
    pub fn decays(&self) -> bool {
        !matches!(self, Self::Promise)
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "promise" => Ok(Self::Promise),
            "person" => Ok(Self::Person),
            "project" => Ok(Self::Project),
            "preference" => Ok(Self::Preference),
            "fact" => Ok(Self::Fact),
            "decision" => Ok(Self::Decision),
            "conversation" => Ok(Self::Conversation),
            "learning" => Ok(Self::Learning),
            _ => Err(format!("unknown memory type: {s}")),
        }
    }
}

/// How a memory came to be known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Told directly by the user.
    #[default]
    UserStated,
    /// Deduced by the assistant.
    Inferred,
    /// Read from a file.
    File,
    /// Replaces an earlier, wrong memory.
    Corrected,
    /// Pulled out of a transcript by the extractor.
    AutoExtracted,
}

impl SourceType {
    pub const ALL: [SourceType; 5] = [
        Self::UserStated,
        Self::Inferred,
        Self::File,
        Self::Corrected,
        Self::AutoExtracted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserStated => "user_stated",
            Self::Inferred => "inferred",
            Self::File => "file",
            Self::Corrected => "corrected",
            Self::AutoExtracted => "auto_extracted",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user_stated" => Ok(Self::UserStated),
            "inferred" => Ok(Self::Inferred),
            "file" => Ok(Self::File),
            "corrected" => Ok(Self::Corrected),
            "auto_extracted" => Ok(Self::AutoExtracted),
            _ => Err(format!("unknown source type: {s}")),
        }
    }
}

/// A stored memory record, matching the `memories` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// UUID v7 primary key.
    pub id: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    /// Stored importance in `[0.0, 1.0]`, before decay.
    pub importance: f64,
    pub tags: Vec<String>,
    pub source: String,
    pub source_type: SourceType,
    pub confidence: f64,
    /// Soft references to other memories. Never cleaned up on delete.
    pub related_to: Vec<Uuid>,
    pub project: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Memory {
    /// Render the memory as a single context line, e.g. `Promise: ...`.
    pub fn to_context(&self) -> String {
        format!("{} {}", self.memory_type.context_label(), self.content)
    }

    /// First `max_chars` characters of the content, with `...` when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        truncate_preview(&self.content, max_chars)
    }
}

/// A validated memory waiting to be embedded and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemory {
    pub content: String,
    pub memory_type: MemoryType,
    pub importance: f64,
    pub tags: Vec<String>,
    pub source: String,
    pub source_type: SourceType,
    pub confidence: f64,
    pub project: Option<String>,
}

impl NewMemory {
    /// Start a memory at [`DEFAULT_IMPORTANCE`]. Promises are raised to 1.0
    /// by [`NewMemory::validate`].
    pub fn new(content: impl Into<String>, memory_type: MemoryType) -> Self {
        NewMemory {
            content: content.into(),
            memory_type,
            importance: DEFAULT_IMPORTANCE,
            tags: Vec::new(),
            source: "direct".into(),
            source_type: SourceType::UserStated,
            confidence: 1.0,
            project: None,
        }
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project;
        self
    }

    /// Check ranges and normalize fields in place.
    ///
    /// Rejects empty content and out-of-range importance/confidence. Promises
    /// are pinned to importance 1.0, tags are trimmed and deduplicated, and a
    /// blank project becomes `None`.
    pub fn validate(mut self) -> Result<Self> {
        self.content = self.content.trim().to_string();
        if self.content.is_empty() {
            return Err(Error::invalid("content must not be empty"));
        }
        self.importance = check_unit("importance", self.importance)?;
        self.confidence = check_unit("confidence", self.confidence)?;
        if self.memory_type == MemoryType::Promise {
            self.importance = 1.0;
        }
        self.tags = normalize_tags(self.tags);
        self.project = normalize_project(self.project.as_deref());
        if self.source.trim().is_empty() {
            self.source = "direct".into();
        }
        Ok(self)
    }
}

/// Reject NaN and values outside `[0.0, 1.0]`.
pub fn check_unit(field: &str, value: f64) -> Result<f64> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(Error::invalid(format!(
            "{field} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(value)
}

/// Clamp into `[0.0, 1.0]`. NaN becomes 0.0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Trim, drop empties and remove duplicates, keeping first occurrence order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Split a comma-separated tag list.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(',').map(str::to_string).collect())
}

pub fn normalize_project(project: Option<&str>) -> Option<String> {
    project
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

/// Parse a memory ID supplied by a caller.
pub fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| Error::invalid(format!("malformed memory id: {raw}")))
}

/// Truncate content to `max_chars` characters, appending "..." if truncated.
pub fn truncate_preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &content[..end]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_type_round_trips_through_str() {
        for t in MemoryType::ALL {
            assert_eq!(t.as_str().parse::<MemoryType>().unwrap(), t);
        }
        assert!("event".parse::<MemoryType>().is_err());
    }

    #[test]
    fn source_type_round_trips_through_str() {
        for s in SourceType::ALL {
            assert_eq!(s.as_str().parse::<SourceType>().unwrap(), s);
        }
        assert!("rumour".parse::<SourceType>().is_err());
    }

    #[test]
    fn every_type_starts_at_the_default_importance() {
        for t in MemoryType::ALL {
            let m = NewMemory::new("x", t).validate().unwrap();
            let expected = if t == MemoryType::Promise { 1.0 } else { DEFAULT_IMPORTANCE };
            assert_eq!(m.importance, expected, "{t:?}");
        }
    }

    #[test]
    fn promise_is_pinned_to_full_importance() {
        let m = NewMemory::new("A deal is a deal", MemoryType::Promise)
            .with_importance(0.3)
            .validate()
            .unwrap();
        assert_eq!(m.importance, 1.0);
    }

    #[test]
    fn out_of_range_importance_is_rejected() {
        let err = NewMemory::new("x", MemoryType::Fact)
            .with_importance(1.5)
            .validate()
            .unwrap_err();
        assert!(err.is_client_error());

        let err = NewMemory::new("x", MemoryType::Fact)
            .with_confidence(f64::NAN)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("confidence"));
    }

    #[test]
    fn empty_content_is_rejected() {
        assert!(NewMemory::new("   ", MemoryType::Fact).validate().is_err());
    }

    #[test]
    fn tags_are_normalized() {
        let tags = parse_tag_list(" rust, ,memory,rust ");
        assert_eq!(tags, vec!["rust".to_string(), "memory".to_string()]);
    }

    #[test]
    fn clamp_unit_bounds() {
        assert_eq!(clamp_unit(1.2), 1.0);
        assert_eq!(clamp_unit(-0.1), 0.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(0.4), 0.4);
    }

    #[test]
    fn truncate_preview_respects_char_boundaries() {
        assert_eq!(truncate_preview("short", 10), "short");
        assert_eq!(truncate_preview("abcdef", 3), "abc...");
        assert_eq!(truncate_preview("héllo wörld", 4), "héll...");
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        let id = Uuid::now_v7();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
