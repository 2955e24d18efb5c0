//! MCP `remember` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `remember` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RememberParams {
    #[schemars(description = "What to remember, as a short natural language statement")]
    pub content: String,

    /// One of the eight memory types. Defaults to `fact`.
    #[schemars(
        description = "Memory type: promise, person, project, preference, fact, decision, conversation, learning. Defaults to 'fact'."
    )]
    pub r#type: Option<String>,

    #[schemars(
        description = "Importance 0.0-1.0. Defaults to 0.5. Promises are always 1.0."
    )]
    pub importance: Option<f64>,

    #[schemars(description = "Optional tags")]
    pub tags: Option<Vec<String>>,

    #[schemars(description = "Where this came from. Defaults to 'direct'.")]
    pub source: Option<String>,

    #[schemars(
        description = "How it is known: user_stated, inferred, file, corrected, auto_extracted. Defaults to user_stated."
    )]
    pub source_type: Option<String>,

    #[schemars(description = "Confidence 0.0-1.0. Defaults to 1.0.")]
    pub confidence: Option<f64>,

    #[schemars(description = "Project this memory belongs to")]
    pub project: Option<String>,

    #[schemars(
        description = "If true, report similar stored memories of the same type that may contradict this one. The memory is stored either way."
    )]
    pub check_contradictions: Option<bool>,
}
