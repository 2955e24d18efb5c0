//! MCP `recall` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallParams {
    #[schemars(description = "Natural language query")]
    pub query: String,

    #[schemars(description = "Maximum number of results (1-50). Defaults to 5.")]
    pub limit: Option<usize>,

    #[schemars(description = "Only return memories of this type")]
    pub r#type: Option<String>,

    #[schemars(description = "Minimum stored importance 0.0-1.0")]
    pub min_importance: Option<f64>,

    #[schemars(description = "Minimum confidence 0.0-1.0")]
    pub min_confidence: Option<f64>,

    #[schemars(description = "Only return memories tagged with this project (exact match)")]
    pub project: Option<String>,

    #[schemars(
        description = "'similarity' (default) or 'weighted' to rank by similarity times decayed importance"
    )]
    pub ranking: Option<String>,
}
