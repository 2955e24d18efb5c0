//! MCP `check_contradiction` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CheckContradictionParams {
    #[schemars(description = "The new statement to compare against stored memories")]
    pub content: String,

    #[schemars(description = "Memory type to compare within. Defaults to 'fact'.")]
    pub r#type: Option<String>,
}
