//! MCP `link_memories` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `link_memories` MCP tool.
///
/// Links are mutual and re-running on the same memory adds nothing new.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LinkMemoriesParams {
    #[schemars(description = "ID of the memory to link to its closest neighbours")]
    pub memory_id: String,
}
