use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MemoryGraphParams {
    #[schemars(description = "ID of the memory to start from")]
    pub memory_id: String,

    #[schemars(description = "How many hops to follow (max 5). Defaults to 2.")]
    pub depth: Option<usize>,
}
