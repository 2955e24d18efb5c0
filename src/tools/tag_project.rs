use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TagProjectParams {
    #[schemars(description = "ID of the memory to tag")]
    pub memory_id: String,

    #[schemars(description = "Project name. Omit or leave empty to clear the tag.")]
    pub project: Option<String>,
}
