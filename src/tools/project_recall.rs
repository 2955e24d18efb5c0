use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProjectRecallParams {
    #[schemars(description = "Natural language query")]
    pub query: String,

    #[schemars(
        description = "Project to search within. Detected from the working directory when omitted."
    )]
    pub project: Option<String>,

    #[schemars(description = "Maximum number of results (1-50). Defaults to 5.")]
    pub limit: Option<usize>,
}
