use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BriefingParams {
    #[schemars(
        description = "Project to include a section for. Detected from the working directory when omitted."
    )]
    pub project: Option<String>,
}
