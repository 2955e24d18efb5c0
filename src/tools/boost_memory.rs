use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BoostMemoryParams {
    #[schemars(description = "ID of the memory to boost")]
    pub memory_id: String,

    #[schemars(
        description = "Amount added to importance, between -1.0 and 1.0. Defaults to 0.1. The result is capped to 0.0-1.0."
    )]
    pub amount: Option<f64>,
}
