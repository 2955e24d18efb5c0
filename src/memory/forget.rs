//! Permanent deletion of a single memory.

use serde::Serialize;
use uuid::Uuid;

use super::store::MemoryStore;
use crate::error::Result;

/// Response from forget.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ForgetResponse {
    pub id: Uuid,
    /// `false` when no record had this ID. Not an error.
    pub deleted: bool,
}

/// Hard-delete one memory. Links pointing at it from other records stay.
pub async fn forget(store: &dyn MemoryStore, id: Uuid) -> Result<ForgetResponse> {
    let deleted = store.delete(id).await?;
    if deleted {
        tracing::info!(id = %id, "memory forgotten");
    } else {
        tracing::debug!(id = %id, "forget: no such memory");
    }
    Ok(ForgetResponse { id, deleted })
}
