//! Read-time importance decay.
//!
//! Stored importance never changes with age. Callers get an *effective*
//! importance computed as `importance * 0.5^(age_days / half_life_days)`.
//! Promises are exempt.

use chrono::{DateTime, Utc};

use super::types::{clamp_unit, Memory, MemoryType};

/// Default half-life in days.
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;

/// Multiplier applied to a memory of `age_days`. Future timestamps count as age zero.
pub fn decay_multiplier(memory_type: MemoryType, age_days: f64, half_life_days: f64) -> f64 {
    if !memory_type.decays() || half_life_days <= 0.0 {
        return 1.0;
    }
    0.5f64.powf(age_days.max(0.0) / half_life_days)
}

/// Effective importance of a stored value at `now`.
pub fn effective_importance_at(
    importance: f64,
    memory_type: MemoryType,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    half_life_days: f64,
) -> f64 {
    let age_days = (now - created_at).num_seconds() as f64 / 86_400.0;
    clamp_unit(importance * decay_multiplier(memory_type, age_days, half_life_days))
}

/// Effective importance of `memory` at `now`.
pub fn effective_importance(memory: &Memory, now: DateTime<Utc>, half_life_days: f64) -> f64 {
    effective_importance_at(
        memory.importance,
        memory.memory_type,
        memory.created_at,
        now,
        half_life_days,
    )
}
