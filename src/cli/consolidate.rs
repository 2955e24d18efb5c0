use anyhow::Result;

use crate::memory::consolidate::ConsolidationStatus;
use crate::memory::MemoryEngine;

/// Report (or, with `apply`, perform) merges of near-duplicate old memories.
pub async fn consolidate(
    engine: &MemoryEngine,
    threshold: Option<f64>,
    min_age_days: Option<i64>,
    apply: bool,
) -> Result<()> {
    let actions = engine.consolidate(threshold, min_age_days, apply).await?;
    if actions.is_empty() {
        println!("Nothing to consolidate.");
        return Ok(());
    }

    for a in &actions {
        let verb = match a.status {
            ConsolidationStatus::Proposed => "would merge",
            ConsolidationStatus::Consolidated => "merged",
        };
        println!("{verb} (similarity {:.3})", a.similarity);
        println!("  keep   {}  {}", a.keep, a.keep_preview);
        println!("  remove {}  {}", a.remove, a.remove_preview);
    }

    if !apply {
        println!();
        println!("Dry run. Re-run with --apply to merge {} pair(s).", actions.len());
    }
    Ok(())
}
