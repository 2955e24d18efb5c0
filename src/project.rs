//! Working-directory project detection.

use std::path::Path;

use crate::memory::types::normalize_project;

/// Resolve the current project.
///
/// Order: explicit value, then the configured/forced project, then the longest
/// known project name found (case-insensitively) in `cwd`.
pub fn detect_project(
    explicit: Option<&str>,
    forced: Option<&str>,
    cwd: &Path,
    known: &[String],
) -> Option<String> {
    if let Some(p) = normalize_project(explicit).or_else(|| normalize_project(forced)) {
        return Some(p);
    }

    let haystack = cwd.to_string_lossy().to_lowercase();
    known
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty() && haystack.contains(&name.to_lowercase()))
        .max_by_key(|name| name.chars().count())
        .map(str::to_string)
}
