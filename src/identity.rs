//! The identity file: static markdown injected at the top of every briefing.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};

/// Read the identity markdown at `path`.
///
/// A missing file is not an error; it yields a placeholder that says where
/// to create one.
pub fn load_identity(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(placeholder(path)),
        Err(e) => Err(Error::Storage(format!(
            "cannot read identity file {}: {e}",
            path.display()
        ))),
    }
}

fn placeholder(path: &Path) -> String {
    format!(
        "# Who I Am\n\nNo identity file yet. Write one at {} to describe who I am, \
         who I work with, and what we agreed on.",
        path.display()
    )
}
