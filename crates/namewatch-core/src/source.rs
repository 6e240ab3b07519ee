//! Identifier source
//!
//! Loads the tracked identifiers from a newline-delimited text file, once,
//! at startup.

use std::path::Path;
use tokio::fs;

use crate::error::{Error, Result};

/// Load identifiers from `path`
///
/// - One identifier per line, surrounding whitespace trimmed
/// - Blank lines are ignored
/// - A missing file is created empty and yields no identifiers
///
/// Duplicates are kept here; [`IdentifierStore::new`](crate::IdentifierStore::new)
/// collapses them.
pub async fn load_identifiers<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();

    if !path.exists() {
        tracing::warn!(
            "Identifier file {} not found, creating an empty one",
            path.display()
        );
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::source(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        fs::write(path, b"").await.map_err(|e| {
            Error::source(format!("Failed to create {}: {}", path.display(), e))
        })?;
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| Error::source(format!("Failed to read {}: {}", path.display(), e)))?;

    let identifiers: Vec<String> = parse_identifiers(&content);
    tracing::info!(
        "Loaded {} identifiers from {}",
        identifiers.len(),
        path.display()
    );
    Ok(identifiers)
}

/// Split newline-delimited text into identifiers
pub fn parse_identifiers(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
