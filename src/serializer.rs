//! Serialization and file-output helpers.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes any document to pretty-printed JSON.
pub fn serialize_json<T: Serialize>(doc: &T) -> Result<String> {
    debug!("Serializing document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize document to JSON")
}

/// Writes content to a file, creating parent directories as needed.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write output file {}", path.display()))?;
    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
