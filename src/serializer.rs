//! Serialization module for writing generated documents to YAML or JSON.
//!
//! Both the OpenAPI document and the Postman exports pass through here, so
//! the functions are generic over anything serializable.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serialize a document to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml<T: Serialize>(value: &T) -> Result<String> {
    debug!("Serializing document to YAML");
    serde_yaml::to_string(value).context("Failed to serialize document to YAML")
}

/// Serialize a document to pretty-printed JSON, suitable for human review
/// and version control.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    debug!("Serializing document to JSON");
    serde_json::to_string_pretty(value).context("Failed to serialize document to JSON")
}

/// Write string content to a file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!(
        "Successfully wrote {} bytes to {}",
        content.len(),
        path.display()
    );
    Ok(())
}
