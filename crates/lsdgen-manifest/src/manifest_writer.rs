//! Reading and writing of generated JSON documents
//!
//! Documents are pretty-printed with two-space indentation and end with a
//! newline, so regenerated files diff cleanly.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::errors::GeneratorError;

/// Render a document the way it is written to disk
pub fn to_pretty_json<T: Serialize>(document: &T) -> Result<String, GeneratorError> {
    let mut json = serde_json::to_string_pretty(document)?;
    json.push('\n');
    Ok(json)
}

/// Write a document, creating parent directories as needed
pub fn write_to_path<T: Serialize>(document: &T, output_path: &Path) -> Result<(), GeneratorError> {
    debug!("Writing document to: {:?}", output_path);

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, to_pretty_json(document)?)?;
    Ok(())
}

pub fn read_from_path<T: DeserializeOwned>(path: &Path) -> Result<T, GeneratorError> {
    debug!("Reading document from: {:?}", path);

    let content = fs::read_to_string(path).map_err(|source| GeneratorError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| GeneratorError::ParseJson {
        path: path.to_path_buf(),
        source,
    })
}
