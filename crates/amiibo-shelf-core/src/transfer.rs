//! Export and import of the status map as a portable JSON file.
//!
//! The file is an object mapping identifier to `{"owned", "favorite"}`.
//! Exports only list identifiers with at least one flag set. Imports are
//! validated completely before anything is returned, so a bad file never
//! half-applies.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::models::{ItemStatus, StatusMap};

/// Suggested file name for exports
pub const EXPORT_FILE_NAME: &str = "amiibo-collection.json";

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("File is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Expected a JSON object mapping identifiers to statuses")]
    NotAnObject,

    #[error("Invalid status for {identifier}: {source}")]
    SchemaMismatch {
        identifier: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode export: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("File error: {0}")]
    Io(#[from] io::Error),
}

/// Serialize the statuses worth keeping, sorted by identifier.
pub fn export_statuses(statuses: &StatusMap) -> Result<String, TransferError> {
    let kept: BTreeMap<&String, &ItemStatus> = statuses
        .iter()
        .filter(|(_, status)| !status.is_default())
        .collect();
    serde_json::to_string_pretty(&kept).map_err(TransferError::Encode)
}

/// Parse an exported file. Missing flags default to false.
pub fn import_statuses(text: &str) -> Result<StatusMap, TransferError> {
    let value: Value = serde_json::from_str(text).map_err(TransferError::Parse)?;
    let Value::Object(entries) = value else {
        return Err(TransferError::NotAnObject);
    };

    let mut statuses = StatusMap::with_capacity(entries.len());
    for (identifier, entry) in entries {
        let status: ItemStatus = serde_json::from_value(entry).map_err(|source| {
            TransferError::SchemaMismatch {
                identifier: identifier.clone(),
                source,
            }
        })?;
        statuses.insert(identifier, status);
    }
    Ok(statuses)
}

pub fn write_export(path: &Path, statuses: &StatusMap) -> Result<usize, TransferError> {
    let contents = export_statuses(statuses)?;
    fs::write(path, contents)?;
    let written = statuses.values().filter(|s| !s.is_default()).count();
    info!(path = %path.display(), entries = written, "Collection exported");
    Ok(written)
}

pub fn read_import(path: &Path) -> Result<StatusMap, TransferError> {
    let contents = fs::read_to_string(path)?;
    import_statuses(&contents)
}
