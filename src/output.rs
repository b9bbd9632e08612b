//! Artifact persistence: the labeled dataset table and JSON sidecars.

use crate::error::Result;
use crate::pipeline::types::LabeledExample;
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Writes the labeled table as CSV, one row per vehicle configuration,
/// creating parent directories as needed.
pub fn write_dataset_csv(path: &Path, rows: &[LabeledExample]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Dataset written");
    Ok(())
}

/// Reads a labeled table previously written by [`write_dataset_csv`].
pub fn read_dataset_csv(path: &Path) -> Result<Vec<LabeledExample>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize::<LabeledExample>() {
        rows.push(row?);
    }

    debug!(path = %path.display(), rows = rows.len(), "Dataset read");
    Ok(rows)
}

/// Writes any serializable artifact as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;

    info!(path = %path.display(), "JSON artifact written");
    Ok(())
}
