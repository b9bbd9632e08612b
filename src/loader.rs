//! CSV loader for raw EPA certification test data.
//!
//! Reads every delimited file in a raw-data directory, validates the
//! required schema per file, and applies the scope filters (gasoline ICE,
//! FTP/HWY cycles only). Malformed rows are skipped and counted, never
//! silently ignored.

use crate::error::{PipelineError, Result};
use crate::pipeline::types::DropLog;
use crate::record::{RawTestRecord, REQUIRED_COLUMNS};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Loads and filters raw records from every `.csv` file in `dir`,
/// sorted by file name so the run is order-deterministic.
pub fn load_raw_dir(dir: &Path, drops: &mut DropLog) -> Result<Vec<RawTestRecord>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(PipelineError::NoRawFiles {
            path: dir.display().to_string(),
        });
    }

    let mut records = Vec::new();
    for path in &files {
        let before = records.len();
        load_raw_file(path, &mut records, drops)?;
        info!(
            file = %path.display(),
            rows = records.len() - before,
            "Raw file loaded"
        );
    }

    info!(
        files = files.len(),
        rows = records.len(),
        malformed = drops.malformed_rows,
        "Raw data load complete"
    );
    Ok(records)
}

/// Loads one raw EPA file into `out`, applying scope filters.
///
/// # Errors
///
/// Returns [`PipelineError::MissingColumns`] if the file lacks any of the
/// required headers — a schema error fails the whole file, not single rows.
pub fn load_raw_file(path: &Path, out: &mut Vec<RawTestRecord>, drops: &mut DropLog) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    validate_headers(path, reader.headers()?)?;

    for row in reader.deserialize::<RawTestRecord>() {
        let record = match row {
            Ok(r) => r,
            Err(e) => {
                drops.malformed_rows += 1;
                warn!(file = %path.display(), error = %e, "Skipping malformed row");
                continue;
            }
        };

        if !record.is_gasoline_ice() {
            continue;
        }
        if record.cycle().is_none() {
            continue;
        }

        out.push(record);
    }

    debug!(file = %path.display(), "File scan finished");
    Ok(())
}

/// Headers vary in padding across EPA publication years but the names
/// themselves are stable; anything missing means the schema changed upstream.
fn validate_headers(path: &Path, headers: &csv::StringRecord) -> Result<()> {
    let present: Vec<&str> = headers.iter().collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !present.contains(*col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns {
            path: path.display().to_string(),
            missing,
        })
    }
}
