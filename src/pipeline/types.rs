//! Data types flowing through the dataset pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation key: one unique vehicle architecture configuration.
///
/// Displacement and test weight are keyed at fixed precision (cc and whole
/// pounds) so float identity is well defined across files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey {
    pub model_year: u16,
    pub displacement_cc: u32,
    pub test_weight_lbs: u32,
    pub transmission: &'static str,
    pub drive: &'static str,
}

impl ConfigKey {
    pub fn displacement_l(&self) -> f64 {
        self.displacement_cc as f64 / 1000.0
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{:.1}L/{}lbs/{}/{}",
            self.model_year,
            self.displacement_l(),
            self.test_weight_lbs,
            self.transmission,
            self.drive
        )
    }
}

/// One configuration after aggregation: both cycle values reduced to
/// single scalars.
#[derive(Debug, Clone)]
pub struct VehicleRow {
    pub key: ConfigKey,
    pub co2_city_gpm: f64,
    pub co2_hwy_gpm: f64,
}

/// One row of the final modeling table: features plus the combined target.
///
/// The city and highway cycle values are kept in the artifact so the target
/// definition stays checkable downstream; the combined column is always
/// computed here, never sourced pre-combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub model_year: u16,
    pub displacement_l: f64,
    pub test_weight_lbs: f64,
    pub transmission: String,
    pub drive: String,
    pub co2_city_gpm: f64,
    pub co2_hwy_gpm: f64,
    pub co2_combined_gpm: f64,
}

/// Record of everything the pipeline dropped, with enough identity to audit.
#[derive(Debug, Default, Clone)]
pub struct DropLog {
    /// Raw rows that failed to deserialize (bad numbers, truncated lines).
    pub malformed_rows: usize,
    /// Configurations dropped for missing a required cycle, by key.
    pub missing_cycle: Vec<String>,
    /// Rows dropped for implausible cycle values, by key.
    pub implausible: Vec<String>,
}

impl DropLog {
    /// Configurations removed after aggregation (excludes scope filtering).
    pub fn dropped_configurations(&self) -> usize {
        self.missing_cycle.len() + self.implausible.len()
    }

    pub fn counts(&self) -> DropCounts {
        DropCounts {
            malformed_rows: self.malformed_rows,
            missing_cycle: self.missing_cycle.len(),
            implausible: self.implausible.len(),
        }
    }
}

/// Drop counters serialized into dataset metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropCounts {
    pub malformed_rows: usize,
    pub missing_cycle: usize,
    pub implausible: usize,
}

/// Dataset-version metadata written as JSON next to the labeled table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub dataset_name: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub features: Vec<String>,
    pub target: String,
    pub split_year: u16,
    pub city_weight: f64,
    pub hwy_weight: f64,
    pub fuel_scope: String,
    pub test_cycles: Vec<String>,
    pub drops: DropCounts,
}
