//! The dataset build pipeline: Aggregate → BuildTarget, with drop
//! accounting and the run-level sanity threshold.

pub mod aggregate;
pub mod split;
pub mod target;
pub mod types;

use crate::config::{CITY_WEIGHT, HWY_WEIGHT, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::record::RawTestRecord;
use chrono::Utc;
use tracing::info;
use types::{DatasetMetadata, DropLog, LabeledExample};

/// Dataset artifact name recorded in metadata.
pub const DATASET_NAME: &str = "epa_co2_architecture";

/// Dataset schema version recorded in metadata.
pub const DATASET_VERSION: &str = "v1";

/// Runs aggregation and target computation over loaded raw records,
/// producing the labeled modeling table.
///
/// Bad rows are dropped and counted in `drops`; the run itself fails only
/// when the dropped fraction of configurations exceeds
/// `config.max_drop_fraction`, which signals an upstream schema change
/// rather than ordinary data noise.
pub fn build_dataset(
    records: &[RawTestRecord],
    config: &PipelineConfig,
    drops: &mut DropLog,
) -> Result<Vec<LabeledExample>> {
    let rows = aggregate::aggregate(records, drops);
    let examples = target::build_targets(rows, drops);

    let dropped = drops.dropped_configurations();
    let total = examples.len() + dropped;

    if total > 0 {
        let fraction = dropped as f64 / total as f64;
        if fraction > config.max_drop_fraction {
            return Err(PipelineError::DropThresholdExceeded {
                dropped,
                total,
                threshold: config.max_drop_fraction,
            });
        }
    }

    info!(
        rows = examples.len(),
        dropped,
        "Labeled dataset built"
    );
    Ok(examples)
}

/// Metadata describing one built dataset version.
pub fn dataset_metadata(
    examples: &[LabeledExample],
    config: &PipelineConfig,
    drops: &DropLog,
) -> DatasetMetadata {
    DatasetMetadata {
        dataset_name: DATASET_NAME.to_string(),
        version: DATASET_VERSION.to_string(),
        generated_at: Utc::now(),
        rows: examples.len(),
        features: vec![
            "model_year".to_string(),
            "displacement_l".to_string(),
            "test_weight_lbs".to_string(),
            "transmission".to_string(),
            "drive".to_string(),
        ],
        target: "co2_combined_gpm".to_string(),
        split_year: config.split_year,
        city_weight: CITY_WEIGHT,
        hwy_weight: HWY_WEIGHT,
        fuel_scope: "Gasoline ICE only".to_string(),
        test_cycles: vec!["FTP".to_string(), "HWY".to_string()],
        drops: drops.counts(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(year: u16, category: &str, co2: f64) -> RawTestRecord {
        RawTestRecord {
            model_year: year,
            displacement_l: 2.0,
            test_weight_lbs: 3500.0,
            fuel_type: "Tier 2 Cert Gasoline".to_string(),
            transmission_type: "Automatic 8-spd".to_string(),
            drive_code: "F".to_string(),
            test_category: category.to_string(),
            co2_gpm: co2,
        }
    }

    #[test]
    fn test_build_dataset_happy_path() {
        let records = vec![raw(2020, "FTP", 300.0), raw(2020, "HWY", 220.0)];
        let config = PipelineConfig::default();
        let mut drops = DropLog::default();

        let examples = build_dataset(&records, &config, &mut drops).unwrap();
        assert_eq!(examples.len(), 1);
        assert!((examples[0].co2_combined_gpm - (0.55 * 300.0 + 0.45 * 220.0)).abs() < 1e-12);
    }

    #[test]
    fn test_drop_threshold_aborts_run() {
        // Two of three configurations are city-only: 2/3 dropped > 0.5.
        let records = vec![
            raw(2019, "FTP", 300.0),
            raw(2020, "FTP", 300.0),
            raw(2021, "FTP", 300.0),
            raw(2021, "HWY", 220.0),
        ];
        let config = PipelineConfig::default();
        let mut drops = DropLog::default();

        let err = build_dataset(&records, &config, &mut drops).unwrap_err();
        assert!(matches!(err, PipelineError::DropThresholdExceeded { .. }));
    }

    #[test]
    fn test_metadata_records_split_year_and_weights() {
        let records = vec![raw(2020, "FTP", 300.0), raw(2020, "HWY", 220.0)];
        let config = PipelineConfig {
            split_year: 2019,
            ..PipelineConfig::default()
        };
        let mut drops = DropLog::default();
        let examples = build_dataset(&records, &config, &mut drops).unwrap();

        let meta = dataset_metadata(&examples, &config, &drops);
        assert_eq!(meta.split_year, 2019);
        assert_eq!(meta.city_weight, 0.55);
        assert_eq!(meta.hwy_weight, 0.45);
        assert_eq!(meta.rows, 1);
    }
}
