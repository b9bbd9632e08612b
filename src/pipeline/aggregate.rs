//! Vehicle-level aggregation of raw per-cycle test records.

use crate::error::{PipelineError, Result};
use crate::pipeline::types::{ConfigKey, DropLog, VehicleRow};
use crate::record::{Cycle, RawTestRecord};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// City and highway observations accumulated for one configuration.
#[derive(Debug, Default)]
struct CycleAccum {
    city: Vec<f64>,
    hwy: Vec<f64>,
}

/// Groups raw records by configuration key and reduces each cycle's
/// observations to a single scalar (arithmetic mean of duplicates).
///
/// Configurations missing either cycle are dropped, logged with their key,
/// and recorded in `drops` — both cycles are required for the combined
/// target. Output is sorted by key so repeated runs are byte-identical.
pub fn aggregate(records: &[RawTestRecord], drops: &mut DropLog) -> Vec<VehicleRow> {
    let mut groups: BTreeMap<ConfigKey, CycleAccum> = BTreeMap::new();

    for record in records {
        let Some(cycle) = record.cycle() else {
            continue;
        };

        let key = config_key(record);
        let accum = groups.entry(key).or_default();
        match cycle {
            Cycle::City => accum.city.push(record.co2_gpm),
            Cycle::Hwy => accum.hwy.push(record.co2_gpm),
        }
    }

    let total = groups.len();
    let mut rows = Vec::with_capacity(total);

    for (key, accum) in groups {
        match reduce(key, &accum) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(key = %key, error = %e, "Configuration dropped");
                drops.missing_cycle.push(key.to_string());
            }
        }
    }

    info!(
        configurations = rows.len(),
        dropped = drops.missing_cycle.len(),
        "Aggregation complete"
    );
    rows
}

/// Reduces one configuration's accumulated observations, requiring both cycles.
fn reduce(key: ConfigKey, accum: &CycleAccum) -> Result<VehicleRow> {
    if accum.city.is_empty() {
        return Err(PipelineError::DataIntegrity {
            key: key.to_string(),
            cycle: "city",
        });
    }
    if accum.hwy.is_empty() {
        return Err(PipelineError::DataIntegrity {
            key: key.to_string(),
            cycle: "highway",
        });
    }

    Ok(VehicleRow {
        key,
        co2_city_gpm: mean(&accum.city),
        co2_hwy_gpm: mean(&accum.hwy),
    })
}

fn config_key(record: &RawTestRecord) -> ConfigKey {
    ConfigKey {
        model_year: record.model_year,
        displacement_cc: (record.displacement_l * 1000.0).round() as u32,
        test_weight_lbs: record.test_weight_lbs.round() as u32,
        transmission: record.transmission_bucket(),
        drive: record.drive_bucket(),
    }
}

/// Arithmetic mean of a non-empty slice.
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
