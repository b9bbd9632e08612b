//! Combined-cycle CO2 target computation.

use crate::config::{CITY_WEIGHT, HWY_WEIGHT, MAX_PLAUSIBLE_CO2_GPM};
use crate::error::{PipelineError, Result};
use crate::pipeline::types::{DropLog, LabeledExample, VehicleRow};
use tracing::warn;

/// Regulatory combined-cycle CO2: 55% city, 45% highway.
pub fn combined_co2(city_gpm: f64, hwy_gpm: f64) -> f64 {
    CITY_WEIGHT * city_gpm + HWY_WEIGHT * hwy_gpm
}

/// Computes the combined target for every aggregated row.
///
/// Rows with an implausible cycle value (non-positive or above
/// [`MAX_PLAUSIBLE_CO2_GPM`]) are dropped and logged — an out-of-range value
/// means an upstream unit error, and combining it would produce nonsense.
pub fn build_targets(rows: Vec<VehicleRow>, drops: &mut DropLog) -> Vec<LabeledExample> {
    let mut examples = Vec::with_capacity(rows.len());

    for row in rows {
        match labeled_example(&row) {
            Ok(example) => examples.push(example),
            Err(e) => {
                warn!(key = %row.key, error = %e, "Row dropped at target computation");
                drops.implausible.push(row.key.to_string());
            }
        }
    }

    examples
}

fn labeled_example(row: &VehicleRow) -> Result<LabeledExample> {
    check_plausible(row, "city", row.co2_city_gpm)?;
    check_plausible(row, "highway", row.co2_hwy_gpm)?;

    Ok(LabeledExample {
        model_year: row.key.model_year,
        displacement_l: row.key.displacement_l(),
        test_weight_lbs: row.key.test_weight_lbs as f64,
        transmission: row.key.transmission.to_string(),
        drive: row.key.drive.to_string(),
        co2_city_gpm: row.co2_city_gpm,
        co2_hwy_gpm: row.co2_hwy_gpm,
        co2_combined_gpm: combined_co2(row.co2_city_gpm, row.co2_hwy_gpm),
    })
}

fn check_plausible(row: &VehicleRow, cycle: &'static str, value: f64) -> Result<()> {
    if value <= 0.0 || value > MAX_PLAUSIBLE_CO2_GPM || !value.is_finite() {
        return Err(PipelineError::UnitMismatch {
            key: row.key.to_string(),
            cycle,
            value,
        });
    }
    Ok(())
}
