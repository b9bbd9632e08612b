//! Explicit, immutable run configuration.
//!
//! Every stage takes these values as plain arguments rather than reading
//! process-wide mutable state, so multiple dataset versions can coexist and
//! tests can override them per run.

use serde::Serialize;

/// City share of the regulatory combined-cycle weighting. Fixed, not configurable.
pub const CITY_WEIGHT: f64 = 0.55;

/// Highway share of the regulatory combined-cycle weighting. Fixed, not configurable.
pub const HWY_WEIGHT: f64 = 0.45;

/// Upper bound on a plausible per-cycle CO2 value in g/mi. A value above
/// this (or at/below zero) signals an upstream unit error, not a real car.
pub const MAX_PLAUSIBLE_CO2_GPM: f64 = 2000.0;

/// Run-level knobs recorded in dataset metadata and model bundles.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Temporal split boundary: model years <= `split_year` train,
    /// later years are held out for testing.
    pub split_year: u16,
    /// Seed for the tree ensemble's internal row sampling.
    pub seed: u64,
    /// Run-level abort threshold: if the fraction of dropped configurations
    /// exceeds this, the run fails (likely upstream schema change).
    pub max_drop_fraction: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            split_year: 2021,
            seed: 42,
            max_drop_fraction: 0.5,
        }
    }
}
