//! Reproducible EPA CO2 architecture modeling pipeline.
//!
//! Builds a vehicle-level dataset from raw EPA certification test records
//! and fits linear and gradient-boosted regressors estimating combined
//! CO2 (g/mi) from early-phase architecture parameters.

pub mod config;
pub mod encoder;
pub mod error;
pub mod loader;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod trainer;
