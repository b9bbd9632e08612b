//! Fitted models and the serialized bundle contract.
//!
//! A bundle couples a regressor with the exact [`EncodingSchema`] it was
//! trained on, so inference-time inputs are encoded identically to
//! training time. Bundles are plain JSON; the inference UI consumes them
//! through [`ModelBundle::load`].

pub mod gbt;
pub mod linear;
pub mod metrics;
pub mod tree;

use crate::encoder::{EncodingSchema, PredictionInput};
use crate::error::Result;
use chrono::{DateTime, Utc};
use gbt::GradientBoostedTrees;
use linear::LinearRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Bundle layout version.
pub const BUNDLE_VERSION: u8 = 1;

/// Either of the two trained regressors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear(LinearRegression),
    GradientBoosting(GradientBoostedTrees),
}

impl Regressor {
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        match self {
            Regressor::Linear(model) => model.predict(x),
            Regressor::GradientBoosting(model) => model.predict(x),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Regressor::Linear(_) => "linear_regression",
            Regressor::GradientBoosting(_) => "gradient_boosted_trees",
        }
    }
}

/// A trained regressor plus the feature schema it was trained on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub bundle_version: u8,
    pub trained_at: DateTime<Utc>,
    pub split_year: u16,
    pub seed: u64,
    pub encoding: EncodingSchema,
    pub model: Regressor,
}

impl ModelBundle {
    pub fn new(model: Regressor, encoding: EncodingSchema, split_year: u16, seed: u64) -> Self {
        Self {
            bundle_version: BUNDLE_VERSION,
            trained_at: Utc::now(),
            split_year,
            seed,
            encoding,
            model,
        }
    }

    /// Serializes the bundle as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), model = self.model.name(), "Model bundle saved");
        Ok(())
    }

    /// Loads a bundle written by [`ModelBundle::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let bundle: ModelBundle = serde_json::from_str(&json)?;
        info!(path = %path.display(), model = bundle.model.name(), "Model bundle loaded");
        Ok(bundle)
    }

    /// Encodes one ad-hoc input with the persisted schema and predicts.
    ///
    /// # Errors
    ///
    /// Fails hard with `UnknownCategory` if the input uses a category the
    /// model never saw in training.
    pub fn predict_input(&self, input: &PredictionInput) -> Result<f64> {
        let encoded = self.encoding.encode_input(input)?;
        let width = encoded.len();
        let x = Array2::from_shape_vec((1, width), encoded).map_err(|e| {
            crate::error::PipelineError::Shape {
                expected: format!("1 x {width}"),
                actual: e.to_string(),
            }
        })?;
        Ok(self.model.predict(&x)[0])
    }
}
