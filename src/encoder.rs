//! Versioned feature encoding.
//!
//! The encoding is an explicit schema object serialized alongside each
//! fitted model, never an implicit ordering inferred from whatever
//! categories happened to appear in a run. Numeric features pass through
//! unchanged; categoricals are one-hot encoded over a sorted category list.

use crate::error::{PipelineError, Result};
use crate::pipeline::types::LabeledExample;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Bumped whenever the encoding layout changes incompatibly.
pub const SCHEMA_VERSION: u8 = 1;

/// One categorical feature and its known categories, in encoding order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalField {
    pub name: String,
    /// Sorted, deduplicated categories seen at fit time.
    pub categories: Vec<String>,
}

/// The full feature schema a model was trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSchema {
    pub version: u8,
    pub numeric: Vec<String>,
    pub categorical: Vec<CategoricalField>,
}

/// Raw inference-time input, encoded through the persisted schema so it
/// matches training-time encoding exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionInput {
    pub model_year: u16,
    pub displacement_l: f64,
    pub test_weight_lbs: f64,
    pub transmission: String,
    pub drive: String,
}

impl EncodingSchema {
    /// Fits the schema from training rows: numeric names are fixed,
    /// category lists are collected and sorted for determinism.
    pub fn fit(rows: &[LabeledExample]) -> Self {
        let transmissions: BTreeSet<String> =
            rows.iter().map(|r| r.transmission.clone()).collect();
        let drives: BTreeSet<String> = rows.iter().map(|r| r.drive.clone()).collect();

        Self {
            version: SCHEMA_VERSION,
            numeric: vec![
                "model_year".to_string(),
                "displacement_l".to_string(),
                "test_weight_lbs".to_string(),
            ],
            categorical: vec![
                CategoricalField {
                    name: "transmission".to_string(),
                    categories: transmissions.into_iter().collect(),
                },
                CategoricalField {
                    name: "drive".to_string(),
                    categories: drives.into_iter().collect(),
                },
            ],
        }
    }

    /// Ordered names of the encoded feature columns.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric.clone();
        for field in &self.categorical {
            for category in &field.categories {
                names.push(format!("{}={}", field.name, category));
            }
        }
        names
    }

    /// Total number of encoded columns.
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|f| f.categories.len())
                .sum::<usize>()
    }

    /// Encodes one labeled row into the model's feature space.
    pub fn encode_row(&self, row: &LabeledExample) -> Result<Vec<f64>> {
        self.encode_parts(
            row.model_year,
            row.displacement_l,
            row.test_weight_lbs,
            &row.transmission,
            &row.drive,
        )
    }

    /// Encodes an inference-time input.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownCategory`] for a category the model
    /// never saw during training. Hard failure, never a default.
    pub fn encode_input(&self, input: &PredictionInput) -> Result<Vec<f64>> {
        self.encode_parts(
            input.model_year,
            input.displacement_l,
            input.test_weight_lbs,
            &input.transmission,
            &input.drive,
        )
    }

    /// Encodes a batch of rows into a design matrix plus the target vector.
    pub fn encode_table(&self, rows: &[LabeledExample]) -> Result<(Array2<f64>, Array1<f64>)> {
        let mut flat = Vec::with_capacity(rows.len() * self.width());
        let mut y = Vec::with_capacity(rows.len());

        for row in rows {
            flat.extend(self.encode_row(row)?);
            y.push(row.co2_combined_gpm);
        }

        let x = Array2::from_shape_vec((rows.len(), self.width()), flat).map_err(|e| {
            PipelineError::Shape {
                expected: format!("{} x {}", rows.len(), self.width()),
                actual: e.to_string(),
            }
        })?;

        Ok((x, Array1::from_vec(y)))
    }

    /// Recovers the category from a one-hot slice, for audit round-trips.
    pub fn decode_one_hot(&self, field_name: &str, hot: &[f64]) -> Option<&str> {
        let field = self.categorical.iter().find(|f| f.name == field_name)?;
        if hot.len() != field.categories.len() {
            return None;
        }
        let idx = hot.iter().position(|&v| v == 1.0)?;
        Some(&field.categories[idx])
    }

    fn encode_parts(
        &self,
        model_year: u16,
        displacement_l: f64,
        test_weight_lbs: f64,
        transmission: &str,
        drive: &str,
    ) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(self.width());
        out.push(model_year as f64);
        out.push(displacement_l);
        out.push(test_weight_lbs);

        let values = [transmission, drive];
        for (field, value) in self.categorical.iter().zip(values) {
            out.extend(one_hot(field, value)?);
        }
        Ok(out)
    }
}

fn one_hot(field: &CategoricalField, value: &str) -> Result<Vec<f64>> {
    let idx = field
        .categories
        .iter()
        .position(|c| c == value)
        .ok_or_else(|| PipelineError::UnknownCategory {
            feature: field.name.clone(),
            value: value.to_string(),
        })?;

    let mut hot = vec![0.0; field.categories.len()];
    hot[idx] = 1.0;
    Ok(hot)
}
