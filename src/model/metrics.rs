//! Regression evaluation metrics.
//!
//! Pure functions of (predictions, truth) with no hidden state. An empty
//! evaluation set is a loud error rather than vacuous numbers.

use crate::error::{PipelineError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Test-set metrics for one fitted regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub mae: f64,
    pub rmse: f64,
}

/// Computes R², MAE, and RMSE of predictions against truth.
///
/// # Errors
///
/// - [`PipelineError::EmptyTestSplit`] if there is nothing to evaluate.
/// - [`PipelineError::Shape`] if the two vectors disagree in length.
pub fn evaluate(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<RegressionMetrics> {
    if y_true.is_empty() {
        return Err(PipelineError::EmptyTestSplit);
    }
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::Shape {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }

    let n = y_true.len() as f64;
    let y_mean = y_true.sum() / n;

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - y_mean).powi(2)).sum();

    // A constant truth vector has no variance to explain.
    let r2 = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    let mae = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / n;

    let rmse = (ss_res / n).sqrt();

    Ok(RegressionMetrics { r2, mae, rmse })
}
