//! Batch model training and evaluation over a temporal split.

use crate::config::PipelineConfig;
use crate::encoder::EncodingSchema;
use crate::error::{PipelineError, Result};
use crate::model::gbt::{GbtConfig, GradientBoostedTrees};
use crate::model::linear::LinearRegression;
use crate::model::metrics::{evaluate, RegressionMetrics};
use crate::model::{ModelBundle, Regressor};
use crate::pipeline::split::Split;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One linear coefficient, reported in original feature units so partial
/// effects are human-checkable (weight up → CO2 up, and so on).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoefficientEntry {
    pub feature: String,
    pub value: f64,
}

/// Test-set result for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReport {
    pub model: String,
    pub metrics: RegressionMetrics,
}

/// The full metrics report: both models scored on the same test rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainReport {
    pub generated_at: DateTime<Utc>,
    pub split_year: u16,
    pub seed: u64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub feature_names: Vec<String>,
    pub models: Vec<ModelReport>,
    pub linear_intercept: f64,
    pub linear_coefficients: Vec<CoefficientEntry>,
}

/// Everything training produces: two bundles plus the comparison report.
#[derive(Debug)]
pub struct TrainOutcome {
    pub linear: ModelBundle,
    pub gbt: ModelBundle,
    pub report: TrainReport,
}

/// Fits the encoding schema on the training rows, trains both regressors
/// on identical (features, target) data, and evaluates them on the held-out
/// test rows.
///
/// # Errors
///
/// Fails loudly if either side of the split is empty — metrics over
/// nothing would be vacuous.
pub fn train_models(split: &Split, config: &PipelineConfig) -> Result<TrainOutcome> {
    if split.train.is_empty() {
        return Err(PipelineError::Shape {
            expected: "non-empty training split".to_string(),
            actual: "0 rows".to_string(),
        });
    }
    if split.test.is_empty() {
        return Err(PipelineError::EmptyTestSplit);
    }

    let encoding = EncodingSchema::fit(&split.train);
    let (x_train, y_train) = encoding.encode_table(&split.train)?;
    let (x_test, y_test) = encoding.encode_table(&split.test)?;

    info!(
        train_rows = split.train.len(),
        test_rows = split.test.len(),
        features = encoding.width(),
        "Training both regressors"
    );

    let linear_model = LinearRegression::fit(&x_train, &y_train)?;
    let linear_metrics = evaluate(&y_test, &linear_model.predict(&x_test))?;

    let gbt_config = GbtConfig {
        seed: config.seed,
        ..GbtConfig::default()
    };
    let gbt_model = GradientBoostedTrees::fit(&x_train, &y_train, gbt_config)?;
    let gbt_metrics = evaluate(&y_test, &gbt_model.predict(&x_test))?;

    info!(
        linear_r2 = linear_metrics.r2,
        linear_mae = linear_metrics.mae,
        gbt_r2 = gbt_metrics.r2,
        gbt_mae = gbt_metrics.mae,
        "Evaluation complete"
    );

    let feature_names = encoding.feature_names();
    let linear_coefficients = feature_names
        .iter()
        .zip(linear_model.coefficients.iter())
        .map(|(feature, &value)| CoefficientEntry {
            feature: feature.clone(),
            value,
        })
        .collect();

    let report = TrainReport {
        generated_at: Utc::now(),
        split_year: split.split_year,
        seed: config.seed,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        feature_names,
        models: vec![
            ModelReport {
                model: "linear_regression".to_string(),
                metrics: linear_metrics,
            },
            ModelReport {
                model: "gradient_boosted_trees".to_string(),
                metrics: gbt_metrics,
            },
        ],
        linear_intercept: linear_model.intercept,
        linear_coefficients,
    };

    let linear = ModelBundle::new(
        Regressor::Linear(linear_model),
        encoding.clone(),
        split.split_year,
        config.seed,
    );
    let gbt = ModelBundle::new(
        Regressor::GradientBoosting(gbt_model),
        encoding,
        split.split_year,
        config.seed,
    );

    Ok(TrainOutcome { linear, gbt, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::split::split_by_year;
    use crate::pipeline::types::LabeledExample;

    /// Synthetic table with an exactly linear target so OLS recovers it.
    fn synthetic_rows() -> Vec<LabeledExample> {
        let mut rows = Vec::new();
        for (i, year) in (2019..=2023).enumerate() {
            for (j, (transmission, drive)) in
                [("AT", "FWD"), ("MT", "RWD"), ("CVT", "AWD")].iter().enumerate()
            {
                let displacement = 1.5 + 0.5 * j as f64;
                let weight = 3000.0 + 250.0 * i as f64 + 100.0 * j as f64;
                let city = 150.0 + 40.0 * displacement + 0.03 * weight;
                let hwy = 100.0 + 30.0 * displacement + 0.02 * weight;
                rows.push(LabeledExample {
                    model_year: year,
                    displacement_l: displacement,
                    test_weight_lbs: weight,
                    transmission: transmission.to_string(),
                    drive: drive.to_string(),
                    co2_city_gpm: city,
                    co2_hwy_gpm: hwy,
                    co2_combined_gpm: 0.55 * city + 0.45 * hwy,
                });
            }
        }
        rows
    }

    #[test]
    fn test_linear_model_recovers_linear_target() {
        let split = split_by_year(synthetic_rows(), 2021);
        let config = PipelineConfig::default();

        let outcome = train_models(&split, &config).unwrap();

        let linear = &outcome.report.models[0];
        assert_eq!(linear.model, "linear_regression");
        // Target is exactly linear in the features, so held-out error is
        // numerical noise.
        assert!(linear.metrics.mae < 0.1, "mae = {}", linear.metrics.mae);
        assert!(linear.metrics.r2 > 0.999);
    }

    #[test]
    fn test_report_covers_both_models_and_coefficients() {
        let split = split_by_year(synthetic_rows(), 2021);
        let outcome = train_models(&split, &PipelineConfig::default()).unwrap();

        assert_eq!(outcome.report.models.len(), 2);
        assert_eq!(
            outcome.report.linear_coefficients.len(),
            outcome.report.feature_names.len()
        );

        // Displacement and weight both push CO2 up; signs must match
        // physical intuition.
        let coef = |name: &str| {
            outcome
                .report
                .linear_coefficients
                .iter()
                .find(|c| c.feature == name)
                .unwrap()
                .value
        };
        assert!(coef("displacement_l") > 0.0);
        assert!(coef("test_weight_lbs") > 0.0);
    }

    #[test]
    fn test_empty_test_split_fails_loudly() {
        // Everything is 2019-2023, so a 2030 boundary leaves no test rows.
        let split = split_by_year(synthetic_rows(), 2030);
        let err = train_models(&split, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyTestSplit));
    }

    #[test]
    fn test_training_is_deterministic() {
        let split = split_by_year(synthetic_rows(), 2021);
        let config = PipelineConfig::default();

        let a = train_models(&split, &config).unwrap();
        let b = train_models(&split, &config).unwrap();

        assert_eq!(a.report.models[1].metrics, b.report.models[1].metrics);
    }
}
