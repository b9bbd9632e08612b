//! CLI entry point for the EPA CO2 architecture modeling pipeline.
//!
//! Provides subcommands for building the labeled dataset from raw EPA
//! certification files, training and evaluating the regression models, and
//! serving ad-hoc what-if predictions from a saved model bundle.

use anyhow::Result;
use clap::{Parser, Subcommand};
use epa_co2_arch::config::PipelineConfig;
use epa_co2_arch::encoder::PredictionInput;
use epa_co2_arch::loader::load_raw_dir;
use epa_co2_arch::model::ModelBundle;
use epa_co2_arch::output::{read_dataset_csv, write_dataset_csv, write_json};
use epa_co2_arch::pipeline::split::split_by_year;
use epa_co2_arch::pipeline::types::DropLog;
use epa_co2_arch::pipeline::{build_dataset, dataset_metadata};
use epa_co2_arch::trainer::train_models;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "epa_co2_arch")]
#[command(about = "Build EPA CO2 datasets and fit architecture regression models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the labeled vehicle-configuration dataset from raw EPA files
    BuildDataset {
        /// Directory containing raw EPA certification CSV files
        #[arg(short, long, default_value = "data/raw")]
        raw_dir: PathBuf,

        /// Output path for the labeled dataset CSV
        #[arg(short, long, default_value = "artifacts/epa_co2_architecture_v1.csv")]
        output: PathBuf,

        /// Output path for the dataset metadata JSON
        #[arg(short, long, default_value = "artifacts/epa_co2_architecture_v1_metadata.json")]
        metadata: PathBuf,

        /// Temporal split boundary recorded in the metadata
        #[arg(long, default_value_t = 2021)]
        split_year: u16,

        /// Abort if more than this fraction of configurations is dropped
        #[arg(long, default_value_t = 0.5)]
        max_drop_fraction: f64,
    },
    /// Train both regressors on a built dataset and write bundles + metrics
    Train {
        /// Path to the labeled dataset CSV
        #[arg(short, long, default_value = "artifacts/epa_co2_architecture_v1.csv")]
        dataset: PathBuf,

        /// Directory to write model bundles into
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,

        /// Output path for the metrics report JSON
        #[arg(short, long, default_value = "artifacts/metrics_v1.json")]
        report: PathBuf,

        /// Temporal split boundary: years <= this train, later years test
        #[arg(long, default_value_t = 2021)]
        split_year: u16,

        /// Seed for the tree ensemble's row sampling
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Predict combined CO2 for one what-if configuration
    Predict {
        /// Path to a saved model bundle JSON
        #[arg(short, long)]
        bundle: PathBuf,

        #[arg(long)]
        model_year: u16,

        /// Engine displacement in liters
        #[arg(long)]
        displacement: f64,

        /// Equivalent test weight in pounds
        #[arg(long)]
        test_weight: f64,

        /// Transmission bucket (e.g. AT, MT, CVT)
        #[arg(long)]
        transmission: String,

        /// Drive bucket (e.g. FWD, RWD, AWD)
        #[arg(long)]
        drive: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/epa_co2_arch.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("epa_co2_arch.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::BuildDataset {
            raw_dir,
            output,
            metadata,
            split_year,
            max_drop_fraction,
        } => {
            let config = PipelineConfig {
                split_year,
                max_drop_fraction,
                ..PipelineConfig::default()
            };
            run_build_dataset(&raw_dir, &output, &metadata, &config)?;
        }
        Commands::Train {
            dataset,
            models_dir,
            report,
            split_year,
            seed,
        } => {
            let config = PipelineConfig {
                split_year,
                seed,
                ..PipelineConfig::default()
            };
            run_train(&dataset, &models_dir, &report, &config)?;
        }
        Commands::Predict {
            bundle,
            model_year,
            displacement,
            test_weight,
            transmission,
            drive,
        } => {
            let input = PredictionInput {
                model_year,
                displacement_l: displacement,
                test_weight_lbs: test_weight,
                transmission,
                drive,
            };
            run_predict(&bundle, &input)?;
        }
    }

    Ok(())
}

/// Load → Aggregate → BuildTarget, then persist the table and metadata.
#[tracing::instrument(skip_all, fields(raw_dir = %raw_dir.display()))]
fn run_build_dataset(
    raw_dir: &Path,
    output: &Path,
    metadata_path: &Path,
    config: &PipelineConfig,
) -> Result<()> {
    let mut drops = DropLog::default();
    let records = load_raw_dir(raw_dir, &mut drops)?;
    let examples = build_dataset(&records, config, &mut drops)?;

    for key in &drops.missing_cycle {
        warn!(key = %key, "Dropped: missing cycle");
    }
    for key in &drops.implausible {
        warn!(key = %key, "Dropped: implausible value");
    }

    write_dataset_csv(output, &examples)?;
    write_json(metadata_path, &dataset_metadata(&examples, config, &drops))?;

    info!(
        rows = examples.len(),
        dropped = drops.dropped_configurations(),
        malformed = drops.malformed_rows,
        "Dataset build complete"
    );
    Ok(())
}

/// Split → Train → Evaluate, then persist bundles and the metrics report.
#[tracing::instrument(skip_all, fields(dataset = %dataset.display()))]
fn run_train(
    dataset: &Path,
    models_dir: &Path,
    report_path: &Path,
    config: &PipelineConfig,
) -> Result<()> {
    let rows = read_dataset_csv(dataset)?;
    let split = split_by_year(rows, config.split_year);
    let outcome = train_models(&split, config)?;

    outcome.linear.save(&models_dir.join("linear_regression.json"))?;
    outcome.gbt.save(&models_dir.join("gradient_boosted_trees.json"))?;
    write_json(report_path, &outcome.report)?;

    for model in &outcome.report.models {
        info!(
            model = %model.model,
            r2 = model.metrics.r2,
            mae = model.metrics.mae,
            rmse = model.metrics.rmse,
            "Test-set metrics"
        );
    }
    for coef in &outcome.report.linear_coefficients {
        info!(feature = %coef.feature, value = coef.value, "Linear coefficient");
    }

    Ok(())
}

/// The inference-UI load contract: bundle + persisted schema, hard failure
/// on categories the model never saw.
#[tracing::instrument(skip_all, fields(bundle = %bundle_path.display()))]
fn run_predict(bundle_path: &Path, input: &PredictionInput) -> Result<()> {
    let bundle = ModelBundle::load(bundle_path)?;
    let prediction = bundle.predict_input(input)?;

    info!(
        model = bundle.model.name(),
        model_year = input.model_year,
        displacement_l = input.displacement_l,
        test_weight_lbs = input.test_weight_lbs,
        transmission = %input.transmission,
        drive = %input.drive,
        co2_combined_gpm = prediction,
        "Prediction"
    );
    println!("{prediction:.1}");

    Ok(())
}
