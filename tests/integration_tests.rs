//! End-to-end pipeline tests over synthetic raw EPA files.

use epa_co2_arch::config::PipelineConfig;
use epa_co2_arch::loader::load_raw_dir;
use epa_co2_arch::output::{read_dataset_csv, write_dataset_csv};
use epa_co2_arch::pipeline::build_dataset;
use epa_co2_arch::pipeline::split::split_by_year;
use epa_co2_arch::pipeline::types::{DropLog, LabeledExample};
use epa_co2_arch::trainer::train_models;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

const HEADER: &str = "Model Year,Test Veh Displacement (L),Equivalent Test Weight (lbs.),Test Fuel Type Description,Tested Transmission Type,Drive System Code,Test Category,CO2 (g/mi)";

struct RawRow {
    year: u16,
    displacement: f64,
    weight: f64,
    transmission: &'static str,
    drive: &'static str,
    category: &'static str,
    co2: f64,
}

fn render_csv(rows: &[RawRow]) -> String {
    let mut body = String::from(HEADER);
    body.push('\n');
    for r in rows {
        writeln!(
            body,
            "{},{},{},Tier 2 Cert Gasoline,{},{},{},{}",
            r.year, r.displacement, r.weight, r.transmission, r.drive, r.category, r.co2
        )
        .unwrap();
    }
    body
}

/// Ten configurations spanning 2019-2023 with a target that is exactly
/// linear in displacement and weight, plus hand-computable cycle values.
fn synthetic_fleet() -> Vec<RawRow> {
    let mut rows = Vec::new();
    let buckets: [(&str, &str); 2] = [("Automatic 8-spd", "F"), ("Manual 6-spd", "R")];

    for (i, year) in (2019..=2023).enumerate() {
        for (j, (transmission, drive)) in buckets.iter().copied().enumerate() {
            let displacement = 1.5 + 0.5 * j as f64 + 0.1 * i as f64;
            let weight = 3000.0 + 200.0 * i as f64 + 150.0 * j as f64;
            let city = 120.0 + 50.0 * displacement + 0.04 * weight;
            let hwy = 90.0 + 35.0 * displacement + 0.025 * weight;

            rows.push(RawRow {
                year,
                displacement,
                weight,
                transmission,
                drive,
                category: "FTP",
                co2: city,
            });
            rows.push(RawRow {
                year,
                displacement,
                weight,
                transmission,
                drive,
                category: "HWY",
                co2: hwy,
            });
        }
    }
    rows
}

fn temp_raw_dir(name: &str, files: &[(&str, String)]) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    for (file_name, body) in files {
        fs::write(dir.join(file_name), body).unwrap();
    }
    dir
}

fn build_from_dir(dir: &PathBuf, config: &PipelineConfig) -> (Vec<LabeledExample>, DropLog) {
    let mut drops = DropLog::default();
    let records = load_raw_dir(dir, &mut drops).unwrap();
    let examples = build_dataset(&records, config, &mut drops).unwrap();
    (examples, drops)
}

#[test]
fn test_full_pipeline_combined_target_and_split() {
    let dir = temp_raw_dir(
        "epa_co2_arch_e2e_full",
        &[("fleet_2019_2023.csv", render_csv(&synthetic_fleet()))],
    );
    let config = PipelineConfig::default();
    let (examples, drops) = build_from_dir(&dir, &config);

    assert_eq!(examples.len(), 10);
    assert_eq!(drops.dropped_configurations(), 0);

    // Target is always the 55/45 blend of the two cycle columns.
    for row in &examples {
        let expected = 0.55 * row.co2_city_gpm + 0.45 * row.co2_hwy_gpm;
        assert!((row.co2_combined_gpm - expected).abs() < 1e-9);
    }

    // Temporal split properties: disjoint by year, nothing lost.
    let total = examples.len();
    let split = split_by_year(examples, config.split_year);
    assert!(split.train.iter().all(|r| r.model_year <= 2021));
    assert!(split.test.iter().all(|r| r.model_year >= 2022));
    assert_eq!(split.train.len() + split.test.len(), total);
    assert_eq!(split.train.len(), 6);
    assert_eq!(split.test.len(), 4);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_end_to_end_training_metrics() {
    let dir = temp_raw_dir(
        "epa_co2_arch_e2e_train",
        &[("fleet.csv", render_csv(&synthetic_fleet()))],
    );
    let config = PipelineConfig::default();
    let (examples, _) = build_from_dir(&dir, &config);

    let split = split_by_year(examples, config.split_year);
    let outcome = train_models(&split, &config).unwrap();

    // The target is exactly linear in the features, so the linear model's
    // held-out MAE is numerical noise — the hand-computed value is zero.
    let linear = &outcome.report.models[0];
    assert_eq!(linear.model, "linear_regression");
    assert!(linear.metrics.mae < 0.1, "mae = {}", linear.metrics.mae);
    assert!(linear.metrics.r2 > 0.999);

    let gbt = &outcome.report.models[1];
    assert_eq!(gbt.model, "gradient_boosted_trees");
    assert!(gbt.metrics.rmse.is_finite());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_city_only_configuration_is_dropped_and_logged() {
    let mut fleet = synthetic_fleet();
    // A 2024 configuration with only a city-cycle test.
    fleet.push(RawRow {
        year: 2024,
        displacement: 3.5,
        weight: 4500.0,
        transmission: "Automatic 8-spd",
        drive: "4",
        category: "FTP",
        co2: 400.0,
    });

    let dir = temp_raw_dir(
        "epa_co2_arch_e2e_cityonly",
        &[("fleet.csv", render_csv(&fleet))],
    );
    let (examples, drops) = build_from_dir(&dir, &PipelineConfig::default());

    assert_eq!(examples.len(), 10);
    assert!(examples.iter().all(|r| r.model_year != 2024));
    assert_eq!(drops.missing_cycle.len(), 1);
    assert!(drops.missing_cycle[0].starts_with("2024/"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_pipeline_is_idempotent() {
    let dir = temp_raw_dir(
        "epa_co2_arch_e2e_idempotent",
        &[("fleet.csv", render_csv(&synthetic_fleet()))],
    );
    let config = PipelineConfig::default();

    let (first, _) = build_from_dir(&dir, &config);
    let (second, _) = build_from_dir(&dir, &config);
    assert_eq!(first, second);

    let report_a = train_models(&split_by_year(first, config.split_year), &config)
        .unwrap()
        .report;
    let report_b = train_models(&split_by_year(second, config.split_year), &config)
        .unwrap()
        .report;

    assert_eq!(report_a.models[0].metrics, report_b.models[0].metrics);
    assert_eq!(report_a.models[1].metrics, report_b.models[1].metrics);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_dataset_artifact_round_trips_through_csv() {
    let dir = temp_raw_dir(
        "epa_co2_arch_e2e_artifact",
        &[("fleet.csv", render_csv(&synthetic_fleet()))],
    );
    let config = PipelineConfig::default();
    let (examples, _) = build_from_dir(&dir, &config);

    let csv_path = dir.join("dataset.csv");
    write_dataset_csv(&csv_path, &examples).unwrap();
    let restored = read_dataset_csv(&csv_path).unwrap();

    // Training from the persisted artifact matches training from memory.
    let outcome_mem = train_models(&split_by_year(examples, config.split_year), &config).unwrap();
    let outcome_csv = train_models(&split_by_year(restored, config.split_year), &config).unwrap();
    assert_eq!(
        outcome_mem.report.models[0].metrics,
        outcome_csv.report.models[0].metrics
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_records_load_across_multiple_files() {
    let fleet = synthetic_fleet();
    let (early, late): (Vec<_>, Vec<_>) = fleet.into_iter().partition(|r| r.year <= 2021);

    let dir = temp_raw_dir(
        "epa_co2_arch_e2e_multifile",
        &[
            ("epa_2019_2021.csv", render_csv(&early)),
            ("epa_2022_2023.csv", render_csv(&late)),
        ],
    );
    let (examples, _) = build_from_dir(&dir, &PipelineConfig::default());

    assert_eq!(examples.len(), 10);
    fs::remove_dir_all(&dir).unwrap();
}
