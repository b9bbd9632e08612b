//! Temporal train/test partitioning.

use crate::pipeline::types::LabeledExample;
use tracing::info;

/// A leakage-free temporal partition of the labeled table.
#[derive(Debug, Clone)]
pub struct Split {
    pub split_year: u16,
    pub train: Vec<LabeledExample>,
    pub test: Vec<LabeledExample>,
}

/// Partitions rows by model year: `year <= split_year` trains, later years
/// are held out. No shuffling, no drops — every input row lands on exactly
/// one side.
pub fn split_by_year(rows: Vec<LabeledExample>, split_year: u16) -> Split {
    let (train, test): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|row| row.model_year <= split_year);

    info!(
        split_year,
        train_rows = train.len(),
        test_rows = test.len(),
        "Temporal split complete"
    );

    Split {
        split_year,
        train,
        test,
    }
}
