//! Regression decision tree, the base learner for the boosted ensemble.
//!
//! Splits minimize weighted MSE using incremental sum/sum-of-squares
//! statistics per candidate threshold. Leaves predict the mean target.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Tree growth limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_leaf: 1,
        }
    }
}

/// A fitted regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    params: TreeParams,
    root: TreeNode,
}

impl RegressionTree {
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, params: TreeParams) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Shape {
                expected: format!("{} targets", x.nrows()),
                actual: format!("{} targets", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(PipelineError::Shape {
                expected: "at least 1 training sample".to_string(),
                actual: "0 samples".to_string(),
            });
        }

        let indices: Vec<usize> = (0..x.nrows()).collect();
        let root = build_node(x, y, &indices, 0, &params);
        Ok(Self { params, root })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        (0..x.nrows())
            .map(|i| predict_one(&self.root, &x.row(i).to_vec()))
            .collect()
    }

    pub fn params(&self) -> TreeParams {
        self.params
    }
}

fn predict_one(node: &TreeNode, sample: &[f64]) -> f64 {
    match node {
        TreeNode::Leaf { value } => *value,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
        } => {
            if sample[*feature_idx] <= *threshold {
                predict_one(left, sample)
            } else {
                predict_one(right, sample)
            }
        }
    }
}

fn build_node(
    x: &Array2<f64>,
    y: &Array1<f64>,
    indices: &[usize],
    depth: usize,
    params: &TreeParams,
) -> TreeNode {
    let targets: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
    let leaf_value = mean(&targets);

    if depth >= params.max_depth
        || indices.len() < 2 * params.min_samples_leaf
        || is_pure(&targets)
    {
        return TreeNode::Leaf { value: leaf_value };
    }

    let Some((feature_idx, threshold)) = best_split(x, y, indices, params) else {
        return TreeNode::Leaf { value: leaf_value };
    };

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| x[[i, feature_idx]] <= threshold);

    if left_indices.len() < params.min_samples_leaf || right_indices.len() < params.min_samples_leaf
    {
        return TreeNode::Leaf { value: leaf_value };
    }

    TreeNode::Split {
        feature_idx,
        threshold,
        left: Box::new(build_node(x, y, &left_indices, depth + 1, params)),
        right: Box::new(build_node(x, y, &right_indices, depth + 1, params)),
    }
}

/// Scans every feature for the threshold with the largest variance
/// reduction, using running sums instead of re-slicing the data.
fn best_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    indices: &[usize],
    params: &TreeParams,
) -> Option<(usize, f64)> {
    let n = indices.len() as f64;
    let parent_impurity = {
        let targets: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        variance(&targets)
    };

    let mut best: Option<(usize, f64, f64)> = None;

    for feature_idx in 0..x.ncols() {
        let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for window in values.windows(2) {
            let threshold = (window[0] + window[1]) / 2.0;

            let mut left_count = 0usize;
            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            let mut right_count = 0usize;
            let mut right_sum = 0.0;
            let mut right_sq = 0.0;

            for &idx in indices {
                let yi = y[idx];
                if x[[idx, feature_idx]] <= threshold {
                    left_count += 1;
                    left_sum += yi;
                    left_sq += yi * yi;
                } else {
                    right_count += 1;
                    right_sum += yi;
                    right_sq += yi * yi;
                }
            }

            if left_count < params.min_samples_leaf || right_count < params.min_samples_leaf {
                continue;
            }

            let weighted = (left_count as f64 * impurity(left_count, left_sum, left_sq)
                + right_count as f64 * impurity(right_count, right_sum, right_sq))
                / n;
            let gain = parent_impurity - weighted;

            let improved = match best {
                Some((_, _, best_gain)) => gain > best_gain,
                None => gain > 0.0,
            };
            if improved {
                best = Some((feature_idx, threshold, gain));
            }
        }
    }

    best.map(|(feature_idx, threshold, _)| (feature_idx, threshold))
}

/// Var = E[X^2] - E[X]^2 from running sums.
fn impurity(count: usize, sum: f64, sq_sum: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    (sq_sum / n - (sum / n).powi(2)).max(0.0)
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn is_pure(values: &[f64]) -> bool {
    match values.first() {
        None => true,
        Some(&first) => values.iter().all(|&v| (v - first).abs() < 1e-12),
    }
}
