//! Association measures between a target series and candidate features
//!
//! Provides:
//! - Pearson correlation with a Student-t significance test
//! - Spearman rank correlation (average ranks for ties)
//! - Kraskov kNN mutual information
//! - [`AssociationCalculator`] applying all three to every candidate column
//!   of an aligned table set, plus full pairwise [`AssociationMatrix`] output
//!
//! Rows missing on either side of a pair are dropped for that pair only
//! (pairwise-complete observations).

mod calculator;
mod matrix;
mod mutual_info;
mod pearson;
mod spearman;
mod statistic;

pub use calculator::{AssociationCalculator, AssociationConfig, AssociationRecord};
pub use matrix::{AssociationMatrix, CorrelationMethod};
pub use mutual_info::{KraskovEstimator, DEFAULT_NEIGHBORS};
pub use pearson::PearsonCorrelation;
pub use spearman::{average_ranks, SpearmanCorrelation};
pub use statistic::{Statistic, UNDEFINED_MARKER};

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Fewest paired observations for which any statistic is defined
pub const MIN_SAMPLES: usize = 3;

/// A statistic together with its p-value, when one exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub statistic: Statistic,
    pub p_value: Statistic,
}

impl Measurement {
    /// Both fields undefined
    pub fn undefined() -> Self {
        Self {
            statistic: Statistic::Undefined,
            p_value: Statistic::Undefined,
        }
    }
}

/// Trait for pairwise association measures
pub trait AssociationMeasure: Send + Sync {
    /// Name used in records and logs
    fn name(&self) -> &'static str;

    /// Measure association between equally long, fully observed samples.
    ///
    /// Degenerate inputs yield undefined fields, never a panic.
    fn measure(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> Measurement;
}

/// Keep only positions where both series are observed
pub fn pairwise_complete(x: &[Option<f64>], y: &[Option<f64>]) -> (Array1<f64>, Array1<f64>) {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();
    (Array1::from(xs), Array1::from(ys))
}
