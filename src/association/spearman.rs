//! Spearman rank correlation

use super::pearson::correlate;
use super::{AssociationMeasure, Measurement};
use ndarray::{Array1, ArrayView1};
use std::cmp::Ordering;

/// Pearson correlation of average ranks; captures monotonic association
#[derive(Debug, Clone, Copy, Default)]
pub struct SpearmanCorrelation;

impl AssociationMeasure for SpearmanCorrelation {
    fn name(&self) -> &'static str {
        "spearman"
    }

    fn measure(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> Measurement {
        let rx = average_ranks(x);
        let ry = average_ranks(y);
        correlate(rx.view(), ry.view())
    }
}

/// 1-based ranks; tied values share the mean of the ranks they span
pub fn average_ranks(values: ArrayView1<f64>) -> Array1<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = Array1::zeros(n);
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // positions i..j (0-based) hold ranks i+1..=j
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }

    ranks
}
