//! Kraskov-Stögbauer-Grassberger mutual information estimator
//!
//! Continuous-continuous estimate (algorithm 1 of Kraskov et al., 2004):
//!
//! `I(X; Y) = psi(n) + psi(k) - < psi(n_x + 1) + psi(n_y + 1) >`
//!
//! where for every point the distance to its k-th nearest neighbour in the
//! joint space (max-norm) bounds the marginal neighbour counts `n_x`, `n_y`.
//! Both series are standardized first and receive a tiny seeded jitter so
//! exact ties do not collapse neighbour distances; the result is therefore
//! deterministic for a given `random_state`. Estimates are clamped at zero.

use super::{AssociationMeasure, Measurement, Statistic, MIN_SAMPLES};
use super::pearson::is_constant;
use ndarray::{Array1, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use statrs::function::gamma::digamma;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Default neighbourhood size
pub const DEFAULT_NEIGHBORS: usize = 3;

const JITTER_SCALE: f64 = 1e-10;

/// Distance wrapper ordered for a max-heap
#[derive(Debug, Clone, Copy)]
struct Distance(f64);

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Distance {}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Distance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Fixed-k nearest-neighbour mutual information estimator (nats)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KraskovEstimator {
    /// Neighbourhood size; capped at `n - 2` for short series
    n_neighbors: usize,
    /// Seed for tie-breaking jitter
    random_state: u64,
}

impl KraskovEstimator {
    /// Create an estimator with `n_neighbors` neighbours
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            random_state: 0,
        }
    }

    /// Set the jitter seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Estimate mutual information between paired samples
    pub fn estimate(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> Statistic {
        let n = x.len().min(y.len());
        if n < MIN_SAMPLES {
            return Statistic::Undefined;
        }
        // a constant carries no information about anything
        if is_constant(x) || is_constant(y) {
            return Statistic::Defined(0.0);
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.random_state);
        let xs = standardize_with_jitter(x.slice(ndarray::s![..n]), &mut rng);
        let ys = standardize_with_jitter(y.slice(ndarray::s![..n]), &mut rng);

        // at k = n - 1 the k-th neighbour is always the farthest point and
        // every marginal count is trivial
        let k = self.n_neighbors.min(n - 2);
        Statistic::from_value(kraskov(&xs, &ys, k).max(0.0))
    }
}

impl Default for KraskovEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_NEIGHBORS)
    }
}

impl AssociationMeasure for KraskovEstimator {
    fn name(&self) -> &'static str {
        "mutual_information"
    }

    fn measure(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> Measurement {
        Measurement {
            statistic: self.estimate(x, y),
            p_value: Statistic::Undefined,
        }
    }
}

/// De-mean, scale to unit variance, then add seeded jitter
fn standardize_with_jitter(values: ArrayView1<f64>, rng: &mut Xoshiro256PlusPlus) -> Array1<f64> {
    let n = values.len() as f64;
    // unit max-abs first so the moments stay finite for huge inputs
    let peak = values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let peak = if peak > 0.0 && peak.is_finite() { peak } else { 1.0 };
    let unit = values.mapv(|v| v / peak);

    let mean = unit.sum() / n;
    let std = (unit.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    let scale = if std > 0.0 { std } else { 1.0 };

    let mut out = unit.mapv(|v| (v - mean) / scale);
    let amplitude = JITTER_SCALE * out.iter().map(|v| v.abs()).sum::<f64>().max(n) / n;
    out.mapv_inplace(|v| v + amplitude * rng.gen_range(-1.0..1.0));
    out
}

/// Raw KSG estimate over prepared samples, `O(n log n)` for dependent data.
///
/// Neighbour search walks outward from each point along the x-sorted order
/// and stops once the x gap alone reaches the current k-th distance.
/// Marginal counts are two binary searches per axis.
fn kraskov(xs: &Array1<f64>, ys: &Array1<f64>, k: usize) -> f64 {
    let n = xs.len();
    let x_axis = SortedAxis::new(xs);
    let y_axis = SortedAxis::new(ys);

    let marginal_sum: f64 = (0..n)
        .map(|i| {
            let eps = kth_joint_distance(xs, ys, &x_axis, i, k);
            let nx = x_axis.count_within(i, eps);
            let ny = y_axis.count_within(i, eps);
            digamma((nx + 1) as f64) + digamma((ny + 1) as f64)
        })
        .sum();

    digamma(n as f64) + digamma(k as f64) - marginal_sum / n as f64
}

/// One marginal in ascending order
struct SortedAxis {
    /// Sample index at each sorted position
    order: Vec<usize>,
    /// Values in ascending order
    values: Vec<f64>,
    /// Sorted position of each sample index
    rank: Vec<usize>,
}

impl SortedAxis {
    fn new(values: &Array1<f64>) -> Self {
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));

        let mut rank = vec![0usize; order.len()];
        for (pos, &idx) in order.iter().enumerate() {
            rank[idx] = pos;
        }
        let sorted = order.iter().map(|&idx| values[idx]).collect();

        Self {
            order,
            values: sorted,
            rank,
        }
    }

    /// Number of other samples strictly closer than `eps` to sample `i`
    fn count_within(&self, i: usize, eps: f64) -> usize {
        let pos = self.rank[i];
        let centre = self.values[pos];
        let above = self.values[pos + 1..].partition_point(|&v| (centre - v).abs() < eps);
        let below = pos - self.values[..pos].partition_point(|&v| (centre - v).abs() >= eps);
        above + below
    }
}

/// Max-norm distance from point `i` to its k-th nearest neighbour
fn kth_joint_distance(
    xs: &Array1<f64>,
    ys: &Array1<f64>,
    x_axis: &SortedAxis,
    i: usize,
    k: usize,
) -> f64 {
    let n = x_axis.values.len();
    let centre = xs[i];
    let mut left = x_axis.rank[i];
    let mut right = left + 1;
    let mut heap: BinaryHeap<Distance> = BinaryHeap::with_capacity(k + 1);

    loop {
        let gap_left = (left > 0).then(|| centre - x_axis.values[left - 1]);
        let gap_right = (right < n).then(|| x_axis.values[right] - centre);
        let (dx, j) = match (gap_left, gap_right) {
            (Some(l), Some(r)) if l <= r => {
                left -= 1;
                (l, x_axis.order[left])
            }
            (Some(l), None) => {
                left -= 1;
                (l, x_axis.order[left])
            }
            (_, Some(r)) => {
                right += 1;
                (r, x_axis.order[right - 1])
            }
            (None, None) => break,
        };

        if heap.len() == k {
            if let Some(&Distance(worst)) = heap.peek() {
                // every remaining point is at least dx away in x
                if dx >= worst {
                    break;
                }
            }
        }

        let d = dx.max((ys[i] - ys[j]).abs());
        if heap.len() < k {
            heap.push(Distance(d));
        } else if let Some(&Distance(worst)) = heap.peek() {
            if d < worst {
                heap.pop();
                heap.push(Distance(d));
            }
        }
    }

    heap.peek().map(|d| d.0).unwrap_or(0.0)
}
