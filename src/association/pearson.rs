//! Pearson product-moment correlation with a Student-t significance test

use super::{AssociationMeasure, Measurement, Statistic, MIN_SAMPLES};
use ndarray::ArrayView1;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Linear association in [-1, 1]
#[derive(Debug, Clone, Copy, Default)]
pub struct PearsonCorrelation;

impl AssociationMeasure for PearsonCorrelation {
    fn name(&self) -> &'static str {
        "pearson"
    }

    fn measure(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> Measurement {
        correlate(x, y)
    }
}

/// Correlation and two-sided p-value for paired samples.
///
/// Undefined when fewer than [`MIN_SAMPLES`] pairs are given or either side
/// is constant.
pub(crate) fn correlate(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Measurement {
    let n = x.len().min(y.len());
    if n < MIN_SAMPLES || is_constant(x) || is_constant(y) {
        return Measurement::undefined();
    }

    // r is scale-invariant; unit max-abs keeps the moment sums finite
    let sx = max_abs(x);
    let sy = max_abs(y);
    if !(sx.is_finite() && sy.is_finite()) {
        return Measurement::undefined();
    }

    let nf = n as f64;
    let x_mean = x.iter().take(n).map(|v| v / sx).sum::<f64>() / nf;
    let y_mean = y.iter().take(n).map(|v| v / sy).sum::<f64>() / nf;

    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;

    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi / sx - x_mean;
        let dy = yi / sy - y_mean;
        sum_xy += dx * dy;
        sum_x2 += dx * dx;
        sum_y2 += dy * dy;
    }

    let denom = (sum_x2 * sum_y2).sqrt();
    if denom <= 0.0 || !denom.is_finite() {
        return Measurement::undefined();
    }

    let r = (sum_xy / denom).clamp(-1.0, 1.0);
    Measurement {
        statistic: Statistic::from_value(r),
        p_value: t_test_p_value(r, n),
    }
}

/// Two-sided p-value of `r` under H0: rho = 0, using
/// `t = r * sqrt((n - 2) / (1 - r^2))` with `n - 2` degrees of freedom.
pub(crate) fn t_test_p_value(r: f64, n: usize) -> Statistic {
    if n < MIN_SAMPLES || !r.is_finite() {
        return Statistic::Undefined;
    }

    let one_minus_r2 = 1.0 - r * r;
    if one_minus_r2 <= 0.0 {
        return Statistic::Defined(0.0);
    }

    let df = (n - 2) as f64;
    let t = r * (df / one_minus_r2).sqrt();

    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => Statistic::from_value((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0)),
        Err(_) => Statistic::Undefined,
    }
}

fn max_abs(x: ArrayView1<f64>) -> f64 {
    x.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

/// True if every value equals the first (or there are none)
pub(crate) fn is_constant(x: ArrayView1<f64>) -> bool {
    match x.iter().next() {
        Some(&first) => x.iter().all(|&v| v == first),
        None => true,
    }
}
