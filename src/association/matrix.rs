//! Full pairwise correlation matrix across domains

use super::{pairwise_complete, AssociationCalculator, AssociationMeasure, Statistic};
use crate::alignment::AlignedTableSet;
use crate::error::{InsightError, Result};
use crate::oplog::{OperationLog, ParamsDigest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Correlation statistic used for a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationMethod::Pearson => f.write_str("pearson"),
            CorrelationMethod::Spearman => f.write_str("spearman"),
        }
    }
}

impl FromStr for CorrelationMethod {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            _ => Err(InsightError::invalid_parameter(
                "method",
                s,
                "expected pearson or spearman",
            )),
        }
    }
}

/// Symmetric matrix of pairwise-complete correlations, labelled
/// `domain.column`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationMatrix {
    pub method: CorrelationMethod,
    pub labels: Vec<String>,
    pub values: Vec<Vec<Statistic>>,
}

impl AssociationMatrix {
    /// Number of rows (and columns)
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Cell by position
    pub fn get(&self, row: usize, col: usize) -> Option<Statistic> {
        self.values.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Cell by `domain.column` labels
    pub fn get_by_label(&self, row: &str, col: &str) -> Option<Statistic> {
        let i = self.labels.iter().position(|l| l == row)?;
        let j = self.labels.iter().position(|l| l == col)?;
        self.get(i, j)
    }
}

impl AssociationCalculator {
    /// Correlate every numeric column of every domain with every other.
    pub fn matrix(
        &self,
        aligned: &AlignedTableSet,
        method: CorrelationMethod,
        log: &OperationLog,
    ) -> Result<AssociationMatrix> {
        let mut labels = Vec::new();
        let mut series: Vec<&[Option<f64>]> = Vec::new();
        for (domain, table) in aligned.tables() {
            if let Some(time_column) = aligned.time_columns().get(domain) {
                table.ensure_numeric(time_column)?;
            }
            for (column, values) in table.numeric_columns() {
                labels.push(format!("{}.{}", domain, column));
                series.push(values);
            }
        }

        let measure: &dyn AssociationMeasure = match method {
            CorrelationMethod::Pearson => self.pearson(),
            CorrelationMethod::Spearman => self.spearman(),
        };

        let n = series.len();
        let mut values = vec![vec![Statistic::Undefined; n]; n];
        for i in 0..n {
            for j in i..n {
                let (x, y) = pairwise_complete(series[i], series[j]);
                let stat = measure.measure(x.view(), y.view()).statistic;
                values[i][j] = stat;
                values[j][i] = stat;
            }
        }

        log.record(
            "matrix",
            ParamsDigest::new()
                .with("method", method.to_string())
                .with("columns", n),
        );
        info!(method = %method, columns = n, "Association matrix complete");

        Ok(AssociationMatrix {
            method,
            labels,
            values,
        })
    }
}
