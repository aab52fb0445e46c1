//! Target-versus-all association pass

use super::{
    pairwise_complete, AssociationMeasure, KraskovEstimator, PearsonCorrelation,
    SpearmanCorrelation, Statistic, DEFAULT_NEIGHBORS,
};
use crate::alignment::AlignedTableSet;
use crate::error::{InsightError, Result};
use crate::oplog::{OperationLog, ParamsDigest};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Configuration for [`AssociationCalculator`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    /// Neighbourhood size of the mutual information estimator
    pub mi_neighbors: usize,
    /// Seed for the estimator's tie-breaking jitter
    pub random_state: u64,
    /// Evaluate candidates on the rayon pool
    pub parallel: bool,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            mi_neighbors: DEFAULT_NEIGHBORS,
            random_state: 0,
            parallel: true,
        }
    }
}

impl AssociationConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mutual information neighbourhood size
    pub fn with_mi_neighbors(mut self, k: usize) -> Self {
        self.mi_neighbors = k;
        self
    }

    /// Set the jitter seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Enable or disable parallel evaluation
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.mi_neighbors == 0 {
            return Err(InsightError::invalid_parameter(
                "mi_neighbors",
                self.mi_neighbors,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Association between the target and one candidate column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRecord {
    pub domain: String,
    pub column: String,
    pub pearson_r: Statistic,
    pub pearson_p: Statistic,
    pub spearman_r: Statistic,
    pub spearman_p: Statistic,
    pub mutual_information: Statistic,
    /// Pairwise-complete observations used
    pub n_obs: usize,
}

impl AssociationRecord {
    /// `domain.column` label
    pub fn label(&self) -> String {
        format!("{}.{}", self.domain, self.column)
    }
}

/// Computes Pearson, Spearman and mutual information between one target
/// column and every other numeric column of an [`AlignedTableSet`]
#[derive(Debug, Clone)]
pub struct AssociationCalculator {
    config: AssociationConfig,
    pearson: PearsonCorrelation,
    spearman: SpearmanCorrelation,
    mutual_info: KraskovEstimator,
}

impl AssociationCalculator {
    /// Create a calculator with default configuration
    pub fn new() -> Self {
        Self::with_config(AssociationConfig::default())
    }

    /// Create a calculator from a configuration
    pub fn with_config(config: AssociationConfig) -> Self {
        let mutual_info =
            KraskovEstimator::new(config.mi_neighbors).with_random_state(config.random_state);
        Self {
            config,
            pearson: PearsonCorrelation,
            spearman: SpearmanCorrelation,
            mutual_info,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &AssociationConfig {
        &self.config
    }

    /// Associate `target_domain.target_column` with every other numeric
    /// column, in (domain, column) traversal order.
    ///
    /// Fails with [`InsightError::TargetNotFound`] if the target domain is
    /// not aligned or the column is not numeric in it. Degenerate pairs never
    /// fail; their fields are undefined.
    pub fn compute(
        &self,
        aligned: &AlignedTableSet,
        target_domain: &str,
        target_column: &str,
        log: &OperationLog,
    ) -> Result<Vec<AssociationRecord>> {
        let start = Instant::now();
        self.config.validate()?;

        let target = aligned
            .table(target_domain)
            .and_then(|t| t.numeric(target_column))
            .ok_or_else(|| InsightError::TargetNotFound {
                domain: target_domain.to_string(),
                column: target_column.to_string(),
            })?;

        let mut candidates = Vec::new();
        for (domain, table) in aligned.tables() {
            if let Some(time_column) = aligned.time_columns().get(domain) {
                table.ensure_numeric(time_column)?;
            }
            for (column, values) in table.numeric_columns() {
                if domain == target_domain && column == target_column {
                    continue;
                }
                if values.len() != target.len() {
                    return Err(InsightError::ValidationError(format!(
                        "{}.{} has {} rows but the grid has {}",
                        domain,
                        column,
                        values.len(),
                        target.len()
                    )));
                }
                candidates.push((domain.as_str(), column, values));
            }
        }

        let records: Vec<AssociationRecord> = if self.config.parallel {
            candidates
                .par_iter()
                .map(|&(domain, column, values)| self.associate(domain, column, target, values))
                .collect()
        } else {
            candidates
                .iter()
                .map(|&(domain, column, values)| self.associate(domain, column, target, values))
                .collect()
        };

        let undefined = records.iter().filter(|r| r.pearson_r.is_undefined()).count();
        log.record(
            "compute",
            ParamsDigest::new()
                .with("target", format!("{}.{}", target_domain, target_column))
                .with("candidates", records.len())
                .with("undefined_pearson", undefined)
                .with("grid_len", target.len()),
        );

        info!(
            target_series = %format!("{}.{}", target_domain, target_column),
            candidates = records.len(),
            undefined,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Association pass complete"
        );

        Ok(records)
    }

    /// Build the record for one candidate against the target
    pub fn associate(
        &self,
        domain: &str,
        column: &str,
        target: &[Option<f64>],
        candidate: &[Option<f64>],
    ) -> AssociationRecord {
        let (x, y) = pairwise_complete(target, candidate);
        let pearson = self.pearson.measure(x.view(), y.view());
        let spearman = self.spearman.measure(x.view(), y.view());
        let mutual_info = self.mutual_info.measure(x.view(), y.view());

        AssociationRecord {
            domain: domain.to_string(),
            column: column.to_string(),
            pearson_r: pearson.statistic,
            pearson_p: pearson.p_value,
            spearman_r: spearman.statistic,
            spearman_p: spearman.p_value,
            mutual_information: mutual_info.statistic,
            n_obs: x.len(),
        }
    }

    pub(crate) fn pearson(&self) -> &PearsonCorrelation {
        &self.pearson
    }

    pub(crate) fn spearman(&self) -> &SpearmanCorrelation {
        &self.spearman
    }
}

impl Default for AssociationCalculator {
    fn default() -> Self {
        Self::new()
    }
}
