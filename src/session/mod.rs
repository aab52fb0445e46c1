//! Caller-owned analysis session
//!
//! An [`AnalysisSession`] bundles an [`EngineConfig`] with its own
//! [`OperationLog`] and drives the align → compute → rank pipeline. Sessions
//! share nothing, so each logical caller should hold its own.

mod config;

pub use config::{EngineConfig, RankingConfig};

use crate::alignment::{AlignedTableSet, ColumnCoverage, SeriesAligner};
use crate::association::{AssociationCalculator, AssociationMatrix, AssociationRecord, CorrelationMethod};
use crate::error::Result;
use crate::oplog::{OperationLog, OperationLogEntry};
use crate::ranking::{FeatureRanker, RankMetric, RankOptions, RankedFeatureList};
use crate::table::LabeledSeriesTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Inputs of a one-shot [`AnalysisSession::analyze`] run
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub tables: BTreeMap<String, LabeledSeriesTable>,
    pub time_columns: BTreeMap<String, String>,
    pub target_domain: String,
    pub target_column: String,
    pub metric: RankMetric,
    /// Falls back to `RankingConfig::default_top_n`
    pub top_n: Option<usize>,
    /// Falls back to the metric's default direction
    pub by_magnitude: Option<bool>,
}

impl AnalysisRequest {
    pub fn new(target_domain: impl Into<String>, target_column: impl Into<String>) -> Self {
        Self {
            tables: BTreeMap::new(),
            time_columns: BTreeMap::new(),
            target_domain: target_domain.into(),
            target_column: target_column.into(),
            metric: RankMetric::Pearson,
            top_n: None,
            by_magnitude: None,
        }
    }

    /// Add a domain table together with its time column
    pub fn with_table(mut self, table: LabeledSeriesTable, time_column: impl Into<String>) -> Self {
        let domain = table.domain().to_string();
        self.time_columns.insert(domain.clone(), time_column.into());
        self.tables.insert(domain, table);
        self
    }

    pub fn with_metric(mut self, metric: RankMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    pub fn with_by_magnitude(mut self, by_magnitude: bool) -> Self {
        self.by_magnitude = Some(by_magnitude);
        self
    }
}

/// Result of [`AnalysisSession::analyze`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub grid_len: usize,
    pub skipped_domains: Vec<String>,
    pub coverage: Vec<ColumnCoverage>,
    /// Every association record, including undefined ones
    pub records: Vec<AssociationRecord>,
    pub ranked: RankedFeatureList,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Configuration plus operation log for one logical caller
#[derive(Debug, Default)]
pub struct AnalysisSession {
    config: EngineConfig,
    log: OperationLog,
}

impl AnalysisSession {
    /// Create a session with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from a validated configuration
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            log: OperationLog::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    /// Snapshot of the operation log
    pub fn history(&self) -> Vec<OperationLogEntry> {
        self.log.history()
    }

    /// Clear the operation log
    pub fn reset(&self) {
        self.log.clear();
    }

    pub fn align(
        &self,
        tables: &BTreeMap<String, LabeledSeriesTable>,
        time_columns: &BTreeMap<String, String>,
    ) -> Result<AlignedTableSet> {
        SeriesAligner::with_config(self.config.alignment.clone()).align(tables, time_columns, &self.log)
    }

    pub fn compute(
        &self,
        aligned: &AlignedTableSet,
        target_domain: &str,
        target_column: &str,
    ) -> Result<Vec<AssociationRecord>> {
        AssociationCalculator::with_config(self.config.association.clone()).compute(
            aligned,
            target_domain,
            target_column,
            &self.log,
        )
    }

    pub fn matrix(&self, aligned: &AlignedTableSet, method: CorrelationMethod) -> Result<AssociationMatrix> {
        AssociationCalculator::with_config(self.config.association.clone()).matrix(aligned, method, &self.log)
    }

    /// Rank with explicit parameters; the session's p-value threshold applies
    pub fn rank(
        &self,
        records: &[AssociationRecord],
        metric: RankMetric,
        top_n: usize,
        by_magnitude: bool,
    ) -> Result<RankedFeatureList> {
        let options = RankOptions::new(metric, top_n)
            .with_by_magnitude(by_magnitude)
            .with_max_p_value(self.config.ranking.max_p_value);
        FeatureRanker::new().rank_with_options(records, &options, &self.log)
    }

    /// Rank with the configured `default_top_n` and the metric's default direction
    pub fn rank_default(&self, records: &[AssociationRecord], metric: RankMetric) -> Result<RankedFeatureList> {
        self.rank(
            records,
            metric,
            self.config.ranking.default_top_n,
            metric.default_by_magnitude(),
        )
    }

    /// Align, associate and rank in one call
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let aligned = self.align(&request.tables, &request.time_columns)?;
        let records = self.compute(&aligned, &request.target_domain, &request.target_column)?;
        let ranked = self.rank(
            &records,
            request.metric,
            request.top_n.unwrap_or(self.config.ranking.default_top_n),
            request
                .by_magnitude
                .unwrap_or_else(|| request.metric.default_by_magnitude()),
        )?;

        info!(
            domains = aligned.len(),
            grid_len = aligned.grid().len(),
            records = records.len(),
            ranked = ranked.len(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            grid_len: aligned.grid().len(),
            skipped_domains: aligned.skipped_domains().to_vec(),
            coverage: aligned.coverage(),
            records,
            ranked,
        })
    }
}
