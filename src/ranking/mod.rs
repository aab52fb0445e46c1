//! Feature ranking over association records
//!
//! Records are ordered descending by the chosen metric (by magnitude for
//! correlations unless told otherwise), ties broken by `(domain, column)`
//! ascending. Records whose metric is undefined are excluded and counted.

use crate::association::{AssociationRecord, Statistic};
use crate::error::{InsightError, Result};
use crate::oplog::{OperationLog, ParamsDigest};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Metric a ranking is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    Pearson,
    Spearman,
    MutualInformation,
}

impl RankMetric {
    /// The record's value for this metric
    pub fn value_of(&self, record: &AssociationRecord) -> Statistic {
        match self {
            RankMetric::Pearson => record.pearson_r,
            RankMetric::Spearman => record.spearman_r,
            RankMetric::MutualInformation => record.mutual_information,
        }
    }

    /// The record's p-value for this metric; mutual information has none
    pub fn p_value_of(&self, record: &AssociationRecord) -> Statistic {
        match self {
            RankMetric::Pearson => record.pearson_p,
            RankMetric::Spearman => record.spearman_p,
            RankMetric::MutualInformation => Statistic::Undefined,
        }
    }

    /// Correlations rank by magnitude, mutual information by raw value
    pub fn default_by_magnitude(&self) -> bool {
        !matches!(self, RankMetric::MutualInformation)
    }

    pub fn has_p_value(&self) -> bool {
        !matches!(self, RankMetric::MutualInformation)
    }
}

impl fmt::Display for RankMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RankMetric::Pearson => "pearson",
            RankMetric::Spearman => "spearman",
            RankMetric::MutualInformation => "mutual_information",
        };
        f.write_str(name)
    }
}

impl FromStr for RankMetric {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(RankMetric::Pearson),
            "spearman" => Ok(RankMetric::Spearman),
            "mutual_information" | "mutual_info" | "mi" => Ok(RankMetric::MutualInformation),
            _ => Err(InsightError::invalid_parameter(
                "metric",
                s,
                "expected pearson, spearman or mutual_information",
            )),
        }
    }
}

/// Options for [`FeatureRanker::rank_with_options`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankOptions {
    pub metric: RankMetric,
    pub top_n: usize,
    pub by_magnitude: bool,
    /// Drop records whose p-value exceeds this; ignored for mutual information
    pub max_p_value: Option<f64>,
}

impl RankOptions {
    /// Options with the metric's default direction and no p-value filter
    pub fn new(metric: RankMetric, top_n: usize) -> Self {
        Self {
            metric,
            top_n,
            by_magnitude: metric.default_by_magnitude(),
            max_p_value: None,
        }
    }

    pub fn with_by_magnitude(mut self, by_magnitude: bool) -> Self {
        self.by_magnitude = by_magnitude;
        self
    }

    pub fn with_max_p_value(mut self, max_p_value: Option<f64>) -> Self {
        self.max_p_value = max_p_value;
        self
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(InsightError::invalid_parameter(
                "top_n",
                self.top_n,
                "must be a positive integer",
            ));
        }
        if let Some(p) = self.max_p_value {
            if !(p > 0.0 && p <= 1.0) {
                return Err(InsightError::invalid_parameter(
                    "max_p_value",
                    p,
                    "must lie in (0, 1]",
                ));
            }
        }
        Ok(())
    }
}

/// Ranked subset of association records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeatureList {
    pub metric: RankMetric,
    pub by_magnitude: bool,
    pub top_n: usize,
    pub records: Vec<AssociationRecord>,
    /// Records left out because the metric was undefined
    pub excluded_undefined: usize,
    /// Records left out by the p-value threshold
    pub excluded_insignificant: usize,
}

impl RankedFeatureList {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `domain.column` labels in rank order
    pub fn labels(&self) -> Vec<String> {
        self.records.iter().map(|r| r.label()).collect()
    }

    /// Pretty JSON of the whole list: a wrapper object carrying `metric`,
    /// `by_magnitude`, `top_n`, both exclusion counts and the ranked
    /// `records`. Each record has the seven association fields plus `n_obs`.
    /// Use [`RankedFeatureList::to_records_json`] for the bare record array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Pretty JSON array of the ranked records alone, in rank order
    pub fn to_records_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}

/// Orders association records by a metric
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureRanker;

impl FeatureRanker {
    pub fn new() -> Self {
        Self
    }

    /// Rank `records` by `metric`, keeping at most `top_n`
    pub fn rank(
        &self,
        records: &[AssociationRecord],
        metric: RankMetric,
        top_n: usize,
        by_magnitude: bool,
        log: &OperationLog,
    ) -> Result<RankedFeatureList> {
        self.rank_with_options(
            records,
            &RankOptions::new(metric, top_n).with_by_magnitude(by_magnitude),
            log,
        )
    }

    /// Rank with an optional significance filter
    pub fn rank_with_options(
        &self,
        records: &[AssociationRecord],
        options: &RankOptions,
        log: &OperationLog,
    ) -> Result<RankedFeatureList> {
        options.validate()?;
        let metric = options.metric;

        let mut excluded_undefined = 0;
        let mut excluded_insignificant = 0;
        let mut keyed: Vec<(f64, &AssociationRecord)> = Vec::with_capacity(records.len());

        for record in records {
            let value = match metric.value_of(record).value() {
                Some(v) => v,
                None => {
                    excluded_undefined += 1;
                    continue;
                }
            };
            if let (Some(limit), true) = (options.max_p_value, metric.has_p_value()) {
                match metric.p_value_of(record).value() {
                    Some(p) if p <= limit => {}
                    _ => {
                        excluded_insignificant += 1;
                        continue;
                    }
                }
            }
            // + 0.0 folds -0.0 into 0.0 so equal zeros reach the label tie-break
            let key = (if options.by_magnitude { value.abs() } else { value }) + 0.0;
            keyed.push((key, record));
        }

        keyed.sort_by(|(ka, ra), (kb, rb)| {
            kb.total_cmp(ka).then_with(|| compare_labels(ra, rb))
        });

        let ranked: Vec<AssociationRecord> = keyed
            .into_iter()
            .take(options.top_n)
            .map(|(_, r)| r.clone())
            .collect();

        log.record(
            "rank",
            ParamsDigest::new()
                .with("metric", metric.to_string())
                .with("top_n", options.top_n)
                .with("by_magnitude", options.by_magnitude)
                .with("returned", ranked.len())
                .with("excluded_undefined", excluded_undefined)
                .with("excluded_insignificant", excluded_insignificant),
        );

        info!(
            metric = %metric,
            returned = ranked.len(),
            excluded_undefined,
            excluded_insignificant,
            "Ranking complete"
        );

        Ok(RankedFeatureList {
            metric,
            by_magnitude: options.by_magnitude,
            top_n: options.top_n,
            records: ranked,
            excluded_undefined,
            excluded_insignificant,
        })
    }
}

fn compare_labels(a: &AssociationRecord, b: &AssociationRecord) -> Ordering {
    a.domain
        .cmp(&b.domain)
        .then_with(|| a.column.cmp(&b.column))
}
