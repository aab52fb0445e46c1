//! Resample-and-reindex of many domains onto one grid

use super::{AlignedTableSet, Frequency, TimeGrid};
use crate::error::{InsightError, Result};
use crate::oplog::{OperationLog, ParamsDigest};
use crate::table::LabeledSeriesTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for [`SeriesAligner`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Bucket width of the shared grid
    pub frequency: Frequency,
    /// Upper bound on grid length
    pub max_grid_points: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::hourly(),
            max_grid_points: 1_000_000,
        }
    }
}

impl AlignmentConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grid frequency
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Set the grid length limit
    pub fn with_max_grid_points(mut self, max_grid_points: usize) -> Self {
        self.max_grid_points = max_grid_points;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.frequency.validate()?;
        if self.max_grid_points < 2 {
            return Err(InsightError::invalid_parameter(
                "max_grid_points",
                self.max_grid_points,
                "must allow at least 2 grid points",
            ));
        }
        Ok(())
    }
}

/// A domain that passed the time-source checks
struct TimeSource<'a> {
    domain: &'a str,
    time_column: &'a str,
    table: &'a LabeledSeriesTable,
    timestamps: &'a [Option<DateTime<Utc>>],
}

/// Resamples domain tables by bucket mean and reindexes them onto a shared
/// [`TimeGrid`]. Missing buckets stay missing; nothing is interpolated.
#[derive(Debug, Clone, Default)]
pub struct SeriesAligner {
    config: AlignmentConfig,
}

impl SeriesAligner {
    /// Create an aligner for `frequency` with default limits
    pub fn new(frequency: Frequency) -> Self {
        Self::with_config(AlignmentConfig::default().with_frequency(frequency))
    }

    /// Create an aligner from a configuration
    pub fn with_config(config: AlignmentConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Align `tables` onto one grid.
    ///
    /// `time_columns` names the time column of each domain. A domain without
    /// an entry, whose entry does not name a time column, or whose time
    /// column holds no timestamps is skipped and left out of the result.
    /// Fails with [`InsightError::NoTimeSource`] if every domain is skipped.
    pub fn align(
        &self,
        tables: &BTreeMap<String, LabeledSeriesTable>,
        time_columns: &BTreeMap<String, String>,
        log: &OperationLog,
    ) -> Result<AlignedTableSet> {
        let start = Instant::now();
        self.config.validate()?;

        let mut sources = Vec::with_capacity(tables.len());
        let mut skipped = Vec::new();

        for (domain, table) in tables {
            table.validate()?;
            if table.domain() != domain {
                return Err(InsightError::ValidationError(format!(
                    "table for key '{}' is labeled '{}'",
                    domain,
                    table.domain()
                )));
            }

            let Some(time_column) = time_columns.get(domain) else {
                warn!(domain = %domain, "No time column configured, skipping domain");
                skipped.push(domain.clone());
                continue;
            };
            let Some(timestamps) = table.time_values(time_column) else {
                warn!(domain = %domain, time_column = %time_column, "Time column missing, skipping domain");
                skipped.push(domain.clone());
                continue;
            };
            if timestamps.iter().all(Option::is_none) {
                warn!(domain = %domain, time_column = %time_column, "Time column has no timestamps, skipping domain");
                skipped.push(domain.clone());
                continue;
            }

            table.ensure_numeric(time_column)?;
            sources.push(TimeSource {
                domain,
                time_column,
                table,
                timestamps,
            });
        }

        if sources.is_empty() {
            return Err(InsightError::NoTimeSource);
        }

        let (min_ts, max_ts) = sources
            .iter()
            .flat_map(|s| s.timestamps.iter().flatten())
            .fold((DateTime::<Utc>::MAX_UTC, DateTime::<Utc>::MIN_UTC), |(lo, hi), &ts| {
                (lo.min(ts), hi.max(ts))
            });

        let grid = TimeGrid::new(
            min_ts,
            max_ts,
            self.config.frequency,
            self.config.max_grid_points,
        )?;

        let mut aligned = BTreeMap::new();
        let mut aligned_time_columns = BTreeMap::new();
        for source in &sources {
            let table = Self::resample_onto(source, &grid);
            aligned.insert(source.domain.to_string(), table);
            aligned_time_columns.insert(source.domain.to_string(), source.time_column.to_string());
        }

        log.record(
            "align",
            ParamsDigest::new()
                .with("frequency", self.config.frequency.to_string())
                .with("domains_in", tables.len())
                .with("domains_aligned", aligned.len())
                .with("skipped", skipped.clone())
                .with("grid_len", grid.len())
                .with("grid_start", grid.start().to_rfc3339())
                .with("grid_end", grid.end().to_rfc3339()),
        );

        info!(
            domains = aligned.len(),
            skipped = skipped.len(),
            grid_len = grid.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Alignment complete"
        );

        Ok(AlignedTableSet::new(grid, aligned, aligned_time_columns, skipped))
    }

    /// Bucket-mean every numeric column of one domain onto `grid`
    fn resample_onto(source: &TimeSource<'_>, grid: &TimeGrid) -> LabeledSeriesTable {
        let bucket_of: Vec<Option<usize>> = source
            .timestamps
            .iter()
            .map(|ts| ts.and_then(|ts| grid.index_of(ts)))
            .collect();

        let dropped = source.timestamps.iter().filter(|ts| ts.is_none()).count();
        if dropped > 0 {
            warn!(
                domain = %source.domain,
                rows = dropped,
                "Dropping rows with missing timestamps"
            );
        }

        let mut out = LabeledSeriesTable::new(source.domain)
            .with_time_column(source.time_column, grid.timestamps().into_iter().map(Some).collect());

        for (name, values) in source.table.numeric_columns() {
            // Running mean; a plain sum overflows for values near f64::MAX
            let mut running = vec![0.0f64; grid.len()];
            let mut counts = vec![0usize; grid.len()];

            for (bucket, value) in bucket_of.iter().zip(values) {
                if let (Some(b), Some(v)) = (bucket, value) {
                    counts[*b] += 1;
                    let n = counts[*b] as f64;
                    running[*b] = running[*b] - running[*b] / n + v / n;
                }
            }

            let means: Vec<Option<f64>> = running
                .into_iter()
                .zip(counts)
                .map(|(mean, n)| (n > 0).then_some(mean))
                .collect();

            debug!(
                domain = %source.domain,
                column = %name,
                observed = means.iter().filter(|v| v.is_some()).count(),
                grid_len = grid.len(),
                "Resampled column"
            );
            out = out.with_numeric_column(name, means);
        }

        out
    }
}
