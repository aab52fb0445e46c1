//! Output of alignment: tables reindexed onto one grid

use super::TimeGrid;
use crate::table::LabeledSeriesTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from domain name to a table reindexed onto a shared [`TimeGrid`]
///
/// Produced fresh by every alignment and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedTableSet {
    grid: TimeGrid,
    tables: BTreeMap<String, LabeledSeriesTable>,
    time_columns: BTreeMap<String, String>,
    skipped: Vec<String>,
}

/// How much of the grid one column actually observes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCoverage {
    pub domain: String,
    pub column: String,
    /// Grid buckets holding a value
    pub observed: usize,
    pub grid_len: usize,
    /// `observed / grid_len`
    pub fraction: f64,
    pub first_observed: Option<DateTime<Utc>>,
    pub last_observed: Option<DateTime<Utc>>,
}

impl AlignedTableSet {
    pub(crate) fn new(
        grid: TimeGrid,
        tables: BTreeMap<String, LabeledSeriesTable>,
        time_columns: BTreeMap<String, String>,
        skipped: Vec<String>,
    ) -> Self {
        Self {
            grid,
            tables,
            time_columns,
            skipped,
        }
    }

    /// The shared grid
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Aligned tables keyed by domain
    pub fn tables(&self) -> &BTreeMap<String, LabeledSeriesTable> {
        &self.tables
    }

    /// Aligned table for one domain
    pub fn table(&self, domain: &str) -> Option<&LabeledSeriesTable> {
        self.tables.get(domain)
    }

    /// Time column of every aligned domain; feeding this and [`tables`]
    /// back into the aligner reproduces the same grid.
    ///
    /// [`tables`]: AlignedTableSet::tables
    pub fn time_columns(&self) -> &BTreeMap<String, String> {
        &self.time_columns
    }

    /// Domains present in the set, in key order
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Domains dropped because they had no usable time column
    pub fn skipped_domains(&self) -> &[String] {
        &self.skipped
    }

    /// Number of aligned domains
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True if no domain was aligned
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Per-column coverage of the grid, in (domain, column) order
    pub fn coverage(&self) -> Vec<ColumnCoverage> {
        let grid_len = self.grid.len();
        let mut report = Vec::new();

        for (domain, table) in &self.tables {
            for (column, values) in table.numeric_columns() {
                let mut observed = 0usize;
                let mut first = None;
                let mut last = None;
                for (idx, value) in values.iter().enumerate() {
                    if value.is_some() {
                        observed += 1;
                        first.get_or_insert(idx);
                        last = Some(idx);
                    }
                }

                report.push(ColumnCoverage {
                    domain: domain.clone(),
                    column: column.to_string(),
                    observed,
                    grid_len,
                    fraction: if grid_len > 0 {
                        observed as f64 / grid_len as f64
                    } else {
                        0.0
                    },
                    first_observed: first.and_then(|i| self.grid.timestamp(i)),
                    last_observed: last.and_then(|i| self.grid.timestamp(i)),
                });
            }
        }

        report
    }
}
