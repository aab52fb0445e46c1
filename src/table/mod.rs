//! Labeled time-series tables
//!
//! A [`LabeledSeriesTable`] is the unit of input for one domain (weather,
//! economic indicators, social signals, ...). It is a set of equally long,
//! named columns; at least one of them holds timestamps. Values are either
//! floating point or explicitly missing, never implicitly coerced.

mod dataframe;

use crate::error::{InsightError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Typed storage for a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    /// Timestamps; `None` marks a missing timestamp
    Time(Vec<Option<DateTime<Utc>>>),
    /// Numeric values; `None` marks a missing observation
    Numeric(Vec<Option<f64>>),
    /// Raw text left uncleaned upstream. Never coerced.
    Text(Vec<Option<String>>),
}

impl ColumnData {
    /// Number of rows in the column
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Time(v) => v.len(),
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    /// True if the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short type name used in error messages
    pub fn dtype_name(&self) -> &'static str {
        match self {
            ColumnData::Time(_) => "time",
            ColumnData::Numeric(_) => "numeric",
            ColumnData::Text(_) => "text",
        }
    }
}

/// A named column of a [`LabeledSeriesTable`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Time-indexed table for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSeriesTable {
    domain: String,
    columns: Vec<Column>,
}

impl LabeledSeriesTable {
    /// Create an empty table for `domain`
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            columns: Vec::new(),
        }
    }

    /// Add a timestamp column
    pub fn with_time_column(
        mut self,
        name: impl Into<String>,
        values: Vec<Option<DateTime<Utc>>>,
    ) -> Self {
        self.columns.push(Column {
            name: name.into(),
            data: ColumnData::Time(values),
        });
        self
    }

    /// Add a numeric column. NaN and infinite inputs are stored as missing.
    pub fn with_numeric_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        self.columns.push(Column {
            name: name.into(),
            data: ColumnData::Numeric(values),
        });
        self
    }

    /// Add a numeric column with no missing values
    pub fn with_values(self, name: impl Into<String>, values: &[f64]) -> Self {
        self.with_numeric_column(name, values.iter().map(|&v| Some(v)).collect())
    }

    /// Add a text column
    pub fn with_text_column(mut self, name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            data: ColumnData::Text(values),
        });
        self
    }

    /// Check structural invariants: equal column lengths and unique names
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        for col in &self.columns {
            if !seen.insert(col.name.as_str()) {
                return Err(InsightError::ValidationError(format!(
                    "duplicate column '{}' in domain '{}'",
                    col.name, self.domain
                )));
            }
        }

        if let Some(first) = self.columns.first() {
            let n_rows = first.data.len();
            if let Some(bad) = self.columns.iter().find(|c| c.data.len() != n_rows) {
                return Err(InsightError::ValidationError(format!(
                    "column '{}' in domain '{}' has {} rows, expected {}",
                    bad.name,
                    self.domain,
                    bad.data.len(),
                    n_rows
                )));
            }
        }

        Ok(())
    }

    /// Domain name
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Number of rows (0 for a table without columns)
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    /// All columns in insertion order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Timestamps of a time column, if `name` is one
    pub fn time_values(&self, name: &str) -> Option<&[Option<DateTime<Utc>>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Time(v)) => Some(v),
            _ => None,
        }
    }

    /// Values of a numeric column, if `name` is one
    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Numeric(v)) => Some(v),
            _ => None,
        }
    }

    /// Numeric columns in insertion order
    pub fn numeric_columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.columns.iter().filter_map(|c| match &c.data {
            ColumnData::Numeric(v) => Some((c.name.as_str(), v.as_slice())),
            _ => None,
        })
    }

    /// Fail if any column other than `time_column` is not numeric
    pub fn ensure_numeric(&self, time_column: &str) -> Result<()> {
        for col in &self.columns {
            if col.name == time_column {
                continue;
            }
            if !matches!(col.data, ColumnData::Numeric(_)) {
                return Err(InsightError::NonNumericColumn {
                    domain: self.domain.clone(),
                    column: col.name.clone(),
                    dtype: col.data.dtype_name().to_string(),
                });
            }
        }
        Ok(())
    }
}
