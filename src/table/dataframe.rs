//! Conversion between [`LabeledSeriesTable`] and polars `DataFrame`

use super::{Column, ColumnData, LabeledSeriesTable};
use crate::error::{InsightError, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

impl LabeledSeriesTable {
    /// Build a table from a cleaned data frame.
    ///
    /// Datetime and Date columns become time columns, integer and float
    /// columns are cast to `f64`, string columns are kept as text so that
    /// alignment can reject them. Any other dtype is a data error.
    pub fn from_dataframe(domain: impl Into<String>, df: &DataFrame) -> Result<Self> {
        let mut table = LabeledSeriesTable::new(domain);

        for series in df.get_columns() {
            let name = series.name().to_string();
            let data = match series.dtype() {
                DataType::Datetime(unit, _) => {
                    let unit = *unit;
                    let raw = series.cast(&DataType::Int64)?;
                    ColumnData::Time(
                        raw.i64()?
                            .into_iter()
                            .map(|v| v.and_then(|v| datetime_from_unit(v, unit)))
                            .collect(),
                    )
                }
                DataType::Date => {
                    let raw = series.cast(&DataType::Int32)?;
                    ColumnData::Time(
                        raw.i32()?
                            .into_iter()
                            .map(|v| {
                                v.and_then(|days| {
                                    DateTime::from_timestamp(days as i64 * SECONDS_PER_DAY, 0)
                                })
                            })
                            .collect(),
                    )
                }
                DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64 => {
                    let casted = series.cast(&DataType::Float64)?;
                    ColumnData::Numeric(
                        casted
                            .f64()?
                            .into_iter()
                            .map(|v| v.filter(|x| x.is_finite()))
                            .collect(),
                    )
                }
                DataType::String => ColumnData::Text(
                    series
                        .str()?
                        .into_iter()
                        .map(|v| v.map(str::to_string))
                        .collect(),
                ),
                other => {
                    return Err(InsightError::DataError(format!(
                        "unsupported dtype {} for column '{}' in domain '{}'",
                        other,
                        name,
                        table.domain()
                    )));
                }
            };
            table.columns.push(Column { name, data });
        }

        table.validate()?;
        Ok(table)
    }

    /// Export the table as a data frame. Time columns use millisecond
    /// precision in UTC.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut series = Vec::with_capacity(self.columns.len());

        for col in &self.columns {
            let name: &str = &col.name;
            let s = match &col.data {
                ColumnData::Time(values) => {
                    let millis: Vec<Option<i64>> = values
                        .iter()
                        .map(|v| v.map(|ts| ts.timestamp_millis()))
                        .collect();
                    Series::new(name.into(), millis)
                        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                }
                ColumnData::Numeric(values) => Series::new(name.into(), values.clone()),
                ColumnData::Text(values) => Series::new(name.into(), values.clone()),
            };
            series.push(s);
        }

        Ok(DataFrame::new(series)?)
    }
}

fn datetime_from_unit(value: i64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    }
}
