//! Shared, regularly spaced time axis

use super::Frequency;
use crate::error::{InsightError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Regularly spaced sequence of bucket starts covering `[start, end]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGrid {
    frequency: Frequency,
    first_bucket: i64,
    len: usize,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeGrid {
    /// Build the grid spanning the buckets of `start` and `end` inclusive.
    ///
    /// Fails with [`InsightError::InsufficientTimeSpan`] when both fall into
    /// the same bucket and with [`InsightError::GridTooLarge`] when the grid
    /// would hold more than `max_points` buckets. A grid whose first or last
    /// bucket starts outside the representable time range is a validation
    /// error; every bucket in between is then representable too.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        frequency: Frequency,
        max_points: usize,
    ) -> Result<Self> {
        frequency.validate()?;
        if end < start {
            return Err(InsightError::ValidationError(format!(
                "grid end {} precedes start {}",
                end, start
            )));
        }

        let first_bucket = frequency.bucket_index(start);
        let last_bucket = frequency.bucket_index(end);
        let span = (last_bucket - first_bucket) as u64 + 1;

        if span < 2 {
            return Err(InsightError::InsufficientTimeSpan { distinct: span as usize });
        }
        if span > max_points as u64 {
            return Err(InsightError::GridTooLarge {
                points: usize::try_from(span).unwrap_or(usize::MAX),
                limit: max_points,
            });
        }

        let bucket_start = |index: i64| {
            frequency.bucket_start(index).ok_or_else(|| {
                InsightError::ValidationError(format!(
                    "bucket {} at frequency {} lies outside the representable time range",
                    index, frequency
                ))
            })
        };
        let grid_start = bucket_start(first_bucket)?;
        let grid_end = bucket_start(last_bucket)?;

        Ok(Self {
            frequency,
            first_bucket,
            len: span as usize,
            start: grid_start,
            end: grid_end,
        })
    }

    /// Number of grid points
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the grid has no points
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Spacing of the grid
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// First grid timestamp
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Last grid timestamp
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Grid timestamp at position `idx`
    pub fn timestamp(&self, idx: usize) -> Option<DateTime<Utc>> {
        if idx >= self.len {
            return None;
        }
        self.frequency.bucket_start(self.first_bucket + idx as i64)
    }

    /// All grid timestamps in ascending order
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        (0..self.len as i64)
            .filter_map(|i| self.frequency.bucket_start(self.first_bucket + i))
            .collect()
    }

    /// Position of the bucket containing `ts`, if it lies on the grid
    pub fn index_of(&self, ts: DateTime<Utc>) -> Option<usize> {
        let offset = self.frequency.bucket_index(ts) - self.first_bucket;
        (offset >= 0 && (offset as usize) < self.len).then_some(offset as usize)
    }
}
