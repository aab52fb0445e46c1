//! Resampling frequency and epoch-anchored bucketing

use crate::error::{InsightError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Regular spacing of a [`TimeGrid`](super::TimeGrid)
///
/// Buckets are contiguous half-open intervals `[k * len, (k + 1) * len)`
/// counted from the Unix epoch, so the bucket a timestamp falls into does not
/// depend on which other timestamps are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Seconds(u32),
    Minutes(u32),
    Hours(u32),
    Days(u32),
}

impl Frequency {
    /// Hourly buckets
    pub fn hourly() -> Self {
        Frequency::Hours(1)
    }

    /// Daily buckets
    pub fn daily() -> Self {
        Frequency::Days(1)
    }

    /// Bucket length in whole seconds
    pub fn len_secs(&self) -> i64 {
        match *self {
            Frequency::Seconds(n) => n as i64,
            Frequency::Minutes(n) => n as i64 * SECONDS_PER_MINUTE,
            Frequency::Hours(n) => n as i64 * SECONDS_PER_HOUR,
            Frequency::Days(n) => n as i64 * SECONDS_PER_DAY,
        }
    }

    /// Bucket length as a duration
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.len_secs())
    }

    /// Reject zero-width buckets
    pub fn validate(&self) -> Result<()> {
        if self.len_secs() <= 0 {
            return Err(InsightError::invalid_parameter(
                "frequency",
                self,
                "bucket width must be positive",
            ));
        }
        Ok(())
    }

    /// Index of the bucket containing `ts`, counted from the epoch
    pub fn bucket_index(&self, ts: DateTime<Utc>) -> i64 {
        ts.timestamp().div_euclid(self.len_secs())
    }

    /// Start of the bucket containing `ts`; `None` if that start precedes
    /// the earliest representable timestamp
    pub fn floor(&self, ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.bucket_start(self.bucket_index(ts))
    }

    /// Start timestamp of bucket `index`, if representable
    pub fn bucket_start(&self, index: i64) -> Option<DateTime<Utc>> {
        let secs = index.checked_mul(self.len_secs())?;
        DateTime::from_timestamp(secs, 0)
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::hourly()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Frequency::Seconds(n) => write!(f, "{}s", n),
            Frequency::Minutes(n) => write!(f, "{}min", n),
            Frequency::Hours(n) => write!(f, "{}h", n),
            Frequency::Days(n) => write!(f, "{}d", n),
        }
    }
}

/// Parses offset aliases such as `"1h"`, `"H"`, `"30min"`, `"15T"`, `"10s"`,
/// `"D"` and `"2d"`.
impl FromStr for Frequency {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split);

        let count: u32 = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| InsightError::invalid_parameter("frequency", s, "invalid count"))?
        };

        if count == 0 {
            return Err(InsightError::invalid_parameter(
                "frequency",
                s,
                "bucket width must be positive",
            ));
        }

        match unit.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" => Ok(Frequency::Seconds(count)),
            "t" | "min" | "mins" => Ok(Frequency::Minutes(count)),
            "h" | "hr" | "hour" | "hours" => Ok(Frequency::Hours(count)),
            "d" | "day" | "days" => Ok(Frequency::Days(count)),
            _ => Err(InsightError::invalid_parameter(
                "frequency",
                s,
                "expected a unit of s, min/T, h or d",
            )),
        }
    }
}

impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
