//! Error types for the Kolosal Insight engine

use thiserror::Error;

/// Result type alias for Kolosal Insight operations
pub type Result<T> = std::result::Result<T, InsightError>;

/// Main error type for alignment, association and ranking
///
/// Per-pair statistical degeneracy (zero variance, too few paired samples) is
/// never reported through this type; it is carried as an undefined
/// [`Statistic`](crate::association::Statistic) on the affected record.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Alignment error: no time source")]
    NoTimeSource,

    #[error("Alignment error: insufficient time span ({distinct} distinct bucket(s), need at least 2)")]
    InsufficientTimeSpan { distinct: usize },

    #[error("Alignment error: grid of {points} points exceeds limit of {limit}")]
    GridTooLarge { points: usize, limit: usize },

    #[error("Association error: target not found: {domain}.{column}")]
    TargetNotFound { domain: String, column: String },

    #[error("Non-numeric column {domain}.{column} ({dtype}); coerce upstream before analysis")]
    NonNumericColumn {
        domain: String,
        column: String,
        dtype: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl InsightError {
    /// Build an [`InsightError::InvalidParameter`]
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        InsightError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures of the alignment step
    pub fn is_alignment_error(&self) -> bool {
        matches!(
            self,
            InsightError::NoTimeSource
                | InsightError::InsufficientTimeSpan { .. }
                | InsightError::GridTooLarge { .. }
        )
    }

    /// True when the requested association target is absent
    pub fn is_association_error(&self) -> bool {
        matches!(self, InsightError::TargetNotFound { .. })
    }
}

impl From<serde_json::Error> for InsightError {
    fn from(err: serde_json::Error) -> Self {
        InsightError::SerializationError(err.to_string())
    }
}

impl From<polars::error::PolarsError> for InsightError {
    fn from(err: polars::error::PolarsError) -> Self {
        InsightError::DataError(err.to_string())
    }
}
