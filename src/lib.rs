//! Kolosal Insight - cross-domain time-series association engine
//!
//! This crate aligns time-stamped measurements from independent domains
//! (weather, economic indicators, social signals, ...) onto one shared grid
//! and quantifies which signals move together with a chosen target:
//! - Resampling by bucket mean onto an epoch-anchored time grid
//! - Pearson and Spearman correlation with Student-t significance
//! - Kraskov kNN mutual information
//! - Deterministic ranking of candidate features
//!
//! # Modules
//!
//! ## Data
//! - [`table`] - Labeled time-series tables and the polars bridge
//! - [`alignment`] - Frequencies, time grids and the series aligner
//!
//! ## Statistics
//! - [`association`] - Association measures, records and matrices
//! - [`ranking`] - Feature ranking with significance filtering
//!
//! ## Orchestration
//! - [`oplog`] - Append-only operation log
//! - [`session`] - Caller-owned sessions and engine configuration
//!
//! # Example
//!
//! ```no_run
//! use kolosal_insight::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! let ts: Vec<_> = (0..3)
//!     .map(|h| Some(Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()))
//!     .collect();
//!
//! let request = AnalysisRequest::new("weather", "temperature")
//!     .with_table(
//!         LabeledSeriesTable::new("weather")
//!             .with_time_column("ts", ts.clone())
//!             .with_values("temperature", &[10.0, 12.0, 14.0]),
//!         "ts",
//!     )
//!     .with_table(
//!         LabeledSeriesTable::new("economic")
//!             .with_time_column("ts", ts)
//!             .with_values("stocks", &[100.0, 105.0, 110.0]),
//!         "ts",
//!     );
//!
//! let session = AnalysisSession::new();
//! let report = session.analyze(&request)?;
//! println!("{}", report.ranked.to_json()?);
//! # Ok::<(), kolosal_insight::InsightError>(())
//! ```

// Core error handling
pub mod error;

// Data
pub mod table;
pub mod alignment;

// Statistics
pub mod association;
pub mod ranking;

// Orchestration
pub mod oplog;
pub mod session;

pub use error::{InsightError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::alignment::{
        AlignedTableSet, AlignmentConfig, ColumnCoverage, Frequency, SeriesAligner, TimeGrid,
    };
    pub use crate::association::{
        AssociationCalculator, AssociationConfig, AssociationMatrix, AssociationRecord,
        CorrelationMethod, KraskovEstimator, PearsonCorrelation, SpearmanCorrelation, Statistic,
    };
    pub use crate::error::{InsightError, Result};
    pub use crate::oplog::{OperationLog, OperationLogEntry, ParamsDigest};
    pub use crate::ranking::{FeatureRanker, RankMetric, RankOptions, RankedFeatureList};
    pub use crate::session::{
        AnalysisReport, AnalysisRequest, AnalysisSession, EngineConfig, RankingConfig,
    };
    pub use crate::table::{Column, ColumnData, LabeledSeriesTable};
}
