//! Time-series alignment module
//!
//! Reconciles series sampled at different rates and over different ranges:
//! - Epoch-anchored bucketing at a configurable [`Frequency`]
//! - A shared [`TimeGrid`] spanning every domain's observations
//! - Bucket-mean resampling and reindexing via [`SeriesAligner`]
//! - Coverage reporting on the resulting [`AlignedTableSet`]

mod aligned;
mod aligner;
mod frequency;
mod grid;

pub use aligned::{AlignedTableSet, ColumnCoverage};
pub use aligner::{AlignmentConfig, SeriesAligner};
pub use frequency::Frequency;
pub use grid::TimeGrid;
