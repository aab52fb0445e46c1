//! Engine-wide configuration

use crate::alignment::{AlignmentConfig, Frequency};
use crate::association::AssociationConfig;
use crate::error::{InsightError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ranking defaults applied by [`AnalysisSession`](super::AnalysisSession)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// `top_n` used when a request does not give one
    pub default_top_n: usize,
    /// Significance threshold for correlation rankings
    pub max_p_value: Option<f64>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_top_n: 10,
            max_p_value: None,
        }
    }
}

impl RankingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_top_n(mut self, top_n: usize) -> Self {
        self.default_top_n = top_n;
        self
    }

    pub fn with_max_p_value(mut self, max_p_value: Option<f64>) -> Self {
        self.max_p_value = max_p_value;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_top_n == 0 {
            return Err(InsightError::invalid_parameter(
                "default_top_n",
                self.default_top_n,
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

/// Configuration for alignment, association and ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub alignment: AlignmentConfig,
    pub association: AssociationConfig,
    pub ranking: RankingConfig,
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grid frequency
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.alignment.frequency = frequency;
        self
    }

    pub fn with_alignment(mut self, alignment: AlignmentConfig) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_association(mut self, association: AssociationConfig) -> Self {
        self.association = association;
        self
    }

    pub fn with_ranking(mut self, ranking: RankingConfig) -> Self {
        self.ranking = ranking;
        self
    }

    /// Parse a (possibly partial) JSON document; absent fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| InsightError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.alignment.validate()?;
        self.association.validate()?;
        self.ranking.validate()
    }
}
