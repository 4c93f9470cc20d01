use crate::error::{CompressError, Result};
use crate::rules::BinaryFeatureSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds closer than this are treated as the same split point.
pub const THRESHOLD_EPSILON: f64 = 1e-6;
/// Decimal places used when the extractor renders split thresholds.
pub const EXTRACTED_THRESHOLD_PRECISION: usize = 5;
/// Child index marking "no child" in fitted tree arrays.
pub const TREE_LEAF: i64 = -1;

/// How the deduplicator decides that two rules differ only in their last bound.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKeyPolicy {
    /// `(variable, operator)` of every condition plus the label.
    #[default]
    VariableOperator,
    /// Every condition but the last compared in full, the last one by
    /// `(variable, operator)` only, plus the label.
    ExactPrefix,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    pub binary_features: BinaryFeatureSet,
    pub shape_key: ShapeKeyPolicy,
}

impl CompressConfig {
    pub fn new<I, S>(binary_features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            binary_features: binary_features.into_iter().collect(),
            shape_key: ShapeKeyPolicy::default(),
        }
    }

    pub fn with_shape_key(mut self, shape_key: ShapeKeyPolicy) -> Self {
        self.shape_key = shape_key;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(CompressError::from)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&raw)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            binary_features = config.binary_features.len(),
            "loaded compressor config"
        );
        Ok(config)
    }
}
