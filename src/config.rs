use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealignerConfig {
    /// Matches scoring below this are logged and flagged in reports, never rejected.
    pub low_accuracy_threshold: f64,
    /// Merge records that share a verse id into one record per verse.
    pub merge_split_verses: bool,
}

impl RealignerConfig {
    pub const DEFAULT_LOW_ACCURACY_THRESHOLD: f64 = 0.5;

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read realigner config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| AlignmentError::json("parse realigner config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        if !(0.0..=1.0).contains(&self.low_accuracy_threshold) {
            return Err(AlignmentError::invalid_input(format!(
                "low_accuracy_threshold must be within [0, 1], got {}",
                self.low_accuracy_threshold
            )));
        }
        Ok(())
    }
}

impl Default for RealignerConfig {
    fn default() -> Self {
        Self {
            low_accuracy_threshold: Self::DEFAULT_LOW_ACCURACY_THRESHOLD,
            merge_split_verses: false,
        }
    }
}
