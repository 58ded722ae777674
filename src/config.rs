use crate::error::{ConsistencyError, Result};
use serde::{Deserialize, Serialize};
use std::{fs::File, path::Path};

/// How to pair estimate and ground truth sequences of different lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Reject with `LengthMismatch`
    FailFast,
    /// Pair up to the shorter length and drop the rest
    Truncate,
}

impl Default for LengthPolicy {
    fn default() -> Self {
        LengthPolicy::FailFast
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Confidence level of the chi-square acceptance interval
    pub confidence: f64,
    pub length_policy: LengthPolicy,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        ConsistencyConfig {
            confidence: 0.95,
            length_policy: LengthPolicy::FailFast,
        }
    }
}

impl ConsistencyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.confidence > 0.0 && self.confidence < 1.0 {
            Ok(())
        } else {
            Err(ConsistencyError::InvalidConfidence(self.confidence))
        }
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: ConsistencyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

pub fn read_config_from_json(config_path: impl AsRef<Path>) -> anyhow::Result<ConsistencyConfig> {
    let file = File::open(config_path)?;
    let config: ConsistencyConfig = serde_json::from_reader(file)?;
    config.validate()?;

    Ok(config)
}
