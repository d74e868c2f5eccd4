//! Explicit analytics configuration.
//!
//! Defaults travel with each request as a value; nothing here is global. A
//! JSON file may override any subset of keys, unknown keys are rejected.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorOptions;
use crate::moving_average::MovingAverageOptions;
use crate::risk::RiskOptions;
use crate::valuation::{DcfOptions, DdmOptions, IndustryOptions};
use crate::{AnalyticsError, CoreError};

pub const CONFIG_ENV_VAR: &str = "FERROQUANT_CONFIG";

/// Row count and precision applied to outbound tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputOptions {
    pub tail_rows: usize,
    pub round_digits: u32,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            tail_rows: 30,
            round_digits: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    pub indicators: IndicatorOptions,
    pub moving_averages: MovingAverageOptions,
    pub risk: RiskOptions,
    pub dcf: DcfOptions,
    pub ddm: DdmOptions,
    pub industry: IndustryOptions,
    pub output: OutputOptions,
    /// Batch pool size; `None` uses every available core.
    pub worker_threads: Option<usize>,
}

impl AnalyticsConfig {
    pub fn from_json_str(input: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// `path`, else the file named by `FERROQUANT_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        match resolve_config_path(path) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading analytics config");
                Self::from_path(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        self.indicators.validate()?;
        self.moving_averages.validate()?;
        self.risk.validate()?;
        self.dcf.validate()?;
        self.ddm.validate()?;
        self.industry.validate()?;
        if self.worker_threads == Some(0) {
            return Err(AnalyticsError::invalid_parameter(
                "worker_threads",
                "must be positive when set",
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = path {
        return Some(path.to_path_buf());
    }
    env::var_os(CONFIG_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
