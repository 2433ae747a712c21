use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PhotError, Result};
use crate::rules::NamingRules;
use crate::select::DEFAULT_SELECTION;

/// Settings for a field conversion run. Every field has a default, so a
/// config file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub naming: NamingRules,
    pub selection: String,
    /// Filter whose drizzled image supplies the WCS sidecar.
    pub wcs_filter: String,
    pub partitions: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            naming: NamingRules::default(),
            selection: DEFAULT_SELECTION.to_string(),
            wcs_filter: "F475W".to_string(),
            partitions: 3,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PhotError::config(format!("invalid pipeline config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| PhotError::io(path, e))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.partitions == 0 {
            return Err(PhotError::config("partitions must be at least 1"));
        }
        if self.wcs_filter.trim().is_empty() {
            return Err(PhotError::config("wcs_filter must not be empty"));
        }
        Ok(())
    }
}
