//! Overridable settings for pagination, chrome and export

use crate::error::ConfigError;
use crate::export::ExportSettings;
use crate::layout::{PageGeometry, PageSetup, DEFAULT_DEBOUNCE_MS};
use crate::render::ChromeSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// All named settings; every field falls back to its default when omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginatorConfig {
    pub page: PageSetup,
    pub chrome: ChromeSettings,
    pub debounce_ms: u64,
    pub export: ExportSettings,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            page: PageSetup::default(),
            chrome: ChromeSettings::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            export: ExportSettings::default(),
        }
    }
}

impl PaginatorConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Reject settings that would leave no pagination unit
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry().validate()?;

        let scale = self.export.scale_factor;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::InvalidScale(scale));
        }
        Ok(())
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(&self.page)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
