//! Physical page geometry in device pixels

use crate::error::ConfigError;
use crate::Rect;
use serde::{Deserialize, Serialize};

/// Points per inch in PDF user space
pub const POINTS_PER_INCH: f32 = 72.0;

/// Physical page description, in inches at a device resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageSetup {
    pub page_width_in: f32,
    pub page_height_in: f32,
    pub margin_in: f32,
    pub dpi: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            page_width_in: 8.5, // US Letter
            page_height_in: 11.0,
            margin_in: 1.0,
            dpi: 96.0,
        }
    }
}

/// Derived pixel dimensions of one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub page_width_px: f32,
    pub page_height_px: f32,
    pub margin_px: f32,
    pub content_width_px: f32,
    pub content_height_px: f32,
    pub dpi: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::new(&PageSetup::default())
    }
}

impl PageGeometry {
    pub fn new(setup: &PageSetup) -> Self {
        let page_width_px = setup.page_width_in * setup.dpi;
        let page_height_px = setup.page_height_in * setup.dpi;
        let margin_px = setup.margin_in * setup.dpi;

        Self {
            page_width_px,
            page_height_px,
            margin_px,
            content_width_px: page_width_px - 2.0 * margin_px,
            content_height_px: page_height_px - 2.0 * margin_px,
            dpi: setup.dpi,
        }
    }

    /// Whether every page and content dimension is finite and strictly positive
    pub fn is_valid(&self) -> bool {
        [
            self.dpi,
            self.page_width_px,
            self.page_height_px,
            self.content_width_px,
            self.content_height_px,
        ]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0)
    }

    /// Reject geometry that leaves no positive pagination unit
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(ConfigError::InvalidDpi(self.dpi));
        }
        if !self.is_valid() {
            return Err(ConfigError::NonPositiveContent {
                width_px: self.page_width_px,
                height_px: self.page_height_px,
                margin_px: self.margin_px,
            });
        }
        Ok(())
    }

    /// Content area within a full page
    pub fn content_rect(&self) -> Rect {
        Rect::new(
            self.margin_px,
            self.margin_px,
            self.content_width_px,
            self.content_height_px,
        )
    }

    /// Convert device pixels to PDF points
    pub fn px_to_pt(&self, px: f32) -> f32 {
        px * POINTS_PER_INCH / self.dpi
    }
}
