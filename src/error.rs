//! Error types for configuration and export

use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Failure reported by a rasterization service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// The host could not produce pixels for the content surface
    #[error("content capture failed: {reason}")]
    Failed { reason: String },

    /// The pixel buffer does not match its declared dimensions
    #[error("pixel buffer of {len} bytes does not hold a {width}x{height} RGBA image")]
    BufferSize { width: u32, height: u32, len: usize },
}

/// Errors surfaced by the export pipeline
#[derive(Error, Debug)]
pub enum ExportError {
    /// Rasterization of the content surface failed; nothing was written
    #[error("export failed: {0}")]
    Capture(#[from] CaptureError),

    /// Another export is still in flight
    #[error("an export is already in progress")]
    Busy,

    /// Ticket does not belong to the export currently in flight
    #[error("export ticket {0} is not in flight")]
    StaleTicket(u64),

    /// Scale factor must be finite and positive
    #[error("invalid export scale factor {0}")]
    InvalidScale(f32),

    /// PDF assembly failed
    #[error("pdf assembly failed: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error while saving the finished document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration JSON could not be parsed
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Margins leave no room for content
    #[error("page {width_px}x{height_px}px with {margin_px}px margins leaves no content area")]
    NonPositiveContent {
        width_px: f32,
        height_px: f32,
        margin_px: f32,
    },

    /// Device resolution must be positive
    #[error("invalid DPI {0}")]
    InvalidDpi(f32),

    /// Export scale factor must be finite and positive
    #[error("invalid export scale factor {0}")]
    InvalidScale(f32),
}
