//! Error types for meteoplot-rs.

use thiserror::Error;

use crate::scene::GraphicHandle;
use crate::tessellation::TessError;

/// The main error type for meteoplot-core operations.
#[derive(Error, Debug)]
pub enum MeteoPlotError {
    /// Geometry that cannot be corrected locally (empty rings, NaN coordinates).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Polygon tessellation failed.
    #[error("tessellation failed: {0}")]
    Tessellation(#[from] TessError),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A graphic handle does not resolve to a live graphic.
    #[error("graphic {0} not found")]
    GraphicNotFound(GraphicHandle),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for meteoplot-core operations.
pub type Result<T> = std::result::Result<T, MeteoPlotError>;
