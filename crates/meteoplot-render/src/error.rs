//! Rendering error types.

use meteoplot_core::MeteoPlotError;
use thiserror::Error;

use crate::screenshot::ScreenshotError;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Geometry or attribute data could not be turned into draw calls.
    #[error("resource upload failed: {0}")]
    ResourceUpload(String),

    /// Texture creation or sampling setup failed.
    #[error("texture error: {0}")]
    Texture(String),

    /// Font data could not be parsed.
    #[error("font error: {0}")]
    Font(String),

    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// GPU readback buffer could not be mapped.
    #[error("GPU buffer mapping failed")]
    BufferMapFailed,

    /// An operation needed a drawing context that was never attached.
    #[error("no drawing context attached")]
    NoContext,

    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),

    #[error(transparent)]
    Core(#[from] MeteoPlotError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
