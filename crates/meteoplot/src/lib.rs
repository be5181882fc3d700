//! meteoplot-rs: 3D plotting of meteorological and geospatial data.
//!
//! A [`Plot3D`] owns a scene of graphics, the data-to-cube transform, the
//! camera and everything drawn around the data (box, grid, axes, legend,
//! title). A drawing-context host drives it through the [`PlotLifecycle`]
//! hooks; [`render_to_image`] and [`render_to_file`] do that headlessly.
//!
//! # Quick Start
//!
//! ```no_run
//! use meteoplot::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let mut plot = Plot3D::new();
//!     let points = vec![
//!         Vec3::new(0.0, 0.0, 0.0),
//!         Vec3::new(10.0, 5.0, 1.0),
//!         Vec3::new(3.0, 8.0, 2.0),
//!     ];
//!     plot.add_graphic(Graphic::points(points, PointStyle::default()));
//!     plot.set_title("Stations");
//!
//!     render_to_file(&mut plot, "stations.png", 800, 600)?;
//!     Ok(())
//! }
//! ```
//!
//! # Maps
//!
//! [`MapPlot3D`] adds a map projection. Projected maps replace the
//! Cartesian x/y grid with longitude/latitude lines supplied by a
//! [`MapGridProvider`].

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

mod headless;
mod map_plot;
mod plot;

use thiserror::Error;

pub use headless::{default_screenshot_name, render_to_file, render_to_image, render_to_image_gpu};
pub use map_plot::{GridLabel, MapGridProvider, MapPlot3D, ProjectionInfo};
pub use plot::{Plot3D, PlotLifecycle};

// Re-export core types
pub use meteoplot_core::{
    nice_ticks, AspectType, Axis, Axis3, ChartText, ColorBar, ColorBreak, ColorMap, ColorMapRegistry,
    CubeShape, CylinderShape, PipeShape,
    ExtendType, Extent3D, Font, Graphic, GraphicHandle, GraphicKind, GridLine, HAlign,
    ImageShape, LegendLabelLocation, LegendScheme, LegendType, Lighting, LineStyle, MeshShape, MeteoPlotError,
    Normalize, ParticleSet, PlotOptions, PointMarker, PointShape, PointStyle, PolygonShape,
    PolygonStyle, PolylineShape, Scene, Shape, Style, TextShape, TextureShape, Transform, VAlign,
    VolumeShape, ZAxisOption,
};
pub use meteoplot_core::{Mat4, Vec2, Vec3, Vec4};

// Re-export render types
pub use meteoplot_render::{
    Camera, Canvas, FontLibrary, FrameStats, GpuCanvas, RenderError, SoftwareCanvas, Viewport,
};

/// Errors surfaced by the plot facade.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error(transparent)]
    Core(#[from] MeteoPlotError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<meteoplot_render::ScreenshotError> for PlotError {
    fn from(e: meteoplot_render::ScreenshotError) -> Self {
        Self::Render(e.into())
    }
}

/// A specialized Result type for plot operations.
pub type Result<T> = std::result::Result<T, PlotError>;

/// Installs `env_logger` once; later calls do nothing.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
