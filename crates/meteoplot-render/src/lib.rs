//! Rendering backend for meteoplot-rs.
//!
//! This crate turns the core data model into pixels:
//! - the [`Camera`] and clip planes
//! - [`Canvas`] targets: a CPU rasterizer and a wgpu offscreen target
//! - the [`Painter`] front-end and per-kind graphic renderers with their cache
//! - axes, grid lines, legends and text placement

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Data is f64, drawing is f32 and pixels are integers
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]

pub mod axes;
pub mod camera;
pub mod canvas;
pub mod clip;
pub mod error;
pub mod formula;
pub mod gpu;
pub mod legend;
pub mod painter;
pub mod raster;
pub mod renderers;
pub mod screenshot;
pub mod text;

pub use axes::{label_skip, AxesFrame, AxesLabels, AxisLabelBoxes, BoxLayout, Quadrant, Side};
pub use camera::{clamp_distance, clamp_fov, Camera, Viewport};
pub use canvas::{Canvas, ColorVertex, DepthMode, TexVertex};
pub use clip::{ClipPlanes, ClipState};
pub use error::{RenderError, RenderResult};
pub use gpu::GpuCanvas;
pub use legend::{draw_legend, LegendBoxes, LegendGeometry};
pub use painter::{MarkerShape, Painter};
pub use raster::SoftwareCanvas;
pub use renderers::{
    create_renderer, draw_graphic, draw_scene, FrameStats, FrameToken, GraphicRenderer, RebuildSignal,
    RenderState, RendererCache, RENDERERS,
};
pub use screenshot::{encode_png, save_image, ScreenshotError};
pub use text::{place, place_screen, FontLibrary, ScreenBox, TextContext, TextRenderer};
