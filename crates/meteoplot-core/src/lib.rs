//! Core data model for meteoplot-rs.
//!
//! This crate holds everything that does not touch a drawing context:
//! - [`Extent3D`] and the data-to-cube [`Transform`]
//! - the graphic model ([`Shape`], [`Style`], [`Graphic`]) and the [`Scene`] arena
//! - legend and axis models, color maps and normalization
//! - the polygon tessellator
//! - plot configuration ([`PlotOptions`]) and [`Lighting`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Geometry is stored in f32 and range math in f64
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::similar_names)]

pub mod axis;
pub mod color_map;
pub mod error;
pub mod extent;
pub mod graphic;
pub mod legend;
pub mod lighting;
pub mod options;
pub mod scene;
pub mod shape;
pub mod tessellation;
pub mod text;
pub mod transform;

pub use axis::{nice_ticks, Axis, GridLine, ZAxisOption};
pub use color_map::{ColorMap, ColorMapRegistry};
pub use error::{MeteoPlotError, Result};
pub use extent::{Axis3, Extent3D};
pub use graphic::{
    Graphic, GraphicContent, GraphicKind, LineStyle, PointMarker, PointStyle, PolygonStyle, Style,
};
pub use legend::{
    format_value, ColorBar, ColorBreak, ExtendType, LegendLabelLocation, LegendScheme, LegendType,
    Normalize,
};
pub use lighting::Lighting;
pub use options::PlotOptions;
pub use scene::{GraphicHandle, Scene};
pub use shape::{
    CubeShape, CylinderShape, ImageShape, MeshShape, ParticleSet, PipeShape, PointShape, PolygonShape,
    PolylineShape, Shape, ShapeKind, TextShape, TextureShape, VolumeShape,
};
pub use tessellation::{TessError, TessVertex, Tessellation};
pub use text::{ChartText, Font, HAlign, VAlign};
pub use transform::{AspectType, Transform};

// Re-export glam types for convenience
pub use glam::{DVec3, Mat4, Vec2, Vec3, Vec4};
