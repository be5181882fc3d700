//! Configuration options for a plot.

use std::path::Path;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::axis::GridLine;
use crate::error::{MeteoPlotError, Result};
use crate::lighting::Lighting;
use crate::transform::AspectType;

/// User toggles of a 3D plot.
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Clear color.
    pub background: Vec4,
    /// Color of axes, ticks and labels.
    pub foreground: Vec4,
    /// Color of the box faces and base outline.
    pub box_color: Vec4,

    /// Draw the back faces of the axes box.
    pub boxed: bool,
    /// Draw the base rectangle at the bottom of the box.
    pub draw_base: bool,
    /// Draw x and y axes.
    pub display_xy: bool,
    /// Draw the z axis.
    pub display_z: bool,
    pub draw_bounding_box: bool,

    /// Clip graphics to the axes extent.
    pub clip_plane: bool,
    /// Axes extent is independent of the draw extent. Forces clipping off.
    pub axes_zoom: bool,
    /// Keep extents when graphics are added.
    pub fix_extent: bool,

    pub orthographic: bool,
    pub distance: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: AspectType,
    pub z_scale: f32,

    pub dpi_scale: f32,
    /// Gap between ticks and tick labels, in points.
    pub tick_space: f32,
    /// Converts point sizes to canonical lengths.
    pub len_scale: f32,

    /// Rotation about x in degrees.
    pub angle_x: f32,
    /// Rotation about z in degrees.
    pub angle_y: f32,
    pub head: f32,
    pub pitch: f32,

    pub lighting: Lighting,
    pub grid_line: GridLine,
    pub antialias: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            background: Vec4::ONE,
            foreground: Vec4::new(0.0, 0.0, 0.0, 1.0),
            box_color: Vec4::new(0.75, 0.75, 0.75, 1.0),
            boxed: true,
            draw_base: true,
            display_xy: true,
            display_z: true,
            draw_bounding_box: false,
            clip_plane: true,
            axes_zoom: false,
            fix_extent: false,
            orthographic: true,
            distance: 5.0,
            fov: 45.0,
            aspect: AspectType::Auto,
            z_scale: 1.0,
            dpi_scale: 1.0,
            tick_space: 5.0,
            len_scale: 0.01,
            angle_x: -45.0,
            angle_y: 45.0,
            head: 0.0,
            pitch: 0.0,
            lighting: Lighting::default(),
            grid_line: GridLine::all(),
            antialias: false,
        }
    }
}

impl PlotOptions {
    /// Parses options from JSON and validates them.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading plot options from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks value ranges that would make the projection degenerate.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<()> {
        if !(self.distance > 0.0) {
            return Err(MeteoPlotError::Config(format!("distance must be positive, got {}", self.distance)));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(MeteoPlotError::Config(format!("fov must be in (0, 180), got {}", self.fov)));
        }
        if !(self.dpi_scale > 0.0) {
            return Err(MeteoPlotError::Config(format!("dpi_scale must be positive, got {}", self.dpi_scale)));
        }
        if !(self.z_scale > 0.0) {
            return Err(MeteoPlotError::Config(format!("z_scale must be positive, got {}", self.z_scale)));
        }
        Ok(())
    }

    /// Resets the rotation angles.
    pub fn reset_angles(&mut self) {
        self.angle_x = -45.0;
        self.angle_y = 45.0;
        self.head = 0.0;
        self.pitch = 0.0;
    }

    /// Sets the background and switches the foreground to white on black.
    pub fn set_background(&mut self, color: Vec4) {
        self.background = color;
        if color.truncate() == glam::Vec3::ZERO {
            self.set_foreground(Vec4::ONE);
        }
    }

    /// Sets the foreground used by the box, grid and axes.
    pub fn set_foreground(&mut self, color: Vec4) {
        self.foreground = color;
        self.box_color = color;
        self.grid_line.color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let o = PlotOptions::default();
        assert!(o.orthographic);
        assert_eq!(o.distance, 5.0);
        assert_eq!(o.fov, 45.0);
        assert_eq!((o.angle_x, o.angle_y), (-45.0, 45.0));
        assert!(o.boxed && o.draw_base && o.display_xy && o.display_z);
        assert!(!o.draw_bounding_box);
        assert!(o.clip_plane);
        assert!(!o.axes_zoom);
        assert_eq!(o.tick_space, 5.0);
        assert_eq!(o.len_scale, 0.01);
        assert_eq!(o.aspect, AspectType::Auto);
    }

    #[test]
    fn test_partial_json() {
        let o = PlotOptions::from_json_str(r#"{"orthographic": false, "fov": 30.0}"#).unwrap();
        assert!(!o.orthographic);
        assert_eq!(o.fov, 30.0);
        assert_eq!(o.distance, 5.0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut o = PlotOptions::default();
        o.aspect = AspectType::Equal;
        o.angle_y = 120.0;
        let back = PlotOptions::from_json_str(&o.to_json_string().unwrap()).unwrap();
        assert_eq!(back, o);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            PlotOptions::from_json_str(r#"{"distance": 0.0}"#),
            Err(MeteoPlotError::Config(_))
        ));
        assert!(PlotOptions::from_json_str(r#"{"fov": 180.0}"#).is_err());
        assert!(matches!(PlotOptions::from_json_str("{not json"), Err(MeteoPlotError::Json(_))));
    }

    #[test]
    fn test_black_background_flips_foreground() {
        let mut o = PlotOptions::default();
        o.set_background(Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(o.foreground, Vec4::ONE);
        assert_eq!(o.grid_line.color, Vec4::ONE);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            PlotOptions::from_json_file("/nonexistent/meteoplot/options.json"),
            Err(MeteoPlotError::Io(_))
        ));
    }
}
