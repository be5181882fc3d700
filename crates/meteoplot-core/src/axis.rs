//! Axis models: tick values, tick labels and drawing flags.

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::legend::format_value;
use crate::text::{ChartText, Font};

/// Number of ticks the automatic tick search aims for.
const TARGET_TICKS: usize = 6;

/// One of the plot's data axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    min: f64,
    max: f64,
    tick_values: Vec<f64>,
    tick_labels: Vec<String>,
    /// Regenerate ticks whenever the range changes.
    pub auto_tick: bool,
    pub line_color: Vec4,
    pub line_width: f32,
    pub label: Option<ChartText>,
    pub tick_label_font: Font,
    pub tick_label_color: Vec4,
    /// Tick length in points.
    pub tick_length: f32,
    pub draw_label: bool,
    pub draw_tick_label: bool,
    pub visible: bool,
}

impl Default for Axis {
    fn default() -> Self {
        Self::new(-1.0, 1.0)
    }
}

impl Axis {
    /// Creates an axis over a range with automatic ticks.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        let mut axis = Self {
            min,
            max,
            tick_values: Vec::new(),
            tick_labels: Vec::new(),
            auto_tick: true,
            line_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            line_width: 1.0,
            label: None,
            tick_label_font: Font::default(),
            tick_label_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            tick_length: 8.0,
            draw_label: true,
            draw_tick_label: true,
            visible: true,
        };
        axis.update_ticks();
        axis
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Changes the range, regenerating ticks when automatic.
    pub fn set_min_max(&mut self, min: f64, max: f64) {
        self.min = min.min(max);
        self.max = min.max(max);
        if self.auto_tick {
            self.update_ticks();
        }
    }

    /// Sets explicit ticks and disables automatic ticks.
    ///
    /// Missing labels are filled with formatted values.
    pub fn set_ticks(&mut self, values: Vec<f64>, labels: Vec<String>) {
        self.auto_tick = false;
        self.tick_labels = values
            .iter()
            .enumerate()
            .map(|(i, v)| labels.get(i).cloned().unwrap_or_else(|| format_value(*v)))
            .collect();
        self.tick_values = values;
    }

    #[must_use]
    pub fn tick_values(&self) -> &[f64] {
        &self.tick_values
    }

    #[must_use]
    pub fn tick_labels(&self) -> &[String] {
        &self.tick_labels
    }

    /// Ticks inside the axis range, paired with their labels.
    pub fn ticks_in_range(&self) -> impl Iterator<Item = (f64, &str)> + '_ {
        self.tick_values
            .iter()
            .zip(&self.tick_labels)
            .filter(|(v, _)| **v >= self.min && **v <= self.max)
            .map(|(v, l)| (*v, l.as_str()))
    }

    #[must_use]
    pub fn with_label(mut self, label: ChartText) -> Self {
        self.label = Some(label);
        self
    }

    fn update_ticks(&mut self) {
        self.tick_values = nice_ticks(self.min, self.max, TARGET_TICKS);
        self.tick_labels = self.tick_values.iter().map(|v| format_value(*v)).collect();
    }
}

/// Tick values at a 1-2-5 interval covering `[min, max]`.
#[must_use]
pub fn nice_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    let range = max - min;
    if !range.is_finite() || range <= 0.0 || target == 0 {
        return if min.is_finite() { vec![min] } else { Vec::new() };
    }
    #[allow(clippy::cast_precision_loss)]
    let raw = range / target as f64;
    let mag = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * mag)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * mag);
    // Rounding to the step's decimals snaps values like 0.6000000000000001.
    let decimals = (-step.log10().floor()).max(0.0);
    let factor = 10f64.powf(decimals);
    let start = (min / step).ceil();
    let end = (max / step).floor();
    let mut ticks = Vec::new();
    let mut k = start;
    while k <= end {
        let v = (k * step * factor).round() / factor;
        ticks.push(if v == 0.0 { 0.0 } else { v });
        k += 1.0;
    }
    ticks
}

/// An extra vertical axis drawn at a fixed data location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZAxisOption {
    pub x: f64,
    pub y: f64,
    /// Ticks and labels extend to the left in eye space.
    pub left: bool,
}

impl ZAxisOption {
    #[must_use]
    pub fn new(x: f64, y: f64, left: bool) -> Self {
        Self { x, y, left }
    }
}

/// Grid line style and which directions are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLine {
    pub draw_x: bool,
    pub draw_y: bool,
    pub draw_z: bool,
    pub color: Vec4,
    pub width: f32,
    /// Draw after the graphics instead of underneath them.
    pub top: bool,
}

impl Default for GridLine {
    fn default() -> Self {
        Self {
            draw_x: false,
            draw_y: false,
            draw_z: false,
            color: Vec4::new(0.75, 0.75, 0.75, 1.0),
            width: 1.0,
            top: false,
        }
    }
}

impl GridLine {
    /// Every direction enabled.
    #[must_use]
    pub fn all() -> Self {
        Self {
            draw_x: true,
            draw_y: true,
            draw_z: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nice_ticks() {
        assert_eq!(nice_ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(nice_ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(nice_ticks(-3.0, 3.0, 6), vec![-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(nice_ticks(5.0, 5.0, 5), vec![5.0]);
    }

    #[test]
    fn test_axis_auto_ticks_follow_range() {
        let mut axis = Axis::new(0.0, 10.0);
        assert!(axis.tick_values().contains(&10.0));
        axis.set_min_max(100.0, 0.0);
        assert_eq!(axis.min(), 0.0);
        assert_eq!(axis.max(), 100.0);
        assert_eq!(axis.tick_labels().last().map(String::as_str), Some("100"));
    }

    #[test]
    fn test_explicit_ticks_survive_range_change() {
        let mut axis = Axis::new(0.0, 10.0);
        axis.set_ticks(vec![1.0, 5.0, 20.0], vec!["one".into()]);
        axis.set_min_max(0.0, 8.0);
        assert_eq!(axis.tick_values(), &[1.0, 5.0, 20.0]);
        let visible: Vec<_> = axis.ticks_in_range().collect();
        assert_eq!(visible, vec![(1.0, "one"), (5.0, "5")]);
    }
}
