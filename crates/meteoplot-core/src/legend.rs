//! Legend schemes, normalization and the colorbar model.
//!
//! A [`LegendScheme`] is either an ordered list of [`ColorBreak`]s (discrete
//! legend) or a [`ColorMap`] plus a [`Normalize`] function (continuous
//! colorbar). The [`ColorBar`] wraps a scheme with its layout options.

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::color_map::ColorMap;
use crate::text::{ChartText, Font};

/// One legend entry: a value range and how it is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBreak {
    pub start_value: f64,
    pub end_value: f64,
    pub caption: String,
    pub color: Vec4,
    pub outline_color: Vec4,
    pub draw_outline: bool,
    /// Marks the "missing value" entry, which legends never draw.
    pub no_data: bool,
}

impl ColorBreak {
    /// A break covering `[start, end]` captioned with the end value.
    pub fn new(start_value: f64, end_value: f64, color: Vec4) -> Self {
        Self {
            start_value,
            end_value,
            caption: format_value(end_value),
            color,
            outline_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            draw_outline: false,
            no_data: false,
        }
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    /// A no-data break.
    pub fn no_data(value: f64, color: Vec4) -> Self {
        Self {
            no_data: true,
            caption: "NoData".to_string(),
            ..Self::new(value, value, color)
        }
    }
}

/// How breaks relate to values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LegendType {
    /// Each break is one category; labels sit in the middle of swatches.
    UniqueValue,
    /// Breaks are consecutive ranges; labels sit on boundaries.
    #[default]
    GraduatedColor,
    SingleSymbol,
}

/// Which ends of a bounded normalization get an overflow swatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtendType {
    #[default]
    Neither,
    Min,
    Max,
    Both,
}

impl ExtendType {
    #[must_use]
    pub fn has_min(self) -> bool {
        matches!(self, ExtendType::Min | ExtendType::Both)
    }

    #[must_use]
    pub fn has_max(self) -> bool {
        matches!(self, ExtendType::Max | ExtendType::Both)
    }
}

/// Maps data values to a fraction in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalize {
    Linear { vmin: f64, vmax: f64, clip: bool },
    Log { vmin: f64, vmax: f64, clip: bool },
    /// Discrete bins between consecutive boundaries, spread over `n_colors`.
    Boundary { boundaries: Vec<f64>, n_colors: usize, extend: ExtendType },
}

impl Default for Normalize {
    fn default() -> Self {
        Normalize::Linear {
            vmin: 0.0,
            vmax: 1.0,
            clip: true,
        }
    }
}

impl Normalize {
    /// Linear normalization over `[vmin, vmax]`, clipped.
    #[must_use]
    pub fn linear(vmin: f64, vmax: f64) -> Self {
        Normalize::Linear { vmin, vmax, clip: true }
    }

    /// Fraction of the bar at which `v` sits.
    #[must_use]
    pub fn apply(&self, v: f64) -> f32 {
        let t = match self {
            Normalize::Linear { vmin, vmax, clip } => {
                let t = if vmax > vmin { (v - vmin) / (vmax - vmin) } else { 0.0 };
                if *clip { t.clamp(0.0, 1.0) } else { t }
            }
            Normalize::Log { vmin, vmax, clip } => {
                if v <= 0.0 || *vmin <= 0.0 || vmax <= vmin {
                    0.0
                } else {
                    let t = (v.log10() - vmin.log10()) / (vmax.log10() - vmin.log10());
                    if *clip { t.clamp(0.0, 1.0) } else { t }
                }
            }
            Normalize::Boundary { boundaries, .. } => {
                let regions = self.regions();
                if boundaries.len() < 2 || regions == 0 {
                    return 0.0;
                }
                let first = boundaries[0];
                let last = boundaries[boundaries.len() - 1];
                if v <= first {
                    0.0
                } else if v >= last {
                    1.0
                } else {
                    // Boundary values map to the bar positions of their index.
                    let k = boundaries.partition_point(|b| *b <= v).saturating_sub(1);
                    let lo = boundaries[k];
                    let hi = boundaries[(k + 1).min(boundaries.len() - 1)];
                    let frac = if hi > lo { (v - lo) / (hi - lo) } else { 0.0 };
                    #[allow(clippy::cast_precision_loss)]
                    let t = (k as f64 + frac) / (boundaries.len() - 1) as f64;
                    t
                }
            }
        };
        #[allow(clippy::cast_possible_truncation)]
        let t = t as f32;
        t
    }

    /// Number of discrete color regions, zero for continuous normalizations.
    #[must_use]
    pub fn regions(&self) -> usize {
        match self {
            Normalize::Boundary {
                boundaries, extend, ..
            } => {
                let mut n = boundaries.len().saturating_sub(1);
                if extend.has_min() {
                    n += 1;
                }
                if extend.has_max() {
                    n += 1;
                }
                n
            }
            _ => 0,
        }
    }

    /// Lower bound of the normalized range.
    #[must_use]
    pub fn vmin(&self) -> f64 {
        match self {
            Normalize::Linear { vmin, .. } | Normalize::Log { vmin, .. } => *vmin,
            Normalize::Boundary { boundaries, .. } => boundaries.first().copied().unwrap_or(0.0),
        }
    }

    /// Upper bound of the normalized range.
    #[must_use]
    pub fn vmax(&self) -> f64 {
        match self {
            Normalize::Linear { vmax, .. } | Normalize::Log { vmax, .. } => *vmax,
            Normalize::Boundary { boundaries, .. } => boundaries.last().copied().unwrap_or(1.0),
        }
    }
}

/// Breaks or a color map plus normalization, read by the legend renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegendScheme {
    pub legend_type: LegendType,
    pub breaks: Vec<ColorBreak>,
    pub color_map: Option<ColorMap>,
    pub normalize: Normalize,
    pub extend: ExtendType,
}

impl LegendScheme {
    /// A discrete scheme from breaks.
    #[must_use]
    pub fn from_breaks(legend_type: LegendType, breaks: Vec<ColorBreak>) -> Self {
        Self {
            legend_type,
            breaks,
            ..Self::default()
        }
    }

    /// Graduated breaks from consecutive values and one color per interval.
    #[must_use]
    pub fn graduated(values: &[f64], colors: &[Vec4]) -> Self {
        let breaks = values
            .windows(2)
            .zip(colors)
            .map(|(w, c)| ColorBreak::new(w[0], w[1], *c))
            .collect();
        Self::from_breaks(LegendType::GraduatedColor, breaks)
    }

    /// A continuous scheme.
    #[must_use]
    pub fn continuous(color_map: ColorMap, normalize: Normalize) -> Self {
        Self {
            legend_type: LegendType::GraduatedColor,
            color_map: Some(color_map),
            normalize,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_extend(mut self, extend: ExtendType) -> Self {
        self.extend = extend;
        self
    }

    /// Whether this scheme is drawn as a continuous colorbar.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.color_map.is_some()
    }

    /// Breaks with a trailing no-data entry removed.
    #[must_use]
    pub fn drawable_breaks(&self) -> &[ColorBreak] {
        match self.breaks.last() {
            Some(last) if last.no_data => &self.breaks[..self.breaks.len() - 1],
            _ => &self.breaks,
        }
    }

    /// Color for a value, looked up through the color map or the breaks.
    #[must_use]
    pub fn color_for(&self, v: f64) -> Vec4 {
        if let Some(map) = &self.color_map {
            return map.sample(self.normalize.apply(v));
        }
        let breaks = self.drawable_breaks();
        breaks
            .iter()
            .find(|b| {
                if self.legend_type == LegendType::UniqueValue {
                    b.start_value == v
                } else {
                    v >= b.start_value && v < b.end_value
                }
            })
            .or_else(|| breaks.last().filter(|b| v >= b.end_value))
            .or_else(|| breaks.first())
            .map_or(Vec4::ZERO, |b| b.color)
    }
}

/// Where the colorbar title goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LegendLabelLocation {
    Top,
    Bottom,
    Left,
    /// Alongside the bar on the side facing the plot.
    In,
    /// Alongside the bar on the outer side.
    #[default]
    Right,
}

/// A chart legend: scheme plus layout options.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBar {
    pub scheme: LegendScheme,
    /// Bar height over bar width.
    pub aspect: f32,
    /// Bar length as a fraction of the plot height.
    pub shrink: f32,
    /// Horizontal offset in points.
    pub x_shift: f32,
    pub auto_tick: bool,
    pub tick_locations: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub tick_label_angle: f32,
    pub tick_label_font: Font,
    pub tick_color: Vec4,
    pub tick_length: f32,
    pub tick_width: f32,
    pub inside_tick: bool,
    pub draw_min_label: bool,
    pub draw_neatline: bool,
    pub neatline_color: Vec4,
    pub neatline_width: f32,
    pub label: Option<ChartText>,
    pub label_location: LegendLabelLocation,
}

impl ColorBar {
    pub fn new(scheme: LegendScheme) -> Self {
        Self {
            scheme,
            aspect: 20.0,
            shrink: 1.0,
            x_shift: 0.0,
            auto_tick: true,
            tick_locations: Vec::new(),
            tick_labels: Vec::new(),
            tick_label_angle: 0.0,
            tick_label_font: Font::default(),
            tick_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            tick_length: 8.0,
            tick_width: 1.0,
            inside_tick: false,
            draw_min_label: false,
            draw_neatline: true,
            neatline_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            neatline_width: 1.0,
            label: None,
            label_location: LegendLabelLocation::default(),
        }
    }

    /// Switches to explicit ticks.
    #[must_use]
    pub fn with_ticks(mut self, locations: Vec<f64>, labels: Vec<String>) -> Self {
        self.auto_tick = false;
        self.tick_locations = locations;
        self.tick_labels = labels;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: ChartText, location: LegendLabelLocation) -> Self {
        self.label = Some(label);
        self.label_location = location;
        self
    }

    /// Label text for an explicit tick, falling back to the formatted value.
    #[must_use]
    pub fn tick_label(&self, index: usize) -> String {
        self.tick_labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| self.tick_locations.get(index).map_or_else(String::new, |v| format_value(*v)))
    }
}

/// Formats a tick or break value without trailing zeros.
#[must_use]
pub fn format_value(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
