//! Chart text, fonts and alignment.

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Horizontal alignment of a text box relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HAlign {
    /// Box starts at the anchor.
    #[default]
    Left,
    Center,
    /// Box ends at the anchor.
    Right,
}

/// Vertical alignment of a text box relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VAlign {
    /// Box hangs below the anchor.
    Top,
    Center,
    /// Box sits on the anchor.
    #[default]
    Bottom,
}

/// Font request. The family is resolved against a font library at draw time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    /// Size in points before dpi scaling.
    pub size: f32,
    pub bold: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size: 14.0,
            bold: false,
        }
    }
}

impl Font {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
        }
    }
}

/// A string with its font and color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartText {
    pub text: String,
    pub font: Font,
    pub color: Vec4,
}

impl ChartText {
    /// Black text in the default font.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::default(),
            color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }

    #[must_use]
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Whether the text is a formula, written between a pair of `$` signs.
    #[must_use]
    pub fn is_formula(&self) -> bool {
        is_formula(&self.text)
    }
}

/// Content sniffing for formula strings: `$...$` with a non-empty body.
#[must_use]
pub fn is_formula(text: &str) -> bool {
    let t = text.trim();
    t.len() > 2 && t.starts_with('$') && t.ends_with('$')
}
