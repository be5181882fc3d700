//! Text measurement, rasterization and screen placement.
//!
//! Parsed fonts live in a [`FontLibrary`] for the lifetime of the plot. A
//! [`TextRenderer`] is bound to one [`Font`] request and lives for at most
//! one frame: it is replaced when the requested font changes and released
//! when the frame ends.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};
use meteoplot_core::{ChartText, Font, HAlign, VAlign};

use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::formula::{self, FormulaLayout, FORMULA_INSET};
use crate::painter::Painter;

/// Advance per character, in font sizes, when no glyphs are available.
const ESTIMATED_ADVANCE: f32 = 0.6;
/// Line height, in font sizes, when no glyphs are available.
const ESTIMATED_HEIGHT: f32 = 1.2;
const ESTIMATED_ASCENT: f32 = 0.9;

/// Font files tried by [`FontLibrary::with_system_fonts`].
const SYSTEM_FONTS: &[(&str, &str)] = &[
    ("DejaVu Sans", "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
    ("DejaVu Sans", "/usr/share/fonts/TTF/DejaVuSans.ttf"),
    ("Liberation Sans", "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"),
    ("Arial", "/System/Library/Fonts/Supplemental/Arial.ttf"),
    ("Helvetica", "/System/Library/Fonts/Helvetica.ttc"),
    ("Arial", "C:\\Windows\\Fonts\\arial.ttf"),
];

/// Parsed fonts by family name.
#[derive(Default, Clone)]
pub struct FontLibrary {
    fonts: HashMap<String, Arc<fontdue::Font>>,
    fallback: Option<String>,
}

impl std::fmt::Debug for FontLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontLibrary")
            .field("families", &self.fonts.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl FontLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A library with the first system font found, if any.
    #[must_use]
    pub fn with_system_fonts() -> Self {
        let mut library = Self::new();
        for (family, path) in SYSTEM_FONTS {
            if library.fonts.contains_key(*family) || !Path::new(path).exists() {
                continue;
            }
            match library.load_file(*family, path) {
                Ok(()) => log::debug!("loaded system font {family} from {path}"),
                Err(e) => log::debug!("skipping system font {path}: {e}"),
            }
        }
        library
    }

    /// Parses font bytes and registers them under `family`.
    ///
    /// The first registered family becomes the fallback for unknown names.
    pub fn register(&mut self, family: impl Into<String>, bytes: &[u8]) -> RenderResult<()> {
        let family = family.into();
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| RenderError::Font(format!("{family}: {e}")))?;
        if self.fallback.is_none() {
            self.fallback = Some(family.clone());
        }
        self.fonts.insert(family, Arc::new(font));
        Ok(())
    }

    /// Reads and registers a font file.
    pub fn load_file(&mut self, family: impl Into<String>, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        self.register(family, &bytes)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// The font for a family: exact, then case-insensitive, then the fallback.
    #[must_use]
    pub fn resolve(&self, family: &str) -> Option<Arc<fontdue::Font>> {
        if let Some(f) = self.fonts.get(family) {
            return Some(Arc::clone(f));
        }
        let lower = family.to_lowercase();
        if let Some((_, f)) = self.fonts.iter().find(|(k, _)| k.to_lowercase() == lower) {
            return Some(Arc::clone(f));
        }
        self.fallback.as_ref().and_then(|k| self.fonts.get(k)).cloned()
    }
}

/// Final placement of a text box in window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenBox {
    /// Lower-left, lower-right, upper-right, upper-left in the text's frame.
    pub corners: [Vec2; 4],
    pub width: f32,
    pub height: f32,
    /// Rotation in degrees.
    pub angle: f32,
}

impl ScreenBox {
    /// Axis-aligned bounds `(min, max)`.
    #[must_use]
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let min = self.corners.iter().fold(Vec2::splat(f32::MAX), |a, c| a.min(*c));
        let max = self.corners.iter().fold(Vec2::splat(f32::MIN), |a, c| a.max(*c));
        (min, max)
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.corners[0] + self.corners[2]) * 0.5
    }
}

/// Places a box of `size` at a window-space anchor.
///
/// The box is rotated about the anchor; alignment offsets and `shift` are
/// applied in the rotated frame.
#[must_use]
pub fn place_screen(anchor: Vec2, size: Vec2, h_align: HAlign, v_align: VAlign, angle: f32, shift: Vec2) -> ScreenBox {
    let ax = match h_align {
        HAlign::Left => 0.0,
        HAlign::Center => -size.x * 0.5,
        HAlign::Right => -size.x,
    };
    let ay = match v_align {
        VAlign::Bottom => 0.0,
        VAlign::Center => -size.y * 0.5,
        VAlign::Top => -size.y,
    };
    let origin = Vec2::new(ax, ay) + shift;
    let rot = Vec2::from_angle(angle.to_radians());
    let corners = [
        origin,
        origin + Vec2::new(size.x, 0.0),
        origin + size,
        origin + Vec2::new(0.0, size.y),
    ]
    .map(|c| anchor + rot.rotate(c));
    ScreenBox {
        corners,
        width: size.x,
        height: size.y,
        angle,
    }
}

/// Projects a data-space anchor with the camera, then places the box.
#[must_use]
pub fn place(
    camera: &Camera,
    anchor: Vec3,
    size: Vec2,
    h_align: HAlign,
    v_align: VAlign,
    angle: f32,
    shift: Vec2,
) -> ScreenBox {
    place_screen(camera.project(anchor).truncate(), size, h_align, v_align, angle, shift)
}

/// Per-frame text rasterizer bound to one font request.
pub struct TextRenderer {
    request: Font,
    font: Option<Arc<fontdue::Font>>,
    /// Pixel size after dpi scaling.
    px: f32,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("request", &self.request)
            .field("has_glyphs", &self.font.is_some())
            .field("px", &self.px)
            .finish()
    }
}

impl TextRenderer {
    #[must_use]
    pub fn new(library: &FontLibrary, font: &Font, dpi_scale: f32) -> Self {
        let resolved = library.resolve(&font.family);
        if resolved.is_none() {
            log::trace!("no glyphs for font family {}, using estimated metrics", font.family);
        }
        Self {
            request: font.clone(),
            font: resolved,
            px: (font.size * dpi_scale).max(1.0),
        }
    }

    /// The font request this renderer was built for.
    #[must_use]
    pub fn font(&self) -> &Font {
        &self.request
    }

    /// Whether this renderer can serve `font` at `dpi_scale`.
    #[must_use]
    pub fn matches(&self, font: &Font, dpi_scale: f32) -> bool {
        self.request == *font && (self.px - (font.size * dpi_scale).max(1.0)).abs() < f32::EPSILON
    }

    #[must_use]
    pub fn pixel_size(&self) -> f32 {
        self.px
    }

    #[must_use]
    pub fn has_glyphs(&self) -> bool {
        self.font.is_some()
    }

    /// Ascent and descent per pixel of size.
    fn line_ratios(&self) -> (f32, f32) {
        self.font
            .as_ref()
            .and_then(|f| f.horizontal_line_metrics(self.px))
            .map_or((ESTIMATED_ASCENT, ESTIMATED_HEIGHT - ESTIMATED_ASCENT), |m| {
                (m.ascent / self.px, -m.descent / self.px)
            })
    }

    fn advance(&self, text: &str, px: f32) -> f32 {
        match &self.font {
            Some(font) => text.chars().map(|c| font.metrics(c, px).advance_width).sum(),
            #[allow(clippy::cast_precision_loss)]
            None => text.chars().count() as f32 * ESTIMATED_ADVANCE * px,
        }
    }

    /// Height of one line of text.
    #[must_use]
    pub fn line_height(&self) -> f32 {
        let (a, d) = self.line_ratios();
        (a + d) * self.px
    }

    fn formula_layout(&self, text: &str) -> FormulaLayout {
        let runs = formula::parse(formula::body(text));
        let (a, d) = self.line_ratios();
        formula::layout(&runs, self.px, a, d, |s, px| self.advance(s, px))
    }

    /// Size of the text box in pixels. Formulas include their insets.
    #[must_use]
    pub fn measure(&self, text: &str) -> Vec2 {
        if meteoplot_core::text::is_formula(text) {
            let (w, h) = self.formula_layout(text).padded_size();
            return Vec2::new(w, h);
        }
        Vec2::new(self.advance(text, self.px), self.line_height())
    }

    /// Renders text into an image, `None` without glyphs or for blank text.
    #[must_use]
    pub fn rasterize(&self, text: &str, color: Vec4) -> Option<RgbaImage> {
        let font = self.font.as_ref()?;
        let (layout, inset) = if meteoplot_core::text::is_formula(text) {
            (self.formula_layout(text), FORMULA_INSET)
        } else {
            let (a, d) = self.line_ratios();
            let layout = FormulaLayout {
                runs: vec![formula::LaidRun {
                    text: text.to_string(),
                    size: self.px,
                    x: 0.0,
                    rise: 0.0,
                }],
                width: self.advance(text, self.px),
                ascent: a * self.px,
                descent: d * self.px,
            };
            (layout, 0.0)
        };
        let w = (layout.width + 2.0 * inset).ceil();
        let h = (layout.ascent + layout.descent + 2.0 * inset).ceil();
        if w < 1.0 || h < 1.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut image = RgbaImage::new(w as u32, h as u32);
        let baseline = inset + layout.ascent;
        for run in &layout.runs {
            draw_run(&mut image, font, run, inset, baseline, color);
        }
        Some(image)
    }

    /// Draws text at a window-space anchor and returns its box.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        painter: &mut Painter<'_>,
        text: &ChartText,
        anchor: Vec2,
        h_align: HAlign,
        v_align: VAlign,
        angle: f32,
        shift: Vec2,
    ) -> RenderResult<ScreenBox> {
        let size = self.measure(&text.text);
        let placed = place_screen(anchor, size, h_align, v_align, angle, shift);
        if let Some(image) = self.rasterize(&text.text, text.color) {
            painter.screen_image(&image, placed.corners, Vec4::ONE)?;
        }
        Ok(placed)
    }
}

/// Font library plus the text renderer of the current frame.
///
/// The renderer is rebuilt only when the requested font or dpi scale
/// changes, and dropped by [`TextContext::release`] at frame end.
#[derive(Debug, Default)]
pub struct TextContext {
    library: Arc<FontLibrary>,
    current: Option<TextRenderer>,
    dpi_scale: f32,
    builds: u64,
}

impl TextContext {
    #[must_use]
    pub fn new(library: Arc<FontLibrary>, dpi_scale: f32) -> Self {
        Self {
            library,
            current: None,
            dpi_scale,
            builds: 0,
        }
    }

    #[must_use]
    pub fn library(&self) -> &FontLibrary {
        &self.library
    }

    pub fn set_library(&mut self, library: Arc<FontLibrary>) {
        self.library = library;
        self.current = None;
    }

    pub fn set_dpi_scale(&mut self, dpi_scale: f32) {
        self.dpi_scale = dpi_scale;
    }

    /// Renderer for `font`, reusing the current one when it matches.
    pub fn renderer(&mut self, font: &Font) -> &TextRenderer {
        if !self
            .current
            .as_ref()
            .is_some_and(|r| r.matches(font, self.dpi_scale))
        {
            self.current = None;
        }
        let (library, dpi_scale, builds) = (&self.library, self.dpi_scale, &mut self.builds);
        self.current.get_or_insert_with(|| {
            *builds += 1;
            TextRenderer::new(library, font, dpi_scale)
        })
    }

    #[must_use]
    pub fn measure(&mut self, text: &ChartText) -> Vec2 {
        self.renderer(&text.font).measure(&text.text)
    }

    /// Draws `text` with its own font. See [`TextRenderer::draw`].
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        painter: &mut Painter<'_>,
        text: &ChartText,
        anchor: Vec2,
        h_align: HAlign,
        v_align: VAlign,
        angle: f32,
        shift: Vec2,
    ) -> RenderResult<ScreenBox> {
        self.renderer(&text.font)
            .draw(painter, text, anchor, h_align, v_align, angle, shift)
    }

    /// Drops the frame's renderer.
    pub fn release(&mut self) {
        self.current = None;
    }

    /// Number of renderers built so far.
    #[must_use]
    pub fn builds(&self) -> u64 {
        self.builds
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn draw_run(image: &mut RgbaImage, font: &fontdue::Font, run: &formula::LaidRun, inset: f32, baseline: f32, color: Vec4) {
    let (iw, ih) = (image.width() as i32, image.height() as i32);
    let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    let mut pen = inset + run.x;
    let line = baseline - run.rise;
    for c in run.text.chars() {
        let (m, bitmap) = font.rasterize(c, run.size);
        let gx = (pen + m.xmin as f32).round() as i32;
        let gy = (line - (m.ymin as f32 + m.height as f32)).round() as i32;
        for (row, coverage) in bitmap.chunks(m.width.max(1)).enumerate() {
            for (col, a) in coverage.iter().enumerate() {
                let (x, y) = (gx + col as i32, gy + row as i32);
                if *a == 0 || x < 0 || y < 0 || x >= iw || y >= ih {
                    continue;
                }
                let alpha = f32::from(*a) / 255.0 * color.w;
                let px = image.get_pixel_mut(x as u32, y as u32);
                let keep = f32::from(px.0[3]) / 255.0;
                if alpha > keep {
                    *px = Rgba([to_u8(color.x), to_u8(color.y), to_u8(color.z), to_u8(alpha)]);
                }
            }
        }
        pen += m.advance_width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimating() -> TextRenderer {
        TextRenderer::new(&FontLibrary::new(), &Font::new("Arial", 10.0), 1.0)
    }

    #[test]
    fn test_estimated_metrics_without_fonts() {
        let r = estimating();
        assert!(!r.has_glyphs());
        let size = r.measure("abcd");
        assert!((size.x - 24.0).abs() < 1e-4);
        assert!((size.y - 12.0).abs() < 1e-4);
        assert!((r.line_height() - 12.0).abs() < 1e-4);
        assert!(r.rasterize("abcd", Vec4::ONE).is_none());
    }

    #[test]
    fn test_formula_measure_includes_insets() {
        let r = estimating();
        let plain = r.measure("x");
        let formula = r.measure("$x$");
        assert!((formula.x - plain.x - 2.0 * FORMULA_INSET).abs() < 1e-4);
        assert!(formula.y >= plain.y + 2.0 * FORMULA_INSET - 1e-4);
    }

    #[test]
    fn test_renderer_matches_font_and_dpi() {
        let font = Font::new("Arial", 10.0);
        let r = TextRenderer::new(&FontLibrary::new(), &font, 2.0);
        assert_eq!(r.pixel_size(), 20.0);
        assert!(r.matches(&font, 2.0));
        assert!(!r.matches(&font, 1.0));
        assert!(!r.matches(&Font::new("Times", 10.0), 2.0));
    }

    #[test]
    fn test_place_alignment() {
        let size = Vec2::new(20.0, 10.0);
        let b = place_screen(Vec2::new(100.0, 50.0), size, HAlign::Center, VAlign::Top, 0.0, Vec2::ZERO);
        let (min, max) = b.bounds();
        assert_eq!(min, Vec2::new(90.0, 40.0));
        assert_eq!(max, Vec2::new(110.0, 50.0));
        let b = place_screen(Vec2::ZERO, size, HAlign::Right, VAlign::Center, 0.0, Vec2::new(-5.0, 0.0));
        assert_eq!(b.bounds(), (Vec2::new(-25.0, -5.0), Vec2::new(-5.0, 5.0)));
    }

    #[test]
    fn test_place_rotated_about_anchor() {
        let b = place_screen(Vec2::ZERO, Vec2::new(20.0, 10.0), HAlign::Left, VAlign::Bottom, 90.0, Vec2::ZERO);
        let (min, max) = b.bounds();
        assert!((min - Vec2::new(-10.0, 0.0)).length() < 1e-4);
        assert!((max - Vec2::new(0.0, 20.0)).length() < 1e-4);
        // Shift follows the rotated frame.
        let s = place_screen(Vec2::ZERO, Vec2::new(20.0, 10.0), HAlign::Left, VAlign::Bottom, 90.0, Vec2::new(0.0, 5.0));
        assert!((s.corners[0] - Vec2::new(-5.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_place_projects_anchor() {
        let mut camera = Camera::new();
        camera.set_viewport(crate::camera::Viewport::new(0, 0, 100, 100));
        camera.set_angle_x(0.0);
        camera.set_angle_y(0.0);
        camera.update_model_view(&meteoplot_core::Transform::default());
        let b = place(&camera, Vec3::ZERO, Vec2::new(10.0, 10.0), HAlign::Center, VAlign::Center, 0.0, Vec2::ZERO);
        assert!((b.center() - Vec2::splat(50.0)).length() < 1e-4);
    }

    #[test]
    fn test_library_resolution() {
        let lib = FontLibrary::new();
        assert!(lib.is_empty());
        assert!(lib.resolve("Arial").is_none());
        let mut lib = FontLibrary::new();
        assert!(matches!(lib.register("Broken", b"not a font"), Err(RenderError::Font(_))));
        assert!(lib.load_file("Missing", "/nonexistent/font.ttf").is_err());
    }

    #[test]
    fn test_system_fonts_register_only_known_families() {
        let lib = FontLibrary::with_system_fonts();
        let present = SYSTEM_FONTS.iter().any(|(_, path)| Path::new(path).exists());
        if !present {
            assert!(lib.is_empty());
        }
        for family in lib.fonts.keys() {
            assert!(SYSTEM_FONTS.iter().any(|(f, _)| *f == family.as_str()));
        }
    }

    #[test]
    fn test_context_reuses_renderer_per_font() {
        let mut ctx = TextContext::new(Arc::new(FontLibrary::new()), 1.0);
        let a = Font::new("Arial", 12.0);
        let b = Font::new("Arial", 14.0);
        let _ = ctx.renderer(&a);
        let _ = ctx.renderer(&a);
        assert_eq!(ctx.builds(), 1);
        let _ = ctx.renderer(&b);
        assert_eq!(ctx.builds(), 2);
        ctx.set_dpi_scale(2.0);
        assert!((ctx.renderer(&b).pixel_size() - 28.0).abs() < 1e-5);
        assert_eq!(ctx.builds(), 3);
        ctx.release();
        let _ = ctx.renderer(&b);
        assert_eq!(ctx.builds(), 4);
    }
}
