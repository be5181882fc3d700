//! Legend overlay: discrete break swatches or a continuous colorbar.
//!
//! The legend is drawn in eye space with an identity model-view, to the
//! right of the canonical cube. Clipping is suspended and depth is ignored
//! while it draws.

use glam::{Mat4, Vec2, Vec3, Vec4};
use meteoplot_core::{
    format_value, nice_ticks, ChartText, ColorBar, HAlign, LegendLabelLocation, LegendScheme, LegendType,
    Normalize, VAlign,
};

use crate::axes::label_skip;
use crate::canvas::DepthMode;
use crate::error::RenderResult;
use crate::painter::Painter;
use crate::text::{ScreenBox, TextContext};

/// Left edge of the bar in eye units, before the legend's own shift.
const LEGEND_X: f32 = 1.6;
/// Full bar height in eye units.
const LEGEND_HEIGHT: f32 = 2.0;
const GAP_PROBE: &str = "Text";
const AUTO_TICKS: usize = 6;

/// Bar rectangle in eye units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LegendGeometry {
    #[must_use]
    pub fn new(bar: &ColorBar, len_scale: f32) -> Self {
        let height = LEGEND_HEIGHT * bar.shrink.clamp(f32::EPSILON, 1.0);
        Self {
            x: LEGEND_X + bar.x_shift * len_scale,
            y: -height * 0.5,
            width: height / bar.aspect.max(f32::EPSILON),
            height,
        }
    }

    fn rect(&self, y0: f32, y1: f32) -> [Vec3; 4] {
        [
            Vec3::new(self.x, y0, 0.0),
            Vec3::new(self.x + self.width, y0, 0.0),
            Vec3::new(self.x + self.width, y1, 0.0),
            Vec3::new(self.x, y1, 0.0),
        ]
    }
}

/// Label boxes and swatch count of a drawn legend.
#[derive(Debug, Clone, Default)]
pub struct LegendBoxes {
    pub swatches: usize,
    pub ticks: Vec<ScreenBox>,
    pub label: Option<ScreenBox>,
}

/// Tick label stride along a bar of `screen_len` pixels.
///
/// Rotated tick labels never collide vertically, so every one is drawn.
#[must_use]
pub fn legend_tick_gap(bar: &ColorBar, n: usize, screen_len: f32, label_height: f32) -> usize {
    if bar.tick_label_angle != 0.0 {
        1
    } else {
        label_skip(n, screen_len, label_height)
    }
}

/// Break indices that get a tick label, with their captions.
///
/// Automatic ticks start half the leftover stride in so labels sit centered
/// along the bar. Explicit ticks match break end values exactly.
#[must_use]
pub fn discrete_labels(bar: &ColorBar, scheme: &LegendScheme, gap: usize) -> Vec<(usize, String)> {
    let breaks = scheme.drawable_breaks();
    let n = breaks.len();
    let unique = scheme.legend_type == LegendType::UniqueValue;
    if !bar.auto_tick {
        return breaks
            .iter()
            .enumerate()
            .filter_map(|(i, b)| {
                let k = bar.tick_locations.iter().position(|t| *t == b.end_value)?;
                Some((i, bar.tick_label(k)))
            })
            .collect();
    }
    let gap = gap.max(1);
    let (start, end) = if unique {
        ((n % gap) / 2, n)
    } else if bar.draw_min_label {
        (0, n)
    } else {
        ((n % gap) / 2, n.saturating_sub(1))
    };
    (start..end)
        .step_by(gap)
        .map(|i| {
            let b = &breaks[i];
            let caption = if unique {
                b.caption.clone()
            } else {
                format_value(b.end_value)
            };
            (i, caption)
        })
        .collect()
}

/// Tick values and labels of a continuous bar.
#[must_use]
pub fn continuous_ticks(bar: &ColorBar, normalize: &Normalize) -> Vec<(f64, String)> {
    if !bar.tick_locations.is_empty() {
        return bar
            .tick_locations
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, bar.tick_label(i)))
            .collect();
    }
    let values = match normalize {
        Normalize::Boundary { boundaries, .. } => boundaries.clone(),
        _ => {
            let (lo, hi) = (normalize.vmin(), normalize.vmax());
            nice_ticks(lo, hi, AUTO_TICKS)
                .into_iter()
                .filter(|v| *v >= lo && *v <= hi)
                .collect()
        }
    };
    values.into_iter().map(|v| (v, format_value(v))).collect()
}

/// Draws a legend as a discrete bar or, when its scheme has a color map, a colorbar.
///
/// `tick_space` is the label gap in pixels.
pub fn draw_legend(
    painter: &mut Painter<'_>,
    text: &mut TextContext,
    bar: &ColorBar,
    len_scale: f32,
    tick_space: f32,
) -> RenderResult<LegendBoxes> {
    let model_view = painter.set_model_view(Mat4::IDENTITY);
    let depth = painter.set_depth_mode(DepthMode::Always);
    let clip = painter.clip_mut().set_enabled(false);
    let geometry = LegendGeometry::new(bar, len_scale);
    let result = if bar.scheme.is_continuous() {
        draw_colorbar(painter, text, bar, geometry, len_scale, tick_space)
    } else {
        draw_discrete(painter, text, bar, geometry, len_scale, tick_space)
    };
    painter.clip_mut().set_enabled(clip);
    painter.set_depth_mode(depth);
    painter.set_model_view(model_view);
    result
}

fn draw_discrete(
    painter: &mut Painter<'_>,
    text: &mut TextContext,
    bar: &ColorBar,
    g: LegendGeometry,
    len_scale: f32,
    tick_space: f32,
) -> RenderResult<LegendBoxes> {
    let scheme = &bar.scheme;
    let breaks = scheme.drawable_breaks();
    let mut out = LegendBoxes::default();
    if breaks.is_empty() {
        return Ok(out);
    }
    #[allow(clippy::cast_precision_loss)]
    let step = g.height / breaks.len() as f32;

    for (i, b) in breaks.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y0 = g.y + step * i as f32;
        swatch(painter, g.rect(y0, y0 + step), b.color);
        out.swatches += 1;
    }
    if bar.draw_neatline {
        outline(painter, &g.rect(g.y, g.y + g.height), bar.neatline_color, bar.neatline_width);
    }

    let bar_len = screen_length(painter, Vec3::new(g.x, g.y, 0.0), Vec3::new(g.x, g.y + g.height, 0.0));
    let label_height = text.renderer(&bar.tick_label_font).measure(GAP_PROBE).y;
    let gap = legend_tick_gap(bar, breaks.len(), bar_len, label_height);
    let (tick_len, label_x) = tick_extent(bar, g, len_scale);
    let right = g.x + g.width;
    for (i, caption) in discrete_labels(bar, scheme, gap) {
        #[allow(clippy::cast_precision_loss)]
        let y0 = g.y + step * i as f32;
        let label = tick_text(bar, caption);
        let placed = if scheme.legend_type == LegendType::UniqueValue {
            let at = Vec3::new(right, y0 + step * 0.5, 0.0);
            draw_tick_label(painter, text, bar, &label, at, tick_space)?
        } else {
            let top = y0 + step;
            tick_line(painter, bar, right, top, tick_len);
            draw_tick_label(painter, text, bar, &label, Vec3::new(label_x, top, 0.0), tick_space)?
        };
        out.ticks.push(placed);
    }
    out.label = draw_title(painter, text, bar, g, label_x, widest(&out.ticks), tick_space)?;
    Ok(out)
}

fn draw_colorbar(
    painter: &mut Painter<'_>,
    text: &mut TextContext,
    bar: &ColorBar,
    g: LegendGeometry,
    len_scale: f32,
    tick_space: f32,
) -> RenderResult<LegendBoxes> {
    let scheme = &bar.scheme;
    let mut out = LegendBoxes::default();
    let Some(color_map) = scheme.color_map.as_ref() else {
        return Ok(out);
    };
    let n = match scheme.normalize.regions() {
        0 => color_map.len(),
        regions => regions,
    };
    if n == 0 {
        return Ok(out);
    }

    // Extend triangles are one bar width tall and shorten the bar.
    let extend = scheme.extend;
    let mut span = g.height;
    let mut y0 = g.y;
    if extend.has_min() {
        span -= g.width;
        y0 += g.width;
    }
    if extend.has_max() {
        span -= g.width;
    }
    let y1 = y0 + span;
    #[allow(clippy::cast_precision_loss)]
    let step = span / n as f32;
    let colors = color_map.colors(n);
    for (i, color) in colors.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let lo = y0 + step * i as f32;
        swatch(painter, g.rect(lo, lo + step), *color);
        out.swatches += 1;
    }
    let mid = g.x + g.width * 0.5;
    if let (true, Some(first)) = (extend.has_min(), colors.first()) {
        painter.triangle_fan(&[
            (Vec3::new(g.x, y0, 0.0), *first),
            (Vec3::new(mid, g.y, 0.0), *first),
            (Vec3::new(g.x + g.width, y0, 0.0), *first),
        ]);
    }
    if let (true, Some(last)) = (extend.has_max(), colors.last()) {
        painter.triangle_fan(&[
            (Vec3::new(g.x, y1, 0.0), *last),
            (Vec3::new(g.x + g.width, y1, 0.0), *last),
            (Vec3::new(mid, g.y + g.height, 0.0), *last),
        ]);
    }

    if bar.draw_neatline {
        let mut ring = Vec::with_capacity(6);
        ring.push(Vec3::new(g.x, y0, 0.0));
        if extend.has_min() {
            ring.push(Vec3::new(mid, g.y, 0.0));
        }
        ring.push(Vec3::new(g.x + g.width, y0, 0.0));
        ring.push(Vec3::new(g.x + g.width, y1, 0.0));
        if extend.has_max() {
            ring.push(Vec3::new(mid, g.y + g.height, 0.0));
        }
        ring.push(Vec3::new(g.x, y1, 0.0));
        outline(painter, &ring, bar.neatline_color, bar.neatline_width);
    }

    let (tick_len, label_x) = tick_extent(bar, g, len_scale);
    let mut ticks = continuous_ticks(bar, &scheme.normalize);
    if bar.tick_locations.is_empty() {
        let bar_len = screen_length(painter, Vec3::new(g.x, y0, 0.0), Vec3::new(g.x, y1, 0.0));
        let label_height = text.renderer(&bar.tick_label_font).measure(GAP_PROBE).y;
        let gap = legend_tick_gap(bar, ticks.len(), bar_len, label_height);
        ticks = ticks.into_iter().step_by(gap).collect();
    }
    for (v, caption) in ticks {
        let at = y0 + span * scheme.normalize.apply(v);
        tick_line(painter, bar, g.x + g.width, at, tick_len);
        let label = tick_text(bar, caption);
        out.ticks
            .push(draw_tick_label(painter, text, bar, &label, Vec3::new(label_x, at, 0.0), tick_space)?);
    }
    out.label = draw_title(painter, text, bar, g, label_x, widest(&out.ticks), tick_space)?;
    Ok(out)
}

/// Tick length in eye units and the x of tick labels.
fn tick_extent(bar: &ColorBar, g: LegendGeometry, len_scale: f32) -> (f32, f32) {
    let tick_len = bar.tick_length * len_scale;
    if bar.inside_tick {
        (tick_len.min(g.width), g.x + g.width)
    } else {
        (tick_len, g.x + g.width + tick_len)
    }
}

fn tick_line(painter: &mut Painter<'_>, bar: &ColorBar, right: f32, y: f32, tick_len: f32) {
    let end = if bar.inside_tick { right - tick_len } else { right + tick_len };
    painter.polyline(
        &[Vec3::new(end, y, 0.0), Vec3::new(right, y, 0.0)],
        bar.tick_color,
        bar.tick_width,
    );
}

fn tick_text(bar: &ColorBar, caption: String) -> ChartText {
    ChartText::new(caption)
        .with_font(bar.tick_label_font.clone())
        .with_color(bar.tick_color)
}

fn draw_tick_label(
    painter: &mut Painter<'_>,
    text: &mut TextContext,
    bar: &ColorBar,
    label: &ChartText,
    at: Vec3,
    tick_space: f32,
) -> RenderResult<ScreenBox> {
    let anchor = painter.to_window(at).truncate();
    text.draw(
        painter,
        label,
        anchor,
        HAlign::Left,
        VAlign::Center,
        bar.tick_label_angle,
        Vec2::new(tick_space, 0.0),
    )
}

/// Legend title at its configured side of the bar.
fn draw_title(
    painter: &mut Painter<'_>,
    text: &mut TextContext,
    bar: &ColorBar,
    g: LegendGeometry,
    label_x: f32,
    widest: f32,
    tick_space: f32,
) -> RenderResult<Option<ScreenBox>> {
    let Some(label) = bar.label.as_ref() else {
        return Ok(None);
    };
    let label = label.clone().with_color(bar.tick_color);
    let mid_y = g.y + g.height * 0.5;
    let (at, v_align, angle, shift) = match bar.label_location {
        LegendLabelLocation::Top => (Vec3::new(g.x + g.width * 0.5, g.y + g.height, 0.0), VAlign::Bottom, 0.0, tick_space),
        LegendLabelLocation::Bottom => (Vec3::new(g.x + g.width * 0.5, g.y, 0.0), VAlign::Top, 0.0, -tick_space),
        LegendLabelLocation::Left | LegendLabelLocation::In => {
            (Vec3::new(g.x, mid_y, 0.0), VAlign::Bottom, 90.0, tick_space)
        }
        LegendLabelLocation::Right => (Vec3::new(label_x, mid_y, 0.0), VAlign::Top, 90.0, -widest - tick_space),
    };
    let anchor = painter.to_window(at).truncate();
    let placed = text.draw(painter, &label, anchor, HAlign::Center, v_align, angle, Vec2::new(0.0, shift))?;
    Ok(Some(placed))
}

fn swatch(painter: &mut Painter<'_>, corners: [Vec3; 4], color: Vec4) {
    let fan = corners.map(|c| (c, color));
    painter.triangle_fan(&fan);
}

fn outline(painter: &mut Painter<'_>, ring: &[Vec3], color: Vec4, width: f32) {
    let ring: Vec<(Vec3, Vec4)> = ring.iter().map(|p| (*p, color)).collect();
    painter.line_loop(&ring, width);
}

fn screen_length(painter: &Painter<'_>, a: Vec3, b: Vec3) -> f32 {
    (painter.to_window(b).truncate() - painter.to_window(a).truncate()).length()
}

fn widest(boxes: &[ScreenBox]) -> f32 {
    boxes.iter().fold(0.0, |w, b| w.max(b.width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, Viewport};
    use crate::canvas::Canvas;
    use crate::raster::SoftwareCanvas;
    use crate::renderers::test_support::text_context;
    use meteoplot_core::{ColorBreak, ColorMap, ExtendType, Transform};

    const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
    const BLUE: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

    fn camera(size: u32) -> Camera {
        let mut camera = Camera::new();
        camera.set_viewport(Viewport::new(0, 0, size, size));
        camera.update_model_view(&Transform::default());
        camera
    }

    fn graduated(n: usize) -> LegendScheme {
        #[allow(clippy::cast_precision_loss)]
        let values: Vec<f64> = (0..=n).map(|i| i as f64).collect();
        let colors: Vec<Vec4> = (0..n).map(|i| if i == 0 { RED } else { BLUE }).collect();
        LegendScheme::graduated(&values, &colors)
    }

    fn render(bar: &ColorBar) -> (LegendBoxes, image::RgbaImage) {
        let camera = camera(200);
        let mut text = text_context();
        let mut canvas = SoftwareCanvas::new(200, 200);
        canvas.begin_frame(Vec4::ONE);
        let boxes = {
            let mut painter = Painter::new(&mut canvas, &camera);
            draw_legend(&mut painter, &mut text, bar, 0.01, 5.0).unwrap()
        };
        canvas.end_frame().unwrap();
        (boxes, canvas.snapshot().unwrap())
    }

    #[test]
    fn test_auto_labels_centered_by_leftover() {
        let bar = ColorBar::new(graduated(10));
        let picked: Vec<usize> = discrete_labels(&bar, &bar.scheme, 4).into_iter().map(|(i, _)| i).collect();
        assert_eq!(picked, vec![1, 5]);
        let picked: Vec<usize> = discrete_labels(&bar, &bar.scheme, 3).into_iter().map(|(i, _)| i).collect();
        assert_eq!(picked, vec![0, 3, 6]);
    }

    #[test]
    fn test_unique_and_min_label_variants() {
        let mut scheme = graduated(10);
        scheme.legend_type = LegendType::UniqueValue;
        let bar = ColorBar::new(scheme);
        assert_eq!(discrete_labels(&bar, &bar.scheme, 3).len(), 4);

        let mut bar = ColorBar::new(graduated(10));
        bar.draw_min_label = true;
        let picked: Vec<usize> = discrete_labels(&bar, &bar.scheme, 3).into_iter().map(|(i, _)| i).collect();
        assert_eq!(picked, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_explicit_ticks_match_break_ends() {
        let bar = ColorBar::new(graduated(5)).with_ticks(vec![2.0, 4.0, 7.0], vec!["two".into(), "four".into()]);
        let labels = discrete_labels(&bar, &bar.scheme, 1);
        assert_eq!(labels, vec![(1, "two".to_string()), (3, "four".to_string())]);
    }

    #[test]
    fn test_tick_gap_is_one_for_rotated_labels() {
        let mut bar = ColorBar::new(graduated(50));
        assert_eq!(legend_tick_gap(&bar, 50, 100.0, 20.0), 10);
        bar.tick_label_angle = 45.0;
        assert_eq!(legend_tick_gap(&bar, 50, 100.0, 20.0), 1);
    }

    #[test]
    fn test_no_data_break_has_no_swatch() {
        let mut scheme = graduated(4);
        scheme.breaks.push(ColorBreak::no_data(-999.0, Vec4::ZERO));
        let (boxes, image) = render(&ColorBar::new(scheme));
        assert_eq!(boxes.swatches, 4);
        // Bar spans x 180..185 and y 50..150; the first break fills y 50..75.
        assert_eq!(image.get_pixel(182, 199 - 60).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(182, 199 - 100).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_colorbar_extend_shortens_bar() {
        let map = ColorMap::new("rb", vec![RED, BLUE]);
        let scheme = LegendScheme::continuous(map, Normalize::linear(0.0, 10.0)).with_extend(ExtendType::Both);
        let bar = ColorBar::new(scheme).with_ticks(vec![0.0, 10.0], vec![]);
        let (boxes, image) = render(&bar);
        assert_eq!(boxes.swatches, 2);
        // Triangles take one bar width (5 px) off each end.
        let (lo, hi) = (boxes.ticks[0].center().y, boxes.ticks[1].center().y);
        assert!((lo - 55.0).abs() < 0.5, "{lo}");
        assert!((hi - 145.0).abs() < 0.5, "{hi}");
        // Lower triangle near its base uses the first color.
        assert_eq!(image.get_pixel(182, 199 - 54).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_right_title_clears_tick_labels() {
        let bar = ColorBar::new(graduated(4)).with_label(ChartText::new("Temperature"), LegendLabelLocation::Right);
        let (boxes, _) = render(&bar);
        let title = boxes.label.unwrap();
        let tick_right = boxes.ticks.iter().map(|b| b.bounds().1.x).fold(0.0, f32::max);
        assert!(title.bounds().0.x >= tick_right - 1e-3);
    }
}
