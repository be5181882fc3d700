//! Text labels anchored at data points.

use glam::Vec4;
use meteoplot_core::{Extent3D, Graphic, GraphicKind, Shape, TextShape};

use super::{GraphicRenderer, RenderState};
use crate::canvas::DepthMode;
use crate::error::RenderResult;
use crate::painter::Painter;
use crate::text::{place_screen, ScreenBox};

#[derive(Default)]
pub struct LabelRenderer {
    labels: Vec<TextShape>,
    extent: Option<Extent3D>,
    /// Boxes placed in the last frame, in label order.
    boxes: Vec<ScreenBox>,
}

impl LabelRenderer {
    /// Window-space boxes of the labels drawn last frame.
    #[must_use]
    pub fn boxes(&self) -> &[ScreenBox] {
        &self.boxes
    }
}

impl GraphicRenderer for LabelRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Text
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.extent = graphic.extent();
        self.labels = graphic
            .leaves()
            .into_iter()
            .filter_map(|(shape, _)| match shape {
                Shape::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect();
        Ok(())
    }

    fn draw(&mut self, painter: &mut Painter<'_>, state: &mut RenderState<'_>) -> RenderResult<()> {
        self.boxes.clear();
        for label in &self.labels {
            if painter.to_clip(label.position).w <= 0.0 {
                continue;
            }
            let anchor = painter.to_window(label.position);
            let placed = if label.draw_3d {
                // Depth-tested at the anchor so the plot can hide it.
                let renderer = state.text.renderer(&label.text.font);
                let size = renderer.measure(&label.text.text);
                let placed = place_screen(
                    anchor.truncate(),
                    size,
                    label.h_align,
                    label.v_align,
                    label.angle,
                    label.shift,
                );
                if let Some(image) = renderer.rasterize(&label.text.text, label.text.color) {
                    let depth = painter.set_depth_mode(DepthMode::TestOnly);
                    let drawn = painter.screen_image_at(&image, placed.corners, anchor.z, Vec4::ONE);
                    painter.set_depth_mode(depth);
                    drawn?;
                }
                placed
            } else {
                state.text.draw(
                    painter,
                    &label.text,
                    anchor.truncate(),
                    label.h_align,
                    label.v_align,
                    label.angle,
                    label.shift,
                )?
            };
            self.boxes.push(placed);
        }
        Ok(())
    }

    fn uses_clip(&self) -> bool {
        false
    }

    fn extent(&self) -> Option<Extent3D> {
        self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::canvas::Canvas;
    use crate::raster::SoftwareCanvas;
    use glam::{Vec2, Vec3};
    use meteoplot_core::{ChartText, Font, HAlign, Lighting, Style, VAlign};

    fn label(draw_3d: bool) -> Graphic {
        let mut t = TextShape::new(
            ChartText::new("abcd").with_font(Font::new("Nope", 10.0)),
            Vec3::ZERO,
        );
        t.h_align = HAlign::Center;
        t.v_align = VAlign::Center;
        t.draw_3d = draw_3d;
        Graphic::leaf(Shape::Text(t), Style::Intrinsic)
    }

    fn boxes(g: &Graphic) -> Vec<ScreenBox> {
        let camera = flat_camera(40);
        let lighting = Lighting::default();
        let mut text = text_context();
        let mut canvas = SoftwareCanvas::new(40, 40);
        canvas.begin_frame(Vec4::ONE);
        let mut state = state(&camera, &lighting, &mut text);
        let mut r = LabelRenderer::default();
        r.rebuild(g, &state).unwrap();
        let mut painter = Painter::new(&mut canvas, &camera);
        r.draw(&mut painter, &mut state).unwrap();
        r.boxes().to_vec()
    }

    #[test]
    fn test_label_centered_on_anchor() {
        for draw_3d in [false, true] {
            let b = boxes(&label(draw_3d));
            assert_eq!(b.len(), 1);
            // Estimated metrics: 4 chars at 0.6 em, 1.2 em high.
            assert!((b[0].width - 24.0).abs() < 1e-4);
            assert!((b[0].center() - Vec2::new(20.0, 20.0)).length() < 1e-3);
        }
    }
}
