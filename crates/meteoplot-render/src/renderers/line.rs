//! Polylines.

use glam::{Vec3, Vec4};
use meteoplot_core::{Extent3D, Graphic, GraphicKind, Shape};

use super::{GraphicRenderer, RenderState};
use crate::error::RenderResult;
use crate::painter::Painter;

struct Strip {
    points: Vec<(Vec3, Vec4)>,
    width: f32,
}

#[derive(Default)]
pub struct LineRenderer {
    strips: Vec<Strip>,
    extent: Option<Extent3D>,
}

impl GraphicRenderer for LineRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Lines
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.strips.clear();
        let mut all = Vec::new();
        for (shape, style) in graphic.leaves() {
            let Shape::Polyline(line) = shape else { continue };
            if line.points.len() < 2 {
                continue;
            }
            let style = style.line();
            let colors = line.colors.as_deref().unwrap_or_default();
            self.strips.push(Strip {
                points: line
                    .points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (*p, colors.get(i).copied().unwrap_or(style.color)))
                    .collect(),
                width: style.width,
            });
            all.extend_from_slice(&line.points);
        }
        self.extent = Extent3D::from_points(&all);
        Ok(())
    }

    fn draw(&mut self, painter: &mut Painter<'_>, _state: &mut RenderState<'_>) -> RenderResult<()> {
        for strip in &self.strips {
            painter.line_strip(&strip.points, strip.width);
        }
        Ok(())
    }

    fn extent(&self) -> Option<Extent3D> {
        self.extent
    }
}
