//! Collections of hole-free quads or triangles drawn as one triangle list.

use meteoplot_core::{Extent3D, Graphic, GraphicKind, MeteoPlotError, Shape};

use super::polygon::{polygon_tessellation, PolygonParts};
use super::{GraphicRenderer, RenderState};
use crate::error::RenderResult;
use crate::painter::Painter;

pub struct BatchRenderer {
    kind: GraphicKind,
    corners: usize,
    parts: PolygonParts,
    extent: Option<Extent3D>,
}

impl BatchRenderer {
    #[must_use]
    pub fn quads() -> Self {
        Self::new(GraphicKind::QuadBatch, 4)
    }

    #[must_use]
    pub fn triangles() -> Self {
        Self::new(GraphicKind::TriangleBatch, 3)
    }

    fn new(kind: GraphicKind, corners: usize) -> Self {
        Self {
            kind,
            corners,
            parts: PolygonParts::default(),
            extent: None,
        }
    }
}

impl GraphicRenderer for BatchRenderer {
    fn kind(&self) -> GraphicKind {
        self.kind
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.parts.clear();
        self.extent = graphic.extent();
        for (shape, style) in graphic.leaves() {
            let Shape::Polygon(polygon) = shape else { continue };
            if polygon.vertex_count() != self.corners || !polygon.holes().is_empty() {
                return Err(MeteoPlotError::DegenerateGeometry(format!(
                    "{:?} child has {} vertices",
                    self.kind,
                    polygon.vertex_count()
                ))
                .into());
            }
            // Concave children take the same ear-clipped fill as a lone polygon.
            let tess = polygon_tessellation(polygon)?;
            self.parts
                .push(&tess, polygon, &style.polygon(), graphic.using_light);
        }
        Ok(())
    }

    fn draw(&mut self, painter: &mut Painter<'_>, state: &mut RenderState<'_>) -> RenderResult<()> {
        self.parts.draw(painter, state);
        Ok(())
    }

    fn extent(&self) -> Option<Extent3D> {
        self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::CompositeRenderer;
    use super::*;
    use crate::canvas::Canvas;
    use crate::raster::SoftwareCanvas;
    use glam::{Vec3, Vec4};
    use meteoplot_core::{PolygonShape, PolygonStyle};

    fn cell(x: f32, y: f32) -> Graphic {
        Graphic::polygon(
            PolygonShape::new(vec![
                Vec3::new(x, y, 0.0),
                Vec3::new(x + 0.5, y, 0.0),
                Vec3::new(x + 0.5, y + 0.5, 0.0),
                Vec3::new(x, y + 0.5, 0.0),
            ]),
            PolygonStyle {
                fill_color: Vec4::new(0.2, 0.4, 0.8, 1.0),
                draw_outline: true,
                ..PolygonStyle::default()
            },
        )
    }

    fn grid() -> Vec<Graphic> {
        (0..3)
            .flat_map(|i| (0..3).map(move |j| (i, j)))
            .map(|(i, j)| cell(-0.75 + 0.5 * i as f32, -0.75 + 0.5 * j as f32))
            .collect()
    }

    /// Arrowhead quad whose second vertex is reflex.
    fn dart(x: f32, y: f32) -> Graphic {
        Graphic::polygon(
            PolygonShape::new(vec![
                Vec3::new(x, y, 0.0),
                Vec3::new(x + 0.3, y + 0.3, 0.0),
                Vec3::new(x + 0.6, y, 0.0),
                Vec3::new(x + 0.3, y + 0.8, 0.0),
            ]),
            PolygonStyle {
                fill_color: Vec4::new(0.8, 0.1, 0.1, 1.0),
                draw_outline: false,
                ..PolygonStyle::default()
            },
        )
    }

    /// The same children drawn one by one through the composite path.
    fn per_child(children: &[Graphic], size: u32) -> SoftwareCanvas {
        let camera = flat_camera(size);
        let lighting = meteoplot_core::Lighting::default();
        let mut text = text_context();
        let mut state = state(&camera, &lighting, &mut text);
        let mut composite = CompositeRenderer::default();
        composite.rebuild_children(children, &state).unwrap();
        let mut canvas = SoftwareCanvas::new(size, size);
        canvas.begin_frame(Vec4::ONE);
        {
            let mut painter = Painter::new(&mut canvas, &camera);
            composite.draw(&mut painter, &mut state).unwrap();
        }
        canvas.end_frame().unwrap();
        canvas
    }

    #[test]
    fn test_batch_matches_per_child_drawing() {
        let batch = Graphic::collection(grid());
        assert_eq!(batch.kind(), GraphicKind::QuadBatch);
        let mut batched = render_one(&batch, 40);
        let mut single = per_child(&grid(), 40);
        assert_eq!(batched.snapshot().unwrap(), single.snapshot().unwrap());
    }

    #[test]
    fn test_concave_quads_batch_matches_per_child_drawing() {
        let darts = || vec![dart(-0.8, -0.5), dart(0.1, -0.5)];
        let batch = Graphic::collection(darts());
        assert_eq!(batch.kind(), GraphicKind::QuadBatch);
        let mut batched = render_one(&batch, 80);
        let mut single = per_child(&darts(), 80);
        assert_eq!(batched.snapshot().unwrap(), single.snapshot().unwrap());

        // Each dart covers 0.15 square units, 60 pixels at 20 pixels per unit.
        // A fan from the first vertex would cover 0.33.
        let n = painted(&mut batched);
        assert!((90..=150).contains(&n), "painted {n}");
    }

    #[test]
    fn test_triangle_batch() {
        let tri = |x: f32| {
            Graphic::polygon(
                PolygonShape::new(vec![
                    Vec3::new(x, -0.5, 0.0),
                    Vec3::new(x + 0.5, -0.5, 0.0),
                    Vec3::new(x, 0.5, 0.0),
                ]),
                PolygonStyle::default(),
            )
        };
        let g = Graphic::collection(vec![tri(-0.5), tri(0.25)]);
        assert_eq!(g.kind(), GraphicKind::TriangleBatch);
        let mut canvas = render_one(&g, 40);
        // Two right triangles of 5x10 pixels.
        let n = painted(&mut canvas);
        assert!((45..=55).contains(&n), "painted {n}");
    }
}
