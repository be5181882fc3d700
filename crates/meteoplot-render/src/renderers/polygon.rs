//! Filled polygons with optional holes and outlines.

use std::ops::Range;
use std::sync::Arc;

use glam::{Vec3, Vec4};
use meteoplot_core::tessellation::{self, Tessellation};
use meteoplot_core::{
    Extent3D, Graphic, GraphicKind, MeteoPlotError, PolygonShape, PolygonStyle, Shape,
};

use super::{ring_normal, GraphicRenderer, RenderState};
use crate::error::RenderResult;
use crate::painter::Painter;

/// Draw-ready fill triangles and outline rings of one or more polygons.
#[derive(Default)]
pub(super) struct PolygonParts {
    fill: Vec<(Vec3, Vec4)>,
    /// Face normal per fill vertex, empty when unlit.
    normals: Vec<Vec3>,
    outlines: Vec<(Vec<(Vec3, Vec4)>, f32)>,
    /// Fill and outline ranges of each polygon, in push order.
    spans: Vec<(Range<usize>, Range<usize>)>,
}

impl PolygonParts {
    pub(super) fn clear(&mut self) {
        self.fill.clear();
        self.normals.clear();
        self.outlines.clear();
        self.spans.clear();
    }

    /// Appends one polygon. Vertex colors of the shape win over the fill color.
    pub(super) fn push(&mut self, tess: &Tessellation, shape: &PolygonShape, style: &PolygonStyle, lit: bool) {
        let (fill_start, outline_start) = (self.fill.len(), self.outlines.len());
        if style.draw_fill {
            let per_vertex = shape.vertex_colors().is_some();
            let normal = ring_normal(shape.outer());
            for tri in tess.triangles() {
                for i in tri {
                    let v = &tess.vertices[i as usize];
                    let color = if per_vertex { v.attrs } else { style.fill_color };
                    self.fill.push((v.position, color));
                    if lit {
                        self.normals.push(normal);
                    }
                }
            }
        }
        if style.draw_outline {
            for ring in &tess.outlines {
                let ring = ring.iter().map(|p| (*p, style.outline_color)).collect();
                self.outlines.push((ring, style.outline_width));
            }
        }
        self.spans
            .push((fill_start..self.fill.len(), outline_start..self.outlines.len()));
    }

    /// Draws fills in one call when there are no outlines, otherwise
    /// polygon by polygon so each outline sits between its own fill and
    /// the next polygon's.
    pub(super) fn draw(&self, painter: &mut Painter<'_>, state: &RenderState<'_>) {
        let shaded;
        let fill = if state.lighting.enabled && !self.normals.is_empty() {
            shaded = self
                .fill
                .iter()
                .zip(&self.normals)
                .map(|(&(p, c), n)| (p, state.shade(c, *n, p)))
                .collect::<Vec<(Vec3, Vec4)>>();
            shaded.as_slice()
        } else {
            self.fill.as_slice()
        };
        if self.outlines.is_empty() {
            if !fill.is_empty() {
                painter.triangles(fill);
            }
            return;
        }
        for (fills, outlines) in &self.spans {
            if !fills.is_empty() {
                painter.triangles(&fill[fills.clone()]);
            }
            for (ring, width) in &self.outlines[outlines.clone()] {
                painter.line_loop(ring, *width);
            }
        }
    }
}

/// Fill of a polygon, through the fan path when it qualifies.
pub(super) fn polygon_tessellation(shape: &PolygonShape) -> RenderResult<Arc<Tessellation>> {
    if shape.vertex_count() < 3 {
        return Err(MeteoPlotError::DegenerateGeometry(format!(
            "polygon ring has {} vertices",
            shape.vertex_count()
        ))
        .into());
    }
    if shape.is_fast_path() {
        return Ok(Arc::new(tessellation::fan(&shape.outer_vertices(Vec4::ONE))));
    }
    Ok(shape.tessellate(Vec4::ONE).map_err(MeteoPlotError::from)?)
}

#[derive(Default)]
pub struct PolygonRenderer {
    parts: PolygonParts,
    extent: Option<Extent3D>,
}

impl GraphicRenderer for PolygonRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Polygons
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.parts.clear();
        self.extent = None;
        for (shape, style) in graphic.leaves() {
            let Shape::Polygon(polygon) = shape else { continue };
            let tess = polygon_tessellation(polygon)?;
            self.parts
                .push(&tess, polygon, &style.polygon(), graphic.using_light);
            self.extent = match (self.extent, shape.extent()) {
                (Some(a), Some(b)) => Some(a.union(&b)),
                (a, b) => a.or(b),
            };
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
    use super::super::{create_renderer, draw_renderer};
    use super::*;
    use crate::canvas::Canvas;
    use crate::raster::SoftwareCanvas;
    use meteoplot_core::Lighting;

    fn square(half: f32) -> Vec<Vec3> {
        vec![
            Vec3::new(-half, -half, 0.0),
            Vec3::new(half, -half, 0.0),
            Vec3::new(half, half, 0.0),
            Vec3::new(-half, half, 0.0),
        ]
    }

    #[test]
    fn test_fast_path_square_fill() {
        let g = Graphic::polygon(PolygonShape::new(square(0.5)), PolygonStyle::default());
        let mut canvas = render_one(&g, 40);
        assert_eq!(painted(&mut canvas), 100);
    }

    #[test]
    fn test_hole_is_left_empty_and_cached() {
        let shape = PolygonShape::with_holes(square(1.0), vec![square(0.5)]);
        let g = Graphic::polygon(shape, PolygonStyle::default());
        let mut canvas = render_one(&g, 40);
        assert_eq!(painted(&mut canvas), 300);
        let Some((Shape::Polygon(p), _)) = g.as_leaf() else {
            panic!("not a polygon")
        };
        assert!(p.cached_tessellation().is_some());
    }

    #[test]
    fn test_vertex_colored_polygon_with_hole_keeps_ring_colors() {
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let shape = PolygonShape::with_holes(square(1.0), vec![square(0.5)])
            .with_vertex_colors(vec![red; 4])
            .unwrap();
        let style = PolygonStyle {
            draw_outline: false,
            ..PolygonStyle::default()
        };
        let mut canvas = render_one(&Graphic::polygon(shape, style), 40);
        let image = canvas.snapshot().unwrap();
        let filled: Vec<_> = image.pixels().filter(|p| p.0 != [255, 255, 255, 255]).collect();
        assert_eq!(filled.len(), 300);
        assert!(filled.iter().all(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_degenerate_ring_is_an_error() {
        let g = Graphic::polygon(
            PolygonShape::new(vec![Vec3::ZERO, Vec3::X]),
            PolygonStyle::default(),
        );
        let camera = flat_camera(40);
        let lighting = Lighting::default();
        let mut text = text_context();
        let state = state(&camera, &lighting, &mut text);
        let mut renderer = PolygonRenderer::default();
        assert!(renderer.rebuild(&g, &state).is_err());
    }

    #[test]
    fn test_polygon_outside_draw_extent_is_skipped() {
        let far: Vec<Vec3> = square(0.25).iter().map(|p| *p + Vec3::new(5.0, 5.0, 0.0)).collect();
        let g = Graphic::polygon(PolygonShape::new(far), PolygonStyle::default());
        let camera = flat_camera(40);
        let lighting = Lighting::default();
        let mut text = text_context();
        let mut canvas = SoftwareCanvas::new(40, 40);
        canvas.begin_frame(Vec4::ONE);
        let mut state = state(&camera, &lighting, &mut text);
        state.clip = true;
        let mut renderer = create_renderer(GraphicKind::Polygons).unwrap();
        renderer.rebuild(&g, &state).unwrap();
        {
            let mut painter = Painter::new(&mut canvas, &camera);
            painter.clip_mut().enable(&state.draw_extent);
            draw_renderer(renderer.as_mut(), &mut painter, &mut state).unwrap();
        }
        assert_eq!(painted(&mut canvas), 0);
    }
}
