//! Mixed collections, drawn child by child.

use meteoplot_core::{Extent3D, Graphic, GraphicKind};

use super::{create_renderer, draw_renderer, GraphicRenderer, RenderState};
use crate::error::RenderResult;
use crate::painter::Painter;

#[derive(Default)]
pub struct CompositeRenderer {
    children: Vec<Box<dyn GraphicRenderer>>,
    extent: Option<Extent3D>,
    lit: bool,
}

impl CompositeRenderer {
    /// Builds one renderer per visible child.
    ///
    /// A child that fails to build is logged and left out; its siblings
    /// still draw.
    pub fn rebuild_children(&mut self, children: &[Graphic], state: &RenderState<'_>) -> RenderResult<()> {
        self.children.clear();
        for (i, child) in children.iter().enumerate() {
            if !child.visible {
                continue;
            }
            let kind = child.kind();
            let Some(mut renderer) = create_renderer(kind) else {
                continue;
            };
            let inherited;
            let child = if self.lit && !child.using_light {
                inherited = child.clone().with_lighting(true);
                &inherited
            } else {
                child
            };
            match renderer.rebuild(child, state) {
                Ok(()) => self.children.push(renderer),
                Err(e) => log::warn!("skipping {kind:?} child {i} of composite graphic: {e}"),
            }
        }
        Ok(())
    }

    /// Number of children that built successfully.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl GraphicRenderer for CompositeRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Composite
    }

    fn rebuild(&mut self, graphic: &Graphic, state: &RenderState<'_>) -> RenderResult<()> {
        self.extent = graphic.extent();
        self.lit = graphic.using_light;
        self.rebuild_children(graphic.children(), state)
    }

    fn draw(&mut self, painter: &mut Painter<'_>, state: &mut RenderState<'_>) -> RenderResult<()> {
        for child in &mut self.children {
            if let Err(e) = draw_renderer(child.as_mut(), painter, state) {
                log::warn!("failed to draw {:?} child of composite graphic: {e}", child.kind());
            }
        }
        Ok(())
    }

    fn extent(&self) -> Option<Extent3D> {
        self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use glam::Vec3;
    use meteoplot_core::{
        LineStyle, Lighting, MeshShape, PointStyle, PolygonShape, PolygonStyle, Shape, Style,
    };

    #[test]
    fn test_mixed_children_each_get_a_renderer() {
        let g = Graphic::collection(vec![
            Graphic::points(vec![Vec3::ZERO], PointStyle::default()),
            Graphic::polyline(vec![Vec3::ZERO, Vec3::X], LineStyle::default()),
            Graphic::polygon(
                PolygonShape::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y]),
                PolygonStyle::default(),
            ),
        ]);
        assert_eq!(g.kind(), GraphicKind::Composite);
        let camera = flat_camera(40);
        let lighting = Lighting::default();
        let mut text = text_context();
        let state = state(&camera, &lighting, &mut text);
        let mut r = CompositeRenderer::default();
        r.rebuild(&g, &state).unwrap();
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_bad_child_is_skipped() {
        let bad = Graphic::leaf(
            Shape::Mesh(MeshShape::new(vec![Vec3::ZERO], vec![[0, 0, 9]])),
            Style::Intrinsic,
        );
        let g = Graphic::collection(vec![
            bad,
            Graphic::points(vec![Vec3::ZERO], PointStyle::default()),
        ]);
        let mut canvas = render_one(&g, 40);
        assert_eq!(painted(&mut canvas), 36);
    }
}
