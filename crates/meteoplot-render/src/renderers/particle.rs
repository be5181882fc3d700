//! Translucent particle clouds, sorted back to front every frame.

use glam::{Mat4, Vec3, Vec4};
use meteoplot_core::{Extent3D, Graphic, GraphicKind, Shape};

use super::{GraphicRenderer, RenderState};
use crate::canvas::DepthMode;
use crate::error::RenderResult;
use crate::painter::{MarkerShape, Painter};

#[derive(Default)]
pub struct ParticleRenderer {
    particles: Vec<(Vec3, Vec4)>,
    size: f32,
    extent: Option<Extent3D>,
}

/// Indices of `points` ordered farthest first under `model_view`.
fn back_to_front(points: &[(Vec3, Vec4)], model_view: Mat4) -> Vec<usize> {
    let depth: Vec<f32> = points
        .iter()
        .map(|(p, _)| model_view.transform_point3(*p).z)
        .collect();
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|a, b| depth[*a].total_cmp(&depth[*b]));
    order
}

impl GraphicRenderer for ParticleRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Particles
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.particles.clear();
        self.extent = graphic.extent();
        for (shape, _) in graphic.leaves() {
            let Shape::Particles(set) = shape else { continue };
            self.size = set.size;
            self.particles.extend(
                set.positions
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (*p, set.colors.get(i).copied().unwrap_or(Vec4::ONE))),
            );
        }
        Ok(())
    }

    fn draw(&mut self, painter: &mut Painter<'_>, state: &mut RenderState<'_>) -> RenderResult<()> {
        let sorted: Vec<(Vec3, Vec4)> = back_to_front(&self.particles, state.model_view)
            .into_iter()
            .map(|i| self.particles[i])
            .collect();
        let depth = painter.set_depth_mode(DepthMode::TestOnly);
        painter.points(&sorted, self.size, MarkerShape::Circle);
        painter.set_depth_mode(depth);
        Ok(())
    }

    fn extent(&self) -> Option<Extent3D> {
        self.extent
    }
}
