//! Point markers.

use glam::{Mat4, Vec3, Vec4};
use meteoplot_core::{Extent3D, Graphic, GraphicKind, Lighting, PointMarker, Shape};

use super::{GraphicRenderer, RenderState};
use crate::error::RenderResult;
use crate::painter::{MarkerShape, Painter};

const SPHERE_STACKS: usize = 8;
const SPHERE_SLICES: usize = 12;
/// Extra pixels around a marker for its outline.
const OUTLINE_PAD: f32 = 2.0;

struct PointGroup {
    points: Vec<(Vec3, Vec4)>,
    size: f32,
    marker: PointMarker,
    outline: Option<Vec4>,
}

#[derive(Default)]
pub struct PointRenderer {
    groups: Vec<PointGroup>,
    extent: Option<Extent3D>,
    /// Unit sphere as a triangle list, built on first sphere draw.
    sphere: Vec<Vec3>,
}

impl GraphicRenderer for PointRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Points
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.groups.clear();
        let mut all = Vec::new();
        for (shape, style) in graphic.leaves() {
            let Shape::Point(shape) = shape else { continue };
            let style = style.point();
            let colors = shape.colors.as_deref().unwrap_or_default();
            let points = shape
                .points
                .iter()
                .enumerate()
                .map(|(i, p)| (*p, colors.get(i).copied().unwrap_or(style.color)))
                .collect();
            all.extend_from_slice(&shape.points);
            self.groups.push(PointGroup {
                points,
                size: style.size,
                marker: style.marker,
                outline: style.draw_outline.then_some(style.outline_color),
            });
        }
        self.extent = Extent3D::from_points(&all);
        Ok(())
    }

    fn draw(&mut self, painter: &mut Painter<'_>, state: &mut RenderState<'_>) -> RenderResult<()> {
        for group in &self.groups {
            let shape = match group.marker {
                PointMarker::Square => MarkerShape::Square,
                PointMarker::Circle => MarkerShape::Circle,
                PointMarker::Sphere => {
                    if self.sphere.is_empty() {
                        self.sphere = unit_sphere();
                    }
                    draw_spheres(painter, state, &self.sphere, group);
                    continue;
                }
            };
            if let Some(outline) = group.outline {
                let ring: Vec<(Vec3, Vec4)> = group.points.iter().map(|(p, _)| (*p, outline)).collect();
                painter.points(&ring, group.size + OUTLINE_PAD, shape);
            }
            painter.points(&group.points, group.size, shape);
        }
        Ok(())
    }

    fn extent(&self) -> Option<Extent3D> {
        self.extent
    }
}

/// Shaded spheres of `size` pixels drawn in eye space.
///
/// The sphere mesh is oriented with the rotation-only model-view so the
/// data scaling never squashes it.
fn draw_spheres(painter: &mut Painter<'_>, state: &RenderState<'_>, sphere: &[Vec3], group: &PointGroup) {
    let light = if state.lighting.enabled {
        state.lighting.clone()
    } else {
        Lighting::on()
    };
    let half_px = 0.5 * group.size * painter.dpi_scale();
    let viewport = painter.viewport();
    let mut tris = Vec::with_capacity(group.points.len() * sphere.len());
    for &(p, color) in &group.points {
        if painter.clip().active().is_some_and(|planes| !planes.contains(p)) {
            continue;
        }
        let center = state.model_view.transform_point3(p);
        let radius = half_px / pixels_per_unit(state.projection, center, viewport.y);
        if !radius.is_finite() {
            continue;
        }
        for dir in sphere {
            let n = state.rotation.transform_vector3(*dir);
            let pos = center + n * radius;
            tris.push((pos, light.shade(color, n, pos)));
        }
    }
    let model_view = painter.set_model_view(Mat4::IDENTITY);
    let was = painter.clip_mut().set_enabled(false);
    painter.triangles(&tris);
    painter.clip_mut().set_enabled(was);
    painter.set_model_view(model_view);
}

/// Window pixels covered by one eye-space unit at `center`.
fn pixels_per_unit(projection: Mat4, center: Vec3, viewport_height: f32) -> f32 {
    let a = projection * center.extend(1.0);
    let b = projection * (center + Vec3::Y).extend(1.0);
    if a.w.abs() < f32::EPSILON || b.w.abs() < f32::EPSILON {
        return f32::NAN;
    }
    ((b.y / b.w - a.y / a.w) * 0.5 * viewport_height).abs()
}

#[allow(clippy::cast_precision_loss)]
fn unit_sphere() -> Vec<Vec3> {
    let at = |stack: usize, slice: usize| {
        let theta = stack as f32 / SPHERE_STACKS as f32 * std::f32::consts::PI;
        let phi = slice as f32 / SPHERE_SLICES as f32 * std::f32::consts::TAU;
        Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos())
    };
    let mut out = Vec::with_capacity(SPHERE_STACKS * SPHERE_SLICES * 6);
    for i in 0..SPHERE_STACKS {
        for j in 0..SPHERE_SLICES {
            let (a, b, c, d) = (at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1));
            out.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }
    out
}
