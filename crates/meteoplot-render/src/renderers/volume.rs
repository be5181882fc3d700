//! Scalar volumes drawn as a stack of translucent textured slices.
//!
//! Slices are prebuilt along all three grid axes. Each frame draws the stack
//! most facing the viewer, far to near, without writing depth.

use glam::{Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};
use meteoplot_core::{Extent3D, Graphic, GraphicKind, Shape, VolumeShape};

use super::{GraphicRenderer, RenderState};
use crate::canvas::DepthMode;
use crate::error::RenderResult;
use crate::painter::Painter;

/// The two in-slice axes for slices stacked along `axis`.
const SLICE_AXES: [(usize, usize); 3] = [(1, 2), (0, 2), (0, 1)];

#[derive(Default)]
pub struct VolumeRenderer {
    /// Slice images stacked along x, y and z.
    stacks: [Vec<RgbaImage>; 3],
    min: Vec3,
    max: Vec3,
}

/// Grid axis most aligned with the view direction.
fn stack_axis(view: Vec3) -> usize {
    let a = view.abs();
    if a.x >= a.y && a.x >= a.z {
        0
    } else if a.y >= a.z {
        1
    } else {
        2
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_rgba(c: Vec4) -> Rgba<u8> {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([q(c.x), q(c.y), q(c.z), q(c.w)])
}

#[allow(clippy::cast_possible_truncation)]
fn build_stack(volume: &VolumeShape, axis: usize) -> Vec<RgbaImage> {
    let (a, b) = SLICE_AXES[axis];
    let dims = volume.dims;
    (0..dims[axis])
        .map(|s| {
            RgbaImage::from_fn(dims[a] as u32, dims[b] as u32, |x, y| {
                let mut ijk = [0usize; 3];
                ijk[axis] = s;
                ijk[a] = x as usize;
                ijk[b] = y as usize;
                let v = volume.value(ijk[0], ijk[1], ijk[2]);
                if v.is_nan() {
                    return Rgba([0, 0, 0, 0]);
                }
                let mut c = volume.color_map.sample(volume.normalize.apply(f64::from(v)));
                c.w *= volume.opacity;
                to_rgba(c)
            })
        })
        .collect()
}

impl GraphicRenderer for VolumeRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Volume
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.stacks = Default::default();
        for (shape, _) in graphic.leaves() {
            let Shape::Volume(volume) = shape else { continue };
            volume.validate()?;
            for axis in 0..3 {
                self.stacks[axis] = build_stack(volume, axis);
            }
            self.min = volume.extent.min().as_vec3();
            self.max = volume.extent.max().as_vec3();
        }
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw(&mut self, painter: &mut Painter<'_>, state: &mut RenderState<'_>) -> RenderResult<()> {
        let view = state.view_direction();
        let axis = stack_axis(view);
        let stack = &self.stacks[axis];
        if stack.is_empty() {
            return Ok(());
        }
        let (a, b) = SLICE_AXES[axis];
        let n = stack.len();
        let depth = painter.set_depth_mode(DepthMode::TestOnly);
        let order: Box<dyn Iterator<Item = usize>> = if view[axis] > 0.0 {
            Box::new((0..n).rev())
        } else {
            Box::new(0..n)
        };
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let mut result = Ok(());
        for s in order {
            let t = if n > 1 { s as f32 / (n - 1) as f32 } else { 0.5 };
            let c = self.min[axis] + t * (self.max[axis] - self.min[axis]);
            let corner = |ua: f32, ub: f32| {
                let mut p = Vec3::ZERO;
                p[axis] = c;
                p[a] = ua;
                p[b] = ub;
                p
            };
            let corners = [
                corner(self.min[a], self.min[b]),
                corner(self.max[a], self.min[b]),
                corner(self.max[a], self.max[b]),
                corner(self.min[a], self.max[b]),
            ];
            result = painter.textured_quad(&stack[s], corners, uvs, Vec4::ONE);
            if result.is_err() {
                break;
            }
        }
        painter.set_depth_mode(depth);
        result
    }

    fn uses_clip(&self) -> bool {
        false
    }

    fn extent(&self) -> Option<Extent3D> {
        Some(Extent3D::new(
            f64::from(self.min.x),
            f64::from(self.max.x),
            f64::from(self.min.y),
            f64::from(self.max.y),
            f64::from(self.min.z),
            f64::from(self.max.z),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use meteoplot_core::{ColorMap, Normalize, Style};

    fn volume(opacity: f32) -> VolumeShape {
        VolumeShape {
            dims: [2, 3, 4],
            data: (0..24).map(|v| v as f32).collect(),
            extent: Extent3D::new(-0.5, 0.5, -0.5, 0.5, -0.5, 0.5),
            color_map: ColorMap::new("reds", vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 2]),
            normalize: Normalize::linear(0.0, 23.0),
            opacity,
        }
    }

    #[test]
    fn test_stack_axis_follows_view() {
        assert_eq!(stack_axis(Vec3::new(0.1, -0.9, 0.2)), 1);
        assert_eq!(stack_axis(Vec3::NEG_Z), 2);
        assert_eq!(stack_axis(Vec3::new(-1.0, 0.5, 0.5)), 0);
    }

    #[test]
    fn test_slices_have_in_plane_sizes() {
        let v = volume(1.0);
        let x = build_stack(&v, 0);
        assert_eq!(x.len(), 2);
        assert_eq!(x[0].dimensions(), (3, 4));
        let z = build_stack(&v, 2);
        assert_eq!(z.len(), 4);
        assert_eq!(z[0].dimensions(), (2, 3));
        assert_eq!(z[0].get_pixel(1, 2).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let z = build_stack(&volume(0.5), 2);
        assert_eq!(z[0].get_pixel(0, 0).0[3], 128);
    }

    #[test]
    fn test_volume_covers_its_extent() {
        let g = Graphic::leaf(Shape::Volume(volume(1.0)), Style::Intrinsic);
        let mut canvas = render_one(&g, 40);
        assert_eq!(painted(&mut canvas), 100);
    }

    #[test]
    fn test_size_mismatch_fails_rebuild() {
        let mut v = volume(1.0);
        v.data.pop();
        let g = Graphic::leaf(Shape::Volume(v), Style::Intrinsic);
        let camera = flat_camera(40);
        let lighting = meteoplot_core::Lighting::default();
        let mut text = text_context();
        let state = state(&camera, &lighting, &mut text);
        assert!(VolumeRenderer::default().rebuild(&g, &state).is_err());
    }
}
