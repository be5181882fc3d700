//! Immediate-mode drawing front-end over a [`Canvas`].
//!
//! The painter owns the current model-view, projection and clip state.
//! Geometry is given in the coordinates the model-view expects (data space
//! for graphics, eye space for overlays). Lines and markers are expanded to
//! screen-aligned quads whose size is given in pixels.

use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};
use image::RgbaImage;

use crate::camera::Camera;
use crate::canvas::{Canvas, ColorVertex, DepthMode, TexVertex};
use crate::clip::ClipState;
use crate::error::RenderResult;

const MIN_W: f32 = 1e-5;
const CIRCLE_SEGMENTS: usize = 16;

/// Marker outline for [`Painter::points`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Square,
    Circle,
}

pub struct Painter<'a> {
    canvas: &'a mut dyn Canvas,
    projection: Mat4,
    model_view: Mat4,
    mvp: Mat4,
    viewport: Vec2,
    clip: ClipState,
    depth: DepthMode,
    dpi_scale: f32,
}

impl<'a> Painter<'a> {
    /// Starts painting with the camera's current matrices.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(canvas: &'a mut dyn Canvas, camera: &Camera) -> Self {
        let (w, h) = canvas.size();
        let projection = camera.projection();
        let model_view = camera.model_view();
        Self {
            canvas,
            projection,
            model_view,
            mvp: projection * model_view,
            viewport: Vec2::new(w.max(1) as f32, h.max(1) as f32),
            clip: ClipState::default(),
            depth: DepthMode::Write,
            dpi_scale: 1.0,
        }
    }

    pub fn set_dpi_scale(&mut self, dpi_scale: f32) {
        self.dpi_scale = dpi_scale.max(f32::EPSILON);
    }

    #[must_use]
    pub fn dpi_scale(&self) -> f32 {
        self.dpi_scale
    }

    #[must_use]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    #[must_use]
    pub fn model_view(&self) -> Mat4 {
        self.model_view
    }

    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Replaces the model-view; returns the previous one.
    pub fn set_model_view(&mut self, model_view: Mat4) -> Mat4 {
        let old = self.model_view;
        self.model_view = model_view;
        self.mvp = self.projection * model_view;
        old
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.mvp = projection * self.model_view;
    }

    #[must_use]
    pub fn clip(&self) -> &ClipState {
        &self.clip
    }

    pub fn clip_mut(&mut self) -> &mut ClipState {
        &mut self.clip
    }

    /// Sets the depth mode; returns the previous one.
    pub fn set_depth_mode(&mut self, depth: DepthMode) -> DepthMode {
        std::mem::replace(&mut self.depth, depth)
    }

    #[must_use]
    pub fn depth_mode(&self) -> DepthMode {
        self.depth
    }

    /// Position in clip space under the current matrices.
    #[must_use]
    pub fn to_clip(&self, p: Vec3) -> Vec4 {
        self.mvp * p.extend(1.0)
    }

    /// Window coordinates, origin bottom-left.
    #[must_use]
    pub fn to_window(&self, p: Vec3) -> Vec3 {
        let c = self.to_clip(p);
        let w = if c.w.abs() < MIN_W { MIN_W } else { c.w };
        let ndc = c.xyz() / w;
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (ndc.y + 1.0) * 0.5 * self.viewport.y,
            (ndc.z + 1.0) * 0.5,
        )
    }

    /// Clip-space vertices straight to the canvas.
    pub fn raw_triangles(&mut self, vertices: &[ColorVertex]) {
        self.canvas.draw_triangles(vertices, self.depth);
    }

    /// Triangles as consecutive vertex triples.
    pub fn triangles(&mut self, vertices: &[(Vec3, Vec4)]) {
        let mut out = Vec::with_capacity(vertices.len());
        for tri in vertices.chunks_exact(3) {
            self.push_polygon(tri, &mut out);
        }
        if !out.is_empty() {
            self.canvas.draw_triangles(&out, self.depth);
        }
    }

    /// A convex polygon drawn as a fan around its first vertex.
    pub fn triangle_fan(&mut self, vertices: &[(Vec3, Vec4)]) {
        let mut out = Vec::with_capacity(vertices.len() * 3);
        self.push_polygon(vertices, &mut out);
        if !out.is_empty() {
            self.canvas.draw_triangles(&out, self.depth);
        }
    }

    fn push_polygon(&self, polygon: &[(Vec3, Vec4)], out: &mut Vec<ColorVertex>) {
        let clipped;
        let polygon = match self.clip.active() {
            Some(planes) => {
                clipped = planes.clip_polygon(polygon);
                clipped.as_slice()
            }
            None => polygon,
        };
        if polygon.len() < 3 {
            return;
        }
        let first = ColorVertex::new(self.to_clip(polygon[0].0), polygon[0].1);
        for pair in polygon[1..].windows(2) {
            out.push(first);
            out.push(ColorVertex::new(self.to_clip(pair[0].0), pair[0].1));
            out.push(ColorVertex::new(self.to_clip(pair[1].0), pair[1].1));
        }
    }

    /// Connected line through the points.
    pub fn line_strip(&mut self, points: &[(Vec3, Vec4)], width: f32) {
        let segments: Vec<_> = points.windows(2).map(|w| (w[0], w[1])).collect();
        self.segments(&segments, width);
    }

    /// Closed line through the points.
    pub fn line_loop(&mut self, points: &[(Vec3, Vec4)], width: f32) {
        let mut segments: Vec<_> = points.windows(2).map(|w| (w[0], w[1])).collect();
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if points.len() > 2 && first.0 != last.0 {
                segments.push((*last, *first));
            }
        }
        self.segments(&segments, width);
    }

    /// Single-colored line strip.
    pub fn polyline(&mut self, points: &[Vec3], color: Vec4, width: f32) {
        let colored: Vec<_> = points.iter().map(|p| (*p, color)).collect();
        self.line_strip(&colored, width);
    }

    /// Independent segments.
    pub fn segments(&mut self, segments: &[((Vec3, Vec4), (Vec3, Vec4))], width: f32) {
        let half = 0.5 * (width * self.dpi_scale).max(1.0);
        let mut out = Vec::with_capacity(segments.len() * 6);
        for &(a, b) in segments {
            let (a, b) = match self.clip.active() {
                Some(planes) => match planes.clip_segment(a, b) {
                    Some(kept) => kept,
                    None => continue,
                },
                None => (a, b),
            };
            self.push_segment(a, b, half, &mut out);
        }
        if !out.is_empty() {
            self.canvas.draw_triangles(&out, self.depth);
        }
    }

    fn push_segment(&self, a: (Vec3, Vec4), b: (Vec3, Vec4), half: f32, out: &mut Vec<ColorVertex>) {
        let (mut ca, mut cb) = (self.to_clip(a.0), self.to_clip(b.0));
        let (mut col_a, mut col_b) = (a.1, b.1);
        if ca.w < MIN_W && cb.w < MIN_W {
            return;
        }
        // Pull an endpoint behind the eye forward so the screen direction is defined.
        if ca.w < MIN_W {
            let t = (MIN_W - ca.w) / (cb.w - ca.w);
            ca = ca.lerp(cb, t);
            col_a = col_a.lerp(col_b, t);
        } else if cb.w < MIN_W {
            let t = (MIN_W - cb.w) / (ca.w - cb.w);
            cb = cb.lerp(ca, t);
            col_b = col_b.lerp(col_a, t);
        }
        let sa = ca.xy() / ca.w * self.viewport * 0.5;
        let sb = cb.xy() / cb.w * self.viewport * 0.5;
        let d = sb - sa;
        let dir = if d.length_squared() > 0.0 { d.normalize() } else { Vec2::X };
        let normal = dir.perp() * half;
        let extend = dir * half;
        let to_ndc = |v: Vec2| v * 2.0 / self.viewport;
        let offset = |c: Vec4, px: Vec2| {
            let o = to_ndc(px) * c.w;
            Vec4::new(c.x + o.x, c.y + o.y, c.z, c.w)
        };
        let a0 = ColorVertex::new(offset(ca, normal - extend), col_a);
        let a1 = ColorVertex::new(offset(ca, -normal - extend), col_a);
        let b0 = ColorVertex::new(offset(cb, normal + extend), col_b);
        let b1 = ColorVertex::new(offset(cb, -normal + extend), col_b);
        out.extend_from_slice(&[a0, a1, b1, a0, b1, b0]);
    }

    /// Markers of `size` pixels centered on each point.
    pub fn points(&mut self, points: &[(Vec3, Vec4)], size: f32, shape: MarkerShape) {
        let half = 0.5 * (size * self.dpi_scale).max(1.0);
        let corners: Vec<Vec2> = match shape {
            MarkerShape::Square => vec![
                Vec2::new(-half, -half),
                Vec2::new(half, -half),
                Vec2::new(half, half),
                Vec2::new(-half, half),
            ],
            MarkerShape::Circle => circle_outline(half),
        };
        let mut out = Vec::with_capacity(points.len() * corners.len() * 3);
        for &(p, color) in points {
            if let Some(planes) = self.clip.active() {
                if !planes.contains(p) {
                    continue;
                }
            }
            let c = self.to_clip(p);
            if c.w < MIN_W {
                continue;
            }
            let at = |px: Vec2| {
                let o = px * 2.0 / self.viewport * c.w;
                ColorVertex::new(Vec4::new(c.x + o.x, c.y + o.y, c.z, c.w), color)
            };
            let center = ColorVertex::new(c, color);
            for i in 0..corners.len() {
                out.push(center);
                out.push(at(corners[i]));
                out.push(at(corners[(i + 1) % corners.len()]));
            }
        }
        if !out.is_empty() {
            self.canvas.draw_triangles(&out, self.depth);
        }
    }

    /// A textured quad in model coordinates.
    ///
    /// Corners and UVs go lower-left, lower-right, upper-right, upper-left.
    pub fn textured_quad(
        &mut self,
        image: &RgbaImage,
        corners: [Vec3; 4],
        uvs: [Vec2; 4],
        tint: Vec4,
    ) -> RenderResult<()> {
        let polygon: Vec<(Vec3, Vec2)> = corners.into_iter().zip(uvs).collect();
        let clipped;
        let polygon = match self.clip.active() {
            Some(planes) => {
                clipped = planes.clip_polygon(&polygon);
                clipped.as_slice()
            }
            None => polygon.as_slice(),
        };
        if polygon.len() < 3 {
            return Ok(());
        }
        let vertex = |v: &(Vec3, Vec2)| TexVertex::new(self.to_clip(v.0), v.1, tint);
        let mut out = Vec::with_capacity(polygon.len() * 3);
        for pair in polygon[1..].windows(2) {
            out.push(vertex(&polygon[0]));
            out.push(vertex(&pair[0]));
            out.push(vertex(&pair[1]));
        }
        self.canvas.draw_textured(image, &out, self.depth)
    }

    fn window_to_clip(&self, p: Vec2) -> Vec4 {
        let ndc = p * 2.0 / self.viewport - Vec2::ONE;
        Vec4::new(ndc.x, ndc.y, -1.0, 1.0)
    }

    /// Filled rectangle in window pixels, ignoring depth.
    pub fn screen_quad(&mut self, min: Vec2, max: Vec2, color: Vec4) {
        let v = |x: f32, y: f32| ColorVertex::new(self.window_to_clip(Vec2::new(x, y)), color);
        let verts = [
            v(min.x, min.y),
            v(max.x, min.y),
            v(max.x, max.y),
            v(min.x, min.y),
            v(max.x, max.y),
            v(min.x, max.y),
        ];
        self.canvas.draw_triangles(&verts, DepthMode::Always);
    }

    /// Line in window pixels, ignoring depth.
    pub fn screen_line(&mut self, a: Vec2, b: Vec2, color: Vec4, width: f32) {
        let half = 0.5 * (width * self.dpi_scale).max(1.0);
        let d = b - a;
        let dir = if d.length_squared() > 0.0 { d.normalize() } else { Vec2::X };
        let n = dir.perp() * half;
        let v = |p: Vec2| ColorVertex::new(self.window_to_clip(p), color);
        let verts = [v(a + n), v(a - n), v(b - n), v(a + n), v(b - n), v(b + n)];
        self.canvas.draw_triangles(&verts, DepthMode::Always);
    }

    /// Image over a window-space quad, ignoring depth.
    ///
    /// Corners go lower-left, lower-right, upper-right, upper-left.
    pub fn screen_image(&mut self, image: &RgbaImage, corners: [Vec2; 4], tint: Vec4) -> RenderResult<()> {
        self.window_image(image, corners, -1.0, tint, DepthMode::Always)
    }

    /// Image over a window-space quad at window depth `depth` (0..1),
    /// tested against the depth buffer with the current depth mode.
    pub fn screen_image_at(
        &mut self,
        image: &RgbaImage,
        corners: [Vec2; 4],
        depth: f32,
        tint: Vec4,
    ) -> RenderResult<()> {
        let mode = self.depth;
        self.window_image(image, corners, depth * 2.0 - 1.0, tint, mode)
    }

    fn window_image(
        &mut self,
        image: &RgbaImage,
        corners: [Vec2; 4],
        ndc_z: f32,
        tint: Vec4,
        mode: DepthMode,
    ) -> RenderResult<()> {
        let uvs = [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];
        let v = |i: usize| {
            let mut c = self.window_to_clip(corners[i]);
            c.z = ndc_z;
            TexVertex::new(c, uvs[i], tint)
        };
        let verts = [v(0), v(1), v(2), v(0), v(2), v(3)];
        self.canvas.draw_textured(image, &verts, mode)
    }
}

fn circle_outline(radius: f32) -> Vec<Vec2> {
    (0..CIRCLE_SEGMENTS)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let a = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
            Vec2::new(a.cos(), a.sin()) * radius
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Viewport;
    use crate::raster::SoftwareCanvas;
    use meteoplot_core::{Extent3D, Transform};

    fn flat_camera(size: u32) -> Camera {
        let mut camera = Camera::new();
        camera.set_viewport(Viewport::new(0, 0, size, size));
        camera.set_angle_x(0.0);
        camera.set_angle_y(0.0);
        camera.update_model_view(&Transform::default());
        camera
    }

    fn count(canvas: &mut SoftwareCanvas, rgba: [u8; 4]) -> usize {
        canvas.snapshot().unwrap().pixels().filter(|p| p.0 == rgba).count()
    }

    #[test]
    fn test_fan_fills_quad() {
        let camera = flat_camera(40);
        let mut canvas = SoftwareCanvas::new(40, 40);
        canvas.begin_frame(Vec4::new(0.0, 0.0, 0.0, 1.0));
        let mut painter = Painter::new(&mut canvas, &camera);
        let white = Vec4::ONE;
        // Half-height 2 maps the unit square onto a quarter of the viewport.
        painter.triangle_fan(&[
            (Vec3::new(0.0, 0.0, 0.0), white),
            (Vec3::new(2.0, 0.0, 0.0), white),
            (Vec3::new(2.0, 2.0, 0.0), white),
            (Vec3::new(0.0, 2.0, 0.0), white),
        ]);
        assert_eq!(count(&mut canvas, [255; 4]), 400);
    }

    #[test]
    fn test_clip_removes_geometry_outside_extent() {
        let camera = flat_camera(40);
        let mut canvas = SoftwareCanvas::new(40, 40);
        canvas.begin_frame(Vec4::new(0.0, 0.0, 0.0, 1.0));
        let mut painter = Painter::new(&mut canvas, &camera);
        painter.clip_mut().enable(&Extent3D::new(0.0, 1.0, 0.0, 1.0, -1.0, 1.0));
        let white = Vec4::ONE;
        painter.triangle_fan(&[
            (Vec3::new(0.0, 0.0, 0.0), white),
            (Vec3::new(2.0, 0.0, 0.0), white),
            (Vec3::new(2.0, 2.0, 0.0), white),
            (Vec3::new(0.0, 2.0, 0.0), white),
        ]);
        let n = count(&mut canvas, [255; 4]);
        assert!((95..=110).contains(&n), "{n}");
    }

    #[test]
    fn test_line_width_in_pixels() {
        let camera = flat_camera(40);
        let mut canvas = SoftwareCanvas::new(40, 40);
        canvas.begin_frame(Vec4::new(0.0, 0.0, 0.0, 1.0));
        let mut painter = Painter::new(&mut canvas, &camera);
        painter.set_depth_mode(DepthMode::Always);
        painter.polyline(&[Vec3::new(-1.0, 0.1, 0.0), Vec3::new(1.0, 0.1, 0.0)], Vec4::ONE, 2.0);
        let n = count(&mut canvas, [255; 4]);
        // 20 px long plus 1 px caps at each end, 2 px wide.
        assert!((40..=48).contains(&n), "{n}");
    }

    #[test]
    fn test_square_markers() {
        let camera = flat_camera(40);
        let mut canvas = SoftwareCanvas::new(40, 40);
        canvas.begin_frame(Vec4::new(0.0, 0.0, 0.0, 1.0));
        let mut painter = Painter::new(&mut canvas, &camera);
        painter.points(&[(Vec3::ZERO, Vec4::ONE)], 4.0, MarkerShape::Square);
        assert_eq!(count(&mut canvas, [255; 4]), 16);
    }

    #[test]
    fn test_screen_quad_and_window_projection() {
        let camera = flat_camera(40);
        let mut canvas = SoftwareCanvas::new(40, 40);
        canvas.begin_frame(Vec4::new(0.0, 0.0, 0.0, 1.0));
        let mut painter = Painter::new(&mut canvas, &camera);
        let w = painter.to_window(Vec3::new(2.0, 2.0, 0.0));
        assert!((w.x - 40.0).abs() < 1e-4 && (w.y - 40.0).abs() < 1e-4);
        painter.screen_quad(Vec2::new(0.0, 0.0), Vec2::new(5.0, 3.0), Vec4::ONE);
        assert_eq!(count(&mut canvas, [255; 4]), 15);
    }
}
