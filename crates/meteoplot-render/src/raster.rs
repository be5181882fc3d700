//! CPU rasterizer implementing [`Canvas`].
//!
//! Triangles are clipped against the near and far planes in homogeneous
//! space, then filled with edge functions using a top-left rule. Attributes
//! are interpolated perspective-correctly; depth is interpolated linearly in
//! window space like a GPU does.

use glam::{Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};

use crate::canvas::{Canvas, ColorVertex, DepthMode, TexVertex};
use crate::error::{RenderError, RenderResult};

const ATTRS: usize = 8;
const MIN_W: f32 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct Vtx {
    clip: Vec4,
    attrs: [f32; ATTRS],
}

impl Vtx {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut attrs = [0.0; ATTRS];
        for (i, a) in attrs.iter_mut().enumerate() {
            *a = self.attrs[i] + (other.attrs[i] - self.attrs[i]) * t;
        }
        Self {
            clip: self.clip.lerp(other.clip, t),
            attrs,
        }
    }
}

impl From<&ColorVertex> for Vtx {
    fn from(v: &ColorVertex) -> Self {
        let mut attrs = [0.0; ATTRS];
        attrs[..4].copy_from_slice(&v.color);
        Self {
            clip: Vec4::from_array(v.position),
            attrs,
        }
    }
}

impl From<&TexVertex> for Vtx {
    fn from(v: &TexVertex) -> Self {
        let mut attrs = [0.0; ATTRS];
        attrs[..4].copy_from_slice(&v.tint);
        attrs[4..6].copy_from_slice(&v.uv);
        Self {
            clip: Vec4::from_array(v.position),
            attrs,
        }
    }
}

/// A vertex after the perspective divide.
#[derive(Debug, Clone, Copy)]
struct ScreenVtx {
    xy: Vec2,
    z: f32,
    inv_w: f32,
    attrs: [f32; ATTRS],
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Top and left edges of a counter-clockwise triangle in y-up coordinates.
fn is_top_left(a: Vec2, b: Vec2) -> bool {
    let d = b - a;
    (d.y == 0.0 && d.x < 0.0) || d.y < 0.0
}

/// Keeps the part of a convex polygon with `-w <= z <= w` and `w > 0`.
fn clip_depth(polygon: Vec<Vtx>) -> Vec<Vtx> {
    let planes: [fn(Vec4) -> f32; 3] = [|c| c.z + c.w, |c| c.w - c.z, |c| c.w - MIN_W];
    let mut current = polygon;
    for plane in planes {
        if current.is_empty() {
            break;
        }
        if current.iter().all(|v| plane(v.clip) >= 0.0) {
            continue;
        }
        let mut next = Vec::with_capacity(current.len() + 1);
        for (i, a) in current.iter().enumerate() {
            let b = &current[(i + 1) % current.len()];
            let (da, db) = (plane(a.clip), plane(b.clip));
            if da >= 0.0 {
                next.push(*a);
            }
            if (da >= 0.0) != (db >= 0.0) {
                next.push(a.lerp(b, da / (da - db)));
            }
        }
        current = next;
    }
    current
}

/// CPU render target.
///
/// Color and depth rows are stored bottom row first.
#[derive(Debug, Clone)]
pub struct SoftwareCanvas {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
    frames: u64,
}

impl SoftwareCanvas {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let n = (width * height) as usize;
        Self {
            width,
            height,
            color: vec![Vec4::ZERO; n],
            depth: vec![1.0; n],
            frames: 0,
        }
    }

    /// Number of frames begun on this canvas.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Color at a pixel, origin bottom-left.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec4> {
        (x < self.width && y < self.height).then(|| self.color[(y * self.width + x) as usize])
    }

    fn draw(&mut self, vertices: impl Iterator<Item = Vtx>, depth: DepthMode, texture: Option<&RgbaImage>) {
        let verts: Vec<Vtx> = vertices.collect();
        for tri in verts.chunks_exact(3) {
            let polygon = clip_depth(tri.to_vec());
            if polygon.len() < 3 {
                continue;
            }
            let screen: Vec<ScreenVtx> = polygon.iter().map(|v| self.to_screen(v)).collect();
            for i in 1..screen.len() - 1 {
                self.fill(screen[0], screen[i], screen[i + 1], depth, texture);
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_screen(&self, v: &Vtx) -> ScreenVtx {
        let inv_w = 1.0 / v.clip.w;
        let ndc = v.clip.truncate() * inv_w;
        ScreenVtx {
            xy: Vec2::new(
                (ndc.x + 1.0) * 0.5 * self.width as f32,
                (ndc.y + 1.0) * 0.5 * self.height as f32,
            ),
            z: (ndc.z + 1.0) * 0.5,
            inv_w,
            attrs: v.attrs,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn fill(
        &mut self,
        a: ScreenVtx,
        mut b: ScreenVtx,
        mut c: ScreenVtx,
        depth: DepthMode,
        texture: Option<&RgbaImage>,
    ) {
        let mut area = edge(a.xy, b.xy, c.xy);
        if area == 0.0 || !area.is_finite() {
            return;
        }
        if area < 0.0 {
            std::mem::swap(&mut b, &mut c);
            area = -area;
        }
        let min = a.xy.min(b.xy).min(c.xy).max(Vec2::ZERO);
        let max = a
            .xy
            .max(b.xy)
            .max(c.xy)
            .min(Vec2::new(self.width as f32, self.height as f32));
        if min.x >= max.x || min.y >= max.y {
            return;
        }
        let (x0, x1) = (min.x.floor() as u32, (max.x.ceil() as u32).min(self.width));
        let (y0, y1) = (min.y.floor() as u32, (max.y.ceil() as u32).min(self.height));
        let bias = [
            is_top_left(b.xy, c.xy),
            is_top_left(c.xy, a.xy),
            is_top_left(a.xy, b.xy),
        ];
        for py in y0..y1 {
            for px in x0..x1 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let w = [edge(b.xy, c.xy, p), edge(c.xy, a.xy, p), edge(a.xy, b.xy, p)];
                let inside = w
                    .iter()
                    .zip(bias)
                    .all(|(e, top_left)| *e > 0.0 || (*e == 0.0 && top_left));
                if !inside {
                    continue;
                }
                let l = [w[0] / area, w[1] / area, w[2] / area];
                let z = l[0] * a.z + l[1] * b.z + l[2] * c.z;
                let idx = (py * self.width + px) as usize;
                if depth.tests() && z > self.depth[idx] {
                    continue;
                }
                let pw = [l[0] * a.inv_w, l[1] * b.inv_w, l[2] * c.inv_w];
                let sum = pw[0] + pw[1] + pw[2];
                let mut attrs = [0.0f32; ATTRS];
                for (k, out) in attrs.iter_mut().enumerate() {
                    *out = (pw[0] * a.attrs[k] + pw[1] * b.attrs[k] + pw[2] * c.attrs[k]) / sum;
                }
                let mut src = Vec4::new(attrs[0], attrs[1], attrs[2], attrs[3]);
                if let Some(tex) = texture {
                    src *= sample_repeat(tex, Vec2::new(attrs[4], attrs[5]));
                }
                if src.w <= 0.0 {
                    continue;
                }
                let dst = self.color[idx];
                let alpha = src.w.clamp(0.0, 1.0);
                let rgb = src.truncate() * alpha + dst.truncate() * (1.0 - alpha);
                self.color[idx] = rgb.extend(alpha + dst.w * (1.0 - alpha));
                if depth.writes() {
                    self.depth[idx] = z;
                }
            }
        }
    }
}

/// Nearest-texel lookup with repeat wrapping, `v = 0` at the top row.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn sample_repeat(texture: &RgbaImage, uv: Vec2) -> Vec4 {
    let (w, h) = texture.dimensions();
    if w == 0 || h == 0 {
        return Vec4::ZERO;
    }
    let u = uv.x - uv.x.floor();
    let v = uv.y - uv.y.floor();
    let x = ((u * w as f32) as u32).min(w - 1);
    let y = ((v * h as f32) as u32).min(h - 1);
    let Rgba(p) = *texture.get_pixel(x, y);
    Vec4::new(f32::from(p[0]), f32::from(p[1]), f32::from(p[2]), f32::from(p[3])) / 255.0
}

impl Canvas for SoftwareCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        let frames = self.frames;
        *self = Self::new(width, height);
        self.frames = frames;
        log::debug!("software canvas resized to {}x{}", self.width, self.height);
        Ok(())
    }

    fn begin_frame(&mut self, background: Vec4) {
        self.color.fill(background);
        self.depth.fill(1.0);
        self.frames += 1;
    }

    fn draw_triangles(&mut self, vertices: &[ColorVertex], depth: DepthMode) {
        self.draw(vertices.iter().map(Vtx::from), depth, None);
    }

    fn draw_textured(
        &mut self,
        texture: &RgbaImage,
        vertices: &[TexVertex],
        depth: DepthMode,
    ) -> RenderResult<()> {
        if texture.width() == 0 || texture.height() == 0 {
            return Err(RenderError::Texture("empty texture".into()));
        }
        self.draw(vertices.iter().map(Vtx::from), depth, Some(texture));
        Ok(())
    }

    fn read_depth(&self, x: u32, y: u32) -> Option<f32> {
        if self.frames == 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.depth[(y * self.width + x) as usize])
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn snapshot(&mut self) -> RenderResult<RgbaImage> {
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Ok(RgbaImage::from_fn(self.width, self.height, |x, y| {
            let row = self.height - 1 - y;
            let c = self.color[(row * self.width + x) as usize];
            let rgb: Vec3 = c.truncate();
            Rgba([to_u8(rgb.x), to_u8(rgb.y), to_u8(rgb.z), to_u8(c.w)])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(x0: f32, y0: f32, x1: f32, y1: f32, z: f32, color: Vec4) -> Vec<ColorVertex> {
        let v = |x, y| ColorVertex::new(Vec4::new(x, y, z, 1.0), color);
        vec![v(x0, y0), v(x1, y0), v(x1, y1), v(x0, y0), v(x1, y1), v(x0, y1)]
    }

    fn covered(canvas: &SoftwareCanvas, color: Vec4) -> usize {
        canvas.color.iter().filter(|c| (**c - color).length() < 1e-4).count()
    }

    #[test]
    fn test_full_screen_quad_covers_every_pixel_once() {
        let mut canvas = SoftwareCanvas::new(16, 8);
        canvas.begin_frame(Vec4::ZERO);
        let red = Vec4::new(1.0, 0.0, 0.0, 0.5);
        canvas.draw_triangles(&quad(-1.0, -1.0, 1.0, 1.0, 0.0, red), DepthMode::Always);
        // Half alpha over black: a pixel hit twice by the shared diagonal would be brighter.
        let expected = Vec4::new(0.5, 0.0, 0.0, 0.5);
        assert_eq!(covered(&canvas, expected), 16 * 8);
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let mut canvas = SoftwareCanvas::new(4, 4);
        canvas.begin_frame(Vec4::ONE);
        let near = Vec4::new(0.0, 1.0, 0.0, 1.0);
        let far = Vec4::new(0.0, 0.0, 1.0, 1.0);
        canvas.draw_triangles(&quad(-1.0, -1.0, 1.0, 1.0, -0.5, near), DepthMode::Write);
        canvas.draw_triangles(&quad(-1.0, -1.0, 1.0, 1.0, 0.5, far), DepthMode::Write);
        assert_eq!(canvas.pixel(1, 1), Some(near));
        assert!((canvas.read_depth(1, 1).unwrap() - 0.25).abs() < 1e-5);
        canvas.draw_triangles(&quad(-1.0, -1.0, 1.0, 1.0, 0.5, far), DepthMode::Always);
        assert_eq!(canvas.pixel(1, 1), Some(far));
    }

    #[test]
    fn test_geometry_behind_near_plane_is_clipped() {
        let mut canvas = SoftwareCanvas::new(4, 4);
        canvas.begin_frame(Vec4::ZERO);
        canvas.draw_triangles(&quad(-1.0, -1.0, 1.0, 1.0, -2.0, Vec4::ONE), DepthMode::Write);
        assert_eq!(covered(&canvas, Vec4::ONE), 0);
    }

    #[test]
    fn test_snapshot_is_top_row_first() {
        let mut canvas = SoftwareCanvas::new(2, 2);
        canvas.begin_frame(Vec4::new(0.0, 0.0, 0.0, 1.0));
        // Lower half only.
        canvas.draw_triangles(&quad(-1.0, -1.0, 1.0, 0.0, 0.0, Vec4::ONE), DepthMode::Always);
        let img = canvas.snapshot().unwrap();
        assert_eq!(img.get_pixel(0, 1).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_textured_quad_samples_image_orientation() {
        let mut tex = RgbaImage::new(1, 2);
        tex.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        tex.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        let v = |x: f32, y: f32, u: f32, t: f32| {
            TexVertex::new(Vec4::new(x, y, 0.0, 1.0), Vec2::new(u, t), Vec4::ONE)
        };
        let verts = [
            v(-1.0, -1.0, 0.0, 1.0),
            v(1.0, -1.0, 1.0, 1.0),
            v(1.0, 1.0, 1.0, 0.0),
            v(-1.0, -1.0, 0.0, 1.0),
            v(1.0, 1.0, 1.0, 0.0),
            v(-1.0, 1.0, 0.0, 0.0),
        ];
        let mut canvas = SoftwareCanvas::new(4, 4);
        canvas.begin_frame(Vec4::ZERO);
        canvas.draw_textured(&tex, &verts, DepthMode::Always).unwrap();
        let img = canvas.snapshot().unwrap();
        assert_eq!(img.get_pixel(1, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 3).0, [0, 0, 255, 255]);
        assert!(canvas.draw_textured(&RgbaImage::new(0, 0), &verts, DepthMode::Always).is_err());
    }

    #[test]
    fn test_read_depth_needs_a_frame() {
        let mut canvas = SoftwareCanvas::new(2, 2);
        assert!(canvas.read_depth(0, 0).is_none());
        canvas.begin_frame(Vec4::ZERO);
        assert_eq!(canvas.read_depth(0, 0), Some(1.0));
        assert!(canvas.read_depth(5, 0).is_none());
    }
}
