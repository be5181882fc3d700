//! The drawing context a plot renders into.
//!
//! A canvas receives triangles already transformed to clip space. Two
//! implementations exist: [`crate::raster::SoftwareCanvas`] rasterizes on the
//! CPU and [`crate::gpu::GpuCanvas`] records wgpu draws into an offscreen
//! target.

use image::RgbaImage;

use crate::error::RenderResult;

/// Depth test and write behavior of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthMode {
    /// Test with less-or-equal and write depth.
    #[default]
    Write,
    /// Test without writing, for translucent geometry.
    TestOnly,
    /// Always pass and never write. Used for axes and overlays.
    Always,
}

impl DepthMode {
    #[must_use]
    pub fn tests(self) -> bool {
        !matches!(self, DepthMode::Always)
    }

    #[must_use]
    pub fn writes(self) -> bool {
        matches!(self, DepthMode::Write)
    }
}

/// A colored vertex in homogeneous clip space.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

impl ColorVertex {
    #[must_use]
    pub fn new(position: glam::Vec4, color: glam::Vec4) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }
}

/// A textured vertex in homogeneous clip space.
///
/// `uv` uses `v = 0` at the top image row and repeats outside `[0, 1]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TexVertex {
    pub position: [f32; 4],
    pub uv: [f32; 2],
    pub _padding: [f32; 2],
    pub tint: [f32; 4],
}

impl TexVertex {
    #[must_use]
    pub fn new(position: glam::Vec4, uv: glam::Vec2, tint: glam::Vec4) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
            _padding: [0.0; 2],
            tint: tint.to_array(),
        }
    }
}

/// A render target.
///
/// Triangles are given as consecutive vertex triples.
pub trait Canvas {
    /// Target size in pixels.
    fn size(&self) -> (u32, u32);

    /// Resizes the target; contents are undefined until the next frame.
    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()>;

    /// Starts a frame cleared to `background` with depth at the far plane.
    fn begin_frame(&mut self, background: glam::Vec4);

    fn draw_triangles(&mut self, vertices: &[ColorVertex], depth: DepthMode);

    /// Draws triangles sampling `texture`.
    ///
    /// # Errors
    /// Returns [`crate::RenderError::Texture`] when the texture cannot be used.
    fn draw_textured(
        &mut self,
        texture: &RgbaImage,
        vertices: &[TexVertex],
        depth: DepthMode,
    ) -> RenderResult<()>;

    /// Depth at a pixel, origin bottom-left, `None` when unavailable.
    fn read_depth(&self, x: u32, y: u32) -> Option<f32>;

    /// Finishes the frame, submitting any recorded work.
    fn end_frame(&mut self) -> RenderResult<()>;

    /// The last finished frame, top row first.
    fn snapshot(&mut self) -> RenderResult<RgbaImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_mode_flags() {
        assert!(DepthMode::Write.tests() && DepthMode::Write.writes());
        assert!(DepthMode::TestOnly.tests() && !DepthMode::TestOnly.writes());
        assert!(!DepthMode::Always.tests() && !DepthMode::Always.writes());
    }

    #[test]
    fn test_vertex_layouts() {
        assert_eq!(std::mem::size_of::<ColorVertex>(), 32);
        assert_eq!(std::mem::size_of::<TexVertex>(), 48);
        let v = TexVertex::new(glam::Vec4::ONE, glam::Vec2::new(0.5, 1.0), glam::Vec4::ONE);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 48);
    }
}
