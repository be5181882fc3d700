//! Raster images and tiled textures on quads.

use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};
use image::RgbaImage;
use meteoplot_core::{Extent3D, Graphic, GraphicKind, Shape};

use super::{GraphicRenderer, RenderState};
use crate::error::RenderResult;
use crate::painter::Painter;

/// UVs of a quad tiled `repeat` times, image top row along the upper edge.
fn tiled_uvs(repeat: Vec2) -> [Vec2; 4] {
    [
        Vec2::new(0.0, repeat.y),
        Vec2::new(repeat.x, repeat.y),
        Vec2::new(repeat.x, 0.0),
        Vec2::new(0.0, 0.0),
    ]
}

struct Quad {
    image: Arc<RgbaImage>,
    corners: [Vec3; 4],
    uvs: [Vec2; 4],
}

fn draw_quads(quads: &[Quad], painter: &mut Painter<'_>) -> RenderResult<()> {
    for quad in quads {
        painter.textured_quad(&quad.image, quad.corners, quad.uvs, Vec4::ONE)?;
    }
    Ok(())
}

#[derive(Default)]
pub struct ImageRenderer {
    quads: Vec<Quad>,
    extent: Option<Extent3D>,
}

impl GraphicRenderer for ImageRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Image
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.extent = graphic.extent();
        self.quads = graphic
            .leaves()
            .into_iter()
            .filter_map(|(shape, _)| match shape {
                Shape::Image(img) => Some(Quad {
                    image: Arc::clone(&img.image),
                    corners: img.corners,
                    uvs: tiled_uvs(Vec2::ONE),
                }),
                _ => None,
            })
            .collect();
        Ok(())
    }

    fn draw(&mut self, painter: &mut Painter<'_>, _state: &mut RenderState<'_>) -> RenderResult<()> {
        draw_quads(&self.quads, painter)
    }

    fn extent(&self) -> Option<Extent3D> {
        self.extent
    }
}

#[derive(Default)]
pub struct TextureRenderer {
    quads: Vec<Quad>,
    extent: Option<Extent3D>,
}

impl GraphicRenderer for TextureRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Texture
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.extent = graphic.extent();
        self.quads = graphic
            .leaves()
            .into_iter()
            .filter_map(|(shape, _)| match shape {
                Shape::Texture(tex) => Some(Quad {
                    image: Arc::clone(&tex.image),
                    corners: tex.corners,
                    uvs: tiled_uvs(tex.repeat),
                }),
                _ => None,
            })
            .collect();
        Ok(())
    }

    fn draw(&mut self, painter: &mut Painter<'_>, _state: &mut RenderState<'_>) -> RenderResult<()> {
        draw_quads(&self.quads, painter)
    }

    fn extent(&self) -> Option<Extent3D> {
        self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::canvas::Canvas;
    use image::Rgba;
    use meteoplot_core::{ImageShape, Style, TextureShape};

    fn corners() -> [Vec3; 4] {
        [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ]
    }

    /// Top half red, bottom half blue.
    fn two_band() -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_fn(2, 2, |_, y| {
            if y == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        }))
    }

    #[test]
    fn test_image_top_row_on_upper_edge() {
        let shape = ImageShape {
            image: two_band(),
            corners: corners(),
        };
        let g = Graphic::leaf(Shape::Image(shape), Style::Intrinsic);
        let mut canvas = render_one(&g, 40);
        let snap = canvas.snapshot().unwrap();
        // Snapshot rows run top to bottom.
        assert_eq!(snap.get_pixel(20, 12).0, [255, 0, 0, 255]);
        assert_eq!(snap.get_pixel(20, 27).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_texture_repeats() {
        let shape = TextureShape {
            image: two_band(),
            corners: corners(),
            repeat: Vec2::new(1.0, 2.0),
        };
        let g = Graphic::leaf(Shape::Texture(shape), Style::Intrinsic);
        let mut canvas = render_one(&g, 40);
        let snap = canvas.snapshot().unwrap();
        // Four bands from the top: red, blue, red, blue.
        assert_eq!(snap.get_pixel(20, 11).0, [255, 0, 0, 255]);
        assert_eq!(snap.get_pixel(20, 16).0, [0, 0, 255, 255]);
        assert_eq!(snap.get_pixel(20, 21).0, [255, 0, 0, 255]);
        assert_eq!(snap.get_pixel(20, 26).0, [0, 0, 255, 255]);
    }
}
