//! Geometric shapes carried by leaf graphics.

use std::sync::{Arc, OnceLock};

use glam::{Vec2, Vec3, Vec4};
use image::RgbaImage;

use crate::color_map::ColorMap;
use crate::error::{MeteoPlotError, Result};
use crate::extent::Extent3D;
use crate::legend::Normalize;
use crate::tessellation::{self, TessError, TessVertex, Tessellation};
use crate::text::{ChartText, HAlign, VAlign};

/// Discriminant of [`Shape`], used for renderer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Point,
    Polyline,
    Polygon,
    Mesh,
    Particles,
    Volume,
    Image,
    Texture,
    Text,
    Cube,
    Cylinder,
    Pipe,
}

/// Geometry of one leaf graphic.
#[derive(Debug, Clone)]
pub enum Shape {
    Point(PointShape),
    Polyline(PolylineShape),
    Polygon(PolygonShape),
    Mesh(MeshShape),
    Particles(ParticleSet),
    Volume(VolumeShape),
    Image(ImageShape),
    Texture(TextureShape),
    Text(TextShape),
    Cube(CubeShape),
    Cylinder(CylinderShape),
    Pipe(PipeShape),
}

impl Shape {
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Point(_) => ShapeKind::Point,
            Shape::Polyline(_) => ShapeKind::Polyline,
            Shape::Polygon(_) => ShapeKind::Polygon,
            Shape::Mesh(_) => ShapeKind::Mesh,
            Shape::Particles(_) => ShapeKind::Particles,
            Shape::Volume(_) => ShapeKind::Volume,
            Shape::Image(_) => ShapeKind::Image,
            Shape::Texture(_) => ShapeKind::Texture,
            Shape::Text(_) => ShapeKind::Text,
            Shape::Cube(_) => ShapeKind::Cube,
            Shape::Cylinder(_) => ShapeKind::Cylinder,
            Shape::Pipe(_) => ShapeKind::Pipe,
        }
    }

    /// Data-space bounds, `None` for shapes without points.
    #[must_use]
    pub fn extent(&self) -> Option<Extent3D> {
        match self {
            Shape::Point(s) => Extent3D::from_points(&s.points),
            Shape::Polyline(s) => Extent3D::from_points(&s.points),
            Shape::Polygon(s) => Extent3D::from_points(s.outer()),
            Shape::Mesh(s) => Extent3D::from_points(&s.vertices),
            Shape::Particles(s) => Extent3D::from_points(&s.positions),
            Shape::Volume(s) => Some(s.extent),
            Shape::Image(s) => Extent3D::from_points(&s.corners),
            Shape::Texture(s) => Extent3D::from_points(&s.corners),
            Shape::Text(s) => Extent3D::from_points(&[s.position]),
            Shape::Cube(s) => Extent3D::from_points(&[s.min, s.max]),
            Shape::Cylinder(s) => Extent3D::from_points(&[s.base, s.top()]),
            Shape::Pipe(s) => Extent3D::from_points(&s.points),
        }
    }
}

/// A set of point markers, optionally colored per point.
#[derive(Debug, Clone, Default)]
pub struct PointShape {
    pub points: Vec<Vec3>,
    pub colors: Option<Vec<Vec4>>,
}

impl PointShape {
    #[must_use]
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points, colors: None }
    }
}

/// A connected line, optionally colored per vertex.
#[derive(Debug, Clone, Default)]
pub struct PolylineShape {
    pub points: Vec<Vec3>,
    pub colors: Option<Vec<Vec4>>,
}

impl PolylineShape {
    #[must_use]
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points, colors: None }
    }
}

/// A polygon with an outer ring and optional holes.
///
/// The tessellation is computed on first use and kept until the geometry
/// changes.
#[derive(Debug, Clone, Default)]
pub struct PolygonShape {
    outer: Vec<Vec3>,
    holes: Vec<Vec<Vec3>>,
    colors: Option<Vec<Vec4>>,
    tessellation: OnceLock<Arc<Tessellation>>,
}

impl PolygonShape {
    #[must_use]
    pub fn new(outer: Vec<Vec3>) -> Self {
        Self {
            outer,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_holes(outer: Vec<Vec3>, holes: Vec<Vec<Vec3>>) -> Self {
        Self {
            outer,
            holes,
            ..Self::default()
        }
    }

    /// Per-vertex colors of the outer ring.
    ///
    /// # Errors
    /// Returns [`MeteoPlotError::SizeMismatch`] when the color count differs
    /// from the outer ring's vertex count.
    pub fn with_vertex_colors(mut self, colors: Vec<Vec4>) -> Result<Self> {
        if colors.len() != self.outer.len() {
            return Err(MeteoPlotError::SizeMismatch {
                expected: self.outer.len(),
                actual: colors.len(),
            });
        }
        self.colors = Some(colors);
        Ok(self)
    }

    #[must_use]
    pub fn outer(&self) -> &[Vec3] {
        &self.outer
    }

    #[must_use]
    pub fn holes(&self) -> &[Vec<Vec3>] {
        &self.holes
    }

    #[must_use]
    pub fn vertex_colors(&self) -> Option<&[Vec4]> {
        self.colors.as_deref()
    }

    pub fn set_outer(&mut self, outer: Vec<Vec3>) {
        self.outer = outer;
        self.colors = None;
        self.tessellation = OnceLock::new();
    }

    pub fn set_holes(&mut self, holes: Vec<Vec<Vec3>>) {
        self.holes = holes;
        self.tessellation = OnceLock::new();
    }

    /// Distinct vertex count of the outer ring, ignoring a closing duplicate.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match (self.outer.first(), self.outer.last()) {
            (Some(a), Some(b)) if self.outer.len() > 1 && a == b => self.outer.len() - 1,
            _ => self.outer.len(),
        }
    }

    /// Outer ring as tessellator vertices carrying `fill` or the vertex colors.
    #[must_use]
    pub fn outer_vertices(&self, fill: Vec4) -> Vec<TessVertex> {
        match &self.colors {
            Some(colors) => self
                .outer
                .iter()
                .zip(colors)
                .map(|(p, c)| TessVertex::new(*p, *c))
                .collect(),
            None => self.outer.iter().map(|p| TessVertex::new(*p, fill)).collect(),
        }
    }

    /// Whether the fill can use the direct fan path.
    #[must_use]
    pub fn is_fast_path(&self) -> bool {
        tessellation::is_fast_path(&self.outer_vertices(Vec4::ONE), self.holes.len())
    }

    /// The cached tessellation, if one has been computed.
    #[must_use]
    pub fn cached_tessellation(&self) -> Option<Arc<Tessellation>> {
        self.tessellation.get().cloned()
    }

    /// Tessellates with `fill` as the vertex attribute, caching the result.
    ///
    /// # Errors
    /// Propagates [`TessError`] for degenerate or self-overlapping rings.
    pub fn tessellate(&self, fill: Vec4) -> std::result::Result<Arc<Tessellation>, TessError> {
        if let Some(cached) = self.tessellation.get() {
            return Ok(Arc::clone(cached));
        }
        let outer = self.outer_vertices(fill);
        let hole_vertex = |p: Vec3| {
            if self.colors.is_some() {
                blend_from_ring(&outer, p)
            } else {
                TessVertex::new(p, fill)
            }
        };
        let holes: Vec<Vec<TessVertex>> = self
            .holes
            .iter()
            .map(|h| h.iter().map(|p| hole_vertex(*p)).collect())
            .collect();
        let tess = Arc::new(tessellation::tessellate(&outer, &holes)?);
        Ok(Arc::clone(self.tessellation.get_or_init(|| tess)))
    }
}

/// Vertex at `p` colored by inverse squared distance to the ring's vertices.
fn blend_from_ring(ring: &[TessVertex], p: Vec3) -> TessVertex {
    let weights: Vec<(TessVertex, f32)> = ring
        .iter()
        .map(|v| (*v, 1.0 / v.position.distance_squared(p).max(1e-12)))
        .collect();
    tessellation::combine(p, &weights)
}

/// An axis-aligned box, such as a 3D bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeShape {
    pub min: Vec3,
    pub max: Vec3,
}

impl CubeShape {
    /// A box spanning two opposite corners in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Corner `i` takes max x, y, z where bits 0, 1, 2 of `i` are set.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Outward normal and corner indices of each face, counter-clockwise
    /// seen from outside.
    #[must_use]
    pub fn faces() -> [(Vec3, [usize; 4]); 6] {
        [
            (Vec3::NEG_X, [0, 4, 6, 2]),
            (Vec3::X, [1, 3, 7, 5]),
            (Vec3::NEG_Y, [0, 1, 5, 4]),
            (Vec3::Y, [2, 6, 7, 3]),
            (Vec3::NEG_Z, [0, 2, 3, 1]),
            (Vec3::Z, [4, 5, 7, 6]),
        ]
    }

    /// Corner index pairs of the twelve edges.
    #[must_use]
    pub fn edges() -> [(usize, usize); 12] {
        [
            (0, 1), (2, 3), (4, 5), (6, 7),
            (0, 2), (1, 3), (4, 6), (5, 7),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ]
    }
}

/// A vertical cylinder standing on `base`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderShape {
    pub base: Vec3,
    /// Height along z, in data units.
    pub height: f32,
    /// Radius in drawing-cube units, so the section stays round under any
    /// axis scaling.
    pub radius: f32,
}

impl CylinderShape {
    #[must_use]
    pub fn new(base: Vec3, height: f32, radius: f32) -> Self {
        Self { base, height, radius }
    }

    #[must_use]
    pub fn top(&self) -> Vec3 {
        self.base + Vec3::Z * self.height
    }
}

/// A tube along a polyline, such as a streamline.
#[derive(Debug, Clone, Default)]
pub struct PipeShape {
    pub points: Vec<Vec3>,
    /// Radius in drawing-cube units.
    pub radius: f32,
    /// Color per point, blended along each segment.
    pub colors: Option<Vec<Vec4>>,
}

impl PipeShape {
    #[must_use]
    pub fn new(points: Vec<Vec3>, radius: f32) -> Self {
        Self {
            points,
            radius,
            colors: None,
        }
    }
}

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshShape {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub colors: Option<Vec<Vec4>>,
}

impl MeshShape {
    #[must_use]
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            colors: None,
        }
    }

    /// Checks that every index refers to a vertex and colors match vertices.
    ///
    /// # Errors
    /// Returns [`MeteoPlotError::SizeMismatch`] or
    /// [`MeteoPlotError::DegenerateGeometry`] for inconsistent buffers.
    pub fn validate(&self) -> Result<()> {
        if let Some(colors) = &self.colors {
            if colors.len() != self.vertices.len() {
                return Err(MeteoPlotError::SizeMismatch {
                    expected: self.vertices.len(),
                    actual: colors.len(),
                });
            }
        }
        let n = self.vertices.len();
        if let Some(bad) = self.triangles.iter().flatten().find(|i| **i as usize >= n) {
            return Err(MeteoPlotError::DegenerateGeometry(format!(
                "mesh index {bad} out of range for {n} vertices"
            )));
        }
        Ok(())
    }
}

/// A particle cloud with per-particle colors.
#[derive(Debug, Clone, Default)]
pub struct ParticleSet {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec4>,
    /// Particle size in points.
    pub size: f32,
}

/// A scalar volume on a regular grid, colored through a color map.
#[derive(Debug, Clone)]
pub struct VolumeShape {
    /// Grid size along x, y, z.
    pub dims: [usize; 3],
    /// Values in x-fastest order.
    pub data: Vec<f32>,
    pub extent: Extent3D,
    pub color_map: ColorMap,
    pub normalize: Normalize,
    /// Alpha multiplier applied to every sample.
    pub opacity: f32,
}

impl VolumeShape {
    /// Checks that the data length matches the grid size.
    ///
    /// # Errors
    /// Returns [`MeteoPlotError::SizeMismatch`] when it does not.
    pub fn validate(&self) -> Result<()> {
        let expected = self.dims.iter().product::<usize>();
        if expected == 0 || self.data.len() != expected {
            return Err(MeteoPlotError::SizeMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Sample at integer grid coordinates.
    #[must_use]
    pub fn value(&self, i: usize, j: usize, k: usize) -> f32 {
        self.data[i + self.dims[0] * (j + self.dims[1] * k)]
    }
}

/// A raster image stretched over a quad.
///
/// Corners are lower-left, lower-right, upper-right, upper-left.
#[derive(Debug, Clone)]
pub struct ImageShape {
    pub image: Arc<RgbaImage>,
    pub corners: [Vec3; 4],
}

/// A pre-rasterized texture tiled over a quad.
#[derive(Debug, Clone)]
pub struct TextureShape {
    pub image: Arc<RgbaImage>,
    pub corners: [Vec3; 4],
    /// Tile count along the quad's two edges.
    pub repeat: Vec2,
}

/// Text anchored at a data point.
#[derive(Debug, Clone)]
pub struct TextShape {
    pub text: ChartText,
    pub position: Vec3,
    pub h_align: HAlign,
    pub v_align: VAlign,
    /// Rotation in degrees, counter-clockwise on screen.
    pub angle: f32,
    /// Draw as a camera-facing quad in data space instead of screen space.
    pub draw_3d: bool,
    /// Pixel shift applied after placement.
    pub shift: Vec2,
}

impl TextShape {
    #[must_use]
    pub fn new(text: ChartText, position: Vec3) -> Self {
        Self {
            text,
            position,
            h_align: HAlign::Left,
            v_align: VAlign::Bottom,
            angle: 0.0,
            draw_3d: false,
            shift: Vec2::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_hole_vertices_take_ring_colors() {
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let outer = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        let hole = vec![
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(0.5, 1.5, 0.0),
            Vec3::new(1.5, 1.5, 0.0),
            Vec3::new(1.5, 0.5, 0.0),
        ];
        let poly = PolygonShape::with_holes(outer, vec![hole])
            .with_vertex_colors(vec![red; 4])
            .unwrap();
        let tess = poly.tessellate(Vec4::ONE).unwrap();
        assert!(tess.vertices.iter().all(|v| (v.attrs - red).abs().max_element() < 1e-5));
    }

    #[test]
    fn test_hole_vertex_blend_favors_nearest_corner() {
        let colors = vec![
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, 1.0, 1.0),
            Vec4::new(1.0, 1.0, 0.0, 1.0),
        ];
        let poly = PolygonShape::new(square()).with_vertex_colors(colors).unwrap();
        let outer = poly.outer_vertices(Vec4::ONE);
        let v = blend_from_ring(&outer, Vec3::new(0.1, 0.1, 0.0));
        assert!(v.attrs.x > 0.8 && v.attrs.y < 0.2 && v.attrs.z < 0.2, "got {}", v.attrs);
    }

    #[test]
    fn test_polygon_tessellation_is_cached_until_changed() {
        let mut poly = PolygonShape::new(square());
        assert!(poly.cached_tessellation().is_none());
        let a = poly.tessellate(Vec4::ONE).unwrap();
        let b = poly.tessellate(Vec4::ONE).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        poly.set_outer(vec![Vec3::ZERO, Vec3::X * 2.0, Vec3::Y * 2.0]);
        assert!(poly.cached_tessellation().is_none());
        let c = poly.tessellate(Vec4::ONE).unwrap();
        assert!((c.area() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_vertex_count_ignores_closing_point() {
        let mut ring = square();
        ring.push(ring[0]);
        let poly = PolygonShape::new(ring);
        assert_eq!(poly.vertex_count(), 4);
        assert!(poly.is_fast_path());
    }

    #[test]
    fn test_vertex_colors_must_match() {
        assert!(PolygonShape::new(square()).with_vertex_colors(vec![Vec4::ONE]).is_err());
        let poly = PolygonShape::new(square()).with_vertex_colors(vec![Vec4::ONE; 4]).unwrap();
        assert_eq!(poly.vertex_colors().map(<[Vec4]>::len), Some(4));
    }

    #[test]
    fn test_mesh_validation() {
        let mut mesh = MeshShape::new(square(), vec![[0, 1, 2], [0, 2, 3]]);
        assert!(mesh.validate().is_ok());
        mesh.triangles.push([0, 1, 9]);
        assert!(matches!(mesh.validate(), Err(MeteoPlotError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_volume_validation() {
        let volume = VolumeShape {
            dims: [2, 2, 2],
            data: vec![0.0; 7],
            extent: Extent3D::default(),
            color_map: ColorMap::from_rgb("g", &[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]),
            normalize: Normalize::linear(0.0, 1.0),
            opacity: 1.0,
        };
        assert!(matches!(
            volume.validate(),
            Err(MeteoPlotError::SizeMismatch { expected: 8, actual: 7 })
        ));
    }
}
