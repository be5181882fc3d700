//! Scene graph nodes and their styles.
//!
//! A [`Graphic`] is either a leaf (one [`Shape`] plus one [`Style`]) or a
//! collection of child graphics. [`Graphic::kind`] classifies a node for
//! renderer selection.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::extent::Extent3D;
use crate::shape::{
    CubeShape, CylinderShape, PipeShape, PointShape, PolygonShape, PolylineShape, Shape, ShapeKind,
};

/// Marker drawn for each point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointMarker {
    #[default]
    Square,
    Circle,
    /// A shaded disc that always faces the camera.
    Sphere,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointStyle {
    pub color: Vec4,
    /// Marker size in points.
    pub size: f32,
    pub marker: PointMarker,
    pub draw_outline: bool,
    pub outline_color: Vec4,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            size: 6.0,
            marker: PointMarker::Square,
            draw_outline: false,
            outline_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Vec4,
    /// Width in points.
    pub width: f32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            width: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonStyle {
    pub fill_color: Vec4,
    pub outline_color: Vec4,
    pub outline_width: f32,
    pub draw_fill: bool,
    pub draw_outline: bool,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            fill_color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            outline_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            outline_width: 1.0,
            draw_fill: true,
            draw_outline: false,
        }
    }
}

/// Legend break attached to a leaf graphic.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Style {
    Point(PointStyle),
    Line(LineStyle),
    Polygon(PolygonStyle),
    /// Shapes that carry their own colors (meshes, volumes, images, text).
    #[default]
    Intrinsic,
}

impl Style {
    /// Point style, or the default when this is another kind of style.
    #[must_use]
    pub fn point(&self) -> PointStyle {
        match self {
            Style::Point(s) => s.clone(),
            _ => PointStyle::default(),
        }
    }

    #[must_use]
    pub fn line(&self) -> LineStyle {
        match self {
            Style::Line(s) => s.clone(),
            _ => LineStyle::default(),
        }
    }

    #[must_use]
    pub fn polygon(&self) -> PolygonStyle {
        match self {
            Style::Polygon(s) => s.clone(),
            _ => PolygonStyle::default(),
        }
    }
}

/// Renderer family a graphic is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicKind {
    /// Nothing to draw.
    Empty,
    Points,
    Lines,
    Polygons,
    /// Collection of hole-free quads drawn in one batch.
    QuadBatch,
    /// Collection of hole-free triangles drawn in one batch.
    TriangleBatch,
    Mesh,
    Particles,
    Volume,
    Image,
    Texture,
    Text,
    /// Cubes, cylinders and pipes.
    Solids,
    /// Mixed collection drawn child by child.
    Composite,
}

/// Payload of a [`Graphic`].
#[derive(Debug, Clone)]
pub enum GraphicContent {
    Leaf { shape: Shape, style: Style },
    Collection(Vec<Graphic>),
}

/// A node in the scene graph.
#[derive(Debug, Clone)]
pub struct Graphic {
    pub content: GraphicContent,
    /// Apply scene lighting when drawing.
    pub using_light: bool,
    pub visible: bool,
}

impl Graphic {
    #[must_use]
    pub fn leaf(shape: Shape, style: Style) -> Self {
        Self {
            content: GraphicContent::Leaf { shape, style },
            using_light: false,
            visible: true,
        }
    }

    #[must_use]
    pub fn collection(children: Vec<Graphic>) -> Self {
        Self {
            content: GraphicContent::Collection(children),
            using_light: false,
            visible: true,
        }
    }

    /// Point markers.
    #[must_use]
    pub fn points(points: Vec<Vec3>, style: PointStyle) -> Self {
        Self::leaf(Shape::Point(PointShape::new(points)), Style::Point(style))
    }

    /// A polyline.
    #[must_use]
    pub fn polyline(points: Vec<Vec3>, style: LineStyle) -> Self {
        Self::leaf(Shape::Polyline(PolylineShape::new(points)), Style::Line(style))
    }

    /// A filled polygon.
    #[must_use]
    pub fn polygon(polygon: PolygonShape, style: PolygonStyle) -> Self {
        Self::leaf(Shape::Polygon(polygon), Style::Polygon(style))
    }

    /// An axis-aligned box between two corners.
    #[must_use]
    pub fn cube(a: Vec3, b: Vec3, style: PolygonStyle) -> Self {
        Self::leaf(Shape::Cube(CubeShape::new(a, b)), Style::Polygon(style))
    }

    /// A vertical cylinder; `radius` is in drawing-cube units.
    #[must_use]
    pub fn cylinder(base: Vec3, height: f32, radius: f32, style: PolygonStyle) -> Self {
        Self::leaf(
            Shape::Cylinder(CylinderShape::new(base, height, radius)),
            Style::Polygon(style),
        )
    }

    /// A tube along `points`; `radius` is in drawing-cube units.
    #[must_use]
    pub fn pipe(points: Vec<Vec3>, radius: f32, style: LineStyle) -> Self {
        Self::leaf(Shape::Pipe(PipeShape::new(points, radius)), Style::Line(style))
    }

    #[must_use]
    pub fn with_lighting(mut self, using_light: bool) -> Self {
        self.using_light = using_light;
        self
    }

    /// Shape and style of a leaf.
    #[must_use]
    pub fn as_leaf(&self) -> Option<(&Shape, &Style)> {
        match &self.content {
            GraphicContent::Leaf { shape, style } => Some((shape, style)),
            GraphicContent::Collection(_) => None,
        }
    }

    #[must_use]
    pub fn shape_mut(&mut self) -> Option<&mut Shape> {
        match &mut self.content {
            GraphicContent::Leaf { shape, .. } => Some(shape),
            GraphicContent::Collection(_) => None,
        }
    }

    /// Children of a collection; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Graphic] {
        match &self.content {
            GraphicContent::Collection(children) => children,
            GraphicContent::Leaf { .. } => &[],
        }
    }

    /// Leaf graphics of this subtree in draw order.
    #[must_use]
    pub fn leaves(&self) -> Vec<(&Shape, &Style)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<(&'a Shape, &'a Style)>) {
        match &self.content {
            GraphicContent::Leaf { shape, style } => out.push((shape, style)),
            GraphicContent::Collection(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Bounds of every shape in the subtree.
    #[must_use]
    pub fn extent(&self) -> Option<Extent3D> {
        match &self.content {
            GraphicContent::Leaf { shape, .. } => shape.extent(),
            GraphicContent::Collection(children) => children
                .iter()
                .filter_map(Graphic::extent)
                .reduce(|a, b| a.union(&b)),
        }
    }

    /// Classifies this graphic for renderer selection.
    #[must_use]
    pub fn kind(&self) -> GraphicKind {
        match &self.content {
            GraphicContent::Leaf { shape, .. } => leaf_kind(shape.kind()),
            GraphicContent::Collection(children) => collection_kind(children),
        }
    }
}

fn leaf_kind(kind: ShapeKind) -> GraphicKind {
    match kind {
        ShapeKind::Point => GraphicKind::Points,
        ShapeKind::Polyline => GraphicKind::Lines,
        ShapeKind::Polygon => GraphicKind::Polygons,
        ShapeKind::Mesh => GraphicKind::Mesh,
        ShapeKind::Particles => GraphicKind::Particles,
        ShapeKind::Volume => GraphicKind::Volume,
        ShapeKind::Image => GraphicKind::Image,
        ShapeKind::Texture => GraphicKind::Texture,
        ShapeKind::Text => GraphicKind::Text,
        ShapeKind::Cube | ShapeKind::Cylinder | ShapeKind::Pipe => GraphicKind::Solids,
    }
}

/// Distinct vertex count of a hole-free polygon leaf.
fn simple_polygon_size(graphic: &Graphic) -> Option<usize> {
    match graphic.as_leaf() {
        Some((Shape::Polygon(p), _)) if p.holes().is_empty() => Some(p.vertex_count()),
        _ => None,
    }
}

fn collection_kind(children: &[Graphic]) -> GraphicKind {
    let Some(first) = children.first() else {
        return GraphicKind::Empty;
    };
    if let Some(n @ (3 | 4)) = simple_polygon_size(first) {
        if children.iter().all(|c| simple_polygon_size(c) == Some(n)) {
            return if n == 4 {
                GraphicKind::QuadBatch
            } else {
                GraphicKind::TriangleBatch
            };
        }
    }
    let uniform = |kind: ShapeKind| {
        children
            .iter()
            .all(|c| c.as_leaf().is_some_and(|(s, _)| s.kind() == kind))
    };
    match first.as_leaf().map(|(s, _)| s.kind()) {
        Some(ShapeKind::Point) if uniform(ShapeKind::Point) => GraphicKind::Points,
        Some(ShapeKind::Polyline) if uniform(ShapeKind::Polyline) => GraphicKind::Lines,
        _ if children.iter().all(|c| c.kind() == GraphicKind::Solids) => GraphicKind::Solids,
        _ => GraphicKind::Composite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(x: f32) -> Graphic {
        Graphic::polygon(
            PolygonShape::new(vec![
                Vec3::new(x, 0.0, 0.0),
                Vec3::new(x + 1.0, 0.0, 0.0),
                Vec3::new(x + 1.0, 1.0, 0.0),
                Vec3::new(x, 1.0, 0.0),
            ]),
            PolygonStyle::default(),
        )
    }

    fn tri(x: f32) -> Graphic {
        Graphic::polygon(
            PolygonShape::new(vec![Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 0.0, 0.0), Vec3::new(x, 1.0, 0.0)]),
            PolygonStyle::default(),
        )
    }

    #[test]
    fn test_leaf_kinds() {
        assert_eq!(Graphic::points(vec![Vec3::ZERO], PointStyle::default()).kind(), GraphicKind::Points);
        assert_eq!(Graphic::polyline(vec![Vec3::ZERO, Vec3::X], LineStyle::default()).kind(), GraphicKind::Lines);
        assert_eq!(quad(0.0).kind(), GraphicKind::Polygons);
    }

    #[test]
    fn test_collection_batches() {
        assert_eq!(Graphic::collection(vec![]).kind(), GraphicKind::Empty);
        assert_eq!(Graphic::collection(vec![quad(0.0), quad(1.0)]).kind(), GraphicKind::QuadBatch);
        assert_eq!(Graphic::collection(vec![tri(0.0), tri(1.0)]).kind(), GraphicKind::TriangleBatch);
        assert_eq!(Graphic::collection(vec![quad(0.0), tri(1.0)]).kind(), GraphicKind::Composite);
    }

    #[test]
    fn test_collection_of_points_and_mixed() {
        let pts = Graphic::points(vec![Vec3::ZERO], PointStyle::default());
        let line = Graphic::polyline(vec![Vec3::ZERO, Vec3::X], LineStyle::default());
        assert_eq!(Graphic::collection(vec![pts.clone(), pts.clone()]).kind(), GraphicKind::Points);
        assert_eq!(Graphic::collection(vec![line.clone(), line.clone()]).kind(), GraphicKind::Lines);
        assert_eq!(Graphic::collection(vec![pts, line]).kind(), GraphicKind::Composite);
    }

    #[test]
    fn test_solids_share_one_kind() {
        let cube = Graphic::cube(Vec3::ZERO, Vec3::ONE, PolygonStyle::default());
        let cyl = Graphic::cylinder(Vec3::ZERO, 2.0, 0.1, PolygonStyle::default());
        let pipe = Graphic::pipe(vec![Vec3::ZERO, Vec3::X], 0.05, LineStyle::default());
        for g in [&cube, &cyl, &pipe] {
            assert_eq!(g.kind(), GraphicKind::Solids);
        }
        assert_eq!(Graphic::collection(vec![cube, cyl.clone(), pipe]).kind(), GraphicKind::Solids);
        let e = cyl.extent().unwrap();
        assert_eq!((e.min_z, e.max_z), (0.0, 2.0));
    }

    #[test]
    fn test_collection_extent_and_leaves() {
        let g = Graphic::collection(vec![quad(0.0), Graphic::collection(vec![quad(5.0)])]);
        let e = g.extent().unwrap();
        assert_eq!(e.min_x, 0.0);
        assert_eq!(e.max_x, 6.0);
        assert_eq!(g.leaves().len(), 2);
        assert!(Graphic::collection(vec![]).extent().is_none());
    }

    #[test]
    fn test_style_fallbacks() {
        let style = Style::Line(LineStyle { color: Vec4::ONE, width: 3.0 });
        assert_eq!(style.line().width, 3.0);
        assert_eq!(style.polygon(), PolygonStyle::default());
    }
}
