//! Indexed triangle meshes with smooth vertex normals.

use glam::{Vec3, Vec4};
use meteoplot_core::{Extent3D, Graphic, GraphicKind, Shape};

use super::{GraphicRenderer, RenderState};
use crate::error::RenderResult;
use crate::painter::Painter;

#[derive(Default)]
pub struct MeshRenderer {
    /// Triangle list: position, color, normal.
    vertices: Vec<(Vec3, Vec4, Vec3)>,
    edges: Vec<((Vec3, Vec4), (Vec3, Vec4))>,
    edge_width: f32,
    lit: bool,
    extent: Option<Extent3D>,
}

/// Area-weighted vertex normals.
fn vertex_normals(positions: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in triangles {
        let [a, b, c] = tri.map(|i| i as usize);
        // Unnormalized cross product weights by area.
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    normals.iter().map(|n| n.normalize_or_zero()).collect()
}

impl GraphicRenderer for MeshRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Mesh
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.vertices.clear();
        self.edges.clear();
        self.lit = graphic.using_light;
        self.extent = graphic.extent();
        for (shape, style) in graphic.leaves() {
            let Shape::Mesh(mesh) = shape else { continue };
            mesh.validate()?;
            let style = style.polygon();
            let normals = vertex_normals(&mesh.vertices, &mesh.triangles);
            let color = |i: usize| {
                mesh.colors
                    .as_ref()
                    .and_then(|c| c.get(i))
                    .copied()
                    .unwrap_or(style.fill_color)
            };
            for tri in &mesh.triangles {
                for &i in tri {
                    let i = i as usize;
                    if style.draw_fill {
                        self.vertices.push((mesh.vertices[i], color(i), normals[i]));
                    }
                }
                if style.draw_outline {
                    for k in 0..3 {
                        let (a, b) = (tri[k] as usize, tri[(k + 1) % 3] as usize);
                        self.edges.push((
                            (mesh.vertices[a], style.outline_color),
                            (mesh.vertices[b], style.outline_color),
                        ));
                    }
                }
            }
            self.edge_width = style.outline_width;
        }
        Ok(())
    }

    fn draw(&mut self, painter: &mut Painter<'_>, state: &mut RenderState<'_>) -> RenderResult<()> {
        let lit = self.lit && state.lighting.enabled;
        let tris: Vec<(Vec3, Vec4)> = self
            .vertices
            .iter()
            .map(|&(p, c, n)| (p, if lit { state.shade(c, n, p) } else { c }))
            .collect();
        if !tris.is_empty() {
            painter.triangles(&tris);
        }
        if !self.edges.is_empty() {
            painter.segments(&self.edges, self.edge_width);
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
    use meteoplot_core::{Lighting, MeshShape, PolygonStyle, Style};

    fn quad_mesh() -> MeshShape {
        MeshShape::new(
            vec![
                Vec3::new(-0.5, -0.5, 0.0),
                Vec3::new(0.5, -0.5, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
                Vec3::new(-0.5, 0.5, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_vertex_normals_of_flat_quad() {
        let mesh = quad_mesh();
        for n in vertex_normals(&mesh.vertices, &mesh.triangles) {
            assert!((n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_mesh_fill() {
        let g = Graphic::leaf(Shape::Mesh(quad_mesh()), Style::Polygon(PolygonStyle::default()));
        let mut canvas = render_one(&g, 40);
        assert_eq!(painted(&mut canvas), 100);
    }

    #[test]
    fn test_invalid_mesh_fails_rebuild() {
        let bad = MeshShape::new(vec![Vec3::ZERO], vec![[0, 1, 2]]);
        let g = Graphic::leaf(Shape::Mesh(bad), Style::Intrinsic);
        let camera = flat_camera(40);
        let lighting = Lighting::default();
        let mut text = text_context();
        let state = state(&camera, &lighting, &mut text);
        assert!(MeshRenderer::default().rebuild(&g, &state).is_err());
    }
}
