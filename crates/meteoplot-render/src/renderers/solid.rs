//! Cubes, cylinders and pipes.
//!
//! Cubes are plain data-space boxes. Cylinder and pipe radii are given in
//! drawing-cube units, so their cross sections are built in the cube and
//! mapped back to data space every frame with the current transform.

use glam::{Vec3, Vec4};
use meteoplot_core::{CubeShape, Extent3D, Graphic, GraphicKind, MeteoPlotError, Shape, Transform};

use super::{GraphicRenderer, RenderState};
use crate::error::RenderResult;
use crate::painter::Painter;

/// Sides of every tube cross section.
const TUBE_SIDES: usize = 16;

type Edge = ((Vec3, Vec4), (Vec3, Vec4));

enum Solid {
    Cube {
        shape: CubeShape,
        fill: Option<Vec4>,
    },
    Tube {
        points: Vec<Vec3>,
        colors: Vec<Vec4>,
        radius: f32,
        capped: bool,
    },
}

#[derive(Default)]
pub struct SolidRenderer {
    solids: Vec<Solid>,
    edges: Vec<Edge>,
    edge_width: f32,
    lit: bool,
    extent: Option<Extent3D>,
}

impl GraphicRenderer for SolidRenderer {
    fn kind(&self) -> GraphicKind {
        GraphicKind::Solids
    }

    fn rebuild(&mut self, graphic: &Graphic, _state: &RenderState<'_>) -> RenderResult<()> {
        self.solids.clear();
        self.edges.clear();
        self.lit = graphic.using_light;
        self.extent = graphic.extent();
        for (shape, style) in graphic.leaves() {
            match shape {
                Shape::Cube(cube) => {
                    let style = style.polygon();
                    if style.draw_outline {
                        let corners = cube.corners();
                        self.edges.extend(CubeShape::edges().iter().map(|&(a, b)| {
                            ((corners[a], style.outline_color), (corners[b], style.outline_color))
                        }));
                        self.edge_width = style.outline_width;
                    }
                    self.solids.push(Solid::Cube {
                        shape: *cube,
                        fill: style.draw_fill.then_some(style.fill_color),
                    });
                }
                Shape::Cylinder(cylinder) => {
                    check_radius(cylinder.radius)?;
                    let color = style.polygon().fill_color;
                    self.solids.push(Solid::Tube {
                        points: vec![cylinder.base, cylinder.top()],
                        colors: vec![color; 2],
                        radius: cylinder.radius,
                        capped: true,
                    });
                }
                Shape::Pipe(pipe) => {
                    check_radius(pipe.radius)?;
                    let color = style.line().color;
                    let colors = match &pipe.colors {
                        Some(c) if c.len() == pipe.points.len() => c.clone(),
                        Some(c) => {
                            return Err(MeteoPlotError::SizeMismatch {
                                expected: pipe.points.len(),
                                actual: c.len(),
                            }
                            .into())
                        }
                        None => vec![color; pipe.points.len()],
                    };
                    self.solids.push(Solid::Tube {
                        points: pipe.points.clone(),
                        colors,
                        radius: pipe.radius,
                        capped: false,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn draw(&mut self, painter: &mut Painter<'_>, state: &mut RenderState<'_>) -> RenderResult<()> {
        let mut mesh = SolidMesh::default();
        for solid in &self.solids {
            match solid {
                Solid::Cube { shape, fill: Some(color) } => mesh.cube(shape, *color),
                Solid::Cube { fill: None, .. } => {}
                Solid::Tube {
                    points,
                    colors,
                    radius,
                    capped,
                } => mesh.tube(&state.transform, points, colors, *radius, *capped),
            }
        }
        let lit = self.lit && state.lighting.enabled;
        let tris: Vec<(Vec3, Vec4)> = mesh
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

fn check_radius(radius: f32) -> RenderResult<()> {
    if radius > 0.0 && radius.is_finite() {
        Ok(())
    } else {
        Err(MeteoPlotError::DegenerateGeometry(format!("tube radius {radius}")).into())
    }
}

/// Triangle list in data space: position, color, data-space normal.
#[derive(Default)]
struct SolidMesh {
    vertices: Vec<(Vec3, Vec4, Vec3)>,
}

impl SolidMesh {
    fn cube(&mut self, cube: &CubeShape, color: Vec4) {
        let corners = cube.corners();
        for (normal, [a, b, c, d]) in CubeShape::faces() {
            for i in [a, b, c, a, c, d] {
                self.vertices.push((corners[i], color, normal));
            }
        }
    }

    /// Tube of cube-space `radius` around `points`, with end caps when
    /// `capped`.
    fn tube(&mut self, transform: &Transform, points: &[Vec3], colors: &[Vec4], radius: f32, capped: bool) {
        let centers: Vec<Vec3> = points
            .iter()
            .map(|p| transform.transform_point(p.as_dvec3()).as_vec3())
            .collect();
        let rings = tube_rings(&centers, radius);
        if rings.len() < 2 {
            return;
        }
        let scale = transform.scale();
        let to_data = |p: Vec3| transform.inverse_point(p.as_dvec3()).as_vec3();
        // Normals transform with the inverse transpose of the cube mapping.
        let normal_to_data = |n: Vec3| (n.as_dvec3() * scale).as_vec3().normalize_or_zero();

        for (i, pair) in rings.windows(2).enumerate() {
            let (r0, r1) = (&pair[0], &pair[1]);
            let (c0, c1) = (colors[i], colors[i + 1]);
            for j in 0..TUBE_SIDES {
                let k = (j + 1) % TUBE_SIDES;
                let quad = [(r0, j, c0), (r1, j, c1), (r1, k, c1), (r0, j, c0), (r1, k, c1), (r0, k, c0)];
                for (ring, side, color) in quad {
                    let (p, n) = ring[side];
                    self.vertices.push((to_data(p), color, normal_to_data(n)));
                }
            }
        }
        if capped {
            let ends = [
                (centers[0], &rings[0], colors[0], -1.0),
                (centers[centers.len() - 1], &rings[rings.len() - 1], colors[colors.len() - 1], 1.0),
            ];
            for (center, ring, color, sign) in ends {
                let axis = (centers[centers.len() - 1] - centers[0]).normalize_or_zero() * sign;
                let n = normal_to_data(axis);
                for j in 0..TUBE_SIDES {
                    let k = (j + 1) % TUBE_SIDES;
                    for p in [center, ring[j].0, ring[k].0] {
                        self.vertices.push((to_data(p), color, n));
                    }
                }
            }
        }
    }
}

/// Cross-section rings around a cube-space polyline as (position, normal)
/// pairs. The ring frame is carried along the line by parallel transport so
/// consecutive rings do not twist. Empty when any tangent vanishes.
fn tube_rings(centers: &[Vec3], radius: f32) -> Vec<Vec<(Vec3, Vec3)>> {
    let n = centers.len();
    if n < 2 {
        return Vec::new();
    }
    let mut rings = Vec::with_capacity(n);
    let mut u = Vec3::ZERO;
    for i in 0..n {
        let tangent = (centers[(i + 1).min(n - 1)] - centers[i.saturating_sub(1)]).normalize_or_zero();
        if tangent == Vec3::ZERO {
            return Vec::new();
        }
        u = (u - tangent * u.dot(tangent)).normalize_or_zero();
        if u == Vec3::ZERO {
            u = tangent.any_orthonormal_vector();
        }
        let v = tangent.cross(u);
        #[allow(clippy::cast_precision_loss)]
        let ring = (0..TUBE_SIDES)
            .map(|j| {
                let theta = j as f32 / TUBE_SIDES as f32 * std::f32::consts::TAU;
                let dir = u * theta.cos() + v * theta.sin();
                (centers[i] + dir * radius, dir)
            })
            .collect();
        rings.push(ring);
    }
    rings
}
