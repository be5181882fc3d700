//! Polygon tessellation for concave and holed outlines.
//!
//! Rings are projected onto their dominant plane, proper self-crossings of the
//! outer ring are split at synthesized vertices, holes are bridged into their
//! enclosing loop, and the result is ear clipped. Small convex rings without
//! holes skip all of this through [`fan`].

use glam::{DVec2, DVec3, Vec3, Vec4};
use thiserror::Error;

/// Outlines with at most this many vertices may be drawn as a direct fan.
pub const FAST_PATH_MAX_VERTICES: usize = 5;

/// Upper bound on crossing splits, relative to the squared ring size.
const SPLIT_LIMIT_FACTOR: usize = 4;

/// Errors raised for rings that cannot be filled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TessError {
    /// Ring 0 is the outer ring, ring `k + 1` is hole `k`.
    #[error("ring {ring} has {count} distinct vertices, at least 3 are required")]
    TooFewVertices { ring: usize, count: usize },

    #[error("ring {ring} has zero area")]
    ZeroArea { ring: usize },

    #[error("hole {hole} is not enclosed by the outer ring")]
    HoleOutsideOuter { hole: usize },

    #[error("no visible bridge from hole {hole} to its enclosing ring")]
    NoBridge { hole: usize },

    #[error("outer ring crosses itself into overlapping loops")]
    SelfIntersection,

    #[error("ear clipping stalled with {remaining} vertices left")]
    NoEar { remaining: usize },
}

/// A tessellator vertex: position plus four auxiliary attributes (usually RGBA).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessVertex {
    pub position: Vec3,
    pub attrs: Vec4,
}

impl TessVertex {
    #[must_use]
    pub fn new(position: Vec3, attrs: Vec4) -> Self {
        Self { position, attrs }
    }
}

impl From<Vec3> for TessVertex {
    fn from(position: Vec3) -> Self {
        Self::new(position, Vec4::ONE)
    }
}

/// How a primitive's indices are assembled into triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    Triangles,
    TriangleFan,
    TriangleStrip,
}

/// One batch of fill indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub mode: PrimitiveMode,
    pub indices: Vec<u32>,
}

/// Fill primitives plus the outlines they were built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellation {
    pub vertices: Vec<TessVertex>,
    pub primitives: Vec<Primitive>,
    /// Outer ring first, then each hole, without closing duplicates.
    pub outlines: Vec<Vec<Vec3>>,
}

impl Tessellation {
    /// Expands every primitive into plain triangles.
    #[must_use]
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let mut tris = Vec::new();
        for prim in &self.primitives {
            let idx = &prim.indices;
            match prim.mode {
                PrimitiveMode::Triangles => {
                    tris.extend(idx.chunks_exact(3).map(|c| [c[0], c[1], c[2]]));
                }
                PrimitiveMode::TriangleFan => {
                    for k in 1..idx.len().saturating_sub(1) {
                        tris.push([idx[0], idx[k], idx[k + 1]]);
                    }
                }
                PrimitiveMode::TriangleStrip => {
                    for k in 0..idx.len().saturating_sub(2) {
                        if k % 2 == 0 {
                            tris.push([idx[k], idx[k + 1], idx[k + 2]]);
                        } else {
                            tris.push([idx[k + 1], idx[k], idx[k + 2]]);
                        }
                    }
                }
            }
        }
        tris
    }

    /// Total surface area of the fill.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.triangles()
            .iter()
            .map(|t| {
                let a = self.vertices[t[0] as usize].position.as_dvec3();
                let b = self.vertices[t[1] as usize].position.as_dvec3();
                let c = self.vertices[t[2] as usize].position.as_dvec3();
                (b - a).cross(c - a).length() * 0.5
            })
            .sum()
    }
}

/// Synthesizes a vertex at `position` whose attributes are the weighted
/// average of the contributors.
#[must_use]
pub fn combine(position: Vec3, contributors: &[(TessVertex, f32)]) -> TessVertex {
    let total: f32 = contributors.iter().map(|(_, w)| *w).sum();
    let attrs = if total > 0.0 {
        contributors
            .iter()
            .fold(Vec4::ZERO, |acc, (v, w)| acc + v.attrs * *w)
            / total
    } else if contributors.is_empty() {
        Vec4::ZERO
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = contributors.len() as f32;
        contributors.iter().fold(Vec4::ZERO, |acc, (v, _)| acc + v.attrs) / n
    };
    TessVertex { position, attrs }
}

/// Whether an outline qualifies for [`fan`] instead of [`tessellate`].
#[must_use]
pub fn is_fast_path(outer: &[TessVertex], hole_count: usize) -> bool {
    hole_count == 0 && outer.len() <= FAST_PATH_MAX_VERTICES && is_convex(outer)
}

/// Fills a convex ring as a single triangle fan around its first vertex.
#[must_use]
pub fn fan(outer: &[TessVertex]) -> Tessellation {
    let ring = clean_ring(outer);
    #[allow(clippy::cast_possible_truncation)]
    let indices = (0..ring.len() as u32).collect();
    Tessellation {
        outlines: vec![ring.iter().map(|v| v.position).collect()],
        vertices: ring,
        primitives: vec![Primitive {
            mode: PrimitiveMode::TriangleFan,
            indices,
        }],
    }
}

/// Tessellates positions with unit attributes.
///
/// # Errors
/// See [`tessellate`].
pub fn tessellate_positions(outer: &[Vec3], holes: &[Vec<Vec3>]) -> Result<Tessellation, TessError> {
    let outer: Vec<TessVertex> = outer.iter().copied().map(TessVertex::from).collect();
    let holes: Vec<Vec<TessVertex>> = holes
        .iter()
        .map(|h| h.iter().copied().map(TessVertex::from).collect())
        .collect();
    tessellate(&outer, &holes)
}

/// Tessellates an outer ring with holes into triangles.
///
/// Ring orientation does not matter; the outer ring is treated as
/// counter-clockwise and holes as clockwise in the projection plane.
///
/// # Errors
/// Returns a [`TessError`] for rings with fewer than three distinct vertices,
/// zero-area rings, holes outside the outer ring, overlapping self-crossings,
/// and input where clipping or bridging cannot make progress.
pub fn tessellate(outer: &[TessVertex], holes: &[Vec<TessVertex>]) -> Result<Tessellation, TessError> {
    let outer_ring = clean_ring(outer);
    if outer_ring.len() < 3 {
        return Err(TessError::TooFewVertices {
            ring: 0,
            count: outer_ring.len(),
        });
    }
    let drop = dominant_axis(plane_normal(&outer_ring));

    let mut work = Work::new(drop, &outer_ring);
    let mut outlines = vec![outer_ring.iter().map(|v| v.position).collect::<Vec<_>>()];

    let outer_idx = work.push_ring(&outer_ring);
    let mut loops = work.split_self_crossings(outer_idx)?;
    loops.retain(|l| l.len() >= 3 && work.ring_area(l).abs() > work.tol);
    if loops.is_empty() {
        return Err(TessError::ZeroArea { ring: 0 });
    }
    work.check_loops_disjoint(&loops)?;
    for l in &mut loops {
        if work.ring_area(l) < 0.0 {
            l.reverse();
        }
    }

    let mut loop_holes: Vec<Vec<Vec<usize>>> = vec![Vec::new(); loops.len()];
    for (k, hole) in holes.iter().enumerate() {
        let ring = clean_ring(hole);
        if ring.len() < 3 {
            return Err(TessError::TooFewVertices {
                ring: k + 1,
                count: ring.len(),
            });
        }
        let mut idx = work.push_ring(&ring);
        let area = work.ring_area(&idx);
        if area.abs() <= work.tol {
            return Err(TessError::ZeroArea { ring: k + 1 });
        }
        if area > 0.0 {
            idx.reverse();
        }
        let owner = loops
            .iter()
            .position(|l| work.encloses(l, &idx))
            .ok_or(TessError::HoleOutsideOuter { hole: k })?;
        loop_holes[owner].push(idx);
        outlines.push(ring.iter().map(|v| v.position).collect());
    }

    let mut indices = Vec::new();
    for (l, hole_rings) in loops.into_iter().zip(loop_holes) {
        let merged = work.bridge_holes(l, hole_rings)?;
        work.ear_clip(merged, &mut indices)?;
    }

    Ok(Tessellation {
        vertices: work.verts,
        primitives: vec![Primitive {
            mode: PrimitiveMode::Triangles,
            indices,
        }],
        outlines,
    })
}

fn clean_ring(ring: &[TessVertex]) -> Vec<TessVertex> {
    let mut out: Vec<TessVertex> = Vec::with_capacity(ring.len());
    for v in ring {
        if out.last().is_some_and(|last| last.position == v.position) {
            continue;
        }
        out.push(*v);
    }
    while out.len() > 1 && out.first().map(|v| v.position) == out.last().map(|v| v.position) {
        out.pop();
    }
    out
}

fn newell_normal(ring: &[TessVertex]) -> DVec3 {
    let mut n = DVec3::ZERO;
    for (i, v) in ring.iter().enumerate() {
        let a = v.position.as_dvec3();
        let b = ring[(i + 1) % ring.len()].position.as_dvec3();
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

/// Newell normal, or the widest fan cross product when the ring's signed
/// area cancels out (figure-eight rings).
fn plane_normal(ring: &[TessVertex]) -> DVec3 {
    let newell = newell_normal(ring);
    let origin = ring[0].position.as_dvec3();
    let fallback = ring
        .windows(2)
        .map(|w| (w[0].position.as_dvec3() - origin).cross(w[1].position.as_dvec3() - origin))
        .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
        .unwrap_or(DVec3::Z);
    if newell.length() > 1e-6 * fallback.length() {
        newell
    } else if fallback.length_squared() > 0.0 {
        fallback
    } else {
        DVec3::Z
    }
}

fn dominant_axis(n: DVec3) -> usize {
    let a = n.abs();
    if a.x >= a.y && a.x >= a.z {
        0
    } else if a.y >= a.z {
        1
    } else {
        2
    }
}

fn project(p: Vec3, drop: usize) -> DVec2 {
    let d = p.as_dvec3();
    match drop {
        0 => DVec2::new(d.y, d.z),
        1 => DVec2::new(d.z, d.x),
        _ => DVec2::new(d.x, d.y),
    }
}

fn is_convex(ring: &[TessVertex]) -> bool {
    let ring = clean_ring(ring);
    if ring.len() < 3 {
        return false;
    }
    let drop = dominant_axis(plane_normal(&ring));
    let pts: Vec<DVec2> = ring.iter().map(|v| project(v.position, drop)).collect();
    let n = pts.len();
    let mut sign = 0.0_f64;
    for i in 0..n {
        let c = (pts[(i + 1) % n] - pts[i]).perp_dot(pts[(i + 2) % n] - pts[(i + 1) % n]);
        if c.abs() <= f64::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = c.signum();
        } else if c.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Interior crossing parameters of segments `ab` and `cd`, if they properly cross.
fn segment_crossing(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> Option<(f64, f64)> {
    const LIMIT: f64 = 1e-9;
    let r = b - a;
    let s = d - c;
    let denom = r.perp_dot(s);
    if denom.abs() <= f64::EPSILON * r.length() * s.length() {
        return None;
    }
    let t = (c - a).perp_dot(s) / denom;
    let u = (c - a).perp_dot(r) / denom;
    (t > LIMIT && t < 1.0 - LIMIT && u > LIMIT && u < 1.0 - LIMIT).then_some((t, u))
}

fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Scratch space shared by every stage of one tessellation.
struct Work {
    drop: usize,
    verts: Vec<TessVertex>,
    pts: Vec<DVec2>,
    /// Area tolerance, relative to the squared size of the outer ring.
    tol: f64,
    /// Distance tolerance.
    eps: f64,
}

impl Work {
    fn new(drop: usize, outer: &[TessVertex]) -> Self {
        let pts: Vec<DVec2> = outer.iter().map(|v| project(v.position, drop)).collect();
        let (min, max) = pts
            .iter()
            .fold((DVec2::splat(f64::MAX), DVec2::splat(f64::MIN)), |(lo, hi), p| {
                (lo.min(*p), hi.max(*p))
            });
        let size = (max - min).length().max(f64::MIN_POSITIVE);
        Self {
            drop,
            verts: Vec::new(),
            pts: Vec::new(),
            tol: 1e-12 * size * size,
            eps: 1e-9 * size,
        }
    }

    fn push(&mut self, v: TessVertex, p: DVec2) -> usize {
        self.verts.push(v);
        self.pts.push(p);
        self.verts.len() - 1
    }

    fn push_ring(&mut self, ring: &[TessVertex]) -> Vec<usize> {
        ring.iter()
            .map(|v| self.push(*v, project(v.position, self.drop)))
            .collect()
    }

    fn ring_area(&self, ring: &[usize]) -> f64 {
        let n = ring.len();
        (0..n)
            .map(|i| self.pts[ring[i]].perp_dot(self.pts[ring[(i + 1) % n]]))
            .sum::<f64>()
            * 0.5
    }

    fn cross(&self, a: usize, b: usize, c: usize) -> f64 {
        (self.pts[b] - self.pts[a]).perp_dot(self.pts[c] - self.pts[b])
    }

    fn coincident(&self, a: usize, b: usize) -> bool {
        self.pts[a].distance(self.pts[b]) <= self.eps
    }

    fn contains_point(&self, ring: &[usize], p: DVec2) -> bool {
        let n = ring.len();
        let mut inside = false;
        for i in 0..n {
            let a = self.pts[ring[i]];
            let b = self.pts[ring[(i + 1) % n]];
            if (a.y > p.y) != (b.y > p.y) && p.x < a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x) {
                inside = !inside;
            }
        }
        inside
    }

    fn on_boundary(&self, ring: &[usize], p: DVec2) -> bool {
        let n = ring.len();
        (0..n).any(|i| distance_to_segment(p, self.pts[ring[i]], self.pts[ring[(i + 1) % n]]) <= self.eps)
    }

    fn strictly_inside(&self, ring: &[usize], p: DVec2) -> bool {
        !self.on_boundary(ring, p) && self.contains_point(ring, p)
    }

    /// Whether every vertex of `inner` is inside or on `outer`, with at least one strictly inside.
    fn encloses(&self, outer: &[usize], inner: &[usize]) -> bool {
        let mut any_inside = false;
        for &i in inner {
            let p = self.pts[i];
            if self.on_boundary(outer, p) {
                continue;
            }
            if !self.contains_point(outer, p) {
                return false;
            }
            any_inside = true;
        }
        any_inside
    }

    fn first_crossing(&self, ring: &[usize]) -> Option<(usize, usize, f64, f64)> {
        let n = ring.len();
        for i in 0..n {
            let (a, b) = (self.pts[ring[i]], self.pts[ring[(i + 1) % n]]);
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (c, d) = (self.pts[ring[j]], self.pts[ring[(j + 1) % n]]);
                if let Some((t, u)) = segment_crossing(a, b, c, d) {
                    return Some((i, j, t, u));
                }
            }
        }
        None
    }

    /// Splits a ring at each proper self-crossing until every loop is simple.
    fn split_self_crossings(&mut self, ring: Vec<usize>) -> Result<Vec<Vec<usize>>, TessError> {
        let limit = SPLIT_LIMIT_FACTOR * ring.len() * ring.len();
        let mut pending = vec![ring];
        let mut done = Vec::new();
        let mut splits = 0;
        while let Some(r) = pending.pop() {
            let Some((i, j, t, u)) = self.first_crossing(&r) else {
                done.push(r);
                continue;
            };
            splits += 1;
            if splits > limit {
                return Err(TessError::SelfIntersection);
            }
            let n = r.len();
            let (a0, a1) = (r[i], r[(i + 1) % n]);
            let (b0, b1) = (r[j], r[(j + 1) % n]);
            #[allow(clippy::cast_possible_truncation)]
            let (tf, uf) = (t as f32, u as f32);
            let position = self.verts[a0].position.lerp(self.verts[a1].position, tf);
            let x = combine(
                position,
                &[
                    (self.verts[a0], (1.0 - tf) * 0.5),
                    (self.verts[a1], tf * 0.5),
                    (self.verts[b0], (1.0 - uf) * 0.5),
                    (self.verts[b1], uf * 0.5),
                ],
            );
            let p = self.pts[a0] + (self.pts[a1] - self.pts[a0]) * t;
            let xi = self.push(x, p);

            let mut first = vec![xi];
            first.extend_from_slice(&r[i + 1..=j]);
            let mut second = vec![xi];
            second.extend_from_slice(&r[j + 1..]);
            second.extend_from_slice(&r[..=i]);
            pending.push(first);
            pending.push(second);
        }
        Ok(done)
    }

    fn check_loops_disjoint(&self, loops: &[Vec<usize>]) -> Result<(), TessError> {
        for (a, la) in loops.iter().enumerate() {
            for (b, lb) in loops.iter().enumerate() {
                if a == b {
                    continue;
                }
                let overlaps = la.iter().any(|&v| {
                    !lb.iter().any(|&w| self.coincident(v, w)) && self.strictly_inside(lb, self.pts[v])
                });
                if overlaps {
                    return Err(TessError::SelfIntersection);
                }
            }
        }
        Ok(())
    }

    fn segment_blocked(&self, a: DVec2, b: DVec2, ring: &[usize]) -> bool {
        let n = ring.len();
        (0..n).any(|i| segment_crossing(a, b, self.pts[ring[i]], self.pts[ring[(i + 1) % n]]).is_some())
    }

    /// Connects every hole to the outer ring through a visible bridge edge.
    fn bridge_holes(&self, outer: Vec<usize>, mut holes: Vec<Vec<usize>>) -> Result<Vec<usize>, TessError> {
        let max_x = |ring: &Vec<usize>| ring.iter().map(|&i| self.pts[i].x).fold(f64::MIN, f64::max);
        holes.sort_by(|a, b| max_x(b).total_cmp(&max_x(a)));

        let mut merged = outer;
        for k in 0..holes.len() {
            let hole = &holes[k];
            let hi = (0..hole.len())
                .max_by(|&a, &b| self.pts[hole[a]].x.total_cmp(&self.pts[hole[b]].x))
                .unwrap_or(0);
            let h = self.pts[hole[hi]];

            let mut candidates: Vec<usize> = (0..merged.len()).collect();
            candidates.sort_by(|&a, &b| {
                self.pts[merged[a]]
                    .distance_squared(h)
                    .total_cmp(&self.pts[merged[b]].distance_squared(h))
            });
            let remaining = &holes[k + 1..];
            let mi = candidates
                .into_iter()
                .find(|&mi| {
                    let m = self.pts[merged[mi]];
                    if m.distance(h) <= self.eps {
                        return false;
                    }
                    if self.segment_blocked(h, m, &merged)
                        || self.segment_blocked(h, m, hole)
                        || remaining.iter().any(|r| self.segment_blocked(h, m, r))
                    {
                        return false;
                    }
                    let mid = (h + m) * 0.5;
                    self.contains_point(&merged, mid)
                        && !self.contains_point(hole, mid)
                        && !remaining.iter().any(|r| self.contains_point(r, mid))
                })
                .ok_or(TessError::NoBridge { hole: k })?;

            let mut next = Vec::with_capacity(merged.len() + hole.len() + 2);
            next.extend_from_slice(&merged[..=mi]);
            next.extend(hole[hi..].iter().chain(hole[..=hi].iter()));
            next.extend_from_slice(&merged[mi..]);
            merged = next;
        }
        Ok(merged)
    }

    fn remove_degenerate(&self, poly: &mut Vec<usize>) {
        let mut i = 0;
        let mut stable = 0;
        while poly.len() > 3 && stable < poly.len() {
            let n = poly.len();
            let (a, b, c) = (poly[(i + n - 1) % n], poly[i % n], poly[(i + 1) % n]);
            if self.coincident(a, b) || self.cross(a, b, c).abs() <= self.tol {
                poly.remove(i % n);
                stable = 0;
                i = i.saturating_sub(1);
            } else {
                stable += 1;
                i = (i + 1) % n;
            }
        }
    }

    fn is_ear(&self, poly: &[usize], i: usize) -> bool {
        let n = poly.len();
        let (a, b, c) = (poly[(i + n - 1) % n], poly[i], poly[(i + 1) % n]);
        if self.cross(a, b, c) <= self.tol {
            return false;
        }
        let (pa, pb, pc) = (self.pts[a], self.pts[b], self.pts[c]);
        for k in 0..n {
            let p = poly[k];
            if k == i || k == (i + 1) % n || k == (i + n - 1) % n {
                continue;
            }
            if self.coincident(p, a) || self.coincident(p, b) || self.coincident(p, c) {
                continue;
            }
            let prev = poly[(k + n - 1) % n];
            let next = poly[(k + 1) % n];
            if self.cross(prev, p, next) > self.tol {
                continue;
            }
            if point_in_triangle(self.pts[p], pa, pb, pc) {
                return false;
            }
        }
        true
    }

    fn ear_clip(&self, ring: Vec<usize>, out: &mut Vec<u32>) -> Result<(), TessError> {
        let mut poly = ring;
        self.remove_degenerate(&mut poly);
        let mut start = 0;
        while poly.len() > 3 {
            let n = poly.len();
            let ear = (0..n).map(|k| (start + k) % n).find(|&i| self.is_ear(&poly, i));
            let Some(i) = ear else {
                return Err(TessError::NoEar { remaining: n });
            };
            emit(out, poly[(i + n - 1) % n], poly[i], poly[(i + 1) % n]);
            poly.remove(i);
            self.remove_degenerate(&mut poly);
            start = i.saturating_sub(1);
        }
        if poly.len() == 3 && self.cross(poly[0], poly[1], poly[2]) > self.tol {
            emit(out, poly[0], poly[1], poly[2]);
        }
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn emit(out: &mut Vec<u32>, a: usize, b: usize, c: usize) {
    out.extend([a as u32, b as u32, c as u32]);
}

fn point_in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    (b - a).perp_dot(p - a) >= 0.0 && (c - b).perp_dot(p - b) >= 0.0 && (a - c).perp_dot(p - c) >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square(x0: f32, y0: f32, size: f32) -> Vec<Vec3> {
        vec![
            Vec3::new(x0, y0, 0.0),
            Vec3::new(x0 + size, y0, 0.0),
            Vec3::new(x0 + size, y0 + size, 0.0),
            Vec3::new(x0, y0 + size, 0.0),
        ]
    }

    fn shoelace(ring: &[Vec3]) -> f64 {
        let n = ring.len();
        (0..n)
            .map(|i| {
                let a = ring[i].as_dvec3();
                let b = ring[(i + 1) % n].as_dvec3();
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            .abs()
            * 0.5
    }

    #[test]
    fn test_combine_weighted_average() {
        let red = TessVertex::new(Vec3::ZERO, Vec4::new(1.0, 0.0, 0.0, 1.0));
        let blue = TessVertex::new(Vec3::X, Vec4::new(0.0, 0.0, 1.0, 1.0));
        let v = combine(Vec3::new(0.25, 0.0, 0.0), &[(red, 0.75), (blue, 0.25)]);
        assert_eq!(v.position, Vec3::new(0.25, 0.0, 0.0));
        assert!((v.attrs - Vec4::new(0.75, 0.0, 0.25, 1.0)).length() < 1e-6);

        let unweighted = combine(Vec3::ZERO, &[(red, 0.0), (blue, 0.0)]);
        assert!((unweighted.attrs - Vec4::new(0.5, 0.0, 0.5, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_square_with_hole() {
        let outer = square(0.0, 0.0, 10.0);
        let hole = square(4.0, 4.0, 2.0);
        let tess = tessellate_positions(&outer, &[hole]).unwrap();
        assert!((tess.area() - 96.0).abs() < 1e-6);
        assert_eq!(tess.outlines.len(), 2);
        assert_eq!(tess.outlines[0].len(), 4);
        assert_eq!(tess.outlines[1].len(), 4);
    }

    #[test]
    fn test_hole_orientation_is_normalized() {
        let outer = square(0.0, 0.0, 10.0);
        let mut hole = square(1.0, 1.0, 3.0);
        hole.reverse();
        let mut outer_cw = outer.clone();
        outer_cw.reverse();
        let tess = tessellate_positions(&outer_cw, &[hole]).unwrap();
        assert!((tess.area() - 91.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_holes() {
        let outer = square(0.0, 0.0, 10.0);
        let tess = tessellate_positions(&outer, &[square(1.0, 1.0, 2.0), square(6.0, 6.0, 3.0)]).unwrap();
        assert!((tess.area() - (100.0 - 4.0 - 9.0)).abs() < 1e-6);
    }

    #[test]
    fn test_concave_l_shape() {
        let outer = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(4.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 4.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
        ];
        let tess = tessellate_positions(&outer, &[]).unwrap();
        assert!((tess.area() - 7.0).abs() < 1e-6);
        assert_eq!(tess.triangles().len(), 4);
    }

    #[test]
    fn test_closed_ring_and_collinear_vertices() {
        let outer = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        let tess = tessellate_positions(&outer, &[]).unwrap();
        assert!((tess.area() - 4.0).abs() < 1e-6);
        assert_eq!(tess.outlines[0].len(), 5);
    }

    #[test]
    fn test_vertical_plane() {
        let outer = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 2.0),
            Vec3::new(0.0, 0.0, 2.0),
        ];
        let tess = tessellate_positions(&outer, &[]).unwrap();
        assert!((tess.area() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_bowtie_splits_with_combined_vertex() {
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);
        let outer = vec![
            TessVertex::new(Vec3::new(0.0, 0.0, 0.0), red),
            TessVertex::new(Vec3::new(2.0, 2.0, 0.0), red),
            TessVertex::new(Vec3::new(2.0, 0.0, 0.0), blue),
            TessVertex::new(Vec3::new(0.0, 2.0, 0.0), blue),
        ];
        let tess = tessellate(&outer, &[]).unwrap();
        assert!((tess.area() - 2.0).abs() < 1e-6);
        let crossing = tess
            .vertices
            .iter()
            .find(|v| (v.position - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6)
            .unwrap();
        assert!((crossing.attrs - Vec4::new(0.5, 0.0, 0.5, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_rings_are_errors() {
        let line = vec![Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)];
        assert_eq!(tessellate_positions(&line, &[]).unwrap_err(), TessError::ZeroArea { ring: 0 });

        let two = vec![Vec3::ZERO, Vec3::X, Vec3::ZERO];
        assert!(matches!(
            tessellate_positions(&two, &[]).unwrap_err(),
            TessError::TooFewVertices { ring: 0, .. }
        ));

        let outside = square(20.0, 20.0, 1.0);
        assert_eq!(
            tessellate_positions(&square(0.0, 0.0, 10.0), &[outside]).unwrap_err(),
            TessError::HoleOutsideOuter { hole: 0 }
        );
    }

    #[test]
    fn test_loop_inside_its_own_ring_is_self_intersection() {
        // One crossing at (5, 5) leaves a small loop inside the big one.
        let outer = vec![
            Vec3::new(4.0, 4.0, 0.0),
            Vec3::new(6.0, 6.0, 0.0),
            Vec3::new(6.0, 10.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(6.0, 4.0, 0.0),
            Vec3::new(4.0, 6.0, 0.0),
            Vec3::new(3.0, 5.0, 0.0),
        ];
        assert_eq!(tessellate_positions(&outer, &[]).unwrap_err(), TessError::SelfIntersection);
    }

    #[test]
    fn test_hole_inside_another_hole_has_no_bridge() {
        let outer = square(0.0, 0.0, 10.0);
        let holes = [square(2.0, 2.0, 6.0), square(4.3, 3.7, 1.0)];
        assert!(matches!(
            tessellate_positions(&outer, &holes).unwrap_err(),
            TessError::NoBridge { .. }
        ));
    }

    #[test]
    fn test_clockwise_ring_has_no_ear() {
        let ring: Vec<TessVertex> = square(0.0, 0.0, 1.0).into_iter().map(TessVertex::from).collect();
        let mut work = Work::new(2, &ring);
        let mut idx = work.push_ring(&ring);
        idx.reverse();
        let mut out = Vec::new();
        assert_eq!(work.ear_clip(idx, &mut out).unwrap_err(), TessError::NoEar { remaining: 4 });
        assert!(out.is_empty());
    }

    #[test]
    fn test_fan_matches_tessellation_for_convex_quad() {
        let quad = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(5.0, 1.0, 0.0),
            Vec3::new(4.0, 4.0, 0.0),
            Vec3::new(1.0, 3.0, 0.0),
        ];
        let verts: Vec<TessVertex> = quad.iter().copied().map(TessVertex::from).collect();
        assert!(is_fast_path(&verts, 0));
        let fast = fan(&verts);
        assert_eq!(fast.primitives[0].mode, PrimitiveMode::TriangleFan);
        let full = tessellate(&verts, &[]).unwrap();
        assert!((fast.area() - shoelace(&quad)).abs() < 1e-6);
        assert!((fast.area() - full.area()).abs() < 1e-6);
    }

    #[test]
    fn test_fast_path_rejects_concave_and_holed() {
        let dart: Vec<TessVertex> = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(2.0, 4.0, 0.0),
        ]
        .into_iter()
        .map(TessVertex::from)
        .collect();
        assert!(!is_fast_path(&dart, 0));
        let sq: Vec<TessVertex> = square(0.0, 0.0, 1.0).into_iter().map(TessVertex::from).collect();
        assert!(!is_fast_path(&sq, 1));
    }

    #[test]
    fn test_strip_expansion() {
        let tess = Tessellation {
            vertices: square(0.0, 0.0, 1.0).into_iter().map(TessVertex::from).collect(),
            primitives: vec![Primitive {
                mode: PrimitiveMode::TriangleStrip,
                indices: vec![0, 1, 3, 2],
            }],
            outlines: Vec::new(),
        };
        assert_eq!(tess.triangles(), vec![[0, 1, 3], [3, 1, 2]]);
        assert!((tess.area() - 1.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_area_conserved_for_star_polygons(
            radii in proptest::collection::vec(2.0f32..10.0, 5..24),
            with_hole in any::<bool>(),
        ) {
            #[allow(clippy::cast_precision_loss)]
            let n = radii.len() as f32;
            let outer: Vec<Vec3> = radii
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    #[allow(clippy::cast_precision_loss)]
                    let a = i as f32 / n * std::f32::consts::TAU;
                    Vec3::new(r * a.cos(), r * a.sin(), 0.0)
                })
                .collect();
            let holes = if with_hole { vec![square(-0.5, -0.5, 1.0)] } else { Vec::new() };
            let expected = shoelace(&outer) - holes.iter().map(|h| shoelace(h)).sum::<f64>();
            let tess = tessellate_positions(&outer, &holes).unwrap();
            prop_assert!((tess.area() - expected).abs() < 1e-3 * expected.max(1.0));
        }

        #[test]
        fn prop_area_conserved_for_histogram_with_hole(
            bars in proptest::collection::vec((0.5f32..3.0, 2.0f32..10.0), 2..12),
            hole_at in 0.0f32..1.0,
            hole_size in 0.2f32..1.2,
            offset in (-50.0f32..50.0, -50.0f32..50.0),
        ) {
            // Bars of random width and height on a common base: concave and
            // not star-shaped in general.
            let (dx, dy) = offset;
            let width: f32 = bars.iter().map(|(w, _)| w).sum();
            let mut outer = vec![Vec3::new(dx, dy, 0.0), Vec3::new(dx + width, dy, 0.0)];
            let mut x = width;
            for (w, h) in bars.iter().rev() {
                outer.push(Vec3::new(dx + x, dy + h, 0.0));
                x -= w;
                outer.push(Vec3::new(dx + x, dy + h, 0.0));
            }
            // Every bar is at least 2 high, so the hole fits in the base strip.
            let hx = dx + 0.1 + hole_at * (width - hole_size - 0.2).max(0.0);
            let hole = square(hx, dy + 0.3, hole_size);
            prop_assume!(hx + hole_size < dx + width - 0.05);
            let expected = shoelace(&outer) - shoelace(&hole);
            let tess = tessellate_positions(&outer, &[hole]).unwrap();
            prop_assert!((tess.area() - expected).abs() < 1e-3 * expected.max(1.0));
        }
    }
}
