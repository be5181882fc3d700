//! Three-dimensional axis-aligned extents.
//!
//! A plot tracks two of these: the draw extent (what the camera maps onto the
//! normalized cube) and the axes extent (what the box, grid and ticks span).

use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

/// One of the three data axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis3 {
    X,
    Y,
    Z,
}

impl Axis3 {
    /// All axes in x, y, z order.
    pub const ALL: [Axis3; 3] = [Axis3::X, Axis3::Y, Axis3::Z];

    /// Component index of this axis.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Axis3::X => 0,
            Axis3::Y => 1,
            Axis3::Z => 2,
        }
    }
}

/// Axis-aligned bounding box in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent3D {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for Extent3D {
    fn default() -> Self {
        Self::new(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0)
    }
}

impl Extent3D {
    /// Creates an extent, ordering each min/max pair.
    #[must_use]
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64, min_z: f64, max_z: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            max_x: min_x.max(max_x),
            min_y: min_y.min(max_y),
            max_y: min_y.max(max_y),
            min_z: min_z.min(max_z),
            max_z: min_z.max(max_z),
        }
    }

    /// Bounding box of a point set, `None` for an empty set.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = points.first()?;
        let mut min = first.as_dvec3();
        let mut max = min;
        for p in &points[1..] {
            let p = p.as_dvec3();
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self::new(min.x, max.x, min.y, max.y, min.z, max.z))
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> DVec3 {
        DVec3::new(self.min_x, self.min_y, self.min_z)
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> DVec3 {
        DVec3::new(self.max_x, self.max_y, self.max_z)
    }

    /// Minimum value along an axis.
    #[must_use]
    pub fn min_of(&self, axis: Axis3) -> f64 {
        self.min()[axis.index()]
    }

    /// Maximum value along an axis.
    #[must_use]
    pub fn max_of(&self, axis: Axis3) -> f64 {
        self.max()[axis.index()]
    }

    /// Midpoint of each axis.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        (self.min() + self.max()) * 0.5
    }

    /// Length along one axis.
    #[must_use]
    pub fn length(&self, axis: Axis3) -> f64 {
        self.max_of(axis) - self.min_of(axis)
    }

    /// Length of the longest axis.
    #[must_use]
    pub fn max_length(&self) -> f64 {
        Axis3::ALL
            .iter()
            .map(|a| self.length(*a))
            .fold(0.0, f64::max)
    }

    /// Whether every min is at most its max and every bound is finite.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min().is_finite()
            && self.max().is_finite()
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
            && self.min_z <= self.max_z
    }

    /// Returns a copy where every zero-length axis is widened around its value.
    ///
    /// An axis collapsed at `v` becomes `[v - d, v + d]` with `d = 0.1 * |v|`,
    /// or `d = 0.1` when `v` is zero.
    #[must_use]
    pub fn as_non_zero(&self) -> Self {
        fn widen(min: f64, max: f64) -> (f64, f64) {
            if max > min {
                return (min, max);
            }
            let d = if min == 0.0 { 0.1 } else { min.abs() * 0.1 };
            (min - d, max + d)
        }
        let (min_x, max_x) = widen(self.min_x, self.max_x);
        let (min_y, max_y) = widen(self.min_y, self.max_y);
        let (min_z, max_z) = widen(self.min_z, self.max_z);
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            min_z,
            max_z,
        }
    }

    /// Smallest extent containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// Whether the two boxes overlap (touching counts).
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
            && self.min_z <= other.max_z
            && other.min_z <= self.max_z
    }

    /// Whether a point lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.min()).all() && p.cmple(self.max()).all()
    }

    /// Grows every axis by `fraction` of its length on both sides.
    #[must_use]
    pub fn inflate(&self, fraction: f64) -> Self {
        let dx = self.length(Axis3::X) * fraction;
        let dy = self.length(Axis3::Y) * fraction;
        let dz = self.length(Axis3::Z) * fraction;
        Self {
            min_x: self.min_x - dx,
            max_x: self.max_x + dx,
            min_y: self.min_y - dy,
            max_y: self.max_y + dy,
            min_z: self.min_z - dz,
            max_z: self.max_z + dz,
        }
    }

    /// The eight corners, bottom face first.
    #[must_use]
    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min(), self.max());
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(b.x, b.y, b.z),
            DVec3::new(a.x, b.y, b.z),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orders_bounds() {
        let e = Extent3D::new(10.0, 0.0, 1.0, -1.0, 5.0, 5.0);
        assert_eq!(e.min_x, 0.0);
        assert_eq!(e.max_x, 10.0);
        assert_eq!(e.min_y, -1.0);
        assert!(e.is_valid());
    }

    #[test]
    fn test_from_points() {
        let pts = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 5.0, 0.0)];
        let e = Extent3D::from_points(&pts).unwrap();
        assert_eq!(e.min(), DVec3::new(-1.0, 2.0, 0.0));
        assert_eq!(e.max(), DVec3::new(1.0, 5.0, 3.0));
        assert!(Extent3D::from_points(&[]).is_none());
    }

    #[test]
    fn test_as_non_zero() {
        let e = Extent3D::new(0.0, 10.0, 3.0, 3.0, 0.0, 0.0).as_non_zero();
        assert_eq!(e.min_x, 0.0);
        assert!((e.min_y - 2.7).abs() < 1e-12);
        assert!((e.max_y - 3.3).abs() < 1e-12);
        assert!((e.min_z + 0.1).abs() < 1e-12);
        assert!(e.length(Axis3::Z) > 0.0);
    }

    #[test]
    fn test_union_and_intersects() {
        let a = Extent3D::new(0.0, 1.0, 0.0, 1.0, 0.0, 1.0);
        let b = Extent3D::new(2.0, 3.0, 0.0, 1.0, 0.0, 1.0);
        assert!(!a.intersects(&b));
        let u = a.union(&b);
        assert_eq!(u.max_x, 3.0);
        assert!(u.intersects(&a));
        assert!(u.contains(DVec3::new(2.5, 0.5, 0.5)));
    }

    #[test]
    fn test_inflate() {
        let e = Extent3D::new(0.0, 100.0, 0.0, 10.0, 0.0, 1.0).inflate(0.001);
        assert!((e.min_x + 0.1).abs() < 1e-12);
        assert!((e.max_y - 10.01).abs() < 1e-12);
    }
}
