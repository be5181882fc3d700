//! Clip planes bounding graphics to the axes extent.
//!
//! Clipping happens in data space before vertices are projected, so the six
//! planes are axis-aligned half-spaces built straight from the extent.

use glam::{Vec2, Vec3, Vec4};
use meteoplot_core::{Axis3, Extent3D};

/// Fraction of each axis length the planes are pushed outward.
pub const CLIP_MARGIN: f64 = 0.001;

/// A half-space `normal · p + offset >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    pub normal: Vec3,
    pub offset: f32,
}

impl ClipPlane {
    /// Positive on the kept side.
    #[must_use]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.offset
    }

    #[must_use]
    pub fn is_kept(&self, p: Vec3) -> bool {
        self.signed_distance(p) >= 0.0
    }
}

/// A vertex that can be cut by a clip plane.
pub trait ClipVertex: Copy {
    fn position(&self) -> Vec3;

    /// Interpolates every attribute, `t = 0` giving `self`.
    #[must_use]
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl ClipVertex for Vec3 {
    fn position(&self) -> Vec3 {
        *self
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::lerp(*self, *other, t)
    }
}

impl ClipVertex for (Vec3, Vec4) {
    fn position(&self) -> Vec3 {
        self.0
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        (self.0.lerp(other.0, t), self.1.lerp(other.1, t))
    }
}

impl ClipVertex for (Vec3, Vec2) {
    fn position(&self) -> Vec3 {
        self.0
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        (self.0.lerp(other.0, t), self.1.lerp(other.1, t))
    }
}

/// Six planes enclosing an extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlanes {
    planes: [ClipPlane; 6],
}

impl ClipPlanes {
    /// Builds the planes from an extent inflated by [`CLIP_MARGIN`] per axis.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_extent(extent: &Extent3D) -> Self {
        let mut planes = [ClipPlane {
            normal: Vec3::ZERO,
            offset: 0.0,
        }; 6];
        for axis in Axis3::ALL {
            let i = axis.index();
            let margin = extent.length(axis) * CLIP_MARGIN;
            let min = (extent.min_of(axis) - margin) as f32;
            let max = (extent.max_of(axis) + margin) as f32;
            let mut normal = Vec3::ZERO;
            normal[i] = 1.0;
            planes[2 * i] = ClipPlane { normal, offset: -min };
            planes[2 * i + 1] = ClipPlane {
                normal: -normal,
                offset: max,
            };
        }
        Self { planes }
    }

    #[must_use]
    pub fn planes(&self) -> &[ClipPlane; 6] {
        &self.planes
    }

    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.is_kept(p))
    }

    /// Sutherland-Hodgman clipping of a convex polygon.
    ///
    /// Returns an empty list when nothing is left.
    #[must_use]
    pub fn clip_polygon<V: ClipVertex>(&self, polygon: &[V]) -> Vec<V> {
        let mut current = polygon.to_vec();
        for plane in &self.planes {
            if current.is_empty() {
                break;
            }
            if current.iter().all(|v| plane.is_kept(v.position())) {
                continue;
            }
            let mut next = Vec::with_capacity(current.len() + 2);
            for (i, a) in current.iter().enumerate() {
                let b = &current[(i + 1) % current.len()];
                let da = plane.signed_distance(a.position());
                let db = plane.signed_distance(b.position());
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

    /// Clips a segment, returning the kept part.
    #[must_use]
    pub fn clip_segment<V: ClipVertex>(&self, a: V, b: V) -> Option<(V, V)> {
        let (mut t0, mut t1) = (0.0f32, 1.0f32);
        for plane in &self.planes {
            let da = plane.signed_distance(a.position());
            let db = plane.signed_distance(b.position());
            if da < 0.0 && db < 0.0 {
                return None;
            }
            if da < 0.0 {
                t0 = t0.max(da / (da - db));
            } else if db < 0.0 {
                t1 = t1.min(da / (da - db));
            }
        }
        if t0 > t1 {
            return None;
        }
        Some((a.lerp(&b, t0), a.lerp(&b, t1)))
    }
}

/// Whether clipping applies to the geometry currently being drawn.
#[derive(Debug, Clone, Default)]
pub struct ClipState {
    planes: Option<ClipPlanes>,
    enabled: bool,
}

impl ClipState {
    /// Builds planes for `extent` and turns clipping on.
    pub fn enable(&mut self, extent: &Extent3D) {
        self.planes = Some(ClipPlanes::from_extent(extent));
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Toggles clipping without rebuilding the planes; returns the old state.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let was = self.enabled;
        self.enabled = enabled && self.planes.is_some();
        was
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The planes to apply, `None` when clipping is off.
    #[must_use]
    pub fn active(&self) -> Option<&ClipPlanes> {
        if self.enabled {
            self.planes.as_ref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> ClipPlanes {
        ClipPlanes::from_extent(&Extent3D::new(0.0, 10.0, 0.0, 10.0, 0.0, 10.0))
    }

    #[test]
    fn test_margin_keeps_boundary_points() {
        let planes = unit();
        assert!(planes.contains(Vec3::new(10.0, 10.0, 0.0)));
        assert!(planes.contains(Vec3::new(10.005, 0.0, 0.0)));
        assert!(!planes.contains(Vec3::new(10.02, 0.0, 0.0)));
        assert!(!planes.contains(Vec3::new(5.0, -0.02, 5.0)));
    }

    #[test]
    fn test_clip_polygon_halves_square() {
        let planes = ClipPlanes::from_extent(&Extent3D::new(0.0, 1.0, 0.0, 1.0, -1.0, 1.0));
        let square = [
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-1.0, 0.5, 0.0),
        ];
        let clipped = planes.clip_polygon(&square);
        assert_eq!(clipped.len(), 4);
        let min_x = clipped.iter().map(|p| p.x).fold(f32::MAX, f32::min);
        assert!((min_x + 0.001).abs() < 1e-4);
    }

    #[test]
    fn test_clip_polygon_outside_is_empty() {
        let tri = [Vec3::new(20.0, 0.0, 0.0), Vec3::new(30.0, 0.0, 0.0), Vec3::new(20.0, 5.0, 0.0)];
        assert!(unit().clip_polygon(&tri).is_empty());
    }

    #[test]
    fn test_clip_segment_interpolates_color() {
        let a = (Vec3::new(-10.0, 5.0, 5.0), Vec4::ZERO);
        let b = (Vec3::new(10.0, 5.0, 5.0), Vec4::ONE);
        let (s, e) = unit().clip_segment(a, b).unwrap();
        assert!(s.0.x.abs() < 0.02);
        assert!((s.1.x - 0.5).abs() < 1e-3);
        assert_eq!(e.0, b.0);
        assert!(unit().clip_segment(Vec3::splat(-1.0), Vec3::new(-1.0, 20.0, -1.0)).is_none());
    }

    #[test]
    fn test_clip_state_toggle() {
        let mut state = ClipState::default();
        assert!(state.active().is_none());
        assert!(!state.set_enabled(true));
        assert!(!state.is_enabled());
        state.enable(&Extent3D::new(0.0, 1.0, 0.0, 1.0, 0.0, 1.0));
        assert!(state.active().is_some());
        assert!(state.set_enabled(false));
        assert!(state.active().is_none());
        state.set_enabled(true);
        assert!(state.is_enabled());
        state.disable();
        assert!(!state.is_enabled());
    }
}
