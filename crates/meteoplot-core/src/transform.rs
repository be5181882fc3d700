//! Normalization of data space into the canonical drawing cube.

use glam::{DVec3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::extent::{Axis3, Extent3D};

/// Half-width of the canonical drawing cube. Data is mapped into `[-1, 1]^3`.
pub const CUBE_HALF_WIDTH: f64 = 1.0;

/// Lengths below this are treated as this value when scaling.
const MIN_AXIS_LENGTH: f64 = 1e-10;

/// How per-axis scale factors relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectType {
    /// Every axis is normalized independently.
    #[default]
    Auto,
    /// All axes share one scale so the longest axis fills the cube.
    Equal,
}

/// Center and scale that map an extent into the canonical cube.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    extent: Extent3D,
    center: DVec3,
    scale: DVec3,
    z_scale: f64,
    aspect: AspectType,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Extent3D::default(), AspectType::Auto)
    }
}

impl Transform {
    /// Creates a transform for an extent.
    #[must_use]
    pub fn new(extent: Extent3D, aspect: AspectType) -> Self {
        let mut t = Self {
            extent,
            center: DVec3::ZERO,
            scale: DVec3::ONE,
            z_scale: 1.0,
            aspect,
        };
        t.recompute();
        t
    }

    /// Replaces the source extent and recomputes center and scale.
    pub fn set_extent(&mut self, extent: Extent3D) {
        self.extent = extent;
        self.recompute();
    }

    /// Source extent.
    #[must_use]
    pub fn extent(&self) -> &Extent3D {
        &self.extent
    }

    /// Sets the aspect policy.
    pub fn set_aspect(&mut self, aspect: AspectType) {
        self.aspect = aspect;
        self.recompute();
    }

    /// Aspect policy.
    #[must_use]
    pub fn aspect(&self) -> AspectType {
        self.aspect
    }

    /// Sets the extra multiplier applied to the z scale.
    pub fn set_z_scale(&mut self, z_scale: f64) {
        self.z_scale = z_scale;
        self.recompute();
    }

    /// Extra multiplier applied to the z scale.
    #[must_use]
    pub fn z_scale(&self) -> f64 {
        self.z_scale
    }

    /// Midpoint of the extent.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// Per-axis scale factors, z-scale included.
    #[must_use]
    pub fn scale(&self) -> DVec3 {
        self.scale
    }

    /// Data-space length of one axis.
    #[must_use]
    pub fn axis_length(&self, axis: Axis3) -> f64 {
        self.extent.length(axis)
    }

    /// Maps a data point into the cube.
    #[must_use]
    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        (p - self.center) * self.scale
    }

    /// Maps a cube point back to data space.
    #[must_use]
    pub fn inverse_point(&self, p: DVec3) -> DVec3 {
        p / self.scale + self.center
    }

    /// Scale then translate, as applied to the model-view matrix.
    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale(self.scale.as_vec3()) * Mat4::from_translation(-self.center.as_vec3())
    }

    /// Scale factors as `f32`.
    #[must_use]
    pub fn scale_f32(&self) -> Vec3 {
        self.scale.as_vec3()
    }

    fn recompute(&mut self) {
        self.center = self.extent.center();
        let len = |axis| self.extent.length(axis).max(MIN_AXIS_LENGTH);
        let full = 2.0 * CUBE_HALF_WIDTH;
        self.scale = match self.aspect {
            AspectType::Auto => DVec3::new(
                full / len(Axis3::X),
                full / len(Axis3::Y),
                full / len(Axis3::Z),
            ),
            AspectType::Equal => DVec3::splat(full / self.extent.max_length().max(MIN_AXIS_LENGTH)),
        };
        self.scale.z *= self.z_scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_auto_center_and_scale() {
        let t = Transform::new(Extent3D::new(0.0, 10.0, 0.0, 10.0, 0.0, 10.0), AspectType::Auto);
        assert_eq!(t.center(), DVec3::splat(5.0));
        assert_eq!(t.scale(), DVec3::splat(0.2));
        assert_eq!(t.transform_point(DVec3::ZERO), DVec3::splat(-1.0));
        assert_eq!(t.transform_point(DVec3::splat(10.0)), DVec3::splat(1.0));
    }

    #[test]
    fn test_equal_uses_longest_axis() {
        let t = Transform::new(Extent3D::new(0.0, 100.0, 0.0, 50.0, 0.0, 1.0), AspectType::Equal);
        let s = t.scale();
        assert_eq!(s.x, s.y);
        assert_eq!(s.y, s.z);
        assert!((t.transform_point(DVec3::new(100.0, 25.0, 0.5)).x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_z_scale_applied_after_normalization() {
        let mut t = Transform::new(Extent3D::new(0.0, 2.0, 0.0, 2.0, 0.0, 2.0), AspectType::Auto);
        t.set_z_scale(3.0);
        assert_eq!(t.scale().z, 3.0);
        assert_eq!(t.scale().x, 1.0);
    }

    #[test]
    fn test_zero_length_axis_is_finite() {
        let t = Transform::new(Extent3D::new(0.0, 1.0, 0.0, 1.0, 4.0, 4.0), AspectType::Auto);
        assert!(t.scale().is_finite());
    }

    #[test]
    fn test_model_matrix_matches_transform_point() {
        let t = Transform::new(Extent3D::new(-5.0, 15.0, 2.0, 4.0, 0.0, 1000.0), AspectType::Auto);
        let p = DVec3::new(3.0, 3.5, 250.0);
        let a = t.model_matrix().transform_point3(p.as_vec3());
        let b = t.transform_point(p).as_vec3();
        assert!((a - b).length() < 1e-5);
        assert!((t.inverse_point(t.transform_point(p)) - p).length() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_corners_map_to_canonical_cube(
            x0 in -1e4f64..1e4, dx in 1e-3f64..1e4,
            y0 in -1e4f64..1e4, dy in 1e-3f64..1e4,
            z0 in -1e4f64..1e4, dz in 1e-3f64..1e4,
        ) {
            let e = Extent3D::new(x0, x0 + dx, y0, y0 + dy, z0, z0 + dz);
            let auto = Transform::new(e, AspectType::Auto);
            for c in e.corners() {
                let p = auto.transform_point(c);
                prop_assert!((p.abs() - DVec3::ONE).abs().max_element() < 1e-6);
            }

            let equal = Transform::new(e, AspectType::Equal);
            let s = equal.scale();
            prop_assert!((s.x - s.y).abs() < 1e-12 && (s.y - s.z).abs() < 1e-12);
            let mapped: Vec<DVec3> = e.corners().iter().map(|c| equal.transform_point(*c)).collect();
            let max_abs = mapped.iter().map(|p| p.abs().max_element()).fold(0.0, f64::max);
            prop_assert!((max_abs - 1.0).abs() < 1e-6);
        }
    }
}
