//! Scene lighting.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A single light in eye space with Phong-like terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    pub enabled: bool,
    /// Light position in eye space. `w == 0` makes it directional.
    pub position: Vec4,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            enabled: false,
            position: Vec4::new(0.0, 0.0, 1.0, 0.0),
            ambient: 0.2,
            diffuse: 0.8,
            specular: 0.3,
            shininess: 50.0,
        }
    }
}

impl Lighting {
    /// Enabled light with default terms.
    #[must_use]
    pub fn on() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Shades a surface color given an eye-space normal and position.
    ///
    /// Returns `color` unchanged when lighting is disabled. Alpha is kept.
    #[must_use]
    pub fn shade(&self, color: Vec4, normal_eye: Vec3, position_eye: Vec3) -> Vec4 {
        if !self.enabled {
            return color;
        }
        let n = normal_eye.normalize_or_zero();
        if n == Vec3::ZERO {
            return color;
        }
        let l = if self.position.w == 0.0 {
            self.position.truncate().normalize_or_zero()
        } else {
            (self.position.truncate() / self.position.w - position_eye).normalize_or_zero()
        };
        // Two-sided: flip normals facing away from the viewer.
        let view = (-position_eye).normalize_or(Vec3::Z);
        let n = if n.dot(view) < 0.0 { -n } else { n };

        let diffuse = n.dot(l).max(0.0);
        let specular = if diffuse > 0.0 {
            let h = (l + view).normalize_or_zero();
            n.dot(h).max(0.0).powf(self.shininess)
        } else {
            0.0
        };
        let rgb = color.truncate() * (self.ambient + self.diffuse * diffuse) + Vec3::splat(self.specular * specular);
        rgb.clamp(Vec3::ZERO, Vec3::ONE).extend(color.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_passthrough() {
        let c = Vec4::new(0.3, 0.4, 0.5, 0.6);
        assert_eq!(Lighting::default().shade(c, Vec3::Z, Vec3::ZERO), c);
    }

    #[test]
    fn test_facing_light_is_brighter() {
        let light = Lighting::on();
        let c = Vec4::new(0.5, 0.5, 0.5, 1.0);
        let eye = Vec3::new(0.0, 0.0, -5.0);
        let lit = light.shade(c, Vec3::Z, eye);
        let grazing = light.shade(c, Vec3::X, eye);
        assert!(lit.x > grazing.x);
        assert_eq!(lit.w, 1.0);
        assert!(lit.x <= 1.0);
    }

    #[test]
    fn test_back_face_lit_like_front() {
        let light = Lighting::on();
        let c = Vec4::new(0.5, 0.2, 0.1, 1.0);
        let eye = Vec3::new(0.0, 0.0, -5.0);
        let front = light.shade(c, Vec3::Z, eye);
        let back = light.shade(c, -Vec3::Z, eye);
        assert!((front - back).abs().max_element() < 1e-6);
    }
}
