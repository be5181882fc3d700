//! Color maps for continuous legends and volume lookup tables.

use std::collections::HashMap;

use glam::Vec4;

/// A named list of evenly spaced RGBA samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    /// Color map name.
    pub name: String,
    /// Color samples (evenly spaced from 0 to 1).
    pub colors: Vec<Vec4>,
}

impl ColorMap {
    /// Creates a new color map.
    pub fn new(name: impl Into<String>, colors: Vec<Vec4>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    /// Creates an opaque color map from RGB triples.
    pub fn from_rgb(name: impl Into<String>, rgb: &[[f32; 3]]) -> Self {
        Self::new(name, rgb.iter().map(|c| Vec4::new(c[0], c[1], c[2], 1.0)).collect())
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Samples the color map at a given value (0 to 1), interpolating linearly.
    #[must_use]
    pub fn sample(&self, t: f32) -> Vec4 {
        let t = t.clamp(0.0, 1.0);

        if self.colors.is_empty() {
            return Vec4::ZERO;
        }

        if self.colors.len() == 1 {
            return self.colors[0];
        }

        let n = self.colors.len() - 1;
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = ((t * n as f32).floor() as usize).min(n - 1);
        #[allow(clippy::cast_precision_loss)]
        let frac = t * n as f32 - idx as f32;

        self.colors[idx].lerp(self.colors[idx + 1], frac)
    }

    /// Resamples into `n` evenly spaced colors.
    #[must_use]
    pub fn colors(&self, n: usize) -> Vec<Vec4> {
        match n {
            0 => Vec::new(),
            1 => vec![self.sample(0.5)],
            _ => {
                #[allow(clippy::cast_precision_loss)]
                let last = (n - 1) as f32;
                #[allow(clippy::cast_precision_loss)]
                let samples = (0..n).map(|i| self.sample(i as f32 / last)).collect();
                samples
            }
        }
    }

    /// The color map with its samples in reverse order.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut colors = self.colors.clone();
        colors.reverse();
        Self::new(format!("{}_r", self.name), colors)
    }
}

/// Registry of named color maps, pre-populated with the built-ins.
#[derive(Debug, Clone, Default)]
pub struct ColorMapRegistry {
    color_maps: HashMap<String, ColorMap>,
}

impl ColorMapRegistry {
    /// Creates a new color map registry with default color maps.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.register(ColorMap::from_rgb(
            "viridis",
            &[
                [0.267, 0.004, 0.329],
                [0.282, 0.140, 0.457],
                [0.253, 0.265, 0.529],
                [0.206, 0.371, 0.553],
                [0.163, 0.471, 0.558],
                [0.127, 0.566, 0.550],
                [0.134, 0.658, 0.517],
                [0.266, 0.749, 0.440],
                [0.477, 0.821, 0.318],
                [0.741, 0.873, 0.150],
                [0.993, 0.906, 0.144],
            ],
        ));
        self.register(ColorMap::from_rgb(
            "blues",
            &[
                [0.969, 0.984, 1.000],
                [0.871, 0.922, 0.969],
                [0.776, 0.859, 0.937],
                [0.620, 0.792, 0.882],
                [0.419, 0.682, 0.839],
                [0.259, 0.573, 0.776],
                [0.129, 0.443, 0.710],
                [0.031, 0.318, 0.612],
                [0.031, 0.188, 0.420],
            ],
        ));
        self.register(ColorMap::from_rgb(
            "reds",
            &[
                [1.000, 0.961, 0.941],
                [0.996, 0.878, 0.824],
                [0.988, 0.733, 0.631],
                [0.988, 0.573, 0.447],
                [0.984, 0.416, 0.290],
                [0.937, 0.231, 0.173],
                [0.796, 0.094, 0.114],
                [0.647, 0.059, 0.082],
                [0.404, 0.000, 0.051],
            ],
        ));
        self.register(ColorMap::from_rgb(
            "coolwarm",
            &[
                [0.230, 0.299, 0.754],
                [0.552, 0.690, 0.996],
                [0.866, 0.866, 0.866],
                [0.956, 0.604, 0.486],
                [0.706, 0.016, 0.150],
            ],
        ));
        self.register(ColorMap::from_rgb(
            "rainbow",
            &[
                [0.5, 0.0, 1.0],
                [0.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
                [1.0, 0.0, 0.0],
            ],
        ));
        self.register(ColorMap::from_rgb("grayscale", &[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]));
    }

    /// Registers a color map, replacing any map with the same name.
    pub fn register(&mut self, color_map: ColorMap) {
        self.color_maps.insert(color_map.name.clone(), color_map);
    }

    /// Gets a color map by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ColorMap> {
        self.color_maps.get(name)
    }

    /// Returns all color map names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.color_maps.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_endpoints_and_midpoint() {
        let map = ColorMap::from_rgb("bw", &[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        assert_eq!(map.sample(0.0), Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(map.sample(1.0), Vec4::ONE);
        assert!((map.sample(0.5) - Vec4::new(0.5, 0.5, 0.5, 1.0)).length() < 1e-6);
        assert_eq!(map.sample(7.0), Vec4::ONE);
    }

    #[test]
    fn test_resample() {
        let registry = ColorMapRegistry::new();
        let viridis = registry.get("viridis").unwrap();
        let five = viridis.colors(5);
        assert_eq!(five.len(), 5);
        assert!((five[0] - viridis.colors[0]).length() < 1e-6);
        assert!((five[4] - viridis.colors[10]).length() < 1e-6);
        assert_eq!(viridis.reversed().colors[0], viridis.colors[10]);
    }

    #[test]
    fn test_registry_defaults() {
        let registry = ColorMapRegistry::new();
        for name in ["viridis", "blues", "reds", "coolwarm", "rainbow", "grayscale"] {
            assert!(registry.get(name).is_some(), "missing {name}");
        }
        assert_eq!(registry.names().count(), 6);
    }
}
