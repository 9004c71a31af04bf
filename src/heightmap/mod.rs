//! Height fields and their providers
//!
//! A [`HeightMap`] is an immutable square grid of elevation samples, produced
//! once per chunk by a [`HeightMapSource`] and consumed read-only by the mesh
//! builder. The default source layers fractal perlin noise and reshapes it
//! through the configured height curve; anything deterministic that fills a
//! grid can stand in for it.

mod falloff;
mod noise_map;

pub use falloff::generate_falloff_map;
pub use noise_map::generate_noise_map;

use glam::Vec2;

use crate::settings::HeightMapSettings;

/// Immutable square grid of elevation samples with its observed range.
#[derive(Debug, Clone)]
pub struct HeightMap {
    size: usize,
    values: Vec<f32>,
    min_value: f32,
    max_value: f32,
}

impl HeightMap {
    /// Wrap a row-major `size x size` grid, scanning it for min/max.
    ///
    /// `values.len()` must equal `size * size`.
    pub fn from_values(size: usize, values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), size * size);
        let mut min_value = f32::MAX;
        let mut max_value = f32::MIN;
        for &value in &values {
            min_value = min_value.min(value);
            max_value = max_value.max(value);
        }
        Self {
            size,
            values,
            min_value,
            max_value,
        }
    }

    /// A grid holding `value` everywhere.
    pub fn constant(size: usize, value: f32) -> Self {
        Self {
            size,
            values: vec![value; size * size],
            min_value: value,
            max_value: value,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.size + x]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    pub fn max_value(&self) -> f32 {
        self.max_value
    }
}

/// Provider of per-chunk height grids.
///
/// Must be deterministic for identical parameters and callable off the
/// per-frame path; chunk requests run it on worker threads.
pub trait HeightMapSource: Send + Sync {
    /// Produce the `size x size` grid for the chunk whose sampling origin is
    /// `sample_center` (in grid units, not world units).
    fn generate(&self, size: usize, sample_center: Vec2) -> HeightMap;
}

/// Default source: fractal perlin noise shaped by the height curve and
/// multiplier, with optional falloff toward the patch border.
pub struct NoiseHeightMapSource {
    settings: HeightMapSettings,
}

impl NoiseHeightMapSource {
    pub fn new(settings: HeightMapSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &HeightMapSettings {
        &self.settings
    }
}

impl HeightMapSource for NoiseHeightMapSource {
    fn generate(&self, size: usize, sample_center: Vec2) -> HeightMap {
        let mut values = generate_noise_map(size, &self.settings.noise, sample_center);

        if self.settings.use_falloff {
            let falloff = generate_falloff_map(size);
            for (value, drop) in values.iter_mut().zip(&falloff) {
                *value = (*value - drop).clamp(0.0, 1.0);
            }
        }

        for value in &mut values {
            *value *= self.settings.height_curve.evaluate(*value) * self.settings.height_multiplier;
        }

        HeightMap::from_values(size, values)
    }
}

/// Source producing a flat field; handy for tests and drivers that want
/// geometry without noise.
pub struct ConstantHeightMapSource {
    pub height: f32,
}

impl HeightMapSource for ConstantHeightMapSource {
    fn generate(&self, size: usize, _sample_center: Vec2) -> HeightMap {
        HeightMap::constant(size, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{HeightCurve, NoiseSettings, NormalizeMode};

    #[test]
    fn test_height_map_tracks_min_max() {
        let map = HeightMap::from_values(2, vec![1.0, -3.0, 7.5, 0.0]);
        assert_eq!(map.min_value(), -3.0);
        assert_eq!(map.max_value(), 7.5);
        assert_eq!(map.get(1, 1), 0.0);
    }

    #[test]
    fn test_noise_source_is_deterministic() {
        let source = NoiseHeightMapSource::new(HeightMapSettings::default());
        let a = source.generate(24, Vec2::new(96.0, 96.0));
        let b = source.generate(24, Vec2::new(96.0, 96.0));
        assert_eq!(a.values(), b.values());
    }

    #[test]
    fn test_curve_and_multiplier_shape_heights() {
        // Identity curve squares the normalized value before the multiplier.
        let settings = HeightMapSettings {
            noise: NoiseSettings {
                normalize_mode: NormalizeMode::Local,
                ..NoiseSettings::default()
            },
            height_multiplier: 2.0,
            height_curve: HeightCurve::linear(),
            use_falloff: false,
        };
        let source = NoiseHeightMapSource::new(settings.clone());
        let raw = generate_noise_map(16, &settings.noise, Vec2::ZERO);
        let shaped = source.generate(16, Vec2::ZERO);

        for (value, expected_base) in shaped.values().iter().zip(&raw) {
            let expected = expected_base * expected_base * 2.0;
            assert!((value - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_falloff_flattens_borders() {
        let settings = HeightMapSettings {
            noise: NoiseSettings {
                normalize_mode: NormalizeMode::Local,
                ..NoiseSettings::default()
            },
            use_falloff: true,
            ..HeightMapSettings::default()
        };
        let source = NoiseHeightMapSource::new(settings);
        let map = source.generate(32, Vec2::ZERO);
        // The corner sample sits where falloff is ~1, so it must be flattened.
        assert!(map.get(0, 0).abs() < 1e-3);
    }

    #[test]
    fn test_constant_source_is_flat() {
        let source = ConstantHeightMapSource { height: 5.0 };
        let map = source.generate(8, Vec2::new(123.0, -45.0));
        assert_eq!(map.min_value(), 5.0);
        assert_eq!(map.max_value(), 5.0);
    }
}
