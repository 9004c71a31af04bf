//! Height map generation settings
//!
//! Parameters for the default noise-backed height map source: fractal perlin
//! layering, normalization, and the height curve that reshapes raw noise into
//! terrain elevation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};

/// How raw fractal noise is mapped into the `[0, 1]` range.
///
/// `Local` rescales by the min/max observed within one map, which gives full
/// contrast but breaks continuity between neighboring chunks. `Global` divides
/// by an estimate of the maximum possible octave sum so that identical world
/// coordinates always produce identical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    Local,
    Global,
}

/// Fractal perlin noise parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub seed: u64,
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: Vec2,
    pub normalize_mode: NormalizeMode,
}

impl NoiseSettings {
    pub fn validate(&self) -> TerrainResult<()> {
        if !(self.scale > 0.0) {
            return Err(TerrainError::InvalidNoiseSettings {
                reason: format!("scale {} is not positive", self.scale),
            });
        }
        if self.octaves == 0 {
            return Err(TerrainError::InvalidNoiseSettings {
                reason: "octaves must be at least 1".to_string(),
            });
        }
        if !(self.persistence > 0.0 && self.persistence <= 1.0) {
            return Err(TerrainError::InvalidNoiseSettings {
                reason: format!("persistence {} is outside (0, 1]", self.persistence),
            });
        }
        if !(self.lacunarity >= 1.0) {
            return Err(TerrainError::InvalidNoiseSettings {
                reason: format!("lacunarity {} is below 1", self.lacunarity),
            });
        }
        Ok(())
    }
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 6,
            persistence: 0.6,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Global,
        }
    }
}

/// One keyframe of a [`HeightCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

/// Piecewise-linear remapping curve applied to normalized noise values.
///
/// Evaluation clamps to the first/last keyframe value outside the keyed
/// range, so a curve keyed on `[0, 1]` stays well defined for any input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightCurve {
    keys: Vec<CurveKey>,
}

impl HeightCurve {
    /// Build a curve from keyframes. Keys are sorted by time.
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Identity curve: `evaluate(t) == t` on `[0, 1]`.
    pub fn linear() -> Self {
        Self::new(vec![
            CurveKey {
                time: 0.0,
                value: 0.0,
            },
            CurveKey {
                time: 1.0,
                value: 1.0,
            },
        ])
    }

    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn validate(&self) -> TerrainResult<()> {
        if self.keys.is_empty() {
            return Err(TerrainError::DegenerateHeightCurve { num_keys: 0 });
        }
        Ok(())
    }

    /// Sample the curve at `t`, clamping outside the keyed range.
    pub fn evaluate(&self, t: f32) -> f32 {
        match self.keys.as_slice() {
            [] => 0.0,
            [only] => only.value,
            keys => {
                let first = keys[0];
                let last = keys[keys.len() - 1];
                if t <= first.time {
                    return first.value;
                }
                if t >= last.time {
                    return last.value;
                }
                // Find the bracketing pair and interpolate.
                for pair in keys.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    if t <= b.time {
                        let span = b.time - a.time;
                        if span <= f32::EPSILON {
                            return b.value;
                        }
                        let s = (t - a.time) / span;
                        return a.value + (b.value - a.value) * s;
                    }
                }
                last.value
            }
        }
    }
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

/// Complete height map generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightMapSettings {
    pub height_multiplier: f32,
    pub use_falloff: bool,
    pub noise: NoiseSettings,
    pub height_curve: HeightCurve,
}

impl HeightMapSettings {
    /// Lowest elevation the settings can produce.
    pub fn min_height(&self) -> f32 {
        self.height_multiplier * self.height_curve.evaluate(0.0)
    }

    /// Highest elevation the settings can produce.
    pub fn max_height(&self) -> f32 {
        self.height_multiplier * self.height_curve.evaluate(1.0)
    }

    pub fn validate(&self) -> TerrainResult<()> {
        self.noise.validate()?;
        self.height_curve.validate()?;
        Ok(())
    }
}

impl Default for HeightMapSettings {
    fn default() -> Self {
        Self {
            height_multiplier: 40.0,
            use_falloff: false,
            noise: NoiseSettings::default(),
            height_curve: HeightCurve::linear(),
        }
    }
}
