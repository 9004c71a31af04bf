//! Fractal perlin sampling
//!
//! Layers seeded perlin octaves into a square noise grid. Per-octave sample
//! offsets come from a PRNG seeded with the noise seed, so the same settings
//! and sampling origin always reproduce the same grid.

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::settings::{NoiseSettings, NormalizeMode};

/// Generate a row-major `size x size` fractal noise grid sampled around
/// `sample_center` (grid units). Values land in `[0, 1]` after normalization.
pub fn generate_noise_map(size: usize, settings: &NoiseSettings, sample_center: Vec2) -> Vec<f32> {
    let perlin = Perlin::new(settings.seed as u32);
    let mut rng = StdRng::seed_from_u64(settings.seed);

    let mut octave_offsets = Vec::with_capacity(settings.octaves as usize);
    let mut max_possible_height = 0.0_f32;
    let mut amplitude = 1.0_f32;
    for _ in 0..settings.octaves {
        let offset_x = rng.gen_range(-100_000.0..100_000.0_f32) + settings.offset.x + sample_center.x;
        let offset_y = rng.gen_range(-100_000.0..100_000.0_f32) - settings.offset.y - sample_center.y;
        octave_offsets.push(Vec2::new(offset_x, offset_y));
        max_possible_height += amplitude;
        amplitude *= settings.persistence;
    }

    let half = size as f32 / 2.0;
    let mut values = vec![0.0_f32; size * size];
    let mut min_noise = f32::MAX;
    let mut max_noise = f32::MIN;

    for y in 0..size {
        for x in 0..size {
            let mut amplitude = 1.0_f32;
            let mut frequency = 1.0_f32;
            let mut noise_height = 0.0_f32;

            for offset in &octave_offsets {
                let sample_x = (x as f32 - half + offset.x) / settings.scale * frequency;
                let sample_y = (y as f32 - half + offset.y) / settings.scale * frequency;
                let sample = perlin.get([sample_x as f64, sample_y as f64]) as f32;
                noise_height += sample * amplitude;
                amplitude *= settings.persistence;
                frequency *= settings.lacunarity;
            }

            min_noise = min_noise.min(noise_height);
            max_noise = max_noise.max(noise_height);
            values[y * size + x] = noise_height;
        }
    }

    match settings.normalize_mode {
        NormalizeMode::Local => {
            let range = (max_noise - min_noise).max(f32::EPSILON);
            for value in &mut values {
                *value = (*value - min_noise) / range;
            }
        }
        NormalizeMode::Global => {
            // Octave sums rarely reach their theoretical extreme, so the
            // divisor is contracted to keep usable contrast.
            let limit = 2.0 * max_possible_height / 1.75;
            for value in &mut values {
                *value = ((*value + 1.0) / limit).max(0.0);
            }
        }
    }

    values
}
