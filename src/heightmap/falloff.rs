//! Square falloff map
//!
//! Fades heights toward zero near the map border so a single patch reads as
//! an island. Streaming grids leave this off; it only makes sense for a
//! standalone map.

/// Generate a row-major `size x size` falloff grid in `[0, 1]`, zero at the
/// center and one at the border.
pub fn generate_falloff_map(size: usize) -> Vec<f32> {
    let mut values = vec![0.0_f32; size * size];
    for y in 0..size {
        for x in 0..size {
            let sample_x = x as f32 / size as f32 * 2.0 - 1.0;
            let sample_y = y as f32 / size as f32 * 2.0 - 1.0;
            let value = sample_x.abs().max(sample_y.abs());
            values[y * size + x] = falloff_curve(value);
        }
    }
    values
}

fn falloff_curve(value: f32) -> f32 {
    const A: f32 = 3.0;
    const B: f32 = 2.2;
    let num = value.powf(A);
    num / (num + (B - B * value).powf(A))
}
