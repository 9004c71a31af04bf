//! Chunk footprint bounds

use glam::Vec2;

/// Axis-aligned rectangle, used as a chunk's world-space footprint.
///
/// Distance queries measure to the rectangle itself: zero anywhere inside,
/// edge-normal distance beside it, corner distance diagonally past it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub center: Vec2,
    pub extents: Vec2,
}

impl Bounds2 {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            extents: size / 2.0,
        }
    }

    /// Squared distance from `point` to the rectangle, zero inside it.
    pub fn sqr_distance(&self, point: Vec2) -> f32 {
        let delta = ((point - self.center).abs() - self.extents).max(Vec2::ZERO);
        delta.length_squared()
    }

    pub fn distance(&self, point: Vec2) -> f32 {
        self.sqr_distance(point).sqrt()
    }
}
