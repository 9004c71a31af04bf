//! Mesh resolution and LOD ladder settings

use serde::{Deserialize, Serialize};

/// Number of LOD tiers the mesh builder supports (lod 0 through 4).
pub const NUM_SUPPORTED_LODS: u32 = 5;

/// Interior vertex stride for a LOD level.
///
/// LOD 0 keeps every interior vertex; LOD n skips to every `2n`-th.
pub fn skip_increment(lod: u32) -> u32 {
    if lod == 0 {
        1
    } else {
        lod * 2
    }
}

/// One entry of the ordered LOD ladder: the mesh resolution to use up to
/// `visible_dst_threshold` world units from the viewer. The last entry's
/// threshold is the chunk's maximum view distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodInfo {
    pub lod: u32,
    pub visible_dst_threshold: f32,
}

impl LodInfo {
    pub fn sqr_visible_dst_threshold(&self) -> f32 {
        self.visible_dst_threshold * self.visible_dst_threshold
    }
}

/// Geometric layout shared by every chunk.
///
/// `num_verts_per_line` counts the full sample grid per side, including the
/// out-of-mesh ring used only for border normals. All chunks use the same
/// value; only their sampling origin differs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    pub num_verts_per_line: u32,
    pub mesh_scale: f32,
    pub flat_shading: bool,
}

impl MeshSettings {
    /// World-space side length of one chunk. The visible patch spans
    /// `num_verts_per_line - 3` grid cells (the outermost ring is off-mesh
    /// and the next ring sits on the patch border).
    pub fn mesh_world_size(&self) -> f32 {
        (self.num_verts_per_line - 3) as f32 * self.mesh_scale
    }
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            // 101 - 5 = 96 divides the stride of every supported LOD
            num_verts_per_line: 101,
            mesh_scale: 2.5,
            flat_shading: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_increment_ladder() {
        assert_eq!(skip_increment(0), 1);
        assert_eq!(skip_increment(1), 2);
        assert_eq!(skip_increment(4), 8);
    }

    #[test]
    fn test_mesh_world_size_spans_interior_cells() {
        let settings = MeshSettings {
            num_verts_per_line: 11,
            mesh_scale: 2.0,
            flat_shading: false,
        };
        assert_eq!(settings.mesh_world_size(), 16.0);
    }

    #[test]
    fn test_default_supports_every_lod_stride() {
        let settings = MeshSettings::default();
        for lod in 0..NUM_SUPPORTED_LODS {
            assert_eq!((settings.num_verts_per_line - 5) % skip_increment(lod), 0);
        }
    }
}
