//! Terrain mesh construction
//!
//! Pure data transforms: a height map goes in, an indexed triangle mesh with
//! seam-stitched borders comes out. No engine types and no shared state, so
//! builds can run on any worker thread.

mod generator;
mod mesh_data;

pub use generator::generate_terrain_mesh;
pub use mesh_data::{TerrainMesh, Vertex};

use crate::settings::skip_increment;

/// Exact number of vertices `generate_terrain_mesh` emits for an indexed
/// (smooth-shaded) mesh. Useful for preallocating GPU buffers; flat-shaded
/// meshes hold `3 * expected_triangle_count` vertices instead.
pub fn expected_vertex_count(num_verts_per_line: u32, lod: u32) -> usize {
    let n = num_verts_per_line;
    let skip = skip_increment(lod);
    let num_mesh_edge_vertices = (n - 2) * 4 - 4;
    let num_edge_connection_vertices = (skip - 1) * (n - 5) / skip * 4;
    let num_main_verts_per_line = (n - 5) / skip + 1;
    (num_mesh_edge_vertices + num_edge_connection_vertices + num_main_verts_per_line * num_main_verts_per_line)
        as usize
}

/// Exact number of triangles `generate_terrain_mesh` emits to the renderable
/// index buffer (out-of-mesh skirt triangles excluded).
pub fn expected_triangle_count(num_verts_per_line: u32, lod: u32) -> usize {
    let n = num_verts_per_line;
    let skip = skip_increment(lod);
    let num_mesh_edge_triangles = 8 * (n - 4);
    let num_main_verts_per_line = (n - 5) / skip + 1;
    let num_main_triangles = (num_main_verts_per_line - 1) * (num_main_verts_per_line - 1) * 2;
    (num_mesh_edge_triangles + num_main_triangles) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_form_counts_full_resolution() {
        // 11 lines: 9x9 indexed vertices, (9-1)^2 * 2 triangles.
        assert_eq!(expected_vertex_count(11, 0), 81);
        assert_eq!(expected_triangle_count(11, 0), 128);
    }

    #[test]
    fn test_closed_form_counts_coarse() {
        assert_eq!(expected_vertex_count(13, 1), 81);
        assert_eq!(expected_triangle_count(13, 1), 104);
        // 968 edge + 840 connection + 31^2 main vertices at stride 8.
        assert_eq!(expected_vertex_count(245, 4), 968 + 840 + 961);
    }
}
