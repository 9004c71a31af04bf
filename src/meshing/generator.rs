//! Terrain mesh generation
//!
//! Converts one height map into a seam-stitched triangle mesh at a given
//! LOD. Every grid position falls into exactly one class:
//!
//! - out-of-mesh: the outermost ring, present only so border triangles have
//!   neighbors to accumulate normals from
//! - mesh edge: the second ring, emitted at full resolution at every LOD
//! - edge connection: the third ring's off-stride positions, interpolated
//!   between their bracketing main vertices so the coarse interior meets the
//!   full-resolution edge without cracks
//! - main: stride-aligned interior positions, the actual LOD geometry
//! - skipped: everything else, absent from the buffers entirely
//!
//! Ring positions depend only on the grid index and patch size, never on the
//! stride, so neighboring chunks at different LODs line up along their shared
//! border.

use glam::{Vec2, Vec3};

use crate::heightmap::HeightMap;
use crate::settings::{skip_increment, MeshSettings};

use super::mesh_data::{EdgeConnection, MeshData};
use super::TerrainMesh;

/// Build the mesh for one height map at `lod`.
///
/// `height_map.size()` must equal `settings.num_verts_per_line`; the grid
/// validates that combination (together with stride divisibility) once at
/// startup, so it is a debug assertion here rather than a runtime error.
pub fn generate_terrain_mesh(
    height_map: &HeightMap,
    settings: &MeshSettings,
    lod: u32,
) -> TerrainMesh {
    let n = settings.num_verts_per_line as i32;
    let skip = skip_increment(lod) as i32;
    debug_assert_eq!(height_map.size(), n as usize);

    let mesh_world_size = settings.mesh_world_size();
    let top_left = Vec2::new(-1.0, 1.0) * mesh_world_size / 2.0;

    let mut mesh_data = MeshData::new(settings.num_verts_per_line, lod, settings.flat_shading);

    // First pass: assign buffer indices. The out-of-mesh ring counts down
    // through negatives, everything else counts up in scan order.
    let mut vertex_indices = vec![0_i32; (n * n) as usize];
    let mut mesh_vertex_index = 0_i32;
    let mut out_of_mesh_vertex_index = -1_i32;
    for y in 0..n {
        for x in 0..n {
            let out_of_mesh = y == 0 || y == n - 1 || x == 0 || x == n - 1;
            if out_of_mesh {
                vertex_indices[(y * n + x) as usize] = out_of_mesh_vertex_index;
                out_of_mesh_vertex_index -= 1;
            } else if !is_skipped(x, y, n, skip) {
                vertex_indices[(y * n + x) as usize] = mesh_vertex_index;
                mesh_vertex_index += 1;
            }
        }
    }

    // Second pass: emit vertices and triangles.
    for y in 0..n {
        for x in 0..n {
            if is_skipped(x, y, n, skip) {
                continue;
            }

            let out_of_mesh = y == 0 || y == n - 1 || x == 0 || x == n - 1;
            let mesh_edge = (y == 1 || y == n - 2 || x == 1 || x == n - 2) && !out_of_mesh;
            let main = (x - 2) % skip == 0
                && (y - 2) % skip == 0
                && !out_of_mesh
                && !mesh_edge;
            let edge_connection = (y == 2 || y == n - 3 || x == 2 || x == n - 3)
                && !out_of_mesh
                && !mesh_edge
                && !main;

            let vertex_index = vertex_indices[(y * n + x) as usize];
            let percent = Vec2::new((x - 1) as f32, (y - 1) as f32) / (n - 3) as f32;
            let position_2d = top_left + Vec2::new(percent.x, -percent.y) * mesh_world_size;
            let mut height = height_map.get(x as usize, y as usize);

            if edge_connection {
                // Interpolate between the two bracketing main vertices along
                // this ring; this is what closes the seam.
                let vertical = x == 2 || x == n - 3;
                let dst_to_main_a = (if vertical { y - 2 } else { x - 2 }) % skip;
                let dst_to_main_b = skip - dst_to_main_a;
                let dst_percent = dst_to_main_a as f32 / skip as f32;

                let (ax, ay) = if vertical {
                    (x, y - dst_to_main_a)
                } else {
                    (x - dst_to_main_a, y)
                };
                let (bx, by) = if vertical {
                    (x, y + dst_to_main_b)
                } else {
                    (x + dst_to_main_b, y)
                };

                let height_a = height_map.get(ax as usize, ay as usize);
                let height_b = height_map.get(bx as usize, by as usize);
                height = height_a * (1.0 - dst_percent) + height_b * dst_percent;

                mesh_data.declare_edge_connection(EdgeConnection {
                    vertex_index,
                    main_vertex_a: vertex_indices[(ay * n + ax) as usize],
                    main_vertex_b: vertex_indices[(by * n + bx) as usize],
                    dst_percent_a_to_b: dst_percent,
                });
            }

            mesh_data.add_vertex(
                Vec3::new(position_2d.x, height, position_2d.y),
                percent,
                vertex_index,
            );

            // Edge-connection vertices on the top/left stitch ring never own
            // a quad; their neighbors cover that cell.
            let creates_triangle =
                x < n - 1 && y < n - 1 && (!edge_connection || (x != 2 && y != 2));
            if creates_triangle {
                // Border quads stay single-cell so the stitch closes cleanly.
                let current_increment = if main && x != n - 3 && y != n - 3 {
                    skip
                } else {
                    1
                };

                let a = vertex_indices[(y * n + x) as usize];
                let b = vertex_indices[(y * n + x + current_increment) as usize];
                let c = vertex_indices[((y + current_increment) * n + x) as usize];
                let d = vertex_indices[((y + current_increment) * n + x + current_increment) as usize];
                mesh_data.add_triangle(a, d, c);
                mesh_data.add_triangle(d, a, b);
            }
        }
    }

    mesh_data.into_mesh()
}

fn is_skipped(x: i32, y: i32, n: i32, skip: i32) -> bool {
    x > 2 && x < n - 3 && y > 2 && y < n - 3 && ((x - 2) % skip != 0 || (y - 2) % skip != 0)
}

#[cfg(test)]
mod tests {
    use super::super::{expected_triangle_count, expected_vertex_count};
    use super::*;

    fn settings(num_verts_per_line: u32, flat_shading: bool) -> MeshSettings {
        MeshSettings {
            num_verts_per_line,
            mesh_scale: 2.0,
            flat_shading,
        }
    }

    fn ramp_height_map(size: usize) -> HeightMap {
        // Height linear in x: edge-connection interpolation reproduces it.
        let mut values = vec![0.0_f32; size * size];
        for y in 0..size {
            for x in 0..size {
                values[y * size + x] = x as f32 * 3.0;
            }
        }
        HeightMap::from_values(size, values)
    }

    #[test]
    fn test_vertex_and_triangle_counts_full_resolution() {
        let settings = settings(11, false);
        let mesh = generate_terrain_mesh(&HeightMap::constant(11, 0.0), &settings, 0);
        assert_eq!(mesh.vertex_count(), expected_vertex_count(11, 0));
        assert_eq!(mesh.triangle_count(), expected_triangle_count(11, 0));
        // Full resolution of an 11-line grid: a 9x9 vertex patch.
        assert_eq!(mesh.vertex_count(), 81);
        assert_eq!(mesh.triangle_count(), 128);
    }

    #[test]
    fn test_vertex_and_triangle_counts_with_stride() {
        let settings = settings(13, false);
        let mesh = generate_terrain_mesh(&HeightMap::constant(13, 0.0), &settings, 1);
        assert_eq!(mesh.vertex_count(), expected_vertex_count(13, 1));
        assert_eq!(mesh.triangle_count(), expected_triangle_count(13, 1));
        // 40 edge + 16 connection + 25 main vertices, 72 edge + 32 main triangles.
        assert_eq!(mesh.vertex_count(), 81);
        assert_eq!(mesh.triangle_count(), 104);
    }

    #[test]
    fn test_counts_at_production_resolution() {
        let settings = settings(245, false);
        let map = HeightMap::constant(245, 0.0);
        for lod in [0, 4] {
            let mesh = generate_terrain_mesh(&map, &settings, lod);
            assert_eq!(mesh.vertex_count(), expected_vertex_count(245, lod));
            assert_eq!(mesh.triangle_count(), expected_triangle_count(245, lod));
        }
    }

    #[test]
    fn test_all_indices_in_range() {
        let settings = settings(13, false);
        let mesh = generate_terrain_mesh(&ramp_height_map(13), &settings, 2);
        let len = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|index| *index < len));
    }

    #[test]
    fn test_border_ring_positions_identical_across_lods() {
        let settings = settings(13, false);
        let map = ramp_height_map(13);
        let fine = generate_terrain_mesh(&map, &settings, 0);
        let coarse = generate_terrain_mesh(&map, &settings, 2);

        // The mesh-edge ring is exactly the vertices whose uv touches 0 or 1.
        let ring = |mesh: &TerrainMesh| {
            let mut ring: Vec<[u32; 3]> = mesh
                .positions
                .iter()
                .zip(&mesh.uvs)
                .filter(|(_, uv)| {
                    uv.x == 0.0 || uv.y == 0.0 || uv.x == 1.0 || uv.y == 1.0
                })
                .map(|(p, _)| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()])
                .collect();
            ring.sort_unstable();
            ring
        };
        assert_eq!(ring(&fine), ring(&coarse));
    }

    #[test]
    fn test_adjacent_chunks_share_border_vertices() {
        // Two neighboring chunks at different LODs: their shared mesh-edge
        // columns must land on bit-identical world positions. The height
        // source samples a function of the absolute grid coordinate, the way
        // chunk sampling origins compose in the streaming layer.
        let n = 13_u32;
        let settings = settings(n, false);
        let world_size = settings.mesh_world_size();

        let sampled = |sample_center: Vec2| {
            let size = n as usize;
            let mut values = vec![0.0_f32; size * size];
            for y in 0..size {
                for x in 0..size {
                    let gx = sample_center.x + x as f32;
                    let gy = sample_center.y + y as f32;
                    values[y * size + x] = (gx * 0.37).sin() * 5.0 + (gy * 0.21).cos() * 3.0;
                }
            }
            HeightMap::from_values(size, values)
        };

        // Chunk (0,0) and chunk (1,0); sample centers are one interior span
        // apart, exactly as `TerrainChunk::new` computes them.
        let span = (n - 3) as f32;
        let left = generate_terrain_mesh(&sampled(Vec2::ZERO), &settings, 0);
        let right = generate_terrain_mesh(&sampled(Vec2::new(span, 0.0)), &settings, 2);

        let column = |mesh: &TerrainMesh, edge_u: f32, world_offset_x: f32| {
            let mut column: Vec<[u32; 3]> = mesh
                .positions
                .iter()
                .zip(&mesh.uvs)
                .filter(|(_, uv)| uv.x == edge_u)
                .map(|(p, _)| {
                    [
                        (p.x + world_offset_x).to_bits(),
                        p.y.to_bits(),
                        p.z.to_bits(),
                    ]
                })
                .collect();
            column.sort_unstable();
            column
        };

        let shared_from_left = column(&left, 1.0, 0.0);
        let shared_from_right = column(&right, 0.0, world_size);
        assert!(!shared_from_left.is_empty());
        assert_eq!(shared_from_left, shared_from_right);
    }

    #[test]
    fn test_edge_connection_heights_follow_bracketing_mains() {
        // On a height field linear in x, every horizontal stitch interpolation
        // lands exactly on the line, so each vertex's height equals the ramp
        // at its x position. Verify via uv -> grid x.
        let n = 13;
        let settings = settings(n, false);
        let mesh = generate_terrain_mesh(&ramp_height_map(n as usize), &settings, 2);
        for (position, uv) in mesh.positions.iter().zip(&mesh.uvs) {
            let grid_x = uv.x * (n - 3) as f32 + 1.0;
            assert!(
                (position.y - grid_x * 3.0).abs() < 1e-3,
                "vertex at uv {uv:?} has height {} instead of {}",
                position.y,
                grid_x * 3.0
            );
        }
    }

    #[test]
    fn test_flat_height_field_yields_flat_plane() {
        let settings = settings(11, false);
        let mesh = generate_terrain_mesh(&HeightMap::constant(11, 5.0), &settings, 0);
        assert!(mesh.positions.iter().all(|p| p.y == 5.0));
        let normals = mesh.normals.as_ref().expect("smooth mesh has normals");
        for normal in normals {
            assert!((*normal - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_flat_shading_triples_vertices() {
        let settings = settings(11, true);
        let mesh = generate_terrain_mesh(&HeightMap::constant(11, 1.0), &settings, 0);
        assert_eq!(mesh.vertex_count(), mesh.indices.len());
        assert_eq!(mesh.vertex_count(), 3 * mesh.triangle_count());
        assert!(mesh.normals.is_none());
        for triangle in mesh.indices.chunks_exact(3) {
            assert!(triangle[0] != triangle[1]);
            assert!(triangle[1] != triangle[2]);
            assert!(triangle[0] != triangle[2]);
        }
    }

    #[test]
    fn test_uvs_span_unit_square() {
        let settings = settings(11, false);
        let mesh = generate_terrain_mesh(&HeightMap::constant(11, 0.0), &settings, 0);
        for uv in &mesh.uvs {
            assert!((0.0..=1.0).contains(&uv.x));
            assert!((0.0..=1.0).contains(&uv.y));
        }
    }
}
