//! Mesh data assembly
//!
//! [`MeshData`] accumulates the vertices and triangles the generator emits,
//! keeping the renderable mesh separate from the out-of-mesh skirt that only
//! exists to feed border normals. `into_mesh` bakes normals (or flat-shades)
//! and produces the final [`TerrainMesh`].

use glam::{Vec2, Vec3};

use super::{expected_triangle_count, expected_vertex_count};

/// Interleaved GPU-ready vertex layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Finished terrain mesh for one (chunk, lod) pair.
///
/// Positions are local to the chunk center; the renderer translates by the
/// chunk's world position. `normals` is `None` exactly when the mesh was
/// flat-shaded (every triangle owns three unique vertices).
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<Vec3>>,
}

impl TerrainMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Assemble the interleaved vertex buffer. Flat-shaded meshes get their
    /// per-face normals computed here, since each triangle owns its vertices.
    pub fn vertex_buffer(&self) -> Vec<Vertex> {
        let normals = match &self.normals {
            Some(normals) => normals.clone(),
            None => self.face_normals(),
        };
        self.positions
            .iter()
            .zip(&normals)
            .zip(&self.uvs)
            .map(|((position, normal), uv)| Vertex {
                position: position.to_array(),
                normal: normal.to_array(),
                uv: uv.to_array(),
            })
            .collect()
    }

    fn face_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for triangle in self.indices.chunks_exact(3) {
            let (a, b, c) = (
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            );
            let normal = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a])
                .normalize_or_zero();
            normals[a] = normal;
            normals[b] = normal;
            normals[c] = normal;
        }
        normals
    }
}

/// Seam bookkeeping for one edge-connection vertex: which two main vertices
/// bracket it and how far along it sits.
pub(crate) struct EdgeConnection {
    pub vertex_index: i32,
    pub main_vertex_a: i32,
    pub main_vertex_b: i32,
    pub dst_percent_a_to_b: f32,
}

/// Accumulator the mesh generator writes into.
///
/// Negative vertex indices address the out-of-mesh skirt; triangles touching
/// it are routed to a side buffer used only during normal accumulation.
pub(crate) struct MeshData {
    flat_shading: bool,
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    triangles: Vec<u32>,
    out_of_mesh_vertices: Vec<Vec3>,
    out_of_mesh_triangles: Vec<i32>,
    edge_connections: Vec<EdgeConnection>,
}

impl MeshData {
    pub fn new(num_verts_per_line: u32, lod: u32, flat_shading: bool) -> Self {
        let n = num_verts_per_line;
        let num_vertices = expected_vertex_count(n, lod);
        let num_triangles = expected_triangle_count(n, lod);

        Self {
            flat_shading,
            vertices: vec![Vec3::ZERO; num_vertices],
            uvs: vec![Vec2::ZERO; num_vertices],
            triangles: Vec::with_capacity(num_triangles * 3),
            out_of_mesh_vertices: vec![Vec3::ZERO; (n * 4 - 4) as usize],
            out_of_mesh_triangles: Vec::with_capacity((24 * (n - 2)) as usize),
            edge_connections: Vec::new(),
        }
    }

    pub fn add_vertex(&mut self, position: Vec3, uv: Vec2, vertex_index: i32) {
        if vertex_index < 0 {
            self.out_of_mesh_vertices[(-vertex_index - 1) as usize] = position;
        } else {
            self.vertices[vertex_index as usize] = position;
            self.uvs[vertex_index as usize] = uv;
        }
    }

    pub fn add_triangle(&mut self, a: i32, b: i32, c: i32) {
        if a < 0 || b < 0 || c < 0 {
            self.out_of_mesh_triangles.extend([a, b, c]);
        } else {
            self.triangles.extend([a as u32, b as u32, c as u32]);
        }
    }

    pub fn declare_edge_connection(&mut self, edge: EdgeConnection) {
        self.edge_connections.push(edge);
    }

    /// Finalize: flat-shade or bake smooth normals and stitch the seams.
    pub fn into_mesh(mut self) -> TerrainMesh {
        if self.flat_shading {
            self.flat_shade();
            TerrainMesh {
                positions: self.vertices,
                uvs: self.uvs,
                indices: self.triangles,
                normals: None,
            }
        } else {
            let mut normals = self.calculate_normals();
            self.stitch_edge_connection_normals(&mut normals);
            TerrainMesh {
                positions: self.vertices,
                uvs: self.uvs,
                indices: self.triangles,
                normals: Some(normals),
            }
        }
    }

    fn point(&self, index: i32) -> Vec3 {
        if index < 0 {
            self.out_of_mesh_vertices[(-index - 1) as usize]
        } else {
            self.vertices[index as usize]
        }
    }

    /// Accumulate unnormalized face normals over renderable and out-of-mesh
    /// triangles, then normalize per vertex. Out-of-mesh contributions keep
    /// border normals consistent with the geometry just outside the chunk.
    fn calculate_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for triangle in self.triangles.chunks_exact(3) {
            let (a, b, c) = (
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            );
            let normal = (self.vertices[b] - self.vertices[a])
                .cross(self.vertices[c] - self.vertices[a]);
            normals[a] += normal;
            normals[b] += normal;
            normals[c] += normal;
        }

        for triangle in self.out_of_mesh_triangles.chunks_exact(3) {
            let normal = (self.point(triangle[1]) - self.point(triangle[0]))
                .cross(self.point(triangle[2]) - self.point(triangle[0]));
            for &index in triangle {
                if index >= 0 {
                    normals[index as usize] += normal;
                }
            }
        }

        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        normals
    }

    /// Replace each edge-connection vertex's normal with the interpolation of
    /// its bracketing main vertices' normals, so shading stays smooth across
    /// the stitch. An out-of-range index here is a generator bug: reported
    /// and skipped, never fatal.
    fn stitch_edge_connection_normals(&self, normals: &mut [Vec3]) {
        let len = normals.len() as i32;
        for edge in &self.edge_connections {
            let in_range = (0..len).contains(&edge.vertex_index)
                && (0..len).contains(&edge.main_vertex_a)
                && (0..len).contains(&edge.main_vertex_b);
            if !in_range {
                log::warn!(
                    "edge connection vertex {} references main vertices {}/{} outside buffer of {}; skipping",
                    edge.vertex_index,
                    edge.main_vertex_a,
                    edge.main_vertex_b,
                    len
                );
                continue;
            }
            let normal_a = normals[edge.main_vertex_a as usize];
            let normal_b = normals[edge.main_vertex_b as usize];
            normals[edge.vertex_index as usize] =
                normal_a * (1.0 - edge.dst_percent_a_to_b) + normal_b * edge.dst_percent_a_to_b;
        }
    }

    /// Expand the buffers so every triangle owns three unique vertices and
    /// renumber the indices sequentially.
    fn flat_shade(&mut self) {
        let mut flat_vertices = Vec::with_capacity(self.triangles.len());
        let mut flat_uvs = Vec::with_capacity(self.triangles.len());
        for (i, index) in self.triangles.iter_mut().enumerate() {
            flat_vertices.push(self.vertices[*index as usize]);
            flat_uvs.push(self.uvs[*index as usize]);
            *index = i as u32;
        }
        self.vertices = flat_vertices;
        self.uvs = flat_uvs;
    }
}
