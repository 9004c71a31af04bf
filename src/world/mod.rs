//! Chunked terrain streaming
//!
//! The streaming layer around the mesh builder: chunks own one cell's height
//! map and cached LOD meshes, and the grid keeps the live set of chunks
//! matched to the viewer's position. Geometry leaves the crate through the
//! [`TerrainSink`] trait; nothing here knows about any renderer.

mod bounds;
mod chunk;
mod chunk_grid;

pub use bounds::Bounds2;
pub use chunk::{ChunkCoord, ChunkState, TerrainChunk, TerrainSink, VisibilityListener};
pub use chunk_grid::{GridStats, TerrainGrid};
