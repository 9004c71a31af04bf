//! Ridgeline - continuous LOD terrain streaming
//!
//! Procedurally generates a seamless multi-resolution terrain surface from a
//! noise-based height field and streams chunk geometry in and out as a viewer
//! moves through the world.
//!
//! The crate has three layers:
//!
//! - [`heightmap`]: height field providers. The default layers seeded fractal
//!   perlin noise and reshapes it with a height curve; any deterministic
//!   [`HeightMapSource`] can replace it.
//! - [`meshing`]: the mesh builder. Converts one height map into an indexed
//!   triangle mesh at a given LOD, stitching full-resolution borders to the
//!   coarser interior so neighboring chunks at different LODs meet without
//!   cracks.
//! - [`world`]: chunk lifecycle and streaming. [`TerrainGrid`] spawns and
//!   retires chunks around the viewer and drives per-update LOD selection;
//!   geometry reaches the embedder through the [`TerrainSink`] trait.
//!
//! The crate never owns a frame loop or an engine object. An external driver
//! calls [`TerrainGrid::update`] with the viewer position, and background
//! work runs on whatever [`TaskScheduler`] the embedder injects.

pub mod error;
pub mod heightmap;
pub mod meshing;
pub mod settings;
pub mod tasks;
pub mod world;

pub use error::{TerrainError, TerrainResult};
pub use heightmap::{HeightMap, HeightMapSource, NoiseHeightMapSource};
pub use meshing::{generate_terrain_mesh, TerrainMesh, Vertex};
pub use settings::{
    HeightMapSettings, LodInfo, MeshSettings, NoiseSettings, TerrainConfig, NUM_SUPPORTED_LODS,
};
pub use tasks::{InlineScheduler, TaskScheduler, WorkerPool};
pub use world::{ChunkCoord, ChunkState, GridStats, TerrainChunk, TerrainGrid, TerrainSink};
