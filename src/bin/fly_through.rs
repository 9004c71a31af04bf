//! Headless streaming demo
//!
//! Flies a viewer in a straight line across procedurally generated terrain
//! and logs what the grid streams in and out. Pass a TOML config path as the
//! first argument to override the defaults.
//!
//! ```text
//! RUST_LOG=info cargo run --bin fly_through [terrain.toml]
//! ```

use std::sync::Arc;

use anyhow::Result;
use glam::Vec2;

use ridgeline::{
    ChunkCoord, NoiseHeightMapSource, TerrainConfig, TerrainGrid, TerrainMesh, TerrainSink,
    WorkerPool,
};

#[derive(Default)]
struct CountingSink {
    meshes_swapped: usize,
    colliders_committed: usize,
    visibility_flips: usize,
}

impl TerrainSink for CountingSink {
    fn mesh_updated(&mut self, coord: ChunkCoord, lod: u32, mesh: &TerrainMesh) {
        self.meshes_swapped += 1;
        log::debug!(
            "chunk {coord:?} now displays lod {lod} ({} triangles)",
            mesh.triangle_count()
        );
    }

    fn visibility_changed(&mut self, coord: ChunkCoord, visible: bool) {
        self.visibility_flips += 1;
        log::debug!("chunk {coord:?} visible: {visible}");
    }

    fn collider_ready(&mut self, coord: ChunkCoord, _mesh: &TerrainMesh) {
        self.colliders_committed += 1;
        log::debug!("chunk {coord:?} collider committed");
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => TerrainConfig::from_toml_file(path)?,
        None => TerrainConfig::default(),
    };
    config.validate()?;

    let source = Arc::new(NoiseHeightMapSource::new(config.height.clone()));
    let scheduler = Arc::new(WorkerPool::new(0)?);
    let mut grid = TerrainGrid::new(config, source, scheduler)?;
    let mut sink = CountingSink::default();

    // 60 updates per simulated second at a brisk flying speed.
    let speed = 60.0;
    let dt = 1.0 / 60.0;
    for step in 0..1800 {
        let viewer = Vec2::new(step as f32 * speed * dt, 0.0);
        grid.update(viewer, &mut sink);

        if step % 300 == 0 {
            log::info!("t = {:>5.1}s  viewer x = {:>7.1}  {}", step as f32 * dt, viewer.x, grid.stats());
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    log::info!(
        "done: {} mesh swaps, {} collider commits, {} visibility flips, {}",
        sink.meshes_swapped,
        sink.colliders_committed,
        sink.visibility_flips,
        grid.stats()
    );
    Ok(())
}
