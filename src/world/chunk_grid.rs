//! Chunk grid management
//!
//! [`TerrainGrid`] keeps the set of live chunks around the viewer: it spawns
//! cells entering view range, retires cells that drift past it, drains
//! completed background work, and drives each chunk's per-update LOD
//! re-evaluation. The grid never owns a frame loop; an external driver calls
//! [`TerrainGrid::update`] with the current viewer position.

use std::fmt;
use std::sync::Arc;

use glam::{IVec2, Vec2};
use rustc_hash::FxHashMap;

use crate::error::TerrainResult;
use crate::heightmap::HeightMapSource;
use crate::settings::TerrainConfig;
use crate::tasks::TaskScheduler;

use super::bounds::Bounds2;
use super::chunk::{ChunkContext, ChunkCoord, ChunkEvent, TerrainChunk, TerrainSink};

/// Streaming statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    pub loaded_chunks: usize,
    pub visible_chunks: usize,
}

impl fmt::Display for GridStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} chunks loaded, {} visible",
            self.loaded_chunks, self.visible_chunks
        )
    }
}

pub struct TerrainGrid {
    config: Arc<TerrainConfig>,
    ctx: ChunkContext,
    events: flume::Receiver<ChunkEvent>,
    chunks: FxHashMap<ChunkCoord, TerrainChunk>,
    viewer_position: Vec2,
    last_sweep_position: Option<Vec2>,
    mesh_world_size: f32,
    chunks_visible_in_view: i32,
    max_view_dst: f32,
}

impl TerrainGrid {
    /// Validate `config` and build an empty grid. No chunks exist until the
    /// first [`update`](Self::update) call.
    pub fn new(
        config: TerrainConfig,
        source: Arc<dyn HeightMapSource>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> TerrainResult<Self> {
        config.validate()?;

        let mesh_world_size = config.mesh.mesh_world_size();
        let max_view_dst = config.max_view_dst();
        let chunks_visible_in_view = (max_view_dst / mesh_world_size).ceil() as i32;
        let (events_tx, events_rx) = flume::unbounded();

        log::info!(
            "terrain grid: cell size {mesh_world_size}, view distance {max_view_dst} \
             ({chunks_visible_in_view} cells)"
        );

        Ok(Self {
            config: Arc::new(config),
            ctx: ChunkContext {
                scheduler,
                source,
                events: events_tx,
            },
            events: events_rx,
            chunks: FxHashMap::default(),
            viewer_position: Vec2::ZERO,
            last_sweep_position: None,
            mesh_world_size,
            chunks_visible_in_view,
            max_view_dst,
        })
    }

    /// Per-frame entry point.
    ///
    /// Always drains completed height-map/mesh work and tracks collider
    /// thresholds; the full spawn/retire/LOD sweep only runs when the viewer
    /// has moved more than the configured threshold since the last sweep.
    pub fn update(&mut self, viewer_position: Vec2, sink: &mut dyn TerrainSink) {
        self.viewer_position = viewer_position;
        self.drain_events(sink);

        let ctx = &self.ctx;
        for chunk in self.chunks.values_mut() {
            chunk.update_collider(viewer_position, ctx, sink);
        }

        let threshold_sq = self.config.viewer_move_threshold * self.config.viewer_move_threshold;
        let moved_enough = self
            .last_sweep_position
            .map_or(true, |last| (viewer_position - last).length_squared() > threshold_sq);
        if moved_enough {
            self.last_sweep_position = Some(viewer_position);
            self.sweep(sink);
        }
    }

    /// Dispatch finished background work to its chunk. Results for retired
    /// chunks are dropped; with no cancellation that is a normal race, not an
    /// error.
    fn drain_events(&mut self, sink: &mut dyn TerrainSink) {
        while let Ok(event) = self.events.try_recv() {
            let ctx = &self.ctx;
            match event {
                ChunkEvent::HeightMapReady { coord, height_map } => {
                    match self.chunks.get_mut(&coord) {
                        Some(chunk) => {
                            chunk.on_height_map_ready(height_map, self.viewer_position, ctx, sink)
                        }
                        None => log::debug!("discarding height map for retired chunk {coord:?}"),
                    }
                }
                ChunkEvent::MeshReady {
                    coord,
                    lod_index,
                    mesh,
                } => match self.chunks.get_mut(&coord) {
                    Some(chunk) => {
                        chunk.on_mesh_ready(lod_index, mesh, self.viewer_position, ctx, sink)
                    }
                    None => log::debug!("discarding mesh for retired chunk {coord:?}"),
                },
            }
        }
    }

    fn sweep(&mut self, sink: &mut dyn TerrainSink) {
        let viewer = self.viewer_position;

        // Retire chunks one cell past the view distance. The slack keeps a
        // chunk sitting right on the last threshold from being destroyed and
        // respawned on alternating sweeps.
        let retire_dst = self.max_view_dst + self.mesh_world_size;
        let retired: Vec<ChunkCoord> = self
            .chunks
            .iter()
            .filter(|(_, chunk)| chunk.bounds().distance(viewer) > retire_dst)
            .map(|(coord, _)| *coord)
            .collect();
        for coord in retired {
            if let Some(mut chunk) = self.chunks.remove(&coord) {
                log::debug!("retiring chunk {coord:?}");
                chunk.retire(sink);
            }
        }

        // Spawn every in-range cell that has no chunk yet. Cell coordinates
        // map to at most one live chunk; re-scanning an existing cell is a
        // no-op.
        let current_cell = IVec2::new(
            (viewer.x / self.mesh_world_size).round() as i32,
            (viewer.y / self.mesh_world_size).round() as i32,
        );
        let reach = self.chunks_visible_in_view;
        for y_offset in -reach..=reach {
            for x_offset in -reach..=reach {
                let coord = current_cell + IVec2::new(x_offset, y_offset);
                if self.chunks.contains_key(&coord) {
                    continue;
                }
                let cell_bounds = Bounds2::new(
                    coord.as_vec2() * self.mesh_world_size,
                    Vec2::splat(self.mesh_world_size),
                );
                if cell_bounds.distance(viewer) > self.max_view_dst {
                    continue;
                }
                log::debug!("spawning chunk {coord:?}");
                let chunk = TerrainChunk::new(coord, Arc::clone(&self.config), &self.ctx);
                self.chunks.insert(coord, chunk);
            }
        }

        // LOD pass over every live chunk, including ones coasting in the
        // retire slack band.
        let ctx = &self.ctx;
        for chunk in self.chunks.values_mut() {
            chunk.update(viewer, ctx, sink);
        }
    }

    pub fn stats(&self) -> GridStats {
        GridStats {
            loaded_chunks: self.chunks.len(),
            visible_chunks: self.chunks.values().filter(|c| c.is_visible()).count(),
        }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn viewer_position(&self) -> Vec2 {
        self.viewer_position
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut TerrainChunk> {
        self.chunks.get_mut(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }
}
