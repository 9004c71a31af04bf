//! Terrain chunk lifecycle
//!
//! A chunk owns one spatial cell: its height map, its per-LOD mesh cache, and
//! its visibility and collider state. Creation immediately requests the
//! height map; everything else waits until that arrives. Each viewer update
//! re-runs LOD selection, swapping in cached meshes synchronously and issuing
//! guarded build requests for missing ones. A mesh request is made at most
//! once per LOD and its result is cached forever.

use std::sync::Arc;

use glam::{IVec2, Vec2};

use crate::heightmap::{HeightMap, HeightMapSource};
use crate::meshing::{generate_terrain_mesh, TerrainMesh};
use crate::settings::TerrainConfig;
use crate::tasks::TaskScheduler;

use super::bounds::Bounds2;

/// Grid cell address of a chunk.
pub type ChunkCoord = IVec2;

/// Observable lifecycle state of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// No height map and none requested.
    Empty,
    /// Height map request outstanding.
    Loading,
    /// Height map present; meshes fill in lazily.
    Ready,
}

/// Callback invoked synchronously when a chunk's visibility flips.
pub type VisibilityListener = Box<dyn FnMut(ChunkCoord, bool) + Send>;

/// Consumer of streamed terrain geometry: the renderer/collider boundary.
///
/// Methods default to no-ops so sinks implement only what they consume.
pub trait TerrainSink {
    /// The displayed mesh for a chunk changed (first mesh or LOD swap).
    fn mesh_updated(&mut self, _coord: ChunkCoord, _lod: u32, _mesh: &TerrainMesh) {}

    /// A chunk's visibility flipped.
    fn visibility_changed(&mut self, _coord: ChunkCoord, _visible: bool) {}

    /// A chunk committed its collision mesh. Fired at most once per chunk.
    fn collider_ready(&mut self, _coord: ChunkCoord, _mesh: &TerrainMesh) {}
}

/// No-op sink.
impl TerrainSink for () {}

/// Completed background work, delivered back to the driving thread.
pub(crate) enum ChunkEvent {
    HeightMapReady {
        coord: ChunkCoord,
        height_map: HeightMap,
    },
    MeshReady {
        coord: ChunkCoord,
        lod_index: usize,
        mesh: TerrainMesh,
    },
}

/// Request plumbing the grid hands to chunk methods.
pub(crate) struct ChunkContext {
    pub scheduler: Arc<dyn TaskScheduler>,
    pub source: Arc<dyn HeightMapSource>,
    pub events: flume::Sender<ChunkEvent>,
}

/// One LOD slot: the request guard is set once and never reset, the mesh is
/// cached once and never invalidated.
struct LodMesh {
    lod: u32,
    requested: bool,
    mesh: Option<TerrainMesh>,
}

pub struct TerrainChunk {
    coord: ChunkCoord,
    config: Arc<TerrainConfig>,
    bounds: Bounds2,
    sample_center: Vec2,
    max_view_dst: f32,
    height_map: Option<Arc<HeightMap>>,
    height_map_requested: bool,
    lod_meshes: Vec<LodMesh>,
    previous_lod_index: Option<usize>,
    visible: bool,
    has_set_collider: bool,
    visibility_listeners: Vec<VisibilityListener>,
}

impl TerrainChunk {
    pub(crate) fn new(coord: ChunkCoord, config: Arc<TerrainConfig>, ctx: &ChunkContext) -> Self {
        let world_size = config.mesh.mesh_world_size();
        let position = coord.as_vec2() * world_size;
        let sample_center = position / config.mesh.mesh_scale;
        let lod_meshes = config
            .detail_levels
            .iter()
            .map(|level| LodMesh {
                lod: level.lod,
                requested: false,
                mesh: None,
            })
            .collect();
        let max_view_dst = config.max_view_dst();

        let mut chunk = Self {
            coord,
            bounds: Bounds2::new(position, Vec2::splat(world_size)),
            sample_center,
            max_view_dst,
            config,
            height_map: None,
            height_map_requested: false,
            lod_meshes,
            previous_lod_index: None,
            visible: false,
            has_set_collider: false,
            visibility_listeners: Vec::new(),
        };
        chunk.request_height_map(ctx);
        chunk
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn bounds(&self) -> Bounds2 {
        self.bounds
    }

    pub fn state(&self) -> ChunkState {
        if self.height_map.is_some() {
            ChunkState::Ready
        } else if self.height_map_requested {
            ChunkState::Loading
        } else {
            ChunkState::Empty
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn has_collider(&self) -> bool {
        self.has_set_collider
    }

    /// LOD level currently displayed, once a mesh has been swapped in.
    pub fn displayed_lod(&self) -> Option<u32> {
        self.previous_lod_index
            .map(|index| self.lod_meshes[index].lod)
    }

    pub fn displayed_mesh(&self) -> Option<&TerrainMesh> {
        self.previous_lod_index
            .and_then(|index| self.lod_meshes[index].mesh.as_ref())
    }

    /// Register an observer for visibility transitions; invoked synchronously
    /// at the point of transition.
    pub fn on_visibility_changed(
        &mut self,
        listener: impl FnMut(ChunkCoord, bool) + Send + 'static,
    ) {
        self.visibility_listeners.push(Box::new(listener));
    }

    fn request_height_map(&mut self, ctx: &ChunkContext) {
        if self.height_map_requested {
            return;
        }
        self.height_map_requested = true;

        let source = Arc::clone(&ctx.source);
        let events = ctx.events.clone();
        let coord = self.coord;
        let size = self.config.mesh.num_verts_per_line as usize;
        let sample_center = self.sample_center;

        log::debug!("chunk {coord:?} requesting height map");
        ctx.scheduler.submit(Box::new(move || {
            let height_map = source.generate(size, sample_center);
            // The receiver only disappears when the grid itself is gone.
            let _ = events.send(ChunkEvent::HeightMapReady { coord, height_map });
        }));
    }

    pub(crate) fn on_height_map_ready(
        &mut self,
        height_map: HeightMap,
        viewer_position: Vec2,
        ctx: &ChunkContext,
        sink: &mut dyn TerrainSink,
    ) {
        debug_assert_eq!(
            height_map.size(),
            self.config.mesh.num_verts_per_line as usize
        );
        log::debug!("chunk {:?} height map received", self.coord);
        self.height_map = Some(Arc::new(height_map));
        self.update(viewer_position, ctx, sink);
    }

    pub(crate) fn on_mesh_ready(
        &mut self,
        lod_index: usize,
        mesh: TerrainMesh,
        viewer_position: Vec2,
        ctx: &ChunkContext,
        sink: &mut dyn TerrainSink,
    ) {
        log::debug!(
            "chunk {:?} lod {} mesh ready ({} triangles)",
            self.coord,
            self.lod_meshes[lod_index].lod,
            mesh.triangle_count()
        );
        self.lod_meshes[lod_index].mesh = Some(mesh);
        self.update(viewer_position, ctx, sink);
        if lod_index == self.config.collider_lod_index {
            self.update_collider(viewer_position, ctx, sink);
        }
    }

    /// Re-run LOD selection against the current viewer position.
    ///
    /// Inert until the height map has arrived.
    pub(crate) fn update(
        &mut self,
        viewer_position: Vec2,
        ctx: &ChunkContext,
        sink: &mut dyn TerrainSink,
    ) {
        let Some(height_map) = self.height_map.clone() else {
            return;
        };

        let viewer_dst = self.bounds.distance(viewer_position);
        let visible = viewer_dst <= self.max_view_dst;

        if visible {
            let lod_index = self.select_lod_index(viewer_dst);
            if self.previous_lod_index != Some(lod_index) {
                if self.lod_meshes[lod_index].mesh.is_some() {
                    self.previous_lod_index = Some(lod_index);
                    let slot = &self.lod_meshes[lod_index];
                    if let Some(mesh) = &slot.mesh {
                        sink.mesh_updated(self.coord, slot.lod, mesh);
                    }
                } else if !self.lod_meshes[lod_index].requested {
                    self.request_mesh(lod_index, &height_map, ctx);
                }
            }
        }

        if self.visible != visible {
            self.set_visible(visible, sink);
        }
    }

    /// The selected LOD is the last entry whose threshold the distance
    /// exceeds; under every threshold means full resolution.
    fn select_lod_index(&self, viewer_dst: f32) -> usize {
        let levels = &self.config.detail_levels;
        let mut lod_index = 0;
        for (i, level) in levels[..levels.len() - 1].iter().enumerate() {
            if viewer_dst > level.visible_dst_threshold {
                lod_index = i + 1;
            } else {
                break;
            }
        }
        lod_index
    }

    fn request_mesh(&mut self, lod_index: usize, height_map: &Arc<HeightMap>, ctx: &ChunkContext) {
        let slot = &mut self.lod_meshes[lod_index];
        if slot.requested {
            return;
        }
        slot.requested = true;

        let lod = slot.lod;
        let coord = self.coord;
        let mesh_settings = self.config.mesh;
        let height_map = Arc::clone(height_map);
        let events = ctx.events.clone();

        log::debug!("chunk {coord:?} requesting lod {lod} mesh");
        ctx.scheduler.submit(Box::new(move || {
            let mesh = generate_terrain_mesh(&height_map, &mesh_settings, lod);
            let _ = events.send(ChunkEvent::MeshReady {
                coord,
                lod_index,
                mesh,
            });
        }));
    }

    /// Commit the collision mesh once the viewer is inside the collider LOD's
    /// threshold. After the first commit the collider never changes again,
    /// whatever the visual LOD does later.
    pub(crate) fn update_collider(
        &mut self,
        viewer_position: Vec2,
        ctx: &ChunkContext,
        sink: &mut dyn TerrainSink,
    ) {
        if self.has_set_collider {
            return;
        }
        let Some(height_map) = self.height_map.clone() else {
            return;
        };

        let collider_index = self.config.collider_lod_index;
        let sqr_dst = self.bounds.sqr_distance(viewer_position);
        let sqr_threshold = self.config.detail_levels[collider_index].sqr_visible_dst_threshold();

        if sqr_dst < sqr_threshold {
            if !self.lod_meshes[collider_index].requested {
                self.request_mesh(collider_index, &height_map, ctx);
            }
            if let Some(mesh) = &self.lod_meshes[collider_index].mesh {
                sink.collider_ready(self.coord, mesh);
                self.has_set_collider = true;
                log::debug!("chunk {:?} collider committed", self.coord);
            }
        }
    }

    /// Called by the grid when the chunk leaves the retire radius.
    pub(crate) fn retire(&mut self, sink: &mut dyn TerrainSink) {
        if self.visible {
            self.set_visible(false, sink);
        }
    }

    fn set_visible(&mut self, visible: bool, sink: &mut dyn TerrainSink) {
        self.visible = visible;
        log::debug!("chunk {:?} visibility -> {}", self.coord, visible);
        for listener in &mut self.visibility_listeners {
            listener(self.coord, visible);
        }
        sink.visibility_changed(self.coord, visible);
    }
}
