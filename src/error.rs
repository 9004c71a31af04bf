//! Error handling for the terrain system
//!
//! Configuration problems are fatal at startup: `TerrainConfig::validate`
//! reports them before any chunk or mesh work begins, and nothing downstream
//! clamps or repairs a bad value. Generation itself is infallible once the
//! configuration has been accepted.

/// Result alias used throughout the crate
pub type TerrainResult<T> = Result<T, TerrainError>;

/// Terrain configuration and setup errors
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error("detail level list is empty")]
    EmptyDetailLevels,

    #[error("lod {lod} at detail level {index} exceeds the supported maximum {max}")]
    UnsupportedLod { index: usize, lod: u32, max: u32 },

    #[error("detail levels must be strictly increasing in lod and distance at entry {index}")]
    NonMonotonicDetailLevels { index: usize },

    #[error("visible distance threshold {threshold} at detail level {index} is not positive")]
    InvalidDistanceThreshold { index: usize, threshold: f32 },

    #[error("collider lod index {index} is out of range for {num_levels} detail levels")]
    ColliderLodOutOfRange { index: usize, num_levels: usize },

    #[error("num_verts_per_line {num_verts_per_line} leaves no interior vertices (minimum is {min})")]
    VertsPerLineTooSmall { num_verts_per_line: u32, min: u32 },

    #[error(
        "num_verts_per_line {num_verts_per_line} is incompatible with lod {lod}: \
         {num_verts_per_line} - 5 is not divisible by its stride {skip_increment}"
    )]
    StrideMismatch {
        num_verts_per_line: u32,
        lod: u32,
        skip_increment: u32,
    },

    #[error("mesh scale {mesh_scale} is not positive")]
    InvalidMeshScale { mesh_scale: f32 },

    #[error("invalid noise settings: {reason}")]
    InvalidNoiseSettings { reason: String },

    #[error("height curve needs at least one keyframe, got {num_keys}")]
    DegenerateHeightCurve { num_keys: usize },

    #[error("failed to build worker pool: {error}")]
    SchedulerInit { error: String },

    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
