//! Terrain configuration
//!
//! All tunables live here: the chunk sample-grid layout, the LOD ladder, and
//! the height map generation parameters. A configuration is loaded (or built
//! in code), validated exactly once with [`TerrainConfig::validate`], and then
//! shared read-only by every chunk. Validation fails fast; nothing downstream
//! clamps a bad value.

mod height;
mod mesh;

pub use height::{CurveKey, HeightCurve, HeightMapSettings, NoiseSettings, NormalizeMode};
pub use mesh::{skip_increment, LodInfo, MeshSettings, NUM_SUPPORTED_LODS};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};

fn default_viewer_move_threshold() -> f32 {
    25.0
}

/// Complete configuration for a terrain grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Index into `detail_levels` of the resolution used for collision
    /// geometry. Committed once per chunk, never swapped afterwards.
    pub collider_lod_index: usize,

    /// Viewer movement (world units) required before the grid re-runs the
    /// full spawn/LOD sweep. Zero re-evaluates on every update call.
    #[serde(default = "default_viewer_move_threshold")]
    pub viewer_move_threshold: f32,

    #[serde(default)]
    pub mesh: MeshSettings,

    #[serde(default)]
    pub height: HeightMapSettings,

    /// Ordered LOD ladder, strictly increasing in both lod and threshold.
    pub detail_levels: Vec<LodInfo>,
}

impl TerrainConfig {
    /// Maximum view distance: the last LOD threshold. Chunks beyond it are
    /// not visible.
    pub fn max_view_dst(&self) -> f32 {
        self.detail_levels
            .last()
            .map_or(0.0, |level| level.visible_dst_threshold)
    }

    /// Check every startup invariant. Called once by `TerrainGrid::new`;
    /// callers constructing configs by hand can run it directly.
    pub fn validate(&self) -> TerrainResult<()> {
        if self.detail_levels.is_empty() {
            return Err(TerrainError::EmptyDetailLevels);
        }

        for (index, level) in self.detail_levels.iter().enumerate() {
            if level.lod >= NUM_SUPPORTED_LODS {
                return Err(TerrainError::UnsupportedLod {
                    index,
                    lod: level.lod,
                    max: NUM_SUPPORTED_LODS - 1,
                });
            }
            if !(level.visible_dst_threshold > 0.0) {
                return Err(TerrainError::InvalidDistanceThreshold {
                    index,
                    threshold: level.visible_dst_threshold,
                });
            }
        }

        for (index, pair) in self.detail_levels.windows(2).enumerate() {
            let (prev, next) = (pair[0], pair[1]);
            if next.lod <= prev.lod || next.visible_dst_threshold <= prev.visible_dst_threshold {
                return Err(TerrainError::NonMonotonicDetailLevels { index: index + 1 });
            }
        }

        if self.collider_lod_index >= self.detail_levels.len() {
            return Err(TerrainError::ColliderLodOutOfRange {
                index: self.collider_lod_index,
                num_levels: self.detail_levels.len(),
            });
        }

        // The grid needs the out-of-mesh ring, the mesh edge ring, the
        // stitch ring, and at least a 2x2 interior of main vertices.
        let n = self.mesh.num_verts_per_line;
        if n < 7 {
            return Err(TerrainError::VertsPerLineTooSmall {
                num_verts_per_line: n,
                min: 7,
            });
        }
        for level in &self.detail_levels {
            let skip = skip_increment(level.lod);
            if (n - 5) % skip != 0 {
                return Err(TerrainError::StrideMismatch {
                    num_verts_per_line: n,
                    lod: level.lod,
                    skip_increment: skip,
                });
            }
        }

        if !(self.mesh.mesh_scale > 0.0) {
            return Err(TerrainError::InvalidMeshScale {
                mesh_scale: self.mesh.mesh_scale,
            });
        }

        self.height.validate()
    }

    /// Parse a configuration from TOML text. Does not validate.
    pub fn from_toml_str(text: &str) -> TerrainResult<Self> {
        toml::from_str(text).map_err(|source| TerrainError::ConfigParse {
            path: "<inline>".to_string(),
            source,
        })
    }

    /// Load and parse a configuration file. Does not validate.
    pub fn from_toml_file(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TerrainError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| TerrainError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            mesh: MeshSettings::default(),
            height: HeightMapSettings::default(),
            detail_levels: vec![
                LodInfo {
                    lod: 0,
                    visible_dst_threshold: 200.0,
                },
                LodInfo {
                    lod: 1,
                    visible_dst_threshold: 400.0,
                },
                LodInfo {
                    lod: 2,
                    visible_dst_threshold: 600.0,
                },
                LodInfo {
                    lod: 4,
                    visible_dst_threshold: 800.0,
                },
            ],
            collider_lod_index: 0,
            viewer_move_threshold: default_viewer_move_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        TerrainConfig::default()
            .validate()
            .expect("default config must validate");
    }

    #[test]
    fn test_empty_detail_levels_rejected() {
        let config = TerrainConfig {
            detail_levels: Vec::new(),
            ..TerrainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TerrainError::EmptyDetailLevels)
        ));
    }

    #[test]
    fn test_non_monotonic_thresholds_rejected() {
        let config = TerrainConfig {
            detail_levels: vec![
                LodInfo {
                    lod: 0,
                    visible_dst_threshold: 300.0,
                },
                LodInfo {
                    lod: 1,
                    visible_dst_threshold: 200.0,
                },
            ],
            ..TerrainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TerrainError::NonMonotonicDetailLevels { index: 1 })
        ));
    }

    #[test]
    fn test_collider_index_out_of_range_rejected() {
        let config = TerrainConfig {
            collider_lod_index: 9,
            ..TerrainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TerrainError::ColliderLodOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn test_stride_mismatch_rejected() {
        // 12 - 5 = 7 is not divisible by lod 1's stride of 2.
        let config = TerrainConfig {
            mesh: MeshSettings {
                num_verts_per_line: 12,
                ..MeshSettings::default()
            },
            ..TerrainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TerrainError::StrideMismatch { lod: 1, .. })
        ));
    }

    #[test]
    fn test_too_few_verts_per_line_rejected() {
        let config = TerrainConfig {
            mesh: MeshSettings {
                num_verts_per_line: 5,
                ..MeshSettings::default()
            },
            ..TerrainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TerrainError::VertsPerLineTooSmall { .. })
        ));
    }

    #[test]
    fn test_unsupported_lod_rejected() {
        let config = TerrainConfig {
            detail_levels: vec![LodInfo {
                lod: 7,
                visible_dst_threshold: 100.0,
            }],
            ..TerrainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TerrainError::UnsupportedLod { lod: 7, .. })
        ));
    }

    #[test]
    fn test_max_view_dst_is_last_threshold() {
        let config = TerrainConfig::default();
        assert_eq!(config.max_view_dst(), 800.0);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = TerrainConfig::default();
        let text = toml::to_string(&config).expect("serialize config");
        let parsed = TerrainConfig::from_toml_str(&text).expect("parse config");
        parsed.validate().expect("parsed config must validate");
        assert_eq!(parsed.detail_levels, config.detail_levels);
        assert_eq!(
            parsed.mesh.num_verts_per_line,
            config.mesh.num_verts_per_line
        );
    }

    #[test]
    fn test_config_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        let text = toml::to_string(&TerrainConfig::default()).expect("serialize config");
        file.write_all(text.as_bytes()).expect("write config");

        let config = TerrainConfig::from_toml_file(file.path()).expect("load config");
        config.validate().expect("loaded config must validate");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = TerrainConfig::from_toml_file("/nonexistent/terrain.toml")
            .expect_err("missing file must fail");
        assert!(matches!(err, TerrainError::ConfigIo { .. }));
    }
}
