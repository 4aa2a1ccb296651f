//! # Terrain Configuration
//!
//! Runtime settings of the terrain subsystem. Every field has a default, so
//! a JSON file only needs the values it changes:
//!
//! ```
//! use voxel_terrain::config::TerrainConfig;
//!
//! let config = TerrainConfig::from_json_str(r#"{ "create_radius": 4 }"#).unwrap();
//! assert_eq!(config.create_radius, 4);
//! assert_eq!(config.delete_radius, 14);
//! ```

use std::path::Path;

use anyhow::Context;
use log::info;
use serde::{Deserialize, Serialize};

const DEFAULT_CREATE_RADIUS: i32 = 10;
const DEFAULT_RENDER_RADIUS: i32 = 10;
const DEFAULT_DELETE_RADIUS: i32 = 14;
const DEFAULT_MAX_CHUNKS: usize = 8192;
const DEFAULT_FOV: f32 = 65.0;
const MAX_DEFAULT_WORKERS: usize = 4;

/// Pool sizes, radii and rendering switches.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Background mesh workers.
    pub worker_count: usize,
    /// Radius in chunks considered for asynchronous builds.
    pub create_radius: i32,
    /// Radius in chunks the far clip plane is derived from.
    pub render_radius: i32,
    /// Chunks farther than this from every viewpoint are evicted.
    pub delete_radius: i32,
    /// Capacity of the chunk pool.
    pub max_chunks: usize,
    /// Propagate light sources into vertex light.
    pub show_lights: bool,
    /// Default vertical field of view in degrees.
    pub fov: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            worker_count: default_worker_count(),
            create_radius: DEFAULT_CREATE_RADIUS,
            render_radius: DEFAULT_RENDER_RADIUS,
            delete_radius: DEFAULT_DELETE_RADIUS,
            max_chunks: DEFAULT_MAX_CHUNKS,
            show_lights: true,
            fov: DEFAULT_FOV,
        }
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_DEFAULT_WORKERS)
}

impl TerrainConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Invalid terrain configuration")
    }

    /// Reads a configuration file.
    ///
    /// # Arguments
    /// * `path` - A JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded terrain configuration from {}", path.display());
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize terrain configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = TerrainConfig::from_json_str(r#"{ "show_lights": false, "max_chunks": 64 }"#)
            .unwrap();
        assert!(!config.show_lights);
        assert_eq!(config.max_chunks, 64);
        assert_eq!(config.render_radius, 10);
        assert_relative_eq!(config.fov, 65.0);
        assert!((1..=4).contains(&config.worker_count));
    }

    #[test]
    fn json_round_trips() {
        let config = TerrainConfig {
            worker_count: 2,
            delete_radius: 3,
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(TerrainConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn bad_input_is_an_error() {
        assert!(TerrainConfig::from_json_str("{ \"create_radius\": \"far\" }").is_err());
        assert!(TerrainConfig::load("/nonexistent/terrain.json").is_err());
    }
}
