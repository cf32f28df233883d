use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;
use voxelstream_world::StreamingConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/world.toml";

/// Everything the headless driver reads from disk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldSection,
    pub streaming: StreamingConfig,
    pub atlas: AtlasSection,
    pub headless: HeadlessSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldSection {
    pub seed: u64,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// Grid layout of the terrain texture atlas.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AtlasSection {
    pub columns: u16,
    pub rows: u16,
}

impl Default for AtlasSection {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeadlessSection {
    /// Ticks to simulate.
    pub ticks: u64,
    /// Viewer speed in blocks per tick.
    pub speed: f32,
    /// Ticks between scripted edits; 0 disables editing.
    pub edit_interval: u64,
    pub metrics_path: PathBuf,
    pub report_path: PathBuf,
    pub events_path: PathBuf,
}

impl Default for HeadlessSection {
    fn default() -> Self {
        Self {
            ticks: 600,
            speed: 0.5,
            edit_interval: 40,
            metrics_path: PathBuf::from("target/mesh_metrics.json"),
            report_path: PathBuf::from("target/run_report.json"),
            events_path: PathBuf::from("target/flight_events.jsonl"),
        }
    }
}

impl AppConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    AppConfig::default()
                }
            },
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound {
                    warn!("World config not found at {}. Using defaults", path.display());
                } else {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                AppConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }
}
