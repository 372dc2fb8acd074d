use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MapError, Result};
use crate::map::{OrientationSource, DEFAULT_EXCLUDED};
use crate::palette::PaletteOptions;

/// Where feature data lives on disk
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub world_path: PathBuf,
    pub special_path: PathBuf,
    /// Object inside the world topology holding the countries
    pub world_object: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            world_path: PathBuf::from("data/countries-topo.json"),
            special_path: PathBuf::from("data/countries-special.json"),
            world_object: "countries".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationMode {
    /// Vertical when the viewport is taller than wide
    #[default]
    Auto,
    Vertical,
    Wide,
}

impl OrientationMode {
    pub fn source(self) -> OrientationSource {
        match self {
            OrientationMode::Auto => OrientationSource::Derived,
            OrientationMode::Vertical => OrientationSource::Fixed(true),
            OrientationMode::Wide => OrientationSource::Fixed(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub data: DataConfig,
    pub excluded_features: Vec<String>,
    pub palette: PaletteOptions,
    pub orientation: OrientationMode,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            excluded_features: DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect(),
            palette: PaletteOptions::default(),
            orientation: OrientationMode::default(),
        }
    }
}

impl MapConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| MapError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
