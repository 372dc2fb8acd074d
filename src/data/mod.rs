//! Feature loading: TopoJSON world file, supplementary GeoJSON overlays,
//! a built-in fallback world and the one-shot background load.

mod topology;

pub use topology::Topology;

use anyhow::{anyhow, Context, Result};
use geojson::{GeoJson, Geometry, JsonObject, Value};
use log::{info, warn};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;

use crate::config::DataConfig;

pub type Feature = geojson::Feature;

/// The `name` property, if present and a string
pub fn feature_name(feature: &Feature) -> Option<&str> {
    feature.properties.as_ref()?.get("name")?.as_str()
}

/// Merged world and overlay features. Populated once.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FeatureStore {
    #[default]
    Pending,
    Loaded(Arc<[Feature]>),
}

impl FeatureStore {
    /// Empty until loaded
    pub fn features(&self) -> &[Feature] {
        match self {
            FeatureStore::Pending => &[],
            FeatureStore::Loaded(features) => features,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, FeatureStore::Loaded(_))
    }
}

/// Anything that can produce the full feature list
pub trait FeatureSource: Send {
    fn load(&self) -> Result<Vec<Feature>>;
}

/// World topology plus an optional overlay file on disk
#[derive(Clone, Debug)]
pub struct FileFeatureSource {
    world_path: PathBuf,
    special_path: PathBuf,
    object: String,
}

impl FileFeatureSource {
    pub fn new(world_path: impl Into<PathBuf>, special_path: impl Into<PathBuf>, object: impl Into<String>) -> Self {
        Self {
            world_path: world_path.into(),
            special_path: special_path.into(),
            object: object.into(),
        }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(&config.world_path, &config.special_path, &config.world_object)
    }

    /// The world file is required; the overlay is optional
    pub fn exists(&self) -> bool {
        self.world_path.exists()
    }
}

impl FeatureSource for FileFeatureSource {
    fn load(&self) -> Result<Vec<Feature>> {
        let mut features = load_topology(&self.world_path, &self.object)?;
        let world = features.len();

        if self.special_path.exists() {
            let content = fs::read_to_string(&self.special_path)
                .with_context(|| format!("reading {}", self.special_path.display()))?;
            let special = parse_feature_list(&content)
                .with_context(|| format!("parsing {}", self.special_path.display()))?;
            features.extend(special);
        } else {
            warn!("overlay file {} not found, skipping", self.special_path.display());
        }

        info!(
            "loaded {} world and {} overlay features",
            world,
            features.len() - world
        );
        Ok(features)
    }
}

/// Load one object of a TopoJSON file as features
pub fn load_topology(path: &Path, object: &str) -> Result<Vec<Feature>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let topology = Topology::from_slice(&mut bytes).with_context(|| format!("parsing {}", path.display()))?;
    let features = topology
        .features(object)
        .with_context(|| format!("decoding `{}` in {}", object, path.display()))?;
    Ok(features)
}

/// Accepts a bare array of features, a FeatureCollection, a single Feature
/// or a bare Geometry.
pub fn parse_feature_list(content: &str) -> Result<Vec<Feature>> {
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str::<Vec<Feature>>(content)?);
    }

    let geojson: GeoJson = content.parse()?;
    Ok(match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![Feature::from(g)],
    })
}

/// Coarse continent outlines for when no data files are available
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackWorld;

impl FallbackWorld {
    pub fn features() -> Vec<Feature> {
        CONTINENTS
            .iter()
            .map(|(name, ring)| {
                let mut ring: Vec<Vec<f64>> = ring.iter().map(|&(lon, lat)| vec![lon, lat]).collect();
                // Clockwise, interior on the right, as the globe clipper reads rings
                if planar_area(&ring) > 0.0 {
                    ring.reverse();
                }
                let mut properties = JsonObject::new();
                properties.insert("name".to_string(), (*name).into());
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect()
    }
}

impl FeatureSource for FallbackWorld {
    fn load(&self) -> Result<Vec<Feature>> {
        Ok(Self::features())
    }
}

/// Shoelace area in degrees, positive when counterclockwise on a
/// north-up map
fn planar_area(ring: &[Vec<f64>]) -> f64 {
    ring.windows(2)
        .map(|w| w[0][0] * w[1][1] - w[1][0] * w[0][1])
        .sum::<f64>()
        / 2.0
}

#[rustfmt::skip]
const CONTINENTS: &[(&str, &[(f64, f64)])] = &[
    ("North America", &[
        (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-130.0, 55.0),
        (-125.0, 48.0), (-124.0, 40.0), (-117.0, 32.0), (-110.0, 25.0),
        (-97.0, 25.0), (-97.0, 28.0), (-82.0, 24.0), (-80.0, 25.0),
        (-81.0, 31.0), (-75.0, 35.0), (-70.0, 41.0), (-67.0, 45.0),
        (-65.0, 47.0), (-55.0, 47.0), (-52.0, 47.0), (-55.0, 52.0),
        (-58.0, 55.0), (-64.0, 60.0), (-73.0, 62.0), (-80.0, 63.0),
        (-95.0, 62.0), (-110.0, 68.0), (-130.0, 70.0), (-145.0, 70.0),
        (-168.0, 65.0),
    ]),
    ("South America", &[
        (-80.0, 10.0), (-75.0, 5.0), (-70.0, 5.0), (-60.0, 5.0),
        (-50.0, 0.0), (-35.0, -5.0), (-35.0, -10.0), (-38.0, -15.0),
        (-40.0, -22.0), (-48.0, -25.0), (-55.0, -34.0), (-58.0, -38.0),
        (-65.0, -42.0), (-68.0, -50.0), (-75.0, -52.0), (-75.0, -45.0),
        (-72.0, -40.0), (-72.0, -30.0), (-70.0, -20.0), (-70.0, -15.0),
        (-80.0, -5.0), (-80.0, 0.0), (-80.0, 10.0),
    ]),
    ("Europe", &[
        (-10.0, 36.0), (-5.0, 36.0), (0.0, 38.0), (5.0, 43.0),
        (10.0, 44.0), (15.0, 45.0), (20.0, 40.0), (25.0, 37.0),
        (30.0, 40.0), (35.0, 42.0), (40.0, 43.0), (40.0, 55.0),
        (30.0, 60.0), (25.0, 65.0), (20.0, 70.0), (10.0, 71.0),
        (5.0, 62.0), (5.0, 58.0), (-5.0, 58.0), (-10.0, 52.0),
        (-5.0, 48.0), (-5.0, 43.0), (-10.0, 36.0),
    ]),
    ("Africa", &[
        (-17.0, 15.0), (-17.0, 20.0), (-15.0, 28.0), (-5.0, 35.0),
        (10.0, 37.0), (20.0, 33.0), (25.0, 32.0), (35.0, 30.0),
        (35.0, 20.0), (42.0, 12.0), (50.0, 12.0), (45.0, 5.0),
        (35.0, -5.0), (35.0, -20.0), (35.0, -25.0), (30.0, -30.0),
        (20.0, -35.0), (18.0, -35.0), (15.0, -30.0), (10.0, -15.0),
        (10.0, 0.0), (5.0, 5.0), (-5.0, 5.0), (-10.0, 10.0),
        (-17.0, 15.0),
    ]),
    ("Asia", &[
        (35.0, 42.0), (40.0, 43.0), (50.0, 40.0), (55.0, 37.0),
        (60.0, 25.0), (65.0, 25.0), (70.0, 20.0), (75.0, 15.0),
        (80.0, 8.0), (80.0, 15.0), (88.0, 22.0), (92.0, 22.0),
        (95.0, 16.0), (100.0, 14.0), (105.0, 10.0), (110.0, 20.0),
        (115.0, 22.0), (120.0, 22.0), (122.0, 25.0), (125.0, 30.0),
        (130.0, 35.0), (135.0, 35.0), (140.0, 40.0), (145.0, 45.0),
        (145.0, 50.0), (140.0, 55.0), (135.0, 55.0), (130.0, 52.0),
        (130.0, 43.0), (120.0, 40.0), (110.0, 45.0), (90.0, 50.0),
        (70.0, 55.0), (60.0, 55.0), (50.0, 50.0), (40.0, 43.0),
        (35.0, 42.0),
    ]),
    ("Australia", &[
        (115.0, -20.0), (120.0, -18.0), (130.0, -12.0), (140.0, -12.0),
        (145.0, -15.0), (150.0, -25.0), (153.0, -30.0), (150.0, -35.0),
        (145.0, -38.0), (140.0, -38.0), (135.0, -35.0), (130.0, -32.0),
        (125.0, -32.0), (115.0, -35.0), (115.0, -25.0), (115.0, -20.0),
    ]),
    ("Antarctica", &[
        (-170.0, -70.0), (-90.0, -72.0), (0.0, -70.0), (90.0, -67.0),
        (170.0, -70.0), (170.0, -85.0), (-170.0, -85.0), (-170.0, -70.0),
    ]),
];

type LoadResult = Result<Vec<Feature>>;

/// A one-shot background load. The result is handed out exactly once.
pub struct FeatureLoad {
    rx: Option<mpsc::Receiver<LoadResult>>,
}

impl FeatureLoad {
    /// Run `source` on the rayon pool. A panicking source is reported as an
    /// error rather than tearing down the pool.
    pub fn spawn<S: FeatureSource + 'static>(source: S) -> Self {
        let (tx, rx) = mpsc::channel();
        rayon::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| source.load()))
                .unwrap_or_else(|_| Err(anyhow!("feature loader panicked")));
            // The receiver may already be gone
            let _ = tx.send(result);
        });
        Self { rx: Some(rx) }
    }

    /// A load that has already finished
    #[cfg(test)]
    fn ready(result: LoadResult) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(result);
        Self { rx: Some(rx) }
    }

    /// Non-blocking. `None` while the load is still running or after the
    /// result was taken.
    pub fn try_take(&mut self) -> Option<LoadResult> {
        let result = match self.rx.as_ref()?.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(anyhow!("feature loader exited without a result")),
        };
        self.rx = None;
        Some(result)
    }

    /// Block until the load finishes. `None` if the result was already taken.
    pub fn wait(&mut self) -> Option<LoadResult> {
        let rx = self.rx.take()?;
        Some(
            rx.recv()
                .unwrap_or_else(|_| Err(anyhow!("feature loader exited without a result"))),
        )
    }

    pub fn is_finished(&self) -> bool {
        self.rx.is_none()
    }
}
