use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

use crate::data::{feature_name, Feature};
use crate::map::path::GeoPath;
use crate::map::projection::Projection;

/// Features never drawn on the map
pub const DEFAULT_EXCLUDED: &[&str] = &["Antarctica"];

/// Renderable output for one feature under one projection.
///
/// `id` is the position in the filtered feature sequence; the rendering
/// layer joins on it, so ordering must match the filtered feature order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathDescriptor {
    pub id: usize,
    pub name: Option<String>,
    pub path: Option<String>,
    pub centroid: Option<[f64; 2]>,
}

/// Maps live projections × features into path descriptors
#[derive(Clone, Debug, PartialEq)]
pub struct PathGenerator {
    excluded: HashSet<String>,
}

impl Default for PathGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED.iter().copied())
    }
}

impl PathGenerator {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// Unnamed features are never excluded
    pub fn is_excluded(&self, feature: &Feature) -> bool {
        feature_name(feature).is_some_and(|name| self.excluded.contains(name))
    }

    /// Features that survive exclusion, in input order
    pub fn visible<'f>(&self, features: &'f [Feature]) -> Vec<&'f Feature> {
        features.iter().filter(|f| !self.is_excluded(f)).collect()
    }

    /// One descriptor list per projection, in projection order.
    pub fn generate(&self, projections: &[Projection], features: &[Feature]) -> Vec<Vec<PathDescriptor>> {
        let visible = self.visible(features);

        projections
            .iter()
            .map(|projection| {
                let path = GeoPath::new(projection);
                visible
                    .par_iter()
                    .enumerate()
                    .map(|(id, feature)| {
                        let (d, centroid) = path.render(feature.geometry.as_ref());
                        PathDescriptor {
                            id,
                            name: feature_name(feature).map(str::to_owned),
                            path: d,
                            centroid,
                        }
                    })
                    .collect()
            })
            .collect()
    }
}
