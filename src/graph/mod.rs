//! Push-based derivation of map geometry and colour scales.
//!
//! Inputs (viewport, transform, features, one category list per dimension)
//! are written through setters. Every write settles the graph: affected
//! nodes are recomputed once each, in dependency order, and only when one
//! of their dependencies actually changed during the settle.

mod deps;

pub use deps::{CycleError, DependencyGraph};

use log::{debug, info, trace, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::MapConfig;
use crate::data::{Feature, FeatureLoad, FeatureSource, FeatureStore};
use crate::error::Result;
use crate::map::{
    rescale, FitKey, FittedProjection, OrientationSource, PathDescriptor, PathGenerator, Projection,
    ProjectionFactory, Transform, ViewportState,
};
use crate::palette::{Category, ColorScale, Dimension, PaletteOptions};

const DIMENSIONS: usize = Dimension::ALL.len();

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeId {
    Viewport,
    Transform,
    Features,
    Categories(Dimension),
    /// `(width, height, vertical)` of the viewport
    Fit,
    /// Projections fitted to the viewport, with baselines
    FittedSet,
    LiveProjections,
    ProjectedData,
    ColorScale(Dimension),
}

impl NodeId {
    pub fn is_input(self) -> bool {
        matches!(
            self,
            NodeId::Viewport | NodeId::Transform | NodeId::Features | NodeId::Categories(_)
        )
    }
}

fn wiring() -> std::result::Result<DependencyGraph<NodeId>, CycleError<NodeId>> {
    use NodeId::*;

    let mut deps = DependencyGraph::new();
    for node in [Viewport, Transform, Features, Fit, FittedSet, LiveProjections, ProjectedData] {
        deps.add_node(node);
    }
    for dim in Dimension::ALL {
        deps.add_node(Categories(dim));
        deps.add_node(ColorScale(dim));
    }

    deps.add_dependency(Fit, Viewport)?;
    deps.add_dependency(FittedSet, Fit)?;
    deps.add_dependency(LiveProjections, FittedSet)?;
    deps.add_dependency(LiveProjections, Transform)?;
    deps.add_dependency(ProjectedData, LiveProjections)?;
    deps.add_dependency(ProjectedData, Features)?;
    for dim in Dimension::ALL {
        deps.add_dependency(ColorScale(dim), Categories(dim))?;
    }
    Ok(deps)
}

pub struct MapGraph {
    deps: DependencyGraph<NodeId>,
    factory: ProjectionFactory,
    generator: PathGenerator,
    palette: PaletteOptions,

    viewport: ViewportState,
    transform: Transform,
    features: FeatureStore,
    categories: [Vec<Category>; DIMENSIONS],

    fit: Option<FitKey>,
    fitted: Vec<FittedProjection>,
    live: Vec<Projection>,
    projected: Vec<Vec<PathDescriptor>>,
    scales: [ColorScale; DIMENSIONS],

    load: Option<FeatureLoad>,
    pending: Vec<NodeId>,
    batching: bool,
    revisions: HashMap<NodeId, u64>,
    recomputes: HashMap<NodeId, u64>,
    last_settle: Vec<NodeId>,
}

impl MapGraph {
    /// A graph over a zero-size viewport, identity transform, no features
    /// and empty category lists, already settled.
    pub fn new(config: &MapConfig) -> Result<Self> {
        let mut graph = Self {
            deps: wiring()?,
            factory: ProjectionFactory::default(),
            generator: PathGenerator::new(config.excluded_features.iter().cloned()),
            palette: config.palette.clone(),

            viewport: ViewportState::default().with_orientation(config.orientation.source()),
            transform: Transform::IDENTITY,
            features: FeatureStore::Pending,
            categories: std::array::from_fn(|_| Vec::new()),

            fit: None,
            fitted: Vec::new(),
            live: Vec::new(),
            projected: Vec::new(),
            scales: std::array::from_fn(|_| ColorScale::default()),

            load: None,
            pending: Vec::new(),
            batching: false,
            revisions: HashMap::new(),
            recomputes: HashMap::new(),
            last_settle: Vec::new(),
        };

        graph.batching = true;
        graph.mark(NodeId::Viewport);
        graph.mark(NodeId::Transform);
        graph.mark(NodeId::Features);
        for dim in Dimension::ALL {
            graph.mark(NodeId::Categories(dim));
        }
        graph.batching = false;
        graph.settle();
        Ok(graph)
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) -> Result<()> {
        let viewport = ViewportState::new(width, height)?.with_orientation(self.viewport.orientation());
        self.write_viewport(viewport);
        Ok(())
    }

    pub fn set_orientation(&mut self, orientation: OrientationSource) {
        let viewport = self.viewport.with_orientation(orientation);
        self.write_viewport(viewport);
    }

    fn write_viewport(&mut self, viewport: ViewportState) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.mark(NodeId::Viewport);
        }
    }

    pub fn set_transform(&mut self, transform: Transform) -> Result<()> {
        let transform = Transform::new(transform.k, transform.x, transform.y)?;
        if transform != self.transform {
            self.transform = transform;
            self.mark(NodeId::Transform);
        }
        Ok(())
    }

    pub fn set_categories(&mut self, dimension: Dimension, categories: Vec<Category>) {
        let slot = &mut self.categories[dimension as usize];
        if *slot != categories {
            *slot = categories;
            self.mark(NodeId::Categories(dimension));
        }
    }

    /// The single terminal update of the feature store. A failed load
    /// publishes an empty set. Returns `false` if features were already
    /// published.
    pub fn publish_features(&mut self, result: anyhow::Result<Vec<Feature>>) -> bool {
        if self.features.is_loaded() {
            warn!("features already published, ignoring another update");
            return false;
        }
        let features = match result {
            Ok(features) => {
                info!("publishing {} features", features.len());
                features
            }
            Err(e) => {
                warn!("feature load failed, continuing without features: {e:#}");
                Vec::new()
            }
        };
        self.features = FeatureStore::Loaded(Arc::from(features));
        self.load = None;
        self.mark(NodeId::Features);
        true
    }

    /// Start loading features in the background. Ignored once features
    /// are published or a load is already running.
    pub fn load_features<S: FeatureSource + 'static>(&mut self, source: S) {
        if self.features.is_loaded() || self.load.is_some() {
            warn!("feature load already started");
            return;
        }
        self.load = Some(FeatureLoad::spawn(source));
    }

    /// Publish the background load if it has finished. Returns whether
    /// anything was published.
    pub fn poll_feature_load(&mut self) -> bool {
        match self.load.as_mut().and_then(FeatureLoad::try_take) {
            Some(result) => self.publish_features(result),
            None => false,
        }
    }

    /// Block on the background load and publish it
    pub fn wait_feature_load(&mut self) -> bool {
        match self.load.as_mut().and_then(FeatureLoad::wait) {
            Some(result) => self.publish_features(result),
            None => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.load.is_some()
    }

    /// Apply several writes and settle once at the end. Writes made before
    /// an error are kept and still settled.
    pub fn batch<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Batch<'_>) -> Result<()>,
    {
        let nested = self.batching;
        self.batching = true;
        let result = f(&mut Batch { graph: self });
        self.batching = nested;
        if !nested {
            self.settle();
        }
        result
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn features(&self) -> &FeatureStore {
        &self.features
    }

    pub fn categories(&self, dimension: Dimension) -> &[Category] {
        &self.categories[dimension as usize]
    }

    /// Fitted projections with their baselines
    pub fn projections(&self) -> &[FittedProjection] {
        &self.fitted
    }

    pub fn live_projections(&self) -> &[Projection] {
        &self.live
    }

    /// One descriptor list per live projection
    pub fn projected_data(&self) -> &[Vec<PathDescriptor>] {
        &self.projected
    }

    pub fn color_scale(&self, dimension: Dimension) -> &ColorScale {
        &self.scales[dimension as usize]
    }

    /// Bumped each time the node's value changes
    pub fn revision(&self, node: NodeId) -> u64 {
        self.revisions.get(&node).copied().unwrap_or(0)
    }

    /// Number of times the node's recompute function ran
    pub fn recompute_count(&self, node: NodeId) -> u64 {
        self.recomputes.get(&node).copied().unwrap_or(0)
    }

    /// Nodes recomputed by the most recent settle, in evaluation order
    pub fn last_settle(&self) -> &[NodeId] {
        &self.last_settle
    }

    fn mark(&mut self, node: NodeId) {
        *self.revisions.entry(node).or_default() += 1;
        if !self.pending.contains(&node) {
            self.pending.push(node);
        }
        if !self.batching {
            self.settle();
        }
    }

    fn settle(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let roots = std::mem::take(&mut self.pending);
        let order = self.deps.affected(roots.iter().copied());
        let mut changed: HashSet<NodeId> = roots.into_iter().collect();

        self.last_settle.clear();
        for node in order {
            if node.is_input() {
                continue;
            }
            if !self.deps.dependencies(node).any(|dep| changed.contains(&dep)) {
                continue;
            }
            *self.recomputes.entry(node).or_default() += 1;
            self.last_settle.push(node);
            if self.recompute(node) {
                *self.revisions.entry(node).or_default() += 1;
                changed.insert(node);
            }
        }
        trace!("settled {:?}", self.last_settle);
    }

    /// Returns whether the node's value changed
    fn recompute(&mut self, node: NodeId) -> bool {
        match node {
            NodeId::Fit => {
                let key = self.viewport.fit_key();
                if self.fit == Some(key) {
                    return false;
                }
                self.fit = Some(key);
                true
            }
            NodeId::FittedSet => {
                let Some(key) = self.fit else {
                    return false;
                };
                self.fitted = self.factory.build_for(key);
                debug!(
                    "fitted {} projection(s) to {}x{} (vertical: {})",
                    self.fitted.len(),
                    key.width,
                    key.height,
                    key.vertical
                );
                true
            }
            NodeId::LiveProjections => {
                let live = rescale(&self.fitted, &self.transform);
                if live == self.live {
                    return false;
                }
                self.live = live;
                true
            }
            NodeId::ProjectedData => {
                self.projected = self.generator.generate(&self.live, self.features.features());
                debug!(
                    "projected {} feature(s) through {} projection(s)",
                    self.projected.first().map_or(0, Vec::len),
                    self.projected.len()
                );
                true
            }
            NodeId::ColorScale(dim) => {
                let scale = self.palette.scale_for(&self.categories[dim as usize]);
                let slot = &mut self.scales[dim as usize];
                if *slot == scale {
                    return false;
                }
                debug!("{dim} colour scale now has {} entries", scale.len());
                *slot = scale;
                true
            }
            NodeId::Viewport | NodeId::Transform | NodeId::Features | NodeId::Categories(_) => false,
        }
    }
}

/// Input writes deferred until the end of [`MapGraph::batch`]
pub struct Batch<'g> {
    graph: &'g mut MapGraph,
}

impl Batch<'_> {
    pub fn set_viewport_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.graph.set_viewport_size(width, height)
    }

    pub fn set_orientation(&mut self, orientation: OrientationSource) {
        self.graph.set_orientation(orientation);
    }

    pub fn set_transform(&mut self, transform: Transform) -> Result<()> {
        self.graph.set_transform(transform)
    }

    pub fn set_categories(&mut self, dimension: Dimension, categories: Vec<Category>) {
        self.graph.set_categories(dimension, categories);
    }

    pub fn publish_features(&mut self, result: anyhow::Result<Vec<Feature>>) -> bool {
        self.graph.publish_features(result)
    }
}

impl std::fmt::Debug for MapGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapGraph")
            .field("viewport", &self.viewport)
            .field("transform", &self.transform)
            .field("features", &self.features.features().len())
            .field("projections", &self.fitted.len())
            .finish_non_exhaustive()
    }
}
