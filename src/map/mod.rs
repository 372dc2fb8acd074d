mod factory;
mod generator;
mod globe;
mod path;
mod projection;
mod rescale;
mod view;

pub use factory::{
    Baseline, FittedProjection, ProjectionFactory, LOWER_HEMISPHERE, UPPER_HEMISPHERE, WORLD_ROTATION,
};
pub use generator::{PathDescriptor, PathGenerator, DEFAULT_EXCLUDED};
pub use path::{GeoPath, ProjectedShape};
pub use projection::{Projection, ProjectionKind, Rotation};
pub use rescale::rescale;
pub use view::{FitKey, OrientationSource, Transform, ViewportState, MAX_ZOOM, MIN_ZOOM};
