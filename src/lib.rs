//! Reactive world-map geometry and categorical colour scales.
//!
//! [`graph::MapGraph`] derives fitted projections, live (pan/zoom) projections,
//! per-projection SVG path descriptors and one colour scale per category
//! dimension from a handful of inputs.

pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod graph;
pub mod logging;
pub mod map;
pub mod palette;

pub use config::MapConfig;
pub use error::{MapError, Result};
pub use graph::{MapGraph, NodeId};
