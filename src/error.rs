use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::graph::CycleError;

/// Errors raised by input validation, configuration and topology decoding.
///
/// Failures inside the derived part of the graph never surface here; they
/// are absorbed at the node that produced them.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("viewport dimensions must be finite and non-negative, got {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },

    #[error("transform must have a finite positive k and finite offsets, got k={k} x={x} y={y}")]
    InvalidTransform { k: f64, x: f64, y: f64 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid topology: {0}")]
    Topology(String),

    #[error("dependency {from} -> {to} would create a cycle")]
    Cycle { from: String, to: String },
}

impl<K: fmt::Debug> From<CycleError<K>> for MapError {
    fn from(err: CycleError<K>) -> Self {
        MapError::Cycle {
            from: format!("{:?}", err.from),
            to: format!("{:?}", err.to),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
