use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// Zoom limits applied by the gesture helpers on [`Transform`]
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 100.0;

/// Where the vertical/wide orientation flag comes from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationSource {
    /// Vertical whenever the viewport is taller than it is wide
    #[default]
    Derived,
    /// Supplied by an external device/media signal
    Fixed(bool),
}

/// What a projection fit depends on; the projection set is rebuilt only
/// when this changes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FitKey {
    pub width: f64,
    pub height: f64,
    pub vertical: bool,
}

/// Viewport size in pixels plus the orientation it implies
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ViewportState {
    width: f64,
    height: f64,
    orientation: OrientationSource,
}

impl ViewportState {
    /// Dimensions must be finite and non-negative; zero is allowed.
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0) {
            return Err(MapError::InvalidViewport { width, height });
        }
        Ok(Self {
            width,
            height,
            orientation: OrientationSource::Derived,
        })
    }

    pub fn with_orientation(mut self, orientation: OrientationSource) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn orientation(&self) -> OrientationSource {
        self.orientation
    }

    pub fn vertical(&self) -> bool {
        match self.orientation {
            OrientationSource::Derived => self.height > self.width,
            OrientationSource::Fixed(vertical) => vertical,
        }
    }

    pub fn fit_key(&self) -> FitKey {
        FitKey {
            width: self.width,
            height: self.height,
            vertical: self.vertical(),
        }
    }
}

/// Pan/zoom state: screen = k * base + (x, y).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform { k: 1.0, x: 0.0, y: 0.0 };

    /// `k` must be finite and positive, offsets finite.
    pub fn new(k: f64, x: f64, y: f64) -> Result<Self> {
        if !(k.is_finite() && k > 0.0 && x.is_finite() && y.is_finite()) {
            return Err(MapError::InvalidTransform { k, x, y });
        }
        Ok(Self { k, x, y })
    }

    /// Pan by a pixel delta
    pub fn pan(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Zoom by `factor` keeping the screen point (px, py) fixed
    pub fn zoom_at(self, px: f64, py: f64, factor: f64) -> Self {
        let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let applied = k / self.k;
        Self {
            k,
            x: px - (px - self.x) * applied,
            y: py - (py - self.y) * applied,
        }
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(self, px: f64, py: f64) -> Self {
        self.zoom_at(px, py, 1.5)
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(self, px: f64, py: f64) -> Self {
        self.zoom_at(px, py, 1.0 / 1.5)
    }

    /// Map a screen point back into untransformed coordinates
    pub fn invert(&self, px: f64, py: f64) -> (f64, f64) {
        ((px - self.x) / self.k, (py - self.y) / self.k)
    }
}
