use serde::Serialize;
use std::f64::consts::PI;

use crate::geo::{asin_clamped, finite_or_zero, wrap_lambda};

/// Points within this distance behind the horizon still count as visible.
pub(crate) const CLIP_EPSILON: f64 = 1e-6;

// Equal Earth polynomial coefficients (Šavrič, Patterson & Jenny 2018)
const A1: f64 = 1.340264;
const A2: f64 = -0.081106;
const A3: f64 = 0.000893;
const A4: f64 = 0.003796;
const M: f64 = 0.866_025_403_784_438_6; // sqrt(3) / 2

/// The cartographic projections the map knows how to draw
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Hemisphere view of the globe, clipped at the horizon
    Orthographic,
    /// Equal-area pseudocylindrical world view
    EqualEarth,
}

impl ProjectionKind {
    /// Raw (unit-scale) projection of rotated coordinates in radians.
    #[inline(always)]
    pub fn raw(self, lambda: f64, phi: f64) -> (f64, f64) {
        match self {
            ProjectionKind::Orthographic => (phi.cos() * lambda.sin(), phi.sin()),
            ProjectionKind::EqualEarth => {
                let l = asin_clamped(M * phi.sin());
                let l2 = l * l;
                let l6 = l2 * l2 * l2;
                (
                    lambda * l.cos() / (M * (A1 + 3.0 * A2 * l2 + l6 * (7.0 * A3 + 9.0 * A4 * l2))),
                    l * (A1 + A2 * l2 + l6 * (A3 + A4 * l2)),
                )
            }
        }
    }

    /// Half width and half height of the projected sphere outline at unit scale.
    /// Both outlines are symmetric about the origin regardless of rotation.
    pub fn sphere_half_extent(self) -> (f64, f64) {
        match self {
            ProjectionKind::Orthographic => (1.0, 1.0),
            ProjectionKind::EqualEarth => {
                let (x, _) = self.raw(PI, 0.0);
                let (_, y) = self.raw(0.0, PI / 2.0);
                (x, y)
            }
        }
    }
}

/// Three-axis spherical rotation in degrees: longitude shift, then tilt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Rotation {
    pub lambda: f64,
    pub phi: f64,
    pub gamma: f64,
}

impl Rotation {
    pub fn new(lambda: f64, phi: f64) -> Self {
        Self { lambda, phi, gamma: 0.0 }
    }

    /// Precompute the trig needed to rotate many points
    pub fn rotator(&self) -> Rotator {
        let (sin_phi, cos_phi) = self.phi.to_radians().sin_cos();
        let (sin_gamma, cos_gamma) = self.gamma.to_radians().sin_cos();
        Rotator {
            delta_lambda: self.lambda.to_radians(),
            tilted: self.phi != 0.0 || self.gamma != 0.0,
            cos_phi,
            sin_phi,
            cos_gamma,
            sin_gamma,
        }
    }
}

/// Rotation with cached sines and cosines
#[derive(Clone, Copy, Debug)]
pub struct Rotator {
    delta_lambda: f64,
    tilted: bool,
    cos_phi: f64,
    sin_phi: f64,
    cos_gamma: f64,
    sin_gamma: f64,
}

impl Rotator {
    /// Rotate a (lambda, phi) pair given in radians.
    #[inline]
    pub fn rotate(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let lambda = wrap_lambda(lambda + self.delta_lambda);
        if !self.tilted {
            return (lambda, phi);
        }

        let cos_p = phi.cos();
        let x = lambda.cos() * cos_p;
        let y = lambda.sin() * cos_p;
        let z = phi.sin();
        let k = z * self.cos_phi + x * self.sin_phi;

        (
            (y * self.cos_gamma - k * self.sin_gamma).atan2(x * self.cos_phi - z * self.sin_phi),
            asin_clamped(k * self.cos_gamma + y * self.sin_gamma),
        )
    }
}

/// A map projection: raw kind plus scale, translate and rotation.
///
/// Builder methods consume and return `self` so a projection can be set up
/// in one chain, e.g. `Projection::new(kind).fit_size(..).with_translate(..)`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Projection {
    kind: ProjectionKind,
    scale: f64,
    translate: [f64; 2],
    rotation: Rotation,
}

impl Projection {
    pub fn new(kind: ProjectionKind) -> Self {
        Self {
            kind,
            scale: 150.0,
            translate: [480.0, 250.0],
            rotation: Rotation::default(),
        }
    }

    pub fn orthographic() -> Self {
        Self::new(ProjectionKind::Orthographic)
    }

    pub fn equal_earth() -> Self {
        Self::new(ProjectionKind::EqualEarth)
    }

    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> [f64; 2] {
        self.translate
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.set_scale(scale);
        self
    }

    pub fn with_translate(mut self, translate: [f64; 2]) -> Self {
        self.set_translate(translate);
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = finite_or_zero(scale);
    }

    pub fn set_translate(&mut self, translate: [f64; 2]) {
        self.translate = [finite_or_zero(translate[0]), finite_or_zero(translate[1])];
    }

    /// Fit the full sphere outline into a `[width, height]` box anchored at
    /// the origin. Negative or non-finite sizes are treated as zero, so a
    /// collapsed viewport yields a zero scale rather than NaN.
    pub fn fit_size(mut self, size: [f64; 2]) -> Self {
        let w = finite_or_zero(size[0]).max(0.0);
        let h = finite_or_zero(size[1]).max(0.0);
        let (hx, hy) = self.kind.sphere_half_extent();

        self.scale = (w / (2.0 * hx)).min(h / (2.0 * hy));
        self.translate = [w / 2.0, h / 2.0];
        self
    }

    /// Whether a rotated point (radians) is on the drawable side of the clip.
    #[inline]
    pub fn is_visible_rotated(&self, lambda: f64, phi: f64) -> bool {
        match self.kind {
            ProjectionKind::Orthographic => lambda.cos() * phi.cos() > -CLIP_EPSILON,
            ProjectionKind::EqualEarth => true,
        }
    }

    /// Scale and translate a raw projected point into screen space (y down).
    #[inline(always)]
    pub fn to_screen(&self, raw: (f64, f64)) -> [f64; 2] {
        [
            self.translate[0] + self.scale * raw.0,
            self.translate[1] - self.scale * raw.1,
        ]
    }

    /// Project a geographic coordinate (lon, lat in degrees) to screen space.
    /// Returns `None` for points clipped away (the far side of the globe).
    pub fn project(&self, lon: f64, lat: f64) -> Option<[f64; 2]> {
        let (lambda, phi) = self.rotation.rotator().rotate(lon.to_radians(), lat.to_radians());
        if !self.is_visible_rotated(lambda, phi) {
            return None;
        }
        Some(self.to_screen(self.kind.raw(lambda, phi)))
    }

    /// True when every parameter is a finite number
    pub fn is_finite(&self) -> bool {
        self.scale.is_finite()
            && self.translate.iter().all(|t| t.is_finite())
            && self.rotation.lambda.is_finite()
            && self.rotation.phi.is_finite()
            && self.rotation.gamma.is_finite()
    }
}
