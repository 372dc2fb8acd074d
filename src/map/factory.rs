use serde::Serialize;

use crate::map::projection::{Projection, Rotation};
use crate::map::view::{FitKey, ViewportState};

/// Rotations centring the two hemispheres of the vertical layout
/// (Asia centred on 75°E on top, the Americas centred on 70°W below).
pub const UPPER_HEMISPHERE: Rotation = Rotation { lambda: -75.0, phi: -10.0, gamma: 0.0 };
pub const LOWER_HEMISPHERE: Rotation = Rotation { lambda: 70.0, phi: -10.0, gamma: 0.0 };
/// Longitude shift of the wide world view
pub const WORLD_ROTATION: Rotation = Rotation { lambda: -6.0, phi: 0.0, gamma: 0.0 };

/// Scale and translate read back from a projection right after it was fitted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Baseline {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Baseline {
    pub fn capture(projection: &Projection) -> Self {
        let [translate_x, translate_y] = projection.translate();
        Self {
            scale: projection.scale(),
            translate_x,
            translate_y,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.scale.is_finite() && self.translate_x.is_finite() && self.translate_y.is_finite()
    }
}

/// A fitted projection travelling together with its baseline
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FittedProjection {
    pub projection: Projection,
    pub baseline: Baseline,
}

impl FittedProjection {
    fn new(projection: Projection) -> Self {
        let baseline = Baseline::capture(&projection);
        Self { projection, baseline }
    }
}

/// Builds the base projections for a viewport
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionFactory {
    pub upper: Rotation,
    pub lower: Rotation,
    pub world: Rotation,
}

impl Default for ProjectionFactory {
    fn default() -> Self {
        Self {
            upper: UPPER_HEMISPHERE,
            lower: LOWER_HEMISPHERE,
            world: WORLD_ROTATION,
        }
    }
}

impl ProjectionFactory {
    pub fn build(&self, viewport: &ViewportState) -> Vec<FittedProjection> {
        self.build_for(viewport.fit_key())
    }

    /// Vertical: two globes fitted to a `[w, w]` square, shifted to the upper
    /// and lower quarter of the viewport. Wide: one Equal Earth map fitted to
    /// `[w, h]` with its translate reset to the origin.
    pub fn build_for(&self, key: FitKey) -> Vec<FittedProjection> {
        let FitKey { width: w, height: h, vertical } = key;

        let projections = if vertical {
            vec![
                Projection::orthographic()
                    .fit_size([w, w])
                    .with_translate([0.0, -h * 0.25])
                    .with_rotation(self.upper),
                Projection::orthographic()
                    .fit_size([w, w])
                    .with_translate([0.0, h * 0.25])
                    .with_rotation(self.lower),
            ]
        } else {
            vec![Projection::equal_earth()
                .fit_size([w, h])
                .with_translate([0.0, 0.0])
                .with_rotation(self.world)]
        };

        projections.into_iter().map(FittedProjection::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::projection::ProjectionKind;
    use crate::map::view::OrientationSource;

    fn key(width: f64, height: f64, vertical: bool) -> FitKey {
        FitKey { width, height, vertical }
    }

    #[test]
    fn test_wide_builds_one_equal_earth() {
        let set = ProjectionFactory::default().build_for(key(960.0, 500.0, false));
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].projection.kind(), ProjectionKind::EqualEarth);
        assert_eq!(set[0].projection.rotation(), WORLD_ROTATION);
        assert_eq!(set[0].baseline.translate_x, 0.0);
        assert_eq!(set[0].baseline.translate_y, 0.0);
    }

    #[test]
    fn test_vertical_builds_two_hemispheres() {
        let set = ProjectionFactory::default().build_for(key(400.0, 800.0, true));
        assert_eq!(set.len(), 2);
        for fp in &set {
            assert_eq!(fp.projection.kind(), ProjectionKind::Orthographic);
            assert!((fp.baseline.scale - 200.0).abs() < 1e-9);
        }
        assert_eq!(set[0].baseline.translate_y, -200.0);
        assert_eq!(set[1].baseline.translate_y, 200.0);
        assert_eq!(set[0].projection.rotation(), UPPER_HEMISPHERE);
        assert_eq!(set[1].projection.rotation(), LOWER_HEMISPHERE);
    }

    #[test]
    fn test_hemisphere_centres() {
        // Asia faces the viewer on the upper globe, the Americas on the lower
        for (rotation, lon) in [(UPPER_HEMISPHERE, 75.0_f64), (LOWER_HEMISPHERE, -70.0_f64)] {
            let (lambda, phi) = rotation.rotator().rotate(lon.to_radians(), 10.0_f64.to_radians());
            assert!(lambda.abs() < 1e-9, "{lon}: lambda {lambda}");
            assert!(phi.abs() < 1e-9, "{lon}: phi {phi}");
        }
    }

    #[test]
    fn test_baseline_matches_projection() {
        for vertical in [false, true] {
            for fp in ProjectionFactory::default().build_for(key(640.0, 480.0, vertical)) {
                assert_eq!(fp.baseline, Baseline::capture(&fp.projection));
            }
        }
    }

    #[test]
    fn test_zero_viewport_is_finite() {
        for vertical in [false, true] {
            for fp in ProjectionFactory::default().build_for(key(0.0, 0.0, vertical)) {
                assert!(fp.projection.is_finite());
                assert!(fp.baseline.is_finite());
            }
        }
    }

    #[test]
    fn test_build_uses_viewport_orientation() {
        let vp = ViewportState::new(800.0, 600.0)
            .unwrap()
            .with_orientation(OrientationSource::Fixed(true));
        assert_eq!(ProjectionFactory::default().build(&vp).len(), 2);
    }
}
