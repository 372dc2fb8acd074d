use crate::map::factory::FittedProjection;
use crate::map::projection::Projection;
use crate::map::view::Transform;

/// Apply the live pan/zoom transform to fitted projections.
///
/// Scale becomes `baseline.scale * k`. Translate is replaced by `(x, y)`
/// outright: the baseline translate (including the per-hemisphere offsets
/// of the vertical layout) is not added back. Rotation and the fit are left
/// untouched, so the sphere outline is never re-measured here.
pub fn rescale(fitted: &[FittedProjection], transform: &Transform) -> Vec<Projection> {
    fitted
        .iter()
        .map(|fp| {
            fp.projection
                .clone()
                .with_scale(fp.baseline.scale * transform.k)
                .with_translate([transform.x, transform.y])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::factory::ProjectionFactory;
    use crate::map::view::FitKey;

    fn vertical_set() -> Vec<FittedProjection> {
        ProjectionFactory::default().build_for(FitKey {
            width: 400.0,
            height: 800.0,
            vertical: true,
        })
    }

    #[test]
    fn test_identity_keeps_scale_and_zeroes_translate() {
        let set = vertical_set();
        let live = rescale(&set, &Transform::IDENTITY);
        for (p, fp) in live.iter().zip(&set) {
            assert_eq!(p.scale(), fp.baseline.scale);
            assert_eq!(p.translate(), [0.0, 0.0]);
        }
    }

    #[test]
    fn test_zoom_multiplies_baseline_scale() {
        let set = vertical_set();
        let t = Transform::new(2.5, 30.0, -12.0).unwrap();
        let live = rescale(&set, &t);
        for (p, fp) in live.iter().zip(&set) {
            assert_eq!(p.scale(), fp.baseline.scale * 2.5);
            assert_eq!(p.translate(), [30.0, -12.0]);
            assert_eq!(p.rotation(), fp.projection.rotation());
        }
    }

    #[test]
    fn test_repeated_rescale_does_not_compound() {
        let set = vertical_set();
        let t = Transform::new(2.0, 0.0, 0.0).unwrap();
        let once = rescale(&set, &t);
        let twice = rescale(&set, &t);
        assert_eq!(once, twice);
    }
}
