use glam::DVec3;
use std::f64::consts::PI;

use crate::geo::asin_clamped;

/// Horizon arcs are subdivided into steps of at most this many degrees.
const HORIZON_STEP_DEG: f64 = 5.0;

/// Convert rotated lambda/phi (radians) to a unit sphere vector.
/// +x faces the viewer, so x > 0 is the visible hemisphere.
#[inline(always)]
pub fn to_vec3(lambda: f64, phi: f64) -> DVec3 {
    let cos_phi = phi.cos();
    DVec3::new(cos_phi * lambda.cos(), cos_phi * lambda.sin(), phi.sin())
}

/// Convert a unit vector back to lambda/phi (radians).
#[inline(always)]
pub fn from_vec3(v: DVec3) -> (f64, f64) {
    (v.y.atan2(v.x), asin_clamped(v.z))
}

/// Orthographic raw coordinates of a unit vector (its y/z components).
#[inline(always)]
pub fn orthographic_raw(v: DVec3) -> (f64, f64) {
    (v.y, v.z)
}

/// Where the great-circle arc from `a` to `b` crosses the horizon (x = 0).
///
/// Callers only ask this when exactly one endpoint is visible, so the arc
/// crosses once. The crossing lies on the line shared by the arc's plane and
/// the horizon plane; of the two antipodal candidates, the one between the
/// endpoints is returned.
pub fn horizon_crossing(a: DVec3, b: DVec3) -> DVec3 {
    let normal = a.cross(b);
    let dir = normal.cross(DVec3::X);

    if dir.length_squared() < 1e-24 {
        // Degenerate arc (coincident, antipodal, or lying in the horizon
        // plane): fall back to the chord crossing.
        let t = if (a.x - b.x).abs() > 1e-12 { a.x / (a.x - b.x) } else { 0.5 };
        let p = a + (b - a) * t;
        let p = DVec3::new(0.0, p.y, p.z);
        return if p.length_squared() > 1e-24 { p.normalize() } else { DVec3::Z };
    }

    let dir = dir.normalize();
    if dir.dot(a + b) >= 0.0 {
        dir
    } else {
        -dir
    }
}

/// Walk the horizon circle clockwise on screen (towards decreasing
/// [`horizon_angle`]) from `from` to `to`, calling a visitor for each
/// subdivision point and ending with `to`. No allocation.
pub fn walk_horizon(from: DVec3, to: DVec3, mut visitor: impl FnMut(DVec3)) {
    let start = horizon_angle(from);
    let sweep = (start - horizon_angle(to)).rem_euclid(2.0 * PI);
    let steps = ((sweep.to_degrees() / HORIZON_STEP_DEG).ceil() as usize).max(1);

    for i in 1..steps {
        let angle = start - sweep * i as f64 / steps as f64;
        visitor(DVec3::new(0.0, angle.cos(), angle.sin()));
    }
    visitor(DVec3::new(0.0, to.y, to.z).normalize_or_zero());
}

/// Angle of a horizon point around the visible disk, used to order crossings.
#[inline(always)]
pub fn horizon_angle(v: DVec3) -> f64 {
    v.z.atan2(v.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_vec3_round_trip() {
        let v = to_vec3(0.4, -0.3);
        let (l, p) = from_vec3(v);
        assert!((l - 0.4).abs() < 1e-12);
        assert!((p + 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_horizon_crossing_on_equator() {
        let a = to_vec3(0.0, 0.0);
        let b = to_vec3(PI * 0.75, 0.0);
        let c = horizon_crossing(a, b);
        assert!(c.x.abs() < 1e-12);
        assert!((c.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_horizon_crossing_picks_near_side() {
        let a = to_vec3(0.0, 0.2);
        let b = to_vec3(-PI * 0.6, 0.1);
        let c = horizon_crossing(a, b);
        assert!(c.x.abs() < 1e-9);
        assert!(c.y < 0.0);
    }

    #[test]
    fn test_walk_horizon_stays_on_circle() {
        let mut points = Vec::new();
        walk_horizon(DVec3::Z, DVec3::Y, |p| points.push(p));
        assert!((18..=19).contains(&points.len()));
        for p in &points {
            assert!(p.x.abs() < 1e-12);
            assert!((p.length() - 1.0).abs() < 1e-9);
            assert!(p.y >= -1e-12 && p.z >= -1e-12);
        }
        assert!((points.last().unwrap().y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_walk_horizon_turns_clockwise() {
        // Y to Z clockwise is three quarters of the circle, through -Z
        let mut points = Vec::new();
        walk_horizon(DVec3::Y, DVec3::Z, |p| points.push(p));
        assert!((54..=55).contains(&points.len()));
        assert!(points.iter().any(|p| p.z < -0.99));
        assert!(points[..points.len() - 1].iter().all(|p| !(p.y > 0.01 && p.z > 0.01)));
        assert!((points.last().unwrap().z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_walk_horizon_antipodal() {
        let mut points = Vec::new();
        walk_horizon(DVec3::Y, -DVec3::Y, |p| points.push(p));
        assert!(points.len() > 2);
        assert!(points.iter().any(|p| p.z < -0.99));
        assert!((points.last().unwrap().y + 1.0).abs() < 1e-9);
    }
}
