use std::f64::consts::PI;

/// Wrap a longitude in radians into [-PI, PI]
#[inline(always)]
pub fn wrap_lambda(lambda: f64) -> f64 {
    if lambda > PI {
        lambda - 2.0 * PI
    } else if lambda < -PI {
        lambda + 2.0 * PI
    } else {
        lambda
    }
}

/// Clamp to [-1, 1] before asin so rounding never yields NaN
#[inline(always)]
pub fn asin_clamped(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}

/// Replace NaN/infinite values with zero
#[inline(always)]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}
