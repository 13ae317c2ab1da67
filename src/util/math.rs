use std::f64::consts::{PI, TAU};

/// Wraps an angle in radians into `(-pi, pi]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Clamps `value` into `[-limit, limit]`. Non-finite input collapses to zero.
pub fn clamp_abs(value: f64, limit: f64) -> f64 {
    if value.is_finite() { value.clamp(-limit, limit) } else { 0.0 }
}

/// Clamps `value` into `[0, 1]`. Non-finite input collapses to zero.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 }
}

/// Linear interpolation over a table of `(x, y)` points sorted by ascending `x`.
/// Values outside the table are held at the nearest endpoint.
pub fn interpolate(table: &[(f64, f64)], x: f64) -> Option<f64> {
    let (first, last) = (table.first()?, table.last()?);
    if x <= first.0 {
        return Some(first.1);
    }
    if x >= last.0 {
        return Some(last.1);
    }
    table.windows(2).find(|w| x >= w[0].0 && x <= w[1].0).map(|w| {
        let span = w[1].0 - w[0].0;
        if span <= 0.0 { w[0].1 } else { w[0].1 + (x - w[0].0) / span * (w[1].1 - w[0].1) }
    })
}
