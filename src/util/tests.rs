use super::{Vec3D, clamp_abs, clamp_unit, interpolate, wrap_angle};
use std::f64::consts::{FRAC_PI_2, PI};

const EPS: f64 = 1e-9;

#[test]
fn test_wrap_angle() {
    assert!((wrap_angle(3.0 * PI) - PI).abs() < EPS);
    assert!((wrap_angle(-3.0 * PI) - PI).abs() < EPS);
    assert!((wrap_angle(FRAC_PI_2) - FRAC_PI_2).abs() < EPS);
    assert!((wrap_angle(2.0 * PI + 0.25) - 0.25).abs() < EPS);
    assert!((wrap_angle(-0.25) + 0.25).abs() < EPS);
}

#[test]
fn test_clamps_reject_non_finite() {
    assert_eq!(clamp_abs(f64::NAN, 1.0), 0.0);
    assert_eq!(clamp_abs(-3.0, 1.0), -1.0);
    assert_eq!(clamp_unit(f64::INFINITY), 0.0);
    assert_eq!(clamp_unit(1.7), 1.0);
    assert_eq!(clamp_unit(-0.2), 0.0);
}

#[test]
fn test_interpolate_table() {
    let table = [(0.0, 3.0), (0.5, 3.7), (1.0, 4.2)];
    assert!((interpolate(&table, 0.25).unwrap() - 3.35).abs() < EPS);
    assert_eq!(interpolate(&table, -1.0), Some(3.0));
    assert_eq!(interpolate(&table, 2.0), Some(4.2));
    assert_eq!(interpolate(&[], 0.3), None);
}

#[test]
fn test_vec3d_bearing_and_distance() {
    let origin = Vec3D::<f64>::new(0.0, 0.0, 100.0);
    let north = Vec3D::new(0.0, 1000.0, 100.0);
    let east = Vec3D::new(1000.0, 0.0, 100.0);
    assert!(origin.bearing_to(&north).abs() < EPS);
    assert!((origin.bearing_to(&east) - FRAC_PI_2).abs() < EPS);
    assert!((origin.euclid_distance(&east) - 1000.0).abs() < EPS);
    let unit = Vec3D::<f64>::new(3.0, 4.0, 0.0).normalize();
    assert!((unit.abs() - 1.0).abs() < EPS);
    assert_eq!(Vec3D::<f64>::zero().normalize(), Vec3D::zero());
}

#[test]
fn test_vec3d_finiteness() {
    assert!(Vec3D::<f64>::new(1.0, -2.0, 3.0).is_finite());
    assert!(!Vec3D::new(f64::NAN, 0.0, 0.0).is_finite());
    assert!(!Vec3D::new(0.0, f64::INFINITY, 0.0).is_finite());
    assert!(!Vec3D::new(0.0, 0.0, f64::NEG_INFINITY).is_finite());
}
