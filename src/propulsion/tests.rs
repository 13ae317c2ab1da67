use super::{
    Fault, HealthStatus, Lifecycle, LifecycleState, PropulsionError, PropulsionHealth,
    check_thrust_command, check_thrust_vector,
};
use crate::util::Vec3D;

#[test]
fn test_health_status_ordering() {
    assert!(HealthStatus::Ok < HealthStatus::Degraded);
    assert!(HealthStatus::Degraded < HealthStatus::Critical);
    assert!(HealthStatus::Critical < HealthStatus::Failed);
    assert_eq!(HealthStatus::Degraded.worst(HealthStatus::Ok), HealthStatus::Degraded);
    assert_eq!(HealthStatus::Ok.to_string(), "OK");
    assert_eq!(HealthStatus::Failed.to_string(), "Failed");
}

#[test]
fn test_overall_health_is_worst_component() {
    let health = PropulsionHealth::from_components(
        HealthStatus::Ok,
        HealthStatus::Degraded,
        HealthStatus::Ok,
        HealthStatus::Critical,
        HealthStatus::Ok,
        vec![Fault::new("f1", "fuel", 1.7, "pump pressure low".into())],
    );
    assert_eq!(health.overall_health, HealthStatus::Critical);
    assert!((health.active_faults[0].severity - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_lifecycle_happy_path() {
    let mut lifecycle = Lifecycle::new();
    assert!(lifecycle.require_running("set_thrust_command").is_err());
    lifecycle.initialize().unwrap();
    lifecycle.initialize().unwrap();
    lifecycle.start().unwrap();
    lifecycle.start().unwrap();
    assert!(lifecycle.require_running("set_thrust_command").is_ok());
    lifecycle.stop().unwrap();
    lifecycle.stop().unwrap();
    assert_eq!(lifecycle.state(), LifecycleState::Stopped);
}

#[test]
fn test_lifecycle_rejects_out_of_order() {
    let mut lifecycle = Lifecycle::new();
    assert_eq!(
        lifecycle.start(),
        Err(PropulsionError::Lifecycle { operation: "start", state: LifecycleState::Uninitialized })
    );
    assert!(lifecycle.stop().is_err());
    lifecycle.initialize().unwrap();
    lifecycle.start().unwrap();
    assert!(lifecycle.initialize().is_err());
    lifecycle.stop().unwrap();
    assert!(lifecycle.start().is_err());
}

#[test]
fn test_shutdown_is_terminal() {
    let mut lifecycle = Lifecycle::new();
    lifecycle.shut_down();
    assert_eq!(lifecycle.state(), LifecycleState::ShutDown);
    assert!(lifecycle.stop().is_ok());
    assert!(lifecycle.initialize().is_err());
    assert!(lifecycle.start().is_err());
}

#[test]
fn test_thrust_command_range() {
    assert_eq!(check_thrust_command(0.0), Ok(0.0));
    assert_eq!(check_thrust_command(1.0), Ok(1.0));
    assert!(check_thrust_command(1.01).is_err());
    assert!(check_thrust_command(-0.1).is_err());
    assert!(check_thrust_command(f64::NAN).is_err());
}

#[test]
fn test_thrust_vector_norm() {
    assert!(check_thrust_vector(Vec3D::new(0.0, 0.0, 1.0)).is_ok());
    assert!(check_thrust_vector(Vec3D::new(0.0, 1.05, 0.0)).is_ok());
    assert!(check_thrust_vector(Vec3D::new(0.0, 0.5, 0.0)).is_err());
    assert!(check_thrust_vector(Vec3D::new(f64::INFINITY, 0.0, 0.0)).is_err());
}
