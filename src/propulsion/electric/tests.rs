use super::{BatteryConfig, BatteryModel, ElectricConfig, ElectricPropulsion, MotorConfig, MotorModel};
use crate::log;
use crate::propulsion::{HealthStatus, LifecycleState, PropulsionError, PropulsionSystem, PropulsionType};
use crate::util::Vec3D;
use std::time::Duration;

const STEP: Duration = Duration::from_millis(100);

async fn running_propulsion() -> ElectricPropulsion {
    let propulsion = ElectricPropulsion::new(ElectricConfig::default());
    propulsion.initialize().await.unwrap();
    propulsion.start().await.unwrap();
    propulsion
}

#[test]
fn test_battery_starts_full() {
    let battery = BatteryModel::new(BatteryConfig::default());
    assert!((battery.soc() - 1.0).abs() < f64::EPSILON);
    assert_eq!(battery.cell_voltages().len(), 6);
    // 10 Ah at 22.2 V
    assert!((battery.total_energy_wh() - 222.0).abs() < 1e-9);
    assert!((battery.remaining_energy_wh() - 222.0).abs() < 1e-9);
}

#[test]
fn test_battery_voltage_curve_lookup() {
    let battery = BatteryModel::new(BatteryConfig::default());
    assert!((battery.voltage_to_soc(3.73, 1.0) - 0.5).abs() < 1e-9);
    assert!((battery.voltage_to_soc(4.5, 1.0) - 1.0).abs() < 1e-9);
    assert!(battery.voltage_to_soc(2.5, 1.0).abs() < 1e-9);
    // the sagged curve reads the same voltage as more charge
    assert!(battery.voltage_to_soc(3.63, 5.0) > battery.voltage_to_soc(3.63, 1.0));
    assert!((battery.open_circuit_cell_voltage(0.5) - 3.73).abs() < 1e-9);
}

#[test]
fn test_battery_discharges_under_load() {
    let mut battery = BatteryModel::new(BatteryConfig::default());
    for _ in 0..600 {
        battery.update(24.0, 40.0, None, Duration::from_secs(1));
    }
    log!("SOC after 10 min at 40 A: {:.3}", battery.soc());
    // the loaded curve keeps pulling the estimate towards the measured voltage
    assert!(battery.soc() < 0.95);
    assert!(battery.energy_used_wh() > 150.0);
}

#[test]
fn test_battery_endurance_prediction() {
    let battery = BatteryModel::new(BatteryConfig::default());
    assert!((battery.predict_endurance(222.0).as_secs_f64() - 3600.0).abs() < 1e-3);
    assert_eq!(battery.predict_endurance(0.0), Duration::MAX);
}

#[test]
fn test_motor_thermal_derating() {
    let mut motor = MotorModel::new(MotorConfig::default());
    assert!((motor.max_throttle() - 1.0).abs() < f64::EPSILON);
    for _ in 0..2000 {
        motor.update(22.0, 1.0, 25.0, 0.0, Duration::from_secs(1));
    }
    log!("Winding temperature at full throttle: {:.1}", motor.winding_temp());
    assert!(motor.max_throttle() < 1.0);
}

#[tokio::test]
async fn test_electric_lifecycle_gates_commands() {
    let propulsion = ElectricPropulsion::new(ElectricConfig::default());
    assert!(matches!(
        propulsion.set_thrust_command(0.5),
        Err(PropulsionError::Lifecycle { .. })
    ));
    propulsion.initialize().await.unwrap();
    assert!(propulsion.set_thrust_command(0.5).is_err());
    propulsion.start().await.unwrap();
    propulsion.set_thrust_command(0.5).unwrap();
    assert!((propulsion.thrust_command() - 0.5).abs() < f64::EPSILON);
    assert!(matches!(
        propulsion.set_thrust_command(1.5),
        Err(PropulsionError::OutOfRange { .. })
    ));
    propulsion.stop().unwrap();
    assert!(propulsion.set_thrust_command(0.5).is_err());
    assert_eq!(propulsion.propulsion_type(), PropulsionType::Electric);
}

#[tokio::test]
async fn test_electric_thrust_vector() {
    let propulsion = running_propulsion().await;
    propulsion.set_thrust_vector(Vec3D::new(0.0, 0.0, 1.02)).unwrap();
    let capability = propulsion.thrust_capability();
    assert!((capability.thrust_vector.abs() - 1.0).abs() < 1e-9);
    assert!(propulsion.set_thrust_vector(Vec3D::new(0.0, 0.0, 0.3)).is_err());
}

#[tokio::test]
async fn test_electric_step_consumes_energy() {
    let propulsion = running_propulsion().await;
    let before = propulsion.energy_state();
    propulsion.set_thrust_command(0.6).unwrap();
    for _ in 0..3000 {
        propulsion.step(STEP, 20.0);
    }
    let after = propulsion.energy_state();
    log!("SOC {:.3} -> {:.3}", before.battery_soc, after.battery_soc);
    assert!(after.battery_soc < before.battery_soc);
    assert!(after.battery_current > 0.0);
    assert!(after.estimated_endurance < Duration::MAX);
    assert!(propulsion.thrust_capability().current_thrust > 0.0);
    assert!(propulsion.thermal_state().motor_temperature > 25.0);
}

#[tokio::test]
async fn test_electric_emergency_shutdown() {
    let propulsion = running_propulsion().await;
    propulsion.set_thrust_command(0.8).unwrap();
    propulsion.emergency_shutdown().unwrap();
    assert_eq!(propulsion.lifecycle_state(), LifecycleState::ShutDown);
    assert!(propulsion.thrust_command().abs() < f64::EPSILON);
    assert!(propulsion.start().await.is_err());
    assert!(propulsion.stop().is_ok());
}

#[tokio::test]
async fn test_electric_predictions() {
    let propulsion = running_propulsion().await;
    let endurance = propulsion.predict_endurance(&[111.0, 333.0]);
    assert!((endurance.as_secs_f64() - 3600.0).abs() < 1e-3);
    assert_eq!(propulsion.predict_endurance(&[]), Duration::MAX);
    let now = propulsion.predict_thermal_state(Duration::ZERO);
    let idle = propulsion.thermal_state();
    assert!((now.motor_temperature - idle.motor_temperature).abs() < 1e-9);
    assert_eq!(propulsion.health().overall_health, HealthStatus::Ok);
}
