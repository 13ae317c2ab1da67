use super::{ConfigError, CoreConfig, SupervisorConfig};
use crate::util::Vec3D;
use std::{path::PathBuf, time::Duration};

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("vigil-{}-{name}.json", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_defaults_are_valid() {
    let config = CoreConfig::default();
    config.validate().unwrap();
    assert_eq!(config.supervisor.reserve_check_interval(), Duration::from_millis(500));
    assert_eq!(config.failsafe.check_interval(), Duration::from_millis(100));
    assert_eq!(config.decision.tick_period(), Duration::from_millis(20));
    assert_eq!(config.failsafe.max_time_without_comms(), Duration::from_secs(300));
}

#[test]
fn test_partial_file_keeps_defaults() {
    let path = write_temp(
        "partial",
        r#"{
            "decision": { "decision_rate": 10.0, "home_position": { "x": 100.0, "y": -50.0, "z": 800.0 } },
            "failsafe": {
                "enable_parachute": true,
                "landing_zones": [ { "id": "strip", "position": { "x": 3000.0, "y": 0.0, "z": 0.0 } } ]
            },
            "supervisor": { "auto_execute_procedures": false }
        }"#,
    );
    let config = CoreConfig::load_from(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.decision.decision_rate, 10.0);
    assert_eq!(config.decision.home_position, Vec3D::new(100.0, -50.0, 800.0));
    assert_eq!(config.decision.max_roll_angle, 0.785);
    assert!(config.failsafe.enable_parachute);
    assert_eq!(config.failsafe.landing_zones.len(), 1);
    assert_eq!(config.failsafe.landing_zones[0].id(), "strip");
    assert!(!config.supervisor.auto_execute_procedures);
    assert_eq!(config.supervisor.reserve_check_interval_ms, 500);
    assert_eq!(config.reserve, CoreConfig::default().reserve);
    config.validate().unwrap();
}

#[test]
fn test_load_failures() {
    let missing = std::env::temp_dir().join("vigil-does-not-exist.json");
    assert!(matches!(CoreConfig::load_from(&missing), Err(ConfigError::Io { .. })));

    let path = write_temp("malformed", "{ \"decision\": { \"decision_rate\": \"fast\" } }");
    let result = CoreConfig::load_from(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn test_validation_reports_first_violation() {
    let mut config = CoreConfig::default();
    config.reserve.contingency_battery_soc = 0.5;
    assert!(matches!(config.validate(), Err(ConfigError::NotDecreasing("battery SOC thresholds"))));

    let mut config = CoreConfig::default();
    config.reserve.mission_fuel_level = 1.2;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::OutOfRange { field: "mission_fuel_level", .. })
    ));

    let mut config = CoreConfig::default();
    config.decision.decision_rate = 0.0;
    assert!(matches!(config.validate(), Err(ConfigError::NotPositive { field: "decision_rate", .. })));

    let mut config = CoreConfig::default();
    config.failsafe.check_interval_ms = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Zero("check_interval_ms"))));

    let mut config = CoreConfig::default();
    config.decision.home_position = Vec3D::new(f64::NAN, 0.0, 0.0);
    assert!(matches!(config.validate(), Err(ConfigError::NotFinite("home_position"))));
}

#[test]
fn test_supervisor_validation() {
    let config = SupervisorConfig { reserve_check_interval_ms: 0, ..SupervisorConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::Zero("reserve_check_interval_ms"))));
    let config = SupervisorConfig { event_capacity: 0, ..SupervisorConfig::default() };
    assert!(config.validate().is_err());
    assert_eq!(
        ConfigError::Zero("event_capacity").to_string(),
        "event_capacity must not be zero"
    );
}
