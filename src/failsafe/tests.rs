use super::{
    AttitudeCommand, AutopilotMode, EmergencyStatus, EmergencySystem, EmergencyType, Escalation,
    EscalationPolicy, FailsafeConfig, FailsafeEvent, FlightController, FlightMode, LANDING_PITCH,
    LandingZone, PolicyInput, ProcedureError,
};
use crate::propulsion::{Fault, HealthStatus, PropulsionHealth};
use crate::util::Vec3D;
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Attitude(AttitudeCommand),
    Position(Vec3D<f64>),
    Mode(AutopilotMode),
    Arm,
}

#[derive(Default)]
struct RecordingController {
    sent: Mutex<Vec<Sent>>,
    reject_attitude: bool,
}

impl RecordingController {
    fn sent(&self) -> Vec<Sent> { self.sent.lock().unwrap().clone() }
}

#[async_trait]
impl FlightController for RecordingController {
    async fn send_attitude(&self, command: AttitudeCommand) -> Result<(), ProcedureError> {
        if self.reject_attitude {
            return Err(ProcedureError::Actuator("attitude link down".into()));
        }
        self.sent.lock().unwrap().push(Sent::Attitude(command));
        Ok(())
    }

    async fn send_position(&self, target: Vec3D<f64>) -> Result<(), ProcedureError> {
        self.sent.lock().unwrap().push(Sent::Position(target));
        Ok(())
    }

    async fn set_autopilot_mode(&self, mode: AutopilotMode) -> Result<(), ProcedureError> {
        self.sent.lock().unwrap().push(Sent::Mode(mode));
        Ok(())
    }

    async fn arm(&self) -> Result<(), ProcedureError> {
        self.sent.lock().unwrap().push(Sent::Arm);
        Ok(())
    }
}

fn zones_config() -> FailsafeConfig {
    FailsafeConfig {
        landing_zones: vec![
            LandingZone::new("north_field", Vec3D::new(0.0, 8000.0, 0.0)),
            LandingZone::new("east_strip", Vec3D::new(3000.0, 0.0, 0.0)),
        ],
        ..FailsafeConfig::default()
    }
}

#[test]
fn test_healthy_start() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    assert!(system.is_healthy());
    assert_eq!(system.mode(), FlightMode::Primary);
    assert!(system.active_emergencies().is_empty());
    assert_eq!(system.health("gps"), Some(HealthStatus::Ok));
    assert_eq!(system.health_map().len(), 7);
    assert!(system.current_escalation().is_none());
}

#[test]
fn test_failed_ins_enters_emergency() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    system.update_health("ins", HealthStatus::Failed);
    // recorded only, not yet evaluated
    assert_eq!(system.mode(), FlightMode::Primary);
    assert_eq!(system.monitor(), FlightMode::Emergency);
    assert!(!system.is_healthy());
    let active = system.active_emergencies();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].emergency_type(), EmergencyType::SensorFailure);
    assert_eq!(system.active_emergencies(), active);
    assert_eq!(system.mode(), system.mode());
}

#[test]
fn test_degraded_subsystem_selects_backup_and_recovers() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    system.update_health("gps", HealthStatus::Degraded);
    assert_eq!(system.monitor(), FlightMode::Backup);
    assert!(!system.is_healthy());
    system.update_health("gps", HealthStatus::Ok);
    assert_eq!(system.monitor(), FlightMode::Primary);
    assert!(system.is_healthy());
}

#[test]
fn test_condition_clears_record() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    system.update_battery(0.1);
    system.monitor();
    assert_eq!(system.active_emergencies()[0].emergency_type(), EmergencyType::LowBattery);
    system.update_battery(0.2);
    assert_eq!(system.monitor(), FlightMode::Primary);
    assert!(system.active_emergencies().is_empty());
}

#[test]
fn test_non_finite_readings_keep_previous_value() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    system.update_battery(0.05);
    system.update_fuel(0.05);
    assert_eq!(system.monitor(), FlightMode::Emergency);

    system.update_battery(f64::NAN);
    system.update_fuel(f64::INFINITY);
    assert_eq!(system.battery_level(), 0.05);
    assert_eq!(system.fuel_level(), 0.05);
    assert_eq!(system.monitor(), FlightMode::Emergency);
    assert!(!system.is_healthy());
    let mut kinds: Vec<_> = system.active_emergencies().iter().map(|e| e.emergency_type()).collect();
    kinds.sort_by_key(ToString::to_string);
    assert_eq!(kinds, vec![EmergencyType::FuelCritical, EmergencyType::LowBattery]);
}

#[test]
fn test_single_controller_failure_returns_to_base() {
    let config = FailsafeConfig {
        enable_auto_rtb: true,
        enable_auto_land: false,
        enable_parachute: true,
        ..FailsafeConfig::default()
    };
    let system = EmergencySystem::new(config);
    system.update_health("backup_flight", HealthStatus::Failed);
    assert_eq!(system.monitor(), FlightMode::Emergency);
    assert_eq!(system.active_emergencies()[0].emergency_type(), EmergencyType::FlightControllerFailure);
    assert_eq!(system.current_escalation(), Some(Escalation::ReturnToBase(Vec3D::new(0.0, 0.0, 500.0))));

    system.update_health("primary_flight", HealthStatus::Failed);
    system.update_health("emergency_flight", HealthStatus::Failed);
    system.monitor();
    let kinds: Vec<_> = system.active_emergencies().iter().map(|e| e.emergency_type()).collect();
    assert_eq!(kinds, vec![EmergencyType::ElectricalFailure]);
    assert_eq!(system.current_escalation(), Some(Escalation::Parachute));
}

#[test]
fn test_fuel_and_comm_loss_ordering() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    let start = Utc::now();
    system.record_comm_contact_at(start);
    system.update_fuel(0.1);
    system.monitor_at(start + TimeDelta::seconds(10));
    assert_eq!(system.monitor_at(start + TimeDelta::seconds(301)), FlightMode::Emergency);
    let kinds: Vec<_> = system.active_emergencies().iter().map(|e| e.emergency_type()).collect();
    assert_eq!(kinds, vec![EmergencyType::FuelCritical, EmergencyType::CommunicationLoss]);

    system.update_health("comm", HealthStatus::Ok);
    system.update_fuel(0.9);
    assert_eq!(system.monitor(), FlightMode::Primary);
}

#[test]
fn test_escalation_prefers_rtb_for_recoverable_conditions() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    system.update_battery(0.1);
    system.monitor();
    assert_eq!(system.current_escalation(), Some(Escalation::ReturnToBase(Vec3D::new(0.0, 0.0, 500.0))));
    assert_eq!(system.active_emergencies()[0].status(), EmergencyStatus::Escalated);
}

#[test]
fn test_escalation_prefers_landing_for_loss_of_flight() {
    let system = EmergencySystem::new(zones_config());
    system.update_position(Vec3D::new(2500.0, 100.0, 400.0));
    system.update_battery(0.1);
    system.declare_emergency(EmergencyType::StructuralDamage);
    match system.current_escalation() {
        Some(Escalation::NearestLanding(zone)) => assert_eq!(zone.id(), "east_strip"),
        other => panic!("unexpected escalation {other:?}"),
    }
    assert!(system.clear_emergency(EmergencyType::StructuralDamage));
    assert!(matches!(system.current_escalation(), Some(Escalation::ReturnToBase(_))));
}

#[test]
fn test_policy_config_flags() {
    let input = PolicyInput { fuel_level: 0.01, position: Some(Vec3D::new(0.0, 0.0, 300.0)) };
    let no_zones = EscalationPolicy::new(FailsafeConfig::default());
    assert_eq!(no_zones.escalation_for(EmergencyType::FuelCritical, input), Escalation::ImmediateLanding);
    assert!(matches!(
        no_zones.escalation_for(EmergencyType::CommunicationLoss, input),
        Escalation::ReturnToBase(_)
    ));

    let parachute = EscalationPolicy::new(FailsafeConfig {
        enable_auto_land: false,
        enable_parachute: true,
        ..FailsafeConfig::default()
    });
    assert_eq!(parachute.escalation_for(EmergencyType::EngineFailure, input), Escalation::Parachute);
    assert_eq!(parachute.last_resort(), Escalation::Parachute);

    let nothing = EscalationPolicy::new(FailsafeConfig {
        enable_auto_rtb: false,
        enable_auto_land: false,
        ..FailsafeConfig::default()
    });
    assert_eq!(nothing.escalation_for(EmergencyType::LowBattery, input), Escalation::NotifyOperator);

    let low = PolicyInput { position: Some(Vec3D::new(2900.0, 0.0, 20.0)), ..input };
    let zones = EscalationPolicy::new(zones_config());
    assert_eq!(zones.escalation_for(EmergencyType::EngineFailure, low), Escalation::ImmediateLanding);
}

#[test]
fn test_escalation_severity_order() {
    let ladder = [
        Escalation::NotifyOperator,
        Escalation::ReturnToBase(Vec3D::zero()),
        Escalation::NearestLanding(LandingZone::new("z", Vec3D::zero())),
        Escalation::ImmediateLanding,
        Escalation::Parachute,
    ];
    assert!(ladder.windows(2).all(|w| w[0].severity() < w[1].severity()));
}

#[test]
fn test_manual_override_is_sticky() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    system.set_manual_override();
    system.update_health("ins", HealthStatus::Failed);
    assert_eq!(system.monitor(), FlightMode::Manual);
    assert_eq!(system.active_emergencies().len(), 1);
    system.clear_manual_override();
    assert_eq!(system.mode(), FlightMode::Emergency);
}

#[test]
fn test_shutdown_failure_forces_last_resort() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    system.report_shutdown_failure();
    assert_eq!(system.mode(), FlightMode::Emergency);
    assert_eq!(system.current_escalation(), Some(Escalation::ImmediateLanding));
    assert!(system.active_emergencies().iter().any(|e| e.emergency_type() == EmergencyType::EngineFailure));
}

#[test]
fn test_propulsion_health_ingest() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    let health = PropulsionHealth::from_components(
        HealthStatus::Failed,
        HealthStatus::Ok,
        HealthStatus::Ok,
        HealthStatus::Ok,
        HealthStatus::Ok,
        vec![Fault::new("motor_overtemp", "motor", 0.8, "winding hot".into())],
    );
    system.ingest_propulsion_health(&health);
    assert_eq!(system.health("propulsion"), Some(HealthStatus::Failed));
    system.monitor();
    assert_eq!(system.active_emergencies()[0].emergency_type(), EmergencyType::EngineFailure);
    assert_eq!(system.overall_health(), HealthStatus::Failed);
}

#[test]
fn test_events_dispatched_outside_lock() {
    let system = Arc::new(EmergencySystem::new(FailsafeConfig::default()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let (events_cb, system_cb) = (Arc::clone(&events), Arc::clone(&system));
    system.set_event_callback(move |event| {
        // reading back from inside the callback must not deadlock
        let _ = system_cb.mode();
        events_cb.lock().unwrap().push(event.clone());
    });
    system.update_health("gps", HealthStatus::Failed);
    system.monitor();
    let seen = events.lock().unwrap().clone();
    assert!(matches!(seen[0], FailsafeEvent::EmergencyDetected(_)));
    assert_eq!(seen[1], FailsafeEvent::ModeChanged { old: FlightMode::Primary, new: FlightMode::Emergency });
    assert!(matches!(seen[2], FailsafeEvent::Escalated(Escalation::ReturnToBase(_))));
}

#[tokio::test]
async fn test_engine_failure_procedure() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    let controller = RecordingController::default();
    system.execute_procedure(EmergencyType::EngineFailure, Some(&controller)).await.unwrap();
    let sent = controller.sent();
    assert_eq!(sent[0], Sent::Arm);
    assert!(matches!(sent[1], Sent::Attitude(AttitudeCommand { throttle, .. }) if throttle == 0.0));
    assert!(matches!(sent[2], Sent::Attitude(AttitudeCommand { pitch, .. }) if pitch == LANDING_PITCH));
    assert_eq!(sent[3], Sent::Mode(AutopilotMode::Land));
    assert_eq!(sent.len(), 4);
}

#[tokio::test]
async fn test_critical_step_failure_aborts() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    let controller = RecordingController { reject_attitude: true, ..RecordingController::default() };
    let result = system.execute_procedure(EmergencyType::FuelCritical, Some(&controller)).await;
    assert!(matches!(result, Err(ProcedureError::CriticalStepFailed { step: 1, .. })));
    assert!(controller.sent().is_empty());

    let missing = system.execute_procedure(EmergencyType::LowBattery, None).await;
    assert!(matches!(missing, Err(ProcedureError::CriticalStepFailed { step: 2, .. })));
    assert_eq!(
        system.execute_procedure(EmergencyType::HydraulicFailure, None).await,
        Err(ProcedureError::NoProcedure(EmergencyType::HydraulicFailure))
    );
}

#[tokio::test]
async fn test_non_critical_failure_continues() {
    let system = EmergencySystem::new(FailsafeConfig::default());
    let controller = RecordingController::default();
    system.execute_procedure(EmergencyType::CommunicationLoss, Some(&controller)).await.unwrap();
    assert_eq!(system.health("comm"), Some(HealthStatus::Degraded));
    let sent = controller.sent();
    assert_eq!(sent[..2], [Sent::Mode(AutopilotMode::Loiter), Sent::Mode(AutopilotMode::Auto)]);
    assert!(sent.contains(&Sent::Position(Vec3D::new(0.0, 0.0, 500.0))));

    let unattached = EmergencySystem::new(FailsafeConfig::default());
    unattached.execute_procedure(EmergencyType::CommunicationLoss, None).await.unwrap_err();
    assert_eq!(unattached.health("comm"), Some(HealthStatus::Degraded));

    system.update_health("gps", HealthStatus::Failed);
    system.execute_procedure(EmergencyType::SensorFailure, None).await.unwrap();
    assert_eq!(system.health("gps"), Some(HealthStatus::Degraded));
}
