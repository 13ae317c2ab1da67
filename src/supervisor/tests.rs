use super::{SafetyEvent, Supervisor};
use crate::config::{CoreConfig, SupervisorConfig};
use crate::energy::{ReserveLevel, SharedLevel};
use crate::failsafe::{
    AttitudeCommand, AutopilotMode, EmergencyType, Escalation, FailsafeEvent, FlightController, FlightMode,
    ProcedureError,
};
use crate::flight_control::{FlightCommand, Mission, MissionStatus, MissionType, Waypoint};
use crate::keychain::Keychain;
use crate::propulsion::{
    EnergyState, HealthStatus, PropulsionError, PropulsionHealth, PropulsionSystem, PropulsionType, ThermalState,
    ThrustCapability, check_thrust_command, check_thrust_vector,
};
use crate::util::Vec3D;
use async_trait::async_trait;
use chrono::Utc;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::{broadcast, watch};

/// Propulsion backend whose readings are set by the test.
struct ScriptedPropulsion {
    soc: SharedLevel,
    motor: Mutex<HealthStatus>,
    shutdown_fails: bool,
    shutdowns: AtomicUsize,
}

impl ScriptedPropulsion {
    fn new(soc: f64) -> Self {
        Self { soc: SharedLevel::new(soc), motor: Mutex::new(HealthStatus::Ok), shutdown_fails: false, shutdowns: AtomicUsize::new(0) }
    }

    fn failing_shutdown(soc: f64) -> Self { Self { shutdown_fails: true, ..Self::new(soc) } }

    fn set_motor(&self, status: HealthStatus) { *self.motor.lock().unwrap() = status; }
}

#[async_trait]
impl PropulsionSystem for ScriptedPropulsion {
    async fn initialize(&self) -> Result<(), PropulsionError> { Ok(()) }
    async fn start(&self) -> Result<(), PropulsionError> { Ok(()) }
    fn stop(&self) -> Result<(), PropulsionError> { Ok(()) }

    fn energy_state(&self) -> EnergyState { EnergyState { battery_soc: self.soc.get(), ..EnergyState::default() } }

    fn thermal_state(&self) -> ThermalState {
        ThermalState {
            motor_temperature: 40.0,
            esc_temperature: 35.0,
            battery_temperature: 30.0,
            engine_temperature: 0.0,
            ambient_temperature: 20.0,
            cooling_efficiency: 1.0,
            thermal_margin: 0.8,
            timestamp: Utc::now(),
        }
    }

    fn thrust_capability(&self) -> ThrustCapability {
        ThrustCapability {
            max_thrust: 100.0,
            current_thrust: 50.0,
            thrust_vector: Vec3D::new(0.0, 1.0, 0.0),
            response_time: Duration::from_millis(100),
            efficiency_at_current: 0.8,
            sustainable_duration: Duration::from_secs(120),
        }
    }

    fn health(&self) -> PropulsionHealth {
        let motor = *self.motor.lock().unwrap();
        PropulsionHealth::from_components(motor, HealthStatus::Ok, HealthStatus::Ok, HealthStatus::Ok, HealthStatus::Ok, Vec::new())
    }

    fn set_thrust_command(&self, thrust: f64) -> Result<(), PropulsionError> { check_thrust_command(thrust).map(|_| ()) }

    fn set_thrust_vector(&self, vector: Vec3D<f64>) -> Result<(), PropulsionError> {
        check_thrust_vector(vector).map(|_| ())
    }

    fn emergency_shutdown(&self) -> Result<(), PropulsionError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.shutdown_fails {
            return Err(PropulsionError::Fatal("contactor welded".into()));
        }
        Ok(())
    }

    fn predict_endurance(&self, _power_profile: &[f64]) -> Duration { Duration::from_secs(600) }
    fn predict_thermal_state(&self, _duration: Duration) -> ThermalState { self.thermal_state() }
    fn propulsion_type(&self) -> PropulsionType { PropulsionType::Electric }
}

#[derive(Default)]
struct CountingController {
    commands: AtomicUsize,
}

#[async_trait]
impl FlightController for CountingController {
    async fn send_attitude(&self, _command: AttitudeCommand) -> Result<(), ProcedureError> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    async fn send_position(&self, _target: Vec3D<f64>) -> Result<(), ProcedureError> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    async fn set_autopilot_mode(&self, _mode: AutopilotMode) -> Result<(), ProcedureError> { Ok(()) }
    async fn arm(&self) -> Result<(), ProcedureError> { Ok(()) }
}

fn keychain(propulsion: &Arc<ScriptedPropulsion>) -> Keychain {
    let keychain = Keychain::new(&CoreConfig::default(), Arc::clone(propulsion) as Arc<dyn PropulsionSystem>);
    keychain.decision().initialize().unwrap();
    keychain
}

async fn wait_for<F>(events: &mut broadcast::Receiver<SafetyEvent>, predicate: F) -> SafetyEvent
where F: Fn(&SafetyEvent) -> bool {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let event = events.recv().await.unwrap();
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .unwrap()
}

fn spawn_run(supervisor: &Arc<Supervisor>) -> (tokio::task::JoinHandle<()>, watch::Receiver<FlightCommand>) {
    let (sender, receiver) = watch::channel(FlightCommand::safe_default(0.5));
    let supervisor = Arc::clone(supervisor);
    (tokio::spawn(async move { supervisor.run(sender).await }), receiver)
}

#[tokio::test(start_paused = true)]
async fn test_reserve_change_is_broadcast() {
    let propulsion = Arc::new(ScriptedPropulsion::new(0.9));
    let supervisor = Arc::new(Supervisor::new(SupervisorConfig::default(), keychain(&propulsion)));
    let mut events = supervisor.subscribe();
    let (handle, _commands) = spawn_run(&supervisor);

    propulsion.soc.set(0.25);
    let event = wait_for(&mut events, |e| matches!(e, SafetyEvent::ReserveLevelChanged { .. })).await;
    let SafetyEvent::ReserveLevelChanged { old, new, ref actions } = event else { unreachable!() };
    assert_eq!((old, new), (ReserveLevel::Mission, ReserveLevel::Contingency));
    assert_eq!(actions.len(), 2);
    assert!(event.is_mandatory_reserve_change());
    assert_eq!(supervisor.keychain().reserve().current_level(), ReserveLevel::Contingency);

    supervisor.shutdown();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_engine_failure_runs_procedure() {
    let propulsion = Arc::new(ScriptedPropulsion::new(0.9));
    let controller = Arc::new(CountingController::default());
    let supervisor = Arc::new(
        Supervisor::new(SupervisorConfig::default(), keychain(&propulsion))
            .with_flight_controller(Arc::clone(&controller) as Arc<dyn FlightController>),
    );
    let mut events = supervisor.subscribe();
    let (handle, _commands) = spawn_run(&supervisor);

    propulsion.set_motor(HealthStatus::Failed);
    wait_for(&mut events, |e| {
        matches!(e, SafetyEvent::Failsafe(FailsafeEvent::EmergencyDetected(a)) if a.emergency_type() == EmergencyType::EngineFailure)
    })
    .await;
    let finished = wait_for(&mut events, |e| matches!(e, SafetyEvent::ProcedureFinished { .. })).await;
    assert_eq!(finished, SafetyEvent::ProcedureFinished { emergency: EmergencyType::EngineFailure, outcome: Ok(()) });
    assert!(controller.commands.load(Ordering::SeqCst) >= 2);
    assert_eq!(supervisor.keychain().failsafe().mode(), FlightMode::Emergency);

    supervisor.shutdown();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_auto_execution_can_be_disabled() {
    let propulsion = Arc::new(ScriptedPropulsion::new(0.9));
    let config = SupervisorConfig { auto_execute_procedures: false, ..SupervisorConfig::default() };
    let supervisor = Arc::new(Supervisor::new(config, keychain(&propulsion)));
    let mut events = supervisor.subscribe();
    let (handle, _commands) = spawn_run(&supervisor);

    propulsion.set_motor(HealthStatus::Failed);
    wait_for(&mut events, |e| matches!(e, SafetyEvent::Failsafe(FailsafeEvent::EmergencyDetected(_)))).await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, SafetyEvent::ProcedureFinished { .. }));
    }

    supervisor.shutdown();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_control_loop_publishes_until_shutdown() {
    let propulsion = Arc::new(ScriptedPropulsion::new(0.9));
    let keychain = keychain(&propulsion);
    let waypoints = vec![Waypoint::new("east", Vec3D::new(3000.0, 0.0, 500.0))];
    keychain.decision().set_mission(Mission::new("m-7", MissionType::Recon, waypoints).with_status(MissionStatus::Active));
    let supervisor = Arc::new(Supervisor::new(SupervisorConfig::default(), keychain));
    let (handle, mut commands) = spawn_run(&supervisor);

    commands.changed().await.unwrap();
    let command = commands.borrow_and_update().clone();
    assert!(command.roll_angle > 0.0);
    assert!(!command.auto_land);

    supervisor.shutdown();
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(supervisor.cancel_token().is_cancelled());
}

#[test]
fn test_failed_shutdown_escalates() {
    let propulsion = Arc::new(ScriptedPropulsion::failing_shutdown(0.9));
    let supervisor = Supervisor::new(SupervisorConfig::default(), keychain(&propulsion));
    let failsafe = supervisor.keychain().failsafe();

    assert_eq!(supervisor.emergency_shutdown(), Err(PropulsionError::Fatal("contactor welded".into())));
    assert_eq!(propulsion.shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(failsafe.mode(), FlightMode::Emergency);
    assert_eq!(failsafe.current_escalation(), Some(Escalation::ImmediateLanding));
    assert!(failsafe.active_emergencies().iter().any(|e| e.emergency_type() == EmergencyType::EngineFailure));
}

#[test]
fn test_successful_shutdown_keeps_mode() {
    let propulsion = Arc::new(ScriptedPropulsion::new(0.9));
    let supervisor = Supervisor::new(SupervisorConfig::default(), keychain(&propulsion));
    assert!(supervisor.emergency_shutdown().is_ok());
    assert_eq!(supervisor.keychain().failsafe().mode(), FlightMode::Primary);
    assert!(supervisor.keychain().failsafe().current_escalation().is_none());
}

#[test]
fn test_keychain_feeds_reserve_from_propulsion() {
    let propulsion = Arc::new(ScriptedPropulsion::new(0.05));
    let keychain = keychain(&propulsion);
    assert_eq!(keychain.reserve().check(), ReserveLevel::Absolute);
    let waypoints = vec![Waypoint::new("north", Vec3D::new(0.0, 3000.0, 500.0))];
    keychain.decision().set_mission(Mission::new("m-8", MissionType::Transport, waypoints).with_status(MissionStatus::Active));
    let command = keychain.decision().decide().unwrap();
    assert!(command.auto_land);
    assert_eq!(keychain.propulsion().propulsion_type(), PropulsionType::Electric);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_before_run_skips_every_schedule() {
    let propulsion = Arc::new(ScriptedPropulsion::new(0.25));
    let supervisor = Supervisor::new(SupervisorConfig::default(), keychain(&propulsion));
    let (sender, mut commands) = watch::channel(FlightCommand::safe_default(0.5));
    supervisor.shutdown();

    tokio::time::timeout(Duration::from_secs(1), supervisor.run(sender)).await.unwrap();
    assert!(commands.changed().await.is_err());
    assert!(supervisor.keychain().reserve().last_check().is_none());
    assert_eq!(supervisor.keychain().reserve().current_level(), ReserveLevel::Mission);
}
