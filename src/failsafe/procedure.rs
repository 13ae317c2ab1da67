use super::EmergencyType;
use crate::util::Vec3D;
use async_trait::async_trait;
use std::{collections::HashMap, time::Duration};
use strum_macros::Display;

/// Best-glide attitude: 5° nose down, engine off.
pub const GLIDE_PITCH: f64 = -0.087;
/// Emergency landing attitude: 10° nose down.
pub const LANDING_PITCH: f64 = -0.174;
/// Minimal throttle kept for control authority while landing.
pub const LANDING_THROTTLE: f64 = 0.2;
pub const ECONOMY_THROTTLE: f64 = 0.45;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcedureError {
    #[error("no flight controller attached")]
    ActuatorUnavailable,
    #[error("no procedure for {0}")]
    NoProcedure(EmergencyType),
    #[error("critical step {step} ({description}) of {procedure} failed: {reason}")]
    CriticalStepFailed { procedure: String, step: usize, description: String, reason: String },
    #[error("actuator rejected command: {0}")]
    Actuator(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeCommand {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub throttle: f64,
}

impl AttitudeCommand {
    pub fn level(throttle: f64) -> Self { Self { roll: 0.0, pitch: 0.0, yaw: 0.0, throttle } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AutopilotMode {
    Auto,
    Loiter,
    Land,
}

/// Actuator seam the procedures drive. Implemented by the autopilot link.
#[async_trait]
pub trait FlightController: Send + Sync {
    async fn send_attitude(&self, command: AttitudeCommand) -> Result<(), ProcedureError>;
    async fn send_position(&self, target: Vec3D<f64>) -> Result<(), ProcedureError>;
    async fn set_autopilot_mode(&self, mode: AutopilotMode) -> Result<(), ProcedureError>;
    /// Arms the active propulsion unit, e.g. after switching to a backup engine.
    async fn arm(&self) -> Result<(), ProcedureError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StepAction {
    SwitchToBackupEngine,
    EstablishBestGlide,
    IdentifyLandingZone,
    ExecuteEmergencyLanding,
    AttemptBackupRadio,
    ContinueAutonomous,
    ReturnToBase,
    SwitchToBackupSensors,
    RecalibrateNavigation,
    AssessFlightCapability,
    ReduceThrottle,
    FindNearestLanding,
    DisableNonEssential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureStep {
    description: &'static str,
    action: StepAction,
    critical: bool,
    /// Zero means unbounded.
    timeout: Duration,
}

impl ProcedureStep {
    const fn new(description: &'static str, action: StepAction, critical: bool, timeout_secs: u64) -> Self {
        Self { description, action, critical, timeout: Duration::from_secs(timeout_secs) }
    }

    pub fn description(&self) -> &'static str { self.description }
    pub fn action(&self) -> StepAction { self.action }
    pub fn is_critical(&self) -> bool { self.critical }
    pub fn timeout(&self) -> Duration { self.timeout }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    name: &'static str,
    priority: u8,
    steps: Vec<ProcedureStep>,
    timeout: Duration,
    auto_execute: bool,
}

impl Procedure {
    pub fn name(&self) -> &'static str { self.name }
    pub fn priority(&self) -> u8 { self.priority }
    pub fn steps(&self) -> &[ProcedureStep] { &self.steps }
    pub fn timeout(&self) -> Duration { self.timeout }
    pub fn auto_execute(&self) -> bool { self.auto_execute }
}

/// The built-in emergency procedures, keyed by the emergency they handle.
pub fn procedure_catalogue() -> HashMap<EmergencyType, Procedure> {
    use StepAction as A;
    let mut catalogue = HashMap::new();
    catalogue.insert(EmergencyType::EngineFailure, Procedure {
        name: "Engine Failure",
        priority: 1,
        auto_execute: true,
        timeout: Duration::from_secs(30),
        steps: vec![
            ProcedureStep::new("Switch to backup engine", A::SwitchToBackupEngine, true, 5),
            ProcedureStep::new("Establish best glide speed", A::EstablishBestGlide, true, 10),
            ProcedureStep::new("Identify landing zone", A::IdentifyLandingZone, true, 5),
            ProcedureStep::new("Execute emergency landing", A::ExecuteEmergencyLanding, true, 60),
        ],
    });
    catalogue.insert(EmergencyType::CommunicationLoss, Procedure {
        name: "Communication Loss",
        priority: 2,
        auto_execute: true,
        timeout: Duration::from_secs(300),
        steps: vec![
            ProcedureStep::new("Attempt backup radio", A::AttemptBackupRadio, false, 30),
            ProcedureStep::new("Continue mission autonomously", A::ContinueAutonomous, false, 0),
            ProcedureStep::new("RTB if timeout exceeded", A::ReturnToBase, true, 0),
        ],
    });
    catalogue.insert(EmergencyType::SensorFailure, Procedure {
        name: "Sensor Failure",
        priority: 3,
        auto_execute: true,
        timeout: Duration::from_secs(60),
        steps: vec![
            ProcedureStep::new("Switch to backup sensors", A::SwitchToBackupSensors, true, 5),
            ProcedureStep::new("Recalibrate navigation", A::RecalibrateNavigation, false, 10),
            ProcedureStep::new("Assess flight capability", A::AssessFlightCapability, true, 5),
        ],
    });
    catalogue.insert(EmergencyType::FuelCritical, Procedure {
        name: "Fuel Critical",
        priority: 1,
        auto_execute: true,
        timeout: Duration::from_secs(120),
        steps: vec![
            ProcedureStep::new("Reduce throttle to economy", A::ReduceThrottle, true, 5),
            ProcedureStep::new("Find nearest landing zone", A::FindNearestLanding, true, 10),
            ProcedureStep::new("Initiate RTB", A::ReturnToBase, true, 0),
        ],
    });
    catalogue.insert(EmergencyType::LowBattery, Procedure {
        name: "Low Battery",
        priority: 1,
        auto_execute: true,
        timeout: Duration::from_secs(120),
        steps: vec![
            ProcedureStep::new("Disable non-essential systems", A::DisableNonEssential, true, 5),
            ProcedureStep::new("Initiate RTB", A::ReturnToBase, true, 0),
        ],
    });
    catalogue
}
