//! Failsafe arbitration: subsystem health, flight mode, the active emergency registry,
//! escalation policy and the emergency procedure catalogue.

mod emergency;
mod emergency_system;
mod escalation;
mod failsafe_config;
mod flight_mode;
mod procedure;

pub use emergency::{ActiveEmergency, EmergencySource, EmergencyStatus, EmergencyType};
pub use emergency_system::{EmergencySystem, FailsafeCallback, FailsafeEvent};
pub use escalation::{Escalation, EscalationPolicy, LandingZone, PolicyInput};
pub use failsafe_config::FailsafeConfig;
pub use flight_mode::FlightMode;
pub use procedure::{
    AttitudeCommand, AutopilotMode, ECONOMY_THROTTLE, FlightController, GLIDE_PITCH, LANDING_PITCH,
    LANDING_THROTTLE, Procedure, ProcedureError, ProcedureStep, StepAction, procedure_catalogue,
};

#[cfg(test)]
mod tests;
