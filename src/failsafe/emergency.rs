use chrono::{DateTime, Utc};
use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, serde::Serialize, serde::Deserialize)]
pub enum EmergencyType {
    #[strum(to_string = "Engine Failure")]
    EngineFailure,
    #[strum(to_string = "Electrical Failure")]
    ElectricalFailure,
    /// A flight controller failed while another one is still usable.
    #[strum(to_string = "Flight Controller Failure")]
    FlightControllerFailure,
    #[strum(to_string = "Hydraulic Failure")]
    HydraulicFailure,
    #[strum(to_string = "Structural Damage")]
    StructuralDamage,
    #[strum(to_string = "Severe Weather")]
    SevereWeather,
    #[strum(to_string = "Threat Inbound")]
    ThreatInbound,
    #[strum(to_string = "Fuel Critical")]
    FuelCritical,
    #[strum(to_string = "Sensor Failure")]
    SensorFailure,
    #[strum(to_string = "Communication Loss")]
    CommunicationLoss,
    #[strum(to_string = "Low Battery")]
    LowBattery,
}

impl EmergencyType {
    /// Emergency raised when the named subsystem reports `Failed`.
    /// A failed flight controller only counts as an electrical failure once
    /// `controller_remaining` is false.
    pub fn for_failed_subsystem(subsystem: &str, controller_remaining: bool) -> Self {
        match subsystem {
            "primary_flight" | "backup_flight" | "emergency_flight" if controller_remaining => {
                Self::FlightControllerFailure
            }
            "primary_flight" | "backup_flight" | "emergency_flight" | "power" | "electrical" => {
                Self::ElectricalFailure
            }
            "comm" => Self::CommunicationLoss,
            "propulsion" | "engine" | "motor" => Self::EngineFailure,
            "hydraulic" => Self::HydraulicFailure,
            "structure" | "airframe" => Self::StructuralDamage,
            _ => Self::SensorFailure,
        }
    }

    /// Conditions where continued flight is not expected to be possible.
    pub fn is_loss_of_flight(self) -> bool {
        matches!(
            self,
            Self::StructuralDamage | Self::EngineFailure | Self::HydraulicFailure | Self::ElectricalFailure
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
pub enum EmergencyStatus {
    Detected,
    Escalated,
}

/// Where an active emergency came from. Monitored records clear with their condition,
/// declared ones only on an explicit `clear_emergency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EmergencySource {
    Monitor,
    Declared,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActiveEmergency {
    emergency_type: EmergencyType,
    detected_at: DateTime<Utc>,
    status: EmergencyStatus,
    source: EmergencySource,
}

impl ActiveEmergency {
    pub fn new(emergency_type: EmergencyType, detected_at: DateTime<Utc>, source: EmergencySource) -> Self {
        Self { emergency_type, detected_at, status: EmergencyStatus::Detected, source }
    }

    pub fn emergency_type(&self) -> EmergencyType { self.emergency_type }
    pub fn detected_at(&self) -> DateTime<Utc> { self.detected_at }
    pub fn status(&self) -> EmergencyStatus { self.status }
    pub fn source(&self) -> EmergencySource { self.source }

    pub(super) fn escalate(&mut self) { self.status = EmergencyStatus::Escalated; }
}
