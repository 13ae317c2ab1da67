use chrono::{DateTime, Utc};
use strum_macros::{Display, EnumIter};

/// Health of a single component or subsystem, ordered from best to worst.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter,
    serde::Serialize, serde::Deserialize,
)]
pub enum HealthStatus {
    #[default]
    #[strum(to_string = "OK")]
    Ok,
    Degraded,
    Critical,
    Failed,
}

impl HealthStatus {
    /// Returns the worse of two statuses.
    pub fn worst(self, other: Self) -> Self { self.max(other) }
}

/// A fault detected by a propulsion backend. Faults are appended, never edited.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Fault {
    pub id: String,
    pub component: String,
    /// Severity in `[0, 1]`.
    pub severity: f64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl Fault {
    pub fn new(id: &str, component: &str, severity: f64, description: String) -> Self {
        Self {
            id: id.to_string(),
            component: component.to_string(),
            severity: severity.clamp(0.0, 1.0),
            description,
            timestamp: Utc::now(),
        }
    }
}

/// Point-in-time health snapshot of a propulsion backend.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PropulsionHealth {
    pub overall_health: HealthStatus,
    pub motor_health: HealthStatus,
    pub battery_health: HealthStatus,
    pub esc_health: HealthStatus,
    pub fuel_system_health: HealthStatus,
    pub thermal_health: HealthStatus,
    pub active_faults: Vec<Fault>,
    pub timestamp: DateTime<Utc>,
}

impl PropulsionHealth {
    /// Builds a snapshot whose overall health is the worst of the component statuses.
    pub fn from_components(
        motor: HealthStatus,
        battery: HealthStatus,
        esc: HealthStatus,
        fuel_system: HealthStatus,
        thermal: HealthStatus,
        active_faults: Vec<Fault>,
    ) -> Self {
        let overall = [battery, esc, fuel_system, thermal].into_iter().fold(motor, HealthStatus::worst);
        Self {
            overall_health: overall,
            motor_health: motor,
            battery_health: battery,
            esc_health: esc,
            fuel_system_health: fuel_system,
            thermal_health: thermal,
            active_faults,
            timestamp: Utc::now(),
        }
    }
}
