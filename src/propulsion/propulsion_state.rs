use crate::util::Vec3D;
use chrono::{DateTime, Utc};
use std::time::Duration;
use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum PropulsionType {
    Electric,
    Combustion,
    Turbine,
    Hybrid,
    Rocket,
}

/// Latest energy picture of a propulsion backend. Superseded by the next reading.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnergyState {
    /// Battery state of charge in `[0, 1]`.
    pub battery_soc: f64,
    /// Pack voltage (V).
    pub battery_voltage: f64,
    /// Current draw (A).
    pub battery_current: f64,
    /// Pack temperature (°C).
    pub battery_temperature: f64,
    /// Estimated state of health in `[0, 1]`.
    pub battery_health: f64,
    /// Per-cell voltages, index = cell id.
    pub cell_voltages: Vec<f64>,
    /// Per-cell temperatures, index = cell id.
    pub cell_temperatures: Vec<f64>,
    /// Fuel remaining in `[0, 1]`.
    pub fuel_level: f64,
    pub fuel_mass_kg: f64,
    /// Current consumption (kg/h).
    pub fuel_flow_rate: f64,
    /// Total remaining energy (Wh).
    pub remaining_energy_wh: f64,
    pub estimated_endurance: Duration,
    /// Energy per unit mass (Wh/kg).
    pub specific_energy: f64,
    /// Estimation confidence in `[0, 1]`.
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl Default for EnergyState {
    fn default() -> Self {
        Self {
            battery_soc: 0.0,
            battery_voltage: 0.0,
            battery_current: 0.0,
            battery_temperature: 0.0,
            battery_health: 0.0,
            cell_voltages: Vec::new(),
            cell_temperatures: Vec::new(),
            fuel_level: 0.0,
            fuel_mass_kg: 0.0,
            fuel_flow_rate: 0.0,
            remaining_energy_wh: 0.0,
            estimated_endurance: Duration::ZERO,
            specific_energy: 0.0,
            confidence: 0.0,
            timestamp: Utc::now(),
        }
    }
}

/// Thermal conditions of the propulsion components (°C unless noted).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ThermalState {
    pub motor_temperature: f64,
    pub esc_temperature: f64,
    pub battery_temperature: f64,
    /// Engine temperature, combustion backends only.
    pub engine_temperature: f64,
    pub ambient_temperature: f64,
    /// Current cooling effectiveness in `[0, 1]`.
    pub cooling_efficiency: f64,
    /// Margin to the closest thermal limit in `[0, 1]`.
    pub thermal_margin: f64,
    pub timestamp: DateTime<Utc>,
}

/// Achievable thrust characteristics.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ThrustCapability {
    /// Maximum available thrust (N).
    pub max_thrust: f64,
    /// Current thrust output (N).
    pub current_thrust: f64,
    pub thrust_vector: Vec3D<f64>,
    /// Time to reach 90% of commanded thrust.
    pub response_time: Duration,
    pub efficiency_at_current: f64,
    /// How long maximum thrust is sustainable.
    pub sustainable_duration: Duration,
}
