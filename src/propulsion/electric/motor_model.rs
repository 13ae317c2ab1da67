use crate::util::interpolate;
use std::{f64::consts::PI, time::Duration};

/// Winding temperature the thermal margin is measured from (°C).
const REFERENCE_TEMP: f64 = 25.0;
/// Simplified propeller thrust coefficient.
const THRUST_COEFFICIENT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// RPM per volt.
    pub kv_rating: f64,
    pub max_power_watts: f64,
    pub peak_efficiency: f64,
    pub no_load_current: f64,
    pub winding_resistance: f64,
    pub thermal_mass_j_per_k: f64,
    pub max_winding_temp_c: f64,
    /// Cooling effectiveness (W/K).
    pub cooling_coefficient: f64,
    /// Load to efficiency, ascending load.
    pub efficiency_map: Vec<(f64, f64)>,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            kv_rating: 1000.0,
            max_power_watts: 2000.0,
            peak_efficiency: 0.90,
            no_load_current: 1.5,
            winding_resistance: 0.015,
            thermal_mass_j_per_k: 50.0,
            max_winding_temp_c: 120.0,
            cooling_coefficient: 2.5,
            efficiency_map: vec![(0.1, 0.60), (0.3, 0.80), (0.5, 0.88), (0.7, 0.90), (0.9, 0.87), (1.0, 0.82)],
        }
    }
}

/// Brushless motor model driven by pack voltage and throttle.
#[derive(Debug, Clone)]
pub struct MotorModel {
    config: MotorConfig,
    rpm: f64,
    torque: f64,
    current: f64,
    power: f64,
    efficiency: f64,
    winding_temp: f64,
    throttle: f64,
}

impl MotorModel {
    pub fn new(config: MotorConfig) -> Self {
        Self {
            config,
            rpm: 0.0,
            torque: 0.0,
            current: 0.0,
            power: 0.0,
            efficiency: 0.0,
            winding_temp: REFERENCE_TEMP,
            throttle: 0.0,
        }
    }

    pub fn config(&self) -> &MotorConfig { &self.config }
    pub fn rpm(&self) -> f64 { self.rpm }
    pub fn torque(&self) -> f64 { self.torque }
    pub fn current(&self) -> f64 { self.current }
    pub fn power(&self) -> f64 { self.power }
    pub fn efficiency(&self) -> f64 { self.efficiency }
    pub fn winding_temp(&self) -> f64 { self.winding_temp }
    pub fn throttle(&self) -> f64 { self.throttle }

    /// Electrical power drawn at the last update (W).
    pub fn electrical_power(&self) -> f64 {
        if self.efficiency > 0.0 { self.power / self.efficiency } else { 0.0 }
    }

    /// Advances the motor by `dt` at the given supply voltage and throttle.
    pub fn update(&mut self, voltage: f64, throttle: f64, ambient_temp: f64, airspeed: f64, dt: Duration) {
        self.throttle = throttle;
        self.rpm = self.config.kv_rating * voltage * throttle;
        self.power = throttle * self.config.max_power_watts;
        self.efficiency = self.efficiency_at(throttle);
        let electrical_power = self.power / self.efficiency;
        self.current = if voltage > 0.0 { electrical_power / voltage } else { 0.0 };
        self.current += self.config.no_load_current * (1.0 - throttle * 0.5);
        self.torque = if self.rpm > 0.0 { self.power / (self.rpm * 2.0 * PI / 60.0) } else { 0.0 };

        let losses = electrical_power - self.power + self.current.powi(2) * self.config.winding_resistance;
        let cooling = self.cooling_coefficient(airspeed) * (self.winding_temp - ambient_temp);
        self.winding_temp += (losses - cooling) * dt.as_secs_f64() / self.config.thermal_mass_j_per_k;
        self.winding_temp = self.winding_temp.max(ambient_temp);
    }

    pub fn efficiency_at(&self, load: f64) -> f64 {
        interpolate(&self.config.efficiency_map, load).unwrap_or(self.config.peak_efficiency)
    }

    /// Heat generated at the current operating point (W).
    pub fn losses(&self) -> f64 {
        self.electrical_power() - self.power + self.current.powi(2) * self.config.winding_resistance
    }

    pub fn cooling_coefficient(&self, airspeed: f64) -> f64 {
        self.config.cooling_coefficient * (1.0 + airspeed * 0.1)
    }

    /// Thrust at the current RPM (N), `Ct * rho * n^2 * D^4`.
    pub fn thrust(&self, prop_diameter: f64, air_density: f64) -> f64 {
        Self::thrust_at_rpm(self.rpm, prop_diameter, air_density)
    }

    pub fn thrust_at_rpm(rpm: f64, prop_diameter: f64, air_density: f64) -> f64 {
        let n = rpm / 60.0;
        THRUST_COEFFICIENT * air_density * n * n * prop_diameter.powi(4)
    }

    pub fn is_thermal_ok(&self) -> bool { self.winding_temp < self.config.max_winding_temp_c }

    pub fn thermal_margin(&self) -> f64 {
        let span = self.config.max_winding_temp_c - REFERENCE_TEMP;
        ((self.config.max_winding_temp_c - self.winding_temp) / span).clamp(0.0, 1.0)
    }

    /// Throttle ceiling derated by thermal margin.
    pub fn max_throttle(&self) -> f64 {
        match self.thermal_margin() {
            m if m < 0.2 => 0.5,
            m if m < 0.4 => 0.75,
            _ => 1.0,
        }
    }
}
