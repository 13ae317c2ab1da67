use super::{BatteryConfig, BatteryModel, MotorConfig, MotorModel};
use crate::propulsion::{
    EnergyState, Fault, HealthStatus, Lifecycle, LifecycleState, PropulsionError,
    PropulsionHealth, PropulsionSystem, PropulsionType, ThermalState, ThrustCapability,
    check_thrust_command, check_thrust_vector,
};
use crate::util::{Vec3D, read_lock, write_lock};
use crate::{info, warn};
use async_trait::async_trait;
use chrono::Utc;
use std::{sync::RwLock, time::Duration};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ElectricConfig {
    pub battery: BatteryConfig,
    pub motor: MotorConfig,
    pub prop_diameter_m: f64,
    /// kg/m³
    pub air_density: f64,
    pub ambient_temp_c: f64,
    pub response_time_ms: u64,
}

impl Default for ElectricConfig {
    fn default() -> Self {
        Self {
            battery: BatteryConfig::default(),
            motor: MotorConfig::default(),
            prop_diameter_m: 0.4,
            air_density: 1.225,
            ambient_temp_c: 25.0,
            response_time_ms: 100,
        }
    }
}

struct ElectricCore {
    lifecycle: Lifecycle,
    battery: BatteryModel,
    motor: MotorModel,
    thrust_command: f64,
    thrust_vector: Vec3D<f64>,
    airspeed: f64,
    active_faults: Vec<Fault>,
}

impl ElectricCore {
    /// Adds the fault while `active` holds and drops it once the condition clears.
    fn track_fault(&mut self, active: bool, id: &str, component: &str, severity: f64, description: impl FnOnce() -> String) {
        let present = self.active_faults.iter().any(|f| f.id == id);
        if active && !present {
            let fault = Fault::new(id, component, severity, description());
            warn!("Propulsion fault raised: {} ({})", fault.id, fault.description);
            self.active_faults.push(fault);
        } else if !active && present {
            self.active_faults.retain(|f| f.id != id);
        }
    }

    fn refresh_faults(&mut self) {
        let winding = self.motor.winding_temp();
        let max_winding = self.motor.config().max_winding_temp_c;
        self.track_fault(!self.motor.is_thermal_ok(), "motor_overtemp", "motor", 0.8, || {
            format!("winding at {winding:.1}°C exceeds {max_winding:.1}°C")
        });
        let pack_temp = self.battery.average_temperature();
        self.track_fault(!self.battery.is_thermal_ok(), "battery_temp", "battery", 0.7, || {
            format!("pack temperature {pack_temp:.1}°C outside operating range")
        });
        let min_cell = self.battery.min_cell_voltage();
        let cutoff = self.battery.config().cutoff_voltage_per_cell;
        self.track_fault(min_cell < cutoff, "cell_cutoff", "battery", 1.0, || {
            format!("cell voltage {min_cell:.2} V below cutoff {cutoff:.2} V")
        });
    }

    fn motor_health(&self) -> HealthStatus {
        match self.motor.thermal_margin() {
            _ if !self.motor.is_thermal_ok() => HealthStatus::Critical,
            m if m < 0.2 => HealthStatus::Critical,
            m if m < 0.4 => HealthStatus::Degraded,
            _ => HealthStatus::Ok,
        }
    }

    fn battery_health(&self) -> HealthStatus {
        let config = self.battery.config();
        let min_cell = self.battery.min_cell_voltage();
        if min_cell < config.cutoff_voltage_per_cell || !self.battery.is_thermal_ok() {
            HealthStatus::Critical
        } else if min_cell < config.min_voltage_per_cell || self.battery.soh() < 0.8 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        }
    }

    fn thermal_health(&self) -> HealthStatus {
        match self.motor.thermal_margin().min(self.battery.thermal_margin()) {
            m if m <= 0.0 => HealthStatus::Critical,
            m if m < 0.3 => HealthStatus::Degraded,
            _ => HealthStatus::Ok,
        }
    }

    fn power_draw(&self) -> f64 { self.battery.pack_voltage() * self.battery.pack_current() }
}

/// Simulated battery-electric propulsion, advanced by [`ElectricPropulsion::step`].
pub struct ElectricPropulsion {
    config: ElectricConfig,
    core: RwLock<ElectricCore>,
}

impl ElectricPropulsion {
    pub fn new(config: ElectricConfig) -> Self {
        let core = ElectricCore {
            lifecycle: Lifecycle::new(),
            battery: BatteryModel::new(config.battery.clone()),
            motor: MotorModel::new(config.motor.clone()),
            thrust_command: 0.0,
            thrust_vector: Vec3D::new(0.0, 1.0, 0.0),
            airspeed: 0.0,
            active_faults: Vec::new(),
        };
        Self { config, core: RwLock::new(core) }
    }

    pub fn config(&self) -> &ElectricConfig { &self.config }

    pub fn lifecycle_state(&self) -> LifecycleState { read_lock(&self.core).lifecycle.state() }

    pub fn thrust_command(&self) -> f64 { read_lock(&self.core).thrust_command }

    /// Advances the simulation by `dt`. Does nothing unless running.
    ///
    /// # Arguments
    /// * `dt` - Simulated time step.
    /// * `airspeed` - True airspeed (m/s), drives convective cooling.
    pub fn step(&self, dt: Duration, airspeed: f64) {
        let mut core = write_lock(&self.core);
        if core.lifecycle.state() != LifecycleState::Running {
            return;
        }
        core.airspeed = airspeed;
        let throttle = core.thrust_command.min(core.motor.max_throttle());
        let cells = self.config.battery.cell_count as f64;
        let open_circuit = core.battery.open_circuit_cell_voltage(core.battery.soc()) * cells;
        let supply = core.battery.pack_voltage();
        core.motor.update(supply, throttle, self.config.ambient_temp_c, airspeed, dt);
        let current = core.motor.current();
        let loaded = open_circuit - current * self.config.battery.internal_resistance_ohms;
        core.battery.update(loaded, current, None, dt);
        core.battery.update_thermal(self.config.ambient_temp_c, airspeed, dt);
        core.refresh_faults();
    }

    fn thermal_snapshot(&self, core: &ElectricCore, motor_temp: f64, battery_temp: f64) -> ThermalState {
        let ambient = self.config.ambient_temp_c;
        let motor_max = self.config.motor.max_winding_temp_c;
        let battery_max = self.config.battery.max_discharge_temp_c;
        let motor_margin = ((motor_max - motor_temp) / (motor_max - ambient)).clamp(0.0, 1.0);
        let battery_margin = ((battery_max - battery_temp) / (battery_max - ambient)).clamp(0.0, 1.0);
        ThermalState {
            motor_temperature: motor_temp,
            esc_temperature: ambient + 0.5 * (motor_temp - ambient),
            battery_temperature: battery_temp,
            engine_temperature: 0.0,
            ambient_temperature: ambient,
            cooling_efficiency: (core.motor.cooling_coefficient(core.airspeed)
                / (self.config.motor.cooling_coefficient * 2.0))
                .clamp(0.0, 1.0),
            thermal_margin: motor_margin.min(battery_margin),
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
impl PropulsionSystem for ElectricPropulsion {
    async fn initialize(&self) -> Result<(), PropulsionError> {
        let mut core = write_lock(&self.core);
        core.lifecycle.initialize()?;
        info!(
            "Electric propulsion initialized: {}S{}P {}, {:.0} Wh",
            self.config.battery.cell_count,
            self.config.battery.parallel_count,
            self.config.battery.chemistry,
            self.config.battery.total_energy_wh()
        );
        Ok(())
    }

    async fn start(&self) -> Result<(), PropulsionError> {
        write_lock(&self.core).lifecycle.start()
    }

    fn stop(&self) -> Result<(), PropulsionError> {
        let mut core = write_lock(&self.core);
        core.lifecycle.stop()?;
        core.thrust_command = 0.0;
        Ok(())
    }

    fn energy_state(&self) -> EnergyState {
        let core = read_lock(&self.core);
        let battery = &core.battery;
        let remaining = battery.remaining_energy_wh();
        EnergyState {
            battery_soc: battery.soc(),
            battery_voltage: battery.pack_voltage(),
            battery_current: battery.pack_current(),
            battery_temperature: battery.average_temperature(),
            battery_health: battery.soh(),
            cell_voltages: battery.cell_voltages().to_vec(),
            cell_temperatures: battery.cell_temperatures().to_vec(),
            remaining_energy_wh: remaining,
            estimated_endurance: battery.predict_endurance(core.power_draw()),
            specific_energy: remaining / self.config.battery.pack_mass_kg,
            confidence: if battery.pack_current() == 0.0 { 0.9 } else { 0.7 },
            timestamp: Utc::now(),
            ..EnergyState::default()
        }
    }

    fn thermal_state(&self) -> ThermalState {
        let core = read_lock(&self.core);
        self.thermal_snapshot(&core, core.motor.winding_temp(), core.battery.average_temperature())
    }

    fn thrust_capability(&self) -> ThrustCapability {
        let core = read_lock(&self.core);
        let max_throttle = core.motor.max_throttle();
        let max_rpm = self.config.motor.kv_rating * core.battery.pack_voltage() * max_throttle;
        let max_electrical =
            self.config.motor.max_power_watts * max_throttle / core.motor.efficiency_at(max_throttle);
        ThrustCapability {
            max_thrust: MotorModel::thrust_at_rpm(max_rpm, self.config.prop_diameter_m, self.config.air_density),
            current_thrust: core.motor.thrust(self.config.prop_diameter_m, self.config.air_density),
            thrust_vector: core.thrust_vector,
            response_time: Duration::from_millis(self.config.response_time_ms),
            efficiency_at_current: core.motor.efficiency(),
            sustainable_duration: core.battery.predict_endurance(max_electrical),
        }
    }

    fn health(&self) -> PropulsionHealth {
        let core = read_lock(&self.core);
        PropulsionHealth::from_components(
            core.motor_health(),
            core.battery_health(),
            HealthStatus::Ok,
            HealthStatus::Ok,
            core.thermal_health(),
            core.active_faults.clone(),
        )
    }

    fn set_thrust_command(&self, thrust: f64) -> Result<(), PropulsionError> {
        let mut core = write_lock(&self.core);
        core.lifecycle.require_running("set_thrust_command")?;
        core.thrust_command = check_thrust_command(thrust)?;
        Ok(())
    }

    fn set_thrust_vector(&self, vector: Vec3D<f64>) -> Result<(), PropulsionError> {
        let mut core = write_lock(&self.core);
        core.lifecycle.require_running("set_thrust_vector")?;
        core.thrust_vector = check_thrust_vector(vector)?.normalize();
        Ok(())
    }

    fn emergency_shutdown(&self) -> Result<(), PropulsionError> {
        let mut core = write_lock(&self.core);
        core.thrust_command = 0.0;
        core.lifecycle.shut_down();
        warn!("Electric propulsion emergency shutdown, thrust cut");
        Ok(())
    }

    /// Uses the mean of the profile, or the present draw for an empty profile.
    fn predict_endurance(&self, power_profile: &[f64]) -> Duration {
        let core = read_lock(&self.core);
        let power = if power_profile.is_empty() {
            core.power_draw()
        } else {
            power_profile.iter().sum::<f64>() / power_profile.len() as f64
        };
        core.battery.predict_endurance(power)
    }

    /// First-order approach of each temperature to its steady state at the present load.
    fn predict_thermal_state(&self, duration: Duration) -> ThermalState {
        let core = read_lock(&self.core);
        let ambient = self.config.ambient_temp_c;
        let t = duration.as_secs_f64();

        let motor_cooling = core.motor.cooling_coefficient(core.airspeed);
        let motor_steady = ambient + core.motor.losses() / motor_cooling;
        let motor_decay = (-t * motor_cooling / self.config.motor.thermal_mass_j_per_k).exp();
        let motor_temp = motor_steady + (core.motor.winding_temp() - motor_steady) * motor_decay;

        let battery_cooling = self.config.battery.cooling_coefficient * (1.0 + core.airspeed * 0.1);
        let battery_heat = core.battery.pack_current().powi(2) * self.config.battery.internal_resistance_ohms;
        let battery_steady = ambient + battery_heat / battery_cooling;
        let battery_decay = (-t * battery_cooling / self.config.battery.thermal_mass_j_per_k).exp();
        let battery_temp =
            battery_steady + (core.battery.average_temperature() - battery_steady) * battery_decay;

        self.thermal_snapshot(&core, motor_temp, battery_temp)
    }

    fn propulsion_type(&self) -> PropulsionType { PropulsionType::Electric }
}
