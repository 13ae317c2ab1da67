use crate::util::interpolate;
use std::time::Duration;
use strum_macros::Display;

/// Room temperature every cell starts at (°C).
const INITIAL_CELL_TEMP: f64 = 25.0;
/// C-rate from which the sagged discharge curve applies.
const HIGH_C_RATE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatteryChemistry {
    LiPo,
    LiFe,
    LiIon,
    LiHv,
}

impl BatteryChemistry {
    /// Open-circuit cell voltage over SOC at 1C, ascending SOC.
    fn nominal_curve(self) -> &'static [(f64, f64)] {
        match self {
            Self::LiPo => &[
                (0.0, 3.00), (0.1, 3.40), (0.2, 3.55), (0.3, 3.65), (0.4, 3.70), (0.5, 3.73),
                (0.6, 3.80), (0.7, 3.87), (0.8, 3.96), (0.9, 4.08), (1.0, 4.20),
            ],
            Self::LiFe => &[
                (0.0, 2.50), (0.1, 3.10), (0.2, 3.18), (0.3, 3.22), (0.4, 3.24), (0.5, 3.25),
                (0.6, 3.26), (0.7, 3.28), (0.8, 3.30), (0.9, 3.35), (1.0, 3.60),
            ],
            Self::LiIon => &[
                (0.0, 3.00), (0.1, 3.35), (0.2, 3.50), (0.3, 3.61), (0.4, 3.67), (0.5, 3.71),
                (0.6, 3.77), (0.7, 3.85), (0.8, 3.95), (0.9, 4.06), (1.0, 4.20),
            ],
            Self::LiHv => &[
                (0.0, 3.00), (0.1, 3.42), (0.2, 3.58), (0.3, 3.68), (0.4, 3.75), (0.5, 3.80),
                (0.6, 3.88), (0.7, 3.97), (0.8, 4.08), (0.9, 4.22), (1.0, 4.35),
            ],
        }
    }

    /// Loaded curve at 5C, only characterised for LiPo.
    fn high_rate_curve(self) -> Option<&'static [(f64, f64)]> {
        match self {
            Self::LiPo => Some(&[
                (0.0, 2.90), (0.1, 3.30), (0.2, 3.45), (0.3, 3.55), (0.4, 3.60), (0.5, 3.63),
                (0.6, 3.70), (0.7, 3.77), (0.8, 3.86), (0.9, 3.98), (1.0, 4.10),
            ]),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    pub chemistry: BatteryChemistry,
    pub cell_count: usize,
    pub parallel_count: usize,
    pub nominal_capacity_ah: f64,
    pub nominal_voltage_per_cell: f64,
    pub max_voltage_per_cell: f64,
    pub min_voltage_per_cell: f64,
    pub cutoff_voltage_per_cell: f64,
    pub max_discharge_c: f64,
    pub internal_resistance_ohms: f64,
    pub thermal_mass_j_per_k: f64,
    pub cooling_coefficient: f64,
    pub max_discharge_temp_c: f64,
    pub min_operating_temp_c: f64,
    pub pack_mass_kg: f64,
}

impl Default for BatteryConfig {
    /// A 6S2P 5 Ah LiPo pack.
    fn default() -> Self {
        Self {
            chemistry: BatteryChemistry::LiPo,
            cell_count: 6,
            parallel_count: 2,
            nominal_capacity_ah: 5.0,
            nominal_voltage_per_cell: 3.70,
            max_voltage_per_cell: 4.20,
            min_voltage_per_cell: 3.30,
            cutoff_voltage_per_cell: 3.00,
            max_discharge_c: 25.0,
            internal_resistance_ohms: 0.015,
            thermal_mass_j_per_k: 50.0,
            cooling_coefficient: 2.5,
            max_discharge_temp_c: 60.0,
            min_operating_temp_c: 0.0,
            pack_mass_kg: 1.6,
        }
    }
}

impl BatteryConfig {
    pub fn capacity_ah(&self) -> f64 { self.nominal_capacity_ah * self.parallel_count as f64 }

    pub fn nominal_pack_voltage(&self) -> f64 {
        self.nominal_voltage_per_cell * self.cell_count as f64
    }

    /// Rated pack energy (Wh).
    pub fn total_energy_wh(&self) -> f64 { self.capacity_ah() * self.nominal_pack_voltage() }
}

/// Pack state estimator fusing coulomb counting with the chemistry's discharge curve.
#[derive(Debug, Clone)]
pub struct BatteryModel {
    config: BatteryConfig,
    pack_voltage: f64,
    pack_current: f64,
    cell_voltages: Vec<f64>,
    cell_temperatures: Vec<f64>,
    soc: f64,
    soh: f64,
    energy_used_wh: f64,
    coulomb_count: f64,
}

impl BatteryModel {
    pub fn new(config: BatteryConfig) -> Self {
        let cells = config.cell_count;
        Self {
            pack_voltage: config.max_voltage_per_cell * cells as f64,
            pack_current: 0.0,
            cell_voltages: vec![config.max_voltage_per_cell; cells],
            cell_temperatures: vec![INITIAL_CELL_TEMP; cells],
            soc: 1.0,
            soh: 1.0,
            energy_used_wh: 0.0,
            coulomb_count: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &BatteryConfig { &self.config }
    pub fn soc(&self) -> f64 { self.soc }
    pub fn soh(&self) -> f64 { self.soh }
    pub fn pack_voltage(&self) -> f64 { self.pack_voltage }
    pub fn pack_current(&self) -> f64 { self.pack_current }
    pub fn cell_voltages(&self) -> &[f64] { &self.cell_voltages }
    pub fn cell_temperatures(&self) -> &[f64] { &self.cell_temperatures }
    pub fn energy_used_wh(&self) -> f64 { self.energy_used_wh }
    pub fn coulomb_count(&self) -> f64 { self.coulomb_count }

    /// Ingests a pack measurement taken `dt` after the previous one.
    ///
    /// # Arguments
    /// * `voltage` - Pack voltage (V).
    /// * `current` - Discharge current (A), positive when discharging.
    /// * `cell_temps` - Optional per-cell temperatures; ignored unless one per cell.
    /// * `dt` - Time since the previous update.
    pub fn update(&mut self, voltage: f64, current: f64, cell_temps: Option<&[f64]>, dt: Duration) {
        let dt_s = dt.as_secs_f64().max(0.01);
        self.pack_voltage = voltage;
        self.pack_current = current;
        if let Some(temps) = cell_temps.filter(|t| t.len() == self.cell_temperatures.len()) {
            self.cell_temperatures.copy_from_slice(temps);
        }
        let cell_voltage = voltage / self.config.cell_count as f64;
        self.cell_voltages.fill(cell_voltage);

        let coulombs = current * dt_s;
        self.coulomb_count += coulombs;
        let usable_coulombs = self.config.capacity_ah() * 3600.0 * self.soh;
        let soc_coulomb = self.soc - coulombs / usable_coulombs;
        let c_rate = current.abs() / self.config.capacity_ah();
        let soc_voltage = self.voltage_to_soc(cell_voltage, c_rate);

        // at rest the curve is trustworthy, under load coulomb counting is
        let fused = if current == 0.0 {
            0.7 * soc_voltage + 0.3 * soc_coulomb
        } else {
            0.3 * soc_voltage + 0.7 * soc_coulomb
        };
        self.soc = fused.clamp(0.0, 1.0);
        self.energy_used_wh += voltage * current * dt_s / 3600.0;
    }

    /// Applies resistive heating and convective cooling to every cell.
    pub fn update_thermal(&mut self, ambient_temp: f64, airspeed: f64, dt: Duration) {
        let heat = self.pack_current.powi(2) * self.config.internal_resistance_ohms;
        let cooling_coeff = self.config.cooling_coefficient * (1.0 + airspeed * 0.1);
        let per_cell_mass = self.config.thermal_mass_j_per_k / self.config.cell_count.max(1) as f64;
        let per_cell_heat = heat / self.config.cell_count.max(1) as f64;
        for temp in &mut self.cell_temperatures {
            let cooling = cooling_coeff / self.config.cell_count.max(1) as f64 * (*temp - ambient_temp);
            *temp += (per_cell_heat - cooling) * dt.as_secs_f64() / per_cell_mass;
        }
    }

    /// Converts a cell voltage into SOC using the discharge curve for the given C-rate.
    pub fn voltage_to_soc(&self, cell_voltage: f64, c_rate: f64) -> f64 {
        let curve = self
            .config
            .chemistry
            .high_rate_curve()
            .filter(|_| c_rate >= HIGH_C_RATE)
            .unwrap_or_else(|| self.config.chemistry.nominal_curve());
        let inverse: Vec<(f64, f64)> = curve.iter().map(|&(soc, v)| (v, soc)).collect();
        interpolate(&inverse, cell_voltage).unwrap_or_else(|| {
            let span = self.config.max_voltage_per_cell - self.config.min_voltage_per_cell;
            (cell_voltage - self.config.min_voltage_per_cell) / span
        })
    }

    /// Open-circuit cell voltage at the given SOC.
    pub fn open_circuit_cell_voltage(&self, soc: f64) -> f64 {
        interpolate(self.config.chemistry.nominal_curve(), soc)
            .unwrap_or(self.config.nominal_voltage_per_cell)
    }

    pub fn total_energy_wh(&self) -> f64 { self.config.total_energy_wh() }

    pub fn remaining_energy_wh(&self) -> f64 { self.total_energy_wh() * self.soc * self.soh }

    pub fn max_discharge_power(&self) -> f64 {
        self.pack_voltage * self.config.capacity_ah() * self.config.max_discharge_c
    }

    /// Predicts remaining time at a constant power draw (W).
    /// A non-positive draw never depletes the pack.
    pub fn predict_endurance(&self, power_watts: f64) -> Duration {
        if power_watts <= 0.0 || !power_watts.is_finite() {
            return Duration::MAX;
        }
        let hours = self.remaining_energy_wh() / power_watts;
        Duration::try_from_secs_f64(hours * 3600.0).unwrap_or(Duration::MAX)
    }

    pub fn average_temperature(&self) -> f64 {
        if self.cell_temperatures.is_empty() {
            return INITIAL_CELL_TEMP;
        }
        self.cell_temperatures.iter().sum::<f64>() / self.cell_temperatures.len() as f64
    }

    pub fn is_thermal_ok(&self) -> bool {
        let temp = self.average_temperature();
        temp >= self.config.min_operating_temp_c && temp <= self.config.max_discharge_temp_c
    }

    /// Margin to the discharge temperature limit in `[0, 1]`.
    pub fn thermal_margin(&self) -> f64 {
        let span = self.config.max_discharge_temp_c - INITIAL_CELL_TEMP;
        ((self.config.max_discharge_temp_c - self.average_temperature()) / span).clamp(0.0, 1.0)
    }

    /// Lowest cell voltage of the pack.
    pub fn min_cell_voltage(&self) -> f64 {
        self.cell_voltages.iter().copied().fold(f64::INFINITY, f64::min)
    }
}
