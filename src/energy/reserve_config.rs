use crate::config::ConfigError;

/// Reserve thresholds. Each quadruple must be strictly decreasing and inside `[0, 1]`;
/// the reserve manager relies on that without checking it, [`ReserveConfig::validate`] is run at startup.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReserveConfig {
    pub mission_battery_soc: f64,
    pub contingency_battery_soc: f64,
    pub emergency_battery_soc: f64,
    pub absolute_battery_soc: f64,

    pub mission_fuel_level: f64,
    pub contingency_fuel_level: f64,
    pub emergency_fuel_level: f64,
    pub absolute_fuel_level: f64,

    /// Minutes of flight at cruise.
    pub mission_reserve_minutes: f64,
    pub contingency_reserve_minutes: f64,
    pub emergency_reserve_minutes: f64,
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            mission_battery_soc: 0.40,
            contingency_battery_soc: 0.30,
            emergency_battery_soc: 0.20,
            absolute_battery_soc: 0.10,
            mission_fuel_level: 0.40,
            contingency_fuel_level: 0.30,
            emergency_fuel_level: 0.20,
            absolute_fuel_level: 0.10,
            mission_reserve_minutes: 10.0,
            contingency_reserve_minutes: 5.0,
            emergency_reserve_minutes: 2.0,
        }
    }
}

impl ReserveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_tiers(
            "battery SOC thresholds",
            &[
                ("mission_battery_soc", self.mission_battery_soc),
                ("contingency_battery_soc", self.contingency_battery_soc),
                ("emergency_battery_soc", self.emergency_battery_soc),
                ("absolute_battery_soc", self.absolute_battery_soc),
            ],
            Some(1.0),
        )?;
        check_tiers(
            "fuel level thresholds",
            &[
                ("mission_fuel_level", self.mission_fuel_level),
                ("contingency_fuel_level", self.contingency_fuel_level),
                ("emergency_fuel_level", self.emergency_fuel_level),
                ("absolute_fuel_level", self.absolute_fuel_level),
            ],
            Some(1.0),
        )?;
        check_tiers(
            "reserve minutes",
            &[
                ("mission_reserve_minutes", self.mission_reserve_minutes),
                ("contingency_reserve_minutes", self.contingency_reserve_minutes),
                ("emergency_reserve_minutes", self.emergency_reserve_minutes),
            ],
            None,
        )
    }
}

/// Checks that every value lies in `[0, max]` and that the sequence strictly decreases.
fn check_tiers(group: &'static str, tiers: &[(&'static str, f64)], max: Option<f64>) -> Result<(), ConfigError> {
    let upper = max.unwrap_or(f64::MAX);
    for &(field, value) in tiers {
        if !value.is_finite() || value < 0.0 || value > upper {
            return Err(ConfigError::OutOfRange { field, value, min: 0.0, max: upper });
        }
    }
    if tiers.windows(2).any(|pair| pair[0].1 <= pair[1].1) {
        return Err(ConfigError::NotDecreasing(group));
    }
    Ok(())
}
