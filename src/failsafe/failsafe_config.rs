use super::LandingZone;
use crate::config::ConfigError;
use crate::util::Vec3D;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FailsafeConfig {
    pub enable_auto_rtb: bool,
    pub enable_auto_land: bool,
    pub enable_parachute: bool,
    /// Below this altitude (m AGL) the aircraft lands in place instead of diverting.
    pub min_safe_altitude_agl: f64,
    pub min_safe_fuel: f64,
    pub min_safe_battery: f64,
    /// Fuel level at which fuel critical counts as exhaustion.
    pub fuel_exhaustion_level: f64,
    pub max_time_without_comms_secs: u64,
    pub rtb_location: Vec3D<f64>,
    pub landing_zones: Vec<LandingZone>,
    pub check_interval_ms: u64,
}

impl Default for FailsafeConfig {
    fn default() -> Self {
        Self {
            enable_auto_rtb: true,
            enable_auto_land: true,
            enable_parachute: false,
            min_safe_altitude_agl: 50.0,
            min_safe_fuel: 0.15,
            min_safe_battery: 0.20,
            fuel_exhaustion_level: 0.02,
            max_time_without_comms_secs: 300,
            rtb_location: Vec3D::new(0.0, 0.0, 500.0),
            landing_zones: Vec::new(),
            check_interval_ms: 100,
        }
    }
}

impl FailsafeConfig {
    pub fn max_time_without_comms(&self) -> Duration { Duration::from_secs(self.max_time_without_comms_secs) }

    pub fn check_interval(&self) -> Duration { Duration::from_millis(self.check_interval_ms) }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("min_safe_fuel", self.min_safe_fuel),
            ("min_safe_battery", self.min_safe_battery),
            ("fuel_exhaustion_level", self.fuel_exhaustion_level),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value, min: 0.0, max: 1.0 });
            }
        }
        if !self.min_safe_altitude_agl.is_finite() || self.min_safe_altitude_agl < 0.0 {
            return Err(ConfigError::NotPositive { field: "min_safe_altitude_agl", value: self.min_safe_altitude_agl });
        }
        if self.max_time_without_comms_secs == 0 {
            return Err(ConfigError::Zero("max_time_without_comms_secs"));
        }
        if self.check_interval_ms == 0 {
            return Err(ConfigError::Zero("check_interval_ms"));
        }
        if !self.rtb_location.is_finite() {
            return Err(ConfigError::NotFinite("rtb_location"));
        }
        if self.landing_zones.iter().any(|zone| !zone.position().is_finite()) {
            return Err(ConfigError::NotFinite("landing_zones"));
        }
        Ok(())
    }
}
