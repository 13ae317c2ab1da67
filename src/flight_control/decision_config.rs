use crate::config::ConfigError;
use crate::util::Vec3D;

/// Limits and tuning of the decision engine. Angles in radians, rates in rad/s, distances in metres.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub max_roll_angle: f64,
    pub max_pitch_angle: f64,
    pub max_yaw_rate: f64,
    /// Metres AGL.
    pub min_safe_altitude: f64,
    /// m/s
    pub max_vertical_speed: f64,
    pub enable_autoland: bool,
    pub enable_threat_avoid: bool,
    /// Control ticks per second.
    pub decision_rate: f64,
    pub avoidance_radius: f64,
    pub waypoint_acceptance_radius: f64,
    pub safe_default_throttle: f64,
    pub cruise_throttle: f64,
    /// Recovery point flown to on a contingency reserve when no failsafe target is known.
    pub home_position: Vec3D<f64>,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            max_roll_angle: 0.785,
            max_pitch_angle: 0.524,
            max_yaw_rate: 0.349,
            min_safe_altitude: 100.0,
            max_vertical_speed: 10.0,
            enable_autoland: true,
            enable_threat_avoid: true,
            decision_rate: 50.0,
            avoidance_radius: 5000.0,
            waypoint_acceptance_radius: 50.0,
            safe_default_throttle: 0.5,
            cruise_throttle: 0.6,
            home_position: Vec3D::new(0.0, 0.0, 500.0),
        }
    }
}

impl DecisionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_roll_angle", self.max_roll_angle),
            ("max_pitch_angle", self.max_pitch_angle),
            ("max_yaw_rate", self.max_yaw_rate),
            ("max_vertical_speed", self.max_vertical_speed),
            ("decision_rate", self.decision_rate),
            ("avoidance_radius", self.avoidance_radius),
            ("waypoint_acceptance_radius", self.waypoint_acceptance_radius),
        ];
        if let Some(&(field, value)) = positive.iter().find(|(_, v)| !v.is_finite() || *v <= 0.0) {
            return Err(ConfigError::NotPositive { field, value });
        }
        if !self.min_safe_altitude.is_finite() || self.min_safe_altitude < 0.0 {
            return Err(ConfigError::NotPositive { field: "min_safe_altitude", value: self.min_safe_altitude });
        }
        for (field, value) in [
            ("safe_default_throttle", self.safe_default_throttle),
            ("cruise_throttle", self.cruise_throttle),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value, min: 0.0, max: 1.0 });
            }
        }
        if !self.home_position.is_finite() {
            return Err(ConfigError::NotFinite("home_position"));
        }
        Ok(())
    }

    /// Control loop period derived from `decision_rate`.
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.decision_rate)
    }
}
