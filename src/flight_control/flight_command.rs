use super::DecisionConfig;
use chrono::{DateTime, Utc};

/// One control tick's output. Angles in radians, yaw rate in rad/s.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlightCommand {
    pub timestamp: DateTime<Utc>,
    pub roll_angle: f64,
    pub pitch_angle: f64,
    pub yaw_rate: f64,
    /// In `[0, 1]`.
    pub throttle: f64,
    pub auto_throttle: bool,
    pub auto_land: bool,
    pub emergency_rtb: bool,
    pub deploy_parachute: bool,
}

impl FlightCommand {
    /// Wings level, no yaw, conservative throttle under auto-throttle.
    pub fn safe_default(throttle: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            roll_angle: 0.0,
            pitch_angle: 0.0,
            yaw_rate: 0.0,
            throttle,
            auto_throttle: true,
            auto_land: false,
            emergency_rtb: false,
            deploy_parachute: false,
        }
    }

    /// Whether the command lies inside the attitude, rate and throttle envelope of `config`.
    pub fn is_within(&self, config: &DecisionConfig) -> bool {
        self.roll_angle.abs() <= config.max_roll_angle
            && self.pitch_angle.abs() <= config.max_pitch_angle
            && self.yaw_rate.abs() <= config.max_yaw_rate
            && (0.0..=1.0).contains(&self.throttle)
    }

    /// Same command ignoring the timestamp.
    pub fn same_as(&self, other: &Self) -> bool {
        Self { timestamp: other.timestamp, ..self.clone() } == *other
    }
}
