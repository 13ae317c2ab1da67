use crate::util::Vec3D;
use chrono::{DateTime, Utc};
use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    Radar,
    Missile,
    Aircraft,
    Sam,
    Weather,
    Terrain,
    BirdStrike,
}

/// A tracked threat as reported by the threat provider.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Threat {
    pub id: String,
    pub threat_type: ThreatType,
    pub position: Vec3D<f64>,
    /// Slant range from the aircraft (m).
    pub distance: f64,
    /// Absolute bearing from the aircraft, clockwise from north (rad).
    pub bearing: f64,
    /// In `[0, 1]`.
    pub severity: f64,
    pub timestamp: DateTime<Utc>,
}

impl Threat {
    /// Builds a threat with range and bearing measured from `observer`.
    pub fn observed_from(
        id: &str,
        threat_type: ThreatType,
        observer: Vec3D<f64>,
        position: Vec3D<f64>,
        severity: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            threat_type,
            position,
            distance: observer.euclid_distance(&position),
            bearing: observer.bearing_to(&position),
            severity,
            timestamp: Utc::now(),
        }
    }
}
