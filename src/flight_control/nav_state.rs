use crate::util::Vec3D;
use chrono::{DateTime, Utc};

/// Latest navigation solution pushed by the navigation collaborator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NavState {
    pub position: Vec3D<f64>,
    pub velocity: Vec3D<f64>,
    /// Clockwise from north (rad).
    pub heading: f64,
    pub airspeed: f64,
    /// In `[0, 1]`; waypoints are only accepted with a positive confidence.
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl Default for NavState {
    /// Level flight at 500 m over the origin until the first fix arrives.
    fn default() -> Self {
        Self {
            position: Vec3D::new(0.0, 0.0, 500.0),
            velocity: Vec3D::zero(),
            heading: 0.0,
            airspeed: 0.0,
            confidence: 0.5,
            timestamp: Utc::now(),
        }
    }
}

impl NavState {
    pub fn new(position: Vec3D<f64>, velocity: Vec3D<f64>, heading: f64) -> Self {
        Self {
            position,
            velocity,
            heading,
            airspeed: velocity.abs(),
            confidence: 1.0,
            timestamp: Utc::now(),
        }
    }
}
