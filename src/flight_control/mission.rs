use crate::util::Vec3D;
use std::{sync::Arc, time::Duration};
use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionType {
    Recon,
    Transport,
    Patrol,
    Intercept,
    Rescue,
    Training,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Aborted,
}

impl MissionStatus {
    pub fn is_terminal(self) -> bool { matches!(self, Self::Completed | Self::Aborted) }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Waypoint {
    pub id: String,
    /// Target point; `z` is the altitude flown to.
    pub position: Vec3D<f64>,
    /// Target airspeed (m/s), zero keeps cruise throttle.
    pub speed: f64,
    /// Altitude AGL reported to operators.
    pub altitude: f64,
    /// Desired heading on arrival (rad).
    pub heading: f64,
    pub loiter: Duration,
}

impl Waypoint {
    pub fn new(id: &str, position: Vec3D<f64>) -> Self {
        Self { id: id.to_string(), position, speed: 0.0, altitude: position.z(), heading: 0.0, loiter: Duration::ZERO }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_loiter(mut self, loiter: Duration) -> Self {
        self.loiter = loiter;
        self
    }
}

/// A mission snapshot. Waypoints are shared and never edited once part of a mission.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Mission {
    id: String,
    mission_type: MissionType,
    waypoints: Arc<[Waypoint]>,
    status: MissionStatus,
}

impl Mission {
    pub fn new(id: &str, mission_type: MissionType, waypoints: Vec<Waypoint>) -> Self {
        Self { id: id.to_string(), mission_type, waypoints: waypoints.into(), status: MissionStatus::Pending }
    }

    pub fn with_status(mut self, status: MissionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn mission_type(&self) -> MissionType { self.mission_type }
    pub fn waypoints(&self) -> &[Waypoint] { &self.waypoints }
    pub fn status(&self) -> MissionStatus { self.status }
}
