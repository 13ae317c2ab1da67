mod decision_config;
mod decision_engine;
mod decision_error;
mod flight_command;
mod mission;
mod nav_state;
mod threat;

pub use decision_config::DecisionConfig;
pub use decision_engine::DecisionEngine;
pub use decision_error::DecisionError;
pub use flight_command::FlightCommand;
pub use mission::{Mission, MissionStatus, MissionType, Waypoint};
pub use nav_state::NavState;
pub use threat::{Threat, ThreatType};
