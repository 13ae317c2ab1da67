//! Tiered energy reserves: battery and fuel readings are classified into reserve levels
//! which in turn mandate recovery actions.

mod energy_source;
mod reserve_config;
mod reserve_level;
mod reserve_manager;

pub use energy_source::{BatterySoc, EnergySource, FuelLevel, SharedLevel};
pub use reserve_config::ReserveConfig;
pub use reserve_level::{ActionType, ReserveAction, ReserveLevel};
pub use reserve_manager::{LevelChangeCallback, ReserveManager};
