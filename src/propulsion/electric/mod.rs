mod battery_model;
mod electric_propulsion;
mod motor_model;

pub use battery_model::{BatteryChemistry, BatteryConfig, BatteryModel};
pub use electric_propulsion::{ElectricConfig, ElectricPropulsion};
pub use motor_model::{MotorConfig, MotorModel};

#[cfg(test)]
mod tests;
