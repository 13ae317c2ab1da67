//! The propulsion contract: the vocabulary every power source exposes and the trait
//! hardware drivers implement, plus a simulated electric backend.

pub mod electric;
mod health;
mod lifecycle;
mod propulsion_error;
mod propulsion_state;
mod propulsion_system;

pub use health::{Fault, HealthStatus, PropulsionHealth};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use propulsion_error::PropulsionError;
pub use propulsion_state::{EnergyState, PropulsionType, ThermalState, ThrustCapability};
pub use propulsion_system::{
    PropulsionSystem, THRUST_VECTOR_NORM_TOLERANCE, check_thrust_command, check_thrust_vector,
};

#[cfg(test)]
mod tests;
