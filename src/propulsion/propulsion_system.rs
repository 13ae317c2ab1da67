use super::{
    EnergyState, PropulsionError, PropulsionHealth, PropulsionType, ThermalState,
    ThrustCapability,
};
use crate::util::Vec3D;
use async_trait::async_trait;
use std::time::Duration;

/// Allowed deviation of a thrust vector's norm from 1.
pub const THRUST_VECTOR_NORM_TOLERANCE: f64 = 0.1;

/// The contract every propulsion backend implements.
///
/// Queries return the latest cached snapshot and never wait on hardware.
/// Predictions are best-effort planning aids and must not gate safety decisions.
#[async_trait]
pub trait PropulsionSystem: Send + Sync {
    async fn initialize(&self) -> Result<(), PropulsionError>;
    async fn start(&self) -> Result<(), PropulsionError>;
    fn stop(&self) -> Result<(), PropulsionError>;

    fn energy_state(&self) -> EnergyState;
    fn thermal_state(&self) -> ThermalState;
    fn thrust_capability(&self) -> ThrustCapability;
    fn health(&self) -> PropulsionHealth;

    /// Sets normalized thrust in `[0, 1]`.
    fn set_thrust_command(&self, thrust: f64) -> Result<(), PropulsionError>;
    /// Sets the thrust direction; the vector must be approximately unit length.
    fn set_thrust_vector(&self, vector: Vec3D<f64>) -> Result<(), PropulsionError>;
    /// Last-resort cut. Any error means the shutdown must be assumed to have failed.
    fn emergency_shutdown(&self) -> Result<(), PropulsionError>;

    /// Predicts remaining flight time for a sequence of power draws (W).
    fn predict_endurance(&self, power_profile: &[f64]) -> Duration;
    fn predict_thermal_state(&self, duration: Duration) -> ThermalState;

    fn propulsion_type(&self) -> PropulsionType;
}

/// Validates a normalized thrust command.
pub fn check_thrust_command(thrust: f64) -> Result<f64, PropulsionError> {
    if thrust.is_finite() && (0.0..=1.0).contains(&thrust) {
        Ok(thrust)
    } else {
        Err(PropulsionError::OutOfRange { what: "thrust command", value: thrust })
    }
}

/// Validates a thrust direction vector.
pub fn check_thrust_vector(vector: Vec3D<f64>) -> Result<Vec3D<f64>, PropulsionError> {
    let norm = vector.abs();
    if !vector.is_finite() || (norm - 1.0).abs() > THRUST_VECTOR_NORM_TOLERANCE {
        return Err(PropulsionError::OutOfRange { what: "thrust vector norm", value: norm });
    }
    Ok(vector)
}
