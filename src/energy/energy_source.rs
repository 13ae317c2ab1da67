use crate::propulsion::PropulsionSystem;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Anything that can report a normalized energy level in `[0, 1]`.
pub trait EnergySource: Send + Sync {
    fn level(&self) -> f64;
}

impl<F> EnergySource for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn level(&self) -> f64 { self() }
}

/// Push-style level shared between a telemetry producer and its readers.
#[derive(Debug, Clone)]
pub struct SharedLevel(Arc<AtomicU64>);

impl SharedLevel {
    pub fn new(level: f64) -> Self { Self(Arc::new(AtomicU64::new(level.to_bits()))) }

    pub fn set(&self, level: f64) { self.0.store(level.to_bits(), Ordering::Release); }

    pub fn get(&self) -> f64 { f64::from_bits(self.0.load(Ordering::Acquire)) }
}

impl EnergySource for SharedLevel {
    fn level(&self) -> f64 { self.get() }
}

/// Battery state of charge as reported by a propulsion backend.
pub struct BatterySoc(Arc<dyn PropulsionSystem>);

impl BatterySoc {
    pub fn new(propulsion: Arc<dyn PropulsionSystem>) -> Self { Self(propulsion) }
}

impl EnergySource for BatterySoc {
    fn level(&self) -> f64 { self.0.energy_state().battery_soc }
}

/// Fuel level as reported by a propulsion backend.
pub struct FuelLevel(Arc<dyn PropulsionSystem>);

impl FuelLevel {
    pub fn new(propulsion: Arc<dyn PropulsionSystem>) -> Self { Self(propulsion) }
}

impl EnergySource for FuelLevel {
    fn level(&self) -> f64 { self.0.energy_state().fuel_level }
}
