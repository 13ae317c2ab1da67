use crate::config::CoreConfig;
use crate::energy::{BatterySoc, FuelLevel, ReserveManager};
use crate::failsafe::EmergencySystem;
use crate::flight_control::DecisionEngine;
use crate::propulsion::{PropulsionSystem, PropulsionType};
use std::sync::Arc;

/// Shared handles to the safety components, wired to each other and to one propulsion backend.
#[derive(Clone)]
pub struct Keychain {
    /// The propulsion backend providing energy readings and health.
    propulsion: Arc<dyn PropulsionSystem>,
    /// Classifies battery and fuel readings into reserve tiers.
    reserve: Arc<ReserveManager>,
    /// Arbitrates the flight mode and tracks active emergencies.
    failsafe: Arc<EmergencySystem>,
    /// Produces one flight command per control tick.
    decision: Arc<DecisionEngine>,
}

impl Keychain {
    /// Builds every component from `config` and wires the overlays.
    ///
    /// # Arguments
    /// - `config`: The validated onboard configuration.
    /// - `propulsion`: The backend whose state of charge (and fuel, unless purely electric)
    ///   feeds the reserve manager.
    ///
    /// # Returns
    /// A `Keychain` whose decision engine consults the reserve manager and the emergency system.
    pub fn new(config: &CoreConfig, propulsion: Arc<dyn PropulsionSystem>) -> Self {
        let reserve = Arc::new(ReserveManager::new(config.reserve.clone()));
        reserve.set_battery_source(BatterySoc::new(Arc::clone(&propulsion)));
        if propulsion.propulsion_type() != PropulsionType::Electric {
            reserve.set_fuel_source(FuelLevel::new(Arc::clone(&propulsion)));
        }
        let failsafe = Arc::new(EmergencySystem::new(config.failsafe.clone()));
        let decision = Arc::new(
            DecisionEngine::new(config.decision.clone())
                .with_reserve_manager(Arc::clone(&reserve))
                .with_emergency_system(Arc::clone(&failsafe)),
        );
        Self { propulsion, reserve, failsafe, decision }
    }

    pub fn propulsion(&self) -> Arc<dyn PropulsionSystem> { Arc::clone(&self.propulsion) }

    pub fn reserve(&self) -> Arc<ReserveManager> { Arc::clone(&self.reserve) }

    pub fn failsafe(&self) -> Arc<EmergencySystem> { Arc::clone(&self.failsafe) }

    pub fn decision(&self) -> Arc<DecisionEngine> { Arc::clone(&self.decision) }
}
