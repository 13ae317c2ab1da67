use super::{ActionType, EnergySource, ReserveAction, ReserveConfig, ReserveLevel};
use crate::util::{read_lock, write_lock};
use crate::{event, safety, warn};
use chrono::{DateTime, Utc};
use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

/// Margin above the mission battery threshold inside which the operator is warned.
const WARN_MARGIN: f64 = 0.05;

pub type LevelChangeCallback = Arc<dyn Fn(ReserveLevel, ReserveLevel) + Send + Sync>;

struct ReserveState {
    current_level: ReserveLevel,
    battery_source: Option<Arc<dyn EnergySource>>,
    fuel_source: Option<Arc<dyn EnergySource>>,
    on_level_change: Option<LevelChangeCallback>,
    last_check: Option<DateTime<Utc>>,
}

/// Classifies battery and fuel readings into reserve tiers and derives mandatory actions.
///
/// The manager is not self-scheduling; the owner calls [`ReserveManager::check`] periodically.
/// Without any registered source it stays at [`ReserveLevel::Mission`] for good.
pub struct ReserveManager {
    config: ReserveConfig,
    state: RwLock<ReserveState>,
}

impl ReserveManager {
    pub fn new(config: ReserveConfig) -> Self {
        Self {
            config,
            state: RwLock::new(ReserveState {
                current_level: ReserveLevel::Mission,
                battery_source: None,
                fuel_source: None,
                on_level_change: None,
                last_check: None,
            }),
        }
    }

    pub fn config(&self) -> &ReserveConfig { &self.config }

    pub fn current_level(&self) -> ReserveLevel { read_lock(&self.state).current_level }

    pub fn last_check(&self) -> Option<DateTime<Utc>> { read_lock(&self.state).last_check }

    pub fn set_battery_source(&self, source: impl EnergySource + 'static) {
        write_lock(&self.state).battery_source = Some(Arc::new(source));
    }

    pub fn set_fuel_source(&self, source: impl EnergySource + 'static) {
        write_lock(&self.state).fuel_source = Some(Arc::new(source));
    }

    /// Registers the callback fired with `(old, new)` whenever [`ReserveManager::check`] changes the tier.
    /// It runs after the internal lock is released and may query the manager.
    pub fn set_level_change_callback<F>(&self, callback: F)
    where F: Fn(ReserveLevel, ReserveLevel) + Send + Sync + 'static {
        write_lock(&self.state).on_level_change = Some(Arc::new(callback));
    }

    /// Re-evaluates the reserve tier from the registered sources.
    ///
    /// # Returns
    /// The worse of the battery and fuel tiers, or the previous tier if no source is registered.
    pub fn check(&self) -> ReserveLevel {
        let (old, new, callback) = {
            let mut state = write_lock(&self.state);
            let old = state.current_level;
            let battery = state.battery_source.as_ref().and_then(|s| Self::read_source(s.as_ref(), "battery"));
            let fuel = state.fuel_source.as_ref().and_then(|s| Self::read_source(s.as_ref(), "fuel"));
            let battery_level = battery.map(|soc| self.battery_level(soc));
            let fuel_level = fuel.map(|level| self.fuel_level(level));
            let new = match (battery_level, fuel_level) {
                (Some(b), Some(f)) => b.max(f),
                (Some(level), None) | (None, Some(level)) => level,
                (None, None) => old,
            };
            state.current_level = new;
            state.last_check = Some(Utc::now());
            (old, new, state.on_level_change.clone())
        };
        event!("Reserve check: battery/fuel tier {new}");
        if old != new {
            safety!("Reserve level changed: {old} -> {new}");
            if let Some(callback) = callback {
                callback(old, new);
            }
        }
        new
    }

    /// Tier for a battery state of charge.
    pub fn battery_level(&self, soc: f64) -> ReserveLevel {
        let c = &self.config;
        ReserveLevel::classify(soc, c.absolute_battery_soc, c.emergency_battery_soc, c.contingency_battery_soc)
    }

    /// Tier for a fuel level.
    pub fn fuel_level(&self, level: f64) -> ReserveLevel {
        let c = &self.config;
        ReserveLevel::classify(level, c.absolute_fuel_level, c.emergency_fuel_level, c.contingency_fuel_level)
    }

    /// Classifies an endurance estimate against the reserve-minute thresholds. Planning aid only.
    pub fn endurance_level(&self, endurance: Duration) -> ReserveLevel {
        let minutes = endurance.as_secs_f64() / 60.0;
        let c = &self.config;
        ReserveLevel::classify(
            minutes,
            c.emergency_reserve_minutes,
            c.contingency_reserve_minutes,
            c.mission_reserve_minutes,
        )
    }

    /// Energy usable before the contingency reserve is touched.
    ///
    /// # Arguments
    /// * `total_energy` - Energy represented by the current SOC, in any unit.
    ///
    /// # Returns
    /// `total_energy` scaled by the share of SOC above the contingency threshold,
    /// or `0.0` without a battery source or at/below contingency.
    pub fn available_energy(&self, total_energy: f64) -> f64 {
        let Some(soc) = self.battery_soc() else { return 0.0 };
        let usable = soc - self.config.contingency_battery_soc;
        if usable <= 0.0 {
            return 0.0;
        }
        usable * total_energy / soc
    }

    /// Actions mandated by the current tier, most urgent first.
    pub fn reserve_actions(&self) -> Vec<ReserveAction> {
        match self.current_level() {
            ReserveLevel::Absolute => vec![ReserveAction::mandatory(1, ActionType::ImmediateLanding)],
            ReserveLevel::Emergency => vec![
                ReserveAction::mandatory(1, ActionType::FindNearestLanding),
                ReserveAction::mandatory(2, ActionType::ReducePower),
            ],
            ReserveLevel::Contingency => vec![
                ReserveAction::mandatory(1, ActionType::ReturnToBase),
                ReserveAction::mandatory(2, ActionType::AbortMission),
            ],
            ReserveLevel::Mission => match self.battery_soc() {
                Some(soc) if soc <= self.config.mission_battery_soc + WARN_MARGIN => {
                    vec![ReserveAction::advisory(3, ActionType::WarnOperator)]
                }
                _ => Vec::new(),
            },
        }
    }

    /// Gate for discretionary power draws.
    pub fn is_operation_allowed(&self, required_energy: f64, total_energy: f64) -> bool {
        required_energy <= self.available_energy(total_energy)
    }

    fn battery_soc(&self) -> Option<f64> {
        let source = read_lock(&self.state).battery_source.clone()?;
        Self::read_source(source.as_ref(), "battery")
    }

    fn read_source(source: &dyn EnergySource, name: &str) -> Option<f64> {
        let level = source.level();
        if level.is_finite() {
            Some(level)
        } else {
            warn!("Ignoring non-finite {name} level reading");
            None
        }
    }
}
