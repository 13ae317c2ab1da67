use super::{
    ActiveEmergency, AttitudeCommand, AutopilotMode, ECONOMY_THROTTLE, EmergencySource,
    EmergencyType, Escalation, EscalationPolicy, FailsafeConfig, FlightController, FlightMode,
    GLIDE_PITCH, LANDING_PITCH, LANDING_THROTTLE, LandingZone, PolicyInput, Procedure,
    ProcedureError, StepAction, procedure_catalogue,
};
use crate::propulsion::{HealthStatus, PropulsionHealth};
use crate::util::{Vec3D, read_lock, write_lock};
use crate::{error, info, log, safety, warn};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

/// Subsystems tracked from the start, all healthy.
const SEEDED_SUBSYSTEMS: [&str; 7] =
    ["primary_flight", "backup_flight", "emergency_flight", "gps", "ins", "radar", "comm"];
const FLIGHT_CONTROLLERS: [&str; 3] = ["primary_flight", "backup_flight", "emergency_flight"];
const COMM_SUBSYSTEM: &str = "comm";
const PROPULSION_SUBSYSTEM: &str = "propulsion";
const BACKUP_SENSORS: [&str; 3] = ["gps", "ins", "radar"];

#[derive(Debug, Clone, PartialEq)]
pub enum FailsafeEvent {
    ModeChanged { old: FlightMode, new: FlightMode },
    EmergencyDetected(ActiveEmergency),
    EmergencyCleared(EmergencyType),
    Escalated(Escalation),
}

pub type FailsafeCallback = Arc<dyn Fn(&FailsafeEvent) + Send + Sync>;

struct FailsafeState {
    health: BTreeMap<String, HealthStatus>,
    battery_level: f64,
    fuel_level: f64,
    mode: FlightMode,
    active: Vec<ActiveEmergency>,
    last_comm: DateTime<Utc>,
    position: Option<Vec3D<f64>>,
    escalation: Option<Escalation>,
    forced_escalation: Option<Escalation>,
    on_event: Option<FailsafeCallback>,
}

/// Arbiter of the flight mode and registry of active emergencies.
///
/// Setters only record the latest reading. The mode, the emergency registry and the
/// escalation are recomputed by [`EmergencySystem::monitor`] (or [`EmergencySystem::is_healthy`]),
/// so a noisy sensor stream does not make the mode thrash between evaluations.
pub struct EmergencySystem {
    config: FailsafeConfig,
    policy: EscalationPolicy,
    procedures: HashMap<EmergencyType, Procedure>,
    state: RwLock<FailsafeState>,
}

impl EmergencySystem {
    pub fn new(config: FailsafeConfig) -> Self {
        let health = SEEDED_SUBSYSTEMS.iter().map(|s| ((*s).to_string(), HealthStatus::Ok)).collect();
        Self {
            policy: EscalationPolicy::new(config.clone()),
            procedures: procedure_catalogue(),
            state: RwLock::new(FailsafeState {
                health,
                battery_level: 1.0,
                fuel_level: 1.0,
                mode: FlightMode::Primary,
                active: Vec::new(),
                last_comm: Utc::now(),
                position: None,
                escalation: None,
                forced_escalation: None,
                on_event: None,
            }),
            config,
        }
    }

    pub fn config(&self) -> &FailsafeConfig { &self.config }

    pub fn mode(&self) -> FlightMode { read_lock(&self.state).mode }

    pub fn current_escalation(&self) -> Option<Escalation> { read_lock(&self.state).escalation.clone() }

    pub fn fuel_level(&self) -> f64 { read_lock(&self.state).fuel_level }

    pub fn battery_level(&self) -> f64 { read_lock(&self.state).battery_level }

    pub fn health(&self, subsystem: &str) -> Option<HealthStatus> {
        read_lock(&self.state).health.get(subsystem).copied()
    }

    pub fn health_map(&self) -> BTreeMap<String, HealthStatus> { read_lock(&self.state).health.clone() }

    /// Worst status across all tracked subsystems.
    pub fn overall_health(&self) -> HealthStatus {
        read_lock(&self.state).health.values().copied().max().unwrap_or_default()
    }

    /// Active emergencies ordered by detection time.
    pub fn active_emergencies(&self) -> Vec<ActiveEmergency> {
        let state = read_lock(&self.state);
        state.active.iter().cloned().sorted_by_key(ActiveEmergency::detected_at).collect()
    }

    pub fn procedure(&self, emergency: EmergencyType) -> Option<&Procedure> { self.procedures.get(&emergency) }

    /// Registers the observer of mode changes, detections, clearances and escalations.
    /// Events are dispatched after the internal lock is released.
    pub fn set_event_callback<F>(&self, callback: F)
    where F: Fn(&FailsafeEvent) + Send + Sync + 'static {
        write_lock(&self.state).on_event = Some(Arc::new(callback));
    }

    /// Overwrites the status of one subsystem. A healthy `comm` report counts as operator contact.
    pub fn update_health(&self, subsystem: &str, status: HealthStatus) {
        let mut state = write_lock(&self.state);
        if subsystem == COMM_SUBSYSTEM && status == HealthStatus::Ok {
            state.last_comm = Utc::now();
        }
        state.health.insert(subsystem.to_string(), status);
    }

    /// Folds a propulsion health snapshot into the `propulsion` subsystem entry.
    pub fn ingest_propulsion_health(&self, health: &PropulsionHealth) {
        for fault in &health.active_faults {
            log!("Propulsion fault {} on {}: {}", fault.id, fault.component, fault.description);
        }
        self.update_health(PROPULSION_SUBSYSTEM, health.overall_health);
    }

    /// Records a fuel reading. Non-finite readings are dropped and the previous one kept.
    pub fn update_fuel(&self, level: f64) {
        if level.is_finite() {
            write_lock(&self.state).fuel_level = level;
        } else {
            warn!("Ignoring non-finite fuel reading {level}");
        }
    }

    /// Records a battery reading. Non-finite readings are dropped and the previous one kept.
    pub fn update_battery(&self, level: f64) {
        if level.is_finite() {
            write_lock(&self.state).battery_level = level;
        } else {
            warn!("Ignoring non-finite battery reading {level}");
        }
    }

    pub fn update_position(&self, position: Vec3D<f64>) { write_lock(&self.state).position = Some(position); }

    pub fn record_comm_contact(&self) { self.record_comm_contact_at(Utc::now()); }

    pub fn record_comm_contact_at(&self, at: DateTime<Utc>) { write_lock(&self.state).last_comm = at; }

    /// Closest configured landing zone to the last reported position.
    pub fn nearest_landing_zone(&self) -> Option<LandingZone> {
        let position = read_lock(&self.state).position?;
        self.policy.nearest_zone(position).cloned()
    }

    /// Runs one evaluation cycle at the current time.
    pub fn monitor(&self) -> FlightMode { self.monitor_at(Utc::now()) }

    /// Runs one evaluation cycle as if it happened at `now`.
    pub fn monitor_at(&self, now: DateTime<Utc>) -> FlightMode {
        let (mode, events, callback) = {
            let mut state = write_lock(&self.state);
            let mut events = Vec::new();
            let conditions = self.monitored_conditions(&state, now);

            state.active.retain(|record| {
                let keep = record.source() == EmergencySource::Declared
                    || conditions.contains(&record.emergency_type());
                if !keep {
                    events.push(FailsafeEvent::EmergencyCleared(record.emergency_type()));
                }
                keep
            });
            for emergency in conditions {
                if !state.active.iter().any(|r| r.emergency_type() == emergency) {
                    let record = ActiveEmergency::new(emergency, now, EmergencySource::Monitor);
                    events.push(FailsafeEvent::EmergencyDetected(record.clone()));
                    state.active.push(record);
                }
            }

            let old = state.mode;
            if old != FlightMode::Manual {
                state.mode = Self::derive_mode(&state);
            }
            if state.mode != old {
                events.push(FailsafeEvent::ModeChanged { old, new: state.mode });
            }

            let escalation = self.escalate(&mut state);
            if escalation != state.escalation {
                if let Some(escalation) = &escalation {
                    events.push(FailsafeEvent::Escalated(escalation.clone()));
                }
                state.escalation = escalation;
            }
            (state.mode, events, state.on_event.clone())
        };
        Self::dispatch(&events, callback.as_ref());
        mode
    }

    /// True iff, after a fresh evaluation, the mode is Primary and nothing is active.
    pub fn is_healthy(&self) -> bool {
        let mode = self.monitor();
        mode == FlightMode::Primary && read_lock(&self.state).active.is_empty()
    }

    /// Registers an externally detected emergency (threat inbound, severe weather, ...)
    /// and re-evaluates immediately. Declared records persist until cleared.
    pub fn declare_emergency(&self, emergency: EmergencyType) {
        let detected = {
            let mut state = write_lock(&self.state);
            if state.active.iter().any(|r| r.emergency_type() == emergency) {
                None
            } else {
                let record = ActiveEmergency::new(emergency, Utc::now(), EmergencySource::Declared);
                state.active.push(record.clone());
                Some((record, state.on_event.clone()))
            }
        };
        if let Some((record, callback)) = detected {
            Self::dispatch(&[FailsafeEvent::EmergencyDetected(record)], callback.as_ref());
        }
        self.monitor();
    }

    /// Removes an active emergency. A still-present monitored condition is detected again
    /// on the next cycle.
    pub fn clear_emergency(&self, emergency: EmergencyType) -> bool {
        let cleared = {
            let mut state = write_lock(&self.state);
            let before = state.active.len();
            state.active.retain(|r| r.emergency_type() != emergency);
            if emergency == EmergencyType::EngineFailure {
                state.forced_escalation = None;
            }
            (state.active.len() != before).then(|| state.on_event.clone())
        };
        let Some(callback) = cleared else { return false };
        Self::dispatch(&[FailsafeEvent::EmergencyCleared(emergency)], callback.as_ref());
        self.monitor();
        true
    }

    /// Escalates a propulsion emergency shutdown that could not be confirmed:
    /// declares engine failure and forces the most drastic escalation available.
    pub fn report_shutdown_failure(&self) {
        error!("Propulsion emergency shutdown failed, forcing last-resort escalation");
        write_lock(&self.state).forced_escalation = Some(self.policy.last_resort());
        self.declare_emergency(EmergencyType::EngineFailure);
    }

    /// Operator takes over. Sticky until [`EmergencySystem::clear_manual_override`].
    pub fn set_manual_override(&self) { self.force_mode(Some(FlightMode::Manual)); }

    /// Hands control back to the automatic evaluation.
    pub fn clear_manual_override(&self) {
        self.force_mode(None);
        self.monitor();
    }

    /// Runs the procedure for `emergency` step by step against `controller`.
    ///
    /// # Arguments
    /// * `emergency` - The emergency whose procedure to run.
    /// * `controller` - Actuator link, steps needing one fail without it.
    ///
    /// # Returns
    /// An error as soon as a critical step fails or the procedure times out;
    /// failing non-critical steps are logged and skipped.
    pub async fn execute_procedure(
        &self,
        emergency: EmergencyType,
        controller: Option<&dyn FlightController>,
    ) -> Result<(), ProcedureError> {
        let procedure = self.procedures.get(&emergency).ok_or(ProcedureError::NoProcedure(emergency))?;
        info!("Executing emergency procedure: {}", procedure.name());
        let run = async {
            for (i, step) in procedure.steps().iter().enumerate() {
                log!("Procedure {} step {}: {}", procedure.name(), i + 1, step.description());
                let outcome = if step.timeout().is_zero() {
                    self.run_step(step.action(), controller).await
                } else {
                    tokio::time::timeout(step.timeout(), self.run_step(step.action(), controller))
                        .await
                        .unwrap_or_else(|_| Err(ProcedureError::Actuator(format!("timed out after {:?}", step.timeout()))))
                };
                match outcome {
                    Ok(()) => {}
                    Err(e) if step.is_critical() => {
                        error!("Critical step '{}' failed: {e}", step.description());
                        return Err(ProcedureError::CriticalStepFailed {
                            procedure: procedure.name().to_string(),
                            step: i + 1,
                            description: step.description().to_string(),
                            reason: e.to_string(),
                        });
                    }
                    Err(e) => warn!("Non-critical step '{}' failed, continuing: {e}", step.description()),
                }
            }
            Ok(())
        };
        let result = if procedure.timeout().is_zero() {
            run.await
        } else {
            tokio::time::timeout(procedure.timeout(), run).await.unwrap_or_else(|_| {
                Err(ProcedureError::CriticalStepFailed {
                    procedure: procedure.name().to_string(),
                    step: 0,
                    description: "procedure".to_string(),
                    reason: format!("timed out after {:?}", procedure.timeout()),
                })
            })
        };
        if result.is_ok() {
            info!("Emergency procedure completed: {}", procedure.name());
        }
        result
    }

    async fn run_step(&self, action: StepAction, controller: Option<&dyn FlightController>) -> Result<(), ProcedureError> {
        let actuator = || controller.ok_or(ProcedureError::ActuatorUnavailable);
        match action {
            StepAction::SwitchToBackupEngine => {
                actuator()?.arm().await?;
                info!("Backup engine armed");
            }
            StepAction::EstablishBestGlide => {
                let glide = AttitudeCommand { pitch: GLIDE_PITCH, ..AttitudeCommand::level(0.0) };
                actuator()?.send_attitude(glide).await?;
                info!("Best glide established");
            }
            StepAction::IdentifyLandingZone => match self.nearest_landing_zone() {
                Some(zone) => info!("Nearest landing zone: {} at {}", zone.id(), zone.position()),
                None => warn!("No landing zone available, landing in place"),
            },
            StepAction::ExecuteEmergencyLanding => {
                let controller = actuator()?;
                let landing = AttitudeCommand { pitch: LANDING_PITCH, ..AttitudeCommand::level(LANDING_THROTTLE) };
                controller.send_attitude(landing).await?;
                if let Err(e) = controller.set_autopilot_mode(AutopilotMode::Land).await {
                    warn!("Failed to set {} mode: {e}", AutopilotMode::Land);
                }
                safety!("Emergency landing sequence initiated");
            }
            StepAction::AttemptBackupRadio => {
                write_lock(&self.state).health.insert(COMM_SUBSYSTEM.to_string(), HealthStatus::Degraded);
                actuator()?.set_autopilot_mode(AutopilotMode::Loiter).await?;
                info!("Backup radio active, attempting reconnection");
            }
            StepAction::ContinueAutonomous => {
                actuator()?.set_autopilot_mode(AutopilotMode::Auto).await?;
                info!("Continuing mission autonomously");
            }
            StepAction::ReturnToBase => {
                let controller = actuator()?;
                controller.set_autopilot_mode(AutopilotMode::Auto).await?;
                let home = self.config.rtb_location;
                if let Err(e) = controller.send_position(home).await {
                    warn!("Failed to set RTB position, holding heading: {e}");
                }
                safety!("Return to base initiated towards {home}");
            }
            StepAction::SwitchToBackupSensors => {
                let mut state = write_lock(&self.state);
                for sensor in BACKUP_SENSORS {
                    if let Some(status) = state.health.get_mut(sensor).filter(|s| **s == HealthStatus::Failed) {
                        *status = HealthStatus::Degraded;
                        info!("Switched to backup {sensor}");
                    }
                }
            }
            StepAction::RecalibrateNavigation => info!("Navigation recalibration requested"),
            StepAction::AssessFlightCapability => self.assess_flight_capability(),
            StepAction::ReduceThrottle => {
                actuator()?.send_attitude(AttitudeCommand::level(ECONOMY_THROTTLE)).await?;
                info!("Throttle reduced to economy {ECONOMY_THROTTLE}");
            }
            StepAction::FindNearestLanding => match self.nearest_landing_zone() {
                Some(zone) => {
                    actuator()?.send_position(zone.position()).await?;
                    safety!("Diverting to landing zone {}", zone.id());
                }
                None => warn!("No landing zone configured"),
            },
            StepAction::DisableNonEssential => info!("Non-essential systems disabled"),
        }
        Ok(())
    }

    fn assess_flight_capability(&self) {
        let state = read_lock(&self.state);
        let mut reasons = Vec::new();
        if state.battery_level < self.config.min_safe_battery {
            reasons.push(format!("battery critical: {:.1}%", state.battery_level * 100.0));
        }
        if state.fuel_level < self.config.min_safe_fuel {
            reasons.push(format!("fuel critical: {:.1}%", state.fuel_level * 100.0));
        }
        let failed = |name: &str| state.health.get(name) == Some(&HealthStatus::Failed);
        if failed("primary_flight") && failed("backup_flight") {
            reasons.push("all flight controllers failed".to_string());
        }
        if reasons.is_empty() {
            info!("Flight capability assessment: safe to continue");
        } else {
            warn!("Flight capability assessment: landing required ({})", reasons.join(", "));
        }
    }

    fn monitored_conditions(&self, state: &FailsafeState, now: DateTime<Utc>) -> Vec<EmergencyType> {
        let controller_remaining = FLIGHT_CONTROLLERS
            .iter()
            .any(|c| state.health.get(*c).is_some_and(|status| *status != HealthStatus::Failed));
        let failed = state
            .health
            .iter()
            .filter(|(_, status)| **status == HealthStatus::Failed)
            .map(|(name, _)| EmergencyType::for_failed_subsystem(name, controller_remaining));
        let silent = (now - state.last_comm).to_std().unwrap_or_default();
        let comm_lost = (silent > self.config.max_time_without_comms()).then_some(EmergencyType::CommunicationLoss);
        let fuel = (state.fuel_level < self.config.min_safe_fuel).then_some(EmergencyType::FuelCritical);
        let battery = (state.battery_level < self.config.min_safe_battery).then_some(EmergencyType::LowBattery);
        failed.chain(comm_lost).chain(fuel).chain(battery).unique().collect()
    }

    fn derive_mode(state: &FailsafeState) -> FlightMode {
        if !state.active.is_empty() {
            FlightMode::Emergency
        } else if state.health.values().any(|s| matches!(s, HealthStatus::Degraded | HealthStatus::Critical)) {
            FlightMode::Backup
        } else {
            FlightMode::Primary
        }
    }

    /// Most drastic escalation over all active emergencies. Marks records once acted upon.
    fn escalate(&self, state: &mut FailsafeState) -> Option<Escalation> {
        let input = PolicyInput { fuel_level: state.fuel_level, position: state.position };
        let escalation = state
            .active
            .iter()
            .map(|record| self.policy.escalation_for(record.emergency_type(), input))
            .chain(state.forced_escalation.clone())
            .max_by_key(Escalation::severity);
        if escalation.as_ref().is_some_and(|e| e.severity() > 0) {
            state.active.iter_mut().for_each(ActiveEmergency::escalate);
        }
        escalation
    }

    fn force_mode(&self, mode: Option<FlightMode>) {
        let changed = {
            let mut state = write_lock(&self.state);
            let old = state.mode;
            let new = match mode {
                Some(mode) => mode,
                None if old == FlightMode::Manual => Self::derive_mode(&state),
                None => old,
            };
            state.mode = new;
            (old != new).then(|| (FailsafeEvent::ModeChanged { old, new }, state.on_event.clone()))
        };
        if let Some((event, callback)) = changed {
            Self::dispatch(&[event], callback.as_ref());
        }
    }

    fn dispatch(events: &[FailsafeEvent], callback: Option<&FailsafeCallback>) {
        for event in events {
            match event {
                FailsafeEvent::ModeChanged { old, new } => safety!("Flight mode changed: {old} -> {new}"),
                FailsafeEvent::EmergencyDetected(record) => {
                    safety!("Emergency detected: {}", record.emergency_type());
                }
                FailsafeEvent::EmergencyCleared(emergency) => info!("Emergency cleared: {emergency}"),
                FailsafeEvent::Escalated(escalation) => safety!("Escalation: {escalation}"),
            }
            if let Some(callback) = callback {
                callback(event);
            }
        }
    }
}
