use super::SafetyEvent;
use crate::config::SupervisorConfig;
use crate::energy::ReserveAction;
use crate::failsafe::{EmergencyType, FailsafeEvent, FlightController};
use crate::flight_control::FlightCommand;
use crate::keychain::Keychain;
use crate::propulsion::{PropulsionError, PropulsionType};
use crate::{error, event, info, log, safety, warn};
use itertools::Itertools;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Owns the periodic safety schedules and fans component callbacks out to operators.
///
/// Every schedule finishes the evaluation in progress before it honours cancellation.
pub struct Supervisor {
    config: SupervisorConfig,
    keychain: Keychain,
    events: broadcast::Sender<SafetyEvent>,
    procedure_queue: Mutex<Option<mpsc::UnboundedReceiver<EmergencyType>>>,
    controller: Option<Arc<dyn FlightController>>,
    cancel: CancellationToken,
}

impl Supervisor {
    /// Creates a supervisor and registers its callbacks on the reserve manager and the emergency system.
    ///
    /// # Arguments
    /// - `config`: Schedule and fan-out settings.
    /// - `keychain`: The wired safety components.
    pub fn new(config: SupervisorConfig, keychain: Keychain) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();

        let reserve = Arc::downgrade(&keychain.reserve());
        let reserve_events = events.clone();
        keychain.reserve().set_level_change_callback(move |old, new| {
            let actions = reserve.upgrade().map(|r| r.reserve_actions()).unwrap_or_default();
            if actions.iter().any(|a| a.is_mandatory()) {
                safety!("Reserve {old} -> {new}, mandatory actions: {}", describe_actions(&actions));
            } else {
                log!("Reserve {old} -> {new}");
            }
            // no subscriber is not an error
            let _ = reserve_events.send(SafetyEvent::ReserveLevelChanged { old, new, actions });
        });

        let failsafe_events = events.clone();
        let auto_execute = config.auto_execute_procedures;
        keychain.failsafe().set_event_callback(move |failsafe_event| {
            if let FailsafeEvent::EmergencyDetected(emergency) = failsafe_event {
                if auto_execute && queue_tx.send(emergency.emergency_type()).is_err() {
                    warn!("Procedure runner gone, {} not executed", emergency.emergency_type());
                }
            }
            let _ = failsafe_events.send(SafetyEvent::Failsafe(failsafe_event.clone()));
        });

        Self {
            config,
            keychain,
            events,
            procedure_queue: Mutex::new(Some(queue_rx)),
            controller: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Attaches the actuator interface emergency procedures are executed against.
    pub fn with_flight_controller(mut self, controller: Arc<dyn FlightController>) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn keychain(&self) -> &Keychain { &self.keychain }

    pub fn subscribe(&self) -> broadcast::Receiver<SafetyEvent> { self.events.subscribe() }

    pub fn cancel_token(&self) -> CancellationToken { self.cancel.clone() }

    /// Stops all schedules after their current evaluation.
    pub fn shutdown(&self) {
        info!("Supervisor shutdown requested");
        self.cancel.cancel();
    }

    /// Runs the reserve check, the failsafe monitor, the control loop and the procedure runner
    /// until [`Supervisor::shutdown`] is called.
    pub async fn run(&self, commands: watch::Sender<FlightCommand>) {
        let queue = self.procedure_queue.lock().unwrap_or_else(PoisonError::into_inner).take();
        if queue.is_none() {
            warn!("Supervisor started twice, emergency procedures stay with the first run");
        }
        info!(
            "Supervisor running: reserve every {:?}, monitor every {:?}, control every {:?}",
            self.config.reserve_check_interval(),
            self.keychain.failsafe().config().check_interval(),
            self.keychain.decision().config().tick_period()
        );
        tokio::join!(
            self.reserve_loop(),
            self.monitor_loop(),
            self.keychain.decision().run(self.cancel.clone(), commands),
            self.procedure_loop(queue),
        );
        info!("Supervisor stopped");
    }

    /// Out-of-band propulsion cut. A failed shutdown escalates to the last-resort response.
    pub fn emergency_shutdown(&self) -> Result<(), PropulsionError> {
        safety!("Emergency propulsion shutdown commanded");
        match self.keychain.propulsion().emergency_shutdown() {
            Ok(()) => {
                info!("Propulsion shut down");
                Ok(())
            }
            Err(e) => {
                error!("Propulsion shutdown failed: {e}");
                self.keychain.failsafe().report_shutdown_failure();
                Err(e)
            }
        }
    }

    async fn reserve_loop(&self) {
        let reserve = self.keychain.reserve();
        let mut ticker = tokio::time::interval(self.config.reserve_check_interval());
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let level = reserve.check();
                    event!("Reserve check: {level}");
                }
            }
        }
    }

    async fn monitor_loop(&self) {
        let mut ticker = tokio::time::interval(self.keychain.failsafe().config().check_interval());
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => self.refresh_failsafe(),
            }
        }
    }

    /// Pushes the latest propulsion and navigation readings into the emergency system and evaluates it.
    fn refresh_failsafe(&self) {
        let propulsion = self.keychain.propulsion();
        let failsafe = self.keychain.failsafe();
        let energy = propulsion.energy_state();
        failsafe.update_battery(energy.battery_soc);
        if propulsion.propulsion_type() != PropulsionType::Electric {
            failsafe.update_fuel(energy.fuel_level);
        }
        failsafe.ingest_propulsion_health(&propulsion.health());
        failsafe.update_position(self.keychain.decision().nav_state().position);
        let mode = failsafe.monitor();
        event!("Failsafe monitor: mode {mode}");
    }

    async fn procedure_loop(&self, queue: Option<mpsc::UnboundedReceiver<EmergencyType>>) {
        let Some(mut queue) = queue else { return };
        let failsafe = self.keychain.failsafe();
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                next = queue.recv() => {
                    let Some(emergency) = next else { break };
                    if !failsafe.procedure(emergency).is_some_and(|p| p.auto_execute()) {
                        log!("No automatic procedure for {emergency}");
                        continue;
                    }
                    let outcome = failsafe.execute_procedure(emergency, self.controller.as_deref()).await;
                    match &outcome {
                        Ok(()) => info!("Procedure for {emergency} completed"),
                        Err(e) => error!("Procedure for {emergency} failed: {e}"),
                    }
                    let _ = self.events.send(SafetyEvent::ProcedureFinished { emergency, outcome });
                }
            }
        }
    }
}

fn describe_actions(actions: &[ReserveAction]) -> String {
    actions.iter().filter(|a| a.is_mandatory()).map(ReserveAction::action).join(", ")
}
