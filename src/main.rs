#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod config;
mod energy;
mod failsafe;
mod flight_control;
mod keychain;
mod logger;
mod propulsion;
mod supervisor;
mod util;

use crate::config::CoreConfig;
use crate::flight_control::{FlightCommand, Mission, MissionType, NavState, Threat, ThreatType, Waypoint};
use crate::keychain::Keychain;
use crate::propulsion::{PropulsionError, PropulsionSystem, electric::ElectricPropulsion};
use crate::supervisor::{SafetyEvent, Supervisor};
use crate::util::Vec3D;
use rand::Rng;
use std::{sync::Arc, time::Duration};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

/// Simulation step of the airframe and the propulsion model.
const SIM_STEP: Duration = Duration::from_millis(100);
const GRAVITY: f64 = 9.81;
const MIN_AIRSPEED: f64 = 18.0;
const THROTTLE_AIRSPEED: f64 = 27.0;
const PARACHUTE_SINK_RATE: f64 = 5.0;
/// Standard deviation stand-in for the simulated position fix (m).
const FIX_NOISE: f64 = 1.5;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let config = CoreConfig::load().unwrap_or_else(|e| fatal!("Configuration unusable: {e}"));
    if let Err(e) = config.validate() {
        fatal!("Invalid configuration: {e}");
    }

    let propulsion = Arc::new(ElectricPropulsion::new(config.electric.clone()));
    if let Err(e) = bring_up(propulsion.as_ref()).await {
        fatal!("Propulsion failed to start: {e}");
    }
    let keychain = Keychain::new(&config, Arc::clone(&propulsion) as Arc<dyn PropulsionSystem>);
    if let Err(e) = keychain.decision().initialize() {
        fatal!("Decision engine rejected its configuration: {e}");
    }
    keychain.decision().set_mission(patrol_mission());
    keychain.decision().start_mission();

    let supervisor = Arc::new(Supervisor::new(config.supervisor.clone(), keychain.clone()));
    let (cmd_tx, cmd_rx) = watch::channel(FlightCommand::safe_default(config.decision.safe_default_throttle));
    let cancel = supervisor.cancel_token();

    tokio::spawn(operator_console(supervisor.subscribe(), cancel.clone()));
    tokio::spawn(simulate(keychain.clone(), Arc::clone(&propulsion), cmd_rx, cancel.clone()));
    let supervisor_clone = Arc::clone(&supervisor);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received"),
            Err(e) => error!("Cannot listen for interrupt: {e}"),
        }
        supervisor_clone.shutdown();
    });

    supervisor.run(cmd_tx).await;
    if let Err(e) = propulsion.stop() {
        warn!("Propulsion stop after shutdown: {e}");
    }
    info!("Mission status at exit: {}", keychain.decision().mission_status());
}

async fn bring_up(propulsion: &dyn PropulsionSystem) -> Result<(), PropulsionError> {
    propulsion.initialize().await?;
    propulsion.start().await?;
    info!("{} propulsion running", propulsion.propulsion_type());
    Ok(())
}

fn patrol_mission() -> Mission {
    let legs = [
        ("alpha", Vec3D::new(0.0, 4000.0, 600.0)),
        ("bravo", Vec3D::new(4000.0, 4000.0, 800.0)),
        ("charlie", Vec3D::new(4000.0, 0.0, 800.0)),
        ("delta", Vec3D::new(0.0, 0.0, 500.0)),
    ];
    let waypoints = legs
        .iter()
        .map(|(id, position)| Waypoint::new(id, *position).with_speed(30.0))
        .collect();
    Mission::new("patrol-1", MissionType::Patrol, waypoints)
}

/// Prints every safety event until cancellation.
async fn operator_console(mut events: broadcast::Receiver<SafetyEvent>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = events.recv() => match received {
                Ok(SafetyEvent::Failsafe(event)) => log!("Operator: {event:?}"),
                Ok(event) => log!("Operator: {event:?}"),
                Err(broadcast::error::RecvError::Lagged(missed)) => warn!("Operator console missed {missed} events"),
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Flies a point-mass airframe on the published commands and feeds the navigation solution back.
async fn simulate(
    keychain: Keychain,
    propulsion: Arc<ElectricPropulsion>,
    commands: watch::Receiver<FlightCommand>,
    cancel: CancellationToken,
) {
    let dt = SIM_STEP.as_secs_f64();
    let decision = keychain.decision();
    let failsafe = keychain.failsafe();
    let mut truth = decision.nav_state();
    let mut ticker = tokio::time::interval(SIM_STEP);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let command = commands.borrow().clone();
                if let Err(e) = propulsion.set_thrust_command(command.throttle) {
                    event!("Thrust command rejected: {e}");
                }
                propulsion.step(SIM_STEP, truth.airspeed);
                truth = advance(&truth, &command, dt);

                let mut rng = rand::rng();
                let noise = Vec3D::new(
                    rng.random_range(-FIX_NOISE..FIX_NOISE),
                    rng.random_range(-FIX_NOISE..FIX_NOISE),
                    rng.random_range(-FIX_NOISE..FIX_NOISE),
                );
                let fix = NavState { position: truth.position + noise, ..truth.clone() };
                if rng.random_bool(0.002) {
                    let offset = Vec3D::new(rng.random_range(-3000.0..3000.0), rng.random_range(-3000.0..3000.0), 0.0);
                    let threat = Threat::observed_from("wx-cell", ThreatType::Weather, fix.position, fix.position + offset, 0.6);
                    log!("Weather cell reported at {:.0} m", threat.distance);
                    decision.update_threats(vec![threat]);
                }
                decision.update_nav_state(fix);
                failsafe.record_comm_contact();
            }
        }
    }
}

/// One explicit Euler step of a coordinated-turn point mass.
fn advance(state: &NavState, command: &FlightCommand, dt: f64) -> NavState {
    let position = state.position;
    if command.deploy_parachute {
        let z = (position.z() - PARACHUTE_SINK_RATE * dt).max(0.0);
        return NavState::new(Vec3D::new(position.x(), position.y(), z), Vec3D::new(0.0, 0.0, -PARACHUTE_SINK_RATE), state.heading);
    }
    let speed = MIN_AIRSPEED + THROTTLE_AIRSPEED * command.throttle;
    let heading = util::wrap_angle(state.heading + GRAVITY * command.roll_angle.tan() / speed * dt);
    let velocity = Vec3D::new(
        speed * heading.sin() * command.pitch_angle.cos(),
        speed * heading.cos() * command.pitch_angle.cos(),
        speed * command.pitch_angle.sin(),
    );
    let next = position + velocity * dt;
    let grounded = Vec3D::new(next.x(), next.y(), next.z().max(0.0));
    NavState::new(grounded, velocity, heading)
}
