use super::{
    DecisionConfig, DecisionError, FlightCommand, Mission, MissionStatus, NavState, Threat,
    ThreatType, Waypoint,
};
use crate::energy::{ReserveLevel, ReserveManager};
use crate::failsafe::{
    ECONOMY_THROTTLE, EmergencySystem, Escalation, FlightMode, LANDING_PITCH, LANDING_THROTTLE,
};
use crate::util::{Vec3D, clamp_abs, clamp_unit, read_lock, wrap_angle, write_lock};
use crate::{error, event, info, log};
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Roll commanded per radian of heading error.
const HEADING_GAIN: f64 = 1.0;
/// Yaw rate commanded per radian of heading error.
const YAW_GAIN: f64 = 0.5;
/// Vertical speed commanded per metre of altitude error.
const ALTITUDE_GAIN: f64 = 0.1;
/// Throttle added per m/s of airspeed deficit.
const SPEED_GAIN: f64 = 0.05;
/// Share of the pitch limit used for the low-altitude pull-up.
const PULL_UP_PITCH_SHARE: f64 = 0.8;
/// Share of the pitch limit used to dive under or climb over a missile.
const MISSILE_PITCH_SHARE: f64 = 0.5;
/// Horizon over which the altitude floor is checked (s).
const ALTITUDE_LOOKAHEAD: f64 = 1.0;

/// What the safety overlay asks of the current tick, ordered by severity.
#[derive(Debug, Clone, PartialEq)]
enum Directive {
    Nominal,
    ReturnToBase(Vec3D<f64>),
    Land(Option<Vec3D<f64>>),
    ImmediateLanding,
    Parachute,
}

impl Directive {
    fn rank(&self) -> u8 {
        match self {
            Self::Nominal => 0,
            Self::ReturnToBase(_) => 1,
            Self::Land(_) => 2,
            Self::ImmediateLanding => 3,
            Self::Parachute => 4,
        }
    }
}

struct MissionProgress {
    mission: Mission,
    status: MissionStatus,
    waypoint_index: usize,
    loiter_since: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
}

impl MissionProgress {
    fn current_waypoint(&self) -> Option<&Waypoint> { self.mission.waypoints().get(self.waypoint_index) }
}

struct EngineState {
    initialized: bool,
    mission: Option<MissionProgress>,
    threats: Arc<[Threat]>,
    nav: NavState,
}

/// Turns mission, threat and navigation state into one bounded [`FlightCommand`] per control tick.
///
/// The engine reads the reserve tier and the failsafe mode through their accessors before
/// taking its own lock, so it never holds two component locks at once.
pub struct DecisionEngine {
    config: DecisionConfig,
    state: RwLock<EngineState>,
    reserve: Option<Arc<ReserveManager>>,
    failsafe: Option<Arc<EmergencySystem>>,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self {
            config,
            state: RwLock::new(EngineState {
                initialized: false,
                mission: None,
                threats: Arc::from(Vec::new()),
                nav: NavState::default(),
            }),
            reserve: None,
            failsafe: None,
        }
    }

    pub fn with_reserve_manager(mut self, reserve: Arc<ReserveManager>) -> Self {
        self.reserve = Some(reserve);
        self
    }

    pub fn with_emergency_system(mut self, failsafe: Arc<EmergencySystem>) -> Self {
        self.failsafe = Some(failsafe);
        self
    }

    pub fn config(&self) -> &DecisionConfig { &self.config }

    /// Validates the configuration and arms the engine.
    pub fn initialize(&self) -> Result<(), DecisionError> {
        self.config.validate()?;
        write_lock(&self.state).initialized = true;
        info!("Decision engine initialized at {} Hz", self.config.decision_rate);
        Ok(())
    }

    /// Replaces any mission in progress, keeping the status it was handed over with.
    pub fn set_mission(&self, mission: Mission) {
        let status = mission.status();
        info!("Mission {} ({}) set with {} waypoints, status {status}", mission.id(), mission.mission_type(), mission.waypoints().len());
        let started_at = (status == MissionStatus::Active).then(Utc::now);
        write_lock(&self.state).mission =
            Some(MissionProgress { mission, status, waypoint_index: 0, loiter_since: None, started_at });
    }

    /// Pending -> Active. Returns whether the mission was started.
    pub fn start_mission(&self) -> bool {
        let mut state = write_lock(&self.state);
        match state.mission.as_mut() {
            Some(progress) if progress.status == MissionStatus::Pending => {
                progress.status = MissionStatus::Active;
                progress.started_at = Some(Utc::now());
                info!("Mission {} started", progress.mission.id());
                true
            }
            _ => false,
        }
    }

    /// Aborts a pending or active mission. Returns whether anything was aborted.
    pub fn abort_mission(&self) -> bool {
        let mut state = write_lock(&self.state);
        match state.mission.as_mut() {
            Some(progress) if !progress.status.is_terminal() => {
                progress.status = MissionStatus::Aborted;
                log!("Mission {} aborted", progress.mission.id());
                true
            }
            _ => false,
        }
    }

    /// Status of the held mission, `Pending` if none is set.
    pub fn mission_status(&self) -> MissionStatus {
        read_lock(&self.state).mission.as_ref().map_or(MissionStatus::Pending, |p| p.status)
    }

    pub fn current_waypoint(&self) -> Option<Waypoint> {
        read_lock(&self.state).mission.as_ref().and_then(MissionProgress::current_waypoint).cloned()
    }

    pub fn mission_started_at(&self) -> Option<DateTime<Utc>> {
        read_lock(&self.state).mission.as_ref().and_then(|p| p.started_at)
    }

    /// Replaces the working threat set.
    pub fn update_threats(&self, threats: Vec<Threat>) {
        write_lock(&self.state).threats = Arc::from(threats);
    }

    pub fn threats(&self) -> Arc<[Threat]> { Arc::clone(&read_lock(&self.state).threats) }

    pub fn update_nav_state(&self, nav: NavState) { write_lock(&self.state).nav = nav; }

    pub fn nav_state(&self) -> NavState { read_lock(&self.state).nav.clone() }

    /// Computes the command for this tick.
    ///
    /// # Returns
    /// The safe default without an active mission, otherwise a waypoint-tracking command
    /// with threat avoidance, the safety overlay and the altitude floor applied, clamped to
    /// the configured envelope. Without a mission the overlay is not applied at all; landing
    /// and parachute escalations then reach the airframe through the failsafe procedures only.
    /// Fails only if the engine was never initialized.
    pub fn decide(&self) -> Result<FlightCommand, DecisionError> {
        let (directive, manual) = self.safety_overlay();
        let mut state = write_lock(&self.state);
        if !state.initialized {
            return Err(DecisionError::Uninitialized);
        }
        let safe_default = FlightCommand::safe_default(self.config.safe_default_throttle);
        if manual {
            return Ok(safe_default);
        }
        let nav = state.nav.clone();
        let Some(waypoint) = self.advance_mission(&mut state, &nav) else {
            return Ok(safe_default);
        };

        let target = match &directive {
            Directive::ReturnToBase(home) => *home,
            Directive::Land(Some(zone)) => *zone,
            _ => waypoint.position,
        };
        let mut command = self.track(&nav, target, waypoint.speed);
        if self.config.enable_threat_avoid {
            self.avoid_threats(&mut command, &nav, &state.threats);
        }
        self.apply_directive(&mut command, &directive);
        if !command.auto_land && !command.deploy_parachute {
            self.enforce_altitude_floor(&mut command, &nav);
        }
        self.clamp(&mut command);
        event!(
            "Tick: roll {:.3} pitch {:.3} yaw {:.3} throttle {:.2}",
            command.roll_angle, command.pitch_angle, command.yaw_rate, command.throttle
        );
        Ok(command)
    }

    /// Runs the control loop at `decision_rate`, publishing every command on `sender`.
    /// Stops once `cancel` fires; a tick in progress always completes first.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken, sender: watch::Sender<FlightCommand>) {
        let mut ticker = tokio::time::interval(self.config.tick_period());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => match self.decide() {
                    Ok(command) => {
                        sender.send_replace(command);
                    }
                    Err(e) => error!("Control tick failed: {e}"),
                }
            }
        }
        info!("Decision loop stopped");
    }

    /// Reads the reserve tier and failsafe state. Returns the directive and whether the operator has control.
    fn safety_overlay(&self) -> (Directive, bool) {
        let reserve = self.reserve.as_ref().map_or(Directive::Nominal, |r| match r.current_level() {
            ReserveLevel::Mission => Directive::Nominal,
            ReserveLevel::Contingency => Directive::ReturnToBase(self.config.home_position),
            ReserveLevel::Emergency => {
                Directive::Land(self.failsafe.as_ref().and_then(|f| f.nearest_landing_zone()).map(|z| z.position()))
            }
            ReserveLevel::Absolute => Directive::ImmediateLanding,
        });
        let Some(failsafe) = &self.failsafe else { return (reserve, false) };
        let escalated = match failsafe.current_escalation() {
            None | Some(Escalation::NotifyOperator) => Directive::Nominal,
            Some(Escalation::ReturnToBase(target)) => Directive::ReturnToBase(target),
            Some(Escalation::NearestLanding(zone)) => Directive::Land(Some(zone.position())),
            Some(Escalation::ImmediateLanding) => Directive::ImmediateLanding,
            Some(Escalation::Parachute) => Directive::Parachute,
        };
        let directive = if escalated.rank() > reserve.rank() { escalated } else { reserve };
        (directive, failsafe.mode() == FlightMode::Manual)
    }

    /// Moves past reached waypoints and completes the mission after the last one.
    /// Returns the waypoint to fly to, `None` without an active mission.
    fn advance_mission(&self, state: &mut EngineState, nav: &NavState) -> Option<Waypoint> {
        let progress = state.mission.as_mut().filter(|p| p.status == MissionStatus::Active)?;
        let waypoint = progress.current_waypoint()?.clone();
        let reached = nav.confidence > 0.0
            && nav.position.euclid_distance(&waypoint.position) < self.config.waypoint_acceptance_radius;
        if !reached {
            progress.loiter_since = None;
            return Some(waypoint);
        }
        let now = Utc::now();
        let since = *progress.loiter_since.get_or_insert(now);
        let loitered = (now - since).to_std().unwrap_or_default();
        if loitered < waypoint.loiter {
            return Some(waypoint);
        }
        progress.loiter_since = None;
        progress.waypoint_index += 1;
        if let Some(next) = progress.current_waypoint() {
            log!("Waypoint {} reached, heading for {}", waypoint.id, next.id);
            Some(next.clone())
        } else {
            progress.status = MissionStatus::Completed;
            info!("Mission {} completed", progress.mission.id());
            None
        }
    }

    /// Nominal command steering towards `target`.
    fn track(&self, nav: &NavState, target: Vec3D<f64>, speed: f64) -> FlightCommand {
        let heading_error = wrap_angle(nav.position.bearing_to(&target) - nav.heading);
        let climb = clamp_abs(ALTITUDE_GAIN * (target.z() - nav.position.z()), self.config.max_vertical_speed);
        let throttle = if speed > 0.0 {
            self.config.cruise_throttle + SPEED_GAIN * (speed - nav.airspeed)
        } else {
            self.config.cruise_throttle
        };
        FlightCommand {
            roll_angle: HEADING_GAIN * heading_error,
            pitch_angle: climb / self.config.max_vertical_speed * self.config.max_pitch_angle,
            yaw_rate: YAW_GAIN * heading_error,
            throttle,
            auto_throttle: false,
            ..FlightCommand::safe_default(self.config.cruise_throttle)
        }
    }

    /// Banks away from every threat inside the avoidance radius, weighted by severity and proximity.
    fn avoid_threats(&self, command: &mut FlightCommand, nav: &NavState, threats: &[Threat]) {
        let radius = self.config.avoidance_radius;
        for threat in threats.iter().filter(|t| t.distance.is_finite() && t.distance <= radius) {
            let severity = clamp_unit(threat.severity);
            let weight = severity * (1.0 - threat.distance / radius);
            let relative = wrap_angle(threat.bearing - nav.heading);
            // dead ahead breaks right
            let away = if relative > 0.0 { -1.0 } else { 1.0 };
            command.roll_angle += away * weight * self.config.max_roll_angle;
            command.throttle += weight * (1.0 - command.throttle);
            if threat.threat_type == ThreatType::Missile {
                let dive = if threat.position.z() > nav.position.z() { -1.0 } else { 1.0 };
                command.pitch_angle += dive * MISSILE_PITCH_SHARE * severity * self.config.max_pitch_angle;
                command.throttle += severity * (1.0 - command.throttle);
            }
            event!("Avoiding threat {} ({}) at {:.0} m, weight {weight:.2}", threat.id, threat.threat_type, threat.distance);
        }
    }

    fn apply_directive(&self, command: &mut FlightCommand, directive: &Directive) {
        match directive {
            Directive::Nominal => {}
            Directive::ReturnToBase(_) => command.emergency_rtb = true,
            Directive::Land(_) => {
                command.throttle = command.throttle.min(ECONOMY_THROTTLE);
                command.auto_land = self.config.enable_autoland;
            }
            Directive::ImmediateLanding => {
                command.roll_angle = 0.0;
                command.yaw_rate = 0.0;
                command.pitch_angle = LANDING_PITCH;
                command.throttle = LANDING_THROTTLE;
                command.auto_land = true;
            }
            Directive::Parachute => {
                command.roll_angle = 0.0;
                command.pitch_angle = 0.0;
                command.yaw_rate = 0.0;
                command.throttle = 0.0;
                command.deploy_parachute = true;
            }
        }
    }

    /// Forces a climb when the aircraft is about to sink below the minimum safe altitude.
    fn enforce_altitude_floor(&self, command: &mut FlightCommand, nav: &NavState) {
        let predicted = nav.position.z() + nav.velocity.z() * ALTITUDE_LOOKAHEAD;
        if nav.position.z() < self.config.min_safe_altitude || predicted < self.config.min_safe_altitude {
            command.pitch_angle = PULL_UP_PITCH_SHARE * self.config.max_pitch_angle;
            command.throttle = 1.0;
        }
    }

    /// Final, unconditional envelope clamp.
    fn clamp(&self, command: &mut FlightCommand) {
        command.roll_angle = clamp_abs(command.roll_angle, self.config.max_roll_angle);
        command.pitch_angle = clamp_abs(command.pitch_angle, self.config.max_pitch_angle);
        command.yaw_rate = clamp_abs(command.yaw_rate, self.config.max_yaw_rate);
        command.throttle = clamp_unit(command.throttle);
        command.timestamp = Utc::now();
    }
}
