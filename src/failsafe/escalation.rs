use super::{EmergencyType, FailsafeConfig};
use crate::util::Vec3D;
use kiddo::{KdTree, SquaredEuclidean};
use std::fmt;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LandingZone {
    id: String,
    position: Vec3D<f64>,
}

impl LandingZone {
    pub fn new(id: &str, position: Vec3D<f64>) -> Self { Self { id: id.to_string(), position } }

    pub fn id(&self) -> &str { &self.id }
    pub fn position(&self) -> Vec3D<f64> { self.position }
}

/// Recovery action issued for the active emergencies.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Escalation {
    NotifyOperator,
    ReturnToBase(Vec3D<f64>),
    NearestLanding(LandingZone),
    ImmediateLanding,
    Parachute,
}

impl Escalation {
    /// Total order of escalations, higher is more drastic.
    pub fn severity(&self) -> u8 {
        match self {
            Self::NotifyOperator => 0,
            Self::ReturnToBase(_) => 1,
            Self::NearestLanding(_) => 2,
            Self::ImmediateLanding => 3,
            Self::Parachute => 4,
        }
    }

    pub fn is_landing(&self) -> bool {
        matches!(self, Self::NearestLanding(_) | Self::ImmediateLanding)
    }
}

impl fmt::Display for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotifyOperator => write!(f, "notify operator"),
            Self::ReturnToBase(target) => write!(f, "return to base at {target}"),
            Self::NearestLanding(zone) => write!(f, "divert to landing zone {} at {}", zone.id, zone.position),
            Self::ImmediateLanding => write!(f, "immediate landing"),
            Self::Parachute => write!(f, "parachute"),
        }
    }
}

/// Inputs the escalation policy looks at besides the emergency type.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput {
    pub fuel_level: f64,
    pub position: Option<Vec3D<f64>>,
}

/// Maps emergencies to escalations honouring the failsafe configuration flags.
///
/// Loss-of-flight conditions and fuel exhaustion favour a landing, everything else
/// favours returning to base. The parachute is only chosen when a loss-of-flight
/// condition finds autoland disabled.
pub struct EscalationPolicy {
    config: FailsafeConfig,
    zones: KdTree<f64, 3>,
}

impl EscalationPolicy {
    pub fn new(config: FailsafeConfig) -> Self {
        let mut zones: KdTree<f64, 3> = KdTree::new();
        for (i, zone) in config.landing_zones.iter().enumerate() {
            zones.add(&<[f64; 3]>::from(zone.position()), i as u64);
        }
        Self { config, zones }
    }

    pub fn escalation_for(&self, emergency: EmergencyType, input: PolicyInput) -> Escalation {
        let exhausted = emergency == EmergencyType::FuelCritical
            && input.fuel_level <= self.config.fuel_exhaustion_level;
        if emergency.is_loss_of_flight() || exhausted {
            if self.config.enable_auto_land {
                self.landing(input.position)
            } else if self.config.enable_parachute {
                Escalation::Parachute
            } else if self.config.enable_auto_rtb {
                Escalation::ReturnToBase(self.config.rtb_location)
            } else {
                Escalation::NotifyOperator
            }
        } else if self.config.enable_auto_rtb {
            Escalation::ReturnToBase(self.config.rtb_location)
        } else if self.config.enable_auto_land {
            self.landing(input.position)
        } else {
            Escalation::NotifyOperator
        }
    }

    /// The most drastic escalation available, used when a propulsion cut could not be confirmed.
    pub fn last_resort(&self) -> Escalation {
        if self.config.enable_parachute { Escalation::Parachute } else { Escalation::ImmediateLanding }
    }

    /// Closest configured landing zone to `position`.
    pub fn nearest_zone(&self, position: Vec3D<f64>) -> Option<&LandingZone> {
        if self.config.landing_zones.is_empty() {
            return None;
        }
        let nearest = self.zones.nearest_one::<SquaredEuclidean>(&<[f64; 3]>::from(position));
        usize::try_from(nearest.item).ok().and_then(|i| self.config.landing_zones.get(i))
    }

    fn landing(&self, position: Option<Vec3D<f64>>) -> Escalation {
        let Some(position) = position else { return Escalation::ImmediateLanding };
        if position.z() < self.config.min_safe_altitude_agl {
            return Escalation::ImmediateLanding;
        }
        self.nearest_zone(position)
            .map_or(Escalation::ImmediateLanding, |zone| Escalation::NearestLanding(zone.clone()))
    }
}
