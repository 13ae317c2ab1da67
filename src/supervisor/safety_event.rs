use crate::energy::{ReserveAction, ReserveLevel};
use crate::failsafe::{EmergencyType, FailsafeEvent, ProcedureError};

/// Operator-facing notification published by the [`Supervisor`](super::Supervisor).
#[derive(Debug, Clone, PartialEq)]
pub enum SafetyEvent {
    /// The reserve tier changed. `actions` are the ones the new tier mandates.
    ReserveLevelChanged { old: ReserveLevel, new: ReserveLevel, actions: Vec<ReserveAction> },
    Failsafe(FailsafeEvent),
    /// An automatically started emergency procedure ran to its end or aborted.
    ProcedureFinished { emergency: EmergencyType, outcome: Result<(), ProcedureError> },
}

impl SafetyEvent {
    pub fn is_mandatory_reserve_change(&self) -> bool {
        matches!(self, Self::ReserveLevelChanged { actions, .. } if actions.iter().any(ReserveAction::is_mandatory))
    }
}
