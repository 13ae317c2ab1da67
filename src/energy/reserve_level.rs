use strum_macros::{Display, EnumIter};

/// Reserve tier, ordered from best to worst.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter,
    serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum ReserveLevel {
    #[default]
    Mission,
    Contingency,
    Emergency,
    Absolute,
}

impl ReserveLevel {
    /// Classifies `value` against descending `(absolute, emergency, contingency)` thresholds.
    pub fn classify(value: f64, absolute: f64, emergency: f64, contingency: f64) -> Self {
        if value <= absolute {
            Self::Absolute
        } else if value <= emergency {
            Self::Emergency
        } else if value <= contingency {
            Self::Contingency
        } else {
            Self::Mission
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    WarnOperator,
    AbortMission,
    ReturnToBase,
    ReducePower,
    FindNearestLanding,
    ImmediateLanding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReserveAction {
    /// Lower is more urgent.
    priority: u8,
    action: ActionType,
    mandatory: bool,
}

impl ReserveAction {
    pub fn mandatory(priority: u8, action: ActionType) -> Self {
        Self { priority, action, mandatory: true }
    }

    pub fn advisory(priority: u8, action: ActionType) -> Self {
        Self { priority, action, mandatory: false }
    }

    pub fn priority(&self) -> u8 { self.priority }
    pub fn action(&self) -> ActionType { self.action }
    pub fn is_mandatory(&self) -> bool { self.mandatory }
}
