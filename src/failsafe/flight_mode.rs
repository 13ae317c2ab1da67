use strum_macros::{Display, EnumIter};

/// Flight mode owned by the emergency system. Manual stays until the operator clears it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, serde::Serialize, serde::Deserialize)]
pub enum FlightMode {
    #[default]
    Primary,
    Backup,
    Emergency,
    Manual,
}
