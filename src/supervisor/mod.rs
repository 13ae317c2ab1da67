//! Periodic safety schedules and the operator event hub.

mod safety_event;
mod safety_supervisor;

pub use safety_event::SafetyEvent;
pub use safety_supervisor::Supervisor;

#[cfg(test)]
mod tests;
