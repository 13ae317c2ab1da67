use super::lifecycle::LifecycleState;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropulsionError {
    #[error("{operation} is not allowed while propulsion is {state}")]
    Lifecycle { operation: &'static str, state: LifecycleState },
    #[error("{what} out of range: {value}")]
    OutOfRange { what: &'static str, value: f64 },
    /// Only raised by `emergency_shutdown`. Callers must assume the shutdown failed.
    #[error("fatal propulsion failure: {0}")]
    Fatal(String),
}
