use super::PropulsionError;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
    ShutDown,
}

/// Lifecycle ordering shared by every propulsion backend.
///
/// Repeating the call that led into the current state is a no-op,
/// every other out-of-order call is rejected with [`PropulsionError::Lifecycle`].
/// `ShutDown` is terminal and reachable from anywhere.
#[derive(Debug, Clone, Copy)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Default for Lifecycle {
    fn default() -> Self { Self::new() }
}

impl Lifecycle {
    pub fn new() -> Self { Self { state: LifecycleState::Uninitialized } }

    pub fn state(&self) -> LifecycleState { self.state }

    pub fn initialize(&mut self) -> Result<(), PropulsionError> {
        match self.state {
            LifecycleState::Uninitialized => {
                self.state = LifecycleState::Initialized;
                Ok(())
            }
            LifecycleState::Initialized => Ok(()),
            _ => Err(self.reject("initialize")),
        }
    }

    pub fn start(&mut self) -> Result<(), PropulsionError> {
        match self.state {
            LifecycleState::Initialized => {
                self.state = LifecycleState::Running;
                Ok(())
            }
            LifecycleState::Running => Ok(()),
            _ => Err(self.reject("start")),
        }
    }

    pub fn stop(&mut self) -> Result<(), PropulsionError> {
        match self.state {
            LifecycleState::Running => {
                self.state = LifecycleState::Stopped;
                Ok(())
            }
            LifecycleState::Stopped | LifecycleState::ShutDown => Ok(()),
            _ => Err(self.reject("stop")),
        }
    }

    pub fn shut_down(&mut self) { self.state = LifecycleState::ShutDown; }

    /// Fails unless the backend is running.
    pub fn require_running(&self, operation: &'static str) -> Result<(), PropulsionError> {
        if self.state == LifecycleState::Running { Ok(()) } else { Err(self.reject(operation)) }
    }

    fn reject(&self, operation: &'static str) -> PropulsionError {
        PropulsionError::Lifecycle { operation, state: self.state }
    }
}
