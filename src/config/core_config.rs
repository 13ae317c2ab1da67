use super::ConfigError;
use crate::energy::ReserveConfig;
use crate::failsafe::FailsafeConfig;
use crate::flight_control::DecisionConfig;
use crate::propulsion::electric::ElectricConfig;
use std::{env, path::Path, time::Duration};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "VIGIL_CONFIG";

/// Scheduling and event fan-out of the supervisor.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub reserve_check_interval_ms: u64,
    /// Run the catalogue procedure of every newly detected emergency flagged for auto-execution.
    pub auto_execute_procedures: bool,
    /// Capacity of the operator event broadcast channel.
    pub event_capacity: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self { reserve_check_interval_ms: 500, auto_execute_procedures: true, event_capacity: 64 }
    }
}

impl SupervisorConfig {
    pub fn reserve_check_interval(&self) -> Duration { Duration::from_millis(self.reserve_check_interval_ms) }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reserve_check_interval_ms == 0 {
            return Err(ConfigError::Zero("reserve_check_interval_ms"));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Zero("event_capacity"));
        }
        Ok(())
    }
}

/// Complete onboard configuration. Missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub reserve: ReserveConfig,
    pub decision: DecisionConfig,
    pub failsafe: FailsafeConfig,
    pub supervisor: SupervisorConfig,
    pub electric: ElectricConfig,
}

impl CoreConfig {
    /// Loads the file named by `VIGIL_CONFIG`, or the defaults if the variable is unset.
    pub fn load() -> Result<Self, ConfigError> {
        match env::var(CONFIG_ENV) {
            Ok(path) => Self::load_from(path),
            Err(_) => {
                crate::info!("{CONFIG_ENV} not set, using default configuration");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config = serde_json::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        crate::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Validates every section, stopping at the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reserve.validate()?;
        self.decision.validate()?;
        self.failsafe.validate()?;
        self.supervisor.validate()
    }
}
