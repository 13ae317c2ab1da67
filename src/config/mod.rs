//! Startup configuration: JSON file named by `VIGIL_CONFIG`, validated before any component starts.

mod config_error;
mod core_config;

pub use config_error::ConfigError;
pub use core_config::{CONFIG_ENV, CoreConfig, SupervisorConfig};

#[cfg(test)]
mod tests;
