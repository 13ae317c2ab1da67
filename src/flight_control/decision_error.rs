use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("decision engine used before initialize()")]
    Uninitialized,
    #[error("invalid decision configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
