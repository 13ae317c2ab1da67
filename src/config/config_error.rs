use std::path::PathBuf;

/// Rejected configuration. Every variant is fatal to startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange { field: &'static str, value: f64, min: f64, max: f64 },
    #[error("{0} thresholds must be strictly decreasing")]
    NotDecreasing(&'static str),
    #[error("{field} = {value} must be positive")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{0} must be finite")]
    NotFinite(&'static str),
    #[error("{0} must not be zero")]
    Zero(&'static str),
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
