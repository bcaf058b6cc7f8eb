use thiserror::Error;

/// Top-level error type for the Voxrule system.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for VoxruleError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VoxruleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Action error: {0}")]
    Action(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Runner error: {0}")]
    Runner(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for VoxruleError {
    fn from(err: toml::de::Error) -> Self {
        VoxruleError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VoxruleError {
    fn from(err: toml::ser::Error) -> Self {
        VoxruleError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VoxruleError {
    fn from(err: serde_json::Error) -> Self {
        VoxruleError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Voxrule operations.
pub type Result<T> = std::result::Result<T, VoxruleError>;
