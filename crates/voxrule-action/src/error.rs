//! Error types for the dispatch engine.

use voxrule_core::error::VoxruleError;

/// Errors raised by executors and the capability handle.
///
/// None of these escape the engine: the dispatcher converts every one of them
/// into a reply through [`crate::normalize`].
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// A required rule field is missing or malformed. Raised before any side
    /// effect.
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Execution failed: {0}")]
    Execution(String),
    /// A process ran and failed. Output is already redacted.
    #[error("{message}")]
    CommandFailed {
        message: String,
        stdout: String,
        stderr: String,
    },
    #[error("Timed out after {0} seconds")]
    Timeout(u64),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Script error: {0}")]
    Script(String),
}

impl From<ActionError> for VoxruleError {
    fn from(err: ActionError) -> Self {
        VoxruleError::Action(err.to_string())
    }
}
