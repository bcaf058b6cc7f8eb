//! Error types for the rule store.

use uuid::Uuid;
use voxrule_core::error::VoxruleError;
use voxrule_core::TriggerType;

/// Errors from rule and settings persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Rule not found: {0}")]
    NotFound(Uuid),
    #[error("A rule with trigger {trigger_type} \"{keyword}\" already exists")]
    DuplicateTrigger {
        trigger_type: TriggerType,
        keyword: String,
    },
    #[error("Invalid rule: {0}")]
    Invalid(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<StoreError> for VoxruleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => VoxruleError::Io(e),
            StoreError::Serialization(e) => VoxruleError::Serialization(e.to_string()),
            other => VoxruleError::Storage(other.to_string()),
        }
    }
}
