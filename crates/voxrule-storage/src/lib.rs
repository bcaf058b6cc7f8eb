//! Voxrule Storage crate - JSON-file rule and settings persistence.
//!
//! Rules live in a single pretty-printed JSON array that is replaced whole on
//! every write; settings live in a sibling JSON object. Writes are serialized
//! in-process and land atomically through a temp file and rename.

pub mod error;
pub mod file;
pub mod store;

pub use error::StoreError;
pub use store::RuleStore;
