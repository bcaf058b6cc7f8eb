//! Voxrule admin API: authenticated rule and settings management.
//!
//! Writes go straight to the rule store. The dispatch engine re-reads the
//! store on every utterance, so edits take effect on the next turn.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, resolve_port, start_server};
pub use state::AppState;
