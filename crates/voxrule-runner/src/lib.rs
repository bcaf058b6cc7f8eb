//! Voxrule runner: the isolated process execution service.
//!
//! Accepts `POST /execute {language, code, timeout?}`, runs the source in a
//! fresh scratch directory under a wall-clock limit, and reports captured
//! output. Used by the remote-code executors.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod runner;
pub mod state;

pub use error::RunnerError;
pub use routes::{create_router, resolve_port, start_server};
pub use runner::{ExecutionOutput, ScriptLanguage, ScriptRunner};
pub use state::RunnerState;
