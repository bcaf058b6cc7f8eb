//! Shared state for runner handlers.

use std::sync::Arc;
use std::time::Instant;

use voxrule_core::config::RunnerConfig;

use crate::runner::ScriptRunner;

#[derive(Clone)]
pub struct RunnerState {
    pub runner: Arc<ScriptRunner>,
    /// Server start time for uptime reporting.
    pub start_time: Instant,
}

impl RunnerState {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            runner: Arc::new(ScriptRunner::new(config)),
            start_time: Instant::now(),
        }
    }
}
