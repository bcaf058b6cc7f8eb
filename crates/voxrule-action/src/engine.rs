//! Rule engine: the per-utterance entry point.

use std::sync::Arc;

use tracing::{debug, warn};

use voxrule_core::Settings;
use voxrule_storage::RuleStore;

use crate::device::DeviceHandle;
use crate::dispatcher::Dispatcher;
use crate::matcher::find_match;
use crate::types::Outcome;

/// Explicit context built once at startup. Holds no rule cache: every
/// utterance reads a fresh snapshot from the store, so admin edits apply to
/// the next turn.
#[derive(Clone)]
pub struct RuleEngine {
    store: Arc<RuleStore>,
    dispatcher: Dispatcher,
}

impl RuleEngine {
    pub fn new(store: Arc<RuleStore>, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Settings {
        self.store.settings()
    }

    /// Match `utterance` and run the winning rule. `None` means no rule
    /// applies and the caller should continue with its default handling.
    pub async fn handle_utterance(
        &self,
        utterance: &str,
        device: Arc<dyn DeviceHandle>,
    ) -> Option<Outcome> {
        let rules = match self.store.enabled_rules() {
            Ok(rules) => rules,
            Err(e) => {
                warn!(error = %e, "Failed to read rules, treating as no match");
                return None;
            }
        };

        let Some(rule) = find_match(utterance, &rules) else {
            debug!(utterance, rules = rules.len(), "No rule matched");
            return None;
        };
        self.dispatcher.dispatch(rule, device).await
    }
}
