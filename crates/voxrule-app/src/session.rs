//! Dispatch loop: device events in, rule outcomes out.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use voxrule_action::{DeviceEvent, DeviceHandle, Outcome, PlayRequest, RuleEngine};

/// What happened to one transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// A rule matched; its reply was spoken.
    Replied(String),
    /// A rule matched and produced its own side effect.
    Handled,
    /// No rule matched and the text qualifies for the conversation pipeline.
    Deferred,
    /// No rule matched and the text does not start with a call keyword.
    Ignored,
}

pub struct Session {
    engine: RuleEngine,
    device: Arc<dyn DeviceHandle>,
}

impl Session {
    pub fn new(engine: RuleEngine, device: Arc<dyn DeviceHandle>) -> Self {
        Self { engine, device }
    }

    /// Process one final transcript.
    pub async fn handle_transcript(&self, text: &str) -> Turn {
        match self.engine.handle_utterance(text, self.device.clone()).await {
            Some(Outcome::Reply(reply)) => {
                if let Err(e) = self.device.play(PlayRequest::text(reply.clone(), true)).await {
                    warn!(error = %e, "Failed to speak rule reply");
                }
                Turn::Replied(reply)
            }
            Some(Outcome::Handled) => Turn::Handled,
            None => {
                if self.engine.settings().should_call_ai(text) {
                    // The conversation pipeline lives outside this process.
                    info!(text, "No rule matched, deferring to the conversation pipeline");
                    Turn::Deferred
                } else {
                    debug!(text, "No rule matched and no call keyword, ignoring");
                    Turn::Ignored
                }
            }
        }
    }

    /// Consume events until the channel closes. Transcripts are handled one
    /// at a time, in arrival order.
    pub async fn run(self, mut events: broadcast::Receiver<DeviceEvent>) {
        info!("Dispatch session started");
        loop {
            match events.recv().await {
                Ok(DeviceEvent::Transcript(text)) => {
                    let turn = self.handle_transcript(&text).await;
                    debug!(?turn, "Turn complete");
                }
                Ok(DeviceEvent::WakeWord(keyword)) => info!(keyword, "Wake word detected"),
                Ok(DeviceEvent::Playback(state)) => debug!(?state, "Playback state changed"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Dispatch loop fell behind, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!("Dispatch session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ConsoleDevice, SharedBuffer};
    use voxrule_action::Dispatcher;
    use voxrule_core::config::{EngineConfig, TerminalConfig};
    use voxrule_core::{
        BuiltInCommandResponse, Response, RuleDraft, Settings, TextResponse, Trigger, TriggerType,
    };
    use voxrule_storage::RuleStore;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<RuleStore>,
        buffer: SharedBuffer,
        session: Session,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            RuleStore::open(
                &dir.path().join("rules.json"),
                &dir.path().join("settings.json"),
            )
            .unwrap(),
        );
        let dispatcher =
            Dispatcher::new(&EngineConfig::default(), &TerminalConfig::default()).unwrap();
        let buffer = SharedBuffer::default();
        let device: Arc<dyn DeviceHandle> =
            Arc::new(ConsoleDevice::with_writer(Box::new(buffer.clone())));
        let session = Session::new(RuleEngine::new(store.clone(), dispatcher), device);
        Fixture {
            _dir: dir,
            store,
            buffer,
            session,
        }
    }

    #[tokio::test]
    async fn test_reply_is_spoken() {
        let f = fixture();
        f.store
            .create(RuleDraft::new(
                Trigger::new(TriggerType::Contains, "weather"),
                Response::Text(TextResponse {
                    text: "Sunny".to_string(),
                    abort_current: false,
                    play_blocking: true,
                }),
            ))
            .unwrap();

        let turn = f.session.handle_transcript("what's the weather").await;
        assert_eq!(turn, Turn::Replied("Sunny".to_string()));
        assert_eq!(f.buffer.contents(), "speaker> Sunny\n");
    }

    #[tokio::test]
    async fn test_handled_rule_speaks_nothing_extra() {
        let f = fixture();
        f.store
            .create(RuleDraft::new(
                Trigger::new(TriggerType::Exact, "lights"),
                Response::BuiltInCommand(BuiltInCommandResponse {
                    built_in_command: "turn on the lights".to_string(),
                    abort_current: false,
                }),
            ))
            .unwrap();

        assert_eq!(f.session.handle_transcript("lights").await, Turn::Handled);
        assert_eq!(f.buffer.contents(), "command> turn on the lights\n");
    }

    #[tokio::test]
    async fn test_unmatched_text_is_gated_by_call_keywords() {
        let f = fixture();
        f.store
            .save_settings(&Settings {
                call_ai_keywords: vec!["assistant".to_string()],
                ..Settings::default()
            })
            .unwrap();

        assert_eq!(
            f.session.handle_transcript("assistant, tell a joke").await,
            Turn::Deferred
        );
        assert_eq!(f.session.handle_transcript("tell a joke").await, Turn::Ignored);
        assert_eq!(f.buffer.contents(), "");
    }

    #[tokio::test]
    async fn test_run_stops_when_channel_closes() {
        let f = fixture();
        let (tx, rx) = broadcast::channel(8);
        tx.send(DeviceEvent::WakeWord("hey".to_string())).unwrap();
        tx.send(DeviceEvent::Transcript("nothing matches".to_string()))
            .unwrap();
        drop(tx);
        tokio::time::timeout(std::time::Duration::from_secs(5), f.session.run(rx))
            .await
            .unwrap();
    }
}
