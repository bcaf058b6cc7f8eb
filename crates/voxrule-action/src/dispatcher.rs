//! Action Dispatcher.
//!
//! Selects exactly one executor per matched rule. The executor runs in its
//! own task so that even a panic inside it becomes a failure reply; nothing
//! propagates to the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use voxrule_core::config::{EngineConfig, TerminalConfig};
use voxrule_core::{Response, Rule};

use crate::device::DeviceHandle;
use crate::error::ActionError;
use crate::handler::{
    ApiCallHandler, RemoteCodeHandler, RemoteLanguage, ReplyHandler, ScriptHandler,
    ScriptLimits, TerminalHandler,
};
use crate::normalize::{failure_reply, GENERIC_FAILURE};
use crate::types::Outcome;

/// Holds one instance of every executor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    reply: ReplyHandler,
    script: ScriptHandler,
    api: ApiCallHandler,
    remote: RemoteCodeHandler,
    terminal: TerminalHandler,
}

impl Dispatcher {
    pub fn new(engine: &EngineConfig, terminal: &TerminalConfig) -> Result<Self, ActionError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ActionError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            reply: ReplyHandler::new(Duration::from_millis(engine.settle_delay_ms)),
            script: ScriptHandler::new(ScriptLimits::from(engine)),
            api: ApiCallHandler::new(
                client.clone(),
                Duration::from_secs(engine.http_timeout_secs),
            ),
            remote: RemoteCodeHandler::new(client, engine.remote_timeout_secs),
            terminal: TerminalHandler::new(terminal.clone()),
        })
    }

    /// Run the rule's action. Returns `None` only for a response kind this
    /// build does not know.
    pub async fn dispatch(&self, rule: &Rule, device: Arc<dyn DeviceHandle>) -> Option<Outcome> {
        let kind = rule.response.kind();
        if matches!(rule.response, Response::Unsupported(_)) {
            warn!(
                rule_id = %rule.id,
                response_type = %rule.response.type_name(),
                "Rule has an unsupported response type, skipping"
            );
            return None;
        }

        info!(
            rule_id = %rule.id,
            trigger = %rule.trigger.trigger_type,
            keyword = %rule.trigger.keyword,
            %kind,
            "Dispatching rule"
        );

        let this = self.clone();
        let response = rule.response.clone();
        let task = tokio::spawn(async move { this.execute(&response, device).await });

        let outcome = match task.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                warn!(rule_id = %rule.id, %kind, error = %err, "Rule execution failed");
                Outcome::Reply(failure_reply(kind, &err))
            }
            Err(join_err) => {
                error!(rule_id = %rule.id, %kind, error = %join_err, "Rule executor aborted");
                Outcome::reply(GENERIC_FAILURE)
            }
        };
        Some(outcome)
    }

    async fn execute(
        &self,
        response: &Response,
        device: Arc<dyn DeviceHandle>,
    ) -> Result<Outcome, ActionError> {
        match response {
            Response::Text(r) => self.reply.text(r, device.as_ref()).await,
            Response::Audio(r) => self.reply.audio(r, device.as_ref()).await,
            Response::BuiltInCommand(r) => self.reply.built_in_command(r, device.as_ref()).await,
            Response::LocalCode(r) => self.script.local(r, device).await,
            Response::SandboxCode(r) => self.script.sandbox(r).await,
            Response::ApiCall(r) => self.api.execute(r).await,
            Response::PythonRemote(r) => self.remote.execute(r, RemoteLanguage::Python).await,
            Response::NodeRemote(r) => self.remote.execute(r, RemoteLanguage::Node).await,
            Response::TerminalCommand(r) => self.terminal.execute(r).await,
            Response::Unsupported(_) => Err(ActionError::Configuration(format!(
                "unsupported response type: {}",
                response.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::{DeviceCall, RecordingDevice};
    use crate::device::{DeviceEvent, PlayRequest};
    use async_trait::async_trait;
    use tokio::sync::broadcast;
    use voxrule_core::{
        BuiltInCommandResponse, LocalCodeResponse, RuleDraft, SandboxCodeResponse,
        TerminalCommandResponse, TextResponse, Trigger, TriggerType,
    };

    fn dispatcher() -> Dispatcher {
        let engine = EngineConfig {
            script_timeout_secs: 5,
            ..EngineConfig::default()
        };
        Dispatcher::new(&engine, &TerminalConfig::default()).unwrap()
    }

    fn rule(response: Response) -> Rule {
        RuleDraft::new(Trigger::new(TriggerType::Contains, "x"), response).into_rule()
    }

    #[tokio::test]
    async fn test_text_rule() {
        let device: Arc<dyn DeviceHandle> = Arc::new(RecordingDevice::new());
        let r = rule(Response::Text(TextResponse {
            text: "OK".to_string(),
            abort_current: false,
            play_blocking: true,
        }));
        assert_eq!(dispatcher().dispatch(&r, device).await, Some(Outcome::reply("OK")));
    }

    #[tokio::test]
    async fn test_unsupported_yields_none() {
        let device: Arc<dyn DeviceHandle> = Arc::new(RecordingDevice::new());
        assert_eq!(dispatcher().dispatch(&rule(Response::Unsupported(serde_json::json!({"type": "hologram"}))), device).await, None);
    }

    #[tokio::test]
    async fn test_sandbox_fault_becomes_reply() {
        let device: Arc<dyn DeviceHandle> = Arc::new(RecordingDevice::new());
        let r = rule(Response::SandboxCode(SandboxCodeResponse {
            sandbox_code: r#"throw "kaput""#.to_string(),
        }));
        let outcome = dispatcher().dispatch(&r, device).await.unwrap();
        let text = outcome.text().unwrap();
        assert!(text.starts_with("execution failed:"), "{text}");
        assert!(text.contains("kaput"), "{text}");
    }

    #[tokio::test]
    async fn test_local_and_sandbox_share_error_policy() {
        let device: Arc<dyn DeviceHandle> = Arc::new(RecordingDevice::new());
        let local = rule(Response::LocalCode(LocalCodeResponse {
            local_code: r#"throw "kaput""#.to_string(),
        }));
        let outcome = dispatcher().dispatch(&local, device).await.unwrap();
        assert!(outcome.text().unwrap().starts_with("execution failed:"));
    }

    #[tokio::test]
    async fn test_terminal_failure_reply() {
        let device: Arc<dyn DeviceHandle> = Arc::new(RecordingDevice::new());
        let r = rule(Response::TerminalCommand(TerminalCommandResponse {
            terminal_command: "echo nope >&2; exit 1".to_string(),
            terminal_working_dir: None,
            terminal_timeout: Some(5),
            terminal_return_output: true,
            ssh: None,
        }));
        let outcome = dispatcher().dispatch(&r, device).await.unwrap();
        let text = outcome.text().unwrap();
        assert!(text.starts_with("Command failed:"), "{text}");
        assert!(text.contains("stderr:\n```\nnope\n```"), "{text}");
    }

    #[tokio::test]
    async fn test_built_in_command_device_failure() {
        let device: Arc<dyn DeviceHandle> = Arc::new(RecordingDevice::failing_commands());
        let r = rule(Response::BuiltInCommand(BuiltInCommandResponse {
            built_in_command: "lights on".to_string(),
            abort_current: false,
        }));
        let outcome = dispatcher().dispatch(&r, device).await.unwrap();
        assert!(outcome.text().unwrap().contains("device offline"));
    }

    #[tokio::test]
    async fn test_abort_uses_configured_settle_delay() {
        let device = Arc::new(RecordingDevice::new());
        let r = rule(Response::Text(TextResponse {
            text: "OK".to_string(),
            abort_current: true,
            play_blocking: true,
        }));
        let outcome = dispatcher().dispatch(&r, device.clone()).await;
        assert_eq!(outcome, Some(Outcome::Handled));
        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::Interrupt,
                DeviceCall::Sleep(Duration::from_millis(2000)),
                DeviceCall::Play(PlayRequest::text("OK", true)),
            ]
        );
    }

    struct PanickingDevice {
        events: broadcast::Sender<DeviceEvent>,
    }

    #[async_trait]
    impl DeviceHandle for PanickingDevice {
        async fn interrupt_current_playback(&self) -> Result<(), ActionError> {
            panic!("driver bug");
        }
        async fn play(&self, _request: PlayRequest) -> Result<(), ActionError> {
            Ok(())
        }
        async fn send_silent_command(&self, _command: &str) -> Result<(), ActionError> {
            Ok(())
        }
        fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
            self.events.subscribe()
        }
    }

    #[tokio::test]
    async fn test_executor_panic_is_contained() {
        let (events, _) = broadcast::channel(1);
        let device: Arc<dyn DeviceHandle> = Arc::new(PanickingDevice { events });
        let r = rule(Response::Audio(Default::default()));
        let outcome = dispatcher().dispatch(&r, device).await;
        assert_eq!(outcome, Some(Outcome::reply(GENERIC_FAILURE)));
    }
}
