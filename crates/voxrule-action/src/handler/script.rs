//! Local-code and sandboxed-code executors.
//!
//! Both tiers evaluate rule source in an embedded rhai engine. The function
//! surface is assembled per tier: the sandbox gets logging, timers and JSON
//! helpers only, while the local tier additionally gets device functions
//! bound to the capability handle. A sandboxed script cannot reach the device
//! because those functions are never registered in its engine.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, Map, INT};
use tokio::runtime::Handle;
use tracing::{debug, info};

use voxrule_core::config::EngineConfig;
use voxrule_core::{LocalCodeResponse, SandboxCodeResponse};

use crate::device::{DeviceHandle, PlayRequest};
use crate::error::ActionError;
use crate::types::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptTier {
    /// Trusted operator code with device access.
    Local,
    /// Untrusted code without device access.
    Sandbox,
}

impl fmt::Display for ScriptTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptTier::Local => write!(f, "local"),
            ScriptTier::Sandbox => write!(f, "sandbox"),
        }
    }
}

/// Resource bounds for one evaluation.
#[derive(Debug, Clone)]
pub struct ScriptLimits {
    pub timeout: Duration,
    /// Zero disables the operation budget.
    pub max_operations: u64,
    /// Used by the local tier's `settle()`.
    pub settle_delay: Duration,
}

impl From<&EngineConfig> for ScriptLimits {
    fn from(config: &EngineConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.script_timeout_secs),
            max_operations: config.script_max_operations,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptHandler {
    limits: ScriptLimits,
}

impl ScriptHandler {
    pub fn new(limits: ScriptLimits) -> Self {
        Self { limits }
    }

    pub async fn local(
        &self,
        response: &LocalCodeResponse,
        device: Arc<dyn DeviceHandle>,
    ) -> Result<Outcome, ActionError> {
        self.run(ScriptTier::Local, response.local_code.clone(), Some(device))
            .await
    }

    pub async fn sandbox(&self, response: &SandboxCodeResponse) -> Result<Outcome, ActionError> {
        self.run(ScriptTier::Sandbox, response.sandbox_code.clone(), None)
            .await
    }

    async fn run(
        &self,
        tier: ScriptTier,
        source: String,
        device: Option<Arc<dyn DeviceHandle>>,
    ) -> Result<Outcome, ActionError> {
        if source.trim().is_empty() {
            return Ok(Outcome::Handled);
        }

        info!(%tier, bytes = source.len(), "Evaluating script");
        let limits = self.limits.clone();
        let runtime = Handle::current();
        let task = tokio::task::spawn_blocking(move || {
            let engine = build_engine(tier, &limits, device, runtime);
            engine
                .eval::<Dynamic>(&source)
                .map(outcome_from_value)
                .map_err(|e| script_error(*e, limits.timeout))
        });

        // The progress callback stops the script at the deadline; this only
        // catches a device call that never returns.
        let grace = self.limits.timeout + Duration::from_secs(1);
        match tokio::time::timeout(grace, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ActionError::Script(format!("script task failed: {}", e))),
            Err(_) => Err(ActionError::Timeout(whole_secs(self.limits.timeout))),
        }
    }
}

fn build_engine(
    tier: ScriptTier,
    limits: &ScriptLimits,
    device: Option<Arc<dyn DeviceHandle>>,
    runtime: Handle,
) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(limits.max_operations);
    if tier == ScriptTier::Sandbox {
        // No `import` from the filesystem.
        engine.set_module_resolver(DummyModuleResolver::new());
    }

    let deadline = Instant::now() + limits.timeout;
    engine.on_progress(move |_| {
        if Instant::now() >= deadline {
            Some(Dynamic::UNIT)
        } else {
            None
        }
    });

    engine.on_print(move |s| info!(%tier, "{}", s));
    engine.on_debug(move |s, _, pos| debug!(%tier, %pos, "{}", s));
    engine.register_fn("log", move |msg: ImmutableString| info!(%tier, "{}", msg));

    engine.register_fn("sleep", move |ms: INT| {
        let wanted = Duration::from_millis(ms.max(0) as u64);
        let remaining = deadline.saturating_duration_since(Instant::now());
        std::thread::sleep(wanted.min(remaining));
    });
    engine.register_fn("now", || chrono::Utc::now().to_rfc3339());
    engine.register_fn("now_ms", || -> INT { chrono::Utc::now().timestamp_millis() });
    engine.register_fn(
        "parse_json",
        |s: ImmutableString| -> Result<Dynamic, Box<EvalAltResult>> {
            serde_json::from_str::<Dynamic>(&s).map_err(|e| format!("parse_json: {}", e).into())
        },
    );
    engine.register_fn(
        "to_json",
        |value: Dynamic| -> Result<String, Box<EvalAltResult>> {
            serde_json::to_string(&value).map_err(|e| format!("to_json: {}", e).into())
        },
    );

    if let (ScriptTier::Local, Some(device)) = (tier, device) {
        register_device_api(&mut engine, device, runtime, limits.settle_delay);
    }
    engine
}

fn register_device_api(
    engine: &mut Engine,
    device: Arc<dyn DeviceHandle>,
    runtime: Handle,
    settle_delay: Duration,
) {
    let (d, rt) = (device.clone(), runtime.clone());
    engine.register_fn("interrupt", move || -> Result<(), Box<EvalAltResult>> {
        rt.block_on(d.interrupt_current_playback()).map_err(device_error)
    });

    let (d, rt) = (device.clone(), runtime.clone());
    engine.register_fn(
        "play_text",
        move |text: ImmutableString| -> Result<(), Box<EvalAltResult>> {
            rt.block_on(d.play(PlayRequest::text(text.as_str(), true)))
                .map_err(device_error)
        },
    );

    let (d, rt) = (device.clone(), runtime.clone());
    engine.register_fn(
        "play_text",
        move |text: ImmutableString, blocking: bool| -> Result<(), Box<EvalAltResult>> {
            rt.block_on(d.play(PlayRequest::text(text.as_str(), blocking)))
                .map_err(device_error)
        },
    );

    let (d, rt) = (device.clone(), runtime.clone());
    engine.register_fn(
        "play_url",
        move |url: ImmutableString| -> Result<(), Box<EvalAltResult>> {
            rt.block_on(d.play(PlayRequest::url(url.as_str())))
                .map_err(device_error)
        },
    );

    let (d, rt) = (device.clone(), runtime.clone());
    engine.register_fn(
        "send_command",
        move |command: ImmutableString| -> Result<(), Box<EvalAltResult>> {
            rt.block_on(d.send_silent_command(command.as_str()))
                .map_err(device_error)
        },
    );

    engine.register_fn("settle", move || {
        runtime.block_on(device.sleep(settle_delay));
    });
}

fn device_error(err: ActionError) -> Box<EvalAltResult> {
    err.to_string().into()
}

/// A non-empty string, or a map with a string `text`, becomes a reply.
/// Everything else means the script handled the turn itself.
fn outcome_from_value(value: Dynamic) -> Outcome {
    if value.is_string() {
        return match value.into_string() {
            Ok(text) if !text.is_empty() => Outcome::Reply(text),
            _ => Outcome::Handled,
        };
    }
    if let Some(map) = value.try_cast::<Map>() {
        if let Some(text) = map.get("text").filter(|t| t.is_string()) {
            if let Ok(text) = text.clone().into_string() {
                return Outcome::Reply(text);
            }
        }
    }
    Outcome::Handled
}

/// Limit in seconds, rounded up so a sub-second limit never reports as 0.
fn whole_secs(limit: Duration) -> u64 {
    limit.as_secs() + u64::from(limit.subsec_nanos() > 0)
}

fn script_error(err: EvalAltResult, timeout: Duration) -> ActionError {
    match err {
        EvalAltResult::ErrorTerminated(..) => ActionError::Timeout(whole_secs(timeout)),
        EvalAltResult::ErrorTooManyOperations(..) => {
            ActionError::Script("operation limit exceeded".to_string())
        }
        other => ActionError::Script(other.to_string()),
    }
}
