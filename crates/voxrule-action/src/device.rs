//! Capability handle contract for the voice device.
//!
//! Executors never touch hardware directly. Everything they may do to the
//! device goes through [`DeviceHandle`], and everything the device reports
//! comes back as a typed [`DeviceEvent`] on a broadcast channel owned by the
//! handle.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::ActionError;

/// What to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaySource {
    Text(String),
    Url(String),
}

/// A playback request for the device speaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    pub source: PlaySource,
    /// Wait until playback finishes before returning.
    pub blocking: bool,
}

impl PlayRequest {
    pub fn text(text: impl Into<String>, blocking: bool) -> Self {
        Self {
            source: PlaySource::Text(text.into()),
            blocking,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            source: PlaySource::Url(url.into()),
            blocking: false,
        }
    }
}

#[async_trait]
pub trait DeviceHandle: Send + Sync {
    /// Stop whatever the device is currently saying.
    async fn interrupt_current_playback(&self) -> Result<(), ActionError>;

    async fn play(&self, request: PlayRequest) -> Result<(), ActionError>;

    /// Forward an opaque command without a spoken acknowledgment.
    async fn send_silent_command(&self, command: &str) -> Result<(), ActionError>;

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn subscribe(&self) -> broadcast::Receiver<DeviceEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    Idle,
}

/// Events reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Playback(PlaybackState),
    /// A final speech recognition result.
    Transcript(String),
    WakeWord(String),
}

impl DeviceEvent {
    /// Decode a raw device event.
    ///
    /// Accepts `{"event":"playing","data":"Playing"}`,
    /// `{"event":"instruction","data":{"NewLine":"<json>"}}` and
    /// `{"event":"kws","data":...}`. Interim recognition results, unknown
    /// events and malformed input yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let event: Value = serde_json::from_str(raw).ok()?;
        let data = event.get("data");
        match event.get("event")?.as_str()? {
            "playing" => {
                let state = match data.and_then(Value::as_str) {
                    Some("Playing") => PlaybackState::Playing,
                    Some("Paused") => PlaybackState::Paused,
                    _ => PlaybackState::Idle,
                };
                Some(DeviceEvent::Playback(state))
            }
            "instruction" => {
                let line = data?.get("NewLine")?.as_str()?;
                parse_recognize_result(line).map(DeviceEvent::Transcript)
            }
            "kws" => {
                let keyword = match data? {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some(DeviceEvent::WakeWord(keyword))
            }
            _ => None,
        }
    }
}

fn parse_recognize_result(line: &str) -> Option<String> {
    let line: Value = serde_json::from_str(line).ok()?;
    let header = line.get("header")?;
    if header.get("namespace")?.as_str()? != "SpeechRecognizer"
        || header.get("name")?.as_str()? != "RecognizeResult"
    {
        return None;
    }
    let payload = line.get("payload")?;
    if !payload.get("is_final")?.as_bool()? {
        return None;
    }
    let text = payload.get("results")?.get(0)?.get("text")?.as_str()?;
    if text.is_empty() {
        return None;
    }
    Some(text.to_string())
}
