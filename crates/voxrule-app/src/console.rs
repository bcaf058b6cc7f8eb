//! Console-backed device.
//!
//! Stands in for the speaker when no hardware bridge is attached: input
//! lines become device events, and playback is written to an output sink.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use voxrule_action::{
    ActionError, DeviceEvent, DeviceHandle, PlayRequest, PlaySource, PlaybackState,
};

const EVENT_CAPACITY: usize = 64;

pub struct ConsoleDevice {
    events: broadcast::Sender<DeviceEvent>,
    playback: Mutex<PlaybackState>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleDevice {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            events,
            playback: Mutex::new(PlaybackState::Idle),
            out: Mutex::new(out),
        }
    }

    /// Turn one input line into an event. JSON lines are decoded as raw
    /// device events; anything else is taken as a final transcript.
    pub fn decode_line(line: &str) -> Option<DeviceEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line.starts_with('{') {
            return DeviceEvent::parse(line);
        }
        Some(DeviceEvent::Transcript(line.to_string()))
    }

    /// Decode and publish `line`. Returns whether an event was emitted.
    pub fn feed_line(&self, line: &str) -> bool {
        let Some(event) = Self::decode_line(line) else {
            debug!(line, "Ignoring console input");
            return false;
        };
        if let DeviceEvent::Playback(state) = &event {
            self.set_playback(*state);
        }
        // No subscribers only means nobody is listening yet.
        let _ = self.events.send(event);
        true
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
            .lock()
            .map(|s| *s)
            .unwrap_or(PlaybackState::Idle)
    }

    fn set_playback(&self, state: PlaybackState) {
        if let Ok(mut current) = self.playback.lock() {
            *current = state;
        }
    }

    fn write_line(&self, line: &str) -> Result<(), ActionError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| ActionError::Execution("console output lock poisoned".to_string()))?;
        writeln!(out, "{}", line)
            .and_then(|_| out.flush())
            .map_err(|e| ActionError::Execution(format!("console write failed: {}", e)))
    }
}

#[async_trait]
impl DeviceHandle for ConsoleDevice {
    async fn interrupt_current_playback(&self) -> Result<(), ActionError> {
        info!(state = ?self.playback(), "Interrupting current playback");
        self.set_playback(PlaybackState::Idle);
        Ok(())
    }

    async fn play(&self, request: PlayRequest) -> Result<(), ActionError> {
        let line = match &request.source {
            PlaySource::Text(text) => format!("speaker> {}", text),
            PlaySource::Url(url) => format!("speaker> [audio] {}", url),
        };
        self.set_playback(PlaybackState::Playing);
        let written = self.write_line(&line);
        // Console playback completes as soon as it is written.
        self.set_playback(PlaybackState::Idle);
        written
    }

    async fn send_silent_command(&self, command: &str) -> Result<(), ActionError> {
        info!(command, "Device command");
        self.write_line(&format!("command> {}", command))
    }

    fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }
}

/// In-memory sink for tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
