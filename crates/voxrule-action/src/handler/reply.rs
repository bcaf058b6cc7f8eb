//! Reply, audio and device-command executors.
//!
//! Interrupting the device and immediately issuing new audio drops the audio
//! on real hardware, so every interrupt is followed by the settle delay
//! before anything else is sent.

use std::time::Duration;

use voxrule_core::{AudioResponse, BuiltInCommandResponse, TextResponse};

use crate::device::{DeviceHandle, PlayRequest};
use crate::error::ActionError;
use crate::types::Outcome;

#[derive(Debug, Clone)]
pub struct ReplyHandler {
    settle_delay: Duration,
}

impl ReplyHandler {
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    async fn interrupt_and_settle(&self, device: &dyn DeviceHandle) -> Result<(), ActionError> {
        device.interrupt_current_playback().await?;
        device.sleep(self.settle_delay).await;
        Ok(())
    }

    /// Return the text for the caller to speak, or speak it through the
    /// device after interrupting the current turn.
    pub async fn text(
        &self,
        response: &TextResponse,
        device: &dyn DeviceHandle,
    ) -> Result<Outcome, ActionError> {
        if response.text.is_empty() {
            return Err(ActionError::Configuration("text is required".to_string()));
        }
        if !response.abort_current {
            return Ok(Outcome::reply(response.text.clone()));
        }

        self.interrupt_and_settle(device).await?;
        device
            .play(PlayRequest::text(response.text.clone(), response.play_blocking))
            .await?;
        Ok(Outcome::Handled)
    }

    /// Always interrupts, then plays the optional text and the optional URL.
    pub async fn audio(
        &self,
        response: &AudioResponse,
        device: &dyn DeviceHandle,
    ) -> Result<Outcome, ActionError> {
        self.interrupt_and_settle(device).await?;

        if let Some(text) = response.audio_text.as_deref().filter(|t| !t.is_empty()) {
            device.play(PlayRequest::text(text, true)).await?;
        }
        if let Some(url) = response.audio_url.as_deref().filter(|u| !u.is_empty()) {
            device.play(PlayRequest::url(url)).await?;
        }
        Ok(Outcome::Handled)
    }

    pub async fn built_in_command(
        &self,
        response: &BuiltInCommandResponse,
        device: &dyn DeviceHandle,
    ) -> Result<Outcome, ActionError> {
        if response.built_in_command.is_empty() {
            return Err(ActionError::Configuration(
                "builtInCommand is required".to_string(),
            ));
        }

        if response.abort_current {
            self.interrupt_and_settle(device).await?;
        }
        tracing::info!(command = %response.built_in_command, "Sending built-in command");
        device
            .send_silent_command(&response.built_in_command)
            .await?;
        Ok(Outcome::Handled)
    }
}
