//! Terminal-command executor, local or over SSH.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{info, warn};

use voxrule_core::config::{expand_home, TerminalConfig};
use voxrule_core::{SshTarget, TerminalCommandResponse};

use crate::error::ActionError;
use crate::handler::ssh::{find_in_path, remote_command, Redactor, SshInvocation};
use crate::types::Outcome;

const NO_OUTPUT: &str = "command completed with no output";

#[derive(Debug, Clone)]
pub struct TerminalHandler {
    config: TerminalConfig,
}

/// Captured, redacted process output.
#[derive(Debug)]
struct Captured {
    stdout: String,
    stderr: String,
}

impl TerminalHandler {
    pub fn new(config: TerminalConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self, response: &TerminalCommandResponse) -> Result<Outcome, ActionError> {
        if response.terminal_command.trim().is_empty() {
            return Err(ActionError::Configuration(
                "terminalCommand is required".to_string(),
            ));
        }
        match &response.ssh {
            None => self.run_local(response).await,
            Some(target) => {
                self.run_ssh(response, target, find_in_path("sshpass"))
                    .await
            }
        }
    }

    fn timeout_secs(&self, response: &TerminalCommandResponse) -> u64 {
        response
            .terminal_timeout
            .unwrap_or(self.config.default_timeout_secs)
    }

    async fn run_local(&self, response: &TerminalCommandResponse) -> Result<Outcome, ActionError> {
        let command_text = &response.terminal_command;
        let working_dir: Option<PathBuf> = response
            .terminal_working_dir
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(expand_home);

        let mut command = Command::new("sh");
        command.arg("-c").arg(command_text);
        if let Some(dir) = &working_dir {
            command.current_dir(dir);
        }

        info!(
            command = %command_text,
            cwd = %working_dir.as_deref().unwrap_or(Path::new(".")).display(),
            "Running terminal command"
        );
        let output = run_captured(
            command,
            command_text,
            self.timeout_secs(response),
            self.config.max_output_bytes,
            &Redactor::default(),
        )
        .await?;

        Ok(Outcome::Reply(success_text(
            "Command succeeded",
            &output,
            response.terminal_return_output,
        )))
    }

    async fn run_ssh(
        &self,
        response: &TerminalCommandResponse,
        target: &SshTarget,
        sshpass: Option<PathBuf>,
    ) -> Result<Outcome, ActionError> {
        let remote = remote_command(
            &response.terminal_command,
            response.terminal_working_dir.as_deref(),
        );
        let invocation = SshInvocation::build(
            target,
            &remote,
            self.config.ssh_connect_timeout_secs,
            sshpass.as_deref(),
        )?;
        let shown = invocation.display_redacted();

        info!(
            destination = %invocation.destination(),
            port = target.port,
            command = %shown,
            "Running SSH command"
        );
        let output = run_captured(
            invocation.command(),
            &shown,
            self.timeout_secs(response),
            self.config.max_output_bytes,
            invocation.redactor(),
        )
        .await?;

        Ok(Outcome::Reply(success_text(
            &format!("Command succeeded on {}", invocation.destination()),
            &output,
            response.terminal_return_output,
        )))
    }
}

fn success_text(label: &str, output: &Captured, return_output: bool) -> String {
    if !return_output {
        return label.to_string();
    }
    let body = [output.stdout.trim(), output.stderr.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(NO_OUTPUT);
    format!("{}:\n```\n{}\n```", label, body)
}

/// Spawn `command`, capture both streams up to `limit` bytes each and wait at
/// most `timeout_secs`. The child is killed when this future is dropped or
/// times out. Every string leaving this function has passed `redactor`.
async fn run_captured(
    mut command: Command,
    shown: &str,
    timeout_secs: u64,
    limit: usize,
    redactor: &Redactor,
) -> Result<Captured, ActionError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| {
        ActionError::Execution(redactor.redact(&format!("failed to start `{}`: {}", shown, e)))
    })?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ActionError::Execution("stdout was not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ActionError::Execution("stderr was not captured".to_string()))?;

    let run = async {
        tokio::try_join!(
            read_capped(stdout, limit),
            read_capped(stderr, limit),
            child.wait()
        )
    };
    let (out, err, status) = match tokio::time::timeout(Duration::from_secs(timeout_secs), run).await
    {
        Ok(Ok(done)) => done,
        Ok(Err(e)) => return Err(ActionError::Execution(redactor.redact(&e.to_string()))),
        Err(_) => {
            warn!(command = %redactor.redact(shown), timeout_secs, "Command timed out");
            return Err(ActionError::Timeout(timeout_secs));
        }
    };

    let captured = Captured {
        stdout: redactor.redact(&String::from_utf8_lossy(&out)),
        stderr: redactor.redact(&String::from_utf8_lossy(&err)),
    };
    if status.success() {
        return Ok(captured);
    }

    let message = match status.code() {
        Some(code) => format!("`{}` exited with status {}", shown, code),
        None => format!("`{}` was terminated by a signal", shown),
    };
    warn!(command = %redactor.redact(shown), status = ?status.code(), "Command failed");
    Err(ActionError::CommandFailed {
        message: redactor.redact(&message),
        stdout: captured.stdout,
        stderr: captured.stderr,
    })
}

async fn read_capped<R: AsyncRead + Unpin>(reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    if buf.len() > limit {
        return Err(std::io::Error::other(format!(
            "output exceeded {} bytes",
            limit
        )));
    }
    Ok(buf)
}
