//! SSH invocation building and secret redaction.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use voxrule_core::config::expand_home;
use voxrule_core::{SshAuthMethod, SshTarget};

use crate::error::ActionError;

pub const SSHPASS_MISSING: &str = "SSH password authentication requires sshpass: \
     brew install sshpass (macOS) or sudo apt-get install sshpass (Debian/Ubuntu)";

const PLACEHOLDER: &str = "***";

/// Replaces known secrets with a placeholder.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    secrets: Vec<String>,
}

impl Redactor {
    pub fn new<'a>(secrets: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        Self {
            secrets: secrets
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn redact(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), PLACEHOLDER))
    }
}

/// A fully resolved `ssh` (or `sshpass ssh`) process invocation.
///
/// The password never appears in `args`; it reaches `sshpass` through the
/// `SSHPASS` environment variable.
#[derive(Clone)]
pub struct SshInvocation {
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    destination: String,
    redactor: Redactor,
}

impl SshInvocation {
    /// Build the invocation for `target`. `sshpass` is the resolved helper
    /// binary, required for password authentication.
    pub fn build(
        target: &SshTarget,
        remote_command: &str,
        connect_timeout_secs: u64,
        sshpass: Option<&Path>,
    ) -> Result<Self, ActionError> {
        if target.host.is_empty() || target.username.is_empty() {
            return Err(ActionError::Configuration(
                "SSH host and username are required".to_string(),
            ));
        }
        let destination = format!("{}@{}", target.username, target.host);
        let redactor = Redactor::new([target.password.as_deref(), target.passphrase.as_deref()]);

        let mut ssh_args = Vec::new();
        let mut env = Vec::new();
        let program = match target.auth_method {
            SshAuthMethod::Key => {
                let key = target
                    .private_key_path
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| {
                        ActionError::Configuration(
                            "SSH key authentication requires privateKeyPath".to_string(),
                        )
                    })?;
                ssh_args.push("-i".to_string());
                ssh_args.push(expand_home(key).to_string_lossy().into_owned());
                if target.passphrase.as_deref().is_some_and(|p| !p.is_empty()) {
                    env.push(("SSH_ASKPASS".to_string(), String::new()));
                    env.push(("DISPLAY".to_string(), String::new()));
                    env.push(("SSH_ASKPASS_REQUIRE".to_string(), "never".to_string()));
                }
                PathBuf::from("ssh")
            }
            SshAuthMethod::Password => {
                let password = target
                    .password
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| {
                        ActionError::Configuration(
                            "SSH password authentication requires a password".to_string(),
                        )
                    })?;
                let sshpass = sshpass
                    .ok_or_else(|| ActionError::Configuration(SSHPASS_MISSING.to_string()))?;
                env.push(("SSHPASS".to_string(), password.to_string()));
                ssh_args.push("-e".to_string());
                ssh_args.push("ssh".to_string());
                sshpass.to_path_buf()
            }
        };

        ssh_args.extend([
            "-p".to_string(),
            target.port.to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", connect_timeout_secs),
            destination.clone(),
            remote_command.to_string(),
        ]);

        Ok(Self {
            program,
            args: ssh_args,
            env,
            destination,
            redactor,
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Shell-style rendering for logs and errors, with secrets replaced.
    pub fn display_redacted(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().map(|a| shell_quote(a)));
        self.redactor.redact(&parts.join(" "))
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }
}

// Secrets live in `env`; keep them out of `{:?}`.
impl std::fmt::Debug for SshInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshInvocation")
            .field("command", &self.display_redacted())
            .finish()
    }
}

/// Prefix `command` with a directory change when a working directory other
/// than this process's own is configured.
pub fn remote_command(command: &str, working_dir: Option<&str>) -> String {
    let cwd = std::env::current_dir().ok();
    match working_dir.filter(|d| !d.is_empty()) {
        Some(dir) if cwd.as_deref() != Some(Path::new(dir)) => {
            format!("cd \"{}\" && {}", dir, command)
        }
        _ => command.to_string(),
    }
}

/// Locate an executable on `PATH`.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=@:~".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
