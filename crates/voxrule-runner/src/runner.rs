//! Script execution in throwaway scratch directories.
//!
//! Each run gets its own `remote-exec-*` directory holding a single script
//! file. The directory is a [`TempDir`], so it is removed on every exit path
//! including timeouts and spawn failures.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use voxrule_core::config::{expand_home, RunnerConfig};

use crate::error::RunnerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLanguage {
    Python,
    Node,
}

impl ScriptLanguage {
    /// Case-insensitive. `nodejs` and `javascript` are accepted for Node.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "python" => Some(ScriptLanguage::Python),
            "node" | "nodejs" | "javascript" => Some(ScriptLanguage::Node),
            _ => None,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ScriptLanguage::Python => "script.py",
            ScriptLanguage::Node => "script.js",
        }
    }
}

/// What a finished script produced. Streams are trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutput {
    pub output: String,
    pub error: String,
    /// `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

#[derive(Debug, Clone)]
pub struct ScriptRunner {
    config: RunnerConfig,
}

impl ScriptRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn default_timeout_secs(&self) -> u64 {
        self.config.default_timeout_secs
    }

    fn interpreter(&self, language: ScriptLanguage) -> &str {
        match language {
            ScriptLanguage::Python => &self.config.python_bin,
            ScriptLanguage::Node => &self.config.node_bin,
        }
    }

    fn scratch_dir(&self) -> Result<TempDir, RunnerError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("remote-exec-");
        let dir = match &self.config.temp_root {
            Some(root) => {
                let root = expand_home(root);
                std::fs::create_dir_all(&root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Run `code` with the interpreter for `language`. The child is killed
    /// when `timeout_secs` elapses.
    pub async fn run(
        &self,
        language: ScriptLanguage,
        code: &str,
        timeout_secs: u64,
    ) -> Result<ExecutionOutput, RunnerError> {
        let workdir = self.scratch_dir()?;
        let script = workdir.path().join(language.file_name());
        tokio::fs::write(&script, code).await?;

        let interpreter = self.interpreter(language);
        info!(
            ?language,
            interpreter,
            timeout_secs,
            workdir = %workdir.path().display(),
            "Executing script"
        );
        let result = execute(interpreter, &script, workdir.path(), timeout_secs).await;
        debug!(workdir = %workdir.path().display(), "Removing scratch directory");
        drop(workdir);
        result
    }
}

async fn execute(
    interpreter: &str,
    script: &Path,
    workdir: &Path,
    timeout_secs: u64,
) -> Result<ExecutionOutput, RunnerError> {
    let child = Command::new(interpreter)
        .arg(script)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| RunnerError::Spawn(format!("{}: {}", interpreter, e)))?;

    // Dropping the wait future drops the child, which kills it.
    let output = match tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        child.wait_with_output(),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            warn!(interpreter, timeout_secs, "Script timed out, child killed");
            return Err(RunnerError::Timeout(timeout_secs));
        }
    };

    Ok(ExecutionOutput {
        output: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        error: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
