//! Response Normalizer: turns executor failures into reply text.

use voxrule_core::ResponseKind;

use crate::error::ActionError;

/// Reply used when an executor task dies without producing a result.
pub const GENERIC_FAILURE: &str = "rule execution failed";

/// User-facing reply for a failed rule of the given kind.
pub fn failure_reply(kind: ResponseKind, err: &ActionError) -> String {
    match kind {
        ResponseKind::LocalCode | ResponseKind::SandboxCode => {
            let message = match err {
                ActionError::Script(msg) => msg.clone(),
                other => other.to_string(),
            };
            format!("execution failed: {}", message)
        }
        ResponseKind::TerminalCommand => command_failure(err),
        ResponseKind::BuiltInCommand => format!("built-in command failed: {}", err),
        _ => format!("{}: {}", GENERIC_FAILURE, err),
    }
}

/// `Command failed: <error>` followed by fenced stderr and stdout blocks.
fn command_failure(err: &ActionError) -> String {
    let mut text = format!("Command failed: {}", err);
    if let ActionError::CommandFailed { stdout, stderr, .. } = err {
        for (label, output) in [("stderr", stderr), ("stdout", stdout)] {
            let output = output.trim();
            if !output.is_empty() {
                text.push_str(&format!("\n\n{}:\n```\n{}\n```", label, output));
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_failures() {
        let err = ActionError::Script("Runtime error: boom".to_string());
        assert_eq!(
            failure_reply(ResponseKind::LocalCode, &err),
            "execution failed: Runtime error: boom"
        );
        assert_eq!(
            failure_reply(ResponseKind::SandboxCode, &ActionError::Timeout(30)),
            "execution failed: Timed out after 30 seconds"
        );
    }

    #[test]
    fn test_command_failure_blocks() {
        let err = ActionError::CommandFailed {
            message: "`ls /nope` exited with status 2".to_string(),
            stdout: "\n".to_string(),
            stderr: "  ls: /nope: No such file  \n".to_string(),
        };
        assert_eq!(
            failure_reply(ResponseKind::TerminalCommand, &err),
            "Command failed: `ls /nope` exited with status 2\n\nstderr:\n```\nls: /nope: No such file\n```"
        );

        let err = ActionError::CommandFailed {
            message: "m".to_string(),
            stdout: "out".to_string(),
            stderr: "err".to_string(),
        };
        assert_eq!(
            failure_reply(ResponseKind::TerminalCommand, &err),
            "Command failed: m\n\nstderr:\n```\nerr\n```\n\nstdout:\n```\nout\n```"
        );
    }

    #[test]
    fn test_terminal_timeout_and_config_errors() {
        assert_eq!(
            failure_reply(ResponseKind::TerminalCommand, &ActionError::Timeout(5)),
            "Command failed: Timed out after 5 seconds"
        );
        let err = ActionError::Configuration("terminalCommand is required".to_string());
        assert!(failure_reply(ResponseKind::TerminalCommand, &err).starts_with("Command failed:"));
    }

    #[test]
    fn test_other_kinds_use_generic_prefix() {
        let err = ActionError::Network("HTTP 500".to_string());
        assert_eq!(
            failure_reply(ResponseKind::ApiCall, &err),
            "rule execution failed: Network error: HTTP 500"
        );
        assert_eq!(
            failure_reply(ResponseKind::BuiltInCommand, &ActionError::Execution("offline".into())),
            "built-in command failed: Execution failed: offline"
        );
    }
}
