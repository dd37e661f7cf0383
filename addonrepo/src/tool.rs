//! Running external command-line tools.

use std::io;
use std::process::{Command, Output};

use tracing::debug;

use crate::publisher::{PublishError, PublishResult};

/// Run a command to completion and return its trimmed stdout.
///
/// A program that cannot be started is [`PublishError::ToolNotFound`]; a
/// non-zero exit is [`PublishError::ToolFailed`] carrying stderr.
pub(crate) fn run_tool(tool: &str, command: &mut Command) -> PublishResult<String> {
    let output = spawn(tool, command)?;

    if !output.status.success() {
        return Err(failure(tool, &output));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a command and return its raw output regardless of exit status.
pub(crate) fn spawn(tool: &str, command: &mut Command) -> PublishResult<Output> {
    debug!("Running {:?}", command);
    command.output().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PublishError::ToolNotFound {
            tool: tool.to_string(),
            source: e,
        },
        _ => PublishError::ToolFailed {
            tool: tool.to_string(),
            stderr: e.to_string(),
        },
    })
}

/// Build a [`PublishError::ToolFailed`] from a finished command.
pub(crate) fn failure(tool: &str, output: &Output) -> PublishError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stderr = if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    };
    PublishError::ToolFailed {
        tool: tool.to_string(),
        stderr,
    }
}
