//! External command execution.
//!
//! Commands run with the inherited process environment plus an explicit set
//! of [`Environment`] overrides. Nothing here mutates the environment of the
//! current process, so concurrent scans with different overrides stay
//! isolated. No timeout is imposed: a hung tool hangs the caller. Dropping
//! the future of [`execute`] kills the child.

use crate::error::{ChainjackError, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Environment variable overrides applied on top of the inherited environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Runs `program args...` in `working_dir` and captures both streams.
///
/// When `fail_on_nonzero` is set, a nonzero exit becomes
/// [`ChainjackError::Execution`]; otherwise the caller inspects
/// [`CommandOutput::exit_code`]. A process killed by a signal reports `-1`.
pub async fn execute(
    program: &str,
    args: &[&str],
    working_dir: &Path,
    env: &Environment,
    fail_on_nonzero: bool,
) -> Result<CommandOutput> {
    let command_string = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");

    let output = Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .envs(env.iter())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ChainjackError::Spawn {
            command: command_string.clone(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let exit_code = output.status.code().unwrap_or(-1);

    if fail_on_nonzero && exit_code != 0 {
        return Err(ChainjackError::Execution {
            command: command_string,
            exit_code,
            stdout,
            stderr,
        });
    }

    debug!(
        "Executed command=\"{}\" exit code=\"{}\" stderr=\"{}\" stdout=\"{}\"",
        command_string, exit_code, stderr, stdout
    );

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_code,
    })
}
