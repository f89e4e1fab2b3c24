//! Command invocation.

use crate::core::error::{HarnessError, HarnessResult};
use std::path::Path;
use std::process::Command;
use std::time::Instant;

/// Captured result of an external command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a command that exited with code 0.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Output of a command that exited with the given code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with code 0.
    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Best diagnostic for a failed command: trimmed stderr, or the exit status.
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.status {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Capability to run an external program and capture its output.
///
/// A non-zero exit is reported through [`CommandOutput::status`], not as an
/// error; `Err` means the program could not be run at all.
pub trait CommandRunner {
    /// Run `program` with `args` in `cwd`, blocking until it exits.
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> HarnessResult<CommandOutput>;
}

/// Runs commands as child processes of the harness.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> HarnessResult<CommandOutput> {
        let start = Instant::now();
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|err| HarnessError::ExternalCommandFailed {
                command: command_line(program, args),
                detail: err.to_string(),
            })?;

        log::debug!(
            "{} exited with {} after {}ms",
            program,
            output.status,
            start.elapsed().as_millis()
        );

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Render a program and its arguments as one line for reports.
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
