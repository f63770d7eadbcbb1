//! Bounded execution of external programs.
//!
//! Every transport invocation (liveness probe, capability probe, close
//! directive) runs to completion under a deadline. The [`CommandRunner`] trait
//! is the seam tests use to substitute scripted outcomes.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

/// Outcome of a command that ran to completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output, verbatim.
    pub stdout: String,
    /// Captured standard error with trailing whitespace removed.
    pub stderr: String,
}

impl CommandOutput {
    /// Creates an output with the given exit code and nothing captured.
    #[must_use]
    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    /// Reports whether the process exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Failure to obtain a [`CommandOutput`].
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The argument vector had no program token.
    #[error("cannot run an empty command")]
    EmptyCommand,
    /// The program could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The program did not finish before the deadline and was killed.
    #[error("Command '{program}' timed out after {} seconds", format_seconds(.timeout))]
    TimedOut {
        /// Program that exceeded its deadline.
        program: String,
        /// Deadline that expired.
        timeout: Duration,
    },
    /// Waiting for the child failed.
    #[error("failed to wait for child process: {source}")]
    Wait {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Standard output or standard error could not be captured.
    #[error("failed to capture process output: {source}")]
    Capture {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The session owning the control connection was already closed.
    #[error("control connection already closed")]
    SessionClosed,
}

impl RunError {
    /// Reports whether the failure was a deadline expiry.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

fn format_seconds(timeout: &Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        timeout.as_secs().to_string()
    } else {
        timeout.as_secs_f64().to_string()
    }
}

/// Runs argument vectors as external processes.
pub trait CommandRunner: Send + Sync + fmt::Debug {
    /// Runs `argv` (program followed by arguments) and waits at most `timeout`.
    fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput, RunError>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
///
/// Stdin is attached to the null device. Stdout and stderr each go to an
/// anonymous temporary file rather than a pipe: a control master that
/// detaches into the background may inherit the descriptors, and reading a
/// file never blocks on them.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Creates the runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput, RunError> {
        let (program, args) = argv.split_first().ok_or(RunError::EmptyCommand)?;

        let (mut stdout_file, stdout) = capture_file()?;
        let (mut stderr_file, stderr) = capture_file()?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: program.clone(),
                source,
            })?;
        let mut child = ReapOnDrop(child);

        let status = match child.0.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.0.kill();
                return Err(RunError::TimedOut {
                    program: program.clone(),
                    timeout,
                });
            }
            Err(source) => return Err(RunError::Wait { source }),
        };

        let stdout = read_back(&mut stdout_file)?;
        let stderr = read_back(&mut stderr_file)?;

        Ok(CommandOutput {
            code: status.code(),
            stdout,
            stderr: stderr.trim_end().to_owned(),
        })
    }
}

/// Anonymous temporary file plus a handle to it the child can write to.
fn capture_file() -> Result<(File, Stdio), RunError> {
    let file = tempfile::tempfile().map_err(|source| RunError::Capture { source })?;
    let child_end = file
        .try_clone()
        .map_err(|source| RunError::Capture { source })?;
    Ok((file, Stdio::from(child_end)))
}

fn read_back(file: &mut File) -> Result<String, RunError> {
    let mut captured = String::new();
    file.seek(SeekFrom::Start(0))
        .and_then(|_| file.read_to_string(&mut captured))
        .map_err(|source| RunError::Capture { source })?;
    Ok(captured)
}

/// Kills and reaps a child that is still running when the guard is dropped.
struct ReapOnDrop(Child);

impl Drop for ReapOnDrop {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            let _ = self.0.kill();
        }

        let _ = self.0.wait();
    }
}
