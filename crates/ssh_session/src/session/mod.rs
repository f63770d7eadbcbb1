//! Multiplexed control connection to one `user@host:port`.
//!
//! An [`SshSession`] owns exactly one control master, addressed by its
//! [`ControlSocket`]. Every remote invocation is the session's base command
//! followed by the remote tokens, so authentication happens once, during the
//! liveness probe in [`SessionBuilder::connect`].
//!
//! Closing is idempotent and best-effort. [`SshSession::close`] may be called
//! any number of times; the exit directive is sent at most once, errors are
//! only reported to diagnostics, and `Drop` closes a session the caller forgot
//! about. [`with_session`] is the scoped form that always closes.

mod builder;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use logging::Diagnostics;

use crate::command::CommandVector;
use crate::compression::CompressionAlgorithm;
use crate::error::{ConnectFailure, SessionError};
use crate::options::SessionOptions;
use crate::runner::{CommandOutput, CommandRunner, RunError};
use crate::socket::ControlSocket;

pub use builder::SessionBuilder;

/// Standard ssh port.
pub const DEFAULT_PORT: u16 = 22;

/// Remote command used to confirm the connection works.
const LIVENESS_COMMAND: &str = "ls";

const COMPONENT: &str = "session";

/// Builds the transport invocation shared by every command of a session.
///
/// `[program, -i, key, -o, ControlMaster=auto, -o, ControlPersist=<persist>,
/// -o, ControlPath=<socket>, (-o, <extra>)*, -p, port, user@host]`
#[must_use]
pub fn base_command(
    options: &SessionOptions,
    key: &Path,
    socket: &ControlSocket,
    user: &str,
    host: &str,
    port: u16,
) -> CommandVector {
    let mut command = CommandVector::new(options.program.as_str());
    command
        .extend(["-i".to_owned(), key.to_string_lossy().into_owned()])
        .extend(["-o", "ControlMaster=auto"])
        .extend(["-o".to_owned(), format!("ControlPersist={}", options.control_persist)])
        .extend(["-o".to_owned(), socket.control_path_option()]);
    for option in &options.extra_options {
        command.extend(["-o", option.as_str()]);
    }
    command
        .extend(["-p".to_owned(), port.to_string()])
        .push(format!("{user}@{host}"));
    command
}

/// Live multiplexed connection to a remote host.
#[derive(Debug)]
pub struct SshSession {
    user: String,
    host: String,
    port: u16,
    key: PathBuf,
    socket: ControlSocket,
    base: CommandVector,
    compression: Option<CompressionAlgorithm>,
    pipeline: CommandVector,
    options: SessionOptions,
    runner: Arc<dyn CommandRunner>,
    diagnostics: Arc<dyn Diagnostics>,
    closed: AtomicBool,
}

impl SshSession {
    /// Connects with default options, the system transport and `tracing` diagnostics.
    ///
    /// `key` falls back to `~/.ssh/id_rsa`. `compress` names an algorithm
    /// from [`CompressionAlgorithm`]; unusable requests leave compression off.
    pub fn connect(
        user: &str,
        host: &str,
        key: Option<&Path>,
        port: u16,
        compress: Option<&str>,
    ) -> Result<Self, SessionError> {
        SessionBuilder::new(user, host)
            .maybe_key(key)
            .port(port)
            .maybe_compress(compress)
            .connect()
    }

    /// Starts configuring a session to `user@host`.
    pub fn builder(user: impl Into<String>, host: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(user, host)
    }

    /// Remote user name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Remote host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Remote port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Private key passed with `-i`.
    #[must_use]
    pub fn key(&self) -> &Path {
        &self.key
    }

    /// `user@host`.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Control socket path of this session.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        self.socket.path()
    }

    /// Compression in effect for [`pipeline_command`](Self::pipeline_command).
    #[must_use]
    pub const fn compression(&self) -> Option<CompressionAlgorithm> {
        self.compression
    }

    /// Transport invocation; append remote tokens to run a command.
    #[must_use]
    pub fn base_command(&self) -> &CommandVector {
        &self.base
    }

    /// Base command wrapped in the compression stages, or the base command
    /// itself when compression is off.
    #[must_use]
    pub fn pipeline_command(&self) -> &CommandVector {
        &self.pipeline
    }

    /// Returns `base + tokens` without running it.
    #[must_use]
    pub fn remote_command<I, S>(&self, tokens: I) -> CommandVector
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base.with_args(tokens)
    }

    /// Options the session was created with.
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Reports whether [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Runs `tokens` on the remote host through the control connection.
    ///
    /// The probe timeout applies. A closed session refuses to run anything,
    /// since the transport would silently start a new control master.
    pub fn run<I, S>(&self, tokens: I) -> Result<CommandOutput, RunError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.is_closed() {
            return Err(RunError::SessionClosed);
        }
        let argv = self.remote_command(tokens);
        self.diagnostics
            .debug(COMPONENT, &format!("running {argv}"));
        self.runner.run(argv.as_slice(), self.options.probe_timeout)
    }

    /// Asks the control master whether it is still running (`-O check`).
    pub fn check(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        let argv = self.remote_command(["-O", "check"]);
        matches!(
            self.runner.run(argv.as_slice(), self.options.probe_timeout),
            Ok(output) if output.success()
        )
    }

    /// Terminates the control master (`-O exit`) and removes the socket.
    ///
    /// Never fails. Only the first call does any work.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let argv = self.remote_command(["-O", "exit"]);
        match self.runner.run(argv.as_slice(), self.options.close_timeout) {
            Ok(output) if output.success() => self.diagnostics.debug(
                COMPONENT,
                &format!("closed control connection to {}", self.target()),
            ),
            Ok(output) => self.diagnostics.debug(
                COMPONENT,
                &format!(
                    "exit directive for {} returned {:?}: {}",
                    self.target(),
                    output.code,
                    output.stderr
                ),
            ),
            Err(err) => self.diagnostics.debug(
                COMPONENT,
                &format!("exit directive for {} failed: {err}", self.target()),
            ),
        }

        match self.socket.remove_stale() {
            Ok(true) => self.diagnostics.debug(
                COMPONENT,
                &format!("removed leftover socket {}", self.socket.path().display()),
            ),
            Ok(false) => {}
            Err(err) => self.diagnostics.debug(
                COMPONENT,
                &format!(
                    "could not remove socket {}: {err}",
                    self.socket.path().display()
                ),
            ),
        }
    }

    fn probe_liveness(&self) -> Result<(), SessionError> {
        let argv = self.remote_command([LIVENESS_COMMAND]);
        let cause = match self.runner.run(argv.as_slice(), self.options.connect_timeout) {
            Ok(output) if output.success() => return Ok(()),
            Ok(output) => ConnectFailure::Exited {
                code: output.code,
                stderr: output.stderr,
            },
            Err(err) => {
                let description = err.to_string();
                match err {
                    RunError::TimedOut { timeout, .. } => ConnectFailure::TimedOut {
                        timeout,
                        description,
                    },
                    _ => ConnectFailure::Launch(description),
                }
            }
        };

        let target = self.target();
        self.diagnostics.error(
            COMPONENT,
            &format!("Error while connecting to {target}: {cause}..."),
        );
        self.close();
        Err(SessionError::ConnectionFailed { target, cause })
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Connects, hands the session to `f`, and closes it afterwards.
///
/// The session is closed on every exit path, including a panic inside `f`.
pub fn with_session<T, F>(builder: SessionBuilder, f: F) -> Result<T, SessionError>
where
    F: FnOnce(&SshSession) -> T,
{
    let session = builder.connect()?;
    let value = f(&session);
    session.close();
    Ok(value)
}

#[cfg(test)]
mod tests;
