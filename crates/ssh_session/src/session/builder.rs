//! Session construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::Local;
use logging::{Diagnostics, TracingDiagnostics};

use super::{COMPONENT, DEFAULT_PORT, SshSession, base_command};
use crate::compression;
use crate::error::SessionError;
use crate::options::SessionOptions;
use crate::probe::{CapabilityCheck, SystemProbe};
use crate::runner::{CommandRunner, ProcessRunner};
use crate::socket::ControlSocket;

/// Configures and establishes an [`SshSession`].
///
/// ```no_run
/// use ssh_session::SessionBuilder;
///
/// let session = SessionBuilder::new("alice", "backup.example")
///     .key("/home/alice/.ssh/backup_ed25519")
///     .compress("lzop")
///     .connect()?;
/// let pipeline = session.pipeline_command().render_shell();
/// # drop(pipeline);
/// # Ok::<(), ssh_session::SessionError>(())
/// ```
#[derive(Clone, Debug)]
pub struct SessionBuilder {
    user: String,
    host: String,
    key: Option<PathBuf>,
    port: u16,
    compress: Option<String>,
    options: SessionOptions,
    runner: Option<Arc<dyn CommandRunner>>,
    probe: Option<Arc<dyn CapabilityCheck>>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
}

impl SessionBuilder {
    /// Starts a builder for `user@host` on port 22 without compression.
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            key: None,
            port: DEFAULT_PORT,
            compress: None,
            options: SessionOptions::default(),
            runner: None,
            probe: None,
            diagnostics: None,
        }
    }

    /// Uses `key` as the private key.
    pub fn key(mut self, key: impl Into<PathBuf>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Uses `key` when given, the default credential otherwise.
    pub fn maybe_key(mut self, key: Option<&Path>) -> Self {
        self.key = key.map(Path::to_path_buf);
        self
    }

    /// Connects to `port`.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Requests a compression algorithm by name.
    pub fn compress(mut self, algorithm: impl Into<String>) -> Self {
        self.compress = Some(algorithm.into());
        self
    }

    /// Requests compression when `algorithm` is given.
    pub fn maybe_compress(mut self, algorithm: Option<&str>) -> Self {
        self.compress = algorithm.map(str::to_owned);
        self
    }

    /// Replaces the transport options.
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs transport commands with `runner` instead of spawning processes directly.
    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Answers capability questions with `probe` instead of a [`SystemProbe`].
    pub fn probe(mut self, probe: Arc<dyn CapabilityCheck>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Reports to `diagnostics` instead of `tracing`.
    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Establishes the session.
    ///
    /// The key is checked before anything runs. The liveness probe then opens
    /// the control master, and compression is negotiated last.
    pub fn connect(self) -> Result<SshSession, SessionError> {
        let Self {
            user,
            host,
            key,
            port,
            compress,
            options,
            runner,
            probe,
            diagnostics,
        } = self;

        let diagnostics: Arc<dyn Diagnostics> =
            diagnostics.unwrap_or_else(|| Arc::new(TracingDiagnostics::new()));
        let runner: Arc<dyn CommandRunner> =
            runner.unwrap_or_else(|| Arc::new(ProcessRunner::new()));

        let key = options.resolve_key(key.as_deref());
        if !key.is_file() {
            diagnostics.error(
                COMPONENT,
                &format!("{} is not a valid ssh key file...", key.display()),
            );
            return Err(SessionError::CredentialNotFound { path: key });
        }

        let socket = ControlSocket::allocate(
            &options.socket_dir,
            &options.socket_prefix,
            &user,
            &host,
            port,
            Local::now(),
        );
        let base = base_command(&options, &key, &socket, &user, &host, port);
        diagnostics.debug(COMPONENT, &format!("base command: {base}"));

        let mut session = SshSession {
            user,
            host,
            port,
            key,
            socket,
            pipeline: base.clone(),
            base,
            compression: None,
            options,
            runner,
            diagnostics,
            closed: AtomicBool::new(false),
        };
        session.probe_liveness()?;

        let probe: Arc<dyn CapabilityCheck> = probe.unwrap_or_else(|| {
            Arc::new(
                SystemProbe::new(Arc::clone(&session.runner))
                    .with_timeout(session.options.probe_timeout),
            )
        });
        let negotiation = compression::negotiate(
            compress.as_deref(),
            &session.base,
            &session.target(),
            probe.as_ref(),
            session.diagnostics.as_ref(),
        );
        session.compression = negotiation.algorithm;
        session.pipeline = negotiation.pipeline;

        session.diagnostics.info(
            COMPONENT,
            &format!(
                "connected to {} on port {} (control socket {})",
                session.target(),
                session.port,
                session.socket.path().display()
            ),
        );
        Ok(session)
    }
}
