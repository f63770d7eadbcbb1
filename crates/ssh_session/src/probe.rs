//! Executable availability checks on either end of a connection.
//!
//! A probe answers "is this program installed?" with a plain `bool`. Anything
//! that prevents a definite yes (missing binary, unreachable host, timeout,
//! spawn failure) counts as "not found".

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::command::CommandVector;
use crate::runner::{CommandRunner, ProcessRunner};

/// Deadline applied to a single remote existence check.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a probe runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeTarget<'a> {
    /// The machine this process runs on.
    Local,
    /// A remote host, reached by appending the check to this base command.
    Remote(&'a CommandVector),
}

/// Answers whether a named executable exists on a target.
pub trait CapabilityCheck: Send + Sync + fmt::Debug {
    /// Returns `true` only when `name` is known to be runnable on `target`.
    fn exists(&self, name: &str, target: ProbeTarget<'_>) -> bool;
}

/// Reports whether `name` can be passed to a remote shell unquoted.
///
/// Probes only ever ask about plain program names; anything else is refused
/// before a process is started.
fn is_plain_program_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'+' | b'-'))
}

/// Tokens appended to a base command to look `name` up on the remote host.
#[must_use]
pub fn remote_check_args(name: &str) -> [String; 3] {
    ["command".to_owned(), "-v".to_owned(), name.to_owned()]
}

/// [`CapabilityCheck`] that inspects the real system.
///
/// Local lookups search `PATH` (or an explicit search path) with the `which`
/// crate. Remote lookups run `command -v <name>` through the base command.
#[derive(Clone, Debug)]
pub struct SystemProbe {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    search_path: Option<OsString>,
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new(Arc::new(ProcessRunner::new()))
    }
}

impl SystemProbe {
    /// Creates a probe that runs remote checks with `runner`.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: DEFAULT_PROBE_TIMEOUT,
            search_path: None,
        }
    }

    /// Overrides the deadline for remote checks.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restricts local lookups to `path` instead of the `PATH` variable.
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    fn exists_locally(&self, name: &str) -> bool {
        match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                which::which_in(name, Some(paths), cwd).is_ok()
            }
            None => which::which(name).is_ok(),
        }
    }

    fn exists_remotely(&self, name: &str, base: &CommandVector) -> bool {
        let argv = base.with_args(remote_check_args(name));
        match self.runner.run(argv.as_slice(), self.timeout) {
            Ok(output) => output.success(),
            Err(_) => false,
        }
    }
}

impl CapabilityCheck for SystemProbe {
    fn exists(&self, name: &str, target: ProbeTarget<'_>) -> bool {
        if !is_plain_program_name(name) {
            return false;
        }
        match target {
            ProbeTarget::Local => self.exists_locally(name),
            ProbeTarget::Remote(base) => self.exists_remotely(name, base),
        }
    }
}

/// Checks `name` on `target` with a [`SystemProbe`] built around `runner`.
pub fn exists(name: &str, target: ProbeTarget<'_>, runner: Arc<dyn CommandRunner>) -> bool {
    SystemProbe::new(runner).exists(name, target)
}
