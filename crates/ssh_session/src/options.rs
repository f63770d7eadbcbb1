//! Tunables shared by every session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::probe::DEFAULT_PROBE_TIMEOUT;
use crate::socket::{DEFAULT_SOCKET_DIR, DEFAULT_SOCKET_PREFIX};

/// Transport program invoked when none is configured.
pub const DEFAULT_PROGRAM: &str = "ssh";

/// Idle period the control master survives after its last client.
pub const DEFAULT_CONTROL_PERSIST: &str = "1m";

/// Deadline for the liveness probe run while connecting.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for the close directive.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Credential used when a session is created without an explicit key.
pub const DEFAULT_KEY_RELATIVE_TO_HOME: &str = ".ssh/id_rsa";

/// Transport settings applied to a session.
///
/// The defaults reproduce the invocation
/// `ssh -i <key> -o ControlMaster=auto -o ControlPersist=1m -o ControlPath=<socket> -p <port> user@host`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionOptions {
    /// Remote-shell program.
    pub program: String,
    /// `ControlPersist` value.
    pub control_persist: String,
    /// Directory holding control sockets.
    pub socket_dir: PathBuf,
    /// File name prefix of control sockets.
    pub socket_prefix: String,
    /// Deadline for the liveness probe.
    pub connect_timeout: Duration,
    /// Deadline for each remote capability probe and one-shot command.
    pub probe_timeout: Duration,
    /// Deadline for the close directive.
    pub close_timeout: Duration,
    /// Additional `-o` values, placed after the control options.
    pub extra_options: Vec<String>,
    /// Key used when the caller does not name one. `None` means `~/.ssh/id_rsa`.
    pub default_key: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_owned(),
            control_persist: DEFAULT_CONTROL_PERSIST.to_owned(),
            socket_dir: PathBuf::from(DEFAULT_SOCKET_DIR),
            socket_prefix: DEFAULT_SOCKET_PREFIX.to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            extra_options: Vec::new(),
            default_key: None,
        }
    }
}

impl SessionOptions {
    /// Sets the remote-shell program.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the `ControlPersist` value.
    pub fn with_control_persist(mut self, persist: impl Into<String>) -> Self {
        self.control_persist = persist.into();
        self
    }

    /// Sets the control socket directory.
    pub fn with_socket_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.socket_dir = dir.into();
        self
    }

    /// Sets the control socket prefix.
    pub fn with_socket_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.socket_prefix = prefix.into();
        self
    }

    /// Sets the liveness probe deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the capability probe deadline.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the close deadline.
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Appends an extra `-o` option value such as `BatchMode=yes`.
    pub fn push_option(mut self, option: impl Into<String>) -> Self {
        self.extra_options.push(option.into());
        self
    }

    /// Sets the fallback credential.
    pub fn with_default_key(mut self, key: impl Into<PathBuf>) -> Self {
        self.default_key = Some(key.into());
        self
    }

    /// Resolves the credential for a session.
    ///
    /// An explicit key wins, then [`default_key`](Self::default_key), then
    /// `~/.ssh/id_rsa`. Without a home directory the relative path is returned
    /// unchanged and the existence check rejects it.
    pub fn resolve_key(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(key) = explicit {
            return key.to_path_buf();
        }
        if let Some(key) = &self.default_key {
            return key.clone();
        }
        dirs::home_dir().map_or_else(
            || PathBuf::from("~").join(DEFAULT_KEY_RELATIVE_TO_HOME),
            |home| home.join(DEFAULT_KEY_RELATIVE_TO_HOME),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_transport() {
        let options = SessionOptions::default();
        assert_eq!(options.program, "ssh");
        assert_eq!(options.control_persist, "1m");
        assert_eq!(options.socket_dir, PathBuf::from("/tmp"));
        assert_eq!(options.socket_prefix, "pyznap");
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
        assert_eq!(options.probe_timeout, Duration::from_secs(10));
        assert_eq!(options.close_timeout, Duration::from_secs(5));
        assert!(options.extra_options.is_empty());
    }

    #[test]
    fn explicit_key_wins() {
        let options = SessionOptions::default().with_default_key("/etc/backup/key");
        assert_eq!(
            options.resolve_key(Some(Path::new("/tmp/validkey"))),
            PathBuf::from("/tmp/validkey")
        );
        assert_eq!(options.resolve_key(None), PathBuf::from("/etc/backup/key"));
    }

    #[test]
    fn fallback_key_lives_under_ssh_directory() {
        let resolved = SessionOptions::default().resolve_key(None);
        assert!(resolved.ends_with(".ssh/id_rsa"));
    }

    #[test]
    fn builder_setters_chain() {
        let options = SessionOptions::default()
            .with_program("/usr/local/bin/ssh")
            .with_control_persist("30s")
            .with_socket_dir("/run/user/1000")
            .with_socket_prefix("backup")
            .with_connect_timeout(Duration::from_secs(3))
            .with_probe_timeout(Duration::from_secs(2))
            .with_close_timeout(Duration::from_secs(1))
            .push_option("BatchMode=yes");

        assert_eq!(options.program, "/usr/local/bin/ssh");
        assert_eq!(options.control_persist, "30s");
        assert_eq!(options.socket_dir, PathBuf::from("/run/user/1000"));
        assert_eq!(options.socket_prefix, "backup");
        assert_eq!(options.extra_options, ["BatchMode=yes"]);
    }
}
