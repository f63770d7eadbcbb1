//! Control socket paths for multiplexed connections.
//!
//! A path is derived from the endpoint and the creation time, formatted as
//! `{dir}/{prefix}_{user}@{host}:{port}_{YYYY-MM-DD_HH:MM:SS}`. Paths handed
//! out by this process are remembered, so two sessions created in the same
//! second for the same endpoint get distinct paths (`.1`, `.2`, ... suffixes).

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, PoisonError};

use chrono::{DateTime, Local};

/// Directory control sockets are created in unless configured otherwise.
pub const DEFAULT_SOCKET_DIR: &str = "/tmp";

/// File name prefix for control sockets.
pub const DEFAULT_SOCKET_PREFIX: &str = "pyznap";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

static ISSUED: LazyLock<Mutex<HashSet<PathBuf>>> = LazyLock::new(Mutex::default);

/// Identity of a control socket file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ControlSocket {
    path: PathBuf,
}

impl ControlSocket {
    /// Returns the path for `user@host:port` at `now` without reserving it.
    #[must_use]
    pub fn base_path(
        dir: &Path,
        prefix: &str,
        user: &str,
        host: &str,
        port: u16,
        now: DateTime<Local>,
    ) -> PathBuf {
        dir.join(format!(
            "{prefix}_{user}@{host}:{port}_{}",
            now.format(TIMESTAMP_FORMAT)
        ))
    }

    /// Reserves a path no other session in this process has been given.
    #[must_use]
    pub fn allocate(
        dir: &Path,
        prefix: &str,
        user: &str,
        host: &str,
        port: u16,
        now: DateTime<Local>,
    ) -> Self {
        let base = Self::base_path(dir, prefix, user, host, port, now);
        let mut issued = ISSUED.lock().unwrap_or_else(PoisonError::into_inner);

        let mut candidate = base.clone();
        let mut attempt = 0_u32;
        while issued.contains(&candidate) {
            attempt += 1;
            let mut name = base.clone().into_os_string();
            name.push(format!(".{attempt}"));
            candidate = PathBuf::from(name);
        }
        issued.insert(candidate.clone());

        Self { path: candidate }
    }

    /// Path passed to the transport as `ControlPath`.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `ControlPath=<path>` option value.
    #[must_use]
    pub fn control_path_option(&self) -> String {
        format!("ControlPath={}", self.path.display())
    }

    /// Reports whether the socket file is present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.symlink_metadata().is_ok()
    }

    /// Unlinks the socket file if the transport left it behind.
    ///
    /// A missing file is not an error.
    pub fn remove_stale(&self) -> io::Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error),
        }
    }
}
