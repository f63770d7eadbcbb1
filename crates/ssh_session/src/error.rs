//! Hard failures that abort session construction.
//!
//! Soft failures (compression) are not errors at this level; see
//! [`CompressionUnavailable`](crate::CompressionUnavailable).

use std::path::PathBuf;
use std::time::Duration;

/// Why the liveness probe did not succeed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConnectFailure {
    /// The transport exited unsuccessfully; `stderr` is its captured output.
    #[error("{}", describe_exit(.code, .stderr))]
    Exited {
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
    /// The probe did not finish in time.
    #[error("{description}")]
    TimedOut {
        /// Deadline that expired.
        timeout: Duration,
        /// Rendered timeout description.
        description: String,
    },
    /// The transport could not be started or supervised.
    #[error("{0}")]
    Launch(String),
}

fn describe_exit(code: &Option<i32>, stderr: &str) -> String {
    if !stderr.is_empty() {
        return stderr.to_owned();
    }
    match code {
        Some(code) => format!("transport exited with status {code}"),
        None => "transport terminated by signal".to_owned(),
    }
}

/// Coarse classification of [`SessionError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    /// See [`SessionError::CredentialNotFound`].
    CredentialNotFound,
    /// See [`SessionError::ConnectionFailed`].
    ConnectionFailed,
}

/// Error returned when a session cannot be established.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The resolved key is not a regular file. No connection was attempted.
    #[error("{} is not a valid ssh key file", .path.display())]
    CredentialNotFound {
        /// Key path after resolution.
        path: PathBuf,
    },
    /// The liveness probe failed. Any partial connection was torn down.
    #[error("Error while connecting to {target}")]
    ConnectionFailed {
        /// `user@host` of the endpoint.
        target: String,
        /// Diagnostic captured from the transport.
        #[source]
        cause: ConnectFailure,
    },
}

impl SessionError {
    /// Returns the kind of failure.
    #[must_use]
    pub const fn kind(&self) -> SessionErrorKind {
        match self {
            Self::CredentialNotFound { .. } => SessionErrorKind::CredentialNotFound,
            Self::ConnectionFailed { .. } => SessionErrorKind::ConnectionFailed,
        }
    }
}
