#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! # Overview
//!
//! `ssh_session` supervises an external remote-shell program (OpenSSH by
//! default) that carries commands and bulk data streams to a remote host. A
//! session owns one multiplexed control connection, exposes the argument
//! vector that reuses it, and optionally wraps that vector in a compression
//! pipeline for send/receive transfers.
//!
//! # Design
//!
//! - [`probe`] answers whether an executable exists locally or remotely.
//! - [`compression`] validates a requested algorithm and builds the
//!   `compress | transport decompress |` fragment.
//! - [`session`] establishes the control master, hands out command vectors and
//!   tears the connection down exactly once.
//! - [`runner`] is the seam through which every external process is started,
//!   always under a deadline.
//!
//! # Invariants
//!
//! - The key file is checked before any process is spawned.
//! - The pipeline command always contains the base command unchanged.
//! - Compression failures never abort a session; they leave compression off.
//! - Closing never fails and sends the exit directive at most once.
//!
//! # Errors
//!
//! [`SessionError`] carries the two hard failures: a missing credential and a
//! failed liveness probe. Everything else is reported to the
//! [`Diagnostics`](logging::Diagnostics) collaborator.
//!
//! # Examples
//!
//! Build a receive pipeline from a session's command vector:
//!
//! ```no_run
//! use ssh_session::SshSession;
//! use std::path::Path;
//!
//! let session = SshSession::connect(
//!     "alice",
//!     "backup.example",
//!     Some(Path::new("/tmp/validkey")),
//!     22,
//!     Some("gzip"),
//! )?;
//!
//! let mut pipeline = ssh_session::CommandVector::from_tokens(["zfs", "send", "tank/data@snap", "|"]);
//! pipeline.extend(session.pipeline_command());
//! pipeline.extend(["zfs", "receive", "backup/data"]);
//! println!("{}", pipeline.render_shell());
//!
//! session.close();
//! # Ok::<(), ssh_session::SessionError>(())
//! ```

pub mod command;
pub mod compression;
mod error;
pub mod options;
pub mod probe;
pub mod runner;
pub mod session;
pub mod socket;

pub use command::CommandVector;
pub use compression::{CompressionAlgorithm, CompressionUnavailable, Negotiation};
pub use error::{ConnectFailure, SessionError, SessionErrorKind};
pub use options::SessionOptions;
pub use probe::{CapabilityCheck, ProbeTarget, SystemProbe, exists};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner, RunError};
pub use session::{DEFAULT_PORT, SessionBuilder, SshSession, with_session};
pub use socket::ControlSocket;
