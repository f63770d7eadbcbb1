#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` provides the diagnostics collaborator that the ssh session
//! components report through. Instead of reaching for a process-wide logger,
//! every component receives an `Arc<dyn Diagnostics>` and records
//! [`DiagnosticEvent`]s on it.
//!
//! # Design
//!
//! - [`TracingDiagnostics`] forwards events to the `tracing` macros so they reach
//!   whichever subscriber the embedding program installed.
//! - [`EventBuffer`] keeps events in memory. Tests use it to assert on warnings
//!   without installing a subscriber.
//! - [`VerbosityConfig`] maps a `-v` style count onto a `tracing` level, and
//!   [`init_tracing`] installs a formatting subscriber filtered by it.
//!
//! # Examples
//!
//! ```
//! use logging::{Diagnostics, EventBuffer, Severity};
//!
//! let buffer = EventBuffer::new();
//! buffer.warn("compression", "lzop missing, continuing without compression");
//!
//! let events = buffer.drain_events();
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].severity, Severity::Warning);
//! ```

mod config;
mod diagnostics;
mod tracing_bridge;

pub use config::VerbosityConfig;
pub use diagnostics::{DiagnosticEvent, Diagnostics, EventBuffer, Severity};
pub use tracing_bridge::{TracingDiagnostics, init_tracing, try_init_tracing};
