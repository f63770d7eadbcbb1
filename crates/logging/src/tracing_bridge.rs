//! crates/logging/src/tracing_bridge.rs
//! Bridge between the diagnostics collaborator and the tracing crate.
//!
//! [`TracingDiagnostics`] turns recorded [`DiagnosticEvent`]s into `tracing`
//! events under the `ssh_session` target, with the reporting component attached
//! as a field. The `init_*` helpers install a stderr formatting subscriber whose
//! filter comes from `RUST_LOG` when set and from [`VerbosityConfig`] otherwise.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{VerbosityConfig, init_tracing};
//!
//! init_tracing(VerbosityConfig::from_verbose_level(2));
//! tracing::debug!(target: "ssh_session", "probing remote host");
//! ```

use super::config::VerbosityConfig;
use super::diagnostics::{DiagnosticEvent, Diagnostics, Severity};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Diagnostics sink that forwards every event to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl TracingDiagnostics {
    /// Creates the forwarding sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        let DiagnosticEvent {
            severity,
            component,
            message,
        } = event;
        match severity {
            Severity::Debug => tracing::debug!(target: "ssh_session", component, "{message}"),
            Severity::Info => tracing::info!(target: "ssh_session", component, "{message}"),
            Severity::Warning => tracing::warn!(target: "ssh_session", component, "{message}"),
            Severity::Error => tracing::error!(target: "ssh_session", component, "{message}"),
        }
    }
}

fn env_filter(config: VerbosityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.filter_directive()))
}

/// Installs the global subscriber, returning an error when one already exists.
pub fn try_init_tracing(config: VerbosityConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
}

/// Initialize tracing for the process.
///
/// A subscriber installed earlier (for example by an embedding application)
/// is left in place.
pub fn init_tracing(config: VerbosityConfig) {
    let _ = try_init_tracing(config);
}
