//! crates/logging/src/diagnostics.rs
//! Diagnostic events and the collaborator trait components report through.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Severity attached to a [`DiagnosticEvent`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Detailed tracing of commands and state transitions.
    Debug,
    /// Normal progress reporting.
    Info,
    /// Degraded but recoverable conditions.
    Warning,
    /// Failures surfaced to the caller.
    Error,
}

impl Severity {
    /// Returns the lowercase label used when rendering events.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Diagnostic event recorded by a component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticEvent {
    /// How serious the event is.
    pub severity: Severity,
    /// Short name of the reporting component (`session`, `compression`, ...).
    pub component: &'static str,
    /// Human readable message.
    pub message: String,
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.component, self.message)
    }
}

/// Sink for diagnostics, passed explicitly to each component.
pub trait Diagnostics: Send + Sync + fmt::Debug {
    /// Records one event.
    fn record(&self, event: DiagnosticEvent);

    /// Records a debug event.
    fn debug(&self, component: &'static str, message: &str) {
        self.record(DiagnosticEvent {
            severity: Severity::Debug,
            component,
            message: message.to_owned(),
        });
    }

    /// Records an info event.
    fn info(&self, component: &'static str, message: &str) {
        self.record(DiagnosticEvent {
            severity: Severity::Info,
            component,
            message: message.to_owned(),
        });
    }

    /// Records a warning.
    fn warn(&self, component: &'static str, message: &str) {
        self.record(DiagnosticEvent {
            severity: Severity::Warning,
            component,
            message: message.to_owned(),
        });
    }

    /// Records an error.
    fn error(&self, component: &'static str, message: &str) {
        self.record(DiagnosticEvent {
            severity: Severity::Error,
            component,
            message: message.to_owned(),
        });
    }
}

/// In-memory event collector.
///
/// Clones share the same buffer, so a test can hand one clone to a session
/// and inspect the other afterwards.
#[derive(Clone, Debug, Default)]
pub struct EventBuffer {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
}

impl EventBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains all collected events, clearing the internal buffer.
    pub fn drain_events(&self) -> Vec<DiagnosticEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.drain(..).collect()
    }

    /// Returns a copy of the collected events without clearing them.
    pub fn snapshot(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the messages recorded at exactly `severity`.
    pub fn messages_at(&self, severity: Severity) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter(|event| event.severity == severity)
            .map(|event| event.message)
            .collect()
    }
}

impl Diagnostics for EventBuffer {
    fn record(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_drain() {
        let buffer = EventBuffer::new();

        buffer.info("session", "connected");
        buffer.debug("runner", "spawned ssh");

        let events = buffer.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].severity, Severity::Info);
        assert_eq!(events[0].component, "session");
        assert_eq!(events[0].message, "connected");
        assert_eq!(events[1].severity, Severity::Debug);

        // Events should be drained
        assert!(buffer.drain_events().is_empty());
    }

    #[test]
    fn clones_share_storage() {
        let buffer = EventBuffer::new();
        let handle = buffer.clone();

        handle.warn("compression", "xz missing");

        assert_eq!(buffer.messages_at(Severity::Warning), vec!["xz missing"]);
        assert!(buffer.messages_at(Severity::Error).is_empty());
    }

    #[test]
    fn severity_orders_by_importance() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn event_display_includes_component() {
        let event = DiagnosticEvent {
            severity: Severity::Error,
            component: "session",
            message: "boom".to_owned(),
        };
        assert_eq!(event.to_string(), "error [session]: boom");
    }
}
