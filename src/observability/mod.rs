//! Observability subsystem
//!
//! Provides:
//! - Structured logging (JSON lines on stderr)
//! - Typed compiler and catalog events
//! - Scope-based begin/complete tracing
//!
//! Logging never affects compiler output: the same input produces the same
//! program text at every log level.
//!
//! ```ignore
//! use embeddb_sql::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::DdlApplied, &[("table", "uwa")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

#[cfg(test)]
pub(crate) use logger::capture_log;

/// Log an event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::CompileBegin);
        log_event_with_fields(Event::ConfigLoaded, &[("path", "/tmp/config.json")]);
    }

    #[test]
    fn test_event_record_shape() {
        let event = Event::BoundOverwritten;
        let output = capture_log(event.severity(), event.as_str(), &[("column", "1")]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "BOUND_OVERWRITTEN");
        assert_eq!(parsed["severity"], "WARN");
        assert_eq!(parsed["column"], "1");
    }
}
