//! Observable compiler events
//!
//! Events are explicit and typed; each carries a fixed severity.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Compilation
    /// Compile call received
    CompileBegin,
    /// Program text produced
    CompileComplete,
    /// Compile call returned an error
    CompileRejected,

    // Planning
    /// A later bound replaced an earlier bound on the same column and side
    BoundOverwritten,
    /// An index-bound candidate was moved to the runtime filter set
    FilterDemoted,

    // Catalog
    /// DDL statement applied
    DdlApplied,
    /// DDL statement rejected
    DdlRejected,

    // Configuration
    /// Configuration loaded
    ConfigLoaded,
}

impl Event {
    /// Name written as the `event` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::CompileBegin => "COMPILE_BEGIN",
            Event::CompileComplete => "COMPILE_COMPLETE",
            Event::CompileRejected => "COMPILE_REJECTED",
            Event::BoundOverwritten => "BOUND_OVERWRITTEN",
            Event::FilterDemoted => "FILTER_DEMOTED",
            Event::DdlApplied => "DDL_APPLIED",
            Event::DdlRejected => "DDL_REJECTED",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::BoundOverwritten | Event::CompileRejected | Event::DdlRejected => {
                Severity::Warn
            }
            Event::FilterDemoted => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
