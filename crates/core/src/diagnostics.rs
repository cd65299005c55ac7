//! Diagnostic sink injected into the tokenizer, operator pass, resolver and
//! binder. Input errors are still returned as data; the sink only mirrors
//! them for whoever is watching.

use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Log,
    Warn,
    Error,
}

pub trait Diagnostics {
    fn log(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing` under the `delimit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn log(&self, message: &str) {
        tracing::debug!(target: "delimit", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "delimit", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "delimit", "{}", message);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Diagnostics for Silent {
    fn log(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Keeps every message in memory. Meant for tests and tooling.
#[derive(Debug, Default)]
pub struct Recorder {
    entries: RefCell<Vec<(Level, String)>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn record(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_owned()));
    }
}

impl Diagnostics for Recorder {
    fn log(&self, message: &str) {
        self.record(Level::Log, message);
    }

    fn warn(&self, message: &str) {
        self.record(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }
}

/// The sink used when a caller does not inject one.
pub fn default_sink() -> &'static dyn Diagnostics {
    static TRACING: TracingDiagnostics = TracingDiagnostics;
    &TRACING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_filters_by_level() {
        let r = Recorder::new();
        r.log("a");
        r.error("b");
        r.warn("c");
        r.error("d");
        assert_eq!(r.messages_at(Level::Error), vec!["b", "d"]);
        assert_eq!(r.entries().len(), 4);
    }
}
