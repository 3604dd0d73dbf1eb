//! Thread-safe diagnostic reporter.

use crate::SourceMap;
use femto_ir::Loc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Destination for rendered diagnostic lines.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, msg: &str, severity: u8, fatal: bool);
}

/// Sink that writes to stderr.
#[derive(Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&self, msg: &str, _severity: u8, _fatal: bool) {
        eprintln!("{msg}");
    }
}

/// Sink that collects messages, for tests.
#[derive(Default)]
pub struct CollectSink {
    messages: Mutex<Vec<String>>,
}

impl CollectSink {
    pub fn new() -> Self {
        CollectSink::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Whether any collected message contains the given fragment
    /// (typically an `E####` code).
    pub fn contains(&self, fragment: &str) -> bool {
        self.messages.lock().iter().any(|m| m.contains(fragment))
    }
}

impl DiagnosticSink for CollectSink {
    fn emit(&self, msg: &str, _severity: u8, _fatal: bool) {
        self.messages.lock().push(msg.to_string());
    }
}

/// The compiler's diagnostic channel: severity-filtered sink, error counter,
/// fatal latch, and the source path table.
///
/// Severity 1..=5; messages below `level` are dropped. Severity-5 messages
/// count as errors. The fatal bit never resets; passes check it at their
/// boundaries and abort.
pub struct Reporter<'s> {
    level: u8,
    sink: &'s dyn DiagnosticSink,
    err_count: AtomicU32,
    fatal: AtomicBool,
    sources: SourceMap,
}

impl<'s> Reporter<'s> {
    pub fn new(level: u8, sink: &'s dyn DiagnosticSink) -> Self {
        Reporter {
            level: level.clamp(1, 5),
            sink,
            err_count: AtomicU32::new(0),
            fatal: AtomicBool::new(false),
            sources: SourceMap::new(),
        }
    }

    /// Report a message. Severity 5 increments the error counter; `fatal`
    /// latches the fatal bit.
    pub fn log(&self, msg: &str, severity: u8, fatal: bool) {
        if severity >= 5 {
            self.err_count.fetch_add(1, Ordering::Relaxed);
        }
        if fatal {
            self.fatal.store(true, Ordering::Relaxed);
        }
        if severity >= self.level {
            self.sink.emit(msg, severity, fatal);
        }
    }

    /// Report an error (severity 5, non-fatal).
    pub fn error(&self, msg: &str) {
        self.log(msg, 5, false);
    }

    /// Report a fatal error (severity 5, fatal).
    pub fn fatal(&self, msg: &str) {
        self.log(msg, 5, true);
    }

    #[inline]
    pub fn err_count(&self) -> u32 {
        self.err_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.fatal.load(Ordering::Relaxed)
    }

    /// The source path table.
    #[inline]
    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    /// Render a location as `path:line.col`.
    pub fn loc(&self, loc: Loc) -> String {
        self.sources.render(loc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_counting() {
        let sink = CollectSink::new();
        let rep = Reporter::new(3, &sink);
        rep.log("note", 2, false);
        rep.error("E9001 first");
        rep.fatal("E9002 second");
        assert_eq!(rep.err_count(), 2);
        assert!(rep.is_fatal());
        // severity 2 < level 3 is dropped from the sink but not the counter
        assert_eq!(sink.messages().len(), 2);
    }

    #[test]
    fn test_severity_filter() {
        let sink = CollectSink::new();
        let rep = Reporter::new(1, &sink);
        rep.log("trace msg", 1, false);
        assert_eq!(rep.err_count(), 0);
        assert!(sink.contains("trace msg"));
    }

    #[test]
    fn test_loc_rendering() {
        let sink = CollectSink::new();
        let rep = Reporter::new(3, &sink);
        let id = rep.sources().add("/a/b.fc");
        assert_eq!(rep.loc(Loc::new(id, 2, 5)), "/a/b.fc:2.5");
    }
}
