//! Collects diagnostics from concurrently running steps.

use crate::diagnostic::Diagnostic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Diagnostics emitted during one command, shared by every step.
///
/// Steps finish in any order, so [`take_all`](DiagnosticSink::take_all)
/// groups the result by build unit to keep output stable between runs.
pub struct DiagnosticSink {
    entries: Mutex<Vec<Diagnostic>>,
    errors: AtomicUsize,
}

impl DiagnosticSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            errors: AtomicUsize::new(0),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        // A step that panicked mid-push still leaves a valid Vec.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Records one diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.entries().push(diag);
    }

    /// Returns `true` once any error was emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Errors emitted so far, including already taken ones.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Drains the sink, grouped by build unit in emission order.
    ///
    /// Diagnostics without a unit come first.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut taken = std::mem::take(&mut *self.entries());
        taken.sort_by(|a, b| a.unit.cmp(&b.unit));
        taken
    }

    /// A copy of everything emitted, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries().clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;

    fn engine_failure(unit: &str) -> Diagnostic {
        Diagnostic::error(DiagnosticCode::ENGINE_FAILED, "engine exited with code 1").in_unit(unit)
    }

    fn empty_resolution(unit: &str) -> Diagnostic {
        Diagnostic::warning(DiagnosticCode::EMPTY_RESOLUTION, "nothing resolved").in_unit(unit)
    }

    #[test]
    fn new_sink_is_empty() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn warnings_are_not_errors() {
        let sink = DiagnosticSink::new();
        sink.emit(empty_resolution("docs"));
        sink.emit(Diagnostic::note(DiagnosticCode::SUPPRESSED_SOURCE_SET, "test suppressed"));
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);
        assert_eq!(sink.diagnostics().len(), 2);
    }

    #[test]
    fn take_all_groups_by_unit_and_drains() {
        let sink = DiagnosticSink::new();
        sink.emit(engine_failure("hello"));
        sink.emit(empty_resolution("docs"));
        sink.emit(empty_resolution("hello"));

        let units: Vec<_> = sink
            .take_all()
            .into_iter()
            .map(|d| (d.unit.unwrap(), d.code))
            .collect();
        assert_eq!(
            units,
            vec![
                ("docs".to_string(), DiagnosticCode::EMPTY_RESOLUTION),
                ("hello".to_string(), DiagnosticCode::ENGINE_FAILED),
                ("hello".to_string(), DiagnosticCode::EMPTY_RESOLUTION),
            ]
        );
        assert!(sink.take_all().is_empty());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn concurrent_steps_share_one_sink() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let handles: Vec<_> = ["hello", "goodbye", "docs", "extra"]
            .into_iter()
            .map(|unit| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for _ in 0..25 {
                        sink.emit(engine_failure(unit));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.error_count(), 100);
        let docs = sink
            .take_all()
            .into_iter()
            .filter(|d| d.unit.as_deref() == Some("docs"))
            .count();
        assert_eq!(docs, 25);
    }
}
