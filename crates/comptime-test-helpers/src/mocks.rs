//! Mock implementations for testing

use std::sync::Arc;

use comptime_core::diagnostics::{
    CollectingDiagnosticHandler, Diagnostic, DiagnosticHandler, DiagnosticLevel,
};

/// A diagnostic handler that records everything it is given, with query
/// helpers for assertions
#[derive(Debug, Default)]
pub struct MockDiagnosticHandler {
    inner: CollectingDiagnosticHandler,
}

impl MockDiagnosticHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Messages of all error diagnostics, in report order
    pub fn error_messages(&self) -> Vec<String> {
        self.inner
            .get_diagnostics()
            .into_iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .map(|d| d.message)
            .collect()
    }

    /// Error diagnostics attributed to the named plugin
    pub fn errors_from(&self, plugin: &str) -> Vec<Diagnostic> {
        self.inner
            .get_diagnostics()
            .into_iter()
            .filter(|d| d.level == DiagnosticLevel::Error && d.plugin.as_deref() == Some(plugin))
            .collect()
    }
}

impl DiagnosticHandler for MockDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        self.inner.report(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.inner.has_errors()
    }

    fn error_count(&self) -> usize {
        self.inner.error_count()
    }

    fn warning_count(&self) -> usize {
        self.inner.warning_count()
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.get_diagnostics()
    }
}
