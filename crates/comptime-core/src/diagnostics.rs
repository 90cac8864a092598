use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

/// The module a diagnostic is attributed to, as `namespace:path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    pub namespace: String,
    pub path: String,
}

impl ModuleLocation {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for ModuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// A diagnostic message with location and severity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub location: Option<ModuleLocation>,
    /// Plugin that raised the diagnostic, if any
    pub plugin: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(location: Option<ModuleLocation>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            location,
            plugin: None,
            message: message.into(),
        }
    }

    pub fn warning(location: Option<ModuleLocation>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            location,
            plugin: None,
            message: message.into(),
        }
    }

    pub fn info(location: Option<ModuleLocation>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            location,
            plugin: None,
            message: message.into(),
        }
    }

    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level_str = match self.level {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Info => "info",
        };
        write!(f, "{}", level_str)?;
        if let Some(plugin) = &self.plugin {
            write!(f, " [plugin {}]", plugin)?;
        }
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Trait for handling diagnostics
/// This allows for dependency injection and testing with mock handlers
pub trait DiagnosticHandler: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    fn error(&self, location: Option<ModuleLocation>, message: &str) {
        self.report(Diagnostic::error(location, message));
    }

    fn warning(&self, location: Option<ModuleLocation>, message: &str) {
        self.report(Diagnostic::warning(location, message));
    }

    fn info(&self, location: Option<ModuleLocation>, message: &str) {
        self.report(Diagnostic::info(location, message));
    }

    fn has_errors(&self) -> bool;
    fn error_count(&self) -> usize;
    fn warning_count(&self) -> usize;
    fn get_diagnostics(&self) -> Vec<Diagnostic>;
}

/// Shared storage for the handlers below
#[derive(Debug, Default)]
struct DiagnosticLog {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.lock().iter().filter(|d| d.level == level).count()
    }

    fn snapshot(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }
}

/// Console-based diagnostic handler that prints to stderr
#[derive(Debug)]
pub struct ConsoleDiagnosticHandler {
    log: DiagnosticLog,
    pretty: bool,
}

impl ConsoleDiagnosticHandler {
    pub fn new(pretty: bool) -> Self {
        Self {
            log: DiagnosticLog::default(),
            pretty,
        }
    }
}

impl DiagnosticHandler for ConsoleDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        if self.pretty {
            eprintln!("\x1b[1m{}\x1b[0m", diagnostic);
        } else {
            eprintln!("{}", diagnostic);
        }

        self.log.push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize {
        self.log.count(DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        self.log.count(DiagnosticLevel::Warning)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.log.snapshot()
    }
}

/// Collecting diagnostic handler for testing
/// Collects all diagnostics without printing
#[derive(Debug, Default)]
pub struct CollectingDiagnosticHandler {
    log: DiagnosticLog,
}

impl CollectingDiagnosticHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        self.log.push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize {
        self.log.count(DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        self.log.count(DiagnosticLevel::Warning)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.log.snapshot()
    }
}
