//! Diagnostics
//!
//! Routes diagnostics raised by the application preset to the host
//! bundler. The host has no informational channel, so `info` is reported as
//! a warning.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::logging::Logger;

/// Severity of a preset diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Error,
    Warning,
    Info,
}

/// The host bundler's error and warning channels.
pub trait DiagnosticsHost: Send + Sync {
    /// Report a build-breaking error.
    fn emit_error(&self, message: &str);
    /// Report a non-fatal warning.
    fn emit_warning(&self, message: &str);
}

/// Callback handed to the application preset.
#[derive(Clone)]
pub struct DiagnosticReporter {
    host: Arc<dyn DiagnosticsHost>,
}

impl DiagnosticReporter {
    pub fn new(host: Arc<dyn DiagnosticsHost>) -> Self {
        Self { host }
    }

    pub fn report(&self, kind: DiagnosticKind, message: &str) {
        match kind {
            DiagnosticKind::Error => self.host.emit_error(message),
            DiagnosticKind::Info | DiagnosticKind::Warning => self.host.emit_warning(message),
        }
    }
}

impl fmt::Debug for DiagnosticReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticReporter").finish_non_exhaustive()
    }
}

/// Host that writes diagnostics to a logger and counts errors, for hosts
/// without a bundler of their own.
pub struct LoggerDiagnosticsHost {
    logger: Arc<dyn Logger>,
    errors: AtomicUsize,
}

impl LoggerDiagnosticsHost {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            errors: AtomicUsize::new(0),
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

impl DiagnosticsHost for LoggerDiagnosticsHost {
    fn emit_error(&self, message: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.logger.error(message);
    }

    fn emit_warning(&self, message: &str) {
        self.logger.warn(message);
    }
}
