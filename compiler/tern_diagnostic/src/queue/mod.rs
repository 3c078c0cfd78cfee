//! Diagnostic queue for collecting and limiting inference diagnostics.
//!
//! Features:
//! - Error limit (warnings never count toward it)
//! - Exact-duplicate suppression (same code, location and message)
//! - Hard-error tracking so the driver can skip code generation
//!
//! Diagnostics are kept in insertion order; the solver inserts them in a
//! deterministic order so output does not depend on thread scheduling.

use rustc_hash::FxHashSet;

use tern_ir::SourceLoc;

use crate::{Diagnostic, ErrorCode};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors kept (0 = unlimited).
    pub error_limit: usize,
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 50,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// No limits, no deduplication (for testing).
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    seen: FxHashSet<(ErrorCode, Option<SourceLoc>, String)>,
    error_count: usize,
    warning_count: usize,
    has_hard_error: bool,
    config: DiagnosticConfig,
}

impl Default for DiagnosticQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::with_config(DiagnosticConfig::default())
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            seen: FxHashSet::default(),
            error_count: 0,
            warning_count: 0,
            has_hard_error: false,
            config,
        }
    }

    /// Add a diagnostic.
    ///
    /// Returns `true` if it was kept, `false` if it was filtered by the
    /// error limit or as a duplicate.
    pub fn push(&mut self, diag: Diagnostic) -> bool {
        let is_error = diag.is_error();

        if is_error && self.limit_reached() {
            return false;
        }

        if self.config.deduplicate {
            let key = (diag.code, diag.primary_loc(), diag.message.clone());
            if !self.seen.insert(key) {
                return false;
            }
        }

        if is_error {
            self.error_count += 1;
            self.has_hard_error = true;
        } else {
            self.warning_count += 1;
        }
        self.diagnostics.push(diag);
        true
    }

    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// True once any error-severity diagnostic was kept.
    pub fn has_hard_error(&self) -> bool {
        self.has_hard_error
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Drain diagnostics in insertion order and reset counters.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.seen.clear();
        self.error_count = 0;
        self.warning_count = 0;
        self.has_hard_error = false;
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests;
