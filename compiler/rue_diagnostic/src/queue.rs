//! Queue for collecting and deterministically ordering diagnostics.
//!
//! Each parallel walk worker owns a private queue; the main thread merges
//! them and every later pass appends to the merged queue. [`flush`] returns
//! diagnostics in `(file, position)` order regardless of the order they were
//! produced in, which keeps reruns and permuted inputs byte-identical.
//!
//! [`flush`]: DiagnosticQueue::flush

use rue_core::{FileTable, Loc};

use crate::{Diagnostic, ErrorCode, Severity};

/// Collects diagnostics; flushed once per run.
#[derive(Default, Debug)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            error_count: 0,
        }
    }

    /// Begin an error at `loc`.
    ///
    /// Returns `None` when the file's strictness suppresses this code; the
    /// caller must then skip any work observable only through the builder
    /// (suggestion search, pretty-printing).
    pub fn begin_error<'q>(
        &'q mut self,
        files: &FileTable,
        loc: Loc,
        code: ErrorCode,
    ) -> Option<DiagnosticBuilder<'q>> {
        self.begin(files, loc, code, Severity::Error)
    }

    /// Begin a warning at `loc`. Same suppression rule as errors.
    pub fn begin_warning<'q>(
        &'q mut self,
        files: &FileTable,
        loc: Loc,
        code: ErrorCode,
    ) -> Option<DiagnosticBuilder<'q>> {
        self.begin(files, loc, code, Severity::Warning)
    }

    fn begin<'q>(
        &'q mut self,
        files: &FileTable,
        loc: Loc,
        code: ErrorCode,
        severity: Severity,
    ) -> Option<DiagnosticBuilder<'q>> {
        if files.strict_level(loc.file) < code.min_level() {
            return None;
        }
        let diag = match severity {
            Severity::Error => Diagnostic::error(code, loc),
            Severity::Warning => Diagnostic::warning(code, loc),
        };
        Some(DiagnosticBuilder { queue: self, diag })
    }

    /// Whether an error at `loc` with `code` would be reported at all.
    ///
    /// For callers that need to gate expensive work beyond what the builder
    /// closure covers.
    pub fn would_report(&self, files: &FileTable, loc: Loc, code: ErrorCode) -> bool {
        files.strict_level(loc.file) >= code.min_level()
    }

    /// Append a finished diagnostic.
    pub fn push(&mut self, diag: Diagnostic) {
        if diag.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
    }

    /// Move every diagnostic of `other` into this queue.
    pub fn merge(&mut self, other: DiagnosticQueue) {
        self.error_count += other.error_count;
        self.diagnostics.extend(other.diagnostics);
    }

    /// Number of errors collected so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Check whether anything was collected.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Sort by `(file, position)` and drain.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by(|a, b| a.loc.cmp_by_position(b.loc));
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }
}

/// In-progress diagnostic handed out by [`DiagnosticQueue::begin_error`].
///
/// Nothing is recorded until [`emit`] is called; dropping the builder
/// abandons the diagnostic.
///
/// [`emit`]: DiagnosticBuilder::emit
pub struct DiagnosticBuilder<'q> {
    queue: &'q mut DiagnosticQueue,
    diag: Diagnostic,
}

impl DiagnosticBuilder<'_> {
    /// Set the main message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.diag.message = message.into();
        self
    }

    /// Add a secondary label at another location.
    #[must_use]
    pub fn secondary_label(mut self, loc: Loc, message: impl Into<String>) -> Self {
        self.diag = self.diag.with_secondary_label(loc, message);
        self
    }

    /// Add a note.
    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diag = self.diag.with_note(note);
        self
    }

    /// Add a machine-applicable replacement.
    #[must_use]
    pub fn replacement(
        mut self,
        title: impl Into<String>,
        loc: Loc,
        text: impl Into<String>,
    ) -> Self {
        self.diag = self.diag.with_replacement(title, loc, text);
        self
    }

    /// Push the finished diagnostic onto the queue.
    pub fn emit(self) {
        self.queue.push(self.diag);
    }
}
