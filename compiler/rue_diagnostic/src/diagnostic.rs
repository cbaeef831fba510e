//! The diagnostic value and its builder methods.

use std::fmt;

use rue_core::Loc;

use crate::ErrorCode;

/// Severity level for a diagnostic.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A labeled location with a message.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub loc: Loc,
    pub message: String,
    pub is_primary: bool,
}

impl Label {
    /// The main error location.
    pub fn primary(loc: Loc, message: impl Into<String>) -> Self {
        Label {
            loc,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Related context at another location.
    pub fn secondary(loc: Loc, message: impl Into<String>) -> Self {
        Label {
            loc,
            message: message.into(),
            is_primary: false,
        }
    }
}

/// A suggested source replacement.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Replacement {
    /// What applying the replacement achieves, e.g. "Delete the body".
    pub title: String,
    pub loc: Loc,
    pub text: String,
}

/// A diagnostic with all context needed to render a useful message.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    /// Main message.
    pub message: String,
    /// The location the diagnostic is anchored at.
    pub loc: Loc,
    /// Additional labeled locations.
    pub labels: Vec<Label>,
    /// Free-form notes (multi-line hints, regeneration instructions).
    pub notes: Vec<String>,
    /// Machine-applicable fixes.
    pub replacements: Vec<Replacement>,
}

impl Diagnostic {
    /// Create a new error diagnostic anchored at `loc`.
    pub fn error(code: ErrorCode, loc: Loc) -> Self {
        Diagnostic {
            code,
            severity: Severity::Error,
            message: String::new(),
            loc,
            labels: Vec::new(),
            notes: Vec::new(),
            replacements: Vec::new(),
        }
    }

    /// Create a new warning diagnostic anchored at `loc`.
    pub fn warning(code: ErrorCode, loc: Loc) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(code, loc)
        }
    }

    /// Set the main message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a secondary label at another location.
    #[must_use]
    pub fn with_secondary_label(mut self, loc: Loc, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(loc, message));
        self
    }

    /// Add a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Add a machine-applicable replacement.
    #[must_use]
    pub fn with_replacement(
        mut self,
        title: impl Into<String>,
        loc: Loc,
        text: impl Into<String>,
    ) -> Self {
        self.replacements.push(Replacement {
            title: title.into(),
            loc,
            text: text.into(),
        });
        self
    }

    /// Check if this is an error (vs a warning).
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accumulates() {
        let diag = Diagnostic::error(ErrorCode::StubConstant, Loc::NONE)
            .with_message("Unable to resolve constant `X`")
            .with_secondary_label(Loc::NONE, "Did you mean: `Y`?")
            .with_note("defined 3 lines up");
        assert!(diag.is_error());
        assert_eq!(diag.labels.len(), 1);
        assert_eq!(diag.notes.len(), 1);
    }
}
