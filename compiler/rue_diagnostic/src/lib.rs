//! Diagnostic system for the resolver.
//!
//! - Error codes for searchability, one per resolver error class
//! - Clear messages (what went wrong)
//! - Primary location (where it went wrong)
//! - Context labels (why it's wrong)
//! - Replacements (how to fix)
//!
//! Diagnostics are collected into a [`DiagnosticQueue`] and flushed in
//! deterministic `(file, position)` order, so permuting the input files
//! never changes the reported sequence.

mod diagnostic;
mod error_code;
mod queue;

pub use diagnostic::{Diagnostic, Label, Replacement, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticBuilder, DiagnosticQueue};
