//! Core data structures shared by every stage of the Rue type checker.
//!
//! This crate owns the pieces that outlive any single pass:
//! - [`Span`] / [`Loc`]: compact source locations, single- and multi-file
//! - [`Name`] / [`StringInterner`]: interned identifiers
//! - [`FileTable`] / [`StrictLevel`]: per-file strictness metadata
//! - [`SymbolTable`]: the append-and-mutate symbol arena indexed by
//!   [`SymbolRef`] handles
//! - [`Type`]: the type term language handed to the inferencer
//!
//! The symbol table is process-wide per run and is always threaded through
//! operations as an explicit value; there are no implicit globals.

mod files;
mod interner;
mod literal;
mod loc;
mod name;
mod names;
mod span;
mod strict;
pub mod symbols;
pub mod types;

pub use files::{File, FileId, FileTable};
pub use interner::StringInterner;
pub use literal::LiteralValue;
pub use loc::Loc;
pub use name::Name;
pub use names::WellKnownNames;
pub use span::Span;
pub use strict::StrictLevel;
pub use symbols::{
    ArgFlags, ArgInfo, FuzzyMatch, Symbol, SymbolFlags, SymbolKind, SymbolRef, SymbolTable,
    UniqueNameKind,
};
pub use types::{Type, Types};
