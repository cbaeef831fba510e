//! Name-and-signature resolution.
//!
//! The resolver sits between the namer (which populated the symbol table
//! with tentative class, module, method and field symbols) and the type
//! inferencer. It turns a forest of parsed trees — in which constants,
//! ancestry, type aliases and method signatures are still syntactic — into
//! a fully linked form:
//!
//! - every constant reference carries a direct symbol identity,
//! - every class knows its superclass and mixin list,
//! - every type alias has a resolved type,
//! - every method symbol carries elaborated parameter and return types.
//!
//! Constants may be defined via ancestors, and ancestors are themselves
//! constant references, so resolution runs to a fixed point: failed
//! resolutions are parked on todo lists and retried until a full pass makes
//! no progress, at which point the leftovers are stubbed out with errors.
//! The `constants` module holds the full story.
//!
//! Passes run in a fixed order; data flow between them is strictly linear:
//!
//! 1. constants and ancestors (parallel first walk + fixed point)
//! 2. ancestor finalization
//! 3. `mixes_in_class_methods`
//! 4. type member bounds
//! 5. signatures, fields and cast rewrites
//! 6. sanity check (debug builds only)

mod constants;
mod finalize;
mod mixes_in;
mod sanity;
mod signatures;
mod type_params;
pub mod type_syntax;

use rue_ast::Tree;
use rue_core::SymbolTable;
use rue_diagnostic::{Diagnostic, DiagnosticQueue};

/// The rewritten forest plus every diagnostic the run produced, in
/// deterministic order.
pub struct ResolveResult {
    pub trees: Vec<Tree>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the full resolver pipeline.
///
/// `workers` sizes the parallel first walk; `0` selects the serial path.
/// Only the first walk is parallel — everything after it mutates the symbol
/// table and therefore runs on the calling thread.
pub fn run(gs: &mut SymbolTable, mut trees: Vec<Tree>, workers: usize) -> ResolveResult {
    let mut diags = DiagnosticQueue::new();

    constants::resolve_constants(gs, &mut trees, workers, &mut diags);
    finalize::finalize_ancestors(gs);
    mixes_in::resolve_mixes_in_class_methods(gs, &mut trees, &mut diags);
    type_params::resolve_type_params(gs, &mut trees, &mut diags);
    signatures::resolve_sigs(gs, &mut trees, &mut diags);
    sanity::sanity_check(gs, &trees);

    ResolveResult {
        trees,
        diagnostics: diags.flush(),
    }
}

/// Single-threaded variant of [`run`] for callers without a worker pool.
pub fn run_tree_passes(gs: &mut SymbolTable, trees: Vec<Tree>) -> ResolveResult {
    run(gs, trees, 0)
}

/// Run only constant resolution (plus the sanity walk), for incremental
/// flows that re-resolve constants without re-elaborating signatures.
pub fn run_constant_resolution(
    gs: &mut SymbolTable,
    mut trees: Vec<Tree>,
    workers: usize,
) -> ResolveResult {
    let mut diags = DiagnosticQueue::new();
    constants::resolve_constants(gs, &mut trees, workers, &mut diags);
    sanity::sanity_check(gs, &trees);
    ResolveResult {
        trees,
        diagnostics: diags.flush(),
    }
}
