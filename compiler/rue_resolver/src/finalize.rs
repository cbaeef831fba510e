//! P2: close the symbol table once ancestry is known.
//!
//! After the fixed point, classes the source never gave a superclass still
//! have an empty slot. Linearization downstream requires every class to
//! terminate in `Object`, so the slot is defaulted here. `BasicObject`
//! keeps its marker: it is the top of the user hierarchy.

use rue_core::{SymbolKind, SymbolRef, SymbolTable};

pub(crate) fn finalize_ancestors(gs: &mut SymbolTable) {
    tracing::debug!("resolver.finalize_ancestors");

    let sentinel_cutoff = SymbolRef::BAD_ALIAS_METHOD_STUB;
    let refs: Vec<SymbolRef> = gs.symbol_refs().collect();
    for sym in refs {
        if sym <= sentinel_cutoff {
            continue;
        }
        let data = gs.symbol(sym);
        if data.kind != SymbolKind::Class {
            continue;
        }
        if !data.superclass.exists() || data.superclass == SymbolRef::TODO {
            gs.set_super_class(sym, SymbolRef::OBJECT);
        }
    }
}
