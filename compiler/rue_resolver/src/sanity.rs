//! P6: debug-only invariant walk.
//!
//! Every error path in the earlier passes is supposed to leave the forest
//! well formed: no unresolved constants survive, and every resolved
//! constant carries a usable symbol. Release builds trust that; debug
//! builds verify it.

use rue_ast::Tree;
use rue_core::SymbolTable;

#[cfg(debug_assertions)]
use rue_ast::{ExprArena, ExprId, ExprKind};

pub(crate) fn sanity_check(gs: &SymbolTable, trees: &[Tree]) {
    #[cfg(debug_assertions)]
    {
        tracing::debug!("resolver.sanity_check");
        for tree in trees {
            check(gs, &tree.arena, tree.root);
        }
    }
    #[cfg(not(debug_assertions))]
    {
        let _ = (gs, trees);
    }
}

#[cfg(debug_assertions)]
fn check(gs: &SymbolTable, arena: &ExprArena, id: ExprId) {
    match arena.kind(id) {
        ExprKind::UnresolvedConstantLit { .. } => {
            panic!("unresolved constant survived resolution");
        }
        ExprKind::ConstantLit { symbol, .. } => {
            assert!(symbol.exists(), "constant resolved to no symbol");
            if gs.is_type_alias(*symbol) {
                assert!(
                    gs.symbol(*symbol).result_type.is_some(),
                    "type alias without a resolved type"
                );
            }
            // `original` is intentionally not visited: it preserves the
            // pre-resolution node for error rendering.
        }
        ExprKind::ClassDef {
            ancestors,
            singleton_ancestors,
            rhs,
            ..
        } => {
            for &child in ancestors.iter().chain(singleton_ancestors).chain(rhs) {
                check(gs, arena, child);
            }
        }
        ExprKind::MethodDef { args, rhs, .. } => {
            for &arg in args {
                check(gs, arena, arg);
            }
            check(gs, arena, *rhs);
        }
        ExprKind::OptionalArg { local, default } => {
            check(gs, arena, *local);
            check(gs, arena, *default);
        }
        ExprKind::Assign { lhs, rhs } => {
            check(gs, arena, *lhs);
            check(gs, arena, *rhs);
        }
        ExprKind::Send {
            recv, args, block, ..
        } => {
            check(gs, arena, *recv);
            for &arg in args {
                check(gs, arena, arg);
            }
            if let Some(block) = block {
                check(gs, arena, *block);
            }
        }
        ExprKind::Block { args, body } => {
            for &arg in args {
                check(gs, arena, arg);
            }
            check(gs, arena, *body);
        }
        ExprKind::Cast { arg, .. } => check(gs, arena, *arg),
        ExprKind::Hash { keys, values } => {
            for &child in keys.iter().chain(values) {
                check(gs, arena, child);
            }
        }
        ExprKind::InsSeq { stats, expr } => {
            for &stat in stats {
                check(gs, arena, stat);
            }
            check(gs, arena, *expr);
        }
        ExprKind::KeepForTypechecking { expr } => check(gs, arena, *expr),
        ExprKind::EmptyTree
        | ExprKind::Literal(_)
        | ExprKind::SelfRef
        | ExprKind::Local { .. }
        | ExprKind::UnresolvedIdent { .. } => {}
    }
}
