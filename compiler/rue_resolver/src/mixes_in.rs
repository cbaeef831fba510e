//! P3: record `mixes_in_class_methods` declarations.
//!
//! `self.mixes_in_class_methods(M)` inside a module asks that including the
//! module also extend the includer with `M`. The resolver only records the
//! target under the module's `classMethods` pseudo-member; the inheritance
//! machinery downstream consumes it.

use rue_ast::{ExprArena, ExprId, ExprKind, Tree};
use rue_core::{FileId, Loc, SymbolRef, SymbolTable};
use rue_diagnostic::{DiagnosticQueue, ErrorCode};

pub(crate) fn resolve_mixes_in_class_methods(
    gs: &mut SymbolTable,
    trees: &mut [Tree],
    diags: &mut DiagnosticQueue,
) {
    tracing::debug!("resolver.mixes_in_class_methods");
    for tree in trees.iter_mut() {
        let root = tree.root;
        walk(gs, diags, tree.file, &mut tree.arena, root, SymbolRef::ROOT);
    }
}

fn walk(
    gs: &mut SymbolTable,
    diags: &mut DiagnosticQueue,
    file: FileId,
    arena: &mut ExprArena,
    id: ExprId,
    owner: SymbolRef,
) {
    let kind = arena.kind(id).clone();
    match kind {
        ExprKind::ClassDef { symbol, rhs, .. } => {
            for &stat in &rhs {
                walk(gs, diags, file, arena, stat, symbol);
            }
        }
        ExprKind::MethodDef { rhs, .. } => walk(gs, diags, file, arena, rhs, owner),
        ExprKind::InsSeq { stats, expr } => {
            for &stat in &stats {
                walk(gs, diags, file, arena, stat, owner);
            }
            walk(gs, diags, file, arena, expr, owner);
        }
        ExprKind::Assign { rhs, .. } => walk(gs, diags, file, arena, rhs, owner),
        ExprKind::Block { body, .. } => walk(gs, diags, file, arena, body, owner),
        ExprKind::Send {
            recv,
            fun,
            ref args,
            block,
        } => {
            if matches!(arena.kind(recv), ExprKind::SelfRef)
                && fun == gs.names.mixes_in_class_methods
            {
                process_declaration(gs, diags, file, arena, id, args, owner);
                arena.replace(id, ExprKind::EmptyTree);
                return;
            }
            walk(gs, diags, file, arena, recv, owner);
            for &arg in args {
                walk(gs, diags, file, arena, arg, owner);
            }
            if let Some(block) = block {
                walk(gs, diags, file, arena, block, owner);
            }
        }
        _ => {}
    }
}

fn process_declaration(
    gs: &mut SymbolTable,
    diags: &mut DiagnosticQueue,
    file: FileId,
    arena: &ExprArena,
    send: ExprId,
    args: &[ExprId],
    owner: SymbolRef,
) {
    let loc = Loc::new(file, arena.span(send));

    if !gs.is_class_module(owner) {
        if let Some(e) = diags.begin_error(&gs.files, loc, ErrorCode::InvalidMixinDeclaration) {
            e.message(
                "`mixes_in_class_methods` can only be declared inside a module, not a class",
            )
            .emit();
        }
        // Keep processing anyway so later errors still surface.
    }

    if args.len() != 1 {
        if let Some(e) = diags.begin_error(&gs.files, loc, ErrorCode::InvalidMixinDeclaration) {
            e.message(format!(
                "Wrong number of arguments to `mixes_in_class_methods`: Expected: `1`, got: `{}`",
                args.len()
            ))
            .emit();
        }
        return;
    }

    let ExprKind::ConstantLit { symbol, .. } = arena.kind(args[0]) else {
        report_unresolvable(gs, diags, loc);
        return;
    };
    let symbol = *symbol;
    if !symbol.exists() || !gs.is_class(symbol) {
        report_unresolvable(gs, diags, loc);
        return;
    }
    if !gs.is_class_module(symbol) {
        if let Some(e) = diags.begin_error(&gs.files, loc, ErrorCode::InvalidMixinDeclaration) {
            e.message(format!(
                "`{}` is a class, not a module; Only modules may be mixins",
                gs.show_full_name(symbol)
            ))
            .emit();
        }
        return;
    }
    if symbol == owner {
        if let Some(e) = diags.begin_error(&gs.files, loc, ErrorCode::InvalidMixinDeclaration) {
            e.message("Must not pass your self to `mixes_in_class_methods`")
                .emit();
        }
        return;
    }

    let class_methods = gs.names.class_methods;
    let existing = gs.find_member(owner, class_methods);
    if existing.exists() && existing != symbol {
        if let Some(e) = diags.begin_error(&gs.files, loc, ErrorCode::InvalidMixinDeclaration) {
            e.message(format!(
                "Redeclaring `mixes_in_class_methods` from module `{}` to module `{}`",
                gs.show_full_name(existing),
                gs.show_full_name(symbol)
            ))
            .emit();
        }
        return;
    }
    gs.symbol_mut(owner).members.insert(class_methods, symbol);
}

fn report_unresolvable(gs: &SymbolTable, diags: &mut DiagnosticQueue, loc: Loc) {
    if let Some(e) = diags.begin_error(&gs.files, loc, ErrorCode::InvalidMixinDeclaration) {
        e.message("Argument to `mixes_in_class_methods` must be statically resolvable to a module")
            .emit();
    }
}
