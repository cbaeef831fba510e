//! P4: compute and validate type-member bounds.
//!
//! The namer enters `X = type_member` assignments with placeholder bounds.
//! This pass parses the options hash (`fixed:`, `lower:`, `upper:`), checks
//! the bounds against a same-named member on the superclass, and stores the
//! final bounds on the symbol.

use rue_ast::{ExprArena, ExprId, ExprKind, Tree};
use rue_core::{FileId, Loc, Name, SymbolTable, Type, Types};
use rue_diagnostic::{DiagnosticQueue, ErrorCode};

use crate::type_syntax::{self, ParsedSig, TypeSyntaxArgs};

pub(crate) fn resolve_type_params(
    gs: &mut SymbolTable,
    trees: &mut [Tree],
    diags: &mut DiagnosticQueue,
) {
    tracing::debug!("resolver.type_params");
    for tree in trees.iter_mut() {
        let root = tree.root;
        walk(gs, diags, tree.file, &tree.arena, root);
    }
}

fn walk(
    gs: &mut SymbolTable,
    diags: &mut DiagnosticQueue,
    file: FileId,
    arena: &ExprArena,
    id: ExprId,
) {
    match arena.kind(id) {
        ExprKind::ClassDef { rhs, .. } => {
            for &stat in rhs {
                walk(gs, diags, file, arena, stat);
            }
        }
        ExprKind::InsSeq { stats, expr } => {
            for &stat in stats {
                walk(gs, diags, file, arena, stat);
            }
            walk(gs, diags, file, arena, *expr);
        }
        ExprKind::MethodDef { rhs, .. } => walk(gs, diags, file, arena, *rhs),
        ExprKind::Assign { lhs, rhs } => {
            handle_assign(gs, diags, file, arena, *lhs, *rhs);
        }
        _ => {}
    }
}

fn handle_assign(
    gs: &mut SymbolTable,
    diags: &mut DiagnosticQueue,
    file: FileId,
    arena: &ExprArena,
    lhs: ExprId,
    rhs: ExprId,
) {
    let ExprKind::ConstantLit { symbol, .. } = arena.kind(lhs) else {
        return;
    };
    let sym = *symbol;
    if !sym.exists() || gs.is_type_alias(sym) || !gs.is_type_member(sym) {
        return;
    }

    let ExprKind::Send {
        recv,
        fun,
        args: send_args,
        ..
    } = arena.kind(rhs)
    else {
        debug_assert!(false, "type member assignment without a declaration call");
        return;
    };
    debug_assert!(arena.kind(*recv).is_self_reference());
    debug_assert!(*fun == gs.names.type_member || *fun == gs.names.type_template);
    let send_loc = Loc::new(file, arena.span(rhs));

    // The namer parks placeholder bounds on the symbol; real bounds start
    // from the widest interval and narrow from the options hash.
    let mut lower = Types::bottom();
    let mut upper = Types::top();

    // A same-named member on the superclass constrains our bounds.
    let member_name = gs.symbol(sym).name;
    let owner = gs.symbol(sym).owner;
    let parent = gs.symbol(owner).superclass;
    let mut parent_bounds: Option<(Type, Type)> = None;
    let parent_member = gs.find_member(parent, member_name);
    if parent_member.exists() {
        if gs.is_type_member(parent_member) {
            if let Some(Type::LambdaParam {
                lower: parent_lower,
                upper: parent_upper,
            }) = &gs.symbol(parent_member).result_type
            {
                parent_bounds = Some((parent_lower.as_ref().clone(), parent_upper.as_ref().clone()));
            }
        } else if let Some(e) =
            diags.begin_error(&gs.files, send_loc, ErrorCode::ParentTypeBoundsMismatch)
        {
            let parent_show = gs.show_full_name(parent_member);
            e.message(format!(
                "`{}` is a type member but `{}` is not a type member",
                gs.show_full_name(sym),
                parent_show
            ))
            .secondary_label(
                gs.symbol(parent_member).loc,
                format!("`{parent_show}` definition"),
            )
            .emit();
        }
    }

    // The options hash may come first or follow a variance symbol. Absent
    // options leave the bounds at top and bottom.
    let hash = match (send_args.first(), send_args.get(1)) {
        (_, Some(&second)) if matches!(arena.kind(second), ExprKind::Hash { .. }) => Some(second),
        (Some(&first), _) if matches!(arena.kind(first), ExprKind::Hash { .. }) => Some(first),
        _ => None,
    };

    if let Some(hash) = hash {
        let ExprKind::Hash { keys, values } = arena.kind(hash) else {
            unreachable!("filtered to hashes above");
        };
        let args = TypeSyntaxArgs {
            allow_self_type: true,
            allow_rebind: false,
            allow_type_member: false,
            context: sym,
        };
        for (&key, &value) in keys.iter().zip(values) {
            let Some(key_name) = key_symbol_name(arena, key) else {
                continue;
            };
            let ty = type_syntax::get_result_type(
                gs,
                diags,
                file,
                arena,
                value,
                &ParsedSig::default(),
                &args,
            );
            if key_name == gs.names.fixed {
                lower = ty.clone();
                upper = ty;
            } else if key_name == gs.names.lower {
                lower = ty;
            } else if key_name == gs.names.upper {
                upper = ty;
            }
        }
    }

    // Validate against the parent's bounds. A `fixed` member collapses the
    // interval, which makes the final check a no-op.
    if let Some((parent_lower, parent_upper)) = parent_bounds {
        if !Types::is_subtype(gs, &parent_lower, &lower) {
            if let Some(e) =
                diags.begin_error(&gs.files, send_loc, ErrorCode::ParentTypeBoundsMismatch)
            {
                e.message(format!(
                    "parent lower bound `{}` is not a subtype of lower bound `{}`",
                    Types::show(gs, &parent_lower),
                    Types::show(gs, &lower)
                ))
                .emit();
            }
        }
        if !Types::is_subtype(gs, &upper, &parent_upper) {
            if let Some(e) =
                diags.begin_error(&gs.files, send_loc, ErrorCode::ParentTypeBoundsMismatch)
            {
                e.message(format!(
                    "upper bound `{}` is not a subtype of parent upper bound `{}`",
                    Types::show(gs, &upper),
                    Types::show(gs, &parent_upper)
                ))
                .emit();
            }
        }
    }

    if !Types::is_subtype(gs, &lower, &upper) {
        if let Some(e) =
            diags.begin_error(&gs.files, send_loc, ErrorCode::InvalidTypeMemberBounds)
        {
            e.message(format!(
                "`{}` is not a subtype of `{}`",
                Types::show(gs, &lower),
                Types::show(gs, &upper)
            ))
            .emit();
        }
    }

    gs.symbol_mut(sym).result_type = Some(Type::LambdaParam {
        lower: Box::new(lower),
        upper: Box::new(upper),
    });
}

fn key_symbol_name(arena: &ExprArena, key: ExprId) -> Option<Name> {
    match arena.kind(key) {
        ExprKind::Literal(value) => value.as_sym(),
        _ => None,
    }
}
