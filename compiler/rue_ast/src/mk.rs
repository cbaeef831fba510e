//! Small node constructors.
//!
//! Shorthands for the node shapes tests and tree rewrites build most often.

use rue_core::{LiteralValue, Name, Span, SymbolRef, Type};

use crate::{CastKind, ExprArena, ExprId, ExprKind};

/// An empty tree node.
pub fn empty(arena: &mut ExprArena, span: Span) -> ExprId {
    arena.push(ExprKind::EmptyTree, span)
}

/// A `self` reference.
pub fn self_ref(arena: &mut ExprArena, span: Span) -> ExprId {
    arena.push(ExprKind::SelfRef, span)
}

/// A literal.
pub fn literal(arena: &mut ExprArena, value: LiteralValue, span: Span) -> ExprId {
    arena.push(ExprKind::Literal(value), span)
}

/// A symbol literal, e.g. `:fixed`.
pub fn sym(arena: &mut ExprArena, name: Name, span: Span) -> ExprId {
    literal(arena, LiteralValue::Sym(name), span)
}

/// A local variable read.
pub fn local(arena: &mut ExprArena, name: Name, span: Span) -> ExprId {
    arena.push(ExprKind::Local { name }, span)
}

/// An unqualified unresolved constant reference.
pub fn unresolved_const(arena: &mut ExprArena, name: Name, span: Span) -> ExprId {
    let scope = empty(arena, span);
    arena.push(ExprKind::UnresolvedConstantLit { scope, name }, span)
}

/// A scoped unresolved constant reference (`scope::name`).
pub fn unresolved_const_scoped(
    arena: &mut ExprArena,
    scope: ExprId,
    name: Name,
    span: Span,
) -> ExprId {
    arena.push(ExprKind::UnresolvedConstantLit { scope, name }, span)
}

/// An already-resolved constant reference (synthesized nodes only).
pub fn resolved_const(arena: &mut ExprArena, symbol: SymbolRef, span: Span) -> ExprId {
    arena.push(
        ExprKind::ConstantLit {
            symbol,
            original: None,
            resolution_scope: SymbolRef::NONE,
        },
        span,
    )
}

/// A method call.
pub fn send(
    arena: &mut ExprArena,
    recv: ExprId,
    fun: Name,
    args: Vec<ExprId>,
    span: Span,
) -> ExprId {
    arena.push(
        ExprKind::Send {
            recv,
            fun,
            args,
            block: None,
        },
        span,
    )
}

/// A method call with a block.
pub fn send_with_block(
    arena: &mut ExprArena,
    recv: ExprId,
    fun: Name,
    args: Vec<ExprId>,
    block_body: ExprId,
    span: Span,
) -> ExprId {
    let block = arena.push(
        ExprKind::Block {
            args: Vec::new(),
            body: block_body,
        },
        span,
    );
    arena.push(
        ExprKind::Send {
            recv,
            fun,
            args,
            block: Some(block),
        },
        span,
    )
}

/// An assignment.
pub fn assign(arena: &mut ExprArena, lhs: ExprId, rhs: ExprId, span: Span) -> ExprId {
    arena.push(ExprKind::Assign { lhs, rhs }, span)
}

/// A type assertion node.
pub fn cast(arena: &mut ExprArena, kind: CastKind, ty: Type, arg: ExprId, span: Span) -> ExprId {
    arena.push(ExprKind::Cast { kind, ty, arg }, span)
}

/// An instruction sequence.
pub fn ins_seq(arena: &mut ExprArena, stats: Vec<ExprId>, expr: ExprId, span: Span) -> ExprId {
    arena.push(ExprKind::InsSeq { stats, expr }, span)
}

/// A keyword hash.
pub fn hash(arena: &mut ExprArena, keys: Vec<ExprId>, values: Vec<ExprId>, span: Span) -> ExprId {
    arena.push(ExprKind::Hash { keys, values }, span)
}
