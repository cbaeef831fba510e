//! Per-file expression arena.

use std::fmt;

use rue_core::Span;

use crate::{Expr, ExprKind};

/// Index of a node in an [`ExprArena`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    /// Create from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ExprId(raw)
    }

    /// Get the raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Contiguous node storage for one tree.
///
/// Ids are stable: nodes are only appended or rewritten in place, never
/// removed, so an `ExprId` captured during the first walk still addresses
/// the same slot during the fixed-point loop.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    nodes: Vec<Expr>,
}

impl ExprArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        ExprArena { nodes: Vec::new() }
    }

    /// Append a node and return its id.
    pub fn push(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = u32::try_from(self.nodes.len()).expect("expression arena overflow");
        self.nodes.push(Expr::new(kind, span));
        ExprId::from_raw(id)
    }

    /// Read a node.
    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.raw() as usize]
    }

    /// Mutate a node.
    #[inline]
    pub fn get_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.nodes[id.raw() as usize]
    }

    /// Read a node's kind.
    #[inline]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.get(id).kind
    }

    /// Read a node's span.
    #[inline]
    pub fn span(&self, id: ExprId) -> Span {
        self.get(id).span
    }

    /// Replace a node in place, keeping its id and span.
    pub fn replace(&mut self, id: ExprId, kind: ExprKind) {
        self.get_mut(id).kind = kind;
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Clone the subtree rooted at `id` into fresh nodes.
    ///
    /// Used when a default-argument expression must appear both in the
    /// parameter list and in the synthesized body check.
    pub fn deep_copy(&mut self, id: ExprId) -> ExprId {
        let span = self.span(id);
        let kind = match self.kind(id).clone() {
            k @ (ExprKind::EmptyTree
            | ExprKind::Literal(_)
            | ExprKind::SelfRef
            | ExprKind::Local { .. }
            | ExprKind::UnresolvedIdent { .. }
            | ExprKind::ConstantLit { .. }) => k,
            ExprKind::UnresolvedConstantLit { scope, name } => ExprKind::UnresolvedConstantLit {
                scope: self.deep_copy(scope),
                name,
            },
            ExprKind::ClassDef {
                symbol,
                kind,
                ancestors,
                singleton_ancestors,
                rhs,
            } => ExprKind::ClassDef {
                symbol,
                kind,
                ancestors: self.deep_copy_all(&ancestors),
                singleton_ancestors: self.deep_copy_all(&singleton_ancestors),
                rhs: self.deep_copy_all(&rhs),
            },
            ExprKind::MethodDef {
                symbol,
                name,
                args,
                rhs,
                flags,
            } => ExprKind::MethodDef {
                symbol,
                name,
                args: self.deep_copy_all(&args),
                rhs: self.deep_copy(rhs),
                flags,
            },
            ExprKind::OptionalArg { local, default } => ExprKind::OptionalArg {
                local: self.deep_copy(local),
                default: self.deep_copy(default),
            },
            ExprKind::Assign { lhs, rhs } => ExprKind::Assign {
                lhs: self.deep_copy(lhs),
                rhs: self.deep_copy(rhs),
            },
            ExprKind::Send {
                recv,
                fun,
                args,
                block,
            } => ExprKind::Send {
                recv: self.deep_copy(recv),
                fun,
                args: self.deep_copy_all(&args),
                block: block.map(|b| self.deep_copy(b)),
            },
            ExprKind::Block { args, body } => ExprKind::Block {
                args: self.deep_copy_all(&args),
                body: self.deep_copy(body),
            },
            ExprKind::Cast { kind, ty, arg } => ExprKind::Cast {
                kind,
                ty,
                arg: self.deep_copy(arg),
            },
            ExprKind::Hash { keys, values } => ExprKind::Hash {
                keys: self.deep_copy_all(&keys),
                values: self.deep_copy_all(&values),
            },
            ExprKind::InsSeq { stats, expr } => ExprKind::InsSeq {
                stats: self.deep_copy_all(&stats),
                expr: self.deep_copy(expr),
            },
            ExprKind::KeepForTypechecking { expr } => ExprKind::KeepForTypechecking {
                expr: self.deep_copy(expr),
            },
        };
        self.push(kind, span)
    }

    fn deep_copy_all(&mut self, ids: &[ExprId]) -> Vec<ExprId> {
        ids.iter().map(|&id| self.deep_copy(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rue_core::LiteralValue;

    #[test]
    fn test_replace_keeps_id_and_span() {
        let mut arena = ExprArena::new();
        let id = arena.push(ExprKind::EmptyTree, Span::new(3, 7));
        arena.replace(id, ExprKind::Literal(LiteralValue::Int(42)));
        assert_eq!(arena.span(id), Span::new(3, 7));
        assert!(matches!(
            arena.kind(id),
            ExprKind::Literal(LiteralValue::Int(42))
        ));
    }

    #[test]
    fn test_deep_copy_is_disjoint() {
        let mut arena = ExprArena::new();
        let lit = arena.push(ExprKind::Literal(LiteralValue::Int(1)), Span::DUMMY);
        let seq = arena.push(
            ExprKind::InsSeq {
                stats: vec![lit],
                expr: lit,
            },
            Span::DUMMY,
        );

        let copy = arena.deep_copy(seq);
        assert_ne!(copy, seq);
        let ExprKind::InsSeq { stats, expr } = arena.kind(copy).clone() else {
            panic!("expected a sequence");
        };
        assert_ne!(stats[0], lit);
        assert_ne!(expr, lit);
    }
}
