//! Expression nodes.

use rue_core::{FileId, LiteralValue, Name, Span, SymbolRef, Type};

use crate::{ExprArena, ExprId};

/// One parsed file: its arena of nodes plus the root expression.
#[derive(Clone, Debug)]
pub struct Tree {
    pub file: FileId,
    pub arena: ExprArena,
    pub root: ExprId,
}

impl Tree {
    pub fn new(file: FileId, arena: ExprArena, root: ExprId) -> Self {
        Tree { file, arena, root }
    }
}

/// Expression node.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

/// Class vs module definition.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ClassKind {
    Class,
    Module,
}

/// Which namespace an unresolved identifier lives in.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IdentKind {
    Instance,
    Class,
    Local,
    Global,
}

/// Which `T.*` assertion produced a cast.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CastKind {
    Let,
    Cast,
    AssertType,
}

impl CastKind {
    /// Source-level name of the assertion.
    pub fn as_str(self) -> &'static str {
        match self {
            CastKind::Let => "let",
            CastKind::Cast => "cast",
            CastKind::AssertType => "assert_type",
        }
    }
}

/// Flags on a method definition node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct MethodDefFlags {
    /// `def self.foo` — defined on the singleton class.
    pub is_self_method: bool,
    /// Synthesized by a DSL rewriter rather than written by a user.
    pub dsl_synthesized: bool,
}

/// Expression variants.
///
/// The namer hands the resolver a forest containing `UnresolvedConstantLit`
/// nodes; the resolver replaces every one of them with a `ConstantLit` and
/// rewrites `T.*` assertions into `Cast` nodes.
#[derive(Clone, Debug)]
pub enum ExprKind {
    EmptyTree,
    Literal(LiteralValue),
    SelfRef,
    Local {
        name: Name,
    },
    UnresolvedIdent {
        kind: IdentKind,
        name: Name,
    },
    /// A constant reference still in syntactic form. `scope` is `EmptyTree`
    /// for an unqualified reference.
    UnresolvedConstantLit {
        scope: ExprId,
        name: Name,
    },
    /// A resolved constant reference. `original` keeps the unresolved node
    /// reachable for error rendering; `resolution_scope` records where
    /// resolution was attempted when the symbol is a stub.
    ConstantLit {
        symbol: SymbolRef,
        original: Option<ExprId>,
        resolution_scope: SymbolRef,
    },
    ClassDef {
        symbol: SymbolRef,
        kind: ClassKind,
        ancestors: Vec<ExprId>,
        singleton_ancestors: Vec<ExprId>,
        rhs: Vec<ExprId>,
    },
    MethodDef {
        symbol: SymbolRef,
        name: Name,
        args: Vec<ExprId>,
        rhs: ExprId,
        flags: MethodDefFlags,
    },
    /// A parameter with a default value. `local` is the `Local` node.
    OptionalArg {
        local: ExprId,
        default: ExprId,
    },
    Assign {
        lhs: ExprId,
        rhs: ExprId,
    },
    Send {
        recv: ExprId,
        fun: Name,
        args: Vec<ExprId>,
        block: Option<ExprId>,
    },
    Block {
        args: Vec<ExprId>,
        body: ExprId,
    },
    Cast {
        kind: CastKind,
        ty: Type,
        arg: ExprId,
    },
    Hash {
        keys: Vec<ExprId>,
        values: Vec<ExprId>,
    },
    InsSeq {
        stats: Vec<ExprId>,
        expr: ExprId,
    },
    /// Retains a type expression for the inferencer after a cast rewrite.
    KeepForTypechecking {
        expr: ExprId,
    },
}

impl ExprKind {
    /// Whether this node is a `self` reference.
    pub fn is_self_reference(&self) -> bool {
        matches!(self, ExprKind::SelfRef)
    }

    /// Whether this node is the empty tree.
    pub fn is_empty_tree(&self) -> bool {
        matches!(self, ExprKind::EmptyTree)
    }
}
