//! Test fixtures: a miniature namer.
//!
//! The resolver runs after the namer has entered tentative symbols and
//! built trees full of `UnresolvedConstantLit` nodes. These helpers play
//! that role for tests: they enter files, symbols and arena trees with
//! distinct, increasing spans so diagnostics order deterministically.

// Each integration test compiles its own copy; not every test uses every
// helper.
#![allow(dead_code)]

use rue_ast::{mk, ClassKind, ExprArena, ExprId, ExprKind, MethodDefFlags, Tree};
use rue_core::{
    ArgInfo, FileId, LiteralValue, Loc, Name, Span, StrictLevel, SymbolFlags, SymbolRef,
    SymbolTable, Type, Types,
};

pub struct Fixture {
    pub gs: SymbolTable,
    next_offset: u32,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            gs: SymbolTable::new(),
            next_offset: 0,
        }
    }

    pub fn file(&mut self, path: &str, strict: StrictLevel) -> FileId {
        self.gs.enter_file(path, strict, strict, false)
    }

    pub fn file_full(
        &mut self,
        path: &str,
        strict: StrictLevel,
        sigil: StrictLevel,
        permit_overloads: bool,
    ) -> FileId {
        self.gs.enter_file(path, strict, sigil, permit_overloads)
    }

    pub fn name(&self, s: &str) -> Name {
        self.gs.interner.intern(s)
    }

    fn next_loc(&mut self, file: FileId) -> Loc {
        let start = self.next_offset;
        self.next_offset += 10;
        Loc::new(file, Span::new(start, start + 5))
    }

    pub fn class(&mut self, file: FileId, owner: SymbolRef, name: &str) -> SymbolRef {
        let name = self.name(name);
        let loc = self.next_loc(file);
        self.gs.enter_class_symbol(loc, owner, name, false)
    }

    pub fn module(&mut self, file: FileId, owner: SymbolRef, name: &str) -> SymbolRef {
        let name = self.name(name);
        let loc = self.next_loc(file);
        self.gs.enter_class_symbol(loc, owner, name, true)
    }

    pub fn static_field(&mut self, file: FileId, owner: SymbolRef, name: &str) -> SymbolRef {
        let name = self.name(name);
        let loc = self.next_loc(file);
        self.gs.enter_static_field_symbol(loc, owner, name)
    }

    /// A static field the namer already recognized as a type alias.
    pub fn type_alias_field(&mut self, file: FileId, owner: SymbolRef, name: &str) -> SymbolRef {
        let sym = self.static_field(file, owner, name);
        self.gs.symbol_mut(sym).flags.insert(SymbolFlags::TYPE_ALIAS);
        sym
    }

    /// A type member with the namer's placeholder bounds.
    pub fn type_member(&mut self, file: FileId, owner: SymbolRef, name: &str) -> SymbolRef {
        let name = self.name(name);
        let loc = self.next_loc(file);
        let sym = self.gs.enter_type_member_symbol(loc, owner, name);
        self.gs.symbol_mut(sym).result_type = Some(Type::LambdaParam {
            lower: Box::new(Types::untyped(sym)),
            upper: Box::new(Types::untyped(sym)),
        });
        sym
    }

    pub fn method(
        &mut self,
        file: FileId,
        owner: SymbolRef,
        name: &str,
        arg_names: &[&str],
    ) -> SymbolRef {
        let name = self.name(name);
        let loc = self.next_loc(file);
        let method = self.gs.enter_method_symbol(loc, owner, name);
        for arg_name in arg_names {
            let arg_name = self.gs.interner.intern(arg_name);
            let arg_loc = self.next_loc(file);
            self.gs
                .symbol_mut(method)
                .arguments
                .push(ArgInfo::positional(arg_name, arg_loc));
        }
        method
    }

    pub fn set_arg_keyword(&mut self, method: SymbolRef, index: usize) {
        self.gs.symbol_mut(method).arguments[index].flags.keyword = true;
    }

    pub fn set_arg_default(&mut self, method: SymbolRef, index: usize) {
        self.gs.symbol_mut(method).arguments[index].flags.default = true;
    }

    pub fn tree(&self, file: FileId) -> TreeBuilder {
        TreeBuilder {
            file,
            arena: ExprArena::new(),
            next_offset: 1_000,
        }
    }
}

pub struct TreeBuilder {
    pub file: FileId,
    pub arena: ExprArena,
    next_offset: u32,
}

impl TreeBuilder {
    pub fn span(&mut self) -> Span {
        let start = self.next_offset;
        self.next_offset += 10;
        Span::new(start, start + 5)
    }

    pub fn empty(&mut self) -> ExprId {
        let span = self.span();
        mk::empty(&mut self.arena, span)
    }

    pub fn self_ref(&mut self) -> ExprId {
        let span = self.span();
        mk::self_ref(&mut self.arena, span)
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        let span = self.span();
        mk::literal(&mut self.arena, LiteralValue::Int(value), span)
    }

    pub fn sym(&mut self, gs: &SymbolTable, name: &str) -> ExprId {
        let name = gs.interner.intern(name);
        let span = self.span();
        mk::sym(&mut self.arena, name, span)
    }

    pub fn local(&mut self, gs: &SymbolTable, name: &str) -> ExprId {
        let name = gs.interner.intern(name);
        let span = self.span();
        mk::local(&mut self.arena, name, span)
    }

    pub fn uconst(&mut self, gs: &SymbolTable, name: &str) -> ExprId {
        let name = gs.interner.intern(name);
        let span = self.span();
        mk::unresolved_const(&mut self.arena, name, span)
    }

    pub fn uconst_scoped(&mut self, gs: &SymbolTable, scope: ExprId, name: &str) -> ExprId {
        let name = gs.interner.intern(name);
        let span = self.span();
        mk::unresolved_const_scoped(&mut self.arena, scope, name, span)
    }

    pub fn unresolved_ident(
        &mut self,
        gs: &SymbolTable,
        kind: rue_ast::IdentKind,
        name: &str,
    ) -> ExprId {
        let name = gs.interner.intern(name);
        let span = self.span();
        self.arena
            .push(ExprKind::UnresolvedIdent { kind, name }, span)
    }

    pub fn send(&mut self, recv: ExprId, gs: &SymbolTable, fun: &str, args: Vec<ExprId>) -> ExprId {
        let fun = gs.interner.intern(fun);
        let span = self.span();
        mk::send(&mut self.arena, recv, fun, args, span)
    }

    pub fn send_with_block(
        &mut self,
        recv: ExprId,
        gs: &SymbolTable,
        fun: &str,
        args: Vec<ExprId>,
        block_body: ExprId,
    ) -> ExprId {
        let fun = gs.interner.intern(fun);
        let span = self.span();
        mk::send_with_block(&mut self.arena, recv, fun, args, block_body, span)
    }

    pub fn assign(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        let span = self.span();
        mk::assign(&mut self.arena, lhs, rhs, span)
    }

    pub fn hash(&mut self, keys: Vec<ExprId>, values: Vec<ExprId>) -> ExprId {
        let span = self.span();
        mk::hash(&mut self.arena, keys, values, span)
    }

    pub fn optional_arg(&mut self, local: ExprId, default: ExprId) -> ExprId {
        let span = self.span();
        self.arena
            .push(ExprKind::OptionalArg { local, default }, span)
    }

    pub fn class_def(
        &mut self,
        symbol: SymbolRef,
        kind: ClassKind,
        ancestors: Vec<ExprId>,
        rhs: Vec<ExprId>,
    ) -> ExprId {
        let span = self.span();
        self.arena.push(
            ExprKind::ClassDef {
                symbol,
                kind,
                ancestors,
                singleton_ancestors: Vec::new(),
                rhs,
            },
            span,
        )
    }

    pub fn method_def(
        &mut self,
        gs: &SymbolTable,
        symbol: SymbolRef,
        name: &str,
        args: Vec<ExprId>,
        rhs: ExprId,
    ) -> ExprId {
        let name = gs.interner.intern(name);
        let span = self.span();
        self.arena.push(
            ExprKind::MethodDef {
                symbol,
                name,
                args,
                rhs,
                flags: MethodDefFlags::default(),
            },
            span,
        )
    }

    /// `sig { body }`.
    pub fn sig(&mut self, gs: &SymbolTable, body: ExprId) -> ExprId {
        let recv = self.empty();
        self.send_with_block(recv, gs, "sig", Vec::new(), body)
    }

    /// A reference to the `T` namespace.
    pub fn t_const(&mut self, gs: &SymbolTable) -> ExprId {
        self.uconst(gs, "T")
    }

    /// `T.type_alias(inner)`.
    pub fn type_alias_of(&mut self, gs: &SymbolTable, inner: ExprId) -> ExprId {
        let t = self.t_const(gs);
        self.send(t, gs, "type_alias", vec![inner])
    }

    pub fn finish(mut self, stats: Vec<ExprId>) -> Tree {
        let trailing = self.empty();
        let span = Span::new(0, self.next_offset);
        let root = mk::ins_seq(&mut self.arena, stats, trailing, span);
        Tree::new(self.file, self.arena, root)
    }
}

/// Assert no unresolved constant survives, following only reachable
/// children (replaced originals legitimately stay in the arena).
pub fn assert_no_unresolved(tree: &Tree) {
    fn check(arena: &ExprArena, id: ExprId) {
        match arena.kind(id) {
            ExprKind::UnresolvedConstantLit { .. } => {
                panic!("unresolved constant survived resolution")
            }
            ExprKind::ConstantLit { symbol, .. } => {
                assert!(symbol.exists(), "constant carries no symbol");
            }
            ExprKind::ClassDef {
                ancestors,
                singleton_ancestors,
                rhs,
                ..
            } => {
                for &child in ancestors.iter().chain(singleton_ancestors).chain(rhs) {
                    check(arena, child);
                }
            }
            ExprKind::MethodDef { args, rhs, .. } => {
                for &arg in args {
                    check(arena, arg);
                }
                check(arena, *rhs);
            }
            ExprKind::OptionalArg { local, default } => {
                check(arena, *local);
                check(arena, *default);
            }
            ExprKind::Assign { lhs, rhs } => {
                check(arena, *lhs);
                check(arena, *rhs);
            }
            ExprKind::Send {
                recv, args, block, ..
            } => {
                check(arena, *recv);
                for &arg in args {
                    check(arena, arg);
                }
                if let Some(block) = block {
                    check(arena, *block);
                }
            }
            ExprKind::Block { args, body } => {
                for &arg in args {
                    check(arena, arg);
                }
                check(arena, *body);
            }
            ExprKind::Cast { arg, .. } => check(arena, *arg),
            ExprKind::Hash { keys, values } => {
                for &child in keys.iter().chain(values) {
                    check(arena, child);
                }
            }
            ExprKind::InsSeq { stats, expr } => {
                for &stat in stats {
                    check(arena, stat);
                }
                check(arena, *expr);
            }
            ExprKind::KeepForTypechecking { expr } => check(arena, *expr),
            _ => {}
        }
    }
    check(&tree.arena, tree.root);
}
