//! Constant and ancestor resolution — the fixed-point engine.
//!
//! Rue resolves constants via ancestors: superclasses and mixins bring
//! inherited constants into scope, but superclasses and mixins are
//! themselves constant references, so some constants cannot resolve until
//! others have. Failed resolutions are parked on todo lists and iterated to
//! a fixed point: either everything resolves, or no new constant resolves
//! and the leftovers are stubbed out with errors.
//!
//! Four todo lists drive the loop:
//!
//! - constants awaiting resolution
//! - ancestors whose class slots await resolved constants
//! - class aliases (which know the symbol they alias)
//! - type aliases (which need their whole right-hand side resolved)
//!
//! The lists are separate because success means different symbol-table
//! mutations for each, and because any success anywhere can unlock items on
//! the other lists, which is exactly the outer loop's progress condition.
//!
//! After this pass every `UnresolvedConstantLit` in the forest has been
//! replaced by a `ConstantLit`, every class knows its place in the ancestor
//! hierarchy, and every type alias symbol carries its aliased type.
//!
//! The first walk over the forest is parallel: workers own disjoint trees,
//! collect their own todo lists and diagnostics, and only read the symbol
//! table. Everything after the merge is single-threaded because it mutates
//! shared symbols.

use std::sync::Arc;

use rayon::prelude::*;

use rue_ast::{mk, ClassKind, ExprArena, ExprId, ExprKind, Tree};
use rue_core::{FileId, Loc, Name, SymbolRef, SymbolTable, Types};
use rue_diagnostic::{DiagnosticQueue, ErrorCode};

use crate::type_syntax::{self, ParsedSig, TypeSyntaxArgs};

/// Lexical class/module nesting at a use site.
///
/// A persistent cons list: pushing shares the parent chain, so the many
/// suspended jobs created under one scope all share one allocation per
/// level.
pub(crate) struct Nesting {
    parent: Option<Arc<Nesting>>,
    scope: SymbolRef,
}

impl Nesting {
    fn root() -> Arc<Nesting> {
        Arc::new(Nesting {
            parent: None,
            scope: SymbolRef::ROOT,
        })
    }

    fn push(parent: &Arc<Nesting>, scope: SymbolRef) -> Arc<Nesting> {
        Arc::new(Nesting {
            parent: Some(Arc::clone(parent)),
            scope,
        })
    }
}

/// Address of a node in the forest: tree index plus arena id.
///
/// Items hold these instead of references so they stay valid across the
/// worker/main-thread handoff; node ids are stable for the life of a tree.
#[derive(Copy, Clone, Debug)]
pub(crate) struct NodeRef {
    pub tree: u32,
    pub id: ExprId,
}

/// A constant reference that did not resolve yet.
struct ResolutionItem {
    nesting: Arc<Nesting>,
    out: NodeRef,
}

/// An ancestor slot awaiting its constant.
struct AncestorResolutionItem {
    ancestor: NodeRef,
    klass: SymbolRef,
    is_superclass: bool,
}

/// A `X = SomeConstant` alias awaiting its right-hand symbol.
struct ClassAliasResolutionItem {
    lhs: SymbolRef,
    rhs: NodeRef,
}

/// A `X = T.type_alias(rhs)` awaiting a fully resolved right-hand side.
struct TypeAliasResolutionItem {
    lhs: SymbolRef,
    rhs: NodeRef,
}

fn node_loc(trees: &[Tree], node: NodeRef) -> Loc {
    let tree = &trees[node.tree as usize];
    Loc::new(tree.file, tree.arena.span(node.id))
}

/// How many scope levels a constant reference spells out (`A::B::C` = 2).
fn constant_depth(arena: &ExprArena, id: ExprId) -> u32 {
    let mut depth = 0;
    let mut current = id;
    loop {
        let ExprKind::ConstantLit {
            original: Some(original),
            ..
        } = arena.kind(current)
        else {
            break;
        };
        let ExprKind::UnresolvedConstantLit { scope, .. } = arena.kind(*original) else {
            break;
        };
        if matches!(arena.kind(*scope), ExprKind::ConstantLit { .. }) {
            depth += 1;
            current = *scope;
        } else {
            break;
        }
    }
    depth
}

/// A resolved constant that still counts as pending: a type alias is only
/// usable once its aliased type is known.
fn is_already_resolved(gs: &SymbolTable, symbol: SymbolRef) -> bool {
    if !symbol.exists() {
        return false;
    }
    if gs.is_type_alias(symbol) {
        gs.symbol(symbol).result_type.is_some()
    } else {
        true
    }
}

/// Whether every constant embedded in `expr` is resolved (type aliases
/// additionally need their type). Gates type-alias right-hand sides.
fn is_fully_resolved(gs: &SymbolTable, arena: &ExprArena, expr: ExprId) -> bool {
    match arena.kind(expr) {
        ExprKind::ConstantLit { symbol, .. } => is_already_resolved(gs, *symbol),
        ExprKind::UnresolvedConstantLit { .. } => false,
        ExprKind::Send {
            recv, args, block, ..
        } => {
            is_fully_resolved(gs, arena, *recv)
                && args.iter().all(|&a| is_fully_resolved(gs, arena, a))
                && block.map_or(true, |b| is_fully_resolved(gs, arena, b))
        }
        ExprKind::Block { args, body } => {
            args.iter().all(|&a| is_fully_resolved(gs, arena, a))
                && is_fully_resolved(gs, arena, *body)
        }
        ExprKind::Hash { keys, values } => {
            keys.iter().all(|&k| is_fully_resolved(gs, arena, k))
                && values.iter().all(|&v| is_fully_resolved(gs, arena, v))
        }
        ExprKind::Assign { lhs, rhs } => {
            is_fully_resolved(gs, arena, *lhs) && is_fully_resolved(gs, arena, *rhs)
        }
        ExprKind::InsSeq { stats, expr } => {
            stats.iter().all(|&s| is_fully_resolved(gs, arena, s))
                && is_fully_resolved(gs, arena, *expr)
        }
        ExprKind::Cast { arg, .. } => is_fully_resolved(gs, arena, *arg),
        ExprKind::KeepForTypechecking { expr } => is_fully_resolved(gs, arena, *expr),
        ExprKind::OptionalArg { local, default } => {
            is_fully_resolved(gs, arena, *local) && is_fully_resolved(gs, arena, *default)
        }
        _ => true,
    }
}

/// Two-stage lexical lookup: direct members innermost-to-outermost along
/// the nesting, then inherited members at the use site's scope.
fn resolve_lhs(gs: &SymbolTable, nesting: &Nesting, name: Name) -> SymbolRef {
    let mut scope = Some(nesting);
    while let Some(level) = scope {
        let found = gs.find_member(level.scope, name);
        if found.exists() {
            return found;
        }
        scope = level.parent.as_deref();
    }
    gs.find_member_transitive(nesting.scope, name)
}

/// Resolve one constant reference.
///
/// Returns `NONE` for "pending" (the scope is not resolved yet — requeue),
/// and the `untyped` sentinel after emitting a syntax-level reject
/// (constant through a type alias, constant on a dynamic scope).
fn resolve_constant(
    gs: &SymbolTable,
    diags: &mut DiagnosticQueue,
    file: FileId,
    arena: &ExprArena,
    nesting: &Nesting,
    original: ExprId,
) -> SymbolRef {
    let ExprKind::UnresolvedConstantLit { scope, name } = arena.kind(original) else {
        debug_assert!(false, "resolve_constant on a non-constant node");
        return SymbolRef::NONE;
    };
    let loc = Loc::new(file, arena.span(original));

    match arena.kind(*scope) {
        ExprKind::EmptyTree => resolve_lhs(gs, nesting, *name),
        ExprKind::ConstantLit { symbol, .. } => {
            if symbol.exists() && gs.is_type_alias(*symbol) {
                if let Some(e) = diags.begin_error(&gs.files, loc, ErrorCode::ConstantInTypeAlias) {
                    e.message("Resolving constants through type aliases is not supported")
                        .emit();
                }
                return SymbolRef::UNTYPED;
            }
            if !symbol.exists() {
                return SymbolRef::NONE;
            }
            let resolved = gs.dealias(*symbol);
            gs.find_member(resolved, *name)
        }
        _ => {
            if let Some(e) = diags.begin_error(&gs.files, loc, ErrorCode::DynamicConstant) {
                e.message("Dynamic constant references are unsupported")
                    .emit();
            }
            SymbolRef::UNTYPED
        }
    }
}

fn set_constant_symbol(arena: &mut ExprArena, id: ExprId, new_symbol: SymbolRef) {
    if let ExprKind::ConstantLit { symbol, .. } = &mut arena.get_mut(id).kind {
        *symbol = new_symbol;
    } else {
        debug_assert!(false, "set_constant_symbol on a non-constant node");
    }
}

/// Try to resolve one queued constant. True on success.
fn resolve_job(
    gs: &SymbolTable,
    diags: &mut DiagnosticQueue,
    file: FileId,
    arena: &mut ExprArena,
    nesting: &Nesting,
    out: ExprId,
) -> bool {
    let ExprKind::ConstantLit {
        symbol,
        original: Some(original),
        ..
    } = arena.kind(out)
    else {
        debug_assert!(false, "resolution item without an original node");
        return true;
    };
    if is_already_resolved(gs, *symbol) {
        return true;
    }
    let original = *original;

    let resolved = resolve_constant(gs, diags, file, arena, nesting, original);
    if !resolved.exists() {
        return false;
    }
    if gs.is_type_alias(resolved) && gs.symbol(resolved).result_type.is_none() {
        // The alias itself exists but its type is still pending.
        return false;
    }
    set_constant_symbol(arena, out, resolved);
    true
}

/// Report a constant that will never resolve and stub it out.
///
/// Returns true when a type alias was forced to `untyped`, which may
/// unblock queued type-alias right-hand sides.
fn constant_resolution_failed(
    gs: &mut SymbolTable,
    diags: &mut DiagnosticQueue,
    trees: &mut [Tree],
    item: &ResolutionItem,
) -> bool {
    let tree = &trees[item.out.tree as usize];
    let file = tree.file;
    let ExprKind::ConstantLit {
        symbol,
        original: Some(original),
        ..
    } = tree.arena.kind(item.out.id)
    else {
        debug_assert!(false, "resolution item without an original node");
        return false;
    };
    let out_symbol = *symbol;
    let original = *original;
    let use_loc = Loc::new(file, tree.arena.span(original));

    let resolved = resolve_constant(gs, diags, file, &tree.arena, &item.nesting, original);
    if resolved.exists() && gs.is_type_alias(resolved) {
        let mut forced = false;
        if gs.symbol(resolved).result_type.is_none() {
            // A use-site error, emitted once per alias: the result type
            // write is the "already reported" marker.
            let def_loc = gs.symbol(resolved).loc;
            if let Some(e) = diags.begin_error(&gs.files, def_loc, ErrorCode::RecursiveTypeAlias) {
                e.message(format!(
                    "Unable to resolve right hand side of type alias `{}`",
                    gs.show_full_name(resolved)
                ))
                .secondary_label(use_loc, "Type alias used here")
                .emit();
            }
            gs.symbol_mut(resolved).result_type = Some(Types::untyped(resolved));
            forced = true;
        }
        set_constant_symbol(&mut trees[item.out.tree as usize].arena, item.out.id, resolved);
        return forced;
    }
    if resolved.exists() {
        // A late success; nothing to report.
        set_constant_symbol(&mut trees[item.out.tree as usize].arena, item.out.id, resolved);
        return false;
    }

    let tree = &trees[item.out.tree as usize];
    let ExprKind::UnresolvedConstantLit { scope, name } = tree.arena.kind(original) else {
        return false;
    };
    let name = *name;

    let scope_sym = if out_symbol.exists() {
        gs.dealias(out_symbol)
    } else if let ExprKind::ConstantLit { symbol, .. } = tree.arena.kind(*scope) {
        gs.dealias(*symbol)
    } else {
        item.nesting.scope
    };

    let custom_autogen_error = name == gs.names.subclasses;
    if scope_sym != SymbolRef::STUB_MODULE || custom_autogen_error {
        if let Some(e) = diags.begin_error(&gs.files, use_loc, ErrorCode::StubConstant) {
            let mut e = e.message(format!(
                "Unable to resolve constant `{}`",
                gs.interner.lookup(name)
            ));
            if custom_autogen_error {
                e = e.note(
                    "If this constant is generated, you may need to re-run the code generator",
                );
            } else if gs.is_class(scope_sym) {
                for suggestion in gs.find_member_fuzzy_match(scope_sym, name, 3) {
                    e = e.secondary_label(
                        gs.symbol(suggestion.symbol).loc,
                        format!("Did you mean: `{}`?", gs.show_full_name(suggestion.symbol)),
                    );
                }
            }
            e.emit();
        }
    }

    let resolution_scope = if scope_sym == SymbolRef::STUB_MODULE {
        SymbolRef::NONE
    } else {
        scope_sym
    };
    let arena = &mut trees[item.out.tree as usize].arena;
    if let ExprKind::ConstantLit {
        symbol,
        resolution_scope: out_scope,
        ..
    } = &mut arena.get_mut(item.out.id).kind
    {
        *symbol = SymbolRef::STUB_MODULE;
        *out_scope = resolution_scope;
    }
    false
}

/// Resolve one queued type alias. True when the job reached a decision.
fn resolve_type_alias_job(
    gs: &mut SymbolTable,
    diags: &mut DiagnosticQueue,
    trees: &[Tree],
    item: &TypeAliasResolutionItem,
) -> bool {
    let tree = &trees[item.rhs.tree as usize];
    let rhs_loc = node_loc(trees, item.rhs);

    // Aliases may not appear under a generic class: a type member in scope
    // would make the alias's meaning depend on the instantiation.
    let mut enclosing_type_member = SymbolRef::NONE;
    let mut enclosing_class = gs.enclosing_class(item.lhs);
    while enclosing_class != SymbolRef::ROOT && enclosing_class.exists() {
        let type_members = &gs.symbol(enclosing_class).type_members;
        if let Some(&first) = type_members.first() {
            enclosing_type_member = first;
            break;
        }
        enclosing_class = gs.enclosing_class(gs.symbol(enclosing_class).owner);
    }
    if enclosing_type_member.exists() {
        if let Some(e) = diags.begin_error(&gs.files, rhs_loc, ErrorCode::TypeAliasInGenericClass) {
            e.message("Type aliases are not allowed in generic classes")
                .secondary_label(
                    gs.symbol(enclosing_type_member).loc,
                    "Here is enclosing generic member",
                )
                .emit();
        }
        gs.symbol_mut(item.lhs).result_type = Some(Types::untyped(item.lhs));
        return true;
    }

    if is_fully_resolved(gs, &tree.arena, item.rhs.id) {
        let args = TypeSyntaxArgs {
            allow_self_type: true,
            allow_rebind: false,
            allow_type_member: true,
            context: item.lhs,
        };
        let ty = type_syntax::get_result_type(
            gs,
            diags,
            tree.file,
            &tree.arena,
            item.rhs.id,
            &ParsedSig::default(),
            &args,
        );
        gs.symbol_mut(item.lhs).result_type = Some(ty);
        return true;
    }

    false
}

/// Resolve one queued class alias. True when the job reached a decision.
fn resolve_class_alias_job(
    gs: &mut SymbolTable,
    diags: &mut DiagnosticQueue,
    trees: &[Tree],
    item: &ClassAliasResolutionItem,
) -> bool {
    let ExprKind::ConstantLit { symbol: rhs_sym, .. } =
        trees[item.rhs.tree as usize].arena.kind(item.rhs.id)
    else {
        debug_assert!(false, "class alias with a non-constant right-hand side");
        return true;
    };
    let rhs_sym = *rhs_sym;
    if !rhs_sym.exists() {
        return false;
    }

    if gs.is_type_alias(rhs_sym) {
        let rhs_loc = node_loc(trees, item.rhs);
        if let Some(e) = diags.begin_error(&gs.files, rhs_loc, ErrorCode::ReassignsTypeAlias) {
            e.message("Reassigning a type alias is not allowed")
                .secondary_label(gs.symbol(rhs_sym).loc, "Originally defined here")
                .replacement("Declare as type alias", rhs_loc, "T.type_alias(...)")
                .emit();
        }
        gs.symbol_mut(item.lhs).result_type = Some(Types::untyped_untracked());
        return true;
    }

    if gs.dealias(rhs_sym) == item.lhs {
        let lhs_loc = gs.symbol(item.lhs).loc;
        if let Some(e) = diags.begin_error(&gs.files, lhs_loc, ErrorCode::RecursiveClassAlias) {
            e.message("Class alias aliases to itself").emit();
        }
        gs.symbol_mut(item.lhs).result_type = Some(Types::untyped_untracked());
        return true;
    }

    gs.symbol_mut(item.lhs).result_type = Some(Types::alias(rhs_sym));
    true
}

fn stub_symbol_for_ancestor(item: &AncestorResolutionItem) -> SymbolRef {
    if item.is_superclass {
        SymbolRef::STUB_SUPER_CLASS
    } else {
        SymbolRef::STUB_MIXIN
    }
}

/// Resolve one queued ancestor slot. True on a decision; with `last_run`
/// set the job is always decided, stubbing whatever never resolved.
fn resolve_ancestor_job(
    gs: &mut SymbolTable,
    diags: &mut DiagnosticQueue,
    trees: &[Tree],
    job: &AncestorResolutionItem,
    last_run: bool,
) -> bool {
    let ExprKind::ConstantLit {
        symbol: ancestor_sym,
        ..
    } = trees[job.ancestor.tree as usize].arena.kind(job.ancestor.id)
    else {
        debug_assert!(false, "ancestor item with a non-constant node");
        return true;
    };
    let ancestor_sym = *ancestor_sym;
    let ancestor_loc = node_loc(trees, job.ancestor);

    let mut resolved = if !ancestor_sym.exists() {
        if !last_run {
            return false;
        }
        stub_symbol_for_ancestor(job)
    } else if gs.is_type_alias(ancestor_sym) {
        if !last_run {
            return false;
        }
        if let Some(e) = diags.begin_error(&gs.files, ancestor_loc, ErrorCode::DynamicSuperclass) {
            e.message("Superclasses and mixins may not be type aliases")
                .emit();
        }
        stub_symbol_for_ancestor(job)
    } else {
        gs.dealias(ancestor_sym)
    };

    if !gs.is_class(resolved) {
        if !last_run {
            return false;
        }
        if let Some(e) = diags.begin_error(&gs.files, ancestor_loc, ErrorCode::DynamicSuperclass) {
            e.message(format!(
                "Superclasses and mixins may only use class aliases like `{}`",
                "A = Integer"
            ))
            .emit();
        }
        resolved = stub_symbol_for_ancestor(job);
    }

    if resolved == job.klass {
        if let Some(e) = diags.begin_error(&gs.files, ancestor_loc, ErrorCode::CircularDependency) {
            e.message(format!(
                "Circular dependency: `{}` is a parent of itself",
                gs.show_full_name(job.klass)
            ))
            .secondary_label(gs.symbol(resolved).loc, "Class definition")
            .emit();
        }
        resolved = stub_symbol_for_ancestor(job);
    } else if gs.derives_from(resolved, job.klass) {
        if let Some(e) = diags.begin_error(&gs.files, ancestor_loc, ErrorCode::CircularDependency) {
            e.message(format!(
                "Circular dependency: `{}` and `{}` are declared as parents of each other",
                gs.show_full_name(job.klass),
                gs.show_full_name(resolved)
            ))
            .secondary_label(gs.symbol(job.klass).loc, "One definition")
            .secondary_label(gs.symbol(resolved).loc, "Other definition")
            .emit();
        }
        resolved = stub_symbol_for_ancestor(job);
    }

    if job.is_superclass {
        if resolved == SymbolRef::TODO {
            // No superclass written.
        } else {
            let current = gs.symbol(job.klass).superclass;
            if !current.exists() || current == SymbolRef::TODO || current == resolved {
                gs.set_super_class(job.klass, resolved);
            } else if let Some(e) =
                diags.begin_error(&gs.files, ancestor_loc, ErrorCode::RedefinitionOfParents)
            {
                e.message(format!(
                    "Class parents redefined for class `{}`",
                    gs.show_full_name(job.klass)
                ))
                .emit();
            }
        }
    } else {
        debug_assert!(gs.is_class(resolved));
        gs.push_mixin(job.klass, resolved);
    }

    true
}

/// After an ancestor applied: sealed parents track every subclass so
/// exhaustiveness checks can enumerate them.
fn try_register_sealed_subclass(
    gs: &mut SymbolTable,
    trees: &[Tree],
    job: &AncestorResolutionItem,
) {
    let ExprKind::ConstantLit {
        symbol: ancestor_sym,
        ..
    } = trees[job.ancestor.tree as usize].arena.kind(job.ancestor.id)
    else {
        return;
    };
    if !ancestor_sym.exists() {
        return;
    }
    let ancestor = gs.dealias(*ancestor_sym);
    if gs.is_class_sealed(ancestor) {
        gs.record_sealed_subclass(ancestor, job.klass);
    }
}

/// One worker's output: its todo lists and privately collected diagnostics.
struct WalkResult {
    todo: Vec<ResolutionItem>,
    todo_ancestors: Vec<AncestorResolutionItem>,
    todo_class_aliases: Vec<ClassAliasResolutionItem>,
    todo_type_aliases: Vec<TypeAliasResolutionItem>,
    diags: DiagnosticQueue,
}

/// The first walk over one tree: replaces `UnresolvedConstantLit` nodes,
/// runs resolution eagerly, and queues everything that stalls.
struct ConstantWalk<'gs> {
    gs: &'gs SymbolTable,
    nesting: Arc<Nesting>,
    tree_idx: u32,
    file: FileId,
    todo: Vec<ResolutionItem>,
    todo_ancestors: Vec<AncestorResolutionItem>,
    todo_class_aliases: Vec<ClassAliasResolutionItem>,
    todo_type_aliases: Vec<TypeAliasResolutionItem>,
    diags: DiagnosticQueue,
}

impl<'gs> ConstantWalk<'gs> {
    fn new(gs: &'gs SymbolTable, tree_idx: u32, file: FileId) -> Self {
        ConstantWalk {
            gs,
            nesting: Nesting::root(),
            tree_idx,
            file,
            todo: Vec::new(),
            todo_ancestors: Vec::new(),
            todo_class_aliases: Vec::new(),
            todo_type_aliases: Vec::new(),
            diags: DiagnosticQueue::new(),
        }
    }

    fn into_result(self) -> WalkResult {
        WalkResult {
            todo: self.todo,
            todo_ancestors: self.todo_ancestors,
            todo_class_aliases: self.todo_class_aliases,
            todo_type_aliases: self.todo_type_aliases,
            diags: self.diags,
        }
    }

    fn node_ref(&self, id: ExprId) -> NodeRef {
        NodeRef {
            tree: self.tree_idx,
            id,
        }
    }

    fn walk(&mut self, arena: &mut ExprArena, id: ExprId) {
        let kind = arena.kind(id).clone();
        match kind {
            ExprKind::UnresolvedConstantLit { .. } => {
                self.resolve_constant_lit(arena, id);
            }
            ExprKind::ClassDef {
                symbol,
                kind,
                ancestors,
                singleton_ancestors,
                rhs,
            } => {
                self.nesting = Nesting::push(&self.nesting, symbol);
                for &stat in &rhs {
                    self.walk(arena, stat);
                }
                for (i, &ancestor) in ancestors.iter().enumerate() {
                    let is_superclass = kind == ClassKind::Class
                        && i == 0
                        && !self.gs.is_singleton_class(symbol);
                    self.transform_ancestor(arena, symbol, ancestor, is_superclass);
                }
                // Singleton ancestors attach to the singleton class when the
                // namer created one.
                let singleton = self.gs.lookup_singleton_class(symbol);
                let target = if singleton.exists() { singleton } else { symbol };
                for &ancestor in &singleton_ancestors {
                    self.transform_ancestor(arena, target, ancestor, false);
                }
                let parent = self
                    .nesting
                    .parent
                    .clone()
                    .expect("class nesting always has a parent");
                self.nesting = parent;
            }
            ExprKind::Assign { lhs, rhs } => {
                self.walk(arena, lhs);
                self.walk(arena, rhs);
                self.handle_assign(arena, id);
            }
            ExprKind::MethodDef { args, rhs, .. } => {
                for &arg in &args {
                    self.walk(arena, arg);
                }
                self.walk(arena, rhs);
            }
            ExprKind::Send {
                recv, args, block, ..
            } => {
                self.walk(arena, recv);
                for &arg in &args {
                    self.walk(arena, arg);
                }
                if let Some(block) = block {
                    self.walk(arena, block);
                }
            }
            ExprKind::Block { args, body } => {
                for &arg in &args {
                    self.walk(arena, arg);
                }
                self.walk(arena, body);
            }
            ExprKind::InsSeq { stats, expr } => {
                for &stat in &stats {
                    self.walk(arena, stat);
                }
                self.walk(arena, expr);
            }
            ExprKind::Hash { keys, values } => {
                for &key in &keys {
                    self.walk(arena, key);
                }
                for &value in &values {
                    self.walk(arena, value);
                }
            }
            ExprKind::OptionalArg { local, default } => {
                self.walk(arena, local);
                self.walk(arena, default);
            }
            ExprKind::Cast { arg, .. } => self.walk(arena, arg),
            ExprKind::KeepForTypechecking { expr } => self.walk(arena, expr),
            ExprKind::EmptyTree
            | ExprKind::Literal(_)
            | ExprKind::SelfRef
            | ExprKind::Local { .. }
            | ExprKind::UnresolvedIdent { .. }
            | ExprKind::ConstantLit { .. } => {}
        }
    }

    /// Replace an `UnresolvedConstantLit` with a fresh `ConstantLit`, try
    /// resolution once eagerly, and queue on failure.
    fn resolve_constant_lit(&mut self, arena: &mut ExprArena, id: ExprId) {
        let ExprKind::UnresolvedConstantLit { scope, name } = *arena.kind(id) else {
            debug_assert!(false, "resolve_constant_lit on a non-constant node");
            return;
        };
        self.walk(arena, scope);

        // The unresolved node moves to a fresh slot and stays reachable via
        // `original`; the old slot becomes the resolved node so every parent
        // reference now sees a `ConstantLit`.
        let span = arena.span(id);
        let original = arena.push(ExprKind::UnresolvedConstantLit { scope, name }, span);
        arena.replace(
            id,
            ExprKind::ConstantLit {
                symbol: SymbolRef::NONE,
                original: Some(original),
                resolution_scope: SymbolRef::NONE,
            },
        );

        let item = ResolutionItem {
            nesting: Arc::clone(&self.nesting),
            out: self.node_ref(id),
        };
        if !resolve_job(self.gs, &mut self.diags, self.file, arena, &item.nesting, id) {
            self.todo.push(item);
        }
    }

    /// Resolve an ancestor expression and queue the slot assignment.
    ///
    /// A superclass resolves in the nesting *enclosing* the class body; by
    /// the time `class C < D` names `D`, `C` itself is not in scope for it.
    fn transform_ancestor(
        &mut self,
        arena: &mut ExprArena,
        klass: SymbolRef,
        ancestor: ExprId,
        is_superclass: bool,
    ) {
        if matches!(arena.kind(ancestor), ExprKind::UnresolvedConstantLit { .. }) {
            let saved = Arc::clone(&self.nesting);
            if is_superclass {
                if let Some(parent) = self.nesting.parent.clone() {
                    self.nesting = parent;
                }
            }
            self.resolve_constant_lit(arena, ancestor);
            self.nesting = saved;
        }

        match arena.kind(ancestor) {
            ExprKind::ConstantLit { symbol, .. } => {
                let symbol = *symbol;
                if symbol.exists() && self.gs.is_type_alias(symbol) {
                    let loc = Loc::new(self.file, arena.span(ancestor));
                    if let Some(e) =
                        self.diags
                            .begin_error(&self.gs.files, loc, ErrorCode::DynamicSuperclass)
                    {
                        e.message("Superclasses and mixins may not be type aliases")
                            .emit();
                    }
                    return;
                }
                if is_superclass && symbol == SymbolRef::TODO {
                    return;
                }
            }
            ExprKind::SelfRef => {
                // `include self` and friends: behave as the enclosing class.
                arena.replace(
                    ancestor,
                    ExprKind::ConstantLit {
                        symbol: klass,
                        original: None,
                        resolution_scope: SymbolRef::NONE,
                    },
                );
            }
            ExprKind::EmptyTree => return,
            _ => {
                debug_assert!(false, "namer should not have allowed this ancestor form");
                return;
            }
        }

        self.todo_ancestors.push(AncestorResolutionItem {
            ancestor: self.node_ref(ancestor),
            klass,
            is_superclass,
        });
    }

    /// Recognize the assignment forms that feed the alias queues.
    fn handle_assign(&mut self, arena: &mut ExprArena, id: ExprId) {
        let ExprKind::Assign { lhs, rhs } = *arena.kind(id) else {
            return;
        };
        let ExprKind::ConstantLit {
            symbol: lhs_sym, ..
        } = *arena.kind(lhs)
        else {
            return;
        };
        if !lhs_sym.exists() || !self.gs.is_static_field(lhs_sym) {
            return;
        }

        if let ExprKind::Send { fun, args, .. } = arena.kind(rhs).clone() {
            if fun == self.gs.names.type_alias {
                let rhs_expr = if let Some(&first) = args.first() {
                    first
                } else {
                    // A nullary `T.type_alias()` still has to produce a type,
                    // or the invariants downstream passes rely on would not
                    // hold. Repair it to alias `untyped` and complain here.
                    let span = arena.span(rhs);
                    let untyped_arg = mk::resolved_const(arena, SymbolRef::UNTYPED, span);
                    if let ExprKind::Send { args, .. } = &mut arena.get_mut(rhs).kind {
                        args.push(untyped_arg);
                    }
                    let loc = Loc::new(self.file, span);
                    if let Some(e) =
                        self.diags
                            .begin_error(&self.gs.files, loc, ErrorCode::InvalidTypeAlias)
                    {
                        e.message("No argument given to `T.type_alias`").emit();
                    }
                    untyped_arg
                };
                self.todo_type_aliases.push(TypeAliasResolutionItem {
                    lhs: lhs_sym,
                    rhs: self.node_ref(rhs_expr),
                });
                // Also queue the left-hand side itself, so a never-used
                // alias with a broken right-hand side still errors.
                self.todo.push(ResolutionItem {
                    nesting: Arc::clone(&self.nesting),
                    out: self.node_ref(lhs),
                });
                return;
            }
        }

        if matches!(arena.kind(rhs), ExprKind::ConstantLit { .. }) {
            self.todo_class_aliases.push(ClassAliasResolutionItem {
                lhs: lhs_sym,
                rhs: self.node_ref(rhs),
            });
        }
    }
}

fn walk_tree(gs: &SymbolTable, tree_idx: usize, tree: &mut Tree) -> WalkResult {
    let mut walk = ConstantWalk::new(
        gs,
        u32::try_from(tree_idx).expect("tree index overflow"),
        tree.file,
    );
    let root = tree.root;
    walk.walk(&mut tree.arena, root);
    walk.into_result()
}

/// P1: resolve every constant, ancestor, class alias and type alias.
pub(crate) fn resolve_constants(
    gs: &mut SymbolTable,
    trees: &mut [Tree],
    workers: usize,
    diags: &mut DiagnosticQueue,
) {
    tracing::debug!(trees = trees.len(), workers, "resolver.resolve_constants");

    // Parallel first walk: workers own disjoint trees and only read the
    // symbol table. Collecting through an indexed iterator keeps results in
    // input order before the location sort, so merging is deterministic.
    let results: Vec<WalkResult> = if workers <= 1 {
        trees
            .iter_mut()
            .enumerate()
            .map(|(i, tree)| walk_tree(gs, i, tree))
            .collect()
    } else {
        let shared: &SymbolTable = gs;
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| {
                trees
                    .par_iter_mut()
                    .enumerate()
                    .map(|(i, tree)| walk_tree(shared, i, tree))
                    .collect()
            }),
            Err(_) => trees
                .iter_mut()
                .enumerate()
                .map(|(i, tree)| walk_tree(shared, i, tree))
                .collect(),
        }
    };

    let mut todo: Vec<ResolutionItem> = Vec::new();
    let mut todo_ancestors: Vec<AncestorResolutionItem> = Vec::new();
    let mut todo_class_aliases: Vec<ClassAliasResolutionItem> = Vec::new();
    let mut todo_type_aliases: Vec<TypeAliasResolutionItem> = Vec::new();
    for result in results {
        todo.extend(result.todo);
        todo_ancestors.extend(result.todo_ancestors);
        todo_class_aliases.extend(result.todo_class_aliases);
        todo_type_aliases.extend(result.todo_type_aliases);
        diags.merge(result.diags);
    }

    todo.sort_by(|a, b| node_loc(trees, a.out).cmp_by_position(node_loc(trees, b.out)));
    todo_ancestors
        .sort_by(|a, b| node_loc(trees, a.ancestor).cmp_by_position(node_loc(trees, b.ancestor)));
    todo_class_aliases
        .sort_by(|a, b| node_loc(trees, a.rhs).cmp_by_position(node_loc(trees, b.rhs)));
    todo_type_aliases
        .sort_by(|a, b| node_loc(trees, a.rhs).cmp_by_position(node_loc(trees, b.rhs)));

    run_fixed_point(
        gs,
        diags,
        trees,
        &mut todo,
        &mut todo_ancestors,
        &mut todo_class_aliases,
        &mut todo_type_aliases,
    );

    // No more progress: everything from here on reports errors.
    //
    // Order the leftovers so each missing constant gets one deterministic
    // report: strictest files first (an error reported only in a lax file
    // would be suppressed there even when a strict file hits it too), then
    // file id (command-line order), then position, then constant depth
    // (outer scopes before the constants spelled inside them).
    todo.sort_by(|a, b| {
        let left = node_loc(trees, a.out);
        let right = node_loc(trees, b.out);
        if left == right {
            let ld = constant_depth(&trees[a.out.tree as usize].arena, a.out.id);
            let rd = constant_depth(&trees[b.out.tree as usize].arena, b.out.id);
            ld.cmp(&rd)
        } else {
            left.cmp_strictness_first(right, &gs.files)
        }
    });
    todo_ancestors.sort_by(|a, b| {
        let left = node_loc(trees, a.ancestor);
        let right = node_loc(trees, b.ancestor);
        if left == right {
            let ld = constant_depth(&trees[a.ancestor.tree as usize].arena, a.ancestor.id);
            let rd = constant_depth(&trees[b.ancestor.tree as usize].arena, b.ancestor.id);
            ld.cmp(&rd)
        } else {
            left.cmp_strictness_first(right, &gs.files)
        }
    });

    // Stub the stubborn constants one at a time, in sorted order. Forcing a
    // broken alias to `untyped` makes new progress possible (its use-sites
    // now resolve), so after each forced alias the fixed point reruns; the
    // use-sites then resolve quietly instead of re-reporting the alias.
    todo.reverse();
    while let Some(job) = todo.pop() {
        let forced_alias = constant_resolution_failed(gs, diags, trees, &job);
        if forced_alias {
            run_fixed_point(
                gs,
                diags,
                trees,
                &mut todo,
                &mut todo_ancestors,
                &mut todo_class_aliases,
                &mut todo_type_aliases,
            );
        }
    }

    for job in &todo_ancestors {
        let resolved = resolve_ancestor_job(gs, diags, trees, job, true);
        debug_assert!(resolved, "the final ancestor run always decides");
    }

    // With every constant now carrying a symbol (stubs included), the
    // remaining alias queues drain completely.
    for job in todo_type_aliases.drain(..) {
        let resolved = resolve_type_alias_job(gs, diags, trees, &job);
        debug_assert!(resolved, "type aliases resolve once constants are stubbed");
    }
    for job in todo_class_aliases.drain(..) {
        let resolved = resolve_class_alias_job(gs, diags, trees, &job);
        debug_assert!(resolved, "class aliases resolve once constants are stubbed");
    }
}

/// Iterate the four queues until a full pass makes no progress. At least
/// one full iteration always runs: class and type aliases never got an
/// eager attempt during the walk.
fn run_fixed_point(
    gs: &mut SymbolTable,
    diags: &mut DiagnosticQueue,
    trees: &mut [Tree],
    todo: &mut Vec<ResolutionItem>,
    todo_ancestors: &mut Vec<AncestorResolutionItem>,
    todo_class_aliases: &mut Vec<ClassAliasResolutionItem>,
    todo_type_aliases: &mut Vec<TypeAliasResolutionItem>,
) {
    let mut progress = true;
    let mut first = true;
    let mut iterations = 0u32;
    while progress && (first || !todo.is_empty() || !todo_ancestors.is_empty()) {
        first = false;
        iterations += 1;
        progress = false;

        let before = todo_ancestors.len();
        let mut remaining = Vec::with_capacity(todo_ancestors.len());
        for job in todo_ancestors.drain(..) {
            if resolve_ancestor_job(gs, diags, trees, &job, false) {
                try_register_sealed_subclass(gs, trees, &job);
            } else {
                remaining.push(job);
            }
        }
        *todo_ancestors = remaining;
        progress |= before != todo_ancestors.len();

        let before = todo.len();
        let mut remaining = Vec::with_capacity(todo.len());
        for job in todo.drain(..) {
            let tree = &mut trees[job.out.tree as usize];
            let file = tree.file;
            if !resolve_job(gs, diags, file, &mut tree.arena, &job.nesting, job.out.id) {
                remaining.push(job);
            }
        }
        *todo = remaining;
        progress |= before != todo.len();

        let before = todo_class_aliases.len();
        let mut remaining = Vec::with_capacity(todo_class_aliases.len());
        for job in todo_class_aliases.drain(..) {
            if !resolve_class_alias_job(gs, diags, trees, &job) {
                remaining.push(job);
            }
        }
        *todo_class_aliases = remaining;
        progress |= before != todo_class_aliases.len();

        let before = todo_type_aliases.len();
        let mut remaining = Vec::with_capacity(todo_type_aliases.len());
        for job in todo_type_aliases.drain(..) {
            if !resolve_type_alias_job(gs, diags, trees, &job) {
                remaining.push(job);
            }
        }
        *todo_type_aliases = remaining;
        progress |= before != todo_type_aliases.len();
    }
    tracing::debug!(
        iterations,
        unresolved = todo.len(),
        unresolved_ancestors = todo_ancestors.len(),
        "resolver.resolve_constants.fixed_point"
    );
}
