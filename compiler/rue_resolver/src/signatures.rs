//! P5: signature attachment, field declarations and cast rewrites.
//!
//! Class bodies and instruction sequences are scanned with a `last_sigs`
//! buffer: consecutive `sig { … }` sends accumulate until a method
//! definition flushes them. One sig elaborates the method symbol directly;
//! several sigs split it into overloads when the file permits that.
//!
//! The same walk also enters instance/class variable symbols from
//! `T.let`-annotated assignments, types constant right-hand sides, rewrites
//! `T.let`/`T.cast`/`T.assert_type` calls into `Cast` nodes the inferencer
//! checks, and records `alias_method` aliases.

use rue_ast::{mk, CastKind, ExprArena, ExprId, ExprKind, IdentKind, Tree};
use rue_core::{
    FileId, Loc, Name, StrictLevel, SymbolFlags, SymbolRef, SymbolTable, Type, Types,
    UniqueNameKind,
};
use rue_diagnostic::{DiagnosticQueue, ErrorCode};

use crate::type_syntax::{self, ParsedSig, TypeSyntaxArgs};

pub(crate) fn resolve_sigs(gs: &mut SymbolTable, trees: &mut [Tree], diags: &mut DiagnosticQueue) {
    tracing::debug!("resolver.resolve_sigs");
    for tree in trees.iter_mut() {
        let mut walk = SignaturesWalk {
            gs: &mut *gs,
            diags: &mut *diags,
            file: tree.file,
            nested_block_counts: vec![0],
        };
        let root = tree.root;
        walk.walk(&mut tree.arena, root, SymbolRef::ROOT);
    }
}

struct SignaturesWalk<'a> {
    gs: &'a mut SymbolTable,
    diags: &'a mut DiagnosticQueue,
    file: FileId,
    /// Block depth per class/method frame: fields may only be declared at
    /// the top level of a body, not inside a block.
    nested_block_counts: Vec<u32>,
}

impl SignaturesWalk<'_> {
    fn loc(&self, arena: &ExprArena, id: ExprId) -> Loc {
        Loc::new(self.file, arena.span(id))
    }

    fn walk(&mut self, arena: &mut ExprArena, id: ExprId, owner: SymbolRef) {
        let kind = arena.kind(id).clone();
        match kind {
            ExprKind::ClassDef { symbol, rhs, .. } => {
                self.nested_block_counts.push(0);
                for &stat in &rhs {
                    self.walk(arena, stat, symbol);
                }
                self.nested_block_counts.pop();
                let new_rhs = self.process_statements(arena, rhs, None, symbol);
                if let ExprKind::ClassDef { rhs, .. } = &mut arena.get_mut(id).kind {
                    *rhs = new_rhs;
                }
            }
            ExprKind::MethodDef { symbol, args, rhs, .. } => {
                self.nested_block_counts.push(0);
                for &arg in &args {
                    self.walk(arena, arg, symbol);
                }
                self.walk(arena, rhs, symbol);
                self.nested_block_counts.pop();
            }
            ExprKind::Block { args, body } => {
                *self
                    .nested_block_counts
                    .last_mut()
                    .expect("walk always has a frame") += 1;
                for &arg in &args {
                    self.walk(arena, arg, owner);
                }
                self.walk(arena, body, owner);
                *self
                    .nested_block_counts
                    .last_mut()
                    .expect("walk always has a frame") -= 1;
            }
            ExprKind::InsSeq { stats, expr } => {
                for &stat in &stats {
                    self.walk(arena, stat, owner);
                }
                self.walk(arena, expr, owner);
                // Sequences run in the surrounding class, not whatever
                // synthesized method wraps them.
                let class_owner = self.gs.enclosing_class(owner);
                let new_stats =
                    self.process_statements(arena, stats, Some(expr), class_owner);
                if let ExprKind::InsSeq { stats, .. } = &mut arena.get_mut(id).kind {
                    *stats = new_stats;
                }
            }
            ExprKind::Send {
                recv, args, block, ..
            } => {
                self.walk(arena, recv, owner);
                for &arg in &args {
                    self.walk(arena, arg, owner);
                }
                if let Some(block) = block {
                    self.walk(arena, block, owner);
                }
                self.handle_send(arena, id, owner);
            }
            ExprKind::Assign { lhs, rhs } => {
                self.walk(arena, lhs, owner);
                self.walk(arena, rhs, owner);
                self.post_assign(arena, id, owner);
            }
            ExprKind::OptionalArg { local, default } => {
                self.walk(arena, local, owner);
                self.walk(arena, default, owner);
            }
            ExprKind::Cast { arg, .. } => self.walk(arena, arg, owner),
            ExprKind::KeepForTypechecking { expr } => self.walk(arena, expr, owner),
            ExprKind::Hash { keys, values } => {
                for &key in &keys {
                    self.walk(arena, key, owner);
                }
                for &value in &values {
                    self.walk(arena, value, owner);
                }
            }
            ExprKind::EmptyTree
            | ExprKind::Literal(_)
            | ExprKind::SelfRef
            | ExprKind::Local { .. }
            | ExprKind::UnresolvedIdent { .. }
            | ExprKind::ConstantLit { .. }
            | ExprKind::UnresolvedConstantLit { .. } => {}
        }
    }

    // ===== Statement scanning =====

    /// Scan a statement list, attaching buffered sigs to the methods that
    /// follow them. Returns the list with removed statements dropped.
    fn process_statements(
        &mut self,
        arena: &mut ExprArena,
        stats: Vec<ExprId>,
        trailing: Option<ExprId>,
        owner: SymbolRef,
    ) -> Vec<ExprId> {
        let mut last_sigs: Vec<ExprId> = Vec::new();
        let mut kept = Vec::with_capacity(stats.len());
        for stat in stats {
            if !self.process_statement(arena, stat, owner, &mut last_sigs) {
                kept.push(stat);
            }
        }
        if let Some(trailing) = trailing {
            if !arena.kind(trailing).is_empty_tree() {
                self.process_statement(arena, trailing, owner, &mut last_sigs);
            }
        }
        self.process_leftover_sigs(arena, &mut last_sigs);
        kept
    }

    /// Returns true when the statement should be removed from its body.
    fn process_statement(
        &mut self,
        arena: &mut ExprArena,
        stat: ExprId,
        owner: SymbolRef,
        last_sigs: &mut Vec<ExprId>,
    ) -> bool {
        match arena.kind(stat) {
            ExprKind::Send { .. } => {
                if type_syntax::is_sig(self.gs, arena, stat) {
                    if !last_sigs.is_empty()
                        && !self.gs.files.permit_overload_definitions(self.file)
                    {
                        let first_loc = self.loc(arena, last_sigs[0]);
                        let this_loc = self.loc(arena, stat);
                        if let Some(e) = self.diags.begin_error(
                            &self.gs.files,
                            first_loc,
                            ErrorCode::OverloadNotAllowed,
                        ) {
                            e.message("Unused type annotation. No method def before next annotation")
                                .secondary_label(
                                    this_loc,
                                    "Type annotation that will be used instead",
                                )
                                .emit();
                        }
                    }
                    last_sigs.push(stat);
                }
                false
            }
            ExprKind::MethodDef { .. } => {
                self.process_method_def(arena, stat, owner, last_sigs);
                false
            }
            ExprKind::ClassDef { .. } => false,
            ExprKind::EmptyTree => true,
            _ => false,
        }
    }

    /// Sigs that never found a method still get parsed (to force their
    /// errors) and then rejected.
    fn process_leftover_sigs(&mut self, arena: &ExprArena, last_sigs: &mut Vec<ExprId>) {
        if last_sigs.is_empty() {
            return;
        }
        for &sig_send in last_sigs.iter() {
            let args = TypeSyntaxArgs {
                allow_self_type: true,
                allow_rebind: false,
                allow_type_member: true,
                context: SymbolRef::UNTYPED,
            };
            let _ = type_syntax::parse_sig(self.gs, self.diags, self.file, arena, sig_send, &args);
        }
        let loc = self.loc(arena, last_sigs[0]);
        if let Some(e) =
            self.diags
                .begin_error(&self.gs.files, loc, ErrorCode::InvalidMethodSignature)
        {
            e.message("Malformed `sig`. No method def following it").emit();
        }
        last_sigs.clear();
    }

    // ===== Sig attachment =====

    fn process_method_def(
        &mut self,
        arena: &mut ExprArena,
        mdef: ExprId,
        _owner: SymbolRef,
        last_sigs: &mut Vec<ExprId>,
    ) {
        let ExprKind::MethodDef {
            symbol: method,
            args: mdef_args,
            flags,
            ..
        } = arena.kind(mdef).clone()
        else {
            return;
        };

        if !last_sigs.is_empty() {
            let first_sig_loc = self.loc(arena, last_sigs[0]);
            if self.gs.files.get(self.file).sigil == StrictLevel::None && !flags.dsl_synthesized {
                if let Some(e) = self.diags.begin_error(
                    &self.gs.files,
                    first_sig_loc,
                    ErrorCode::SigInFileWithoutSigil,
                ) {
                    e.message(
                        "To use `sig`, this file must declare an explicit strictness sigil. \
                         If you're not sure which one to use, start with the lowest",
                    )
                    .emit();
                }
            }

            let is_overloaded =
                last_sigs.len() > 1 && self.gs.files.permit_overload_definitions(self.file);
            let original_name = self.gs.symbol(method).name;
            if is_overloaded {
                self.gs.mangle_rename_symbol(method, original_name);
            }

            let sig_count = last_sigs.len();
            for (i, &sig_send) in last_sigs.iter().enumerate() {
                let ts_args = TypeSyntaxArgs {
                    allow_self_type: true,
                    allow_rebind: false,
                    allow_type_member: true,
                    context: method,
                };
                let sig =
                    type_syntax::parse_sig(self.gs, self.diags, self.file, arena, sig_send, &ts_args);
                let sig_loc = self.loc(arena, sig_send);

                let target = if is_overloaded {
                    let mut args_to_keep = Vec::new();
                    for (arg_idx, &arg_tree) in mdef_args.iter().enumerate() {
                        let tree_name = arg_local_name(arena, arg_tree);
                        if sig
                            .arg_types
                            .iter()
                            .any(|spec| Some(spec.name) == tree_name)
                        {
                            args_to_keep.push(arg_idx);
                        }
                    }
                    let overload = self.gs.enter_new_method_overload(
                        sig_loc,
                        method,
                        original_name,
                        u32::try_from(i).expect("overload count overflow"),
                        &args_to_keep,
                    );
                    if i != sig_count - 1 {
                        self.gs
                            .symbol_mut(overload)
                            .flags
                            .insert(SymbolFlags::METHOD_OVERLOADED);
                    }
                    overload
                } else {
                    method
                };

                self.fill_in_info_from_sig(arena, target, sig_loc, sig, is_overloaded, &mdef_args);
            }

            if !is_overloaded {
                self.inject_optional_args(arena, mdef);
            }
            last_sigs.clear();
        }

        self.check_abstract_shape(arena, mdef, method);
    }

    /// Abstract methods carry no body; interfaces carry only abstract
    /// methods.
    fn check_abstract_shape(&mut self, arena: &mut ExprArena, mdef: ExprId, method: SymbolRef) {
        let ExprKind::MethodDef { rhs, .. } = *arena.kind(mdef) else {
            return;
        };
        let mdef_loc = self.loc(arena, mdef);
        let enclosing = self.gs.enclosing_class(self.gs.symbol(method).owner);

        if self
            .gs
            .symbol(method)
            .flags
            .contains(SymbolFlags::METHOD_ABSTRACT)
        {
            if !arena.kind(rhs).is_empty_tree() {
                let rhs_loc = self.loc(arena, rhs);
                if let Some(e) = self.diags.begin_error(
                    &self.gs.files,
                    rhs_loc,
                    ErrorCode::AbstractMethodWithBody,
                ) {
                    e.message("Abstract methods must not contain any code in their body")
                        .replacement("Delete the body", rhs_loc, "")
                        .emit();
                }
                arena.replace(rhs, ExprKind::EmptyTree);
            }
            if !self.gs.is_class_abstract(enclosing) {
                if let Some(e) = self.diags.begin_error(
                    &self.gs.files,
                    mdef_loc,
                    ErrorCode::AbstractMethodOutsideAbstract,
                ) {
                    e.message(
                        "Before declaring an abstract method, you must mark your class/module \
                         as abstract using `abstract!` or `interface!`",
                    )
                    .emit();
                }
            }
        } else if self.gs.is_class_interface(enclosing) {
            if let Some(e) = self.diags.begin_error(
                &self.gs.files,
                mdef_loc,
                ErrorCode::ConcreteMethodInInterface,
            ) {
                e.message("All methods in an interface must be declared abstract")
                    .emit();
            }
        }
    }

    /// Write a parsed sig onto a method symbol: flags, type variables,
    /// return type, and per-parameter types aligned by name.
    fn fill_in_info_from_sig(
        &mut self,
        arena: &ExprArena,
        method: SymbolRef,
        sig_loc: Loc,
        mut sig: ParsedSig,
        is_overloaded: bool,
        mdef_args: &[ExprId],
    ) {
        if !sig.seen.returns && !sig.seen.void {
            if let Some(e) =
                self.diags
                    .begin_error(&self.gs.files, sig_loc, ErrorCode::InvalidMethodSignature)
            {
                e.message("Malformed `sig`: No return type specified. Specify one with .returns()")
                    .emit();
            }
        }
        if sig.seen.returns && sig.seen.void {
            if let Some(e) =
                self.diags
                    .begin_error(&self.gs.files, sig_loc, ErrorCode::InvalidMethodSignature)
            {
                e.message("Malformed `sig`: Don't use both .returns() and .void")
                    .emit();
            }
        }

        {
            let flags = &mut self.gs.symbol_mut(method).flags;
            if sig.seen.abstract_ {
                flags.insert(SymbolFlags::METHOD_ABSTRACT);
            }
            if sig.seen.implementation {
                flags.insert(SymbolFlags::METHOD_IMPLEMENTATION);
            }
            if sig.seen.incompatible_override {
                flags.insert(SymbolFlags::METHOD_INCOMPATIBLE_OVERRIDE);
            }
            if sig.seen.generated {
                flags.insert(SymbolFlags::METHOD_GENERATED_SIG);
            } else {
                // Incremental runs may carry the flag over from a previous
                // sig; it tracks the current one.
                flags.remove(SymbolFlags::METHOD_GENERATED_SIG);
            }
            if sig.seen.overridable {
                flags.insert(SymbolFlags::METHOD_OVERRIDABLE);
            }
            if sig.seen.override_ {
                flags.insert(SymbolFlags::METHOD_OVERRIDE);
            }
            if sig.seen.final_ {
                flags.insert(SymbolFlags::METHOD_FINAL);
            }
        }
        if sig.seen.bind {
            self.gs.symbol_mut(method).rebind = sig.bind;
        }

        if !sig.type_args.is_empty() {
            self.gs
                .symbol_mut(method)
                .flags
                .insert(SymbolFlags::METHOD_GENERIC);
            let mut entered: Vec<(Name, SymbolRef)> = Vec::new();
            for spec in &mut sig.type_args {
                let fresh = self
                    .gs
                    .fresh_name_unique(UniqueNameKind::TypeVar, spec.name, 1);
                let tv = self.gs.enter_type_argument(spec.loc, method, fresh);
                if let Type::TypeVar { sym, .. } = &mut spec.ty {
                    *sym = tv;
                }
                self.gs.symbol_mut(tv).result_type = Some(spec.ty.clone());
                entered.push((spec.name, tv));
            }
            // Types already built from `T.type_parameter` hold unpatched
            // variables; fix them up now that the symbols exist.
            for (name, tv) in entered {
                if let Some(returns) = &mut sig.returns {
                    patch_type_var(returns, name, tv);
                }
                for spec in &mut sig.arg_types {
                    patch_type_var(&mut spec.ty, name, tv);
                }
            }
        }

        // The signature's own parameter order, for the ordering check below.
        let sig_params = sig.arg_types.clone();

        self.gs.symbol_mut(method).result_type = sig.returns.clone();

        let mut arguments = std::mem::take(&mut self.gs.symbol_mut(method).arguments);
        let mut def_params: Vec<(Name, Loc)> = Vec::new();
        let mut seen_optional = false;

        for (i, arg) in arguments.iter_mut().enumerate() {
            let (tree_arg_name, _local_loc) =
                match arg_local(arena, self.file, mdef_args, arg.name, i, is_overloaded) {
                    Some(found) => found,
                    None => (arg.name, arg.loc),
                };

            // Optional keyword parameters must follow all required ones.
            let is_kwd = arg.flags.keyword;
            let is_req = arg.is_required();
            if is_kwd && !is_req {
                seen_optional = true;
            } else if is_kwd && seen_optional && is_req {
                if let Some(e) = self.diags.begin_error(
                    &self.gs.files,
                    arg.loc,
                    ErrorCode::BadParameterOrdering,
                ) {
                    e.message(format!(
                        "Malformed `sig`. Required parameter `{}` must be declared before all the optional ones",
                        self.gs.interner.lookup(tree_arg_name)
                    ))
                    .secondary_label(sig_loc, "Signature")
                    .emit();
                }
            }

            def_params.push((tree_arg_name, arg.loc));

            if let Some(pos) = sig
                .arg_types
                .iter()
                .position(|spec| spec.name == tree_arg_name)
            {
                let spec = sig.arg_types.remove(pos);
                arg.ty = Some(spec.ty);
                arg.loc = spec.loc;
                arg.rebind = spec.rebind;
            } else if arg.ty.is_none() {
                arg.ty = Some(Types::untyped(method));
                // The synthesized block argument never appears in sigs; its
                // absence is not worth an error.
                let is_blk = arg.name == self.gs.names.blk_arg;
                if !is_overloaded
                    && !is_blk
                    && (sig.seen.params || sig.seen.returns || sig.seen.void)
                {
                    if let Some(e) = self.diags.begin_error(
                        &self.gs.files,
                        arg.loc,
                        ErrorCode::InvalidMethodSignature,
                    ) {
                        e.message(format!(
                            "Malformed `sig`. Type not specified for argument `{}`",
                            self.gs.interner.lookup(tree_arg_name)
                        ))
                        .secondary_label(sig_loc, "Signature")
                        .emit();
                    }
                }
            }

            if is_overloaded && arg.flags.keyword {
                if let Some(e) = self.diags.begin_error(
                    &self.gs.files,
                    arg.loc,
                    ErrorCode::InvalidMethodSignature,
                ) {
                    e.message(format!(
                        "Malformed `sig`. Overloaded functions cannot have keyword arguments: `{}`",
                        self.gs.interner.lookup(tree_arg_name)
                    ))
                    .emit();
                }
            }
        }
        self.gs.symbol_mut(method).arguments = arguments;

        for spec in &sig.arg_types {
            if let Some(e) =
                self.diags
                    .begin_error(&self.gs.files, spec.loc, ErrorCode::InvalidMethodSignature)
            {
                e.message(format!(
                    "Unknown argument name `{}`",
                    self.gs.interner.lookup(spec.name)
                ))
                .emit();
            }
        }

        // When every sig parameter matched by name, the orders must agree.
        if sig.arg_types.is_empty() {
            for (j, spec) in sig_params.iter().enumerate() {
                let Some(&(def_name, def_loc)) = def_params.get(j) else {
                    break;
                };
                if spec.name != def_name {
                    if let Some(e) = self.diags.begin_error(
                        &self.gs.files,
                        def_loc,
                        ErrorCode::BadParameterOrdering,
                    ) {
                        e.message(format!(
                            "Bad parameter ordering for `{}`, expected `{}` instead",
                            self.gs.interner.lookup(def_name),
                            self.gs.interner.lookup(spec.name)
                        ))
                        .secondary_label(spec.loc, "Expected index in signature:")
                        .emit();
                    }
                }
            }
        }
    }

    /// Prepend `let`-casts for default arguments so the inferencer checks
    /// defaults against the declared parameter types:
    ///
    /// `def f(x = <expr>)` with `params(x: T)` gains a leading
    /// `T.let(<expr>, T)` in its body.
    fn inject_optional_args(&mut self, arena: &mut ExprArena, mdef: ExprId) {
        let ExprKind::MethodDef {
            symbol,
            args,
            rhs,
            ..
        } = arena.kind(mdef).clone()
        else {
            return;
        };
        if self
            .gs
            .symbol(symbol)
            .flags
            .contains(SymbolFlags::METHOD_ABSTRACT)
        {
            return;
        }

        let arg_infos = self.gs.symbol(symbol).arguments.clone();
        let mut lets: Vec<ExprId> = Vec::new();
        for (i, arg_info) in arg_infos.iter().enumerate() {
            let Some(&arg_exp) = args.get(i) else {
                break;
            };
            if let ExprKind::OptionalArg { default, .. } = *arena.kind(arg_exp) {
                let ty = arg_info
                    .ty
                    .clone()
                    .unwrap_or_else(|| Types::untyped(symbol));
                // The arg-list span makes default-type errors point at the
                // parameter, even though the cast lives in the body.
                let span = arena.span(arg_exp);
                let copy = arena.deep_copy(default);
                lets.push(mk::cast(arena, CastKind::Let, ty, copy, span));
            }
        }

        if !lets.is_empty() {
            let span = arena.span(rhs);
            let new_rhs = mk::ins_seq(arena, lets, rhs, span);
            if let ExprKind::MethodDef { rhs, .. } = &mut arena.get_mut(mdef).kind {
                *rhs = new_rhs;
            }
        }
    }

    // ===== Assignments: fields and constant types =====

    fn post_assign(&mut self, arena: &mut ExprArena, id: ExprId, owner: SymbolRef) {
        let ExprKind::Assign { lhs, rhs } = *arena.kind(id) else {
            return;
        };
        if self.handle_declaration(arena, lhs, rhs, owner) {
            return;
        }

        let ExprKind::ConstantLit { symbol, .. } = *arena.kind(lhs) else {
            return;
        };
        if !symbol.exists() {
            return;
        }
        if self.gs.is_type_alias(symbol) || self.gs.is_type_member(symbol) {
            return;
        }

        if self.gs.is_static_field(symbol) && self.gs.symbol(symbol).result_type.is_none() {
            let ty = self.resolve_constant_type(arena, rhs);
            self.gs.symbol_mut(symbol).result_type =
                Some(ty.unwrap_or_else(|| Types::untyped(symbol)));
        } else {
            // Already typed (or not a field at all): still surface the
            // annotation errors the right-hand side may contain.
            let _ = self.resolve_constant_type(arena, rhs);
        }
    }

    /// The type of a constant's right-hand side. Deliberately simplistic:
    /// literals and explicit casts only. Collection literals are left to
    /// inference, and constant-to-constant aliases were already typed
    /// during constant resolution.
    fn resolve_constant_type(&mut self, arena: &ExprArena, expr: ExprId) -> Option<Type> {
        match arena.kind(expr) {
            ExprKind::Literal(value) => Some(Type::Literal(*value)),
            ExprKind::Cast { kind, ty, .. } => {
                if *kind != CastKind::Let {
                    let loc = self.loc(arena, expr);
                    if let Some(e) = self.diags.begin_error(
                        &self.gs.files,
                        loc,
                        ErrorCode::ConstantAssertType,
                    ) {
                        e.message("Use `T.let` to specify the type of constants")
                            .emit();
                    }
                }
                Some(ty.clone())
            }
            ExprKind::InsSeq { expr, .. } => self.resolve_constant_type(arena, *expr),
            ExprKind::Send { fun, .. } if *fun == self.gs.names.type_alias => None,
            ExprKind::ConstantLit { .. } | ExprKind::UnresolvedConstantLit { .. } => None,
            _ => {
                let loc = self.loc(arena, expr);
                if let Some(e) = self.diags.begin_error(
                    &self.gs.files,
                    loc,
                    ErrorCode::ConstantMissingTypeAnnotation,
                ) {
                    e.message("Constants must have type annotations with `T.let` in strict files")
                        .emit();
                }
                None
            }
        }
    }

    /// `@x = T.let(…)` / `@@x = T.let(…)`: enter the field symbol.
    /// Returns true when the assignment was a declaration.
    fn handle_declaration(
        &mut self,
        arena: &ExprArena,
        lhs: ExprId,
        rhs: ExprId,
        owner: SymbolRef,
    ) -> bool {
        let ExprKind::UnresolvedIdent { kind, name } = *arena.kind(lhs) else {
            return false;
        };
        if kind != IdentKind::Instance && kind != IdentKind::Class {
            return false;
        }

        let mut recur = rhs;
        while let ExprKind::InsSeq { expr, .. } = arena.kind(recur) {
            recur = *expr;
        }
        let ExprKind::Cast {
            kind: cast_kind,
            ty,
            ..
        } = arena.kind(recur).clone()
        else {
            return false;
        };
        let uid_loc = self.loc(arena, lhs);
        if cast_kind != CastKind::Let {
            let cast_loc = self.loc(arena, recur);
            if let Some(e) =
                self.diags
                    .begin_error(&self.gs.files, cast_loc, ErrorCode::ConstantAssertType)
            {
                e.message("Use `T.let` to specify the type of constants")
                    .emit();
            }
        }

        if kind == IdentKind::Class {
            if !self.gs.is_class(owner) {
                if let Some(e) = self.diags.begin_error(
                    &self.gs.files,
                    uid_loc,
                    ErrorCode::InvalidDeclareVariables,
                ) {
                    e.message("Class variables must be declared at class scope")
                        .emit();
                }
            }
        } else {
            // Fields must be declared at the top level of a body: either
            // directly in the class (a class instance variable) or in
            // `initialize` (an instance variable).
            let at_top = *self
                .nested_block_counts
                .last()
                .expect("walk always has a frame")
                == 0;
            if at_top && self.gs.is_class(owner) {
                // Class instance variable.
            } else if at_top && self.gs.symbol(owner).name == self.gs.names.initialize {
                // Instance variable in the constructor.
            } else if self.gs.is_method(owner)
                && self.gs.is_singleton_class(self.gs.symbol(owner).owner)
            {
                if let Some(e) = self.diags.begin_error(
                    &self.gs.files,
                    uid_loc,
                    ErrorCode::InvalidDeclareVariables,
                ) {
                    e.message("Singleton instance variables must be declared inside the class body")
                        .emit();
                }
            } else if let Some(e) = self.diags.begin_error(
                &self.gs.files,
                uid_loc,
                ErrorCode::InvalidDeclareVariables,
            ) {
                e.message("Instance variables must be declared inside `initialize`")
                    .emit();
            }
        }
        let scope = self.gs.enclosing_class(owner);

        let prior = self.gs.find_member(scope, name);
        if prior.exists() {
            let matches = match &self.gs.symbol(prior).result_type {
                Some(prior_ty) => Types::equiv(self.gs, prior_ty, &ty),
                None => false,
            };
            if matches {
                return true;
            }
            let prior_loc = self.gs.symbol(prior).loc;
            if let Some(e) = self.diags.begin_error(
                &self.gs.files,
                uid_loc,
                ErrorCode::DuplicateVariableDeclaration,
            ) {
                e.message(format!(
                    "Redeclaring variable `{}` with mismatching type",
                    self.gs.interner.lookup(name)
                ))
                .secondary_label(prior_loc, "Previous declaration is here:")
                .emit();
            }
            return false;
        }

        let var = if kind == IdentKind::Class {
            self.gs.enter_static_field_symbol(uid_loc, scope, name)
        } else {
            self.gs.enter_field_symbol(uid_loc, scope, name)
        };
        self.gs.symbol_mut(var).result_type = Some(ty);
        true
    }

    // ===== Send rewrites =====

    fn handle_send(&mut self, arena: &mut ExprArena, id: ExprId, owner: SymbolRef) {
        let ExprKind::Send {
            recv, fun, args, ..
        } = arena.kind(id).clone()
        else {
            return;
        };

        match arena.kind(recv) {
            ExprKind::ConstantLit { symbol, .. } => {
                if self.gs.dealias(*symbol) != SymbolRef::T {
                    return;
                }
                let names = self.gs.names;
                if fun == names.let_ || fun == names.cast || fun == names.assert_type {
                    if args.len() < 2 {
                        return;
                    }
                    // Translate the type in the enclosing class: this is
                    // usually reached from inside a method body.
                    let owner_class = self.gs.enclosing_class(owner);
                    let ts_args = TypeSyntaxArgs {
                        allow_self_type: true,
                        allow_rebind: false,
                        allow_type_member: true,
                        context: owner_class,
                    };
                    let ty = type_syntax::get_result_type(
                        self.gs,
                        self.diags,
                        self.file,
                        arena,
                        args[1],
                        &ParsedSig::default(),
                        &ts_args,
                    );
                    let cast_kind = if fun == names.let_ {
                        CastKind::Let
                    } else if fun == names.cast {
                        CastKind::Cast
                    } else {
                        CastKind::AssertType
                    };
                    let span = arena.span(id);
                    let keep = arena.push(ExprKind::KeepForTypechecking { expr: args[1] }, span);
                    let cast = mk::cast(arena, cast_kind, ty, args[0], span);
                    arena.replace(
                        id,
                        ExprKind::InsSeq {
                            stats: vec![keep],
                            expr: cast,
                        },
                    );
                } else if fun == names.reveal_type
                    && self.gs.files.strict_level(self.file) <= StrictLevel::False
                {
                    // Inverts the usual "stricter reports more" direction:
                    // revealing a type is only useful where inference runs.
                    let loc = self.loc(arena, id);
                    if let Some(e) = self.diags.begin_warning(
                        &self.gs.files,
                        loc,
                        ErrorCode::RevealTypeInUntypedFile,
                    ) {
                        e.message(
                            "`T.reveal_type` can only reveal types in typed files (or higher)",
                        )
                        .emit();
                    }
                }
            }
            ExprKind::SelfRef => {
                if fun == self.gs.names.alias_method {
                    self.handle_alias_method(arena, id, &args, owner);
                }
            }
            _ => {}
        }
    }

    fn handle_alias_method(
        &mut self,
        arena: &ExprArena,
        send: ExprId,
        args: &[ExprId],
        owner: SymbolRef,
    ) {
        if args.len() != 2 {
            return;
        }
        let symbol_args: Vec<Name> = args
            .iter()
            .filter_map(|&arg| match arena.kind(arg) {
                ExprKind::Literal(value) => value.as_sym(),
                _ => None,
            })
            .collect();
        if symbol_args.len() != 2 {
            return;
        }
        let from_name = symbol_args[0];
        let to_name = symbol_args[1];

        let mut owner_class = self.gs.enclosing_class(owner);
        if owner_class == SymbolRef::ROOT {
            // Top-level methods live on Object.
            owner_class = SymbolRef::OBJECT;
        }

        let mut to_method = self.gs.find_member(owner_class, to_name);
        if !to_method.exists() {
            let loc = self.loc(arena, args[1]);
            if let Some(e) =
                self.diags
                    .begin_error(&self.gs.files, loc, ErrorCode::BadAliasMethod)
            {
                e.message(format!(
                    "Can't make method alias from `{}` to non existing method `{}`",
                    self.gs.interner.lookup(from_name),
                    self.gs.interner.lookup(to_name)
                ))
                .emit();
            }
            to_method = SymbolRef::BAD_ALIAS_METHOD_STUB;
        }

        let from_method = self.gs.find_member(owner_class, from_name);
        if from_method.exists() && self.gs.dealias(from_method) != to_method {
            let send_loc = self.loc(arena, send);
            if let Some(e) =
                self.diags
                    .begin_error(&self.gs.files, send_loc, ErrorCode::BadAliasMethod)
            {
                let dealiased = self.gs.dealias(from_method);
                if from_method == dealiased {
                    e.message(format!(
                        "Redefining the existing method `{}` as a method alias",
                        self.gs.show_full_name(from_method)
                    ))
                    .secondary_label(self.gs.symbol(from_method).loc, "Previous definition")
                    .emit();
                } else {
                    e.message(format!(
                        "Redefining method alias `{}` from `{}` to `{}`",
                        self.gs.show_full_name(from_method),
                        self.gs.show_full_name(dealiased),
                        self.gs.show_full_name(to_method)
                    ))
                    .secondary_label(
                        self.gs.symbol(from_method).loc,
                        "Previous alias definition",
                    )
                    .secondary_label(self.gs.symbol(dealiased).loc, "Previous alias pointed to")
                    .secondary_label(self.gs.symbol(to_method).loc, "Redefining alias to")
                    .emit();
                }
            }
            return;
        }

        let send_loc = self.loc(arena, send);
        let alias = self.gs.enter_method_symbol(send_loc, owner_class, from_name);
        self.gs.symbol_mut(alias).result_type = Some(Types::alias(to_method));
    }
}

/// The declared name of a parameter tree (`Local` or `OptionalArg`).
fn arg_local_name(arena: &ExprArena, arg: ExprId) -> Option<Name> {
    match arena.kind(arg) {
        ExprKind::Local { name } => Some(*name),
        ExprKind::OptionalArg { local, .. } => arg_local_name(arena, *local),
        _ => None,
    }
}

/// Locate the parameter tree matching one symbol argument.
///
/// For plain methods symbol and tree arguments align by position; overload
/// symbols keep a subset, so alignment falls back to the name recorded when
/// the overload was entered.
fn arg_local(
    arena: &ExprArena,
    file: FileId,
    mdef_args: &[ExprId],
    arg_name: Name,
    pos: usize,
    is_overloaded: bool,
) -> Option<(Name, Loc)> {
    let id = if is_overloaded {
        *mdef_args
            .iter()
            .find(|&&a| arg_local_name(arena, a) == Some(arg_name))?
    } else {
        *mdef_args.get(pos)?
    };
    let name = arg_local_name(arena, id)?;
    Some((name, Loc::new(file, arena.span(id))))
}

/// Point freshly entered type-argument symbols into every use of their
/// variable within a signature.
fn patch_type_var(ty: &mut Type, name: Name, sym: SymbolRef) {
    match ty {
        Type::TypeVar { name: n, sym: s } => {
            if *n == name {
                *s = sym;
            }
        }
        Type::Union(members) => {
            for member in members {
                patch_type_var(member, name, sym);
            }
        }
        Type::LambdaParam { lower, upper } => {
            patch_type_var(lower, name, sym);
            patch_type_var(upper, name, sym);
        }
        _ => {}
    }
}
