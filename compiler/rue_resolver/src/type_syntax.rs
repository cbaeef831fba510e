//! The type-syntax sub-parser.
//!
//! Signatures and type annotations are ordinary expressions in the surface
//! language: `sig { params(x: Integer).returns(String) }`, `T.nilable(Foo)`.
//! This module turns those expression trees into [`ParsedSig`] values and
//! [`Type`] terms. It runs only over trees whose constants are already
//! resolved.

use rue_ast::{ExprArena, ExprId, ExprKind};
use rue_core::{FileId, LiteralValue, Loc, Name, SymbolRef, SymbolTable, Type, Types};
use rue_diagnostic::{DiagnosticQueue, ErrorCode};

/// Context flags for one parse.
#[derive(Copy, Clone, Debug)]
pub struct TypeSyntaxArgs {
    pub allow_self_type: bool,
    pub allow_rebind: bool,
    pub allow_type_member: bool,
    /// The symbol untyped results blame.
    pub context: SymbolRef,
}

/// Which builders appeared in a signature.
#[derive(Copy, Clone, Debug, Default)]
pub struct SigSeen {
    pub returns: bool,
    pub void: bool,
    pub abstract_: bool,
    pub implementation: bool,
    pub incompatible_override: bool,
    pub generated: bool,
    pub overridable: bool,
    pub override_: bool,
    pub final_: bool,
    pub bind: bool,
    pub params: bool,
}

/// One parameter named by a signature.
#[derive(Clone, Debug)]
pub struct ArgSpec {
    pub name: Name,
    pub ty: Type,
    pub loc: Loc,
    pub rebind: SymbolRef,
}

/// One method-level type parameter named by a signature.
#[derive(Clone, Debug)]
pub struct TypeArgSpec {
    pub name: Name,
    pub ty: Type,
    pub loc: Loc,
}

/// A fully parsed signature.
#[derive(Clone, Debug, Default)]
pub struct ParsedSig {
    pub returns: Option<Type>,
    pub arg_types: Vec<ArgSpec>,
    pub type_args: Vec<TypeArgSpec>,
    pub seen: SigSeen,
    pub bind: SymbolRef,
}

impl ParsedSig {
    /// Find a declared type parameter by name.
    pub fn type_arg(&self, name: Name) -> Option<&TypeArgSpec> {
        self.type_args.iter().find(|spec| spec.name == name)
    }
}

/// Whether a send is a signature: a `sig` call carrying a block.
pub fn is_sig(gs: &SymbolTable, arena: &ExprArena, send: ExprId) -> bool {
    let ExprKind::Send {
        recv, fun, block, ..
    } = arena.kind(send)
    else {
        return false;
    };
    *fun == gs.names.sig
        && block.is_some()
        && matches!(
            arena.kind(*recv),
            ExprKind::EmptyTree | ExprKind::SelfRef
        )
}

/// Parse a `sig { … }` send into a [`ParsedSig`].
pub fn parse_sig(
    gs: &SymbolTable,
    diags: &mut DiagnosticQueue,
    file: FileId,
    arena: &ExprArena,
    send: ExprId,
    args: &TypeSyntaxArgs,
) -> ParsedSig {
    let mut sig = ParsedSig::default();
    let ExprKind::Send {
        args: sig_args,
        block,
        ..
    } = arena.kind(send)
    else {
        debug_assert!(false, "parse_sig on a non-send node");
        return sig;
    };

    // `sig(:final)` marks the method final.
    for &arg in sig_args {
        if let ExprKind::Literal(LiteralValue::Sym(name)) = arena.kind(arg) {
            if *name == gs.names.final_ {
                sig.seen.final_ = true;
            }
        }
    }

    let Some(block) = block else {
        return sig;
    };
    let ExprKind::Block { body, .. } = arena.kind(*block) else {
        return sig;
    };
    let body = *body;
    if !arena.kind(body).is_empty_tree() {
        parse_sig_builder(gs, diags, file, arena, body, &mut sig, args);
    }
    sig
}

/// Walk a builder chain (`params(…).returns(…)`), innermost call first.
fn parse_sig_builder(
    gs: &SymbolTable,
    diags: &mut DiagnosticQueue,
    file: FileId,
    arena: &ExprArena,
    expr: ExprId,
    sig: &mut ParsedSig,
    args: &TypeSyntaxArgs,
) {
    let loc = Loc::new(file, arena.span(expr));
    match arena.kind(expr) {
        ExprKind::Send {
            recv,
            fun,
            args: send_args,
            ..
        } => {
            if !matches!(arena.kind(*recv), ExprKind::EmptyTree | ExprKind::SelfRef) {
                parse_sig_builder(gs, diags, file, arena, *recv, sig, args);
            }
            let fun = *fun;
            let names = gs.names;

            if fun == names.params {
                sig.seen.params = true;
                match send_args.first().map(|&a| arena.kind(a)) {
                    Some(ExprKind::Hash { keys, values }) => {
                        for (&key, &value) in keys.iter().zip(values) {
                            let ExprKind::Literal(LiteralValue::Sym(name)) = arena.kind(key)
                            else {
                                malformed(gs, diags, loc, "Parameter names must be symbols");
                                continue;
                            };
                            let ty =
                                get_result_type(gs, diags, file, arena, value, sig, args);
                            sig.arg_types.push(ArgSpec {
                                name: *name,
                                ty,
                                loc: Loc::new(file, arena.span(key)),
                                rebind: SymbolRef::NONE,
                            });
                        }
                    }
                    _ => malformed(gs, diags, loc, "`params` expects keyword arguments"),
                }
            } else if fun == names.returns {
                sig.seen.returns = true;
                match send_args.first() {
                    Some(&ret) => {
                        sig.returns =
                            Some(get_result_type(gs, diags, file, arena, ret, sig, args));
                    }
                    None => malformed(gs, diags, loc, "`returns` expects a type argument"),
                }
            } else if fun == names.void {
                sig.seen.void = true;
                sig.returns = Some(Type::Void);
            } else if fun == names.abstract_ {
                sig.seen.abstract_ = true;
            } else if fun == names.implementation {
                sig.seen.implementation = true;
            } else if fun == names.override_ {
                sig.seen.override_ = true;
                // `override(allow_incompatible: true)` tolerates signature
                // changes the override checker would otherwise reject.
                if let Some(ExprKind::Hash { keys, values }) =
                    send_args.first().map(|&a| arena.kind(a))
                {
                    for (&key, &value) in keys.iter().zip(values) {
                        let is_allow = matches!(
                            arena.kind(key),
                            ExprKind::Literal(LiteralValue::Sym(name))
                                if gs.interner.lookup(*name) == "allow_incompatible"
                        );
                        if is_allow
                            && matches!(
                                arena.kind(value),
                                ExprKind::Literal(LiteralValue::Bool(true))
                            )
                        {
                            sig.seen.incompatible_override = true;
                        }
                    }
                }
            } else if fun == names.overridable {
                sig.seen.overridable = true;
            } else if fun == names.final_ {
                sig.seen.final_ = true;
            } else if fun == names.generated {
                sig.seen.generated = true;
            } else if fun == names.bind {
                sig.seen.bind = true;
                sig.bind = match send_args.first().map(|&a| arena.kind(a)) {
                    Some(ExprKind::ConstantLit { symbol, .. }) if symbol.exists() => {
                        gs.dealias(*symbol)
                    }
                    _ => {
                        malformed(gs, diags, loc, "`bind` expects a class or module");
                        SymbolRef::NONE
                    }
                };
            } else if fun == names.type_parameters {
                for &arg in send_args {
                    let ExprKind::Literal(LiteralValue::Sym(name)) = arena.kind(arg) else {
                        malformed(gs, diags, loc, "`type_parameters` expects symbols");
                        continue;
                    };
                    let name = *name;
                    sig.type_args.push(TypeArgSpec {
                        name,
                        ty: Type::TypeVar {
                            name,
                            sym: SymbolRef::NONE,
                        },
                        loc: Loc::new(file, arena.span(arg)),
                    });
                }
            } else {
                malformed(
                    gs,
                    diags,
                    loc,
                    format!("Unknown `sig` builder `{}`", gs.interner.lookup(fun)),
                );
            }
        }
        ExprKind::EmptyTree | ExprKind::SelfRef => {}
        _ => malformed(gs, diags, loc, "Malformed `sig`: invalid signature body"),
    }
}

/// Turn a type expression into a [`Type`].
///
/// Only runs over fully resolved subtrees; unresolvable syntax degrades to
/// `untyped` after reporting, so one bad annotation never aborts a pass.
pub fn get_result_type(
    gs: &SymbolTable,
    diags: &mut DiagnosticQueue,
    file: FileId,
    arena: &ExprArena,
    expr: ExprId,
    sig: &ParsedSig,
    args: &TypeSyntaxArgs,
) -> Type {
    let loc = Loc::new(file, arena.span(expr));
    match arena.kind(expr) {
        ExprKind::ConstantLit { symbol, .. } => {
            let symbol = *symbol;
            if !symbol.exists() {
                return Types::untyped(args.context);
            }
            if gs.is_type_alias(symbol) {
                return gs
                    .symbol(symbol)
                    .result_type
                    .clone()
                    .unwrap_or_else(|| Types::untyped(symbol));
            }
            if gs.is_type_member(symbol) {
                if !args.allow_type_member {
                    malformed(
                        gs,
                        diags,
                        loc,
                        format!(
                            "Type member `{}` is not allowed in this context",
                            gs.show_full_name(symbol)
                        ),
                    );
                    return Types::untyped(args.context);
                }
                return Type::TypeMemberRef(symbol);
            }
            let dealiased = gs.dealias(symbol);
            if dealiased.is_stub() || dealiased == SymbolRef::UNTYPED {
                return Types::untyped(args.context);
            }
            if gs.is_class(dealiased) {
                return Type::ClassInstance(dealiased);
            }
            malformed(
                gs,
                diags,
                loc,
                format!(
                    "`{}` is not a class, module or type alias",
                    gs.show_full_name(symbol)
                ),
            );
            Types::untyped(args.context)
        }
        ExprKind::Send {
            recv,
            fun,
            args: send_args,
            ..
        } => {
            let is_type_namespace = matches!(
                arena.kind(*recv),
                ExprKind::ConstantLit { symbol, .. } if gs.dealias(*symbol) == SymbolRef::T
            );
            if !is_type_namespace {
                malformed(gs, diags, loc, "Unsupported type syntax");
                return Types::untyped(args.context);
            }
            let fun = *fun;
            let names = gs.names;

            if fun == names.untyped {
                Types::untyped(args.context)
            } else if fun == names.nilable {
                match send_args.first() {
                    Some(&inner) => Types::nilable(get_result_type(
                        gs, diags, file, arena, inner, sig, args,
                    )),
                    None => {
                        malformed(gs, diags, loc, "`T.nilable` expects a type argument");
                        Types::untyped(args.context)
                    }
                }
            } else if fun == names.any {
                if send_args.len() < 2 {
                    malformed(gs, diags, loc, "`T.any` expects at least two types");
                    return Types::untyped(args.context);
                }
                let members = send_args
                    .iter()
                    .map(|&a| get_result_type(gs, diags, file, arena, a, sig, args))
                    .collect();
                Type::Union(members)
            } else if fun == names.self_type {
                if !args.allow_self_type {
                    malformed(gs, diags, loc, "Only valid within `sig`: `T.self_type`");
                    return Types::untyped(args.context);
                }
                Type::SelfType
            } else if fun == names.type_parameter {
                let declared = send_args.first().and_then(|&a| {
                    let ExprKind::Literal(LiteralValue::Sym(name)) = arena.kind(a) else {
                        return None;
                    };
                    sig.type_arg(*name)
                });
                match declared {
                    Some(spec) => spec.ty.clone(),
                    None => {
                        malformed(
                            gs,
                            diags,
                            loc,
                            "Unspecified type parameter; declare it with `type_parameters`",
                        );
                        Types::untyped(args.context)
                    }
                }
            } else {
                malformed(
                    gs,
                    diags,
                    loc,
                    format!("Unsupported type syntax `T.{}`", gs.interner.lookup(fun)),
                );
                Types::untyped(args.context)
            }
        }
        ExprKind::Literal(value) => Type::Literal(*value),
        _ => {
            malformed(gs, diags, loc, "Unsupported type syntax");
            Types::untyped(args.context)
        }
    }
}

fn malformed(
    gs: &SymbolTable,
    diags: &mut DiagnosticQueue,
    loc: Loc,
    message: impl Into<String>,
) {
    if let Some(e) = diags.begin_error(&gs.files, loc, ErrorCode::InvalidMethodSignature) {
        e.message(message).emit();
    }
}
