//! The type term language the resolver produces.
//!
//! The resolver never infers; it only builds terms out of resolved symbols
//! and hands them to the inferencer. The algebra here is correspondingly
//! small: enough subtyping to validate type-member bounds, plus equivalence
//! for redeclaration checks.

use crate::{LiteralValue, Name, SymbolRef, SymbolTable};

/// A type term.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    /// The dynamic type, tracking which symbol it blames.
    Untyped { blame: SymbolRef },
    /// The dynamic type with no blame attribution.
    UntypedUntracked,
    Top,
    Bottom,
    /// An instance of a class or module.
    ClassInstance(SymbolRef),
    /// An alias to another symbol (class aliases, method aliases).
    Alias(SymbolRef),
    /// A reference to a class-level type member.
    TypeMemberRef(SymbolRef),
    /// A per-method type variable. `sym` is `NONE` until the signatures pass
    /// enters the type argument symbol and patches it in.
    TypeVar { name: Name, sym: SymbolRef },
    /// Bounds payload stored on a type-member symbol.
    LambdaParam { lower: Box<Type>, upper: Box<Type> },
    SelfType,
    Union(Vec<Type>),
    /// A singleton literal type (constants with literal right-hand sides).
    Literal(LiteralValue),
    /// The return type of `.void` signatures.
    Void,
}

/// Constructors and queries over [`Type`].
pub struct Types;

impl Types {
    /// The dynamic type, blaming `blame` as its origin.
    pub fn untyped(blame: SymbolRef) -> Type {
        Type::Untyped { blame }
    }

    /// The dynamic type with no blame attribution.
    pub fn untyped_untracked() -> Type {
        Type::UntypedUntracked
    }

    pub fn top() -> Type {
        Type::Top
    }

    pub fn bottom() -> Type {
        Type::Bottom
    }

    /// An alias to `target`'s type.
    pub fn alias(target: SymbolRef) -> Type {
        Type::Alias(target)
    }

    /// `t` or nil.
    pub fn nilable(t: Type) -> Type {
        match t {
            Type::Union(mut members) => {
                let nil = Type::ClassInstance(SymbolRef::NIL_CLASS);
                if !members.contains(&nil) {
                    members.push(nil);
                }
                Type::Union(members)
            }
            other => Type::Union(vec![other, Type::ClassInstance(SymbolRef::NIL_CLASS)]),
        }
    }

    /// Whether a type is the dynamic type (either flavor).
    pub fn is_untyped(t: &Type) -> bool {
        matches!(t, Type::Untyped { .. } | Type::UntypedUntracked)
    }

    /// Subtype check.
    ///
    /// Untyped is both a subtype and a supertype of everything, so errors
    /// do not cascade through dynamic code.
    pub fn is_subtype(gs: &SymbolTable, sub: &Type, sup: &Type) -> bool {
        if Self::is_untyped(sub) || Self::is_untyped(sup) {
            return true;
        }
        if sub == sup {
            return true;
        }
        match (sub, sup) {
            (Type::Bottom, _) | (_, Type::Top) => true,
            (Type::Union(members), _) => members.iter().all(|m| Self::is_subtype(gs, m, sup)),
            (_, Type::Union(members)) => members.iter().any(|m| Self::is_subtype(gs, sub, m)),
            (Type::ClassInstance(a), Type::ClassInstance(b)) => {
                *a == *b || gs.derives_from(*a, *b)
            }
            (Type::Literal(value), Type::ClassInstance(_)) => {
                // A literal is a subtype of its value's class; without a full
                // standard library we only know nil's class.
                matches!(value, LiteralValue::Nil)
                    && *sup == Type::ClassInstance(SymbolRef::NIL_CLASS)
            }
            _ => false,
        }
    }

    /// Type equivalence: mutual subtyping, with the two untyped flavors
    /// identified.
    pub fn equiv(gs: &SymbolTable, a: &Type, b: &Type) -> bool {
        if Self::is_untyped(a) && Self::is_untyped(b) {
            return true;
        }
        Self::is_subtype(gs, a, b) && Self::is_subtype(gs, b, a)
    }

    /// Render a type for messages.
    pub fn show(gs: &SymbolTable, t: &Type) -> String {
        match t {
            Type::Untyped { .. } | Type::UntypedUntracked => "T.untyped".to_string(),
            Type::Top => "<top>".to_string(),
            Type::Bottom => "<bottom>".to_string(),
            Type::ClassInstance(sym) => gs.show_full_name(*sym),
            Type::Alias(sym) => format!("<alias of {}>", gs.show_full_name(*sym)),
            Type::TypeMemberRef(sym) => gs.show_full_name(*sym),
            Type::TypeVar { name, .. } => gs.interner.lookup(*name).to_string(),
            Type::LambdaParam { lower, upper } => format!(
                "[{}, {}]",
                Self::show(gs, lower),
                Self::show(gs, upper)
            ),
            Type::SelfType => "T.self_type".to_string(),
            Type::Union(members) => {
                let rendered: Vec<String> = members.iter().map(|m| Self::show(gs, m)).collect();
                format!("T.any({})", rendered.join(", "))
            }
            Type::Literal(value) => format!("{value:?}"),
            Type::Void => "void".to_string(),
        }
    }
}
