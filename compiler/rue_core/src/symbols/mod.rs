//! The symbol arena.
//!
//! Symbols live in one append-and-mutate table indexed by opaque
//! [`SymbolRef`] handles. Symbols are never deleted; handles stay valid for
//! the lifetime of a run. Cyclic references (a class's superclass, a
//! member's owner) are expressed as handles into the arena, never as owning
//! pointers.

mod table;

pub use table::{FuzzyMatch, SymbolTable, UniqueNameKind};

#[cfg(test)]
mod tests;

use crate::{Loc, Name, Type};
use rustc_hash::FxHashMap;
use std::fmt;

/// Opaque handle into the [`SymbolTable`].
///
/// Index 0 is the "no symbol" sentinel; [`SymbolRef::exists`] distinguishes
/// real symbols from it. The remaining distinguished symbols are entered in a
/// fixed order when the table is created, which is what makes the associated
/// constants here valid.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct SymbolRef(u32);

impl SymbolRef {
    /// "No symbol": lookups that found nothing.
    pub const NONE: SymbolRef = SymbolRef(0);
    /// The root scope every top-level definition hangs off.
    pub const ROOT: SymbolRef = SymbolRef(1);
    /// Marker for a superclass slot the namer has not filled yet.
    pub const TODO: SymbolRef = SymbolRef(2);
    /// `Object`, the default superclass.
    pub const OBJECT: SymbolRef = SymbolRef(3);
    /// `BasicObject`, the top of the user hierarchy.
    pub const BASIC_OBJECT: SymbolRef = SymbolRef(4);
    /// `NilClass`, used to build nilable unions.
    pub const NIL_CLASS: SymbolRef = SymbolRef(5);
    /// The `T` namespace module the type DSL lives under.
    pub const T: SymbolRef = SymbolRef(6);
    /// Stub substituted for constants that never resolved.
    pub const STUB_MODULE: SymbolRef = SymbolRef(7);
    /// Stub substituted for superclasses that never resolved.
    pub const STUB_SUPER_CLASS: SymbolRef = SymbolRef(8);
    /// Stub substituted for mixins that never resolved.
    pub const STUB_MIXIN: SymbolRef = SymbolRef(9);
    /// The `T.untyped` placeholder symbol.
    pub const UNTYPED: SymbolRef = SymbolRef(10);
    /// Target of method aliases whose real target is missing.
    pub const BAD_ALIAS_METHOD_STUB: SymbolRef = SymbolRef(11);

    /// Create from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        SymbolRef(raw)
    }

    /// Get the raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check whether this handle refers to an actual symbol.
    #[inline]
    pub const fn exists(self) -> bool {
        self.0 != 0
    }

    /// Check whether this is one of the stub sentinels substituted for
    /// failed resolutions.
    #[inline]
    pub fn is_stub(self) -> bool {
        matches!(
            self,
            SymbolRef::STUB_MODULE | SymbolRef::STUB_SUPER_CLASS | SymbolRef::STUB_MIXIN
        )
    }
}

impl fmt::Debug for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolRef({})", self.0)
    }
}

impl Default for SymbolRef {
    fn default() -> Self {
        SymbolRef::NONE
    }
}

/// What kind of definition a symbol stands for.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SymbolKind {
    Class,
    Module,
    Method,
    /// A constant (including type aliases, which carry an extra flag).
    StaticField,
    /// An instance variable.
    Field,
    /// A type parameter declared on a class.
    TypeMember,
    /// A per-method type variable.
    TypeArgument,
}

/// Flag bits attached to a symbol.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct SymbolFlags(u32);

impl SymbolFlags {
    pub const TYPE_ALIAS: SymbolFlags = SymbolFlags(1 << 0);
    pub const CLASS_ABSTRACT: SymbolFlags = SymbolFlags(1 << 1);
    pub const CLASS_INTERFACE: SymbolFlags = SymbolFlags(1 << 2);
    pub const CLASS_SEALED: SymbolFlags = SymbolFlags(1 << 3);
    pub const CLASS_SINGLETON: SymbolFlags = SymbolFlags(1 << 4);
    pub const METHOD_ABSTRACT: SymbolFlags = SymbolFlags(1 << 5);
    pub const METHOD_IMPLEMENTATION: SymbolFlags = SymbolFlags(1 << 6);
    pub const METHOD_OVERRIDE: SymbolFlags = SymbolFlags(1 << 7);
    pub const METHOD_OVERRIDABLE: SymbolFlags = SymbolFlags(1 << 8);
    pub const METHOD_FINAL: SymbolFlags = SymbolFlags(1 << 9);
    pub const METHOD_INCOMPATIBLE_OVERRIDE: SymbolFlags = SymbolFlags(1 << 10);
    pub const METHOD_GENERATED_SIG: SymbolFlags = SymbolFlags(1 << 11);
    pub const METHOD_GENERIC: SymbolFlags = SymbolFlags(1 << 12);
    pub const METHOD_OVERLOADED: SymbolFlags = SymbolFlags(1 << 13);

    /// Check whether all bits of `other` are set.
    #[inline]
    pub const fn contains(self, other: SymbolFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set all bits of `other`.
    #[inline]
    pub fn insert(&mut self, other: SymbolFlags) {
        self.0 |= other.0;
    }

    /// Clear all bits of `other`.
    #[inline]
    pub fn remove(&mut self, other: SymbolFlags) {
        self.0 &= !other.0;
    }
}

/// Flag bits of one method parameter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ArgFlags {
    pub keyword: bool,
    pub block: bool,
    pub repeated: bool,
    /// Has a default value.
    pub default: bool,
}

/// Declared information about one method parameter.
#[derive(Clone, Debug)]
pub struct ArgInfo {
    pub name: Name,
    pub loc: Loc,
    pub flags: ArgFlags,
    /// Declared type; filled in by the signatures pass.
    pub ty: Option<Type>,
    /// Rebound self type, when the signature declared one.
    pub rebind: SymbolRef,
}

impl ArgInfo {
    /// A plain positional parameter with no type yet.
    pub fn positional(name: Name, loc: Loc) -> Self {
        ArgInfo {
            name,
            loc,
            flags: ArgFlags::default(),
            ty: None,
            rebind: SymbolRef::NONE,
        }
    }

    /// Whether the parameter is required (not optional, repeated or block).
    pub fn is_required(&self) -> bool {
        !self.flags.block && !self.flags.repeated && !self.flags.default
    }
}

/// One entry in the symbol arena.
///
/// A single struct holds every kind of symbol; which payload fields are
/// meaningful depends on `kind`. This mirrors how downstream passes consume
/// symbols: they branch on kind once and then read fields directly.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub owner: SymbolRef,
    pub name: Name,
    pub loc: Loc,
    pub flags: SymbolFlags,

    /// Class/module: direct members by name.
    pub members: FxHashMap<Name, SymbolRef>,
    /// Class: the superclass slot. `NONE` = not yet known, `TODO` = namer
    /// marker for "no superclass written".
    pub superclass: SymbolRef,
    /// Class/module: mixed-in modules, in inclusion order.
    pub mixins: Vec<SymbolRef>,
    /// Sealed class: every registered subclass.
    pub sealed_subclasses: Vec<SymbolRef>,
    /// Class: type members, in declaration order.
    pub type_members: Vec<SymbolRef>,

    /// Method: declared parameters.
    pub arguments: Vec<ArgInfo>,
    /// Method: rebound self, when a signature declared `bind`.
    pub rebind: SymbolRef,

    /// Kind-dependent result: a method's return type, a static field's or
    /// type alias's type, a type member's bounds.
    pub result_type: Option<Type>,
}

impl Symbol {
    /// Create a bare symbol of the given kind.
    pub fn new(kind: SymbolKind, owner: SymbolRef, name: Name, loc: Loc) -> Self {
        Symbol {
            kind,
            owner,
            name,
            loc,
            flags: SymbolFlags::default(),
            members: FxHashMap::default(),
            superclass: SymbolRef::NONE,
            mixins: Vec::new(),
            sealed_subclasses: Vec::new(),
            type_members: Vec::new(),
            arguments: Vec::new(),
            rebind: SymbolRef::NONE,
            result_type: None,
        }
    }

    /// Class or module?
    #[inline]
    pub fn is_class_or_module(&self) -> bool {
        matches!(self.kind, SymbolKind::Class | SymbolKind::Module)
    }

    /// Type alias static field?
    #[inline]
    pub fn is_type_alias(&self) -> bool {
        self.flags.contains(SymbolFlags::TYPE_ALIAS)
    }
}
