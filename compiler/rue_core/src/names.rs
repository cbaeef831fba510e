//! Names the resolver recognizes structurally.
//!
//! Interned once when the symbol table is created so recognition is a `u32`
//! compare, never a string compare.

use crate::{Name, StringInterner};

/// Pre-interned well-known names.
#[derive(Clone, Copy, Debug)]
pub struct WellKnownNames {
    // Type DSL entry points.
    pub sig: Name,
    pub type_alias: Name,
    pub type_member: Name,
    pub type_template: Name,
    pub let_: Name,
    pub cast: Name,
    pub assert_type: Name,
    pub reveal_type: Name,
    pub alias_method: Name,
    pub mixes_in_class_methods: Name,

    // Sig builder methods.
    pub params: Name,
    pub returns: Name,
    pub void: Name,
    pub abstract_: Name,
    pub implementation: Name,
    pub override_: Name,
    pub overridable: Name,
    pub final_: Name,
    pub generated: Name,
    pub bind: Name,
    pub type_parameters: Name,

    // Type constructors under `T`.
    pub untyped: Name,
    pub nilable: Name,
    pub any: Name,
    pub self_type: Name,
    pub type_parameter: Name,

    // Type member option keys.
    pub fixed: Name,
    pub lower: Name,
    pub upper: Name,

    // Structural names.
    pub initialize: Name,
    pub t: Name,
    pub subclasses: Name,
    /// Pseudo-member a module's `mixes_in_class_methods` target is recorded
    /// under.
    pub class_methods: Name,
    /// Member name a class's singleton class is recorded under.
    pub singleton: Name,
    /// The synthesized block argument every method carries.
    pub blk_arg: Name,
}

impl WellKnownNames {
    /// Intern every well-known name.
    pub fn intern(interner: &StringInterner) -> Self {
        WellKnownNames {
            sig: interner.intern("sig"),
            type_alias: interner.intern("type_alias"),
            type_member: interner.intern("type_member"),
            type_template: interner.intern("type_template"),
            let_: interner.intern("let"),
            cast: interner.intern("cast"),
            assert_type: interner.intern("assert_type"),
            reveal_type: interner.intern("reveal_type"),
            alias_method: interner.intern("alias_method"),
            mixes_in_class_methods: interner.intern("mixes_in_class_methods"),

            params: interner.intern("params"),
            returns: interner.intern("returns"),
            void: interner.intern("void"),
            abstract_: interner.intern("abstract"),
            implementation: interner.intern("implementation"),
            override_: interner.intern("override"),
            overridable: interner.intern("overridable"),
            final_: interner.intern("final"),
            generated: interner.intern("generated"),
            bind: interner.intern("bind"),
            type_parameters: interner.intern("type_parameters"),

            untyped: interner.intern("untyped"),
            nilable: interner.intern("nilable"),
            any: interner.intern("any"),
            self_type: interner.intern("self_type"),
            type_parameter: interner.intern("type_parameter"),

            fixed: interner.intern("fixed"),
            lower: interner.intern("lower"),
            upper: interner.intern("upper"),

            initialize: interner.intern("initialize"),
            t: interner.intern("T"),
            subclasses: interner.intern("Subclasses"),
            class_methods: interner.intern("<classMethods>"),
            singleton: interner.intern("<singleton>"),
            blk_arg: interner.intern("<blk>"),
        }
    }
}
