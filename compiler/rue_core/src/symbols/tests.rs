use crate::{Loc, SymbolRef, SymbolTable, Type, Types};

use super::UniqueNameKind;

fn class(gs: &mut SymbolTable, owner: SymbolRef, name: &str) -> SymbolRef {
    let name = gs.interner.intern(name);
    let sym = gs.enter_class_symbol(Loc::NONE, owner, name, false);
    gs.set_super_class(sym, SymbolRef::OBJECT);
    sym
}

fn module(gs: &mut SymbolTable, owner: SymbolRef, name: &str) -> SymbolRef {
    let name = gs.interner.intern(name);
    gs.enter_class_symbol(Loc::NONE, owner, name, true)
}

#[test]
fn test_sentinels_present() {
    let gs = SymbolTable::new();
    assert!(gs.is_class(SymbolRef::OBJECT));
    assert!(gs.is_class_module(SymbolRef::T));
    assert!(gs.is_class_module(SymbolRef::STUB_MODULE));
    assert_eq!(gs.symbol(SymbolRef::OBJECT).superclass, SymbolRef::BASIC_OBJECT);
    assert_eq!(gs.symbol(SymbolRef::BASIC_OBJECT).superclass, SymbolRef::TODO);
}

#[test]
fn test_find_member_direct_and_transitive() {
    let mut gs = SymbolTable::new();
    let parent = class(&mut gs, SymbolRef::ROOT, "Parent");
    let child = class(&mut gs, SymbolRef::ROOT, "Child");
    gs.set_super_class(child, parent);

    let inner = class(&mut gs, parent, "Inner");
    let inner_name = gs.symbol(inner).name;

    assert_eq!(gs.find_member(parent, inner_name), inner);
    assert_eq!(gs.find_member(child, inner_name), SymbolRef::NONE);
    assert_eq!(gs.find_member_transitive(child, inner_name), inner);
}

#[test]
fn test_transitive_search_covers_mixins() {
    let mut gs = SymbolTable::new();
    let mixin = module(&mut gs, SymbolRef::ROOT, "Helpers");
    let helper = class(&mut gs, mixin, "Util");
    let user = class(&mut gs, SymbolRef::ROOT, "User");
    gs.push_mixin(user, mixin);

    let util_name = gs.symbol(helper).name;
    assert_eq!(gs.find_member_transitive(user, util_name), helper);
}

#[test]
fn test_transitive_search_survives_cycles() {
    let mut gs = SymbolTable::new();
    let a = class(&mut gs, SymbolRef::ROOT, "A");
    let b = class(&mut gs, SymbolRef::ROOT, "B");
    gs.set_super_class(a, b);
    gs.set_super_class(b, a);

    let missing = gs.interner.intern("Missing");
    assert_eq!(gs.find_member_transitive(a, missing), SymbolRef::NONE);
    assert!(gs.derives_from(a, b));
    assert!(gs.derives_from(b, a));
}

#[test]
fn test_dealias_follows_class_aliases() {
    let mut gs = SymbolTable::new();
    let target = class(&mut gs, SymbolRef::ROOT, "Target");
    let alias_name = gs.interner.intern("Shortcut");
    let alias = gs.enter_static_field_symbol(Loc::NONE, SymbolRef::ROOT, alias_name);
    gs.symbol_mut(alias).result_type = Some(Types::alias(target));

    assert_eq!(gs.dealias(alias), target);
    assert_eq!(gs.dealias(gs.dealias(alias)), gs.dealias(alias));
}

#[test]
fn test_dealias_stops_at_type_aliases() {
    let mut gs = SymbolTable::new();
    let alias_name = gs.interner.intern("MyType");
    let alias = gs.enter_static_field_symbol(Loc::NONE, SymbolRef::ROOT, alias_name);
    gs.symbol_mut(alias)
        .flags
        .insert(crate::symbols::SymbolFlags::TYPE_ALIAS);
    gs.symbol_mut(alias).result_type = Some(Type::Alias(SymbolRef::OBJECT));

    // Type aliases store a type, not a symbol link; dealias must not follow.
    assert_eq!(gs.dealias(alias), alias);
}

#[test]
fn test_fuzzy_match_suggests_close_names() {
    let mut gs = SymbolTable::new();
    let scope = class(&mut gs, SymbolRef::ROOT, "Scope");
    let length = class(&mut gs, scope, "Length");
    class(&mut gs, scope, "Unrelated");

    let typo = gs.interner.intern("Lenght");
    let matches = gs.find_member_fuzzy_match(scope, typo, 3);
    assert_eq!(matches.first().map(|m| m.symbol), Some(length));
}

#[test]
fn test_mangle_rename_frees_the_slot() {
    let mut gs = SymbolTable::new();
    let owner = class(&mut gs, SymbolRef::ROOT, "Owner");
    let name = gs.interner.intern("compute");
    let method = gs.enter_method_symbol(Loc::NONE, owner, name);

    gs.mangle_rename_symbol(method, name);
    assert_eq!(gs.find_member(owner, name), SymbolRef::NONE);
    assert_ne!(gs.symbol(method).name, name);

    // Slot can be re-entered with a fresh symbol.
    let replacement = gs.enter_method_symbol(Loc::NONE, owner, name);
    assert_ne!(replacement, method);
    assert_eq!(gs.find_member(owner, name), replacement);
}

#[test]
fn test_fresh_names_are_distinct() {
    let gs = SymbolTable::new();
    let base = gs.interner.intern("f");
    let a = gs.fresh_name_unique(UniqueNameKind::Overload, base, 1);
    let b = gs.fresh_name_unique(UniqueNameKind::Overload, base, 2);
    let c = gs.fresh_name_unique(UniqueNameKind::TypeVar, base, 1);
    assert_ne!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_show_full_name_nests() {
    let mut gs = SymbolTable::new();
    let outer = module(&mut gs, SymbolRef::ROOT, "Outer");
    let inner = class(&mut gs, outer, "Inner");
    assert_eq!(gs.show_full_name(inner), "Outer::Inner");
}

#[test]
fn test_singleton_class_is_created_once() {
    let mut gs = SymbolTable::new();
    let klass = class(&mut gs, SymbolRef::ROOT, "Widget");
    assert!(!gs.lookup_singleton_class(klass).exists());
    let singleton = gs.singleton_class(klass);
    assert!(gs.is_singleton_class(singleton));
    assert_eq!(gs.singleton_class(klass), singleton);
}
