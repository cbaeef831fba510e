//! End-to-end tests for constant and ancestor resolution.

mod support;

use rue_ast::ClassKind;
use rue_core::{StrictLevel, SymbolRef, Type, Types};
use rue_diagnostic::{Diagnostic, ErrorCode};
use support::{assert_no_unresolved, Fixture};

fn codes(diags: &[Diagnostic]) -> Vec<ErrorCode> {
    diags.iter().map(|d| d.code).collect()
}

#[test]
fn test_forward_reference_across_files() {
    let mut f = Fixture::new();
    let file_a = f.file("a.rue", StrictLevel::True);
    let file_b = f.file("b.rue", StrictLevel::True);
    let c = f.class(file_a, SymbolRef::ROOT, "C");
    let d = f.class(file_b, SymbolRef::ROOT, "D");

    let mut ta = f.tree(file_a);
    let d_ref = ta.uconst(&f.gs, "D");
    let cdef = ta.class_def(c, ClassKind::Class, vec![d_ref], vec![]);
    let tree_a = ta.finish(vec![cdef]);

    let mut tb = f.tree(file_b);
    let ddef = tb.class_def(d, ClassKind::Class, vec![], vec![]);
    let tree_b = tb.finish(vec![ddef]);

    let result = rue_resolver::run(&mut f.gs, vec![tree_a, tree_b], 0);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(f.gs.symbol(c).superclass, d);
    for tree in &result.trees {
        assert_no_unresolved(tree);
    }
}

#[test]
fn test_forward_reference_with_worker_pool() {
    let mut f = Fixture::new();
    let file_a = f.file("a.rue", StrictLevel::True);
    let file_b = f.file("b.rue", StrictLevel::True);
    let c = f.class(file_a, SymbolRef::ROOT, "C");
    let d = f.class(file_b, SymbolRef::ROOT, "D");

    let mut ta = f.tree(file_a);
    let d_ref = ta.uconst(&f.gs, "D");
    let cdef = ta.class_def(c, ClassKind::Class, vec![d_ref], vec![]);
    let tree_a = ta.finish(vec![cdef]);

    let mut tb = f.tree(file_b);
    let ddef = tb.class_def(d, ClassKind::Class, vec![], vec![]);
    let tree_b = tb.finish(vec![ddef]);

    let result = rue_resolver::run(&mut f.gs, vec![tree_a, tree_b], 4);
    assert!(result.diagnostics.is_empty());
    assert_eq!(f.gs.symbol(c).superclass, d);
}

#[test]
fn test_unknown_constant_gets_stub_and_suggestion() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    f.class(file, SymbolRef::ROOT, "C");
    let x = f.static_field(file, SymbolRef::ROOT, "X");

    let mut t = f.tree(file);
    let lhs = t.uconst(&f.gs, "X");
    let rhs = t.uconst(&f.gs, "CC");
    let asgn = t.assign(lhs, rhs);
    let tree = t.finish(vec![asgn]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert_eq!(codes(&result.diagnostics), vec![ErrorCode::StubConstant]);
    let diag = &result.diagnostics[0];
    assert!(diag.message.contains("Unable to resolve constant `CC`"));
    assert!(
        diag.labels.iter().any(|l| l.message.contains("Did you mean: `C`?")),
        "expected a fuzzy suggestion, got {:?}",
        diag.labels
    );
    assert_eq!(
        f.gs.symbol(x).result_type,
        Some(Types::alias(SymbolRef::STUB_MODULE))
    );
}

#[test]
fn test_type_alias_cycle_reports_once() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let a = f.type_alias_field(file, SymbolRef::ROOT, "A");
    let b = f.type_alias_field(file, SymbolRef::ROOT, "B");

    let mut t = f.tree(file);
    let a_lhs = t.uconst(&f.gs, "A");
    let b_use = t.uconst(&f.gs, "B");
    let a_rhs = t.type_alias_of(&f.gs, b_use);
    let a_asgn = t.assign(a_lhs, a_rhs);
    let b_lhs = t.uconst(&f.gs, "B");
    let a_use = t.uconst(&f.gs, "A");
    let b_rhs = t.type_alias_of(&f.gs, a_use);
    let b_asgn = t.assign(b_lhs, b_rhs);
    let tree = t.finish(vec![a_asgn, b_asgn]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert_eq!(
        codes(&result.diagnostics),
        vec![ErrorCode::RecursiveTypeAlias],
        "{:?}",
        result.diagnostics
    );
    assert!(Types::is_untyped(f.gs.symbol(a).result_type.as_ref().unwrap()));
    assert!(Types::is_untyped(f.gs.symbol(b).result_type.as_ref().unwrap()));
}

#[test]
fn test_self_inheritance_reports_circular_dependency() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let c = f.class(file, SymbolRef::ROOT, "C");

    let mut t = f.tree(file);
    let c_ref = t.uconst(&f.gs, "C");
    let cdef = t.class_def(c, ClassKind::Class, vec![c_ref], vec![]);
    let tree = t.finish(vec![cdef]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert_eq!(codes(&result.diagnostics), vec![ErrorCode::CircularDependency]);
    assert_eq!(f.gs.symbol(c).superclass, SymbolRef::STUB_SUPER_CLASS);
}

#[test]
fn test_mutual_inheritance_reports_circular_dependency() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let a = f.class(file, SymbolRef::ROOT, "A");
    let b = f.class(file, SymbolRef::ROOT, "B");

    let mut t = f.tree(file);
    let b_ref = t.uconst(&f.gs, "B");
    let adef = t.class_def(a, ClassKind::Class, vec![b_ref], vec![]);
    let a_ref = t.uconst(&f.gs, "A");
    let bdef = t.class_def(b, ClassKind::Class, vec![a_ref], vec![]);
    let tree = t.finish(vec![adef, bdef]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert_eq!(codes(&result.diagnostics), vec![ErrorCode::CircularDependency]);
    assert_eq!(f.gs.symbol(a).superclass, b);
    assert_eq!(f.gs.symbol(b).superclass, SymbolRef::STUB_SUPER_CLASS);
}

#[test]
fn test_nested_scope_resolution() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let outer = f.module(file, SymbolRef::ROOT, "Outer");
    let inner = f.class(file, outer, "Inner");
    let x = f.static_field(file, outer, "X");

    let mut t = f.tree(file);
    let inner_def = t.class_def(inner, ClassKind::Class, vec![], vec![]);
    let lhs = t.uconst(&f.gs, "X");
    let rhs = t.uconst(&f.gs, "Inner");
    let asgn = t.assign(lhs, rhs);
    let outer_def = t.class_def(outer, ClassKind::Module, vec![], vec![inner_def, asgn]);
    let tree = t.finish(vec![outer_def]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(f.gs.symbol(x).result_type, Some(Types::alias(inner)));
}

#[test]
fn test_scoped_constant_resolution() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let outer = f.module(file, SymbolRef::ROOT, "Outer");
    let inner = f.class(file, outer, "Inner");
    let x = f.static_field(file, SymbolRef::ROOT, "X");

    let mut t = f.tree(file);
    let lhs = t.uconst(&f.gs, "X");
    let scope = t.uconst(&f.gs, "Outer");
    let rhs = t.uconst_scoped(&f.gs, scope, "Inner");
    let asgn = t.assign(lhs, rhs);
    let tree = t.finish(vec![asgn]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(f.gs.symbol(x).result_type, Some(Types::alias(inner)));
}

#[test]
fn test_inherited_constant_unlocked_by_superclass() {
    // `Inner` is only visible through Child's superclass, so its lookup
    // cannot succeed until the ancestor job has run: this exercises the
    // fixed point's ancestors-first ordering.
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let parent = f.class(file, SymbolRef::ROOT, "Parent");
    let inner = f.class(file, parent, "Inner");
    let child = f.class(file, SymbolRef::ROOT, "Child");
    let x = f.static_field(file, child, "X");

    let mut t = f.tree(file);
    let inner_def = t.class_def(inner, ClassKind::Class, vec![], vec![]);
    let parent_def = t.class_def(parent, ClassKind::Class, vec![], vec![inner_def]);
    let lhs = t.uconst(&f.gs, "X");
    let rhs = t.uconst(&f.gs, "Inner");
    let asgn = t.assign(lhs, rhs);
    let parent_ref = t.uconst(&f.gs, "Parent");
    let child_def = t.class_def(child, ClassKind::Class, vec![parent_ref], vec![asgn]);
    let tree = t.finish(vec![parent_def, child_def]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(f.gs.symbol(child).superclass, parent);
    assert_eq!(f.gs.symbol(x).result_type, Some(Types::alias(inner)));
}

#[test]
fn test_mixins_append_in_order() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let m1 = f.module(file, SymbolRef::ROOT, "M1");
    let m2 = f.module(file, SymbolRef::ROOT, "M2");
    let d = f.class(file, SymbolRef::ROOT, "D");
    let c = f.class(file, SymbolRef::ROOT, "C");

    let mut t = f.tree(file);
    let d_ref = t.uconst(&f.gs, "D");
    let m1_ref = t.uconst(&f.gs, "M1");
    let m2_ref = t.uconst(&f.gs, "M2");
    let cdef = t.class_def(c, ClassKind::Class, vec![d_ref, m1_ref, m2_ref], vec![]);
    let tree = t.finish(vec![cdef]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(f.gs.symbol(c).superclass, d);
    assert_eq!(f.gs.symbol(c).mixins, vec![m1, m2]);
}

#[test]
fn test_redefined_superclass_reports() {
    let mut f = Fixture::new();
    let file_a = f.file("a.rue", StrictLevel::True);
    let file_b = f.file("b.rue", StrictLevel::True);
    let c = f.class(file_a, SymbolRef::ROOT, "C");
    let d1 = f.class(file_a, SymbolRef::ROOT, "D1");
    let d2 = f.class(file_b, SymbolRef::ROOT, "D2");

    let mut ta = f.tree(file_a);
    let d1_ref = ta.uconst(&f.gs, "D1");
    let cdef_a = ta.class_def(c, ClassKind::Class, vec![d1_ref], vec![]);
    let d1def = ta.class_def(d1, ClassKind::Class, vec![], vec![]);
    let tree_a = ta.finish(vec![cdef_a, d1def]);

    let mut tb = f.tree(file_b);
    let d2_ref = tb.uconst(&f.gs, "D2");
    let cdef_b = tb.class_def(c, ClassKind::Class, vec![d2_ref], vec![]);
    let d2def = tb.class_def(d2, ClassKind::Class, vec![], vec![]);
    let tree_b = tb.finish(vec![cdef_b, d2def]);

    let result = rue_resolver::run(&mut f.gs, vec![tree_a, tree_b], 0);
    assert_eq!(
        codes(&result.diagnostics),
        vec![ErrorCode::RedefinitionOfParents]
    );
    assert_eq!(f.gs.symbol(c).superclass, d1);
    let _ = d2;
}

#[test]
fn test_dynamic_constant_scope_reports() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let x = f.static_field(file, SymbolRef::ROOT, "X");

    let mut t = f.tree(file);
    let lhs = t.uconst(&f.gs, "X");
    let recv = t.self_ref();
    let dynamic_scope = t.send(recv, &f.gs, "compute", vec![]);
    let rhs = t.uconst_scoped(&f.gs, dynamic_scope, "Inner");
    let asgn = t.assign(lhs, rhs);
    let tree = t.finish(vec![asgn]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert_eq!(codes(&result.diagnostics), vec![ErrorCode::DynamicConstant]);
    let _ = x;
    for tree in &result.trees {
        assert_no_unresolved(tree);
    }
}

#[test]
fn test_constant_through_type_alias_reports() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    f.class(file, SymbolRef::ROOT, "Foo");
    let a = f.type_alias_field(file, SymbolRef::ROOT, "A");
    let x = f.static_field(file, SymbolRef::ROOT, "X");

    let mut t = f.tree(file);
    let a_lhs = t.uconst(&f.gs, "A");
    let foo_use = t.uconst(&f.gs, "Foo");
    let a_rhs = t.type_alias_of(&f.gs, foo_use);
    let a_asgn = t.assign(a_lhs, a_rhs);

    let x_lhs = t.uconst(&f.gs, "X");
    let scope = t.uconst(&f.gs, "A");
    let through_alias = t.uconst_scoped(&f.gs, scope, "Inner");
    let x_asgn = t.assign(x_lhs, through_alias);
    let tree = t.finish(vec![a_asgn, x_asgn]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert_eq!(
        codes(&result.diagnostics),
        vec![ErrorCode::ConstantInTypeAlias]
    );
    let _ = (a, x);
}

#[test]
fn test_reassigning_type_alias_reports() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    f.class(file, SymbolRef::ROOT, "Foo");
    let a = f.type_alias_field(file, SymbolRef::ROOT, "A");
    let x = f.static_field(file, SymbolRef::ROOT, "X");

    let mut t = f.tree(file);
    let a_lhs = t.uconst(&f.gs, "A");
    let foo_use = t.uconst(&f.gs, "Foo");
    let a_rhs = t.type_alias_of(&f.gs, foo_use);
    let a_asgn = t.assign(a_lhs, a_rhs);

    let x_lhs = t.uconst(&f.gs, "X");
    let a_use = t.uconst(&f.gs, "A");
    let x_asgn = t.assign(x_lhs, a_use);
    let tree = t.finish(vec![a_asgn, x_asgn]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert_eq!(
        codes(&result.diagnostics),
        vec![ErrorCode::ReassignsTypeAlias]
    );
    assert!(Types::is_untyped(f.gs.symbol(x).result_type.as_ref().unwrap()));
    let _ = a;
}

#[test]
fn test_recursive_class_alias_reports() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let x = f.static_field(file, SymbolRef::ROOT, "X");

    let mut t = f.tree(file);
    let lhs = t.uconst(&f.gs, "X");
    let rhs = t.uconst(&f.gs, "X");
    let asgn = t.assign(lhs, rhs);
    let tree = t.finish(vec![asgn]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert_eq!(
        codes(&result.diagnostics),
        vec![ErrorCode::RecursiveClassAlias]
    );
    assert!(Types::is_untyped(f.gs.symbol(x).result_type.as_ref().unwrap()));
}

#[test]
fn test_sealed_parent_records_subclass() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let sealed = f.class(file, SymbolRef::ROOT, "Sealed");
    f.gs
        .symbol_mut(sealed)
        .flags
        .insert(rue_core::SymbolFlags::CLASS_SEALED);
    let child = f.class(file, SymbolRef::ROOT, "Child");

    let mut t = f.tree(file);
    let sealed_ref = t.uconst(&f.gs, "Sealed");
    let child_def = t.class_def(child, ClassKind::Class, vec![sealed_ref], vec![]);
    let tree = t.finish(vec![child_def]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(f.gs.symbol(sealed).sealed_subclasses, vec![child]);
}

#[test]
fn test_type_alias_resolves_to_class_type() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let foo = f.class(file, SymbolRef::ROOT, "Foo");
    let a = f.type_alias_field(file, SymbolRef::ROOT, "A");

    let mut t = f.tree(file);
    let a_lhs = t.uconst(&f.gs, "A");
    let foo_use = t.uconst(&f.gs, "Foo");
    let a_rhs = t.type_alias_of(&f.gs, foo_use);
    let a_asgn = t.assign(a_lhs, a_rhs);
    let tree = t.finish(vec![a_asgn]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(
        f.gs.symbol(a).result_type,
        Some(Type::ClassInstance(foo))
    );
}

#[test]
fn test_nullary_type_alias_repairs_to_untyped() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let a = f.type_alias_field(file, SymbolRef::ROOT, "A");

    let mut t = f.tree(file);
    let a_lhs = t.uconst(&f.gs, "A");
    let t_ref = t.t_const(&f.gs);
    let a_rhs = t.send(t_ref, &f.gs, "type_alias", vec![]);
    let a_asgn = t.assign(a_lhs, a_rhs);
    let tree = t.finish(vec![a_asgn]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert_eq!(codes(&result.diagnostics), vec![ErrorCode::InvalidTypeAlias]);
    assert!(Types::is_untyped(f.gs.symbol(a).result_type.as_ref().unwrap()));
}

#[test]
fn test_stub_errors_prefer_strict_files() {
    // The same missing constant is referenced from a lax and a strict
    // file; the report must come from the strict file, where it is not
    // suppressed.
    let mut f = Fixture::new();
    let lax = f.file("lax.rue", StrictLevel::False);
    let strict = f.file("strict.rue", StrictLevel::Strict);
    f.static_field(lax, SymbolRef::ROOT, "X");
    f.static_field(strict, SymbolRef::ROOT, "Y");

    let mut tl = f.tree(lax);
    let lhs = tl.uconst(&f.gs, "X");
    let rhs = tl.uconst(&f.gs, "Missing");
    let asgn = tl.assign(lhs, rhs);
    let tree_lax = tl.finish(vec![asgn]);

    let mut ts = f.tree(strict);
    let lhs = ts.uconst(&f.gs, "Y");
    let rhs = ts.uconst(&f.gs, "Missing");
    let asgn = ts.assign(lhs, rhs);
    let tree_strict = ts.finish(vec![asgn]);

    let result = rue_resolver::run(&mut f.gs, vec![tree_lax, tree_strict], 0);
    let stub_diags: Vec<&Diagnostic> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == ErrorCode::StubConstant)
        .collect();
    assert_eq!(stub_diags.len(), 1, "{:?}", result.diagnostics);
    assert_eq!(stub_diags[0].loc.file, strict);
}

#[test]
fn test_diagnostics_stable_under_tree_permutation() {
    fn build(flip: bool) -> Vec<Diagnostic> {
        let mut f = Fixture::new();
        let file_a = f.file("a.rue", StrictLevel::True);
        let file_b = f.file("b.rue", StrictLevel::True);
        let c = f.class(file_a, SymbolRef::ROOT, "C");
        f.static_field(file_b, SymbolRef::ROOT, "X");

        let mut ta = f.tree(file_a);
        let missing = ta.uconst(&f.gs, "MissingA");
        let cdef = ta.class_def(c, ClassKind::Class, vec![missing], vec![]);
        let tree_a = ta.finish(vec![cdef]);

        let mut tb = f.tree(file_b);
        let lhs = tb.uconst(&f.gs, "X");
        let rhs = tb.uconst(&f.gs, "MissingB");
        let asgn = tb.assign(lhs, rhs);
        let tree_b = tb.finish(vec![asgn]);

        let trees = if flip {
            vec![tree_b, tree_a]
        } else {
            vec![tree_a, tree_b]
        };
        rue_resolver::run(&mut f.gs, trees, 0).diagnostics
    }

    let forward = build(false);
    let flipped = build(true);
    assert_eq!(forward, flipped);
}

#[test]
fn test_dealias_is_idempotent_after_resolution() {
    let mut f = Fixture::new();
    let file = f.file("a.rue", StrictLevel::True);
    let target = f.class(file, SymbolRef::ROOT, "Target");
    f.static_field(file, SymbolRef::ROOT, "Alias1");
    f.static_field(file, SymbolRef::ROOT, "Alias2");

    let mut t = f.tree(file);
    let a1_lhs = t.uconst(&f.gs, "Alias1");
    let target_use = t.uconst(&f.gs, "Target");
    let a1 = t.assign(a1_lhs, target_use);
    let a2_lhs = t.uconst(&f.gs, "Alias2");
    let a1_use = t.uconst(&f.gs, "Alias1");
    let a2 = t.assign(a2_lhs, a1_use);
    let tree = t.finish(vec![a1, a2]);

    let result = rue_resolver::run(&mut f.gs, vec![tree], 0);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    for sym in f.gs.symbol_refs().collect::<Vec<_>>() {
        assert_eq!(f.gs.dealias(f.gs.dealias(sym)), f.gs.dealias(sym));
    }
    let alias2 = f.gs.find_member(SymbolRef::ROOT, f.name("Alias2"));
    assert_eq!(f.gs.dealias(alias2), target);
}
