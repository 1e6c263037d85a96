//! Base member copying, private filtering and `super` injection.

use angelscript_diagnostics::DiagnosticCode;
use angelscript_semantic::SymbolHolder;

use crate::common::{analyze, assert_has_code, assert_no_errors, has_symbol, symbol_at};

#[test]
fn test_base_members_are_copied() {
    let output = analyze(
        "class Base { int shared_field; void shared_method() {} }
         class Derived : Base {}",
    );
    assert_no_errors(&output);
    assert!(has_symbol(&output, &["Derived"], "shared_field"));
    assert!(has_symbol(&output, &["Derived"], "shared_method"));
}

#[test]
fn test_private_members_do_not_leak() {
    let output = analyze(
        "class B { private int x; int y; }
         class C : B {}",
    );
    assert_no_errors(&output);
    assert!(has_symbol(&output, &["C"], "y"));
    assert!(!has_symbol(&output, &["C"], "x"));

    // the base's `this` never crosses over; the derived class binds its own
    let this = symbol_at(&output, &["C"], "this");
    match this {
        SymbolHolder::Variable(variable) => {
            let symbol = variable.ty.type_symbol().expect("this is typed");
            assert_eq!(symbol.name.value(), "C");
        }
        other => panic!("expected variable, got {other:?}"),
    }
}

#[test]
fn test_instance_members_visible_through_base() {
    let output = analyze(
        "class Base { int value; }
         class Derived : Base {
            int read() { return value; }
         }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_forward_referenced_base_resolves() {
    let output = analyze(
        "class Derived : Base {}
         class Base { int field; }",
    );
    assert_no_errors(&output);
    assert!(has_symbol(&output, &["Derived"], "field"));
}

#[test]
fn test_override_does_not_create_ambiguity() {
    let output = analyze(
        "class Base { void act() {} }
         class Derived : Base { void act() {} }
         void main() { Derived d; d.act(); }",
    );
    assert_no_errors(&output);
    // the identical-signature base overload was skipped, not duplicated
    let holder = symbol_at(&output, &["Derived"], "act");
    match holder {
        SymbolHolder::Functions(h) => assert_eq!(h.overloads.len(), 1),
        other => panic!("expected functions, got {other:?}"),
    }
}

#[test]
fn test_base_overloads_merge_into_derived() {
    let output = analyze(
        "class Base { void act(int a) {} }
         class Derived : Base { void act() {} }
         void main() { Derived d; d.act(); d.act(1); }",
    );
    assert_no_errors(&output);
    let holder = symbol_at(&output, &["Derived"], "act");
    match holder {
        SymbolHolder::Functions(h) => assert_eq!(h.overloads.len(), 2),
        other => panic!("expected functions, got {other:?}"),
    }
}

#[test]
fn test_field_collision_with_base_is_diagnosed() {
    let output = analyze(
        "class Base { int field; }
         class Derived : Base { int field; }",
    );
    assert_has_code(&output, DiagnosticCode::DuplicateDeclaration);
}

#[test]
fn test_super_is_injected_from_first_base() {
    let output = analyze(
        "class Base { Base(int seed) {} }
         class Derived : Base {
            Derived() { super(1); }
         }",
    );
    assert_no_errors(&output);
    assert!(has_symbol(&output, &["Derived"], "super"));
}

#[test]
fn test_super_clones_every_constructor() {
    let output = analyze(
        "class Base { Base() {} Base(int seed) {} }
         class Derived : Base {
            Derived() { super(); super(42); }
         }",
    );
    assert_no_errors(&output);
    let holder = symbol_at(&output, &["Derived"], "super");
    match holder {
        SymbolHolder::Functions(h) => assert_eq!(h.overloads.len(), 2),
        other => panic!("expected functions, got {other:?}"),
    }
}

#[test]
fn test_derived_converts_to_base_in_calls() {
    let output = analyze(
        "class Base {}
         class Derived : Base {}
         void take(Base b) {}
         void main() { Derived d; take(d); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_unresolved_base_is_diagnosed() {
    let output = analyze("class C : Missing {}");
    assert_has_code(&output, DiagnosticCode::UnresolvedName);
}

#[test]
fn test_variable_as_base_is_diagnosed() {
    let output = analyze("int notatype;\nclass C : notatype {}");
    assert_has_code(&output, DiagnosticCode::TypeMismatch);
}

#[test]
fn test_interface_implementation() {
    let output = analyze(
        "interface Readable { int read(); }
         class File : Readable { int read() { return 0; } }
         void main() { File f; int n = f.read(); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_private_member_access_from_outside() {
    let output = analyze(
        "class C { private int hidden; }
         void main() { C c; int x = c.hidden; }",
    );
    assert_has_code(&output, DiagnosticCode::AccessViolation);
}

#[test]
fn test_private_member_access_from_inside() {
    let output = analyze(
        "class C {
            private int hidden;
            int read() { return hidden; }
         }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_protected_member_access_from_derived() {
    let output = analyze(
        "class Base { protected int guarded; }
         class Derived : Base {
            int read() { return guarded; }
         }",
    );
    assert_no_errors(&output);
}
