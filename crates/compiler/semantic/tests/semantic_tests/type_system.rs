//! Auto resolution, templates, arrays, typedefs, funcdefs and operators.

use angelscript_diagnostics::DiagnosticCode;
use angelscript_semantic::{ComplementHint, SymbolHolder};

use crate::common::{analyze, assert_has_code, assert_no_errors, symbol_at};

#[test]
fn test_auto_local_resolves_from_initializer() {
    let output = analyze("void main() { auto x = 1; int y = x; }");
    assert_no_errors(&output);

    let hint = output
        .global
        .hints
        .iter()
        .find_map(|hint| match hint {
            ComplementHint::AutoTypeResolution { resolved, .. } => Some(resolved),
            _ => None,
        })
        .expect("auto type hint");
    assert_eq!(hint.display(), "int");
}

#[test]
fn test_auto_global_patches_symbol() {
    let output = analyze("class C {}\nauto instance = C();");
    assert_no_errors(&output);
    let holder = symbol_at(&output, &[], "instance");
    match holder {
        SymbolHolder::Variable(variable) => assert_eq!(variable.ty.display(), "C"),
        other => panic!("expected variable, got {other:?}"),
    }
}

#[test]
fn test_typedef_aliases_primitive() {
    let output = analyze("typedef double real64;\nreal64 x = 1.5;");
    assert_no_errors(&output);
}

#[test]
fn test_typedef_of_unknown_primitive() {
    let output = analyze("typedef exotic weird;");
    assert_has_code(&output, DiagnosticCode::UnresolvedName);
}

#[test]
fn test_template_class_binds_arguments() {
    let output = analyze(
        "class Box<T> {
            T content;
            T take() { return content; }
         }
         void main() { Box<int> b; int v = b.take(); int w = b.content; }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_template_argument_count_mismatch() {
    let output = analyze("class Box<T> {}\nvoid main() { Box<int, float> b; }");
    assert_has_code(&output, DiagnosticCode::TypeMismatch);
}

#[test]
fn test_array_suffix_maps_to_array_type() {
    let output = analyze(
        "class array<T> {
            T opIndex(int index) { return value; }
            T value;
            int length() { return 0; }
         }
         void main() { int[] xs; int first = xs[0]; int n = xs.length(); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_numeric_promotion() {
    let output = analyze("void main() { float f = 1.5f; double d = f + 1; }");
    assert_no_errors(&output);
}

#[test]
fn test_assignment_type_mismatch() {
    let output = analyze("class C {}\nvoid main() { int x; C c; x = c; }");
    assert_has_code(&output, DiagnosticCode::TypeMismatch);
}

#[test]
fn test_condition_must_be_boolean() {
    let output = analyze("class C {}\nvoid main() { C c; if (c) {} }");
    assert_has_code(&output, DiagnosticCode::TypeMismatch);
}

#[test]
fn test_operator_overload_resolves() {
    let output = analyze(
        "class Vec {
            Vec opAdd(Vec other) { return other; }
            bool opEquals(Vec other) { return true; }
         }
         void main() {
            Vec a, b;
            Vec sum = a + b;
            bool same = a == b;
         }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_reversed_operator_overload() {
    let output = analyze(
        "class Scaled {
            Scaled opMul_r(int factor) { return this; }
         }
         void main() { Scaled s; Scaled t = 2 * s; }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_missing_operator_is_diagnosed() {
    let output = analyze(
        "class Plain {}
         void main() { Plain a, b; a + b; }",
    );
    assert_has_code(&output, DiagnosticCode::TypeMismatch);
}

#[test]
fn test_compound_assignment_operator() {
    let output = analyze(
        "class Acc {
            Acc opAddAssign(int amount) { return this; }
         }
         void main() { Acc a; a += 5; }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_index_operator() {
    let output = analyze(
        "class Table {
            float opIndex(int key) { return 0.0f; }
         }
         void main() { Table t; float v = t[3]; }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_opcall_makes_object_callable() {
    let output = analyze(
        "class Functor {
            int opCall(int v) { return v; }
         }
         void main() { Functor f; int r = f(7); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_enum_converts_to_int() {
    let output = analyze("enum E { A }\nvoid main() { int v = E::A; }");
    assert_no_errors(&output);
}

#[test]
fn test_cast_expression_takes_target_type() {
    let output = analyze(
        "class Base {}
         class Derived : Base {}
         void main() { Base b; Derived d = cast<Derived>(b); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_handle_assignment() {
    let output = analyze(
        "class Node {}
         void main() { Node n; Node@ h = @n; }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_string_literal_uses_configured_type() {
    let output = analyze(
        "class string {}
         void main() { string s = \"hello\"; }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_ternary_merges_branch_types() {
    let output = analyze("void main() { bool c = true; double x = c ? 1.5 : 2; }");
    assert_no_errors(&output);
}

#[test]
fn test_member_access_emits_completion_hint() {
    let output = analyze(
        "class C { int field; }
         void main() { C c; int x = c.field; }",
    );
    assert_no_errors(&output);
    let target = output
        .global
        .hints
        .iter()
        .find_map(|hint| match hint {
            ComplementHint::AutocompleteInstanceMember { target_type, .. } => Some(target_type),
            _ => None,
        })
        .expect("instance member hint");
    assert_eq!(target.display(), "C");
}

#[test]
fn test_switch_on_enum() {
    let output = analyze(
        "enum Mode { Off, On }
         void main(Mode m) {
            switch (m) {
                case Mode::Off: break;
                default: break;
            }
         }",
    );
    assert_no_errors(&output);
}
