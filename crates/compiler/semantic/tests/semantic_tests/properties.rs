//! Property accessor synthesis and virtual properties.

use angelscript_diagnostics::DiagnosticCode;
use angelscript_semantic::{AnalyzerSettings, SymbolHolder};

use crate::common::{analyze, analyze_with, assert_has_code, assert_no_errors, has_symbol, symbol_at};

fn implicit_accessors() -> AnalyzerSettings {
    let mut settings = AnalyzerSettings::default();
    settings.explicit_property_accessor = false;
    settings
}

#[test]
fn test_accessor_pair_synthesizes_property() {
    let output = analyze_with(
        "class P {
            int get_v() { return 1; }
            void set_v(int value) {}
         }
         void main() { P p; p.v = 3; int r = p.v; }",
        implicit_accessors(),
    );
    assert_no_errors(&output);

    let holder = symbol_at(&output, &["P"], "v");
    match holder {
        SymbolHolder::Variable(variable) => {
            assert!(variable.is_instance_member);
            assert_eq!(variable.ty.display(), "int");
        }
        other => panic!("expected variable, got {other:?}"),
    }
}

#[test]
fn test_getter_only_property() {
    let output = analyze_with(
        "class P { float get_ratio() { return 0.5f; } }
         void main() { P p; float r = p.ratio; }",
        implicit_accessors(),
    );
    assert_no_errors(&output);
}

#[test]
fn test_setter_only_property_takes_parameter_type() {
    let output = analyze_with(
        "class P { void set_level(int value) {} }
         void main() { P p; p.level = 4; }",
        implicit_accessors(),
    );
    assert_no_errors(&output);
    let holder = symbol_at(&output, &["P"], "level");
    match holder {
        SymbolHolder::Variable(variable) => assert_eq!(variable.ty.display(), "int"),
        other => panic!("expected variable, got {other:?}"),
    }
}

#[test]
fn test_explicit_mode_requires_property_attribute() {
    // default settings: a bare get_ function is just a function
    let output = analyze(
        "class P { int get_v() { return 1; } }
         void main() { P p; int r = p.v; }",
    );
    assert_has_code(&output, DiagnosticCode::UnresolvedName);
}

#[test]
fn test_property_attribute_synthesizes_in_explicit_mode() {
    let output = analyze(
        "class P { int get_v() property { return 1; } }
         void main() { P p; int r = p.v; }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_property_attribute_without_prefix_is_diagnosed() {
    let output = analyze("class P { int weird() property { return 1; } }");
    assert_has_code(&output, DiagnosticCode::PropertyContract);
}

#[test]
fn test_global_accessor_synthesizes_global_property() {
    let output = analyze_with(
        "int get_score() { return 10; }
         void main() { int s = score; }",
        implicit_accessors(),
    );
    assert_no_errors(&output);
    assert!(has_symbol(&output, &[], "score"));
}

#[test]
fn test_virtual_property_declares_variable_and_scopes() {
    let output = analyze(
        "class C {
            int value {
                get const { return 1; }
                set { }
            }
         }
         void main() { C c; c.value = 2; int v = c.value; }",
    );
    assert_no_errors(&output);

    assert!(has_symbol(&output, &["C"], "value"));
    // accessor scopes are named get_/set_ under the class scope
    let class_scope = output
        .global
        .resolve_scope(&angelscript_semantic::ScopePath::from_segments(vec![
            "C".to_string()
        ]))
        .unwrap();
    assert!(class_scope.children.contains_key("get_value"));
    assert!(class_scope.children.contains_key("set_value"));
}

#[test]
fn test_virtual_property_setter_binds_value() {
    let output = analyze(
        "class C {
            private int stored;
            int value {
                get { return stored; }
                set { stored = value; }
            }
         }",
    );
    assert_no_errors(&output);
    assert!(has_symbol(&output, &["C", "set_value"], "value"));
}

#[test]
fn test_virtual_property_getter_checks_return_type() {
    let output = analyze(
        "class K {}
         class C {
            int value { get { K k; return k; } }
         }",
    );
    assert_has_code(&output, DiagnosticCode::TypeMismatch);
}

#[test]
fn test_global_virtual_property() {
    let output = analyze(
        "int tally { get { return 5; } }
         void main() { int t = tally; }",
    );
    assert_no_errors(&output);
}
