//! Declaration, duplicate detection and block scoping.

use angelscript_diagnostics::DiagnosticCode;
use angelscript_semantic::SymbolHolder;

use crate::common::{analyze, assert_has_code, assert_no_errors, has_symbol, symbol_at};

#[test]
fn test_global_variable_declares_symbol() {
    let output = analyze("int counter = 0;");
    assert_no_errors(&output);
    let holder = symbol_at(&output, &[], "counter");
    assert!(matches!(holder, SymbolHolder::Variable(_)));
}

#[test]
fn test_forward_reference_between_functions() {
    let output = analyze(
        "void first() { second(); }
         void second() { first(); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_forward_reference_to_class() {
    let output = analyze(
        "Later make() { return Later(); }
         class Later {}",
    );
    assert_no_errors(&output);
}

#[test]
fn test_duplicate_variable_is_diagnosed() {
    let output = analyze("int x; float x;");
    assert_has_code(&output, DiagnosticCode::DuplicateDeclaration);
}

#[test]
fn test_duplicate_parameter_is_diagnosed() {
    let output = analyze("void f(int a, float a) {}");
    assert_has_code(&output, DiagnosticCode::DuplicateDeclaration);
}

#[test]
fn test_function_and_variable_name_collision() {
    let output = analyze("int x; void x() {}");
    assert_has_code(&output, DiagnosticCode::DuplicateDeclaration);
}

#[test]
fn test_unresolved_name_is_diagnosed() {
    let output = analyze("void f() { missing = 1; }");
    assert_has_code(&output, DiagnosticCode::UnresolvedName);
}

#[test]
fn test_unresolved_type_is_diagnosed() {
    let output = analyze("Missing x;");
    assert_has_code(&output, DiagnosticCode::UnresolvedName);
}

#[test]
fn test_locals_are_visible_in_nested_blocks() {
    let output = analyze(
        "void f() {
            int outer = 1;
            { int inner = outer + 1; }
         }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_function_body_scope_is_two_level() {
    let output = analyze("void f(int a) {}");
    assert_no_errors(&output);

    // the holder scope is keyed by the function identifier and holds one
    // anonymous body scope per overload
    let holder_scope = output
        .global
        .resolve_scope(&angelscript_semantic::ScopePath::from_segments(vec![
            "f".to_string()
        ]))
        .expect("function holder scope");
    assert_eq!(holder_scope.children.len(), 1);
    let body = holder_scope.children.values().next().unwrap();
    assert!(body.lookup_symbol("a").is_some());
}

#[test]
fn test_overloads_share_one_holder_scope() {
    let output = analyze("void f() {}\nvoid f(int a) {}");
    assert_no_errors(&output);

    let holder = symbol_at(&output, &[], "f");
    match holder {
        SymbolHolder::Functions(h) => assert_eq!(h.overloads.len(), 2),
        other => panic!("expected functions, got {other:?}"),
    }
    let holder_scope = output
        .global
        .resolve_scope(&angelscript_semantic::ScopePath::from_segments(vec![
            "f".to_string()
        ]))
        .unwrap();
    assert_eq!(holder_scope.children.len(), 2);
}

#[test]
fn test_references_cover_use_sites() {
    let output = analyze("int value; void f() { value = 2; }");
    assert_no_errors(&output);
    // declaration + use
    let refs: Vec<_> = output
        .global
        .references
        .iter()
        .filter(|r| r.target.name == "value")
        .collect();
    assert!(refs.len() >= 2);
    // every reference target resolves through its declaring path
    for reference in &output.global.references {
        if &*reference.target.uri == "test.as" {
            assert!(
                output.global.resolve_scope(&reference.target.scope).is_some(),
                "dangling declaring path {}",
                reference.target.scope
            );
        }
    }
}

#[test]
fn test_symbols_keep_declaration_order() {
    let output = analyze("int zeta; int alpha; int beta;");
    let names: Vec<_> = output.global.root.symbols.keys().cloned().collect();
    let declared: Vec<_> = names
        .iter()
        .filter(|n| ["zeta", "alpha", "beta"].contains(&n.as_str()))
        .cloned()
        .collect();
    assert_eq!(declared, vec!["zeta", "alpha", "beta"]);
}

#[test]
fn test_destructor_declares_no_symbol() {
    let output = analyze("class C { ~C() {} }");
    assert_no_errors(&output);
    assert!(!has_symbol(&output, &["C"], "~C"));
}

#[test]
fn test_include_scopes_provide_symbols() {
    use std::sync::Arc;

    use angelscript_semantic::AnalyzerSettings;

    use crate::common::analyze_file;

    let library = analyze_file(
        "lib.as",
        "class External { int field; }\nnamespace Ext { int shared_value; }",
        AnalyzerSettings::default(),
        Vec::new(),
    );
    let output = analyze_file(
        "main.as",
        "void main() { External e; int x = e.field; int y = Ext::shared_value; }",
        AnalyzerSettings::default(),
        vec![Arc::new(library.global)],
    );
    assert_no_errors(&output);

    // cross-file references carry the owning file's URI
    assert!(output
        .global
        .references
        .iter()
        .any(|r| &*r.target.uri == "lib.as" && r.target.name == "field"));
}
