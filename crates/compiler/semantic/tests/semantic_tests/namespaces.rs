//! Nested namespaces, scoped access, and the enum/namespace scope overlap.

use angelscript_diagnostics::DiagnosticCode;
use angelscript_semantic::{ReferencedKind, SymbolHolder};

use crate::common::{analyze, analyze_with, assert_has_code, assert_no_errors, has_symbol};

#[test]
fn test_namespaced_enum_access() {
    // the enum `A` shares its scope name with the namespace `A`
    let output = analyze(
        "namespace A { namespace B { namespace C_0 { int c_0; } } }
         enum A { Red }
         void main() { A::B::C_0::c_0 = 1; int v = A::Red; }",
    );
    assert_no_errors(&output);

    // the scope access at `A::Red` resolves to the enum declaration
    assert!(output
        .global
        .references
        .iter()
        .any(|r| r.target.name == "A" && r.target.kind == ReferencedKind::Enum));
    // and the member reference lands on the declared member
    assert!(output
        .global
        .references
        .iter()
        .any(|r| r.target.name == "c_0" && r.target.kind == ReferencedKind::Variable));
}

#[test]
fn test_multi_segment_namespace_declaration() {
    let output = analyze("namespace A::B { int inner; }\nvoid f() { A::B::inner = 1; }");
    assert_no_errors(&output);
    assert!(has_symbol(&output, &["A", "B"], "inner"));
}

#[test]
fn test_namespace_reopening_merges() {
    let output = analyze(
        "namespace N { int first; }
         namespace N { int second; }
         void f() { N::first = N::second; }",
    );
    assert_no_errors(&output);
    assert!(has_symbol(&output, &["N"], "first"));
    assert!(has_symbol(&output, &["N"], "second"));
}

#[test]
fn test_unresolved_namespace_segment() {
    let output = analyze("void f() { Missing::x = 1; }");
    assert_has_code(&output, DiagnosticCode::UnresolvedName);
}

#[test]
fn test_scoped_lookup_stays_shallow() {
    // `N::outer` must not fall back to the enclosing scope
    let output = analyze("int outer;\nnamespace N { int inner; }\nvoid f() { N::outer = 1; }");
    assert_has_code(&output, DiagnosticCode::UnresolvedName);
}

#[test]
fn test_global_qualifier_reaches_root() {
    let output = analyze("int g;\nnamespace N { void f() { ::g = 1; } }");
    assert_no_errors(&output);
}

#[test]
fn test_namespace_symbols_visible_from_inside() {
    let output = analyze("namespace N { int shared_value; void f() { shared_value = 2; } }");
    assert_no_errors(&output);
}

#[test]
fn test_enum_members_stay_out_of_parent_by_default() {
    let output = analyze("enum Color { Red, Green }");
    assert_no_errors(&output);
    assert!(has_symbol(&output, &["Color"], "Red"));
    assert!(!has_symbol(&output, &[], "Red"));
}

#[test]
fn test_hoist_enum_parent_scope_setting() {
    let mut settings = angelscript_semantic::AnalyzerSettings::default();
    settings.hoist_enum_parent_scope = true;
    let output = analyze_with("enum Color { Red }\nvoid f() { int x = Red; }", settings);
    assert_no_errors(&output);
    assert!(has_symbol(&output, &[], "Red"));
}

#[test]
fn test_hoist_enum_parent_scope_propagates_into_namespaces() {
    let mut settings = angelscript_semantic::AnalyzerSettings::default();
    settings.hoist_enum_parent_scope = true;
    let output = analyze_with(
        "namespace Outer { namespace Inner { enum E { V } void f() { int x = V; } } }",
        settings,
    );
    assert_no_errors(&output);
    assert!(has_symbol(&output, &["Outer", "Inner"], "V"));
}

#[test]
fn test_namespace_access_emits_completion_hint() {
    let output = analyze("namespace N { int inner; }\nvoid f() { N::inner = 1; }");
    assert_no_errors(&output);
    let access_scope = output
        .global
        .hints
        .iter()
        .find_map(|hint| match hint {
            angelscript_semantic::ComplementHint::AutocompleteNamespaceAccess {
                access_scope,
                ..
            } => Some(access_scope),
            _ => None,
        })
        .expect("namespace access hint");
    assert_eq!(access_scope.to_string(), "N");
}

#[test]
fn test_enum_type_symbol_has_members_scope() {
    let output = analyze("enum Color { Red }");
    let holder = crate::common::symbol_at(&output, &[], "Color");
    match holder {
        SymbolHolder::Type(symbol) => {
            let members = symbol.members_scope.as_ref().expect("members scope");
            assert!(output.global.resolve_scope(members).is_some());
        }
        other => panic!("expected type, got {other:?}"),
    }
}
