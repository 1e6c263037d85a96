//! Overload selection, named arguments and call diagnostics.

use angelscript_diagnostics::DiagnosticCode;
use angelscript_semantic::{ComplementHint, ReferencedKind};

use crate::common::{analyze, assert_has_code, assert_no_errors};

#[test]
fn test_exact_overload_beats_widening() {
    let output = analyze(
        "void f(int a) {}
         void f(float a) {}
         void main() { f(1); }",
    );
    assert_no_errors(&output);

    // the call reference lands on the chosen overload, and the hint
    // carries both signatures for signature help
    let call_hint = output
        .global
        .hints
        .iter()
        .find_map(|hint| match hint {
            ComplementHint::FunctionCall { callee, .. } => Some(callee),
            _ => None,
        })
        .expect("function call hint");
    assert_eq!(call_hint.overloads.len(), 2);

    let call_refs: Vec<_> = output
        .global
        .references
        .iter()
        .filter(|r| r.target.name == "f" && r.target.kind == ReferencedKind::Function)
        .collect();
    assert!(!call_refs.is_empty());
}

#[test]
fn test_widening_overload_is_usable() {
    let output = analyze(
        "void f(double a) {}
         void main() { f(1); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_no_matching_overload_dumps_candidates() {
    let output = analyze(
        "void f(int a) {}
         class C {}
         void main() { C c; f(c); }",
    );
    assert_has_code(&output, DiagnosticCode::NoMatchingOverload);
    let diagnostic = output
        .diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::NoMatchingOverload)
        .unwrap();
    assert!(diagnostic.message.contains("void f(int a)"));
}

#[test]
fn test_ambiguous_call_is_diagnosed() {
    // both overloads need exactly one widening conversion
    let output = analyze(
        "void f(float a) {}
         void f(double a) {}
         void main() { int i; f(i); }",
    );
    assert_has_code(&output, DiagnosticCode::AmbiguousCall);
}

#[test]
fn test_not_callable_variable() {
    let output = analyze("int x;\nvoid main() { x(); }");
    assert_has_code(&output, DiagnosticCode::NotCallable);
}

#[test]
fn test_default_arguments_fill_missing_parameters() {
    let output = analyze(
        "void f(int a, int b = 2) {}
         void main() { f(1); f(1, 3); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_named_arguments_bind_by_parameter_name() {
    let output = analyze(
        "void f(int first, float second = 0.5) {}
         void main() { f(1, second: 2.5); f(first: 3); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_unknown_named_argument_fails_resolution() {
    let output = analyze(
        "void f(int a) {}
         void main() { f(wrong: 1); }",
    );
    assert_has_code(&output, DiagnosticCode::NoMatchingOverload);
}

#[test]
fn test_duplicate_named_argument_is_diagnosed() {
    let output = analyze(
        "void f(int a, int b = 0) {}
         void main() { f(a: 1, a: 2); }",
    );
    assert_has_code(&output, DiagnosticCode::InvalidNamedArgument);
}

#[test]
fn test_return_type_flows_into_expressions() {
    let output = analyze(
        "int answer() { return 42; }
         void main() { int x = answer(); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_return_type_mismatch() {
    let output = analyze(
        "class C {}
         int broken() { C c; return c; }",
    );
    assert_has_code(&output, DiagnosticCode::TypeMismatch);
}

#[test]
fn test_return_value_from_void_function() {
    let output = analyze("void f() { return 1; }");
    assert_has_code(&output, DiagnosticCode::TypeMismatch);
}

#[test]
fn test_method_calls_resolve_on_instances() {
    let output = analyze(
        "class Greeter {
            int count() { return 1; }
         }
         void main() { Greeter g; int n = g.count(); }",
    );
    assert_no_errors(&output);
}

#[test]
fn test_call_hint_tracks_argument_spans() {
    let output = analyze("void f(int a, int b) {}\nvoid main() { f(10, 20); }");
    assert_no_errors(&output);
    let (arg_spans, args_range) = output
        .global
        .hints
        .iter()
        .find_map(|hint| match hint {
            ComplementHint::FunctionCall {
                arg_spans,
                args_range,
                ..
            } => Some((arg_spans.clone(), *args_range)),
            _ => None,
        })
        .expect("function call hint");
    assert_eq!(arg_spans.len(), 2);
    assert!(args_range.start <= arg_spans[0].start);
    assert!(arg_spans[1].end <= args_range.end);
}

#[test]
fn test_funcdef_variable_is_callable() {
    let output = analyze(
        "funcdef int Handler(int);
         int double_it(int v) { return v * 2; }
         void main() { Handler@ h = @double_it; int r = h(21); }",
    );
    assert_no_errors(&output);
}
