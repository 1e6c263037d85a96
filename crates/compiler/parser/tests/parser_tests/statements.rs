use crate::common::in_function;
use crate::{assert_parses_err, assert_parses_ok};

// ===================
// Declarations
// ===================

#[test]
fn local_declaration() {
    assert_parses_ok!(&in_function("int x = 1;"));
}

#[test]
fn multi_declarator() {
    assert_parses_ok!(&in_function("int a = 1, b, c = 3;"));
}

#[test]
fn auto_declaration() {
    assert_parses_ok!(&in_function("auto v = compute();"));
}

#[test]
fn handle_declaration() {
    assert_parses_ok!(&in_function("Widget@ w = @existing;"));
}

// ===================
// Control flow
// ===================

#[test]
fn if_else() {
    assert_parses_ok!(&in_function("if (a) { b(); } else if (c) { d(); } else { e(); }"));
}

#[test]
fn if_without_braces() {
    assert_parses_ok!(&in_function("if (a) b();"));
}

#[test]
fn while_loop() {
    assert_parses_ok!(&in_function("while (running) { step(); }"));
}

#[test]
fn do_while_loop() {
    assert_parses_ok!(&in_function("do { step(); } while (running);"));
}

#[test]
fn for_loop_full() {
    assert_parses_ok!(&in_function("for (int i = 0; i < 10; i++) { use(i); }"));
}

#[test]
fn for_loop_empty_clauses() {
    assert_parses_ok!(&in_function("for (;;) { break; }"));
}

#[test]
fn for_loop_multiple_increments() {
    assert_parses_ok!(&in_function("for (int i = 0; i < 10; i++, j--) {}"));
}

#[test]
fn switch_with_cases_and_default() {
    assert_parses_ok!(&in_function(
        "switch (mode) { case 0: a(); break; case 1: b(); break; default: c(); }"
    ));
}

#[test]
fn break_and_continue() {
    assert_parses_ok!(&in_function("while (true) { if (a) break; continue; }"));
}

#[test]
fn return_with_and_without_value() {
    assert_parses_ok!("int f() { return 1; }\nvoid g() { return; }");
}

#[test]
fn nested_blocks() {
    assert_parses_ok!(&in_function("{ { int x; } { int y; } }"));
}

// ===================
// Errors
// ===================

#[test]
fn missing_semicolon() {
    assert_parses_err!(&in_function("int x = 1"));
}

#[test]
fn unclosed_block() {
    assert_parses_err!("void f() { if (a) {");
}
