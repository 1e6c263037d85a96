//! Shared helpers for the parser test suite.

/// Wrap a statement snippet in a function so it parses as a body.
pub fn in_function(body: &str) -> String {
    format!("void test_fn() {{ {body} }}")
}
