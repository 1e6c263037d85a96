use crate::common::in_function;
use crate::{assert_parses_err, assert_parses_ok};

// ===================
// Literals
// ===================

#[test]
fn integer_literal() {
    assert_parses_ok!(&in_function("x = 42;"));
}

#[test]
fn radix_literals() {
    assert_parses_ok!(&in_function("x = 0xFF + 0b101 + 0o17;"));
}

#[test]
fn float_literals() {
    assert_parses_ok!(&in_function("x = 1.5 + 2.0f + 3e10;"));
}

#[test]
fn string_literals() {
    assert_parses_ok!(&in_function("s = \"double\" + 'single';"));
}

#[test]
fn bool_and_null_literals() {
    assert_parses_ok!(&in_function("x = true; y = false; z = null;"));
}

// ===================
// Operators
// ===================

#[test]
fn arithmetic_precedence() {
    assert_parses_ok!(&in_function("x = 1 + 2 * 3 - 4 / 5 % 6;"));
}

#[test]
fn power_operator() {
    assert_parses_ok!(&in_function("x = 2 ** 10;"));
}

#[test]
fn comparison_chain() {
    assert_parses_ok!(&in_function("b = a < c && c <= d || e >= f && g != h;"));
}

#[test]
fn identity_operators() {
    assert_parses_ok!(&in_function("b = a is null; c = a !is null;"));
}

#[test]
fn bitwise_operators() {
    assert_parses_ok!(&in_function("x = a & b | c ^ d;"));
}

#[test]
fn shift_operators_from_split_tokens() {
    assert_parses_ok!(&in_function("x = a << 2; y = b >> 3; z = c >>> 4;"));
}

#[test]
fn shift_assignments() {
    assert_parses_ok!(&in_function("a <<= 1; b >>= 2; c >>>= 3;"));
}

#[test]
fn compound_assignments() {
    assert_parses_ok!(&in_function("a += 1; b -= 2; c *= 3; d /= 4; e %= 5; f **= 2;"));
}

#[test]
fn unary_operators() {
    assert_parses_ok!(&in_function("x = -a + +b; y = !c; z = ~d; ++e; --f;"));
}

#[test]
fn postfix_inc_dec() {
    assert_parses_ok!(&in_function("a++; b--;"));
}

#[test]
fn ternary_conditional() {
    assert_parses_ok!(&in_function("x = cond ? a : b;"));
}

#[test]
fn nested_ternary() {
    assert_parses_ok!(&in_function("x = a ? b : c ? d : e;"));
}

// ===================
// Postfix chains
// ===================

#[test]
fn call_member_index_chain() {
    assert_parses_ok!(&in_function("obj.method(1).field[2].other();"));
}

#[test]
fn named_arguments() {
    assert_parses_ok!(&in_function("f(count: 3, name: \"x\", 4);"));
}

#[test]
fn handle_of_expression() {
    assert_parses_ok!(&in_function("@handle = @object;"));
}

#[test]
fn cast_expression() {
    assert_parses_ok!(&in_function("d = cast<Derived>(b);"));
}

#[test]
fn scoped_identifiers() {
    assert_parses_ok!(&in_function("x = A::B::value + ::global_value;"));
}

// ===================
// Errors
// ===================

#[test]
fn unterminated_call() {
    assert_parses_err!(&in_function("f(1, 2;"));
}

#[test]
fn dangling_operator() {
    assert_parses_err!(&in_function("x = 1 + ;"));
}
