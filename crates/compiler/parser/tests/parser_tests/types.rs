use angelscript_parser::ast::{PrimitiveType, TopLevelItem, TypeName};

use crate::assert_parses_ok;

fn first_var_type(source: &str) -> angelscript_parser::ast::TypeExpr {
    let module = assert_parses_ok!(source);
    match &module.items[0] {
        TopLevelItem::Variable(decl) => decl.value().type_expr.value().clone(),
        other => panic!("expected variable, got {other:?}"),
    }
}

#[test]
fn primitive_type_names() {
    let ty = first_var_type("int64 big;");
    assert_eq!(*ty.name.value(), TypeName::Primitive(PrimitiveType::Int64));
}

#[test]
fn int32_spells_int() {
    let ty = first_var_type("int32 n;");
    assert_eq!(*ty.name.value(), TypeName::Primitive(PrimitiveType::Int));
}

#[test]
fn const_prefix() {
    let ty = first_var_type("const double d = 1.0;");
    assert!(ty.is_const);
}

#[test]
fn handle_suffix() {
    let ty = first_var_type("Widget@ w;");
    assert!(ty.is_handle);
}

#[test]
fn array_suffix() {
    let ty = first_var_type("int[] xs;");
    assert_eq!(ty.array_dims, 1);
}

#[test]
fn multi_dimensional_array() {
    let ty = first_var_type("float[][] grid;");
    assert_eq!(ty.array_dims, 2);
}

#[test]
fn template_arguments() {
    let ty = first_var_type("dictionary<string, int> map;");
    assert_eq!(ty.template_args.len(), 2);
}

#[test]
fn nested_template_arguments() {
    let ty = first_var_type("array<array<int>> grid;");
    assert_eq!(ty.template_args.len(), 1);
    assert_eq!(ty.template_args[0].value().template_args.len(), 1);
}

#[test]
fn scoped_type() {
    let ty = first_var_type("Game::World::Entity e;");
    let scope = ty.scope.expect("scope prefix");
    assert!(!scope.is_global);
    assert_eq!(scope.segments.len(), 2);
}

#[test]
fn globally_scoped_type() {
    let ty = first_var_type("::Entity e;");
    assert!(ty.scope.expect("scope prefix").is_global);
}

#[test]
fn template_with_handle_and_array() {
    let ty = first_var_type("array<Entity@>[] pools;");
    assert_eq!(ty.array_dims, 1);
    assert!(ty.template_args[0].value().is_handle);
}
