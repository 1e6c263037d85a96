use angelscript_parser::ast::{ClassMember, TopLevelItem};

use crate::{assert_parses_err, assert_parses_ok};

// ===================
// Functions
// ===================

#[test]
fn function_with_defaults_and_modifiers() {
    assert_parses_ok!("void f(int a, float b = 1.5, const string &in name = \"x\") {}");
}

#[test]
fn function_declaration_without_body() {
    assert_parses_ok!("int externalFn(int value);");
}

#[test]
fn function_attributes() {
    assert_parses_ok!("class C { int get_v() property { return 1; } void act() override final {} }");
}

// ===================
// Classes
// ===================

#[test]
fn class_with_everything() {
    let module = assert_parses_ok!(
        "class Entity : Base, IThing {
            private int id;
            protected float weight;
            Entity() {}
            Entity(int id_) {}
            ~Entity() {}
            void update(float dt) const {}
            int health { get const { return 1; } set { } }
            funcdef void Callback();
         }"
    );
    match &module.items[0] {
        TopLevelItem::Class(class) => {
            assert_eq!(class.value().bases.len(), 2);
            assert_eq!(class.value().members.len(), 8);
            assert!(matches!(class.value().members[0], ClassMember::Variable(_)));
        }
        other => panic!("expected class, got {other:?}"),
    }
}

#[test]
fn mixin_class() {
    let module = assert_parses_ok!("mixin class Behavior { void act() {} }");
    match &module.items[0] {
        TopLevelItem::Class(class) => assert!(class.value().is_mixin),
        other => panic!("expected class, got {other:?}"),
    }
}

#[test]
fn shared_abstract_class_words() {
    assert_parses_ok!("shared abstract class A {}\nclass B final {}");
}

#[test]
fn template_class() {
    let module = assert_parses_ok!("class Box<T, U> { T first; U second; }");
    match &module.items[0] {
        TopLevelItem::Class(class) => assert_eq!(class.value().template_params.len(), 2),
        other => panic!("expected class, got {other:?}"),
    }
}

// ===================
// Interfaces, enums, aliases
// ===================

#[test]
fn interface_with_members() {
    assert_parses_ok!(
        "interface Serializable {
            void save();
            int version { get; }
         }"
    );
}

#[test]
fn enum_with_values() {
    assert_parses_ok!("enum Flags { None = 0, A = 1, B = 2, All = A | B }");
}

#[test]
fn typedef_and_funcdef() {
    assert_parses_ok!("typedef float real32;\nfuncdef bool Predicate(int value);");
}

// ===================
// Namespaces and globals
// ===================

#[test]
fn nested_namespace_items() {
    let module = assert_parses_ok!("namespace Outer::Inner { int depth; void f() {} }");
    match &module.items[0] {
        TopLevelItem::Namespace(ns) => {
            assert_eq!(ns.value().segments.len(), 2);
            assert_eq!(ns.value().items.len(), 2);
        }
        other => panic!("expected namespace, got {other:?}"),
    }
}

#[test]
fn global_variables_and_properties() {
    assert_parses_ok!("int counter = 0;\nfloat ratio { get { return 0.5f; } }");
}

#[test]
fn stray_semicolons_are_tolerated() {
    assert_parses_ok!(";;class A {};;");
}

// ===================
// Errors
// ===================

#[test]
fn class_without_name() {
    assert_parses_err!("class {}");
}

#[test]
fn enum_missing_brace() {
    assert_parses_err!("enum E { A, B");
}
