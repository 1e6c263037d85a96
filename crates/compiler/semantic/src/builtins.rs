//! # Builtin Primitives
//!
//! Registers the builtin primitive type symbols into a fresh global scope so
//! plain name lookup finds them like any declared type. `int32`/`uint32`
//! get their own table entries aliasing `int`/`uint`.

use std::sync::Arc;

use angelscript_parser::ast::{PrimitiveType, Span, Spanned};

use crate::scope::{GlobalScope, ScopePath};
use crate::symbol::{Symbol, TypeKind, TypeSymbol};

const PRIMITIVES: &[(&str, PrimitiveType)] = &[
    ("void", PrimitiveType::Void),
    ("bool", PrimitiveType::Bool),
    ("int8", PrimitiveType::Int8),
    ("int16", PrimitiveType::Int16),
    ("int", PrimitiveType::Int),
    ("int32", PrimitiveType::Int),
    ("int64", PrimitiveType::Int64),
    ("uint8", PrimitiveType::UInt8),
    ("uint16", PrimitiveType::UInt16),
    ("uint", PrimitiveType::UInt),
    ("uint32", PrimitiveType::UInt),
    ("uint64", PrimitiveType::UInt64),
    ("float", PrimitiveType::Float),
    ("double", PrimitiveType::Double),
];

/// Build the type symbol for one primitive spelling.
pub fn primitive_symbol(name: &str, primitive: PrimitiveType, uri: &Arc<str>) -> TypeSymbol {
    TypeSymbol {
        name: Spanned::new(name.to_string(), Span::from(0..0)),
        defined_in: Arc::clone(uri),
        declared_scope: ScopePath::global(),
        members_scope: None,
        template_params: Vec::new(),
        bases: Vec::new(),
        kind: TypeKind::Primitive(primitive),
    }
}

/// Insert every primitive into the global root's symbol table.
pub fn register_builtins(global: &mut GlobalScope) {
    let uri = Arc::clone(global.uri());
    for (name, primitive) in PRIMITIVES {
        global
            .root
            .insert_symbol(Symbol::Type(primitive_symbol(name, *primitive, &uri)));
    }
}
