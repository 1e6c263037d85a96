//! # Semantic Analysis Tests
//!
//! Integration tests organized by concern:
//!
//! - `scoping` — declaration, duplicate detection, block scoping
//! - `namespaces` — nested namespaces, scoped access, enum/namespace overlap
//! - `functions` — overload selection, named arguments, call diagnostics
//! - `inheritance` — base member copying, private filtering, `super`
//! - `properties` — accessor synthesis and virtual properties
//! - `type_system` — auto, templates, arrays, typedefs, funcdefs, operators
//! - `idempotence` — re-running both passes yields an equal scope

#[path = "semantic_tests/common.rs"]
mod common;

#[path = "semantic_tests/functions.rs"]
mod functions;
#[path = "semantic_tests/idempotence.rs"]
mod idempotence;
#[path = "semantic_tests/inheritance.rs"]
mod inheritance;
#[path = "semantic_tests/namespaces.rs"]
mod namespaces;
#[path = "semantic_tests/properties.rs"]
mod properties;
#[path = "semantic_tests/scoping.rs"]
mod scoping;
#[path = "semantic_tests/type_system.rs"]
mod type_system;
