//! # AngelScript Semantic Analysis
//!
//! Two-phase semantic analysis of parsed AngelScript modules:
//!
//! 1. **Hoist** declares every named entity (types, functions, variables,
//!    namespaces) before any body is analyzed, so forward references and
//!    mutual recursion resolve. Remaining declaration work (base lists,
//!    member copies, parameter lists) drains from a FIFO queue before the
//!    second pass starts.
//! 2. **Analyze** resolves statements and expressions against the finished
//!    scope tree, selecting overloads, enforcing access rules and emitting
//!    diagnostics plus the complement hints that seed completion, signature
//!    help, inlay hints and folding.
//!
//! The result of [`analyze_module`] is a [`GlobalScope`]: the file's scope
//! tree with its reference list and hint list, safe to share immutably as
//! an include scope for dependent files.

mod analyzer;
mod builtins;
mod context;
mod hoist;
mod overloads;
mod type_resolution;

pub mod hints;
pub mod scope;
pub mod settings;
pub mod symbol;
pub mod types;

pub use context::{analyze_module, AnalysisContext, AnalysisOutput};
pub use hints::{ComplementHint, ReferenceEntry, ReferencedKind, SymbolLocation};
pub use scope::{GlobalScope, ScopeLinkedNode, ScopePath, SymbolScope};
pub use settings::{AnalyzerSettings, FormatterSettings};
pub use symbol::{
    FunctionHolder, FunctionSymbol, ParamInfo, Symbol, SymbolHolder, TypeKind, TypeSymbol,
    VariableSymbol,
};
pub use types::{ResolvedType, TemplateTranslator, TypeModifiers, TypeSource};
