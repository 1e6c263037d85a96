//! # References and Complement Hints
//!
//! Every successful name resolution records a [`ReferenceEntry`]; they back
//! goto-definition, find-references, rename and document highlights. The
//! analyzer additionally drops [`ComplementHint`]s at points of interest —
//! the per-file seeds for completion, signature help, inlay hints and
//! folding ranges.

use std::sync::Arc;

use angelscript_parser::ast::Span;

use crate::scope::ScopePath;
use crate::symbol::{FunctionHolder, TypeKind};
use crate::types::{ResolvedType, TemplateTranslator};

/// The kind of symbol a reference points at, kept coarse for semantic
/// token mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencedKind {
    Class,
    Interface,
    Enum,
    Typedef,
    TemplateParameter,
    Primitive,
    Namespace,
    Variable,
    Function,
}

impl ReferencedKind {
    pub const fn from_type_kind(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Primitive(_) => Self::Primitive,
            TypeKind::Enum => Self::Enum,
            TypeKind::Class => Self::Class,
            TypeKind::Interface => Self::Interface,
            TypeKind::Typedef(_) => Self::Typedef,
            TypeKind::TemplateParameter => Self::TemplateParameter,
        }
    }
}

/// A weak handle to a declared symbol: the owning file plus the declaring
/// scope path, never a pointer into the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolLocation {
    pub uri: Arc<str>,
    pub scope: ScopePath,
    pub name: String,
    pub name_span: Span,
    pub kind: ReferencedKind,
}

impl SymbolLocation {
    /// Whether two locations address the same declaration.
    pub fn same_symbol(&self, other: &Self) -> bool {
        self.uri == other.uri
            && self.scope == other.scope
            && self.name == other.name
            && self.kind == other.kind
    }
}

/// `{from-token, to-symbol}`; recorded for every resolved name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub from_span: Span,
    pub target: SymbolLocation,
}

/// A point of interest seeding an editor feature.
#[derive(Debug, Clone, PartialEq)]
pub enum ComplementHint {
    /// Completion after a member-access dot.
    AutocompleteInstanceMember {
        caret_range: Span,
        target_type: ResolvedType,
    },
    /// Completion after a `::` scope access.
    AutocompleteNamespaceAccess {
        caret_range: Span,
        access_scope: ScopePath,
    },
    /// A resolved call site, carrying the full overload set for signature
    /// help.
    FunctionCall {
        caller_span: Span,
        /// Span of each argument expression, in order.
        arg_spans: Vec<Span>,
        /// Span of the parenthesized argument list.
        args_range: Span,
        callee: FunctionHolder,
        translator: Option<Arc<TemplateTranslator>>,
    },
    /// The type an `auto` declaration resolved to.
    AutoTypeResolution {
        auto_span: Span,
        resolved: ResolvedType,
    },
    /// A scope and the source range of its linked node, for folding and
    /// position-to-scope mapping.
    ScopeRegion { scope: ScopePath, range: Span },
}
