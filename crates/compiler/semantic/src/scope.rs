//! # Scopes
//!
//! The scope tree of one analyzed file. The global scope owns the whole
//! tree; every cross-cutting reference (a symbol's declaring scope, a
//! function's body scope, a reference target) is a [`ScopePath`] resolved
//! against the root, never a pointer, so the tree stays cycle-free.
//!
//! Symbol and child-scope tables preserve insertion order so completion
//! lists are stable across runs.

use std::fmt;
use std::sync::Arc;

use angelscript_diagnostics::{Diagnostic, DiagnosticCollection};
use angelscript_parser::ast::{
    ClassDef, EnumDef, FunctionDef, InterfaceDef, NamespaceDef, Span, Spanned,
};
use indexmap::IndexMap;

use crate::hints::{ComplementHint, ReferenceEntry};
use crate::symbol::{Symbol, SymbolHolder};

/// Ordered identifier segments from the global root to a scope. Paths are
/// the canonical, stable identity of a scope; the root itself is keyed by
/// the file URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ScopePath {
    segments: Vec<String>,
}

impl ScopePath {
    /// The path of the global root.
    pub const fn global() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_global(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path extended by one segment.
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// The enclosing scope's path, `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Whether `self` is `prefix` or lies beneath it.
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "<global>")
        } else {
            write!(f, "{}", self.segments.join("::"))
        }
    }
}

/// The AST node a scope was created for, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeLinkedNode {
    Class(Arc<Spanned<ClassDef>>),
    Interface(Arc<Spanned<InterfaceDef>>),
    Enum(Arc<Spanned<EnumDef>>),
    Namespace(Arc<Spanned<NamespaceDef>>),
    Function(Arc<Spanned<FunctionDef>>),
    /// An anonymous statement block.
    Block(Span),
}

impl ScopeLinkedNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Class(n) => n.span(),
            Self::Interface(n) => n.span(),
            Self::Enum(n) => n.span(),
            Self::Namespace(n) => n.span(),
            Self::Function(n) => n.span(),
            Self::Block(span) => *span,
        }
    }

    /// Node identity, not structural equality.
    pub fn same_node(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Class(a), Self::Class(b)) => Arc::ptr_eq(a, b),
            (Self::Interface(a), Self::Interface(b)) => Arc::ptr_eq(a, b),
            (Self::Enum(a), Self::Enum(b)) => Arc::ptr_eq(a, b),
            (Self::Namespace(a), Self::Namespace(b)) => Arc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            (Self::Block(a), Self::Block(b)) => a == b,
            _ => false,
        }
    }

    pub const fn is_namespace(&self) -> bool {
        matches!(self, Self::Namespace(_))
    }
}

/// One node of the scope tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolScope {
    pub path: ScopePath,
    pub linked_node: Option<ScopeLinkedNode>,
    /// identifier → symbol holder, insertion-ordered.
    pub symbols: IndexMap<String, SymbolHolder>,
    /// identifier → child scope, unique within this scope.
    pub children: IndexMap<String, SymbolScope>,
}

impl SymbolScope {
    pub fn new(path: ScopePath) -> Self {
        Self {
            path,
            linked_node: None,
            symbols: IndexMap::new(),
            children: IndexMap::new(),
        }
    }

    /// A scope that only namespaces live under: its linked node is absent
    /// or a namespace. Used to separate namespace completion from types.
    pub fn is_pure_namespace(&self) -> bool {
        self.linked_node
            .as_ref()
            .map_or(true, ScopeLinkedNode::is_namespace)
    }

    /// Find-or-create a child scope; a linked node is attached only if the
    /// scope did not already have one.
    pub fn insert_scope(
        &mut self,
        identifier: &str,
        linked_node: Option<ScopeLinkedNode>,
    ) -> &mut SymbolScope {
        let path = self.path.join(identifier);
        let child = self
            .children
            .entry(identifier.to_string())
            .or_insert_with(|| SymbolScope::new(path));
        if child.linked_node.is_none() {
            child.linked_node = linked_node;
        }
        child
    }

    /// As [`Self::insert_scope`], but emits a duplicate-declaration
    /// diagnostic when the existing scope is linked to a different node.
    pub fn insert_scope_and_check(
        &mut self,
        identifier: &Spanned<String>,
        linked_node: Option<ScopeLinkedNode>,
        file_path: &str,
        diagnostics: &mut DiagnosticCollection,
    ) -> &mut SymbolScope {
        if let Some(existing) = self.children.get(identifier.value()) {
            if let (Some(old), Some(new)) = (&existing.linked_node, &linked_node) {
                if !old.same_node(new) {
                    diagnostics.add(
                        Diagnostic::duplicate_declaration(
                            file_path.to_string(),
                            identifier.value(),
                            identifier.span(),
                        )
                        .with_related_span(old.span(), "previously declared here".to_string()),
                    );
                }
            }
        }
        self.insert_scope(identifier.value(), linked_node)
    }

    /// Shallow symbol lookup.
    pub fn lookup_symbol(&self, identifier: &str) -> Option<&SymbolHolder> {
        self.symbols.get(identifier)
    }

    /// Insert a symbol. Returns `None` on success (including appending an
    /// overload to an existing function holder); otherwise the colliding
    /// holder, which the caller may diagnose.
    pub fn insert_symbol(&mut self, symbol: Symbol) -> Option<&SymbolHolder> {
        use indexmap::map::Entry;

        match self.symbols.entry(symbol.name().to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(symbol.into());
                None
            }
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                match (existing, symbol) {
                    (SymbolHolder::Functions(holder), Symbol::Function(overload)) => {
                        holder.overloads.push(overload);
                        None
                    }
                    (existing, _) => Some(existing),
                }
            }
        }
    }

    /// As [`Self::insert_symbol`], emitting a duplicate-declaration
    /// diagnostic on collision. Returns whether the symbol was inserted.
    pub fn insert_symbol_and_check(
        &mut self,
        symbol: Symbol,
        file_path: &str,
        diagnostics: &mut DiagnosticCollection,
    ) -> bool {
        let name = symbol.name().to_string();
        let span = symbol.name_span();
        match self.insert_symbol(symbol) {
            None => true,
            Some(existing) => {
                diagnostics.add(
                    Diagnostic::duplicate_declaration(file_path.to_string(), &name, span)
                        .with_related_span(
                            existing.name_span(),
                            "previously declared here".to_string(),
                        ),
                );
                false
            }
        }
    }
}

/// The root of one file's scope tree plus the per-file extras: the
/// reference list and the complement hints (scope regions included).
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalScope {
    uri: Arc<str>,
    pub root: SymbolScope,
    pub references: Vec<ReferenceEntry>,
    pub hints: Vec<ComplementHint>,
    anonymous_counter: u32,
}

impl GlobalScope {
    /// A fresh global scope for a file; builtins are registered by the
    /// analysis context, not here.
    pub fn new(uri: &str) -> Self {
        Self {
            uri: Arc::from(uri),
            root: SymbolScope::new(ScopePath::global()),
            references: Vec::new(),
            hints: Vec::new(),
            anonymous_counter: 0,
        }
    }

    pub fn uri(&self) -> &Arc<str> {
        &self.uri
    }

    /// Walk from the root segment-by-segment.
    pub fn resolve_scope(&self, path: &ScopePath) -> Option<&SymbolScope> {
        let mut scope = &self.root;
        for segment in path.segments() {
            scope = scope.children.get(segment)?;
        }
        Some(scope)
    }

    pub fn resolve_scope_mut(&mut self, path: &ScopePath) -> Option<&mut SymbolScope> {
        let mut scope = &mut self.root;
        for segment in path.segments() {
            scope = scope.children.get_mut(segment)?;
        }
        Some(scope)
    }

    /// A unique synthetic identifier for an anonymous scope.
    pub fn next_anonymous_name(&mut self) -> String {
        let name = format!("~{}", self.anonymous_counter);
        self.anonymous_counter += 1;
        name
    }

    /// Walk the parent chain from `from`, shallow-looking-up `identifier`
    /// in each scope. Returns the holder and the scope it was found in.
    pub fn lookup_symbol_with_parent(
        &self,
        from: &ScopePath,
        identifier: &str,
    ) -> Option<(&SymbolHolder, ScopePath)> {
        let mut cursor = Some(from.clone());
        while let Some(path) = cursor {
            if let Some(scope) = self.resolve_scope(&path) {
                if let Some(holder) = scope.lookup_symbol(identifier) {
                    return Some((holder, path));
                }
            }
            cursor = path.parent();
        }
        None
    }

    /// Find the nearest enclosing scope (walking up from `from`) that has a
    /// child scope named `identifier`; returns that child's path.
    pub fn find_child_scope_with_parent(
        &self,
        from: &ScopePath,
        identifier: &str,
    ) -> Option<ScopePath> {
        let mut cursor = Some(from.clone());
        while let Some(path) = cursor {
            if let Some(scope) = self.resolve_scope(&path) {
                if scope.children.contains_key(identifier) {
                    return Some(path.join(identifier));
                }
            }
            cursor = path.parent();
        }
        None
    }

    /// The scope-region hints, for folding ranges and position mapping.
    pub fn scope_regions(&self) -> impl Iterator<Item = (&ScopePath, Span)> {
        self.hints.iter().filter_map(|hint| match hint {
            ComplementHint::ScopeRegion { scope, range } => Some((scope, *range)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use angelscript_parser::ast::AccessRestriction;

    use crate::symbol::VariableSymbol;
    use crate::types::ResolvedType;

    fn variable(name: &str, scope: &ScopePath) -> Symbol {
        Symbol::Variable(VariableSymbol {
            name: Spanned::new(name.to_string(), Span::from(0..name.len())),
            defined_in: Arc::from("test.as"),
            declared_scope: scope.clone(),
            ty: ResolvedType::unresolved(),
            is_instance_member: false,
            access: AccessRestriction::Public,
        })
    }

    #[test]
    fn test_scope_path_operations() {
        let path = ScopePath::global().join("A").join("B");
        assert_eq!(path.to_string(), "A::B");
        assert_eq!(path.parent().unwrap().to_string(), "A");
        assert!(path.starts_with(&ScopePath::global().join("A")));
        assert!(!ScopePath::global().join("A").starts_with(&path));
    }

    #[test]
    fn test_insert_scope_reuses_existing_child() {
        let mut global = GlobalScope::new("test.as");
        global.root.insert_scope("A", None);
        global.root.insert_scope("A", None);
        assert_eq!(global.root.children.len(), 1);
        assert!(global
            .resolve_scope(&ScopePath::global().join("A"))
            .is_some());
    }

    #[test]
    fn test_insert_symbol_collision_returns_existing() {
        let mut global = GlobalScope::new("test.as");
        let path = ScopePath::global();
        assert!(global.root.insert_symbol(variable("x", &path)).is_none());
        assert!(global.root.insert_symbol(variable("x", &path)).is_some());
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut global = GlobalScope::new("test.as");
        let root_path = ScopePath::global();
        global.root.insert_symbol(variable("x", &root_path));
        global.root.insert_scope("inner", None);

        let from = root_path.join("inner");
        let (holder, found_in) = global.lookup_symbol_with_parent(&from, "x").unwrap();
        assert_eq!(holder.name(), "x");
        assert!(found_in.is_global());
    }

    #[test]
    fn test_symbol_table_preserves_insertion_order() {
        let mut global = GlobalScope::new("test.as");
        let path = ScopePath::global();
        for name in ["zeta", "alpha", "mid"] {
            global.root.insert_symbol(variable(name, &path));
        }
        let names: Vec<_> = global.root.symbols.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }
}
