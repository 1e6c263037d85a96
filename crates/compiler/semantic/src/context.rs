//! # Analysis Context
//!
//! The mutable state threaded through both semantic passes: the file's
//! global scope under construction, the read-only global scopes of its
//! includes, the diagnostic sink, the settings, and the two deferred-work
//! queues. Hoist fully drains (including tasks enqueued by tasks) before
//! the first analyze task runs; within a queue, order is FIFO.

use std::collections::VecDeque;
use std::sync::Arc;

use angelscript_diagnostics::{Diagnostic, DiagnosticCollection};
use angelscript_parser::ast::{ParsedModule, PrimitiveType, Span};

use crate::builtins;
use crate::hints::{ComplementHint, ReferenceEntry, SymbolLocation};
use crate::hoist;
use crate::scope::{GlobalScope, ScopePath, SymbolScope};
use crate::settings::AnalyzerSettings;
use crate::symbol::{FunctionSymbol, Symbol, SymbolHolder, TypeSymbol, VariableSymbol};
use crate::types::ResolvedType;

pub(crate) type DeferredTask = Box<dyn FnOnce(&mut AnalysisContext)>;

/// Result of one file's hoist + analyze run.
#[derive(Debug)]
pub struct AnalysisOutput {
    pub global: GlobalScope,
    pub diagnostics: DiagnosticCollection,
}

/// A symbol found by name lookup, with the global scope it came from.
#[derive(Debug, Clone)]
pub(crate) struct FoundSymbol {
    pub holder: SymbolHolder,
    pub uri: Arc<str>,
    pub scope: ScopePath,
}

pub struct AnalysisContext {
    pub global: GlobalScope,
    pub includes: Vec<Arc<GlobalScope>>,
    pub diagnostics: DiagnosticCollection,
    pub settings: Arc<AnalyzerSettings>,
    hoist_queue: VecDeque<DeferredTask>,
    analyze_queue: VecDeque<DeferredTask>,
}

impl AnalysisContext {
    pub fn new(
        uri: &str,
        settings: Arc<AnalyzerSettings>,
        includes: Vec<Arc<GlobalScope>>,
    ) -> Self {
        let mut global = GlobalScope::new(uri);
        builtins::register_builtins(&mut global);
        Self {
            global,
            includes,
            diagnostics: DiagnosticCollection::new(),
            settings,
            hoist_queue: VecDeque::new(),
            analyze_queue: VecDeque::new(),
        }
    }

    /// Run both passes over a parsed module and yield the finished scope.
    pub fn run(mut self, module: &ParsedModule) -> AnalysisOutput {
        hoist::hoist_script(&mut self, &ScopePath::global(), module.items());
        while let Some(task) = self.hoist_queue.pop_front() {
            task(&mut self);
        }
        while let Some(task) = self.analyze_queue.pop_front() {
            task(&mut self);
        }
        AnalysisOutput {
            global: self.global,
            diagnostics: self.diagnostics,
        }
    }

    pub(crate) fn uri(&self) -> Arc<str> {
        Arc::clone(self.global.uri())
    }

    pub(crate) fn file_path(&self) -> String {
        self.global.uri().to_string()
    }

    pub(crate) fn defer_hoist(&mut self, task: impl FnOnce(&mut AnalysisContext) + 'static) {
        self.hoist_queue.push_back(Box::new(task));
    }

    pub(crate) fn defer_analyze(&mut self, task: impl FnOnce(&mut AnalysisContext) + 'static) {
        self.analyze_queue.push_back(Box::new(task));
    }

    pub(crate) fn record_reference(&mut self, from_span: Span, target: SymbolLocation) {
        self.global
            .references
            .push(ReferenceEntry { from_span, target });
    }

    /// Record the declaration itself as a reference so rename and
    /// find-references include the declaring token.
    pub(crate) fn record_declaration(&mut self, target: SymbolLocation) {
        let span = target.name_span;
        self.record_reference(span, target);
    }

    pub(crate) fn push_hint(&mut self, hint: ComplementHint) {
        self.global.hints.push(hint);
    }

    /// The global scope a URI resolves to: this file's or one of its
    /// includes'.
    pub(crate) fn global_by_uri(&self, uri: &str) -> Option<&GlobalScope> {
        if &**self.global.uri() == uri {
            return Some(&self.global);
        }
        self.includes
            .iter()
            .map(Arc::as_ref)
            .find(|include| &**include.uri() == uri)
    }

    pub(crate) fn scope_in(&self, uri: &str, path: &ScopePath) -> Option<&SymbolScope> {
        self.global_by_uri(uri)?.resolve_scope(path)
    }

    /// Unscoped lookup: walk the parent chain from `from`, then fall back
    /// to the include roots. Returns a clone so no borrow is held.
    pub(crate) fn find_symbol(&self, from: &ScopePath, identifier: &str) -> Option<FoundSymbol> {
        if let Some((holder, scope)) = self.global.lookup_symbol_with_parent(from, identifier) {
            return Some(FoundSymbol {
                holder: holder.clone(),
                uri: Arc::clone(self.global.uri()),
                scope,
            });
        }
        for include in &self.includes {
            if let Some(holder) = include.root.lookup_symbol(identifier) {
                return Some(FoundSymbol {
                    holder: holder.clone(),
                    uri: Arc::clone(include.uri()),
                    scope: ScopePath::global(),
                });
            }
        }
        None
    }

    /// Shallow lookup inside one scope of one file.
    pub(crate) fn find_symbol_in(
        &self,
        uri: &str,
        scope: &ScopePath,
        identifier: &str,
    ) -> Option<FoundSymbol> {
        let found = self.scope_in(uri, scope)?.lookup_symbol(identifier)?;
        Some(FoundSymbol {
            holder: found.clone(),
            uri: Arc::from(uri),
            scope: scope.clone(),
        })
    }

    /// The current state of a type symbol, re-fetched through its owning
    /// global scope (snapshots in resolved types may predate base
    /// resolution).
    pub(crate) fn live_type(&self, symbol: &TypeSymbol) -> Option<TypeSymbol> {
        let scope = self.scope_in(&symbol.defined_in, &symbol.declared_scope)?;
        scope
            .lookup_symbol(symbol.name.value())
            .and_then(SymbolHolder::as_type)
            .cloned()
    }

    /// The resolved type for a builtin primitive spelling.
    pub(crate) fn primitive_type(&self, primitive: PrimitiveType) -> ResolvedType {
        if matches!(primitive, PrimitiveType::Auto) {
            return ResolvedType::unresolved();
        }
        if matches!(primitive, PrimitiveType::Any) {
            return ResolvedType::from_type(Arc::new(builtins::primitive_symbol(
                "?",
                PrimitiveType::Any,
                self.global.uri(),
            )));
        }
        self.global
            .root
            .lookup_symbol(primitive.name())
            .and_then(SymbolHolder::as_type)
            .map(|symbol| ResolvedType::from_type(Arc::new(symbol.clone())))
            .unwrap_or_else(ResolvedType::unresolved)
    }

    /// Insert a symbol into a scope of this file, diagnosing collisions.
    pub(crate) fn insert_symbol_checked(&mut self, scope: &ScopePath, symbol: Symbol) -> bool {
        let file_path = self.file_path();
        let Self {
            global,
            diagnostics,
            ..
        } = self;
        match global.resolve_scope_mut(scope) {
            Some(target) => target.insert_symbol_and_check(symbol, &file_path, diagnostics),
            None => false,
        }
    }

    /// Insert without collision diagnostics (synthetic symbols).
    pub(crate) fn insert_symbol_silent(&mut self, scope: &ScopePath, symbol: Symbol) {
        if let Some(target) = self.global.resolve_scope_mut(scope) {
            target.insert_symbol(symbol);
        }
    }

    /// Insert a function symbol, merging into an existing holder. Returns
    /// the overload index, or `None` (with a diagnostic) when the name is
    /// taken by a non-function.
    pub(crate) fn insert_function_checked(
        &mut self,
        scope: &ScopePath,
        symbol: FunctionSymbol,
    ) -> Option<usize> {
        let file_path = self.file_path();
        let name = symbol.name.value().clone();
        let span = symbol.name.span();
        let Self {
            global,
            diagnostics,
            ..
        } = self;
        let target = global.resolve_scope_mut(scope)?;

        let index = match target.lookup_symbol(&name) {
            Some(SymbolHolder::Functions(holder)) => holder.overloads.len(),
            Some(existing) => {
                diagnostics.add(
                    Diagnostic::duplicate_declaration(file_path, &name, span).with_related_span(
                        existing.name_span(),
                        "previously declared here".to_string(),
                    ),
                );
                return None;
            }
            None => 0,
        };
        target.insert_symbol(Symbol::Function(symbol));
        Some(index)
    }

    pub(crate) fn with_function_mut(
        &mut self,
        scope: &ScopePath,
        name: &str,
        index: usize,
        update: impl FnOnce(&mut FunctionSymbol),
    ) {
        if let Some(target) = self.global.resolve_scope_mut(scope) {
            if let Some(SymbolHolder::Functions(holder)) = target.symbols.get_mut(name) {
                if let Some(overload) = holder.overloads.get_mut(index) {
                    update(overload);
                }
            }
        }
    }

    pub(crate) fn with_type_mut(
        &mut self,
        scope: &ScopePath,
        name: &str,
        update: impl FnOnce(&mut TypeSymbol),
    ) {
        if let Some(target) = self.global.resolve_scope_mut(scope) {
            if let Some(SymbolHolder::Type(symbol)) = target.symbols.get_mut(name) {
                update(symbol);
            }
        }
    }

    pub(crate) fn with_variable_mut(
        &mut self,
        scope: &ScopePath,
        name: &str,
        update: impl FnOnce(&mut VariableSymbol),
    ) {
        if let Some(target) = self.global.resolve_scope_mut(scope) {
            if let Some(SymbolHolder::Variable(symbol)) = target.symbols.get_mut(name) {
                update(symbol);
            }
        }
    }
}

/// Analyze one parsed module against its include scopes; the entry point
/// the workspace resolver and the test suites call.
pub fn analyze_module(
    uri: &str,
    module: &ParsedModule,
    includes: Vec<Arc<GlobalScope>>,
    settings: Arc<AnalyzerSettings>,
) -> AnalysisOutput {
    tracing::debug!("analyzing module {uri}");
    AnalysisContext::new(uri, settings, includes).run(module)
}
