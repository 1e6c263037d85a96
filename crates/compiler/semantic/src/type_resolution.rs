//! # Type Resolution
//!
//! Resolves type expressions against the scope tree (`analyze-type`),
//! walks scope qualifiers, and ranks implicit conversions for overload
//! selection. Unresolvable inputs produce a diagnostic once and an
//! *unresolved* type that propagates silently.

use std::sync::Arc;

use angelscript_diagnostics::{Diagnostic, DiagnosticCode};
use angelscript_parser::ast::{
    PrimitiveType, ScopePrefix, Span, Spanned, TypeExpr, TypeName,
};

use crate::context::{AnalysisContext, FoundSymbol};
use crate::hints::{ComplementHint, ReferencedKind, SymbolLocation};
use crate::scope::{ScopeLinkedNode, ScopePath};
use crate::symbol::{SymbolHolder, TypeKind, TypeSymbol};
use crate::types::{ResolvedType, TemplateTranslator};

/// Resolve a scope qualifier (`A::B::`) from `current`, recording a
/// reference and a namespace-access hint per segment. Returns the owning
/// file's URI and the resolved scope path, or `None` after diagnosing the
/// failing segment.
pub(crate) fn resolve_scope_prefix(
    ctx: &mut AnalysisContext,
    current: &ScopePath,
    prefix: &ScopePrefix,
    trailing_span: Span,
) -> Option<(Arc<str>, ScopePath)> {
    let mut uri = ctx.uri();
    let mut path = ScopePath::global();

    for (i, segment) in prefix.segments.iter().enumerate() {
        let resolved = if i == 0 && !prefix.is_global {
            // The first segment of a relative qualifier is searched through
            // the enclosing scope chain, then through include roots.
            match ctx.global.find_child_scope_with_parent(current, segment.value()) {
                Some(found) => Some((ctx.uri(), found)),
                None => ctx
                    .includes
                    .iter()
                    .find(|include| {
                        include.root.children.contains_key(segment.value())
                    })
                    .map(|include| {
                        (
                            Arc::clone(include.uri()),
                            ScopePath::global().join(segment.value()),
                        )
                    }),
            }
        } else {
            let exists = ctx
                .scope_in(&uri, &path)
                .is_some_and(|s| s.children.contains_key(segment.value()));
            if exists {
                Some((Arc::clone(&uri), path.join(segment.value())))
            } else if i == 0 {
                // Leading `::` still allows includes' top-level namespaces.
                ctx.includes
                    .iter()
                    .find(|include| include.root.children.contains_key(segment.value()))
                    .map(|include| {
                        (
                            Arc::clone(include.uri()),
                            ScopePath::global().join(segment.value()),
                        )
                    })
            } else {
                None
            }
        };

        let Some((found_uri, found_path)) = resolved else {
            ctx.diagnostics.add(Diagnostic::unresolved_name(
                ctx.file_path(),
                segment.value(),
                segment.span(),
            ));
            return None;
        };
        uri = found_uri;
        path = found_path;

        if let Some(target) = scope_access_target(ctx, &uri, &path) {
            ctx.record_reference(segment.span(), target);
        }
        let next_span = prefix
            .segments
            .get(i + 1)
            .map_or(trailing_span, Spanned::span);
        ctx.push_hint(ComplementHint::AutocompleteNamespaceAccess {
            caret_range: Span::from(segment.span().end..next_span.end),
            access_scope: path.clone(),
        });
    }

    Some((uri, path))
}

/// What a scope-access segment refers to: the type whose members scope it
/// is, if one exists beside it, otherwise the namespace declaration.
fn scope_access_target(
    ctx: &AnalysisContext,
    uri: &Arc<str>,
    path: &ScopePath,
) -> Option<SymbolLocation> {
    let global = ctx.global_by_uri(uri)?;
    let name = path.last()?;
    let parent = path.parent()?;

    if let Some(holder) = global
        .resolve_scope(&parent)
        .and_then(|scope| scope.lookup_symbol(name))
    {
        if let SymbolHolder::Type(symbol) = holder {
            if symbol.members_scope.as_ref() == Some(path) {
                return Some(symbol.location());
            }
        }
    }

    let scope = global.resolve_scope(path)?;
    match &scope.linked_node {
        Some(ScopeLinkedNode::Namespace(def)) => {
            let declared = def
                .value()
                .segments
                .iter()
                .find(|segment| segment.value() == name)?;
            Some(SymbolLocation {
                uri: Arc::clone(uri),
                scope: parent,
                name: name.to_string(),
                name_span: declared.span(),
                kind: ReferencedKind::Namespace,
            })
        }
        _ => None,
    }
}

/// Resolve a type expression (§4.3): qualifier walk, name resolution,
/// template translation, array/handle wrapping.
pub(crate) fn analyze_type(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    ty: &Spanned<TypeExpr>,
) -> ResolvedType {
    let te = ty.value();

    let mut result = match te.name.value() {
        TypeName::Primitive(primitive) => ctx.primitive_type(*primitive),
        TypeName::Named(name) => {
            let found = match &te.scope {
                Some(prefix) => {
                    match resolve_scope_prefix(ctx, scope, prefix, te.name.span()) {
                        Some((uri, path)) => ctx.find_symbol_in(&uri, &path, name),
                        None => return ResolvedType::unresolved(),
                    }
                }
                None => ctx.find_symbol(scope, name),
            };
            match found {
                Some(FoundSymbol { holder, .. }) => match holder {
                    SymbolHolder::Type(symbol) => {
                        ctx.record_reference(te.name.span(), symbol.location());
                        ResolvedType::from_type(Arc::new(symbol))
                    }
                    SymbolHolder::Functions(holder) => {
                        let first = holder.first().clone();
                        ctx.record_reference(te.name.span(), first.location());
                        ResolvedType::from_funcdef(Arc::new(first))
                    }
                    SymbolHolder::Variable(_) => {
                        ctx.diagnostics.add(
                            Diagnostic::error(
                                DiagnosticCode::TypeMismatch,
                                ctx.file_path(),
                                format!("'{name}' is not a type"),
                            )
                            .with_location(te.name.span()),
                        );
                        return ResolvedType::unresolved();
                    }
                },
                None => {
                    ctx.diagnostics.add(Diagnostic::unresolved_name(
                        ctx.file_path(),
                        name,
                        te.name.span(),
                    ));
                    return ResolvedType::unresolved();
                }
            }
        }
    };

    if !te.template_args.is_empty() {
        let args: Vec<ResolvedType> = te
            .template_args
            .iter()
            .map(|arg| analyze_type(ctx, scope, arg))
            .collect();
        if let Some(symbol) = result.type_symbol() {
            if symbol.template_params.len() == args.len() {
                let translator: TemplateTranslator = symbol
                    .template_params
                    .iter()
                    .cloned()
                    .zip(args)
                    .collect();
                result.translator = Some(Arc::new(translator));
            } else {
                ctx.diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::TypeMismatch,
                        ctx.file_path(),
                        format!(
                            "'{}' expects {} template argument(s), got {}",
                            symbol.name.value(),
                            symbol.template_params.len(),
                            args.len()
                        ),
                    )
                    .with_location(ty.span()),
                );
            }
        }
    }

    for _ in 0..te.array_dims {
        result = wrap_array(ctx, scope, result);
    }

    result.modifiers.is_const |= te.is_const;
    result.modifiers.is_handle |= te.is_handle;
    result
}

/// `T[]` becomes `array<T>` using the configured array type; when the
/// array type itself cannot be found the element type is marked with the
/// array modifier instead.
pub(crate) fn wrap_array(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    element: ResolvedType,
) -> ResolvedType {
    let array_name = ctx.settings.builtin_array_type.clone();
    if let Some(FoundSymbol { holder, .. }) = ctx.find_symbol(scope, &array_name) {
        if let SymbolHolder::Type(symbol) = holder {
            if let Some(param) = symbol.template_params.first().cloned() {
                let mut translator = TemplateTranslator::default();
                translator.insert(param, element);
                return ResolvedType::from_type(Arc::new(symbol))
                    .with_translator(Some(Arc::new(translator)));
            }
        }
    }
    let mut fallback = element;
    fallback.modifiers.is_array = true;
    fallback
}

/// Same declaration, ignoring how it is spelled.
pub(crate) fn type_identity_eq(a: &TypeSymbol, b: &TypeSymbol) -> bool {
    if let (Some(pa), Some(pb)) = (a.primitive(), b.primitive()) {
        return pa == pb;
    }
    a.defined_in == b.defined_in
        && a.declared_scope == b.declared_scope
        && a.name.value() == b.name.value()
}

/// Whether `derived` inherits (transitively) from `base`, walking live
/// base lists.
pub(crate) fn derives_from(
    ctx: &AnalysisContext,
    derived: &TypeSymbol,
    base: &TypeSymbol,
) -> bool {
    fn walk(ctx: &AnalysisContext, current: &TypeSymbol, base: &TypeSymbol, depth: u32) -> bool {
        if depth > 16 {
            return false;
        }
        let live = ctx.live_type(current).unwrap_or_else(|| current.clone());
        for candidate in &live.bases {
            if let Some(symbol) = candidate.type_symbol() {
                if type_identity_eq(symbol, base) || walk(ctx, symbol, base, depth + 1) {
                    return true;
                }
            }
        }
        false
    }
    walk(ctx, derived, base, 0)
}

/// Rank the implicit conversion from `from` to `to`:
/// `0` exact, `1` numeric widening, `2` handle-compatible, `3` `?`
/// any-type; `None` means the conversion fails. Unresolved types convert
/// freely so one missing name does not cascade.
pub(crate) fn conversion_rank(
    ctx: &AnalysisContext,
    from: &ResolvedType,
    to: &ResolvedType,
) -> Option<u32> {
    if to
        .type_symbol()
        .is_some_and(|s| s.primitive() == Some(PrimitiveType::Any))
    {
        return Some(3);
    }
    if from.is_unresolved() || to.is_unresolved() {
        return Some(0);
    }

    // const and reference mode never change the value category
    let mut from_core = from.clone();
    let mut to_core = to.clone();
    from_core.modifiers.is_const = false;
    from_core.modifiers.ref_mode = None;
    to_core.modifiers.is_const = false;
    to_core.modifiers.ref_mode = None;

    if from_core.same_type(&to_core) {
        return Some(0);
    }
    {
        let mut from_value = from_core.clone();
        let mut to_value = to_core.clone();
        from_value.modifiers.is_handle = false;
        to_value.modifiers.is_handle = false;
        if from_value.same_type(&to_value) {
            // same type, handle/value mismatch only
            return Some(2);
        }
    }

    // a function handle fits any funcdef with the same signature
    if let (Some(from_fn), Some(to_fn)) = (from_core.funcdef_symbol(), to_core.funcdef_symbol()) {
        let compatible = from_fn.params.len() == to_fn.params.len()
            && from_fn.return_type.same_type(&to_fn.return_type)
            && from_fn
                .params
                .iter()
                .zip(&to_fn.params)
                .all(|(a, b)| a.ty.same_type(&b.ty));
        if compatible {
            return Some(2);
        }
    }

    if from_core.is_numeric() && to_core.is_numeric() {
        return Some(1);
    }
    if to_core.is_integer()
        && from_core
            .type_symbol()
            .is_some_and(|s| s.kind == TypeKind::Enum)
    {
        return Some(1);
    }

    if let (Some(from_sym), Some(to_sym)) = (from_core.type_symbol(), to_core.type_symbol()) {
        if derives_from(ctx, from_sym, to_sym) {
            return Some(2);
        }
    }
    None
}
