//! # Hoist Phase
//!
//! The first semantic pass: declare every named entity before any body is
//! analyzed, so forward references and mutual recursion resolve. The
//! recursive walk inserts symbols and scopes immediately and pushes the
//! rest onto the context's FIFO queues — base-class resolution, member
//! copying, parameter lists and accessor synthesis onto the hoist queue
//! (drained to fixpoint before analysis), body work onto the analyze
//! queue.

use std::sync::Arc;

use angelscript_diagnostics::{Diagnostic, DiagnosticCode};
use angelscript_parser::ast::{
    AccessRestriction, ClassDef, ClassMember, EnumDef, FuncdefDef, FunctionDef, InterfaceDef,
    InterfaceMember, NamespaceDef, PrimitiveType, Spanned, TopLevelItem, TypeName, TypedefDef,
    VarDecl, VirtualPropertyDef,
};

use crate::analyzer;
use crate::context::AnalysisContext;
use crate::hints::ComplementHint;
use crate::scope::{ScopeLinkedNode, ScopePath};
use crate::symbol::{
    FunctionSymbol, ParamInfo, Symbol, SymbolHolder, TypeKind, TypeSymbol, VariableSymbol,
};
use crate::type_resolution::analyze_type;
use crate::types::ResolvedType;

/// Hoist every item of a script (or namespace body) into `scope`.
pub(crate) fn hoist_script(ctx: &mut AnalysisContext, scope: &ScopePath, items: &[TopLevelItem]) {
    for item in items {
        match item {
            TopLevelItem::Class(def) => hoist_class(ctx, scope, def.clone()),
            TopLevelItem::Interface(def) => hoist_interface(ctx, scope, def.clone()),
            TopLevelItem::Enum(def) => hoist_enum(ctx, scope, def.clone()),
            TopLevelItem::Typedef(def) => hoist_typedef(ctx, scope, def),
            TopLevelItem::Funcdef(def) => hoist_funcdef(ctx, scope, def.clone()),
            TopLevelItem::Function(def) => hoist_function(ctx, scope, def.clone(), false),
            TopLevelItem::Namespace(def) => hoist_namespace(ctx, scope, def.clone()),
            TopLevelItem::Variable(def) => hoist_var(ctx, scope, def.clone(), false),
            TopLevelItem::VirtualProperty(def) => {
                hoist_virtual_property(ctx, scope, def.clone(), false);
            }
        }
    }
}

/// Hoist a class (`mixin class` included): type symbol, member scope,
/// `this`, template parameters now; bases, members, base-copy and `super`
/// deferred.
fn hoist_class(ctx: &mut AnalysisContext, scope: &ScopePath, def: Arc<Spanned<ClassDef>>) {
    let class = def.value();
    let name = class.name.clone();
    let members_path = scope.join(name.value());

    let template_params: Vec<String> = class
        .template_params
        .iter()
        .map(|p| p.value().clone())
        .collect();
    let symbol = TypeSymbol {
        name: name.clone(),
        defined_in: ctx.uri(),
        declared_scope: scope.clone(),
        members_scope: Some(members_path.clone()),
        template_params,
        bases: Vec::new(),
        kind: TypeKind::Class,
    };
    let class_arc = Arc::new(symbol.clone());
    ctx.record_declaration(symbol.location());
    ctx.insert_symbol_checked(scope, Symbol::Type(symbol));

    let file_path = ctx.file_path();
    {
        let AnalysisContext {
            global,
            diagnostics,
            ..
        } = ctx;
        if let Some(parent) = global.resolve_scope_mut(scope) {
            parent.insert_scope_and_check(
                &name,
                Some(ScopeLinkedNode::Class(def.clone())),
                &file_path,
                diagnostics,
            );
        }
    }
    ctx.push_hint(ComplementHint::ScopeRegion {
        scope: members_path.clone(),
        range: def.span(),
    });

    // `this`, privately bound, never copied by inheritance
    let this = VariableSymbol {
        name: Spanned::new("this".to_string(), name.span()),
        defined_in: ctx.uri(),
        declared_scope: members_path.clone(),
        ty: ResolvedType::from_type(class_arc),
        is_instance_member: false,
        access: AccessRestriction::Private,
    };
    ctx.insert_symbol_silent(&members_path, Symbol::Variable(this));

    for param in &class.template_params {
        let symbol = TypeSymbol {
            name: param.clone(),
            defined_in: ctx.uri(),
            declared_scope: members_path.clone(),
            members_scope: None,
            template_params: Vec::new(),
            bases: Vec::new(),
            kind: TypeKind::TemplateParameter,
        };
        ctx.insert_symbol_silent(&members_path, Symbol::Type(symbol));
    }

    // Deferred: bases resolve after the whole top-level walk so forward
    // references work, then members hoist, then the base copy runs.
    let scope = scope.clone();
    ctx.defer_hoist(move |ctx| {
        let class = def.value();
        let mut bases = Vec::new();
        for base in &class.bases {
            let resolved = analyze_type(ctx, &members_path, base);
            if let Some(symbol) = resolved.type_symbol() {
                if !matches!(
                    symbol.kind,
                    TypeKind::Class | TypeKind::Interface | TypeKind::TemplateParameter
                ) {
                    ctx.diagnostics.add(
                        Diagnostic::error(
                            DiagnosticCode::TypeMismatch,
                            ctx.file_path(),
                            format!("'{}' cannot be used as a base", symbol.name.value()),
                        )
                        .with_location(base.span()),
                    );
                    continue;
                }
            }
            if !resolved.is_unresolved() {
                bases.push(resolved);
            }
        }
        {
            let bases = bases.clone();
            ctx.with_type_mut(&scope, class.name.value(), |symbol| symbol.bases = bases);
        }

        for member in &class.members {
            match member {
                ClassMember::Function(f) => hoist_function(ctx, &members_path, f.clone(), true),
                ClassMember::Variable(v) => hoist_var(ctx, &members_path, v.clone(), true),
                ClassMember::VirtualProperty(p) => {
                    hoist_virtual_property(ctx, &members_path, p.clone(), true);
                }
                ClassMember::Funcdef(fd) => hoist_funcdef(ctx, &members_path, fd.clone()),
            }
        }

        let class_name = class.name.clone();
        // double-deferred: the copy must observe every member signature
        // resolved by the first round of deferred tasks
        ctx.defer_hoist(move |ctx| {
            ctx.defer_hoist(move |ctx| {
                copy_base_members(ctx, &scope, &class_name, &members_path, true);
            });
        });
    });
}

/// Hoist an interface: like a class, but only method signatures and
/// virtual properties, and no `this`/`super`.
fn hoist_interface(ctx: &mut AnalysisContext, scope: &ScopePath, def: Arc<Spanned<InterfaceDef>>) {
    let interface = def.value();
    let name = interface.name.clone();
    let members_path = scope.join(name.value());

    let symbol = TypeSymbol {
        name: name.clone(),
        defined_in: ctx.uri(),
        declared_scope: scope.clone(),
        members_scope: Some(members_path.clone()),
        template_params: Vec::new(),
        bases: Vec::new(),
        kind: TypeKind::Interface,
    };
    ctx.record_declaration(symbol.location());
    ctx.insert_symbol_checked(scope, Symbol::Type(symbol));

    let file_path = ctx.file_path();
    {
        let AnalysisContext {
            global,
            diagnostics,
            ..
        } = ctx;
        if let Some(parent) = global.resolve_scope_mut(scope) {
            parent.insert_scope_and_check(
                &name,
                Some(ScopeLinkedNode::Interface(def.clone())),
                &file_path,
                diagnostics,
            );
        }
    }
    ctx.push_hint(ComplementHint::ScopeRegion {
        scope: members_path.clone(),
        range: def.span(),
    });

    let scope = scope.clone();
    ctx.defer_hoist(move |ctx| {
        let interface = def.value();
        let mut bases = Vec::new();
        for base in &interface.bases {
            let resolved = analyze_type(ctx, &members_path, base);
            if !resolved.is_unresolved() {
                bases.push(resolved);
            }
        }
        {
            let bases = bases.clone();
            ctx.with_type_mut(&scope, interface.name.value(), |symbol| {
                symbol.bases = bases;
            });
        }

        for member in &interface.members {
            match member {
                InterfaceMember::Method(f) => hoist_function(ctx, &members_path, f.clone(), true),
                InterfaceMember::VirtualProperty(p) => {
                    hoist_virtual_property(ctx, &members_path, p.clone(), true);
                }
            }
        }

        let interface_name = interface.name.clone();
        ctx.defer_hoist(move |ctx| {
            ctx.defer_hoist(move |ctx| {
                copy_base_members(ctx, &scope, &interface_name, &members_path, false);
            });
        });
    });
}

/// Hoist an enum: type symbol, member scope, and a variable symbol per
/// member typed as the enum.
fn hoist_enum(ctx: &mut AnalysisContext, scope: &ScopePath, def: Arc<Spanned<EnumDef>>) {
    let decl = def.value();
    let name = decl.name.clone();
    let members_path = scope.join(name.value());

    let symbol = TypeSymbol {
        name: name.clone(),
        defined_in: ctx.uri(),
        declared_scope: scope.clone(),
        members_scope: Some(members_path.clone()),
        template_params: Vec::new(),
        bases: Vec::new(),
        kind: TypeKind::Enum,
    };
    let enum_arc = Arc::new(symbol.clone());
    ctx.record_declaration(symbol.location());
    ctx.insert_symbol_checked(scope, Symbol::Type(symbol));

    // The member scope may coexist with a namespace of the same name, so
    // this insert does not check.
    if let Some(parent) = ctx.global.resolve_scope_mut(scope) {
        parent.insert_scope(name.value(), Some(ScopeLinkedNode::Enum(def.clone())));
    }
    ctx.push_hint(ComplementHint::ScopeRegion {
        scope: members_path.clone(),
        range: def.span(),
    });

    let member_ty = ResolvedType::from_type(enum_arc);
    for member in &decl.members {
        let variable = VariableSymbol {
            name: member.name.clone(),
            defined_in: ctx.uri(),
            declared_scope: members_path.clone(),
            ty: member_ty.clone(),
            is_instance_member: false,
            access: AccessRestriction::Public,
        };
        ctx.record_declaration(variable.location());
        ctx.insert_symbol_checked(&members_path, Symbol::Variable(variable.clone()));
        if ctx.settings.hoist_enum_parent_scope {
            ctx.insert_symbol_silent(scope, Symbol::Variable(variable));
        }
    }
}

/// Hoist a typedef: a type symbol aliasing a builtin primitive.
fn hoist_typedef(ctx: &mut AnalysisContext, scope: &ScopePath, def: &Arc<Spanned<TypedefDef>>) {
    let decl = def.value();
    let primitive = PrimitiveType::from_name(decl.primitive.value());
    if primitive.is_none() {
        ctx.diagnostics.add(Diagnostic::unresolved_name(
            ctx.file_path(),
            decl.primitive.value(),
            decl.primitive.span(),
        ));
    }
    let symbol = TypeSymbol {
        name: decl.name.clone(),
        defined_in: ctx.uri(),
        declared_scope: scope.clone(),
        members_scope: None,
        template_params: Vec::new(),
        bases: Vec::new(),
        kind: TypeKind::Typedef(primitive.unwrap_or(PrimitiveType::Void)),
    };
    ctx.record_declaration(symbol.location());
    ctx.insert_symbol_checked(scope, Symbol::Type(symbol));
}

/// Hoist a funcdef: a bodiless function symbol whose signature resolves on
/// the hoist queue.
fn hoist_funcdef(ctx: &mut AnalysisContext, scope: &ScopePath, def: Arc<Spanned<FuncdefDef>>) {
    let decl = def.value();
    let symbol = FunctionSymbol {
        name: decl.name.clone(),
        defined_in: ctx.uri(),
        declared_scope: scope.clone(),
        return_type: ResolvedType::unresolved(),
        params: Vec::new(),
        body_scope: None,
        is_instance_member: false,
        access: AccessRestriction::Public,
        template_params: Vec::new(),
        node: None,
    };
    ctx.record_declaration(symbol.location());
    let Some(index) = ctx.insert_function_checked(scope, symbol) else {
        return;
    };

    let scope = scope.clone();
    ctx.defer_hoist(move |ctx| {
        let decl = def.value();
        let return_type = analyze_type(ctx, &scope, &decl.return_type);
        let params = resolve_parameters(ctx, &scope, &decl.params, None);
        ctx.with_function_mut(&scope, decl.name.value(), index, |symbol| {
            symbol.return_type = return_type;
            symbol.params = params;
        });
    });
}

/// Hoist a function or method. Two nested scopes are created: the
/// function-holder scope keyed by the identifier (shared by overloads)
/// and an anonymous body scope linked to this node. Destructors skip all
/// of this.
pub(crate) fn hoist_function(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    def: Arc<Spanned<FunctionDef>>,
    is_instance: bool,
) {
    let func = def.value();
    if func.is_destructor {
        return;
    }
    let name = func.name.clone();

    let has_accessor_prefix =
        name.value().starts_with("get_") || name.value().starts_with("set_");
    if func.attributes.is_property && !has_accessor_prefix {
        ctx.diagnostics.add(Diagnostic::property_contract(
            ctx.file_path(),
            name.value(),
            name.span(),
        ));
    }

    let holder_path = scope.join(name.value());
    if let Some(parent) = ctx.global.resolve_scope_mut(scope) {
        parent.insert_scope(name.value(), None);
    }
    let anonymous = ctx.global.next_anonymous_name();
    let body_path = holder_path.join(&anonymous);
    if let Some(holder_scope) = ctx.global.resolve_scope_mut(&holder_path) {
        holder_scope.insert_scope(&anonymous, Some(ScopeLinkedNode::Function(def.clone())));
    }
    ctx.push_hint(ComplementHint::ScopeRegion {
        scope: body_path.clone(),
        range: def.span(),
    });

    let template_params: Vec<String> = func
        .template_params
        .iter()
        .map(|p| p.value().clone())
        .collect();
    for param in &func.template_params {
        let symbol = TypeSymbol {
            name: param.clone(),
            defined_in: ctx.uri(),
            declared_scope: body_path.clone(),
            members_scope: None,
            template_params: Vec::new(),
            bases: Vec::new(),
            kind: TypeKind::TemplateParameter,
        };
        ctx.insert_symbol_silent(&body_path, Symbol::Type(symbol));
    }

    let symbol = FunctionSymbol {
        name: name.clone(),
        defined_in: ctx.uri(),
        declared_scope: scope.clone(),
        return_type: ResolvedType::unresolved(),
        params: Vec::new(),
        body_scope: Some(body_path.clone()),
        is_instance_member: is_instance,
        access: func.access,
        template_params,
        node: Some(def.clone()),
    };
    ctx.record_declaration(symbol.location());
    let Some(index) = ctx.insert_function_checked(scope, symbol) else {
        return;
    };

    // Signature resolution is deferred (hoist queue) so return and
    // parameter types may forward-reference declarations later in the
    // file; parameters are declared as locals of the body scope at the
    // same time.
    {
        let def = def.clone();
        let scope = scope.clone();
        let body_path = body_path.clone();
        let fname = name.value().clone();
        ctx.defer_hoist(move |ctx| {
            let func = def.value();
            let return_type = match &func.return_type {
                Some(ty) => analyze_type(ctx, &body_path, ty),
                None => ctx.primitive_type(PrimitiveType::Void),
            };
            let params = resolve_parameters(ctx, &body_path, &func.params, Some(&body_path));
            ctx.with_function_mut(&scope, &fname, index, |symbol| {
                symbol.return_type = return_type;
                symbol.params = params;
            });
        });
    }

    // Property accessor synthesis runs after the parameter task so the
    // setter's value type is known.
    if has_accessor_prefix
        && (!ctx.settings.explicit_property_accessor || func.attributes.is_property)
    {
        let scope = scope.clone();
        let fname = name.value().clone();
        let name_span = name.span();
        ctx.defer_hoist(move |ctx| {
            let Some(func) = ctx
                .global
                .resolve_scope(&scope)
                .and_then(|s| s.lookup_symbol(&fname))
                .and_then(SymbolHolder::as_functions)
                .and_then(|h| h.overloads.get(index))
                .cloned()
            else {
                return;
            };
            let property_name = fname[4..].to_string();
            if property_name.is_empty() {
                return;
            }
            let ty = if fname.starts_with("get_") {
                func.return_type.clone()
            } else {
                func.params
                    .first()
                    .map(|p| p.ty.clone())
                    .unwrap_or_default()
            };
            let variable = VariableSymbol {
                name: Spanned::new(property_name, name_span),
                defined_in: ctx.uri(),
                declared_scope: scope.clone(),
                ty,
                is_instance_member: func.is_instance_member,
                access: func.access,
            };
            // the get_/set_ pair shares one synthetic variable
            ctx.insert_symbol_silent(&scope, Symbol::Variable(variable));
        });
    }

    if func.body.is_some() {
        let scope = scope.clone();
        let fname = name.value().clone();
        ctx.defer_analyze(move |ctx| {
            // the deferred signature task has patched the symbol by now
            let return_type = ctx
                .global
                .resolve_scope(&scope)
                .and_then(|s| s.lookup_symbol(&fname))
                .and_then(SymbolHolder::as_functions)
                .and_then(|h| h.overloads.get(index))
                .map(|f| f.return_type.clone())
                .unwrap_or_default();
            if let Some(body) = &def.value().body {
                analyzer::analyze_statements(ctx, &body_path, body, &return_type);
            }
        });
    }
}

/// Resolve a parameter list; when `declare_in` is given, named parameters
/// are inserted as variables of that scope. A sole unnamed `void`
/// parameter means an empty list.
fn resolve_parameters(
    ctx: &mut AnalysisContext,
    type_scope: &ScopePath,
    params: &[angelscript_parser::ast::Parameter],
    declare_in: Option<&ScopePath>,
) -> Vec<ParamInfo> {
    if params.len() == 1
        && params[0].name.is_none()
        && matches!(
            params[0].type_expr.value().name.value(),
            TypeName::Primitive(PrimitiveType::Void)
        )
    {
        return Vec::new();
    }

    let mut resolved = Vec::new();
    for param in params {
        let mut ty = analyze_type(ctx, type_scope, &param.type_expr);
        ty.modifiers.ref_mode = param.modifier;
        if let (Some(target), Some(name)) = (declare_in, &param.name) {
            let variable = VariableSymbol {
                name: name.clone(),
                defined_in: ctx.uri(),
                declared_scope: target.clone(),
                ty: ty.clone(),
                is_instance_member: false,
                access: AccessRestriction::Public,
            };
            ctx.record_declaration(variable.location());
            ctx.insert_symbol_checked(target, Symbol::Variable(variable));
        }
        resolved.push(ParamInfo {
            name: param.name.as_ref().map(|n| n.value().clone()),
            ty,
            has_default: param.default.is_some(),
        });
    }
    resolved
}

/// Hoist a global or member variable declaration. The declared type
/// resolves on the hoist queue (so it may forward-reference later
/// declarations); `auto` types are captured from the initializer during
/// the analyze phase.
pub(crate) fn hoist_var(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    def: Arc<Spanned<VarDecl>>,
    is_instance: bool,
) {
    let decl = def.value();
    let is_auto = matches!(
        decl.type_expr.value().name.value(),
        TypeName::Primitive(PrimitiveType::Auto)
    );

    for declarator in &decl.declarators {
        let variable = VariableSymbol {
            name: declarator.name.clone(),
            defined_in: ctx.uri(),
            declared_scope: scope.clone(),
            ty: ResolvedType::unresolved(),
            is_instance_member: is_instance,
            access: decl.access,
        };
        ctx.record_declaration(variable.location());
        ctx.insert_symbol_checked(scope, Symbol::Variable(variable));
    }

    if !is_auto {
        let def = def.clone();
        let scope = scope.clone();
        ctx.defer_hoist(move |ctx| {
            let decl = def.value();
            let ty = analyze_type(ctx, &scope, &decl.type_expr);
            for declarator in &decl.declarators {
                let ty = ty.clone();
                ctx.with_variable_mut(&scope, declarator.name.value(), |symbol| symbol.ty = ty);
            }
        });
    }

    let scope = scope.clone();
    ctx.defer_analyze(move |ctx| {
        analyzer::analyze_hoisted_var_initializers(ctx, &scope, &def, is_auto);
    });
}

/// Hoist a virtual property: the variable symbol plus `get_`/`set_`
/// accessor scopes (the setter scope binds `value`).
pub(crate) fn hoist_virtual_property(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    def: Arc<Spanned<VirtualPropertyDef>>,
    is_instance: bool,
) {
    let decl = def.value();

    let variable = VariableSymbol {
        name: decl.name.clone(),
        defined_in: ctx.uri(),
        declared_scope: scope.clone(),
        ty: ResolvedType::unresolved(),
        is_instance_member: is_instance,
        access: decl.access,
    };
    ctx.record_declaration(variable.location());
    ctx.insert_symbol_checked(scope, Symbol::Variable(variable));

    // accessor scopes exist immediately; the property type resolves on
    // the hoist queue and is patched into the symbols
    let mut setter_path = None;
    for (accessor, is_getter) in [(&decl.getter, true), (&decl.setter, false)] {
        let Some(accessor) = accessor else { continue };
        let prefix = if is_getter { "get_" } else { "set_" };
        let accessor_name = format!("{prefix}{}", decl.name.value());
        if let Some(parent) = ctx.global.resolve_scope_mut(scope) {
            parent.insert_scope(&accessor_name, Some(ScopeLinkedNode::Block(accessor.span)));
        }
        let accessor_path = scope.join(&accessor_name);
        ctx.push_hint(ComplementHint::ScopeRegion {
            scope: accessor_path.clone(),
            range: accessor.span,
        });

        if !is_getter {
            let value = VariableSymbol {
                name: Spanned::new("value".to_string(), decl.name.span()),
                defined_in: ctx.uri(),
                declared_scope: accessor_path.clone(),
                ty: ResolvedType::unresolved(),
                is_instance_member: false,
                access: AccessRestriction::Public,
            };
            ctx.insert_symbol_silent(&accessor_path, Symbol::Variable(value));
            setter_path = Some(accessor_path.clone());
        }

        if accessor.body.is_some() {
            let def = def.clone();
            let scope = scope.clone();
            ctx.defer_analyze(move |ctx| {
                let decl = def.value();
                let expected = if is_getter {
                    property_type(ctx, &scope, decl.name.value())
                } else {
                    ctx.primitive_type(PrimitiveType::Void)
                };
                let accessor = if is_getter { &decl.getter } else { &decl.setter };
                if let Some(body) = accessor.as_ref().and_then(|a| a.body.as_ref()) {
                    analyzer::analyze_statements(ctx, &accessor_path, body, &expected);
                }
            });
        }
    }

    {
        let def = def.clone();
        let scope = scope.clone();
        ctx.defer_hoist(move |ctx| {
            let decl = def.value();
            let ty = analyze_type(ctx, &scope, &decl.type_expr);
            {
                let ty = ty.clone();
                ctx.with_variable_mut(&scope, decl.name.value(), |symbol| symbol.ty = ty);
            }
            if let Some(setter_path) = &setter_path {
                ctx.with_variable_mut(setter_path, "value", |symbol| symbol.ty = ty);
            }
        });
    }
}

/// The declared type of a (virtual) property variable in `scope`.
fn property_type(ctx: &AnalysisContext, scope: &ScopePath, name: &str) -> ResolvedType {
    ctx.global
        .resolve_scope(scope)
        .and_then(|s| s.lookup_symbol(name))
        .and_then(SymbolHolder::as_variable)
        .map(|v| v.ty.clone())
        .unwrap_or_default()
}

/// Hoist a namespace: insert-or-find each segment's scope, then hoist the
/// nested script under the innermost one.
fn hoist_namespace(ctx: &mut AnalysisContext, scope: &ScopePath, def: Arc<Spanned<NamespaceDef>>) {
    let mut current = scope.clone();
    for segment in &def.value().segments {
        if let Some(target) = ctx.global.resolve_scope_mut(&current) {
            target.insert_scope(
                segment.value(),
                Some(ScopeLinkedNode::Namespace(def.clone())),
            );
        }
        current = current.join(segment.value());
    }
    ctx.push_hint(ComplementHint::ScopeRegion {
        scope: current.clone(),
        range: def.span(),
    });
    hoist_script(ctx, &current, &def.value().items);
}

/// Copy base members into a derived type's member scope (skipping
/// `private` members and the base's `this`), and inject `super` from the
/// first base's constructors.
fn copy_base_members(
    ctx: &mut AnalysisContext,
    declared_scope: &ScopePath,
    type_name: &Spanned<String>,
    members_path: &ScopePath,
    inject_super: bool,
) {
    let uri = ctx.uri();
    let Some(class) = ctx
        .find_symbol_in(&uri, declared_scope, type_name.value())
        .and_then(|f| f.holder.as_type().cloned())
    else {
        return;
    };

    for base in &class.bases {
        let Some(base_snapshot) = base.type_symbol() else {
            continue;
        };
        let live_base = ctx
            .live_type(base_snapshot)
            .unwrap_or_else(|| (**base_snapshot).clone());
        let Some(base_members) = &live_base.members_scope else {
            continue;
        };
        let Some(base_scope) = ctx.scope_in(&live_base.defined_in, base_members) else {
            continue;
        };
        let entries: Vec<(String, SymbolHolder)> = base_scope
            .symbols
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (member_name, holder) in entries {
            if member_name == "this" || member_name == *live_base.name.value() {
                continue;
            }
            match holder {
                SymbolHolder::Variable(variable) => {
                    if variable.access == AccessRestriction::Private {
                        continue;
                    }
                    let file_path = ctx.file_path();
                    let AnalysisContext {
                        global,
                        diagnostics,
                        ..
                    } = ctx;
                    if let Some(target) = global.resolve_scope_mut(members_path) {
                        if let Some(existing) = target.insert_symbol(Symbol::Variable(variable)) {
                            diagnostics.add(
                                Diagnostic::duplicate_declaration(
                                    file_path,
                                    &member_name,
                                    type_name.span(),
                                )
                                .with_related_span(
                                    existing.name_span(),
                                    "collides with an inherited member".to_string(),
                                ),
                            );
                        }
                    }
                }
                SymbolHolder::Functions(base_holder) => {
                    for overload in base_holder.overloads {
                        if overload.access == AccessRestriction::Private {
                            continue;
                        }
                        let overridden = ctx
                            .global
                            .resolve_scope(members_path)
                            .and_then(|s| s.lookup_symbol(&member_name))
                            .and_then(SymbolHolder::as_functions)
                            .is_some_and(|h| {
                                h.overloads
                                    .iter()
                                    .any(|own| same_parameter_types(own, &overload))
                            });
                        if overridden {
                            continue;
                        }
                        ctx.insert_symbol_silent(members_path, Symbol::Function(overload));
                    }
                }
                SymbolHolder::Type(_) => {}
            }
        }
    }

    if inject_super {
        if let Some(first_base) = class.bases.first().and_then(ResolvedType::type_symbol) {
            let live_base = ctx
                .live_type(first_base)
                .unwrap_or_else(|| (**first_base).clone());
            if let Some(base_members) = &live_base.members_scope {
                let constructors = ctx
                    .scope_in(&live_base.defined_in, base_members)
                    .and_then(|s| s.lookup_symbol(live_base.name.value()))
                    .and_then(SymbolHolder::as_functions)
                    .cloned();
                if let Some(constructors) = constructors {
                    for constructor in constructors.overloads {
                        if constructor.access == AccessRestriction::Private {
                            continue;
                        }
                        let mut cloned = constructor;
                        cloned.name = Spanned::new("super".to_string(), cloned.name.span());
                        ctx.insert_symbol_silent(members_path, Symbol::Function(cloned));
                    }
                }
            }
        }
    }
}

fn same_parameter_types(a: &FunctionSymbol, b: &FunctionSymbol) -> bool {
    a.params.len() == b.params.len()
        && a.params
            .iter()
            .zip(&b.params)
            .all(|(pa, pb)| pa.ty.same_type(&pb.ty))
}
