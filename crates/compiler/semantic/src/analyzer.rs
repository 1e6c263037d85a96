//! # Analyze Phase
//!
//! The second semantic pass: drains the task list built during hoist and
//! resolves statements and expressions against the finished scope tree —
//! name lookup, operator and overload resolution, member and namespace
//! access, type conformance. Every successful resolution records a
//! reference entry; every failure produces one diagnostic and an
//! unresolved type that propagates silently.

use std::sync::Arc;

use angelscript_diagnostics::{Diagnostic, DiagnosticCode};
use angelscript_parser::ast::{
    AccessRestriction, Argument, AssignOp, BinaryOp, Expression, PostfixOp, PrimitiveType,
    ScopePrefix, Span, Spanned, Statement, TypeName, UnaryOp, VarDecl,
};

use crate::context::{AnalysisContext, FoundSymbol};
use crate::hints::ComplementHint;
use crate::overloads::{
    assign_operator_method, best_overload, binary_operator_method, postfix_operator_method,
    select_overload, unary_operator_method, CallArg, OP_CALL, OP_CMP, OP_EQUALS, OP_INDEX,
};
use crate::scope::{ScopeLinkedNode, ScopePath};
use crate::symbol::{Symbol, SymbolHolder, TypeKind, TypeSymbol, VariableSymbol};
use crate::type_resolution::{analyze_type, conversion_rank, derives_from, resolve_scope_prefix};
use crate::types::ResolvedType;

// ===================
// Statements
// ===================

/// Analyze a statement list in `scope`; `return_type` is the enclosing
/// function's (or accessor's) declared return type.
pub(crate) fn analyze_statements(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    statements: &[Spanned<Statement>],
    return_type: &ResolvedType,
) {
    for statement in statements {
        analyze_statement(ctx, scope, statement, return_type);
    }
}

/// Analyze the deferred initializers of a hoisted (global or member)
/// variable declaration; `auto` declarations capture the initializer type
/// here and patch their symbols.
pub(crate) fn analyze_hoisted_var_initializers(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    def: &Arc<Spanned<VarDecl>>,
    is_auto: bool,
) {
    let decl = def.value();
    for declarator in &decl.declarators {
        let Some(init) = &declarator.init else { continue };
        let init_ty = analyze_expression(ctx, scope, init);
        if is_auto {
            ctx.push_hint(ComplementHint::AutoTypeResolution {
                auto_span: decl.type_expr.value().name.span(),
                resolved: init_ty.clone(),
            });
            ctx.with_variable_mut(scope, declarator.name.value(), |symbol| {
                symbol.ty = init_ty;
            });
        } else {
            let declared = ctx
                .global
                .resolve_scope(scope)
                .and_then(|s| s.lookup_symbol(declarator.name.value()))
                .and_then(SymbolHolder::as_variable)
                .map(|v| v.ty.clone())
                .unwrap_or_default();
            check_assignable(ctx, &declared, &init_ty, init.span());
        }
    }
}

fn analyze_statement(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    statement: &Spanned<Statement>,
    return_type: &ResolvedType,
) {
    match statement.value() {
        Statement::Block(statements) => {
            let child = enter_block_scope(ctx, scope, statement.span());
            analyze_statements(ctx, &child, statements, return_type);
        }
        Statement::Var(decl) => declare_local_var(ctx, scope, decl),
        Statement::If {
            condition,
            then_branch,
            else_branch,
        } => {
            check_condition(ctx, scope, condition);
            analyze_statement(ctx, scope, then_branch, return_type);
            if let Some(else_branch) = else_branch {
                analyze_statement(ctx, scope, else_branch, return_type);
            }
        }
        Statement::While { condition, body } => {
            check_condition(ctx, scope, condition);
            analyze_statement(ctx, scope, body, return_type);
        }
        Statement::DoWhile { body, condition } => {
            analyze_statement(ctx, scope, body, return_type);
            check_condition(ctx, scope, condition);
        }
        Statement::For {
            init,
            condition,
            increment,
            body,
        } => {
            // the init declaration is scoped to the whole for statement
            let child = enter_block_scope(ctx, scope, statement.span());
            if let Some(init) = init {
                analyze_statement(ctx, &child, init, return_type);
            }
            if let Some(condition) = condition {
                check_condition(ctx, &child, condition);
            }
            for step in increment {
                analyze_expression(ctx, &child, step);
            }
            analyze_statement(ctx, &child, body, return_type);
        }
        Statement::Switch { condition, cases } => {
            let condition_ty = analyze_expression(ctx, scope, condition);
            let switchable = condition_ty.is_unresolved()
                || condition_ty.is_integer()
                || condition_ty
                    .type_symbol()
                    .is_some_and(|s| s.kind == TypeKind::Enum);
            if !switchable {
                ctx.diagnostics.add(Diagnostic::type_mismatch(
                    ctx.file_path(),
                    "int",
                    &condition_ty.display(),
                    condition.span(),
                ));
            }
            for case in cases {
                if let Some(value) = &case.value {
                    analyze_expression(ctx, scope, value);
                }
                analyze_statements(ctx, scope, &case.body, return_type);
            }
        }
        Statement::Break | Statement::Continue => {}
        Statement::Return { value } => match value {
            Some(value) => {
                let value_ty = analyze_expression(ctx, scope, value);
                if return_type.is_void() && !value_ty.is_void() && !value_ty.is_unresolved() {
                    ctx.diagnostics.add(Diagnostic::type_mismatch(
                        ctx.file_path(),
                        "void",
                        &value_ty.display(),
                        value.span(),
                    ));
                } else {
                    check_assignable(ctx, return_type, &value_ty, value.span());
                }
            }
            None => {
                if !return_type.is_void() && !return_type.is_unresolved() {
                    ctx.diagnostics.add(Diagnostic::type_mismatch(
                        ctx.file_path(),
                        &return_type.display(),
                        "void",
                        statement.span(),
                    ));
                }
            }
        },
        Statement::Expression(expression) => {
            analyze_expression(ctx, scope, expression);
        }
    }
}

/// Create an anonymous child scope linked to a statement block and record
/// its region.
fn enter_block_scope(ctx: &mut AnalysisContext, scope: &ScopePath, span: Span) -> ScopePath {
    let name = ctx.global.next_anonymous_name();
    if let Some(parent) = ctx.global.resolve_scope_mut(scope) {
        parent.insert_scope(&name, Some(ScopeLinkedNode::Block(span)));
    }
    let child = scope.join(&name);
    ctx.push_hint(ComplementHint::ScopeRegion {
        scope: child.clone(),
        range: span,
    });
    child
}

/// Declare the variables of a local declaration statement; `auto` takes
/// the first initializer's type and emits the inlay hint.
fn declare_local_var(ctx: &mut AnalysisContext, scope: &ScopePath, decl: &VarDecl) {
    let is_auto = matches!(
        decl.type_expr.value().name.value(),
        TypeName::Primitive(PrimitiveType::Auto)
    );

    let ty = if is_auto {
        let resolved = decl
            .declarators
            .first()
            .and_then(|d| d.init.as_ref())
            .map(|init| analyze_expression(ctx, scope, init))
            .unwrap_or_default();
        ctx.push_hint(ComplementHint::AutoTypeResolution {
            auto_span: decl.type_expr.value().name.span(),
            resolved: resolved.clone(),
        });
        resolved
    } else {
        analyze_type(ctx, scope, &decl.type_expr)
    };

    for (i, declarator) in decl.declarators.iter().enumerate() {
        if let Some(init) = &declarator.init {
            // the first auto initializer was already analyzed to infer
            if !(is_auto && i == 0) {
                let init_ty = analyze_expression(ctx, scope, init);
                if !is_auto {
                    check_assignable(ctx, &ty, &init_ty, init.span());
                }
            }
        }
        let variable = VariableSymbol {
            name: declarator.name.clone(),
            defined_in: ctx.uri(),
            declared_scope: scope.clone(),
            ty: ty.clone(),
            is_instance_member: false,
            access: AccessRestriction::Public,
        };
        ctx.record_declaration(variable.location());
        ctx.insert_symbol_checked(scope, Symbol::Variable(variable));
    }
}

fn check_condition(ctx: &mut AnalysisContext, scope: &ScopePath, condition: &Spanned<Expression>) {
    let ty = analyze_expression(ctx, scope, condition);
    if !ty.is_unresolved() && !ty.is_bool() && !ty.is_numeric() {
        ctx.diagnostics.add(Diagnostic::type_mismatch(
            ctx.file_path(),
            "bool",
            &ty.display(),
            condition.span(),
        ));
    }
}

fn check_assignable(
    ctx: &mut AnalysisContext,
    expected: &ResolvedType,
    found: &ResolvedType,
    span: Span,
) {
    if conversion_rank(ctx, found, expected).is_none() {
        ctx.diagnostics.add(Diagnostic::type_mismatch(
            ctx.file_path(),
            &expected.display(),
            &found.display(),
            span,
        ));
    }
}

// ===================
// Expressions
// ===================

/// Evaluate an expression to its resolved type.
pub(crate) fn analyze_expression(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    expression: &Spanned<Expression>,
) -> ResolvedType {
    match expression.value() {
        Expression::IntLiteral(_) => ctx.primitive_type(PrimitiveType::Int),
        Expression::FloatLiteral(_) => ctx.primitive_type(PrimitiveType::Double),
        Expression::BoolLiteral(_) => ctx.primitive_type(PrimitiveType::Bool),
        Expression::StringLiteral(_) => string_literal_type(ctx, scope),
        Expression::NullLiteral => ResolvedType::unresolved(),
        Expression::This => match ctx.find_symbol(scope, "this") {
            Some(found) => match found.holder {
                SymbolHolder::Variable(variable) => variable.ty,
                _ => ResolvedType::unresolved(),
            },
            None => {
                ctx.diagnostics.add(Diagnostic::unresolved_name(
                    ctx.file_path(),
                    "this",
                    expression.span(),
                ));
                ResolvedType::unresolved()
            }
        },
        Expression::Identifier {
            scope: prefix,
            name,
        } => analyze_identifier(ctx, scope, prefix.as_ref(), name),
        Expression::Unary { op, expr } => analyze_unary(ctx, scope, *op, expr),
        Expression::Postfix { op, expr } => analyze_postfix(ctx, scope, *op, expr),
        Expression::Binary { op, left, right } => {
            analyze_binary(ctx, scope, *op, left, right, expression.span())
        }
        Expression::Assign { op, lhs, rhs } => analyze_assignment(ctx, scope, *op, lhs, rhs),
        Expression::Ternary {
            condition,
            then_expr,
            else_expr,
        } => {
            check_condition(ctx, scope, condition);
            let then_ty = analyze_expression(ctx, scope, then_expr);
            let else_ty = analyze_expression(ctx, scope, else_expr);
            if then_ty.same_type(&else_ty) || else_ty.is_unresolved() {
                then_ty
            } else if then_ty.is_unresolved() {
                else_ty
            } else if conversion_rank(ctx, &else_ty, &then_ty).is_some() {
                then_ty
            } else if conversion_rank(ctx, &then_ty, &else_ty).is_some() {
                else_ty
            } else {
                ctx.diagnostics.add(Diagnostic::type_mismatch(
                    ctx.file_path(),
                    &then_ty.display(),
                    &else_ty.display(),
                    else_expr.span(),
                ));
                ResolvedType::unresolved()
            }
        }
        Expression::Call {
            callee,
            args,
            args_span,
        } => analyze_call(ctx, scope, callee, args, *args_span),
        Expression::MemberAccess {
            object,
            dot_span,
            member,
        } => analyze_member_access(ctx, scope, object, *dot_span, member),
        Expression::Index { object, index } => analyze_index(ctx, scope, object, index),
        Expression::Cast { target, expr } => {
            analyze_expression(ctx, scope, expr);
            analyze_type(ctx, scope, target)
        }
    }
}

/// The type a string literal takes: the first resolvable configured
/// string type.
fn string_literal_type(ctx: &mut AnalysisContext, scope: &ScopePath) -> ResolvedType {
    let names = ctx.settings.builtin_string_types.clone();
    for name in names {
        if let Some(FoundSymbol { holder, .. }) = ctx.find_symbol(scope, &name) {
            if let SymbolHolder::Type(symbol) = holder {
                return ResolvedType::from_type(Arc::new(symbol));
            }
        }
    }
    ResolvedType::unresolved()
}

/// Resolve a (possibly scope-qualified) identifier used as a value.
fn analyze_identifier(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    prefix: Option<&ScopePrefix>,
    name: &Spanned<String>,
) -> ResolvedType {
    let found = match prefix {
        Some(prefix) => match resolve_scope_prefix(ctx, scope, prefix, name.span()) {
            Some((uri, path)) => ctx.find_symbol_in(&uri, &path, name.value()),
            None => return ResolvedType::unresolved(),
        },
        None => ctx.find_symbol(scope, name.value()),
    };

    match found {
        Some(found) => {
            ctx.record_reference(name.span(), found.holder.location());
            match found.holder {
                SymbolHolder::Variable(variable) => {
                    check_access(ctx, scope, &variable, name.value(), name.span());
                    variable.ty
                }
                SymbolHolder::Functions(holder) => {
                    ResolvedType::from_funcdef(Arc::new(holder.first().clone()))
                }
                // a bare type name has no value; constructor calls are
                // handled at the call site
                SymbolHolder::Type(_) => ResolvedType::unresolved(),
            }
        }
        None => {
            ctx.diagnostics.add(Diagnostic::unresolved_name(
                ctx.file_path(),
                name.value(),
                name.span(),
            ));
            ResolvedType::unresolved()
        }
    }
}

fn analyze_unary(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    op: UnaryOp,
    operand: &Spanned<Expression>,
) -> ResolvedType {
    let ty = analyze_expression(ctx, scope, operand);
    if ty.is_unresolved() {
        return ty;
    }
    match op {
        UnaryOp::Not => ctx.primitive_type(PrimitiveType::Bool),
        UnaryOp::HandleOf => {
            let mut handle = ty;
            handle.modifiers.is_handle = true;
            handle
        }
        UnaryOp::Plus => ty,
        UnaryOp::Neg | UnaryOp::BitNot | UnaryOp::PreInc | UnaryOp::PreDec => {
            if ty.is_numeric() {
                return ty;
            }
            if ty.is_object() {
                if let Some(method) = unary_operator_method(op) {
                    if let Some(result) = try_operator_call(ctx, &ty, method, &[]) {
                        return result;
                    }
                }
            }
            ctx.diagnostics.add(Diagnostic::type_mismatch(
                ctx.file_path(),
                "a numeric type",
                &ty.display(),
                operand.span(),
            ));
            ResolvedType::unresolved()
        }
    }
}

fn analyze_postfix(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    op: PostfixOp,
    operand: &Spanned<Expression>,
) -> ResolvedType {
    let ty = analyze_expression(ctx, scope, operand);
    if ty.is_unresolved() || ty.is_numeric() {
        return ty;
    }
    if ty.is_object() {
        if let Some(result) = try_operator_call(ctx, &ty, postfix_operator_method(op), &[]) {
            return result;
        }
    }
    ctx.diagnostics.add(Diagnostic::type_mismatch(
        ctx.file_path(),
        "a numeric type",
        &ty.display(),
        operand.span(),
    ));
    ResolvedType::unresolved()
}

fn analyze_binary(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    op: BinaryOp,
    left: &Spanned<Expression>,
    right: &Spanned<Expression>,
    span: Span,
) -> ResolvedType {
    let left_ty = analyze_expression(ctx, scope, left);
    let right_ty = analyze_expression(ctx, scope, right);

    match op {
        BinaryOp::Is | BinaryOp::NotIs | BinaryOp::LogAnd | BinaryOp::LogOr => {
            ctx.primitive_type(PrimitiveType::Bool)
        }
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            analyze_comparison(ctx, op, &left_ty, &right_ty, span)
        }
        _ => {
            if left_ty.is_unresolved() || right_ty.is_unresolved() {
                return ResolvedType::unresolved();
            }
            if left_ty.is_numeric() && right_ty.is_numeric() {
                return promote_numeric(ctx, &left_ty, &right_ty);
            }
            // string concatenation works even when the string class
            // declares no opAdd of its own
            if op == BinaryOp::Add
                && left_ty.same_type(&right_ty)
                && is_string_type(ctx, &left_ty)
            {
                return left_ty;
            }
            if let Some((method, reversed)) = binary_operator_method(op) {
                if left_ty.is_object() {
                    let arg = operator_arg(&right_ty, right.span());
                    if let Some(result) = try_operator_call(ctx, &left_ty, method, &[arg]) {
                        return result;
                    }
                }
                if right_ty.is_object() {
                    let arg = operator_arg(&left_ty, left.span());
                    if let Some(result) = try_operator_call(ctx, &right_ty, reversed, &[arg]) {
                        return result;
                    }
                }
            }
            ctx.diagnostics.add(
                Diagnostic::error(
                    DiagnosticCode::TypeMismatch,
                    ctx.file_path(),
                    format!(
                        "No operator defined between '{}' and '{}'",
                        left_ty.display(),
                        right_ty.display()
                    ),
                )
                .with_location(span),
            );
            ResolvedType::unresolved()
        }
    }
}

fn analyze_comparison(
    ctx: &mut AnalysisContext,
    op: BinaryOp,
    left_ty: &ResolvedType,
    right_ty: &ResolvedType,
    span: Span,
) -> ResolvedType {
    let bool_ty = ctx.primitive_type(PrimitiveType::Bool);
    if left_ty.is_unresolved() || right_ty.is_unresolved() {
        return bool_ty;
    }
    if !left_ty.is_object()
        && !right_ty.is_object()
        && (conversion_rank(ctx, left_ty, right_ty).is_some()
            || conversion_rank(ctx, right_ty, left_ty).is_some())
    {
        return bool_ty;
    }
    if left_ty.is_object() || right_ty.is_object() {
        let method = if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            OP_EQUALS
        } else {
            OP_CMP
        };
        if left_ty.is_object() {
            let arg = operator_arg(right_ty, span);
            if try_operator_call(ctx, left_ty, method, &[arg]).is_some() {
                return bool_ty;
            }
        }
        // `a == b` may also try `b.opEquals(a)`
        if right_ty.is_object() {
            let arg = operator_arg(left_ty, span);
            if try_operator_call(ctx, right_ty, method, &[arg]).is_some() {
                return bool_ty;
            }
        }
    }
    ctx.diagnostics.add(
        Diagnostic::error(
            DiagnosticCode::TypeMismatch,
            ctx.file_path(),
            format!(
                "Cannot compare '{}' with '{}'",
                left_ty.display(),
                right_ty.display()
            ),
        )
        .with_location(span),
    );
    bool_ty
}

fn analyze_assignment(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    op: AssignOp,
    lhs: &Spanned<Expression>,
    rhs: &Spanned<Expression>,
) -> ResolvedType {
    let lhs_ty = analyze_expression(ctx, scope, lhs);
    let rhs_ty = analyze_expression(ctx, scope, rhs);
    if lhs_ty.is_unresolved() || rhs_ty.is_unresolved() {
        return lhs_ty;
    }

    if lhs_ty.is_object() {
        let arg = operator_arg(&rhs_ty, rhs.span());
        if try_operator_call(ctx, &lhs_ty, assign_operator_method(op), &[arg]).is_some() {
            return lhs_ty;
        }
        if op == AssignOp::Assign && conversion_rank(ctx, &rhs_ty, &lhs_ty).is_some() {
            return lhs_ty;
        }
    } else if op == AssignOp::Assign {
        check_assignable(ctx, &lhs_ty, &rhs_ty, rhs.span());
        return lhs_ty;
    } else if lhs_ty.is_numeric() && rhs_ty.is_numeric() {
        return lhs_ty;
    } else if lhs_ty.same_type(&rhs_ty) {
        // string += string and friends
        return lhs_ty;
    }

    ctx.diagnostics.add(Diagnostic::type_mismatch(
        ctx.file_path(),
        &lhs_ty.display(),
        &rhs_ty.display(),
        rhs.span(),
    ));
    lhs_ty
}

// ===================
// Calls and member access
// ===================

fn analyze_arguments(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    args: &[Argument],
) -> Vec<CallArg> {
    args.iter()
        .map(|arg| CallArg {
            name: arg.name.clone(),
            ty: analyze_expression(ctx, scope, &arg.value),
            span: arg.value.span(),
        })
        .collect()
}

fn analyze_call(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    callee: &Spanned<Expression>,
    args: &[Argument],
    args_span: Span,
) -> ResolvedType {
    match callee.value() {
        Expression::Identifier {
            scope: prefix,
            name,
        } => {
            let call_args = analyze_arguments(ctx, scope, args);
            let found = match prefix {
                Some(prefix) => match resolve_scope_prefix(ctx, scope, prefix, name.span()) {
                    Some((uri, path)) => ctx.find_symbol_in(&uri, &path, name.value()),
                    None => return ResolvedType::unresolved(),
                },
                None => ctx.find_symbol(scope, name.value()),
            };
            let Some(found) = found else {
                ctx.diagnostics.add(Diagnostic::unresolved_name(
                    ctx.file_path(),
                    name.value(),
                    name.span(),
                ));
                return ResolvedType::unresolved();
            };
            match found.holder {
                SymbolHolder::Functions(holder) => {
                    match select_overload(ctx, &holder, None, &call_args, name.span(), args_span) {
                        Some(chosen) => chosen.return_type,
                        None => ResolvedType::unresolved(),
                    }
                }
                SymbolHolder::Type(symbol) => {
                    ctx.record_reference(name.span(), symbol.location());
                    construct_type(ctx, symbol, &call_args, name.span(), args_span)
                }
                SymbolHolder::Variable(variable) => {
                    ctx.record_reference(name.span(), variable.location());
                    call_value(ctx, &variable.ty, &call_args, name.span(), args_span)
                }
            }
        }
        Expression::MemberAccess {
            object,
            dot_span,
            member,
        } => {
            let object_ty = analyze_expression(ctx, scope, object);
            if !object_ty.is_unresolved() {
                ctx.push_hint(ComplementHint::AutocompleteInstanceMember {
                    caret_range: Span::from(dot_span.start..member.span().end),
                    target_type: object_ty.clone(),
                });
            }
            let call_args = analyze_arguments(ctx, scope, args);
            let Some(found) = lookup_member(ctx, &object_ty, member.value()) else {
                if !object_ty.is_unresolved() {
                    ctx.diagnostics.add(Diagnostic::unresolved_name(
                        ctx.file_path(),
                        member.value(),
                        member.span(),
                    ));
                }
                return ResolvedType::unresolved();
            };
            match found.holder {
                SymbolHolder::Functions(holder) => {
                    if let Some(first) = holder.overloads.first() {
                        check_access_of(
                            ctx,
                            scope,
                            first.access,
                            &first.declared_scope,
                            &first.defined_in,
                            member.value(),
                            member.span(),
                        );
                    }
                    let translator = object_ty.translator.clone();
                    match select_overload(
                        ctx,
                        &holder,
                        translator.as_ref(),
                        &call_args,
                        member.span(),
                        args_span,
                    ) {
                        Some(chosen) => chosen.return_type.substituted(translator.as_ref()),
                        None => ResolvedType::unresolved(),
                    }
                }
                SymbolHolder::Variable(variable) => {
                    ctx.record_reference(member.span(), variable.location());
                    let value_ty = variable.ty.substituted(object_ty.translator.as_ref());
                    call_value(ctx, &value_ty, &call_args, member.span(), args_span)
                }
                SymbolHolder::Type(_) => {
                    ctx.diagnostics.add(not_callable(ctx, member.value(), member.span()));
                    ResolvedType::unresolved()
                }
            }
        }
        _ => {
            let callee_ty = analyze_expression(ctx, scope, callee);
            let call_args = analyze_arguments(ctx, scope, args);
            if callee_ty.is_unresolved() {
                return ResolvedType::unresolved();
            }
            call_value(ctx, &callee_ty, &call_args, callee.span(), args_span)
        }
    }
}

/// Call something that already evaluated to a value: a funcdef handle or
/// an object with `opCall`.
fn call_value(
    ctx: &mut AnalysisContext,
    value_ty: &ResolvedType,
    args: &[CallArg],
    caller_span: Span,
    args_span: Span,
) -> ResolvedType {
    if let Some(funcdef) = value_ty.funcdef_symbol() {
        let holder = crate::symbol::FunctionHolder::new((**funcdef).clone());
        return match select_overload(ctx, &holder, None, args, caller_span, args_span) {
            Some(chosen) => chosen.return_type,
            None => ResolvedType::unresolved(),
        };
    }
    if value_ty.is_object() {
        if let Some(found) = lookup_member(ctx, value_ty, OP_CALL) {
            if let SymbolHolder::Functions(holder) = found.holder {
                let translator = value_ty.translator.clone();
                return match select_overload(
                    ctx,
                    &holder,
                    translator.as_ref(),
                    args,
                    caller_span,
                    args_span,
                ) {
                    Some(chosen) => chosen.return_type.substituted(translator.as_ref()),
                    None => ResolvedType::unresolved(),
                };
            }
        }
    }
    ctx.diagnostics
        .add(not_callable(ctx, &value_ty.display(), caller_span));
    ResolvedType::unresolved()
}

/// A constructor call `TypeName(args)`. Classes check against their
/// declared constructors; primitives and enums act as conversion calls.
fn construct_type(
    ctx: &mut AnalysisContext,
    symbol: TypeSymbol,
    args: &[CallArg],
    caller_span: Span,
    args_span: Span,
) -> ResolvedType {
    let result = ResolvedType::from_type(Arc::new(symbol.clone()));
    if !matches!(symbol.kind, TypeKind::Class) {
        return result;
    }
    let constructors = symbol
        .members_scope
        .as_ref()
        .and_then(|members| {
            ctx.scope_in(&symbol.defined_in, members)
                .and_then(|s| s.lookup_symbol(symbol.name.value()))
                .and_then(SymbolHolder::as_functions)
                .cloned()
        });
    match constructors {
        Some(holder) => {
            if select_overload(ctx, &holder, None, args, caller_span, args_span).is_none() {
                return ResolvedType::unresolved();
            }
            result
        }
        // no declared constructor: only the implicit default exists
        None => {
            if !args.is_empty() {
                ctx.diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::NoMatchingOverload,
                        ctx.file_path(),
                        format!(
                            "'{}' has no constructor taking arguments",
                            symbol.name.value()
                        ),
                    )
                    .with_location(args_span),
                );
            }
            result
        }
    }
}

/// Member access used as a value (`expr.member`).
fn analyze_member_access(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    object: &Spanned<Expression>,
    dot_span: Span,
    member: &Spanned<String>,
) -> ResolvedType {
    let object_ty = analyze_expression(ctx, scope, object);
    if object_ty.is_unresolved() {
        return ResolvedType::unresolved();
    }
    ctx.push_hint(ComplementHint::AutocompleteInstanceMember {
        caret_range: Span::from(dot_span.start..member.span().end),
        target_type: object_ty.clone(),
    });

    match lookup_member(ctx, &object_ty, member.value()) {
        Some(found) => {
            ctx.record_reference(member.span(), found.holder.location());
            match found.holder {
                SymbolHolder::Variable(variable) => {
                    check_access(ctx, scope, &variable, member.value(), member.span());
                    variable.ty.substituted(object_ty.translator.as_ref())
                }
                SymbolHolder::Functions(holder) => {
                    ResolvedType::from_funcdef(Arc::new(holder.first().clone()))
                }
                SymbolHolder::Type(_) => ResolvedType::unresolved(),
            }
        }
        None => {
            ctx.diagnostics.add(Diagnostic::unresolved_name(
                ctx.file_path(),
                member.value(),
                member.span(),
            ));
            ResolvedType::unresolved()
        }
    }
}

fn analyze_index(
    ctx: &mut AnalysisContext,
    scope: &ScopePath,
    object: &Spanned<Expression>,
    index: &Spanned<Expression>,
) -> ResolvedType {
    let object_ty = analyze_expression(ctx, scope, object);
    let index_ty = analyze_expression(ctx, scope, index);
    if object_ty.is_unresolved() {
        return ResolvedType::unresolved();
    }

    if object_ty.is_object() {
        let arg = operator_arg(&index_ty, index.span());
        if let Some(result) = try_operator_call(ctx, &object_ty, OP_INDEX, &[arg]) {
            return result;
        }
    }
    if object_ty.modifiers.is_array {
        let mut element = object_ty;
        element.modifiers.is_array = false;
        return element;
    }
    ctx.diagnostics.add(
        Diagnostic::error(
            DiagnosticCode::TypeMismatch,
            ctx.file_path(),
            format!("'{}' cannot be indexed", object_ty.display()),
        )
        .with_location(object.span()),
    );
    ResolvedType::unresolved()
}

// ===================
// Member lookup and access control
// ===================

/// Shallow lookup in the type's members scope, then through its bases.
pub(crate) fn lookup_member(
    ctx: &AnalysisContext,
    ty: &ResolvedType,
    name: &str,
) -> Option<FoundSymbol> {
    fn walk(
        ctx: &AnalysisContext,
        symbol: &TypeSymbol,
        name: &str,
        depth: u32,
    ) -> Option<FoundSymbol> {
        if depth > 16 {
            return None;
        }
        let live = ctx.live_type(symbol).unwrap_or_else(|| symbol.clone());
        if let Some(members) = &live.members_scope {
            if let Some(found) = ctx.find_symbol_in(&live.defined_in, members, name) {
                return Some(found);
            }
        }
        for base in &live.bases {
            if let Some(base_symbol) = base.type_symbol() {
                if let Some(found) = walk(ctx, base_symbol, name, depth + 1) {
                    return Some(found);
                }
            }
        }
        None
    }
    walk(ctx, ty.type_symbol()?, name, 0)
}

/// Try `target.method(args)` without emitting diagnostics; used by
/// operator resolution. Returns the (translator-substituted) return type
/// when an overload fits.
fn try_operator_call(
    ctx: &mut AnalysisContext,
    target: &ResolvedType,
    method: &str,
    args: &[CallArg],
) -> Option<ResolvedType> {
    let found = lookup_member(ctx, target, method)?;
    let SymbolHolder::Functions(holder) = found.holder else {
        return None;
    };
    let translator = target.translator.clone();
    let chosen = best_overload(ctx, &holder, translator.as_ref(), args).ok()?;
    Some(chosen.return_type.substituted(translator.as_ref()))
}

fn operator_arg(ty: &ResolvedType, span: Span) -> CallArg {
    CallArg {
        name: None,
        ty: ty.clone(),
        span,
    }
}

fn check_access(
    ctx: &mut AnalysisContext,
    use_scope: &ScopePath,
    variable: &VariableSymbol,
    name: &str,
    span: Span,
) {
    check_access_of(
        ctx,
        use_scope,
        variable.access,
        &variable.declared_scope,
        &variable.defined_in,
        name,
        span,
    );
}

/// Enforce `private`/`protected` (§7 access violation). Private members
/// are visible within the declaring class's body; protected members also
/// within derived classes.
fn check_access_of(
    ctx: &mut AnalysisContext,
    use_scope: &ScopePath,
    access: AccessRestriction,
    declared_scope: &ScopePath,
    defined_in: &Arc<str>,
    name: &str,
    span: Span,
) {
    let allowed = match access {
        AccessRestriction::Public => true,
        AccessRestriction::Private => {
            *defined_in == ctx.uri() && use_scope.starts_with(declared_scope)
        }
        AccessRestriction::Protected => {
            (*defined_in == ctx.uri() && use_scope.starts_with(declared_scope))
                || enclosing_class(ctx, use_scope).is_some_and(|enclosing| {
                    declaring_class(ctx, declared_scope, defined_in).is_some_and(|declaring| {
                        derives_from(ctx, &enclosing, &declaring)
                            || crate::type_resolution::type_identity_eq(&enclosing, &declaring)
                    })
                })
        }
    };
    if !allowed {
        ctx.diagnostics
            .add(Diagnostic::access_violation(ctx.file_path(), name, span));
    }
}

/// The innermost class whose members scope encloses `path`, if any.
fn enclosing_class(ctx: &AnalysisContext, path: &ScopePath) -> Option<TypeSymbol> {
    let mut cursor = Some(path.clone());
    while let Some(current) = cursor {
        if let Some(found) = class_of_members_scope(ctx, &current, &ctx.uri()) {
            return Some(found);
        }
        cursor = current.parent();
    }
    None
}

/// The class declared at `members_scope` (its type symbol lives one scope
/// up under the same name).
fn declaring_class(
    ctx: &AnalysisContext,
    members_scope: &ScopePath,
    uri: &Arc<str>,
) -> Option<TypeSymbol> {
    class_of_members_scope(ctx, members_scope, uri)
}

fn class_of_members_scope(
    ctx: &AnalysisContext,
    path: &ScopePath,
    uri: &Arc<str>,
) -> Option<TypeSymbol> {
    let name = path.last()?;
    let parent = path.parent()?;
    let holder = ctx
        .global_by_uri(uri)?
        .resolve_scope(&parent)?
        .lookup_symbol(name)?;
    let symbol = holder.as_type()?;
    if symbol.members_scope.as_ref() == Some(path)
        && matches!(symbol.kind, TypeKind::Class | TypeKind::Interface)
    {
        Some(symbol.clone())
    } else {
        None
    }
}

fn is_string_type(ctx: &AnalysisContext, ty: &ResolvedType) -> bool {
    ty.type_symbol().is_some_and(|symbol| {
        ctx.settings
            .builtin_string_types
            .iter()
            .any(|name| name == symbol.name.value())
    })
}

fn not_callable(ctx: &AnalysisContext, what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticCode::NotCallable,
        ctx.file_path(),
        format!("'{what}' is not callable"),
    )
    .with_location(span)
}

/// Numeric promotion for builtin operators.
fn promote_numeric(
    ctx: &AnalysisContext,
    left: &ResolvedType,
    right: &ResolvedType,
) -> ResolvedType {
    const ORDER: &[PrimitiveType] = &[
        PrimitiveType::Double,
        PrimitiveType::Float,
        PrimitiveType::UInt64,
        PrimitiveType::Int64,
        PrimitiveType::UInt,
    ];
    let lp = left.primitive();
    let rp = right.primitive();
    for candidate in ORDER {
        if lp == Some(*candidate) || rp == Some(*candidate) {
            return ctx.primitive_type(*candidate);
        }
    }
    ctx.primitive_type(PrimitiveType::Int)
}
