//! # Overload Selection
//!
//! Scores call candidates by the implicit conversions their arguments
//! need, applies the tie-breaks, and emits the call-site diagnostics and
//! signature-help hints. Also owns the operator-method table shared with
//! expression analysis.

use std::sync::Arc;

use angelscript_diagnostics::{Diagnostic, DiagnosticCode};
use angelscript_parser::ast::{AssignOp, BinaryOp, PostfixOp, Span, Spanned, UnaryOp};

use crate::context::AnalysisContext;
use crate::symbol::{FunctionHolder, FunctionSymbol};
use crate::type_resolution::conversion_rank;
use crate::types::{ResolvedType, TemplateTranslator};

/// One analyzed call argument.
#[derive(Debug, Clone)]
pub(crate) struct CallArg {
    pub name: Option<Spanned<String>>,
    pub ty: ResolvedType,
    pub span: Span,
}

/// Why no overload was chosen.
#[derive(Debug)]
pub(crate) enum OverloadError {
    NoMatch,
    Ambiguous,
}

/// Pick the best overload without emitting diagnostics. Candidates are
/// scored `(conversion count, total rank, is-template)`; an exact tie on
/// that key is ambiguous, otherwise declaration order decides the stable
/// winner.
pub(crate) fn best_overload(
    ctx: &AnalysisContext,
    holder: &FunctionHolder,
    translator: Option<&Arc<TemplateTranslator>>,
    args: &[CallArg],
) -> Result<FunctionSymbol, OverloadError> {
    let mut candidates: Vec<(u32, u32, u32, usize)> = Vec::new();

    'overloads: for (index, overload) in holder.overloads.iter().enumerate() {
        let params = &overload.params;
        let mut bound: Vec<Option<&CallArg>> = vec![None; params.len()];
        let mut positional = 0usize;

        for arg in args {
            match &arg.name {
                None => {
                    if positional >= params.len() {
                        continue 'overloads;
                    }
                    bound[positional] = Some(arg);
                    positional += 1;
                }
                Some(name) => {
                    let slot = params
                        .iter()
                        .position(|p| p.name.as_deref() == Some(name.value().as_str()));
                    match slot {
                        Some(i) if bound[i].is_none() => bound[i] = Some(arg),
                        _ => continue 'overloads,
                    }
                }
            }
        }

        let mut conversions = 0u32;
        let mut cost = 0u32;
        for (param, slot) in params.iter().zip(&bound) {
            match slot {
                Some(arg) => {
                    let param_ty = param.ty.substituted(translator);
                    match conversion_rank(ctx, &arg.ty, &param_ty) {
                        Some(0) => {}
                        Some(rank) => {
                            conversions += 1;
                            cost += rank;
                        }
                        None => continue 'overloads,
                    }
                }
                None => {
                    if !param.has_default {
                        continue 'overloads;
                    }
                }
            }
        }

        let is_template = u32::from(!overload.template_params.is_empty());
        candidates.push((conversions, cost, is_template, index));
    }

    candidates.sort_by_key(|(conversions, cost, template, index)| {
        (*conversions, *cost, *template, *index)
    });
    match candidates.as_slice() {
        [] => Err(OverloadError::NoMatch),
        [only] => Ok(holder.overloads[only.3].clone()),
        [first, second, ..] => {
            if (first.0, first.1, first.2) == (second.0, second.1, second.2) {
                Err(OverloadError::Ambiguous)
            } else {
                Ok(holder.overloads[first.3].clone())
            }
        }
    }
}

/// Resolve a call site (§4.4): validate named arguments, pick the
/// overload, diagnose failures with an overload-set dump, and emit the
/// signature-help hint plus the reference entry.
pub(crate) fn select_overload(
    ctx: &mut AnalysisContext,
    holder: &FunctionHolder,
    translator: Option<&Arc<TemplateTranslator>>,
    args: &[CallArg],
    caller_span: Span,
    args_range: Span,
) -> Option<FunctionSymbol> {
    // duplicate named arguments are wrong for every overload
    for (i, arg) in args.iter().enumerate() {
        if let Some(name) = &arg.name {
            let duplicated = args[..i]
                .iter()
                .any(|prev| prev.name.as_ref().is_some_and(|p| p.value() == name.value()));
            if duplicated {
                ctx.diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::InvalidNamedArgument,
                        ctx.file_path(),
                        format!("Duplicate named argument '{}'", name.value()),
                    )
                    .with_location(name.span()),
                );
            }
        }
    }

    ctx.push_hint(crate::hints::ComplementHint::FunctionCall {
        caller_span,
        arg_spans: args.iter().map(|arg| arg.span).collect(),
        args_range,
        callee: holder.clone(),
        translator: translator.cloned(),
    });

    match best_overload(ctx, holder, translator, args) {
        Ok(chosen) => {
            ctx.record_reference(caller_span, chosen.location());
            Some(chosen)
        }
        Err(OverloadError::NoMatch) => {
            let dump = holder
                .overloads
                .iter()
                .map(FunctionSymbol::signature)
                .collect::<Vec<_>>()
                .join("\n  ");
            ctx.diagnostics.add(
                Diagnostic::error(
                    DiagnosticCode::NoMatchingOverload,
                    ctx.file_path(),
                    format!(
                        "No overload of '{}' matches these arguments; candidates:\n  {dump}",
                        holder.first().name.value()
                    ),
                )
                .with_location(caller_span),
            );
            None
        }
        Err(OverloadError::Ambiguous) => {
            ctx.diagnostics.add(
                Diagnostic::error(
                    DiagnosticCode::AmbiguousCall,
                    ctx.file_path(),
                    format!("Ambiguous call to '{}'", holder.first().name.value()),
                )
                .with_location(caller_span),
            );
            None
        }
    }
}

// ===================
// Operator-method table
// ===================

/// Binary operator to its `(method, reversed-method)` pair.
pub(crate) const fn binary_operator_method(op: BinaryOp) -> Option<(&'static str, &'static str)> {
    Some(match op {
        BinaryOp::Add => ("opAdd", "opAdd_r"),
        BinaryOp::Sub => ("opSub", "opSub_r"),
        BinaryOp::Mul => ("opMul", "opMul_r"),
        BinaryOp::Div => ("opDiv", "opDiv_r"),
        BinaryOp::Mod => ("opMod", "opMod_r"),
        BinaryOp::Pow => ("opPow", "opPow_r"),
        BinaryOp::BitAnd => ("opAnd", "opAnd_r"),
        BinaryOp::BitOr => ("opOr", "opOr_r"),
        BinaryOp::BitXor => ("opXor", "opXor_r"),
        BinaryOp::Shl => ("opShl", "opShl_r"),
        BinaryOp::Shr => ("opShr", "opShr_r"),
        BinaryOp::UShr => ("opUShr", "opUShr_r"),
        _ => return None,
    })
}

pub(crate) const fn assign_operator_method(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "opAssign",
        AssignOp::Add => "opAddAssign",
        AssignOp::Sub => "opSubAssign",
        AssignOp::Mul => "opMulAssign",
        AssignOp::Div => "opDivAssign",
        AssignOp::Mod => "opModAssign",
        AssignOp::Pow => "opPowAssign",
        AssignOp::And => "opAndAssign",
        AssignOp::Or => "opOrAssign",
        AssignOp::Xor => "opXorAssign",
        AssignOp::Shl => "opShlAssign",
        AssignOp::Shr => "opShrAssign",
        AssignOp::UShr => "opUShrAssign",
    }
}

pub(crate) const fn unary_operator_method(op: UnaryOp) -> Option<&'static str> {
    Some(match op {
        UnaryOp::Neg => "opNeg",
        UnaryOp::BitNot => "opCom",
        UnaryOp::PreInc => "opPreInc",
        UnaryOp::PreDec => "opPreDec",
        _ => return None,
    })
}

pub(crate) const fn postfix_operator_method(op: PostfixOp) -> &'static str {
    match op {
        PostfixOp::Inc => "opPostInc",
        PostfixOp::Dec => "opPostDec",
    }
}

/// Method names for equality, ordering, indexing and calling.
pub(crate) const OP_EQUALS: &str = "opEquals";
pub(crate) const OP_CMP: &str = "opCmp";
pub(crate) const OP_INDEX: &str = "opIndex";
pub(crate) const OP_CALL: &str = "opCall";
