//! # AngelScript Parser
//!
//! A recursive descent parser for AngelScript built from `chumsky` parser
//! combinators over the token stream produced by [`crate::tokenize`] and
//! [`crate::preprocess`].
//!
//! The parser is tolerant in the sense the analyzer needs: it produces syntax
//! diagnostics with precise spans and an empty module when a file cannot be
//! parsed, and the semantic passes recover from every unresolved construct
//! on their own. Shift operators (`>>`, `>>=`, `>>>`) are reassembled here
//! from consecutive `>` tokens because the lexer keeps them split for nested
//! template argument lists.

use std::sync::Arc;

use angelscript_diagnostics::Diagnostic;
use chumsky::input::ValueInput;
use chumsky::prelude::*;

use crate::ast::*;
use crate::tokens::TokenKind;

type ParserErr<'t> = extra::Err<Rich<'t, TokenKind>>;

/// Output from the parsing process, including both AST and diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub module: ParsedModule,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub const fn new(module: ParsedModule, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            module,
            diagnostics,
        }
    }
}

/// Parse a preprocessed token stream into a module AST with diagnostics.
pub fn parse_tokens(
    tokens: Vec<(TokenKind, Span)>,
    source_len: usize,
    file_path: &str,
) -> ParseOutput {
    let token_stream = chumsky::input::Stream::from_iter(tokens)
        .map((0..source_len).into(), |(t, s): (_, _)| (t, s));

    match script_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
    {
        Ok(items) => ParseOutput::new(ParsedModule::new(items), Vec::new()),
        Err(parse_errors) => {
            let diagnostics = parse_errors
                .into_iter()
                .map(|error| {
                    Diagnostic::syntax_error(file_path.to_string(), format!("{error}"), *error.span())
                })
                .collect();
            ParseOutput::new(ParsedModule::default(), diagnostics)
        }
    }
}

// ===================
// Small shared pieces
// ===================

/// Creates an identifier parser that extracts the identifier text
fn ident<'t, I>() -> impl Parser<'t, I, String, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
{
    select! { TokenKind::Identifier(s) => s }.labelled("identifier")
}

/// Creates a spanned identifier parser
fn spanned_ident<'t, I>() -> impl Parser<'t, I, Spanned<String>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
{
    ident()
        .map_with(|s, extra| Spanned::new(s, extra.span()))
        .labelled("identifier")
}

/// Matches an identifier with a fixed text (`get`, `set`, `property`, ...).
///
/// These words are not reserved in AngelScript, so they stay ordinary
/// identifier tokens and are recognized contextually.
fn soft_keyword<'t, I>(word: &'static str) -> impl Parser<'t, I, (), ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
{
    select! { TokenKind::Identifier(s) if s == word => () }.labelled(word)
}

/// `private` / `protected` prefix; absent means public.
fn access_modifier<'t, I>() -> impl Parser<'t, I, AccessRestriction, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
{
    choice((
        just(TokenKind::Private).to(AccessRestriction::Private),
        just(TokenKind::Protected).to(AccessRestriction::Protected),
    ))
    .or_not()
    .map(|access| access.unwrap_or(AccessRestriction::Public))
}

/// Optional scope qualifier (`::`, `A::`, `A::B::`) in front of a name.
fn scope_prefix<'t, I>() -> impl Parser<'t, I, Option<ScopePrefix>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
{
    just(TokenKind::ColonColon)
        .or_not()
        .map(|global| global.is_some())
        .then(
            spanned_ident()
                .then_ignore(just(TokenKind::ColonColon))
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map(|(is_global, segments)| {
            if !is_global && segments.is_empty() {
                None
            } else {
                Some(ScopePrefix {
                    is_global,
                    segments,
                })
            }
        })
}

// ===================
// Types
// ===================

/// Creates a parser for type expressions (`const A::B<int>@`, `int[]`, `?`)
fn type_expr_parser<'t, I>() -> impl Parser<'t, I, Spanned<TypeExpr>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
{
    recursive(|type_expr| {
        let name = select! {
            TokenKind::Identifier(s) => match PrimitiveType::from_name(&s) {
                Some(primitive) => TypeName::Primitive(primitive),
                None => TypeName::Named(s),
            },
        }
        .or(just(TokenKind::Question).to(TypeName::Primitive(PrimitiveType::Any)))
        .map_with(|name, extra| Spanned::new(name, extra.span()))
        .labelled("type name");

        let template_args = type_expr
            .clone()
            .separated_by(just(TokenKind::Comma))
            .at_least(1)
            .collect::<Vec<_>>()
            .delimited_by(just(TokenKind::Lt), just(TokenKind::Gt))
            .or_not()
            .map(Option::unwrap_or_default);

        let array_suffix = just(TokenKind::LBrack)
            .ignore_then(just(TokenKind::RBrack))
            .to(())
            .repeated()
            .collect::<Vec<_>>()
            .map(|dims| dims.len() as u32);

        just(TokenKind::Const)
            .or_not()
            .map(|c| c.is_some())
            .then(scope_prefix())
            .then(name)
            .then(template_args)
            .then(array_suffix)
            .then(just(TokenKind::At).or_not().map(|h| h.is_some()))
            .map_with(
                |(((((is_const, scope), name), template_args), array_dims), is_handle), extra| {
                    Spanned::new(
                        TypeExpr {
                            is_const,
                            scope,
                            name,
                            template_args,
                            array_dims,
                            is_handle,
                        },
                        extra.span(),
                    )
                },
            )
            .boxed()
    })
}

// ===================
// Expressions
// ===================

/// Helper for postfix operations applied left-to-right.
#[derive(Debug, Clone)]
enum PostfixSuffix {
    Call(Vec<Argument>, Span),
    Member(Span, Spanned<String>),
    Index(Spanned<Expression>),
    IncDec(PostfixOp, Span),
}

/// Builds one left-associative binary precedence level.
fn binary_chain<'t, I, P, Q>(
    operand: P,
    op: Q,
) -> impl Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    P: Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone,
    Q: Parser<'t, I, BinaryOp, ParserErr<'t>> + Clone,
{
    operand.clone().foldl(
        op.then(operand).repeated(),
        |lhs, (op, rhs): (BinaryOp, Spanned<Expression>)| {
            let span = Span::from(lhs.span().start..rhs.span().end);
            Spanned::new(
                Expression::Binary {
                    op,
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                },
                span,
            )
        },
    )
}

/// Creates the expression parser with AngelScript operator precedence
fn expression_parser<'t, I, T>(
    type_expr: T,
) -> impl Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    T: Parser<'t, I, Spanned<TypeExpr>, ParserErr<'t>> + Clone + 't,
{
    recursive(|expr| {
        let literal = select! {
            TokenKind::Integer(v) => Expression::IntLiteral(v),
            TokenKind::Float(v) => Expression::FloatLiteral(v),
            TokenKind::String(s) => Expression::StringLiteral(s),
            TokenKind::True => Expression::BoolLiteral(true),
            TokenKind::False => Expression::BoolLiteral(false),
            TokenKind::Null => Expression::NullLiteral,
            TokenKind::This => Expression::This,
        }
        .map_with(|e, extra| Spanned::new(e, extra.span()));

        // `cast<Target>(expr)`
        let cast_expr = just(TokenKind::Cast)
            .ignore_then(
                type_expr
                    .clone()
                    .delimited_by(just(TokenKind::Lt), just(TokenKind::Gt)),
            )
            .then(
                expr.clone()
                    .delimited_by(just(TokenKind::LParen), just(TokenKind::RParen)),
            )
            .map(|(target, e)| Expression::Cast {
                target,
                expr: Box::new(e),
            })
            .map_with(|e, extra| Spanned::new(e, extra.span()));

        // Possibly qualified identifier: `x`, `A::B::x`, `::x`
        let ident_expr = scope_prefix()
            .then(spanned_ident())
            .map(|(scope, name)| Expression::Identifier { scope, name })
            .map_with(|e, extra| Spanned::new(e, extra.span()));

        let paren = expr
            .clone()
            .delimited_by(just(TokenKind::LParen), just(TokenKind::RParen));

        let atom = choice((literal, cast_expr, ident_expr, paren)).boxed();

        // Call argument, optionally named (`name: expr`)
        let argument = spanned_ident()
            .then_ignore(just(TokenKind::Colon))
            .then(expr.clone())
            .map(|(name, value)| Argument {
                name: Some(name),
                value,
            })
            .or(expr.clone().map(|value| Argument { name: None, value }));

        let call_args = argument
            .separated_by(just(TokenKind::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(TokenKind::LParen), just(TokenKind::RParen))
            .map_with(|args, extra| (args, extra.span()));

        let postfix_suffix = choice((
            call_args.map(|(args, span)| PostfixSuffix::Call(args, span)),
            just(TokenKind::Dot)
                .map_with(|_, extra| extra.span())
                .then(spanned_ident())
                .map(|(dot, member)| PostfixSuffix::Member(dot, member)),
            expr.clone()
                .delimited_by(just(TokenKind::LBrack), just(TokenKind::RBrack))
                .map(PostfixSuffix::Index),
            just(TokenKind::Inc).map_with(|_, extra| PostfixSuffix::IncDec(PostfixOp::Inc, extra.span())),
            just(TokenKind::Dec).map_with(|_, extra| PostfixSuffix::IncDec(PostfixOp::Dec, extra.span())),
        ));

        // Postfix operations: calls, member access, indexing, `++`/`--`
        let postfix = atom
            .foldl(postfix_suffix.repeated(), |e, suffix| match suffix {
                PostfixSuffix::Call(args, args_span) => {
                    let span = Span::from(e.span().start..args_span.end);
                    Spanned::new(
                        Expression::Call {
                            callee: Box::new(e),
                            args,
                            args_span,
                        },
                        span,
                    )
                }
                PostfixSuffix::Member(dot_span, member) => {
                    let span = Span::from(e.span().start..member.span().end);
                    Spanned::new(
                        Expression::MemberAccess {
                            object: Box::new(e),
                            dot_span,
                            member,
                        },
                        span,
                    )
                }
                PostfixSuffix::Index(index) => {
                    let span = Span::from(e.span().start..index.span().end);
                    Spanned::new(
                        Expression::Index {
                            object: Box::new(e),
                            index: Box::new(index),
                        },
                        span,
                    )
                }
                PostfixSuffix::IncDec(op, op_span) => {
                    let span = Span::from(e.span().start..op_span.end);
                    Spanned::new(
                        Expression::Postfix {
                            op,
                            expr: Box::new(e),
                        },
                        span,
                    )
                }
            })
            .boxed();

        // Prefix operators (right-associative)
        let unary = choice((
            just(TokenKind::Minus).to(UnaryOp::Neg),
            just(TokenKind::Plus).to(UnaryOp::Plus),
            just(TokenKind::Bang).to(UnaryOp::Not),
            just(TokenKind::Tilde).to(UnaryOp::BitNot),
            just(TokenKind::Inc).to(UnaryOp::PreInc),
            just(TokenKind::Dec).to(UnaryOp::PreDec),
            just(TokenKind::At).to(UnaryOp::HandleOf),
        ))
        .map_with(|op, extra| (op, extra.span()))
        .repeated()
        .foldr(postfix, |(op, op_span): (UnaryOp, Span), e| {
            let span = Span::from(op_span.start..e.span().end);
            Spanned::new(
                Expression::Unary {
                    op,
                    expr: Box::new(e),
                },
                span,
            )
        })
        .boxed();

        let pow = binary_chain(unary, just(TokenKind::StarStar).to(BinaryOp::Pow)).boxed();

        let mul = binary_chain(
            pow,
            choice((
                just(TokenKind::Star).to(BinaryOp::Mul),
                just(TokenKind::Slash).to(BinaryOp::Div),
                just(TokenKind::Percent).to(BinaryOp::Mod),
            )),
        )
        .boxed();

        let add = binary_chain(
            mul,
            choice((
                just(TokenKind::Plus).to(BinaryOp::Add),
                just(TokenKind::Minus).to(BinaryOp::Sub),
            )),
        )
        .boxed();

        // `>>` and `>>>` are consecutive `>` tokens, longest first
        let shift = binary_chain(
            add,
            choice((
                just(TokenKind::Shl).to(BinaryOp::Shl),
                just(TokenKind::Gt)
                    .ignore_then(just(TokenKind::Gt))
                    .ignore_then(just(TokenKind::Gt))
                    .to(BinaryOp::UShr),
                just(TokenKind::Gt)
                    .ignore_then(just(TokenKind::Gt))
                    .to(BinaryOp::Shr),
            )),
        )
        .boxed();

        let relational = binary_chain(
            shift,
            choice((
                just(TokenKind::Le).to(BinaryOp::Le),
                just(TokenKind::Ge).to(BinaryOp::Ge),
                just(TokenKind::Lt).to(BinaryOp::Lt),
                just(TokenKind::Gt).to(BinaryOp::Gt),
            )),
        )
        .boxed();

        let equality = binary_chain(
            relational,
            choice((
                just(TokenKind::EqEq).to(BinaryOp::Eq),
                just(TokenKind::Ne).to(BinaryOp::Ne),
                just(TokenKind::Is).to(BinaryOp::Is),
                just(TokenKind::NotIs).to(BinaryOp::NotIs),
            )),
        )
        .boxed();

        let bit_and = binary_chain(equality, just(TokenKind::Amp).to(BinaryOp::BitAnd)).boxed();
        let bit_xor = binary_chain(bit_and, just(TokenKind::Caret).to(BinaryOp::BitXor)).boxed();
        let bit_or = binary_chain(bit_xor, just(TokenKind::Pipe).to(BinaryOp::BitOr)).boxed();
        let log_and = binary_chain(bit_or, just(TokenKind::AmpAmp).to(BinaryOp::LogAnd)).boxed();
        let log_or = binary_chain(log_and, just(TokenKind::PipePipe).to(BinaryOp::LogOr)).boxed();

        // Ternary conditional (right-associative)
        let ternary = log_or
            .then(
                just(TokenKind::Question)
                    .ignore_then(expr.clone())
                    .then_ignore(just(TokenKind::Colon))
                    .then(expr.clone())
                    .or_not(),
            )
            .map(|(condition, rest)| match rest {
                None => condition,
                Some((then_expr, else_expr)) => {
                    let span = Span::from(condition.span().start..else_expr.span().end);
                    Spanned::new(
                        Expression::Ternary {
                            condition: Box::new(condition),
                            then_expr: Box::new(then_expr),
                            else_expr: Box::new(else_expr),
                        },
                        span,
                    )
                }
            })
            .boxed();

        // Assignment (right-associative, lowest precedence); `>>=`/`>>>=`
        // are reassembled from `>` tokens like the shifts
        let assign_op = choice((
            just(TokenKind::Assign).to(AssignOp::Assign),
            just(TokenKind::PlusAssign).to(AssignOp::Add),
            just(TokenKind::MinusAssign).to(AssignOp::Sub),
            just(TokenKind::StarAssign).to(AssignOp::Mul),
            just(TokenKind::SlashAssign).to(AssignOp::Div),
            just(TokenKind::PercentAssign).to(AssignOp::Mod),
            just(TokenKind::StarStarAssign).to(AssignOp::Pow),
            just(TokenKind::AmpAssign).to(AssignOp::And),
            just(TokenKind::PipeAssign).to(AssignOp::Or),
            just(TokenKind::CaretAssign).to(AssignOp::Xor),
            just(TokenKind::ShlAssign).to(AssignOp::Shl),
            just(TokenKind::Gt)
                .ignore_then(just(TokenKind::Gt))
                .ignore_then(just(TokenKind::Ge))
                .to(AssignOp::UShr),
            just(TokenKind::Gt)
                .ignore_then(just(TokenKind::Ge))
                .to(AssignOp::Shr),
        ));

        ternary
            .clone()
            .then(assign_op.then(expr.clone()).or_not())
            .map(|(lhs, rest)| match rest {
                None => lhs,
                Some((op, rhs)) => {
                    let span = Span::from(lhs.span().start..rhs.span().end);
                    Spanned::new(
                        Expression::Assign {
                            op,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        span,
                    )
                }
            })
            .boxed()
    })
}

// ===================
// Declarations and statements
// ===================

/// Creates a parser for one function/funcdef parameter
fn parameter_parser<'t, I, E, T>(
    expr: E,
    type_expr: T,
) -> impl Parser<'t, I, Parameter, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    E: Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone + 't,
    T: Parser<'t, I, Spanned<TypeExpr>, ParserErr<'t>> + Clone + 't,
{
    let ref_modifier = just(TokenKind::Amp)
        .ignore_then(
            choice((
                soft_keyword("in").to(RefModifier::In),
                soft_keyword("out").to(RefModifier::Out),
                soft_keyword("inout").to(RefModifier::InOut),
            ))
            .or_not(),
        )
        .map(|modifier| modifier.unwrap_or(RefModifier::InOut));

    type_expr
        .then(ref_modifier.or_not())
        .then(spanned_ident().or_not())
        .then(just(TokenKind::Assign).ignore_then(expr).or_not())
        .map(|(((type_expr, modifier), name), default)| Parameter {
            type_expr,
            modifier,
            name,
            default,
        })
}

/// Creates a parser for a variable declaration, trailing `;` included
fn var_decl_parser<'t, I, E, T>(
    expr: E,
    type_expr: T,
) -> impl Parser<'t, I, VarDecl, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    E: Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone + 't,
    T: Parser<'t, I, Spanned<TypeExpr>, ParserErr<'t>> + Clone + 't,
{
    let declarator = spanned_ident()
        .then(just(TokenKind::Assign).ignore_then(expr).or_not())
        .map(|(name, init)| VarDeclarator { name, init });

    access_modifier()
        .then(type_expr)
        .then(
            declarator
                .separated_by(just(TokenKind::Comma))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(just(TokenKind::Semicolon))
        .map(|((access, type_expr), declarators)| VarDecl {
            access,
            type_expr,
            declarators,
        })
}

/// Creates a parser for statements
fn statement_parser<'t, I, E, T>(
    expr: E,
    type_expr: T,
) -> impl Parser<'t, I, Spanned<Statement>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    E: Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone + 't,
    T: Parser<'t, I, Spanned<TypeExpr>, ParserErr<'t>> + Clone + 't,
{
    recursive(|statement| {
        let var_stmt = var_decl_parser(expr.clone(), type_expr.clone())
            .map(Statement::Var)
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()))
            .boxed();

        let block = statement
            .clone()
            .repeated()
            .collect::<Vec<Spanned<Statement>>>()
            .delimited_by(just(TokenKind::LBrace), just(TokenKind::RBrace))
            .map(Statement::Block)
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()))
            .boxed();

        let if_stmt = just(TokenKind::If)
            .ignore_then(
                expr.clone()
                    .delimited_by(just(TokenKind::LParen), just(TokenKind::RParen)),
            )
            .then(statement.clone())
            .then(
                just(TokenKind::Else)
                    .ignore_then(statement.clone())
                    .or_not(),
            )
            .map(|((condition, then_branch), else_branch)| Statement::If {
                condition,
                then_branch: Box::new(then_branch),
                else_branch: else_branch.map(Box::new),
            })
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()));

        let while_stmt = just(TokenKind::While)
            .ignore_then(
                expr.clone()
                    .delimited_by(just(TokenKind::LParen), just(TokenKind::RParen)),
            )
            .then(statement.clone())
            .map(|(condition, body)| Statement::While {
                condition,
                body: Box::new(body),
            })
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()));

        let do_while_stmt = just(TokenKind::Do)
            .ignore_then(statement.clone())
            .then_ignore(just(TokenKind::While))
            .then(
                expr.clone()
                    .delimited_by(just(TokenKind::LParen), just(TokenKind::RParen)),
            )
            .then_ignore(just(TokenKind::Semicolon))
            .map(|(body, condition)| Statement::DoWhile {
                body: Box::new(body),
                condition,
            })
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()));

        let expr_init = expr
            .clone()
            .map(Statement::Expression)
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()))
            .then_ignore(just(TokenKind::Semicolon));

        let for_init = choice((
            var_stmt.clone().map(|s| Some(Box::new(s))),
            expr_init.map(|s| Some(Box::new(s))),
            just(TokenKind::Semicolon).to(None),
        ));

        let for_stmt = just(TokenKind::For)
            .ignore_then(
                for_init
                    .then(expr.clone().or_not())
                    .then_ignore(just(TokenKind::Semicolon))
                    .then(
                        expr.clone()
                            .separated_by(just(TokenKind::Comma))
                            .collect::<Vec<_>>(),
                    )
                    .delimited_by(just(TokenKind::LParen), just(TokenKind::RParen)),
            )
            .then(statement.clone())
            .map(|(((init, condition), increment), body)| Statement::For {
                init,
                condition,
                increment,
                body: Box::new(body),
            })
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()));

        let switch_case = choice((
            just(TokenKind::Case).ignore_then(expr.clone()).map(Some),
            just(TokenKind::Default).to(None),
        ))
        .then_ignore(just(TokenKind::Colon))
        .then(statement.clone().repeated().collect::<Vec<_>>())
        .map(|(value, body)| SwitchCase { value, body });

        let switch_stmt = just(TokenKind::Switch)
            .ignore_then(
                expr.clone()
                    .delimited_by(just(TokenKind::LParen), just(TokenKind::RParen)),
            )
            .then(
                switch_case
                    .repeated()
                    .collect::<Vec<_>>()
                    .delimited_by(just(TokenKind::LBrace), just(TokenKind::RBrace)),
            )
            .map(|(condition, cases)| Statement::Switch { condition, cases })
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()));

        let break_stmt = just(TokenKind::Break)
            .then_ignore(just(TokenKind::Semicolon))
            .to(Statement::Break)
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()));

        let continue_stmt = just(TokenKind::Continue)
            .then_ignore(just(TokenKind::Semicolon))
            .to(Statement::Continue)
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()));

        let return_stmt = just(TokenKind::Return)
            .ignore_then(expr.clone().or_not())
            .then_ignore(just(TokenKind::Semicolon))
            .map(|value| Statement::Return { value })
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()));

        let expr_stmt = expr
            .clone()
            .then_ignore(just(TokenKind::Semicolon))
            .map(Statement::Expression)
            .map_with(|stmt, extra| Spanned::new(stmt, extra.span()));

        choice((
            block,
            if_stmt,
            while_stmt,
            do_while_stmt,
            for_stmt,
            switch_stmt,
            break_stmt,
            continue_stmt,
            return_stmt,
            var_stmt,
            expr_stmt,
        ))
        .boxed()
    })
}

// ===================
// Top-level declarations
// ===================

/// Creates a parser for functions, constructors and destructors
fn function_parser<'t, I, E, T, S>(
    expr: E,
    type_expr: T,
    statement: S,
) -> impl Parser<'t, I, Arc<Spanned<FunctionDef>>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    E: Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone + 't,
    T: Parser<'t, I, Spanned<TypeExpr>, ParserErr<'t>> + Clone + 't,
    S: Parser<'t, I, Spanned<Statement>, ParserErr<'t>> + Clone + 't,
{
    let params = parameter_parser(expr, type_expr.clone())
        .separated_by(just(TokenKind::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(TokenKind::LParen), just(TokenKind::RParen));

    let template_params = spanned_ident()
        .separated_by(just(TokenKind::Comma))
        .at_least(1)
        .collect::<Vec<_>>()
        .delimited_by(just(TokenKind::Lt), just(TokenKind::Gt))
        .or_not()
        .map(Option::unwrap_or_default);

    let attributes = choice((
        soft_keyword("property").to(0u8),
        soft_keyword("override").to(1u8),
        soft_keyword("final").to(2u8),
    ))
    .repeated()
    .collect::<Vec<_>>()
    .map(|words| FunctionAttributes {
        is_property: words.contains(&0),
        is_override: words.contains(&1),
        is_final: words.contains(&2),
    });

    let body = statement
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(TokenKind::LBrace), just(TokenKind::RBrace))
        .map(Some)
        .or(just(TokenKind::Semicolon).to(None));

    let normal = access_modifier()
        .then(type_expr)
        .then(spanned_ident())
        .then(template_params)
        .then(params.clone())
        .then(just(TokenKind::Const).or_not().map(|c| c.is_some()))
        .then(attributes)
        .then(body.clone())
        .map(
            |(
                ((((((access, return_type), name), template_params), params), is_const), attributes),
                body,
            )| FunctionDef {
                access,
                return_type: Some(return_type),
                is_destructor: false,
                name,
                template_params,
                params,
                is_const,
                attributes,
                body,
            },
        );

    let constructor = access_modifier()
        .then(spanned_ident())
        .then(params)
        .then(body.clone())
        .map(|(((access, name), params), body)| FunctionDef {
            access,
            return_type: None,
            is_destructor: false,
            name,
            template_params: Vec::new(),
            params,
            is_const: false,
            attributes: FunctionAttributes::default(),
            body,
        });

    let destructor = just(TokenKind::Tilde)
        .ignore_then(spanned_ident())
        .then_ignore(just(TokenKind::LParen))
        .then_ignore(just(TokenKind::RParen))
        .then(body)
        .map(|(name, body)| FunctionDef {
            access: AccessRestriction::Public,
            return_type: None,
            is_destructor: true,
            name,
            template_params: Vec::new(),
            params: Vec::new(),
            is_const: false,
            attributes: FunctionAttributes::default(),
            body,
        });

    choice((normal, destructor, constructor))
        .map_with(|def, extra| Arc::new(Spanned::new(def, extra.span())))
        .boxed()
}

/// Creates a parser for virtual properties (`int p { get ...; set ...; }`)
fn virtual_property_parser<'t, I, T, S>(
    type_expr: T,
    statement: S,
) -> impl Parser<'t, I, Arc<Spanned<VirtualPropertyDef>>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    T: Parser<'t, I, Spanned<TypeExpr>, ParserErr<'t>> + Clone + 't,
    S: Parser<'t, I, Spanned<Statement>, ParserErr<'t>> + Clone + 't,
{
    let accessor_body = statement
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(TokenKind::LBrace), just(TokenKind::RBrace))
        .map(Some)
        .or(just(TokenKind::Semicolon).to(None));

    let accessor = choice((soft_keyword("get").to(true), soft_keyword("set").to(false)))
        .then(just(TokenKind::Const).or_not().map(|c| c.is_some()))
        .then(accessor_body)
        .map_with(|((is_getter, is_const), body), extra| {
            (
                is_getter,
                PropertyAccessor {
                    is_const,
                    body,
                    span: extra.span(),
                },
            )
        });

    access_modifier()
        .then(type_expr)
        .then(spanned_ident())
        .then(
            accessor
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(TokenKind::LBrace), just(TokenKind::RBrace)),
        )
        .map(|(((access, type_expr), name), accessors)| {
            let mut getter = None;
            let mut setter = None;
            for (is_getter, accessor) in accessors {
                if is_getter {
                    if getter.is_none() {
                        getter = Some(accessor);
                    }
                } else if setter.is_none() {
                    setter = Some(accessor);
                }
            }
            VirtualPropertyDef {
                access,
                type_expr,
                name,
                getter,
                setter,
            }
        })
        .map_with(|def, extra| Arc::new(Spanned::new(def, extra.span())))
        .boxed()
}

/// Creates a parser for `funcdef <return> <name>(<params>);`
fn funcdef_parser<'t, I, E, T>(
    expr: E,
    type_expr: T,
) -> impl Parser<'t, I, Arc<Spanned<FuncdefDef>>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    E: Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone + 't,
    T: Parser<'t, I, Spanned<TypeExpr>, ParserErr<'t>> + Clone + 't,
{
    just(TokenKind::Funcdef)
        .ignore_then(type_expr.clone())
        .then(spanned_ident())
        .then(
            parameter_parser(expr, type_expr)
                .separated_by(just(TokenKind::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(TokenKind::LParen), just(TokenKind::RParen)),
        )
        .then_ignore(just(TokenKind::Semicolon))
        .map(|((return_type, name), params)| FuncdefDef {
            return_type,
            name,
            params,
        })
        .map_with(|def, extra| Arc::new(Spanned::new(def, extra.span())))
        .boxed()
}

/// Creates a parser for classes (`mixin class` included)
fn class_parser<'t, I, E, T, S>(
    expr: E,
    type_expr: T,
    statement: S,
) -> impl Parser<'t, I, Arc<Spanned<ClassDef>>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    E: Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone + 't,
    T: Parser<'t, I, Spanned<TypeExpr>, ParserErr<'t>> + Clone + 't,
    S: Parser<'t, I, Spanned<Statement>, ParserErr<'t>> + Clone + 't,
{
    // `shared`, `abstract`, `external`, `final` are accepted and ignored
    let class_attributes = choice((
        soft_keyword("shared"),
        soft_keyword("abstract"),
        soft_keyword("external"),
        soft_keyword("final"),
    ))
    .repeated();

    let template_params = spanned_ident()
        .separated_by(just(TokenKind::Comma))
        .at_least(1)
        .collect::<Vec<_>>()
        .delimited_by(just(TokenKind::Lt), just(TokenKind::Gt))
        .or_not()
        .map(Option::unwrap_or_default);

    let bases = just(TokenKind::Colon)
        .ignore_then(
            type_expr
                .clone()
                .separated_by(just(TokenKind::Comma))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .or_not()
        .map(Option::unwrap_or_default);

    let member = choice((
        function_parser(expr.clone(), type_expr.clone(), statement.clone())
            .map(ClassMember::Function),
        virtual_property_parser(type_expr.clone(), statement.clone())
            .map(ClassMember::VirtualProperty),
        funcdef_parser(expr.clone(), type_expr.clone()).map(ClassMember::Funcdef),
        var_decl_parser(expr.clone(), type_expr.clone())
            .map_with(|decl, extra| ClassMember::Variable(Arc::new(Spanned::new(decl, extra.span())))),
    ));

    class_attributes
        .ignore_then(just(TokenKind::Mixin).or_not().map(|m| m.is_some()))
        .then_ignore(just(TokenKind::Class))
        .then(spanned_ident())
        .then(template_params)
        .then_ignore(
            choice((
                soft_keyword("shared"),
                soft_keyword("abstract"),
                soft_keyword("external"),
                soft_keyword("final"),
            ))
            .repeated(),
        )
        .then(bases)
        .then(
            member
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(TokenKind::LBrace), just(TokenKind::RBrace)),
        )
        .then_ignore(just(TokenKind::Semicolon).or_not())
        .map(|((((is_mixin, name), template_params), bases), members)| ClassDef {
            is_mixin,
            name,
            template_params,
            bases,
            members,
        })
        .map_with(|def, extra| Arc::new(Spanned::new(def, extra.span())))
        .boxed()
}

/// Creates a parser for interfaces
fn interface_parser<'t, I, E, T, S>(
    expr: E,
    type_expr: T,
    statement: S,
) -> impl Parser<'t, I, Arc<Spanned<InterfaceDef>>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    E: Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone + 't,
    T: Parser<'t, I, Spanned<TypeExpr>, ParserErr<'t>> + Clone + 't,
    S: Parser<'t, I, Spanned<Statement>, ParserErr<'t>> + Clone + 't,
{
    let bases = just(TokenKind::Colon)
        .ignore_then(
            type_expr
                .clone()
                .separated_by(just(TokenKind::Comma))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .or_not()
        .map(Option::unwrap_or_default);

    let member = choice((
        function_parser(expr, type_expr.clone(), statement.clone()).map(InterfaceMember::Method),
        virtual_property_parser(type_expr.clone(), statement).map(InterfaceMember::VirtualProperty),
    ));

    just(TokenKind::Interface)
        .ignore_then(spanned_ident())
        .then(bases)
        .then(
            member
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(TokenKind::LBrace), just(TokenKind::RBrace)),
        )
        .then_ignore(just(TokenKind::Semicolon).or_not())
        .map(|((name, bases), members)| InterfaceDef {
            name,
            bases,
            members,
        })
        .map_with(|def, extra| Arc::new(Spanned::new(def, extra.span())))
        .boxed()
}

/// Creates a parser for enums
fn enum_parser<'t, I, E>(expr: E) -> impl Parser<'t, I, Arc<Spanned<EnumDef>>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
    E: Parser<'t, I, Spanned<Expression>, ParserErr<'t>> + Clone + 't,
{
    let member = spanned_ident()
        .then(just(TokenKind::Assign).ignore_then(expr).or_not())
        .map(|(name, value)| EnumMember { name, value });

    just(TokenKind::Enum)
        .ignore_then(spanned_ident())
        .then(
            member
                .separated_by(just(TokenKind::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(TokenKind::LBrace), just(TokenKind::RBrace)),
        )
        .then_ignore(just(TokenKind::Semicolon).or_not())
        .map(|(name, members)| EnumDef { name, members })
        .map_with(|def, extra| Arc::new(Spanned::new(def, extra.span())))
        .boxed()
}

/// Creates a parser for `typedef <primitive> <name>;`
fn typedef_parser<'t, I>() -> impl Parser<'t, I, Arc<Spanned<TypedefDef>>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
{
    just(TokenKind::Typedef)
        .ignore_then(spanned_ident())
        .then(spanned_ident())
        .then_ignore(just(TokenKind::Semicolon))
        .map(|(primitive, name)| TypedefDef { primitive, name })
        .map_with(|def, extra| Arc::new(Spanned::new(def, extra.span())))
        .boxed()
}

/// Creates the parser for a whole script (also used for namespace bodies)
fn script_parser<'t, I>() -> impl Parser<'t, I, Vec<TopLevelItem>, ParserErr<'t>> + Clone
where
    I: ValueInput<'t, Token = TokenKind, Span = Span>,
{
    recursive(|script| {
        let type_expr = type_expr_parser().boxed();
        let expr = expression_parser(type_expr.clone()).boxed();
        let statement = statement_parser(expr.clone(), type_expr.clone()).boxed();

        let namespace = just(TokenKind::Namespace)
            .ignore_then(
                spanned_ident()
                    .separated_by(just(TokenKind::ColonColon))
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .then(
                script
                    .clone()
                    .delimited_by(just(TokenKind::LBrace), just(TokenKind::RBrace)),
            )
            .map(|(segments, items)| NamespaceDef { segments, items })
            .map_with(|def, extra| {
                TopLevelItem::Namespace(Arc::new(Spanned::new(def, extra.span())))
            });

        let item = choice((
            class_parser(expr.clone(), type_expr.clone(), statement.clone())
                .map(TopLevelItem::Class),
            interface_parser(expr.clone(), type_expr.clone(), statement.clone())
                .map(TopLevelItem::Interface),
            enum_parser(expr.clone()).map(TopLevelItem::Enum),
            typedef_parser().map(TopLevelItem::Typedef),
            funcdef_parser(expr.clone(), type_expr.clone()).map(TopLevelItem::Funcdef),
            namespace,
            function_parser(expr.clone(), type_expr.clone(), statement.clone())
                .map(TopLevelItem::Function),
            virtual_property_parser(type_expr.clone(), statement.clone())
                .map(TopLevelItem::VirtualProperty),
            var_decl_parser(expr.clone(), type_expr.clone()).map_with(|decl, extra| {
                TopLevelItem::Variable(Arc::new(Spanned::new(decl, extra.span())))
            }),
        ));

        item.map(Some)
            .or(just(TokenKind::Semicolon).to(None))
            .repeated()
            .collect::<Vec<_>>()
            .map(|items| items.into_iter().flatten().collect())
            .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_program;

    fn parse_ok(source: &str) -> ParsedModule {
        let output = parse_program(source, "test.as");
        assert!(
            output.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            output.diagnostics
        );
        output.module
    }

    #[test]
    fn test_parse_function() {
        let module = parse_ok("void main() { int x = 1; x += 2; }");
        assert_eq!(module.items.len(), 1);
        match &module.items[0] {
            TopLevelItem::Function(def) => {
                assert_eq!(def.value().name.value(), "main");
                assert_eq!(def.value().body.as_ref().unwrap().len(), 2);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_class_with_base_and_members() {
        let module = parse_ok(
            "class Derived : Base {
                private int hidden;
                int visible;
                Derived() {}
                ~Derived() {}
                void method(float f = 1.0) const {}
            }",
        );
        match &module.items[0] {
            TopLevelItem::Class(def) => {
                let class = def.value();
                assert_eq!(class.name.value(), "Derived");
                assert_eq!(class.bases.len(), 1);
                assert_eq!(class.members.len(), 5);
            }
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_namespace_and_enum() {
        let module = parse_ok("namespace A::B { enum Color { Red, Green = 2, } }");
        match &module.items[0] {
            TopLevelItem::Namespace(def) => {
                let ns = def.value();
                assert_eq!(ns.segments.len(), 2);
                assert_eq!(ns.items.len(), 1);
            }
            other => panic!("expected namespace, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_nested_template_type() {
        let module = parse_ok("array<array<int>> grid;");
        match &module.items[0] {
            TopLevelItem::Variable(decl) => {
                let ty = decl.value().type_expr.value();
                assert_eq!(ty.template_args.len(), 1);
                let inner = ty.template_args[0].value();
                assert_eq!(inner.template_args.len(), 1);
            }
            other => panic!("expected variable, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_virtual_property() {
        let module = parse_ok("class C { int value { get const { return 1; } set { } } }");
        match &module.items[0] {
            TopLevelItem::Class(def) => match &def.value().members[0] {
                ClassMember::VirtualProperty(prop) => {
                    assert!(prop.value().getter.is_some());
                    assert!(prop.value().setter.is_some());
                    assert!(prop.value().getter.as_ref().unwrap().is_const);
                }
                other => panic!("expected virtual property, got {other:?}"),
            },
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_named_arguments_and_ternary() {
        let module = parse_ok("void f() { g(count: 3, flag ? 1 : 2); }");
        match &module.items[0] {
            TopLevelItem::Function(def) => {
                let body = def.value().body.as_ref().unwrap();
                match body[0].value() {
                    Statement::Expression(expr) => match expr.value() {
                        Expression::Call { args, .. } => {
                            assert_eq!(args.len(), 2);
                            assert!(args[0].name.is_some());
                            assert!(args[1].name.is_none());
                        }
                        other => panic!("expected call, got {other:?}"),
                    },
                    other => panic!("expected expression statement, got {other:?}"),
                }
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_shift_from_split_tokens() {
        let module = parse_ok("void f() { int x = 1 >> 2; x >>= 1; }");
        assert_eq!(module.items.len(), 1);
    }

    #[test]
    fn test_parse_funcdef_and_typedef() {
        let module = parse_ok("funcdef bool Callback(int, float);\ntypedef double real64;");
        assert_eq!(module.items.len(), 2);
        assert!(matches!(module.items[0], TopLevelItem::Funcdef(_)));
        assert!(matches!(module.items[1], TopLevelItem::Typedef(_)));
    }

    #[test]
    fn test_syntax_error_produces_diagnostic() {
        let output = parse_program("class {", "test.as");
        assert!(!output.diagnostics.is_empty());
        assert!(output.module.items.is_empty());
    }

    #[test]
    fn test_parse_switch_and_loops() {
        let module = parse_ok(
            "void f() {
                for (int i = 0; i < 10; i++) { continue; }
                while (true) { break; }
                do { } while (false);
                switch (x) { case 1: break; default: break; }
            }",
        );
        assert_eq!(module.items.len(), 1);
    }
}
