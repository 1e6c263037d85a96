//! Tokenizer, preprocessor and parser for AngelScript sources.
//!
//! The pipeline is `tokenize` → `preprocess` → `parse_tokens`; the
//! [`parse_program`] convenience runs all three and is what the workspace
//! resolver and the test suites use.

pub mod ast;
pub mod parser;
pub mod preprocessor;
pub mod tokens;

use angelscript_diagnostics::Diagnostic;

pub use ast::{ParsedModule, Span, Spanned};
pub use parser::{parse_tokens, ParseOutput};
pub use preprocessor::{preprocess, IncludeDirective, PreprocessedOutput};
pub use tokens::{LexingError, TokenKind};

/// Lex a source string into tokens with byte-offset spans.
pub fn tokenize(source: &str, file_path: &str) -> (Vec<(TokenKind, Span)>, Vec<Diagnostic>) {
    use logos::Logos;

    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();
    for (result, span) in TokenKind::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, span.into())),
            Err(error) => diagnostics.push(Diagnostic::lexical_error(
                file_path.to_string(),
                error.to_string(),
                span.into(),
            )),
        }
    }
    (tokens, diagnostics)
}

/// Output of the full lex → preprocess → parse pipeline for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramOutput {
    pub tokens: Vec<(TokenKind, Span)>,
    pub preprocessed: PreprocessedOutput,
    pub module: ParsedModule,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lex, preprocess and parse a source string.
pub fn parse_program(source: &str, file_path: &str) -> ProgramOutput {
    let (tokens, mut diagnostics) = tokenize(source, file_path);
    let (preprocessed, preprocess_diagnostics) = preprocess(tokens.clone(), file_path);
    diagnostics.extend(preprocess_diagnostics);

    let output = parse_tokens(preprocessed.tokens.clone(), source.len(), file_path);
    diagnostics.extend(output.diagnostics);

    ProgramOutput {
        tokens,
        preprocessed,
        module: output.module,
        diagnostics,
    }
}
