//! # Preprocessor
//!
//! Extracts `#include "path"` directives from a token stream before parsing.
//! The directive tokens are removed so the parser never sees them; the
//! workspace resolver turns the recorded paths into the file's include set.

use angelscript_diagnostics::Diagnostic;

use crate::ast::{Span, Spanned};
use crate::tokens::TokenKind;

/// One `#include "path"` directive found in a file.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeDirective {
    /// The unquoted include path, spanning the string literal token.
    pub path: Spanned<String>,
}

/// Token stream with directives stripped, plus the directives themselves.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreprocessedOutput {
    pub tokens: Vec<(TokenKind, Span)>,
    pub includes: Vec<IncludeDirective>,
}

/// Run the preprocessor over a lexed token stream.
pub fn preprocess(
    tokens: Vec<(TokenKind, Span)>,
    file_path: &str,
) -> (PreprocessedOutput, Vec<Diagnostic>) {
    let mut output = PreprocessedOutput::default();
    let mut diagnostics = Vec::new();

    let mut iter = tokens.into_iter().peekable();
    while let Some((token, span)) = iter.next() {
        if token != TokenKind::Hash {
            output.tokens.push((token, span));
            continue;
        }

        let directive = match iter.peek() {
            Some((TokenKind::Identifier(name), _)) => name.clone(),
            _ => {
                diagnostics.push(Diagnostic::syntax_error(
                    file_path.to_string(),
                    "Expected a directive name after '#'".to_string(),
                    span,
                ));
                continue;
            }
        };
        iter.next();

        if directive == "include" {
            match iter.peek() {
                Some((TokenKind::String(path), path_span)) => {
                    output.includes.push(IncludeDirective {
                        path: Spanned::new(path.clone(), *path_span),
                    });
                    iter.next();
                }
                _ => {
                    diagnostics.push(Diagnostic::syntax_error(
                        file_path.to_string(),
                        "Expected a quoted path after '#include'".to_string(),
                        span,
                    ));
                }
            }
        }
        // Other directives (#pragma, #if, ...) are dropped without their
        // arguments; the analyzer has no use for them.
    }

    (output, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize;

    #[test]
    fn test_include_extraction() {
        let (tokens, lex_diags) = tokenize("#include \"lib.as\"\nint x;", "test.as");
        assert!(lex_diags.is_empty());

        let (output, diags) = preprocess(tokens, "test.as");
        assert!(diags.is_empty());
        assert_eq!(output.includes.len(), 1);
        assert_eq!(output.includes[0].path.value(), "lib.as");
        // Only `int x ;` should remain.
        assert_eq!(output.tokens.len(), 3);
    }

    #[test]
    fn test_malformed_include() {
        let (tokens, _) = tokenize("#include int x;", "test.as");
        let (output, diags) = preprocess(tokens, "test.as");
        assert_eq!(diags.len(), 1);
        assert!(output.includes.is_empty());
        assert_eq!(output.tokens.len(), 3);
    }

    #[test]
    fn test_multiple_includes() {
        let (tokens, _) = tokenize("#include \"a.as\"\n#include \"b.as\"", "test.as");
        let (output, diags) = preprocess(tokens, "test.as");
        assert!(diags.is_empty());
        let paths: Vec<_> = output
            .includes
            .iter()
            .map(|i| i.path.value().as_str())
            .collect();
        assert_eq!(paths, vec!["a.as", "b.as"]);
        assert!(output.tokens.is_empty());
    }
}
