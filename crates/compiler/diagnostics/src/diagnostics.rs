//! # Diagnostic System for Semantic Analysis
//!
//! This module provides the diagnostic infrastructure for reporting lexical,
//! syntactic and semantic problems found while analyzing AngelScript sources.
//! The analyzer is recovering, not fail-fast: every problem becomes a
//! diagnostic with a source span and analysis continues with best-effort
//! values.

use std::fmt;

use ariadne::ReportKind;
use chumsky::span::SimpleSpan;

/// A diagnostic message from tokenizing, parsing or semantic analysis
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: DiagnosticCode,
    /// File the diagnostic belongs to (URI or path string)
    pub file_path: String,
    pub message: String,
    /// Source span where this diagnostic applies
    pub span: SimpleSpan<usize>,
    /// Optional related spans for additional context
    pub related_spans: Vec<(SimpleSpan<usize>, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
    Hint,
}

impl From<DiagnosticSeverity> for ReportKind<'static> {
    fn from(severity: DiagnosticSeverity) -> Self {
        match severity {
            DiagnosticSeverity::Error => Self::Error,
            DiagnosticSeverity::Warning => Self::Warning,
            DiagnosticSeverity::Info | DiagnosticSeverity::Hint => Self::Advice,
        }
    }
}

impl DiagnosticSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Hint => "hint",
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // Tokenizer / parser (0-999)
    LexicalError,
    SyntaxError,

    // Declarations and name resolution (1000-1999)
    UnresolvedName,
    DuplicateDeclaration,
    AccessViolation,
    PropertyContract,

    // Types and calls (2000-2999)
    TypeMismatch,
    NotCallable,
    NoMatchingOverload,
    AmbiguousCall,
    InvalidNamedArgument,

    // Includes (4000-4999)
    MissingInclude,
}

impl From<DiagnosticCode> for u32 {
    fn from(code: DiagnosticCode) -> Self {
        match code {
            DiagnosticCode::LexicalError => 1,
            DiagnosticCode::SyntaxError => 2,
            DiagnosticCode::UnresolvedName => 1001,
            DiagnosticCode::DuplicateDeclaration => 1002,
            DiagnosticCode::AccessViolation => 1003,
            DiagnosticCode::PropertyContract => 1004,
            DiagnosticCode::TypeMismatch => 2001,
            DiagnosticCode::NotCallable => 2002,
            DiagnosticCode::NoMatchingOverload => 2003,
            DiagnosticCode::AmbiguousCall => 2004,
            DiagnosticCode::InvalidNamedArgument => 2005,
            DiagnosticCode::MissingInclude => 4001,
        }
    }
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(code: DiagnosticCode, file_path: String, message: String) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            code,
            file_path,
            message,
            span: SimpleSpan::from(0..0),
            related_spans: Vec::new(),
        }
    }

    /// Create a warning diagnostic
    pub fn warning(code: DiagnosticCode, file_path: String, message: String) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            code,
            file_path,
            message,
            span: SimpleSpan::from(0..0),
            related_spans: Vec::new(),
        }
    }

    /// Add location information to this diagnostic
    pub const fn with_location(mut self, span: SimpleSpan<usize>) -> Self {
        self.span = span;
        self
    }

    /// Add a related span with context message
    pub fn with_related_span(mut self, span: SimpleSpan<usize>, message: String) -> Self {
        self.related_spans.push((span, message));
        self
    }

    /// Convenience method for lexical errors
    pub fn lexical_error(file_path: String, message: String, span: SimpleSpan<usize>) -> Self {
        Self::error(DiagnosticCode::LexicalError, file_path, message).with_location(span)
    }

    /// Convenience method for syntax errors
    pub fn syntax_error(file_path: String, message: String, span: SimpleSpan<usize>) -> Self {
        Self::error(DiagnosticCode::SyntaxError, file_path, message).with_location(span)
    }

    /// Convenience method for an identifier not found at a use site
    pub fn unresolved_name(file_path: String, name: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::UnresolvedName,
            file_path,
            format!("Unresolved name '{name}'"),
        )
        .with_location(span)
    }

    /// Convenience method for a symbol insertion collision
    pub fn duplicate_declaration(file_path: String, name: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::DuplicateDeclaration,
            file_path,
            format!("Duplicate declaration of '{name}'"),
        )
        .with_location(span)
    }

    /// Convenience method for assignment/return/argument type disagreement
    pub fn type_mismatch(
        file_path: String,
        expected: &str,
        found: &str,
        span: SimpleSpan<usize>,
    ) -> Self {
        Self::error(
            DiagnosticCode::TypeMismatch,
            file_path,
            format!("Type mismatch: expected '{expected}', found '{found}'"),
        )
        .with_location(span)
    }

    /// Convenience method for a private/protected member used from outside
    pub fn access_violation(file_path: String, name: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::AccessViolation,
            file_path,
            format!("'{name}' is not accessible from this scope"),
        )
        .with_location(span)
    }

    /// Convenience method for `property` used on a non-accessor name
    pub fn property_contract(file_path: String, name: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::PropertyContract,
            file_path,
            format!("'{name}' is marked 'property' but lacks a 'get_' or 'set_' prefix"),
        )
        .with_location(span)
    }

    /// Convenience method for a file referenced by `#include` that was not found
    pub fn missing_include(file_path: String, include: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::MissingInclude,
            file_path,
            format!("Included file '{include}' was not found"),
        )
        .with_location(span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code: u32 = self.code.into();
        write!(
            f,
            "{}[{code:04}] at {}..{}: {}",
            self.severity.label(),
            self.span.start,
            self.span.end,
            self.message
        )?;
        for (span, note) in &self.related_spans {
            write!(f, "\n  note at {}..{}: {note}", span.start, span.end)?;
        }
        Ok(())
    }
}

/// Accumulating sink for the diagnostics of one pass, kept in emission
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticCollection {
    entries: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Record every diagnostic an iterator yields.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.add(diagnostic);
        }
    }

    /// Everything recorded so far, oldest first.
    pub fn all(&self) -> &[Diagnostic] {
        self.entries.as_slice()
    }

    /// The subset with a given severity.
    pub fn of_severity(&self, severity: DiagnosticSeverity) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .collect()
    }

    /// The error-severity subset.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.of_severity(DiagnosticSeverity::Error)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// A one-line count summary for logs.
    pub fn summary(&self) -> String {
        if self.entries.is_empty() {
            return "No issues found".to_string();
        }
        let errors = self.errors().len();
        format!("{errors} errors, {} warnings", self.len() - errors)
    }
}

impl From<Vec<Diagnostic>> for DiagnosticCollection {
    fn from(entries: Vec<Diagnostic>) -> Self {
        Self { entries }
    }
}

impl IntoIterator for DiagnosticCollection {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
