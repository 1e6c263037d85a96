//! Shared helpers for the semantic test suite.

use std::sync::Arc;

use angelscript_diagnostics::DiagnosticCode;
use angelscript_parser::parse_program;
use angelscript_semantic::{
    analyze_module, AnalysisOutput, AnalyzerSettings, GlobalScope, ScopePath, SymbolHolder,
};

/// Analyze one source file with default settings.
pub fn analyze(source: &str) -> AnalysisOutput {
    analyze_with(source, AnalyzerSettings::default())
}

/// Analyze one source file with specific settings.
pub fn analyze_with(source: &str, settings: AnalyzerSettings) -> AnalysisOutput {
    analyze_with_includes(source, settings, Vec::new())
}

/// Analyze against already-analyzed include scopes.
pub fn analyze_with_includes(
    source: &str,
    settings: AnalyzerSettings,
    includes: Vec<Arc<GlobalScope>>,
) -> AnalysisOutput {
    analyze_file("test.as", source, settings, includes)
}

/// Analyze one file under an explicit URI (include scopes keep theirs).
pub fn analyze_file(
    uri: &str,
    source: &str,
    settings: AnalyzerSettings,
    includes: Vec<Arc<GlobalScope>>,
) -> AnalysisOutput {
    let parsed = parse_program(source, uri);
    assert!(
        parsed.diagnostics.is_empty(),
        "source failed to parse: {:?}",
        parsed.diagnostics
    );
    analyze_module(uri, &parsed.module, includes, Arc::new(settings))
}

/// Assert the analysis produced no error diagnostics.
#[track_caller]
pub fn assert_no_errors(output: &AnalysisOutput) {
    assert!(
        !output.diagnostics.has_errors(),
        "unexpected analyzer errors: {:#?}",
        output.diagnostics.all()
    );
}

/// Assert at least one diagnostic with the given code was emitted.
#[track_caller]
pub fn assert_has_code(output: &AnalysisOutput, code: DiagnosticCode) {
    assert!(
        output.diagnostics.iter().any(|d| d.code == code),
        "expected a {code:?} diagnostic, got: {:#?}",
        output.diagnostics.all()
    );
}

/// Look up a symbol holder by scope segments plus name.
#[track_caller]
pub fn symbol_at<'a>(
    output: &'a AnalysisOutput,
    segments: &[&str],
    name: &str,
) -> &'a SymbolHolder {
    let path = ScopePath::from_segments(segments.iter().map(|s| s.to_string()).collect());
    let scope = output
        .global
        .resolve_scope(&path)
        .unwrap_or_else(|| panic!("scope {path} does not exist"));
    scope
        .lookup_symbol(name)
        .unwrap_or_else(|| panic!("no symbol '{name}' in scope {path}"))
}

/// Whether a symbol exists at the given scope.
pub fn has_symbol(output: &AnalysisOutput, segments: &[&str], name: &str) -> bool {
    let path = ScopePath::from_segments(segments.iter().map(|s| s.to_string()).collect());
    output
        .global
        .resolve_scope(&path)
        .is_some_and(|scope| scope.lookup_symbol(name).is_some())
}
