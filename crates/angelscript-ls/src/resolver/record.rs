//! # Per-file Records
//!
//! The workspace state behind the analysis resolver: one
//! [`InspectRecord`] per known file, holding everything derived from its
//! last inspection (tokens, preprocessed output, AST, diagnostics) and,
//! after analysis, its global scope. A record's scope is replaced — never
//! mutated — so dependents can keep sharing the previous `Arc` until they
//! re-analyze.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use angelscript_diagnostics::Diagnostic;
use angelscript_parser::{
    parse_program, ParsedModule, PreprocessedOutput, Span, TokenKind,
};
use angelscript_semantic::{analyze_module, AnalyzerSettings, GlobalScope};
use rustc_hash::FxHashMap;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use super::includes;

/// Everything the server knows about one file.
#[derive(Debug, Clone)]
pub struct InspectRecord {
    pub uri: Url,
    pub is_open: bool,
    pub version: Option<i32>,
    pub content: Arc<str>,
    pub tokens: Arc<Vec<(TokenKind, Span)>>,
    pub preprocessed: Arc<PreprocessedOutput>,
    pub ast: Arc<ParsedModule>,
    /// Lexical + syntactic diagnostics, captured once per inspection.
    pub parser_diagnostics: Arc<Vec<Diagnostic>>,
    /// Analyzer diagnostics (missing includes included), replaced per
    /// analysis.
    pub analyzer_diagnostics: Arc<Vec<Diagnostic>>,
    /// Resolved include set of the last analysis.
    pub include_uris: Vec<Url>,
    pub analyzer_scope: Option<Arc<GlobalScope>>,
    /// Bumped on every inspection; stale queued work compares against it.
    pub revision: u64,
}

/// Diagnostics ready to publish for one file: the union of the parser and
/// analyzer sets, sent in one call.
#[derive(Debug)]
pub struct AnalyzedFile {
    pub uri: Url,
    pub version: Option<i32>,
    pub content: Arc<str>,
    pub parser_diagnostics: Arc<Vec<Diagnostic>>,
    pub analyzer_diagnostics: Arc<Vec<Diagnostic>>,
}

/// The record map plus the settings analysis runs under.
pub struct Workspace {
    records: FxHashMap<Url, InspectRecord>,
    settings: Arc<AnalyzerSettings>,
    revision_counter: u64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            records: FxHashMap::default(),
            settings: Arc::new(AnalyzerSettings::default()),
            revision_counter: 0,
        }
    }

    pub fn settings(&self) -> &Arc<AnalyzerSettings> {
        &self.settings
    }

    /// Swap settings; existing scopes stay until their files re-analyze.
    pub fn set_settings(&mut self, settings: AnalyzerSettings) {
        self.settings = Arc::new(settings);
    }

    pub fn record(&self, uri: &Url) -> Option<&InspectRecord> {
        self.records.get(uri)
    }

    pub fn records(&self) -> impl Iterator<Item = &InspectRecord> {
        self.records.values()
    }

    /// (Re-)inspect a file from fresh content: tokenize, preprocess,
    /// parse. The analyzer scope is dropped until the next analysis.
    pub fn inspect(&mut self, uri: Url, content: String, is_open: bool, version: Option<i32>) {
        let output = parse_program(&content, uri.as_str());
        self.revision_counter += 1;
        debug!(
            "inspected {} (revision {}, {} parser diagnostics)",
            uri,
            self.revision_counter,
            output.diagnostics.len()
        );
        let record = InspectRecord {
            uri: uri.clone(),
            is_open,
            version,
            content: Arc::from(content),
            tokens: Arc::new(output.tokens),
            preprocessed: Arc::new(output.preprocessed),
            ast: Arc::new(output.module),
            parser_diagnostics: Arc::new(output.diagnostics),
            analyzer_diagnostics: Arc::new(Vec::new()),
            include_uris: Vec::new(),
            analyzer_scope: None,
            revision: self.revision_counter,
        };
        self.records.insert(uri, record);
    }

    /// A document was opened in the editor. Returns the set of files
    /// newly discovered under the predefined root, for scheduling.
    pub fn open_document(&mut self, uri: Url, content: String, version: Option<i32>) -> Vec<Url> {
        self.inspect(uri.clone(), content, true, version);
        self.discover_predefined(&uri)
    }

    pub fn change_document(&mut self, uri: Url, content: String, version: Option<i32>) {
        self.inspect(uri, content, true, version);
    }

    pub fn close_document(&mut self, uri: &Url) {
        if let Some(record) = self.records.get_mut(uri) {
            record.is_open = false;
            record.version = None;
        }
    }

    /// Remove a record entirely; any queued task for it becomes a no-op.
    pub fn evict(&mut self, uri: &Url) {
        self.records.remove(uri);
    }

    /// Make sure a record exists, reading the file from disk if needed.
    pub fn ensure_inspected(&mut self, uri: &Url) -> bool {
        if self.records.contains_key(uri) {
            return true;
        }
        let Ok(path) = uri.to_file_path() else {
            return false;
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                self.inspect(uri.clone(), content, false, None);
                true
            }
            Err(error) => {
                debug!("cannot read {}: {error}", path.display());
                false
            }
        }
    }

    /// Discover the predefined root for a file. On first discovery the
    /// predefined file is inspected synchronously and the whole subtree
    /// is enumerated; the returned URIs should be scheduled lazily.
    pub fn discover_predefined(&mut self, uri: &Url) -> Vec<Url> {
        let Ok(path) = uri.to_file_path() else {
            return Vec::new();
        };
        let Some(predefined) = includes::find_predefined(&path) else {
            return Vec::new();
        };
        let Ok(predefined_uri) = Url::from_file_path(&predefined) else {
            return Vec::new();
        };

        let mut discovered = Vec::new();
        if !self.records.contains_key(&predefined_uri) {
            self.ensure_inspected(&predefined_uri);
            if let Some(root) = predefined.parent() {
                for script in includes::enumerate_scripts(root) {
                    if let Ok(script_uri) = Url::from_file_path(&script) {
                        if !self.records.contains_key(&script_uri) {
                            discovered.push(script_uri);
                        }
                    }
                }
            }
        }
        discovered
    }

    /// Resolve a file's include set: explicit `#include` directives
    /// (diagnosing missing targets at the path token) plus the implicit
    /// predefined file and, when configured, the whole predefined subtree.
    fn resolve_includes(&mut self, uri: &Url) -> (Vec<Url>, Vec<Diagnostic>) {
        let Some(record) = self.records.get(uri) else {
            return (Vec::new(), Vec::new());
        };
        let directives: Vec<(String, Span)> = record
            .preprocessed
            .includes
            .iter()
            .map(|inc| (inc.path.value().clone(), inc.path.span()))
            .collect();

        let mut resolved = Vec::new();
        let mut missing = Vec::new();
        let mut seen = HashSet::new();

        for (path, span) in directives {
            match includes::resolve_include_path(uri, &path) {
                Some(include_uri) => {
                    let exists = self.records.contains_key(&include_uri)
                        || include_uri
                            .to_file_path()
                            .is_ok_and(|p| Path::new(&p).is_file());
                    if exists {
                        if seen.insert(include_uri.clone()) {
                            resolved.push(include_uri);
                        }
                    } else {
                        missing.push(Diagnostic::missing_include(
                            uri.to_string(),
                            &path,
                            span,
                        ));
                    }
                }
                None => {
                    missing.push(Diagnostic::missing_include(uri.to_string(), &path, span));
                }
            }
        }

        if let Ok(path) = uri.to_file_path() {
            if let Some(predefined) = includes::find_predefined(&path) {
                if let Ok(predefined_uri) = Url::from_file_path(&predefined) {
                    if predefined_uri != *uri && seen.insert(predefined_uri.clone()) {
                        resolved.push(predefined_uri);
                    }
                    if self.settings.implicit_mutual_inclusion {
                        if let Some(root) = predefined.parent() {
                            for script in includes::enumerate_scripts(root) {
                                if let Ok(script_uri) = Url::from_file_path(&script) {
                                    if script_uri != *uri && seen.insert(script_uri.clone()) {
                                        resolved.push(script_uri);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        (resolved, missing)
    }

    /// Analyze one file: collect its include scopes (analyzing missing
    /// ones first), run hoist + analyze, replace the record's scope and
    /// diagnostics. Returns what to publish.
    pub fn analyze(&mut self, uri: &Url) -> Option<AnalyzedFile> {
        let mut visiting = HashSet::new();
        self.analyze_inner(uri, &mut visiting)
    }

    fn analyze_inner(&mut self, uri: &Url, visiting: &mut HashSet<Url>) -> Option<AnalyzedFile> {
        if !self.ensure_inspected(uri) {
            return None;
        }
        if !visiting.insert(uri.clone()) {
            // include cycle; the partial scope of the in-flight file is
            // simply absent for this pass
            return None;
        }

        let (include_uris, missing) = self.resolve_includes(uri);

        // make sure dependency scopes exist; cycles fall out via `visiting`
        for include in &include_uris {
            let needs_analysis = self
                .records
                .get(include)
                .map_or(true, |record| record.analyzer_scope.is_none());
            if needs_analysis {
                self.analyze_inner(include, visiting);
            }
        }

        let record = self.records.get(uri)?;
        let ast = Arc::clone(&record.ast);
        let include_scopes: Vec<Arc<GlobalScope>> = include_uris
            .iter()
            .filter_map(|include| self.records.get(include))
            .filter_map(|record| record.analyzer_scope.clone())
            .collect();

        let output = analyze_module(
            uri.as_str(),
            &ast,
            include_scopes,
            Arc::clone(&self.settings),
        );

        let mut analyzer_diagnostics: Vec<Diagnostic> = missing;
        analyzer_diagnostics.extend(output.diagnostics.into_iter());

        visiting.remove(uri);
        let record = self.records.get_mut(uri)?;
        record.analyzer_scope = Some(Arc::new(output.global));
        record.analyzer_diagnostics = Arc::new(analyzer_diagnostics);
        record.include_uris = include_uris;

        Some(AnalyzedFile {
            uri: record.uri.clone(),
            version: record.version,
            content: Arc::clone(&record.content),
            parser_diagnostics: Arc::clone(&record.parser_diagnostics),
            analyzer_diagnostics: Arc::clone(&record.analyzer_diagnostics),
        })
    }

    /// Records whose resolved include set contains `uri`, for dependency
    /// propagation after it was re-analyzed.
    pub fn dependents_of(&self, uri: &Url) -> Vec<(Url, bool)> {
        self.records
            .values()
            .filter(|record| record.uri != *uri && record.include_uris.contains(uri))
            .map(|record| (record.uri.clone(), record.is_open))
            .collect()
    }
}
