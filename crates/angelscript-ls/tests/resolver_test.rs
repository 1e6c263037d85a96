//! End-to-end tests for the workspace analysis resolver: per-file
//! records, include resolution, predefined discovery, and the prioritized
//! re-analysis scheduler.

use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use angelscript_diagnostics::DiagnosticCode;
use angelscript_ls::resolver::{AnalysisRequest, AnalysisResolver, Workspace};
use angelscript_semantic::AnalyzerSettings;
use tempfile::TempDir;
use tokio::time::timeout;
use tower_lsp::lsp_types::Url;

fn write_script(dir: &TempDir, name: &str, content: &str) -> Url {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    Url::from_file_path(path).unwrap()
}

#[test]
fn test_analyze_single_file() {
    let dir = TempDir::new().unwrap();
    let uri = write_script(&dir, "main.as", "void main() { int x = 1; }");

    let mut workspace = Workspace::new();
    workspace.open_document(uri.clone(), "void main() { int x = 1; }".to_string(), Some(1));
    let analyzed = workspace.analyze(&uri).expect("analysis result");

    assert!(analyzed.parser_diagnostics.is_empty());
    assert!(analyzed.analyzer_diagnostics.is_empty());
    let record = workspace.record(&uri).unwrap();
    assert!(record.analyzer_scope.is_some());
}

#[test]
fn test_missing_include_is_diagnosed_and_analysis_continues() {
    let dir = TempDir::new().unwrap();
    let content = "#include \"missing.as\"\nint x = 1;";
    let uri = write_script(&dir, "main.as", content);

    let mut workspace = Workspace::new();
    workspace.open_document(uri.clone(), content.to_string(), Some(1));
    let analyzed = workspace.analyze(&uri).unwrap();

    assert!(analyzed
        .analyzer_diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::MissingInclude));
    // results still exist for the rest of the file
    assert!(workspace.record(&uri).unwrap().analyzer_scope.is_some());
}

#[test]
fn test_include_provides_symbols() {
    let dir = TempDir::new().unwrap();
    write_script(&dir, "lib.as", "class Widget { int size; }");
    let content = "#include \"lib.as\"\nvoid main() { Widget w; int s = w.size; }";
    let uri = write_script(&dir, "main.as", content);

    let mut workspace = Workspace::new();
    workspace.open_document(uri.clone(), content.to_string(), Some(1));
    let analyzed = workspace.analyze(&uri).unwrap();

    assert!(
        analyzed.analyzer_diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        analyzed.analyzer_diagnostics
    );
    // the dependency was inspected and analyzed on demand
    let lib_uri = Url::from_file_path(dir.path().join("lib.as")).unwrap();
    assert!(workspace.record(&lib_uri).unwrap().analyzer_scope.is_some());
    assert_eq!(
        workspace.dependents_of(&lib_uri),
        vec![(uri.clone(), true)]
    );
}

#[test]
fn test_include_cycles_are_benign() {
    let dir = TempDir::new().unwrap();
    let a_content = "#include \"b.as\"\nclass A {}";
    let b_content = "#include \"a.as\"\nclass B {}";
    let a_uri = write_script(&dir, "a.as", a_content);
    write_script(&dir, "b.as", b_content);

    let mut workspace = Workspace::new();
    workspace.open_document(a_uri.clone(), a_content.to_string(), Some(1));
    let analyzed = workspace.analyze(&a_uri).unwrap();
    assert!(analyzed.parser_diagnostics.is_empty());
    assert!(workspace.record(&a_uri).unwrap().analyzer_scope.is_some());
}

#[test]
fn test_predefined_discovery_and_implicit_include() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("as.predefined"),
        "class array<T> { T opIndex(int i) { return value; } T value; }",
    )
    .unwrap();
    write_script(&dir, "other.as", "int helper;");
    let content = "void main() { int[] xs; int v = xs[0]; }";
    let uri = write_script(&dir, "main.as", content);

    let mut workspace = Workspace::new();
    let discovered = workspace.open_document(uri.clone(), content.to_string(), Some(1));

    // the subtree was enumerated on first discovery
    assert!(discovered
        .iter()
        .any(|d| d.path().ends_with("other.as")));

    // as.predefined is implicitly included, so `array` resolves
    let analyzed = workspace.analyze(&uri).unwrap();
    assert!(
        analyzed.analyzer_diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        analyzed.analyzer_diagnostics
    );
}

#[test]
fn test_implicit_mutual_inclusion() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("as.predefined"), "").unwrap();
    write_script(&dir, "lib.as", "class Shared {}");
    let content = "void main() { Shared s; }";
    let uri = write_script(&dir, "main.as", content);

    let mut workspace = Workspace::new();
    let mut settings = AnalyzerSettings::default();
    settings.implicit_mutual_inclusion = true;
    workspace.set_settings(settings);

    workspace.open_document(uri.clone(), content.to_string(), Some(1));
    let analyzed = workspace.analyze(&uri).unwrap();
    assert!(
        analyzed.analyzer_diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        analyzed.analyzer_diagnostics
    );
}

#[test]
fn test_eviction_invalidates_pending_analysis() {
    let dir = TempDir::new().unwrap();
    let uri = write_script(&dir, "gone.as", "int x;");

    let mut workspace = Workspace::new();
    workspace.open_document(uri.clone(), "int x;".to_string(), Some(1));
    workspace.evict(&uri);
    // the file also disappears from disk, so a queued task finds nothing
    fs::remove_file(uri.to_file_path().unwrap()).unwrap();
    assert!(workspace.analyze(&uri).is_none());
}

#[tokio::test]
async fn test_edit_propagates_to_open_dependents() {
    let dir = TempDir::new().unwrap();
    let b_content = "class Lib { int value; }";
    let b_uri = write_script(&dir, "b.as", b_content);
    let a_content = "#include \"b.as\"\nvoid main() { Lib l; int v = l.value; }";
    let a_uri = write_script(&dir, "a.as", a_content);

    let workspace = Arc::new(Mutex::new(Workspace::new()));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let resolver = AnalysisResolver::new(Arc::clone(&workspace), tx);

    resolver
        .request(AnalysisRequest::DocumentOpened {
            uri: a_uri.clone(),
            content: a_content.to_string(),
            version: Some(1),
        })
        .unwrap();

    let first = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("initial analysis published")
        .unwrap();
    assert_eq!(first.uri, a_uri);
    assert!(first.diagnostics.is_empty(), "{:?}", first.diagnostics);

    let b_tokens_before = {
        let ws = workspace.lock().unwrap();
        Arc::clone(&ws.record(&b_uri).unwrap().tokens)
    };

    // editing b while a is open re-analyzes b directly and a indirectly
    resolver
        .request(AnalysisRequest::DocumentChanged {
            uri: b_uri.clone(),
            content: "class Lib { int value; int extra; }".to_string(),
            version: Some(2),
        })
        .unwrap();

    let mut published = Vec::new();
    while published.len() < 2 {
        let response = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("propagated analysis published")
            .unwrap();
        published.push(response.uri.clone());
    }
    assert_eq!(published[0], b_uri);
    assert_eq!(published[1], a_uri);

    // a's re-analysis reused b's record; only the edit re-tokenized b
    let ws = workspace.lock().unwrap();
    let b_tokens_after = Arc::clone(&ws.record(&b_uri).unwrap().tokens);
    assert!(!Arc::ptr_eq(&b_tokens_before, &b_tokens_after));
    assert!(ws.record(&a_uri).unwrap().analyzer_scope.is_some());
}

#[tokio::test]
async fn test_flush_makes_state_fresh_immediately() {
    let dir = TempDir::new().unwrap();
    let content = "void main() { int x = 1; }";
    let uri = write_script(&dir, "main.as", content);

    let workspace = Arc::new(Mutex::new(Workspace::new()));
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let resolver = AnalysisResolver::new(Arc::clone(&workspace), tx);

    resolver
        .request(AnalysisRequest::DocumentOpened {
            uri: uri.clone(),
            content: content.to_string(),
            version: Some(1),
        })
        .unwrap();

    // without waiting for the direct-tier timer
    resolver.flush(Some(uri.clone())).await;

    let ws = workspace.lock().unwrap();
    let record = ws.record(&uri).expect("record exists after flush");
    assert!(record.analyzer_scope.is_some());
}

#[tokio::test]
async fn test_settings_change_reanalyzes_open_files() {
    let dir = TempDir::new().unwrap();
    let content = "enum Color { Red }\nvoid main() { int v = Red; }";
    let uri = write_script(&dir, "main.as", content);

    let workspace = Arc::new(Mutex::new(Workspace::new()));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let resolver = AnalysisResolver::new(Arc::clone(&workspace), tx);

    resolver
        .request(AnalysisRequest::DocumentOpened {
            uri: uri.clone(),
            content: content.to_string(),
            version: Some(1),
        })
        .unwrap();
    let first = timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    // `Red` is not visible from the parent scope by default
    assert!(!first.diagnostics.is_empty());

    let mut settings = AnalyzerSettings::default();
    settings.hoist_enum_parent_scope = true;
    settings.suppress_analyzer_errors = false;
    resolver
        .request(AnalysisRequest::SettingsChanged(settings))
        .unwrap();

    let second = timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.uri, uri);
    assert!(second.diagnostics.is_empty(), "{:?}", second.diagnostics);
}
