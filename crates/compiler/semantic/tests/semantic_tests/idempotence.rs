//! Re-running both passes over the same AST yields structurally equal
//! results.

use std::sync::Arc;

use angelscript_parser::parse_program;
use angelscript_semantic::{analyze_module, AnalyzerSettings};

const SOURCE: &str = "
namespace App {
    enum Mode { Off, On }

    class Service {
        private int calls;
        int get_total() property { return calls; }
        void run(Mode m, int times = 1) { calls += times; }
    }
}

void main() {
    App::Service s;
    s.run(App::Mode::On);
    int t = s.total;
}
";

#[test]
fn test_hoist_and_analyze_twice_is_stable() {
    let parsed = parse_program(SOURCE, "test.as");
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let settings = Arc::new(AnalyzerSettings::default());

    let first = analyze_module("test.as", &parsed.module, Vec::new(), Arc::clone(&settings));
    let second = analyze_module("test.as", &parsed.module, Vec::new(), settings);

    assert_eq!(first.global, second.global);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn test_reparse_yields_equal_diagnostics() {
    let first_parse = parse_program(SOURCE, "test.as");
    let second_parse = parse_program(SOURCE, "test.as");
    assert_eq!(first_parse.module, second_parse.module);

    let settings = Arc::new(AnalyzerSettings::default());
    let first = analyze_module(
        "test.as",
        &first_parse.module,
        Vec::new(),
        Arc::clone(&settings),
    );
    let second = analyze_module("test.as", &second_parse.module, Vec::new(), settings);

    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(
        first.global.references.len(),
        second.global.references.len()
    );
}
