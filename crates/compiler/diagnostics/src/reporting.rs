//! # Error Reporting Utilities
//!
//! Renders a diagnostic against its source text for terminal output and
//! test failure messages. Related spans become secondary labels.

use ariadne::{Config, IndexType, Label, Report};

use crate::Diagnostic;

/// Render one diagnostic as a human-readable report.
pub fn build_diagnostic_message(
    source_text: &str,
    diagnostic: &Diagnostic,
    with_color: bool,
) -> String {
    // ariadne addresses snippets by (file id, byte range)
    let at = |range: std::ops::Range<usize>| (diagnostic.file_path.clone(), range);

    let mut builder = Report::build(diagnostic.severity.into(), at(diagnostic.span.into_range()))
        .with_config(
            Config::new()
                .with_index_type(IndexType::Byte)
                .with_color(with_color),
        )
        .with_code(u32::from(diagnostic.code))
        .with_message(&diagnostic.message)
        .with_label(Label::new(at(diagnostic.span.into_range())).with_message(&diagnostic.message));
    for (span, note) in &diagnostic.related_spans {
        builder = builder.with_label(Label::new(at(span.into_range())).with_message(note));
    }

    // the cache wants 'static sources, so it gets an owned copy
    let snippets = ariadne::sources([(diagnostic.file_path.clone(), source_text.to_string())]);
    let mut rendered = Vec::new();
    builder
        .finish()
        .write(snippets, &mut rendered)
        .expect("report rendering never fails on a Vec");
    String::from_utf8_lossy(&rendered).into_owned()
}
