//! Small conversion helpers shared across the server.

use angelscript_parser::Span;
use tower_lsp::lsp_types::{Position, Range, Url};

/// Convert byte offset to LSP Position
pub fn offset_to_position(source: &str, offset: usize) -> Position {
    let mut line = 0;
    let mut character = 0;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            character = 0;
        } else {
            character += 1;
        }
    }

    Position {
        line: line as u32,
        character: character as u32,
    }
}

/// Convert LSP Position to byte offset
pub fn position_to_offset(source: &str, position: Position) -> usize {
    let mut current_line = 0;
    let mut current_character = 0;

    for (i, ch) in source.char_indices() {
        if current_line == position.line as usize
            && current_character == position.character as usize
        {
            return i;
        }

        if ch == '\n' {
            current_line += 1;
            current_character = 0;

            if current_line > position.line as usize {
                return source.len();
            }
        } else {
            current_character += 1;
        }
    }

    source.len()
}

/// Convert a byte span to an LSP range
pub fn span_to_range(source: &str, span: Span) -> Range {
    Range {
        start: offset_to_position(source, span.start),
        end: offset_to_position(source, span.end),
    }
}

/// Whether a byte offset lies within a span (inclusive at both ends, so a
/// caret just after the last character still hits).
pub const fn span_contains(span: Span, offset: usize) -> bool {
    span.start <= offset && offset <= span.end
}

/// Helper for URI conversion from path strings that may already be URIs
pub fn uri_from_path_str(path_str: &str) -> Result<Url, String> {
    if path_str.starts_with("file://") {
        Url::parse(path_str).map_err(|e| format!("Failed to parse URI: {e}"))
    } else {
        Url::from_file_path(path_str)
            .map_err(|_| format!("Failed to convert path to URI: {path_str}"))
    }
}
