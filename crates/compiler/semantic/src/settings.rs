//! # Analyzer Settings
//!
//! Configuration knobs that change analyzer behavior. The language server
//! deserializes these from the client's initialization options and from
//! `workspace/didChangeConfiguration` notifications; camelCase key names
//! match the client-side configuration schema.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerSettings {
    /// Publish analyzer diagnostics as warnings instead of errors.
    pub suppress_analyzer_errors: bool,
    /// Type names constructable from string literals.
    pub builtin_string_types: Vec<String>,
    /// Generic array type used for `T[]`.
    pub builtin_array_type: String,
    /// Include every `.as` file under the predefined root in every file's
    /// include set.
    pub implicit_mutual_inclusion: bool,
    /// Enum members also appear in the enum's parent scope.
    pub hoist_enum_parent_scope: bool,
    /// When false, any `get_`/`set_` prefixed function becomes a property
    /// accessor regardless of the `property` attribute.
    pub explicit_property_accessor: bool,
    pub formatter: FormatterSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatterSettings {
    pub max_blank_lines: u32,
    pub indent_spaces: u32,
    pub use_tab_indent: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            suppress_analyzer_errors: true,
            builtin_string_types: vec![
                "string".to_string(),
                "string_t".to_string(),
                "String".to_string(),
            ],
            builtin_array_type: "array".to_string(),
            implicit_mutual_inclusion: false,
            hoist_enum_parent_scope: false,
            explicit_property_accessor: true,
            formatter: FormatterSettings::default(),
        }
    }
}

impl Default for FormatterSettings {
    fn default() -> Self {
        Self {
            max_blank_lines: 1,
            indent_spaces: 4,
            use_tab_indent: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AnalyzerSettings::default();
        assert!(settings.suppress_analyzer_errors);
        assert_eq!(settings.builtin_array_type, "array");
        assert!(!settings.implicit_mutual_inclusion);
        assert!(settings.explicit_property_accessor);
        assert_eq!(settings.formatter.indent_spaces, 4);
    }

    #[test]
    fn test_camel_case_keys() {
        let settings: AnalyzerSettings = serde_json::from_str(
            r#"{"suppressAnalyzerErrors": false, "builtinArrayType": "vector"}"#,
        )
        .unwrap();
        assert!(!settings.suppress_analyzer_errors);
        assert_eq!(settings.builtin_array_type, "vector");
        // Unset keys keep their defaults.
        assert!(settings.explicit_property_accessor);
    }
}
