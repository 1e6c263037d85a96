//! # Include Resolution
//!
//! Turns `#include` directives and the `as.predefined` convention into a
//! per-file include set. The predefined file is found by walking parent
//! directories (the nearest one wins); every `.as` file under its
//! directory implicitly includes it, and with `implicitMutualInclusion`
//! every such file includes every other.

use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::Url;
use tracing::debug;
use walkdir::WalkDir;

/// The file establishing a workspace's implicit include root.
pub const PREDEFINED_FILE_NAME: &str = "as.predefined";

/// Script file extension.
pub const SCRIPT_EXTENSION: &str = "as";

/// Find the nearest `as.predefined` by walking up the directory tree from
/// a file path.
pub fn find_predefined(file_path: &Path) -> Option<PathBuf> {
    let start_dir = if file_path.is_file() {
        file_path.parent()?
    } else {
        file_path
    };

    let mut current = start_dir;
    loop {
        let candidate = current.join(PREDEFINED_FILE_NAME);
        if candidate.is_file() {
            debug!("found predefined root: {}", candidate.display());
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// Enumerate every `.as` file under a directory (the predefined subtree).
pub fn enumerate_scripts(root_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(root_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == SCRIPT_EXTENSION)
        })
        .collect()
}

/// Resolve an `#include "..."` path relative to the including file.
pub fn resolve_include_path(base: &Url, include: &str) -> Option<Url> {
    let base_path = base.to_file_path().ok()?;
    let joined = base_path.parent()?.join(include);
    Url::from_file_path(normalize(&joined)).ok()
}

/// Lexically normalize `.` and `..` components (the target may not exist,
/// so `canonicalize` is not an option).
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
