//! Workspace analysis: per-file records, include resolution, and the
//! prioritized re-analysis scheduler.

mod controller;
mod includes;
mod record;

pub use controller::{
    convert_diagnostic, AnalysisRequest, AnalysisResolver, AnalysisResponse, DIRECT_DELAY,
    INDIRECT_DELAY, LAZY_INDIRECT_DELAY,
};
pub use includes::{
    enumerate_scripts, find_predefined, resolve_include_path, PREDEFINED_FILE_NAME,
    SCRIPT_EXTENSION,
};
pub use record::{AnalyzedFile, InspectRecord, Workspace};
