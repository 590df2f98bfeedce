//! Candidate discovery and parallel metadata reading.
//!
//! Files are matched with `glob` (extension match is case-insensitive),
//! sorted by file name using ordinal, case-sensitive comparison, then read
//! in parallel. The ordered collect keeps results in sorted order so the
//! index sees modules in a reproducible sequence.

use crate::models::ModuleRecord;
use crate::reader::{MetadataReader, ReadError};
use glob::{MatchOptions, Pattern};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default module file extensions.
pub const DEFAULT_EXTENSIONS: &[&str] = &["dll", "exe"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A candidate file that produced no module record.
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
    /// True for valid images without CLI metadata (native modules).
    pub native: bool,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub candidates: usize,
    pub modules: Vec<ModuleRecord>,
    pub skipped: Vec<SkippedFile>,
}

fn file_name_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// List regular files directly under `dir` whose extension is in `extensions`.
pub fn list_candidates(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let opts = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let base = Pattern::escape(&dir.to_string_lossy());
    let mut files: Vec<PathBuf> = Vec::new();
    for ext in extensions {
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() {
            continue;
        }
        let pattern = format!("{}/*.{}", base, Pattern::escape(ext));
        let Ok(entries) = glob::glob_with(&pattern, opts) else {
            continue;
        };
        for path in entries.flatten() {
            if path.is_file() && !files.contains(&path) {
                files.push(path);
            }
        }
    }
    files.sort_by_key(|p| file_name_key(p));
    files
}

/// Read every candidate in `dir`, splitting successes from failures.
pub fn scan_directory<R>(dir: &Path, extensions: &[String], reader: &R) -> ScanOutcome
where
    R: MetadataReader + ?Sized,
{
    let candidates = list_candidates(dir, extensions);
    let results: Vec<(&PathBuf, Result<ModuleRecord, ReadError>)> = candidates
        .par_iter()
        .map(|path| (path, reader.read(path)))
        .collect();

    let mut outcome = ScanOutcome {
        candidates: candidates.len(),
        ..ScanOutcome::default()
    };
    for (path, result) in results {
        match result {
            Ok(record) => outcome.modules.push(record),
            Err(err) => outcome.skipped.push(SkippedFile {
                file: path.to_string_lossy().to_string(),
                native: matches!(err, ReadError::NotManaged),
                reason: err.to_string(),
            }),
        }
    }
    outcome
}
