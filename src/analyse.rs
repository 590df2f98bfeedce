//! End-to-end analysis of one directory.
//!
//! Scan → index → classify → build, in that order. Per-file read failures
//! travel with the result; they never stop the run.

use crate::classify::classify_all;
use crate::index::DependencyIndex;
use crate::reader::MetadataReader;
use crate::report::{self, Report, ReportPolicy};
use crate::scan::{scan_directory, SkippedFile};
use std::path::Path;

#[derive(Debug)]
pub enum Analysis {
    /// At least one module was read; the report may still have no entries.
    Report(Report),
    /// No candidate files, or none of them could be read.
    NothingFound {
        directory: String,
        candidates: usize,
        skipped: Vec<SkippedFile>,
    },
}

/// Run the analysis over `directory` with the given reader and policy.
pub fn run_analysis<R>(
    directory: &Path,
    extensions: &[String],
    policy: &ReportPolicy,
    reader: &R,
) -> Analysis
where
    R: MetadataReader + ?Sized,
{
    let dir_display = directory.to_string_lossy().to_string();
    let outcome = scan_directory(directory, extensions, reader);
    if outcome.modules.is_empty() {
        return Analysis::NothingFound {
            directory: dir_display,
            candidates: outcome.candidates,
            skipped: outcome.skipped,
        };
    }

    let index = DependencyIndex::build(&outcome.modules);
    let verdicts = classify_all(&index);
    let entries = report::build(&index, &verdicts, policy);
    Analysis::Report(Report {
        directory: dir_display,
        only_conflicts: policy.only_conflicts,
        modules: outcome.modules.len(),
        entries,
        skipped: outcome.skipped,
    })
}
