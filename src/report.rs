//! Structured, colorless report built from the index and its verdicts.
//!
//! Entry order is the index's bucket order (module processing order), not an
//! alphabetical sort of dependency names. Each line carries a `group` index
//! (first-seen position of its version) which printers map to a color.

use crate::classify::ConflictVerdict;
use crate::index::DependencyIndex;
use crate::models::Version;
use crate::scan::SkippedFile;
use indexmap::IndexMap;
use serde::Serialize;

/// Name prefixes treated as platform runtime modules by default.
pub const DEFAULT_SYSTEM_PREFIXES: &[&str] = &["System", "mscorlib", "netstandard"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Filters applied when building the report. Both flags are independent.
pub struct ReportPolicy {
    pub only_conflicts: bool,
    pub skip_system: bool,
    pub system_prefixes: Vec<String>,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        ReportPolicy {
            only_conflicts: true,
            skip_system: false,
            system_prefixes: DEFAULT_SYSTEM_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ReportPolicy {
    pub fn is_system(&self, name: &str) -> bool {
        self.system_prefixes
            .iter()
            .any(|p| !p.is_empty() && name.starts_with(p.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub version: Version,
    pub requested_by: String,
    pub group: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One dependency name with every module that requested it.
pub struct ReportEntry {
    pub name: String,
    pub conflicting: bool,
    pub versions: Vec<Version>,
    pub lines: Vec<ReportLine>,
}

#[derive(Debug, Clone, Serialize)]
/// Everything a printer needs for one run.
pub struct Report {
    pub directory: String,
    pub only_conflicts: bool,
    pub modules: usize,
    pub entries: Vec<ReportEntry>,
    pub skipped: Vec<SkippedFile>,
}

/// Build report entries for every dependency admitted by `policy`.
///
/// `verdicts` must come from `classify_all` over the same index. Names
/// without a verdict are ignored, as are lines whose version the verdict
/// does not list.
pub fn build(
    index: &DependencyIndex,
    verdicts: &IndexMap<String, ConflictVerdict>,
    policy: &ReportPolicy,
) -> Vec<ReportEntry> {
    let mut entries = Vec::new();
    for (name, observations) in index.iter() {
        if policy.skip_system && policy.is_system(name) {
            continue;
        }
        let Some(verdict) = verdicts.get(name) else {
            continue;
        };
        if policy.only_conflicts && !verdict.is_conflicting {
            continue;
        }
        let lines = observations
            .iter()
            .filter_map(|obs| {
                Some(ReportLine {
                    version: obs.version,
                    requested_by: obs.requested_by.clone(),
                    group: verdict.group_of(&obs.version)?,
                })
            })
            .collect();
        entries.push(ReportEntry {
            name: name.to_string(),
            conflicting: verdict.is_conflicting,
            versions: verdict.versions.clone(),
            lines,
        });
    }
    entries
}
