//! Configuration discovery and effective settings resolution.
//!
//! asmspy reads `asmspy.toml|yaml|yml` from the analysed directory (or the
//! closest ancestor, stopping at a `.git` boundary) and merges it with the
//! CLI keywords to produce an `Effective` config.
//! File keys and defaults:
//! - `output`: `human`
//! - `extensions`: `["dll", "exe"]`
//! - `systemPrefixes`: `["System", "mscorlib", "netstandard"]`
//!
//! The report mode is set by the CLI keywords alone: conflicts-only unless
//! `all` is given, system names kept unless `nonsystem` is given.

use crate::report::ReportPolicy;
use crate::scan::DEFAULT_EXTENSIONS;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_NAMES: [&str; 3] = ["asmspy.toml", "asmspy.yaml", "asmspy.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `asmspy.toml|yaml`.
pub struct AsmSpyConfig {
    pub output: Option<String>,
    pub extensions: Option<Vec<String>>,
    #[serde(rename = "systemPrefixes")]
    pub system_prefixes: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
/// Fully-resolved settings for one run after applying precedence.
pub struct Effective {
    pub directory: PathBuf,
    pub config_file: Option<PathBuf>,
    pub output: String,
    pub extensions: Vec<String>,
    pub policy: ReportPolicy,
    /// Problems found while loading configuration; the run continues on defaults.
    pub warnings: Vec<String>,
}

/// Walk upward from `start` looking for a config file.
///
/// Stops at the first directory holding `asmspy.toml|yaml|yml` or a `.git`
/// entry; returns `None` when no config file is found on the way.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = start;
    loop {
        for name in CONFIG_NAMES {
            let candidate = cur.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if cur.join(".git").exists() {
            return None;
        }
        cur = cur.parent()?;
    }
}

/// Parse a config file, choosing TOML or YAML by extension.
pub fn load_config(path: &Path) -> Result<AsmSpyConfig, String> {
    let s = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&s).map_err(|e| e.to_string())
    } else {
        toml::from_str(&s).map_err(|e| e.to_string())
    }
}

/// Resolve `Effective` by merging CLI keywords, discovered config, and defaults.
///
/// `all` disables conflicts-only and `nonsystem` enables system filtering;
/// the config file never changes either mode.
pub fn resolve_effective(directory: &Path, cli_all: bool, cli_nonsystem: bool) -> Effective {
    let directory = fs::canonicalize(directory).unwrap_or_else(|_| directory.to_path_buf());
    let mut warnings = Vec::new();
    let config_file = find_config(&directory);
    let cfg = match config_file.as_deref().map(load_config) {
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            if let Some(p) = config_file.as_ref() {
                warnings.push(format!(
                    "Ignoring invalid config {}: {}",
                    p.to_string_lossy(),
                    e
                ));
            }
            AsmSpyConfig::default()
        }
        None => AsmSpyConfig::default(),
    };

    let mut output = cfg.output.unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        warnings.push(format!("Unknown output mode '{}'; using human.", output));
        output = "human".to_string();
    }

    let extensions = cfg
        .extensions
        .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect());

    let policy = ReportPolicy {
        only_conflicts: !cli_all,
        skip_system: cli_nonsystem,
        system_prefixes: cfg
            .system_prefixes
            .unwrap_or_else(|| ReportPolicy::default().system_prefixes),
    };

    Effective {
        directory,
        config_file,
        output,
        extensions,
        policy,
        warnings,
    }
}
