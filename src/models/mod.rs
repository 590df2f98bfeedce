//! Shared data models for module records, dependency edges, and versions.

pub mod version;

pub use version::Version;

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A dependency declared in a module's metadata.
pub struct DependencyDeclaration {
    pub name: String,
    pub version: Version,
}

impl DependencyDeclaration {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        DependencyDeclaration {
            name: name.into(),
            version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One successfully read module: its identity and declared dependencies.
pub struct ModuleRecord {
    pub name: String,
    pub version: Version,
    /// File the record was read from; diagnostics only.
    pub path: PathBuf,
    pub dependencies: Vec<DependencyDeclaration>,
}

impl ModuleRecord {
    pub fn new(name: impl Into<String>, dependencies: Vec<DependencyDeclaration>) -> Self {
        ModuleRecord {
            name: name.into(),
            version: Version::default(),
            path: PathBuf::new(),
            dependencies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single edge: `requested_by` asked for `version` of some dependency.
pub struct DependencyObservation {
    pub version: Version,
    pub requested_by: String,
}
