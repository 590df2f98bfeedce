//! Conflict classification over a built `DependencyIndex`.

use crate::index::DependencyIndex;
use crate::models::{DependencyObservation, Version};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Distinct versions requested for one dependency, in first-seen order.
pub struct ConflictVerdict {
    pub versions: Vec<Version>,
    pub is_conflicting: bool,
}

impl ConflictVerdict {
    fn from_observations(observations: &[DependencyObservation]) -> Self {
        let mut versions: Vec<Version> = Vec::new();
        for obs in observations {
            if !versions.contains(&obs.version) {
                versions.push(obs.version);
            }
        }
        let is_conflicting = versions.len() > 1;
        ConflictVerdict {
            versions,
            is_conflicting,
        }
    }

    /// Position of `version` in first-seen order.
    pub fn group_of(&self, version: &Version) -> Option<usize> {
        self.versions.iter().position(|v| v == version)
    }
}

/// Classify a single dependency name; `None` when the index has no bucket for it.
pub fn classify(index: &DependencyIndex, name: &str) -> Option<ConflictVerdict> {
    index.get(name).map(ConflictVerdict::from_observations)
}

/// Classify every dependency, preserving index order.
pub fn classify_all(index: &DependencyIndex) -> IndexMap<String, ConflictVerdict> {
    index
        .iter()
        .map(|(name, obs)| (name.to_string(), ConflictVerdict::from_observations(obs)))
        .collect()
}
