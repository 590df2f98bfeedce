//! Cross-module dependency index.
//!
//! Buckets are keyed by dependency name and kept in creation order, so the
//! order of names follows the order in which modules were processed. Callers
//! must pass records sorted by file name for output to be reproducible.

use crate::models::{DependencyObservation, ModuleRecord};
use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyIndex {
    buckets: IndexMap<String, Vec<DependencyObservation>>,
}

impl DependencyIndex {
    /// Flatten module records into per-dependency observation buckets.
    ///
    /// Declarations are visited in record order, then in the order the reader
    /// returned them. Duplicate (name, version) pairs are kept.
    pub fn build(records: &[ModuleRecord]) -> Self {
        let mut buckets: IndexMap<String, Vec<DependencyObservation>> = IndexMap::new();
        for record in records {
            for dep in &record.dependencies {
                buckets
                    .entry(dep.name.clone())
                    .or_default()
                    .push(DependencyObservation {
                        version: dep.version,
                        requested_by: record.name.clone(),
                    });
            }
        }
        DependencyIndex { buckets }
    }

    pub fn get(&self, name: &str) -> Option<&[DependencyObservation]> {
        self.buckets.get(name).map(Vec::as_slice)
    }

    /// Buckets in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DependencyObservation])> {
        self.buckets
            .iter()
            .map(|(name, obs)| (name.as_str(), obs.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
