//! Section registrations: what to fetch for a section and when it applies.

use crate::detect::DetectSpec;
use crate::error::{Error, Result};
use crate::tree::TreeSpec;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Name of a monitoring section, e.g. `if64` or `hr_mem`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionName(String);

impl SectionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for SectionName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for SectionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Trees fetched for a section and the spec deciding whether it applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub trees: Vec<TreeSpec>,
    #[serde(default)]
    pub detect: DetectSpec,
}

/// All registered sections, ordered by name.
///
/// Serialized as a JSON object mapping section names to [`SectionSpec`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionStore {
    sections: BTreeMap<SectionName, SectionSpec>,
}

impl SectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a section, replacing any earlier registration of that name.
    pub fn insert(
        &mut self,
        name: impl Into<SectionName>,
        spec: SectionSpec,
    ) -> Option<SectionSpec> {
        self.sections.insert(name.into(), spec)
    }

    pub fn get(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SectionName, &SectionSpec)> {
        self.sections.iter()
    }

    /// `(name, detect spec)` pairs for [`detect_sections`](crate::detect::detect_sections).
    pub fn detect_specs(&self) -> impl Iterator<Item = (&SectionName, &DetectSpec)> {
        self.sections
            .iter()
            .map(|(name, spec)| (name, &spec.detect))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Check every tree of every section.
    pub fn validate(&self) -> Result<()> {
        self.sections
            .values()
            .flat_map(|spec| &spec.trees)
            .try_for_each(TreeSpec::validate)
    }

    /// Parse and validate a store from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let store: Self =
            serde_json::from_str(text).map_err(|source| Error::Format { path: None, source })?;
        store.validate()?;
        Ok(store)
    }

    /// Load and validate a store from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let store: Self = serde_json::from_str(&text).map_err(|e| Error::format(path, e))?;
        store.validate()?;
        Ok(store)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| Error::Format { path: None, source })
    }
}

impl FromIterator<(SectionName, SectionSpec)> for SectionStore {
    fn from_iter<I: IntoIterator<Item = (SectionName, SectionSpec)>>(iter: I) -> Self {
        Self {
            sections: iter.into_iter().collect(),
        }
    }
}
