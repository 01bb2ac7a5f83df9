//! Deciding which sections apply to a device.
//!
//! A [`DetectSpec`] is an OR of AND-groups of [`DetectAtom`]s. Each atom
//! matches a regular expression against one scalar value of the device.
//! Values come from a [`ValueLookup`], normally the host's
//! [`SingleValueCache`](crate::cache::SingleValueCache).

use crate::config::HostConfig;
use crate::error::{Error, Result};
use crate::oid::ScalarOid;
use crate::section::SectionName;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`ValueLookup`] (dyn-compatible).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of decoded scalar values.
pub trait ValueLookup {
    /// Value of `oid`, `None` when the device has none.
    fn lookup<'a>(&'a mut self, oid: &'a ScalarOid) -> BoxFuture<'a, Result<Option<String>>>;
}

/// Fixed values, mostly for tests and offline evaluation. Missing keys are absent.
impl ValueLookup for BTreeMap<ScalarOid, String> {
    fn lookup<'a>(&'a mut self, oid: &'a ScalarOid) -> BoxFuture<'a, Result<Option<String>>> {
        let value = self.get(oid).cloned();
        Box::pin(async move { Ok(value) })
    }
}

/// Pattern that matches anything; with `expected == false` an atom using it
/// holds exactly when the value does not exist.
pub const WILDCARD: &str = ".*";

/// `(oid, pattern, expected)`: whether `pattern` fully matches the value of
/// `oid`, case-insensitively, must equal `expected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(ScalarOid, String, bool)", into = "(ScalarOid, String, bool)")]
pub struct DetectAtom {
    pub oid: ScalarOid,
    pub pattern: String,
    pub expected: bool,
}

impl DetectAtom {
    pub fn new(oid: ScalarOid, pattern: impl Into<String>, expected: bool) -> Self {
        Self {
            oid,
            pattern: pattern.into(),
            expected,
        }
    }

    /// Atom holding when `oid` has a value matching `pattern`.
    pub fn matches(oid: ScalarOid, pattern: impl Into<String>) -> Self {
        Self::new(oid, pattern, true)
    }

    /// Atom holding when `oid` has a value.
    pub fn exists(oid: ScalarOid) -> Self {
        Self::new(oid, WILDCARD, true)
    }

    /// Atom holding when `oid` has no value.
    pub fn not_exists(oid: ScalarOid) -> Self {
        Self::new(oid, WILDCARD, false)
    }

    /// Evaluate against an already fetched value.
    pub fn holds(&self, value: Option<&str>) -> Result<bool> {
        self.holds_with(value, &mut PatternCache::default())
    }

    /// Like [`holds`](Self::holds), reusing patterns compiled by earlier atoms.
    pub fn holds_with(&self, value: Option<&str>, patterns: &mut PatternCache) -> Result<bool> {
        let Some(value) = value else {
            return Ok(!self.expected && self.pattern == WILDCARD);
        };
        let regex = patterns.compile(&self.pattern)?;
        Ok(regex.is_match(value) == self.expected)
    }
}

/// Compiled detect patterns, keyed by pattern text.
///
/// One detection pass shares a cache across all sections, since most specs
/// test the same sysDescr and sysObjectID patterns.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    /// The anchored, case-insensitive regex for `pattern`.
    pub fn compile(&mut self, pattern: &str) -> Result<&Regex> {
        if !self.compiled.contains_key(pattern) {
            let regex = RegexBuilder::new(&format!("^(?:{})$", pattern))
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()
                .map_err(|source| Error::InvalidPattern {
                    pattern: pattern.to_string(),
                    source: Box::new(source),
                })?;
            self.compiled.insert(pattern.to_string(), regex);
        }
        Ok(&self.compiled[pattern])
    }

    /// Number of distinct patterns compiled so far.
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

impl From<(ScalarOid, String, bool)> for DetectAtom {
    fn from((oid, pattern, expected): (ScalarOid, String, bool)) -> Self {
        Self {
            oid,
            pattern,
            expected,
        }
    }
}

impl From<DetectAtom> for (ScalarOid, String, bool) {
    fn from(atom: DetectAtom) -> Self {
        (atom.oid, atom.pattern, atom.expected)
    }
}

/// OR of AND-groups. An empty spec never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectSpec(pub Vec<Vec<DetectAtom>>);

impl DetectSpec {
    pub fn new(groups: Vec<Vec<DetectAtom>>) -> Self {
        Self(groups)
    }

    /// Spec with a single AND-group.
    pub fn all(atoms: Vec<DetectAtom>) -> Self {
        Self(vec![atoms])
    }

    pub fn groups(&self) -> &[Vec<DetectAtom>] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every OID the spec may look up.
    pub fn oids(&self) -> impl Iterator<Item = &ScalarOid> {
        self.0.iter().flatten().map(|atom| &atom.oid)
    }
}

/// Whether `spec` holds for the values served by `lookup`.
///
/// Groups are tried in order and atoms within a group stop at the first one
/// that fails, so values are only looked up while the outcome is open.
///
/// ```
/// # tokio_test_block(async {
/// use snmp_acquire::detect::{evaluate, DetectAtom, DetectSpec};
/// use snmp_acquire::oid::ScalarOid;
/// use std::collections::BTreeMap;
///
/// let descr = ScalarOid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
/// let spec = DetectSpec::all(vec![DetectAtom::matches(descr.clone(), "cisco ios.*")]);
///
/// let mut values = BTreeMap::new();
/// values.insert(descr, "Cisco IOS Software, C2960".to_string());
/// assert!(evaluate(&spec, &mut values).await.unwrap());
/// # });
/// # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub async fn evaluate<L: ValueLookup + ?Sized>(spec: &DetectSpec, lookup: &mut L) -> Result<bool> {
    evaluate_with(spec, lookup, &mut PatternCache::default()).await
}

/// [`evaluate`] with a pattern cache shared across several specs.
pub async fn evaluate_with<L: ValueLookup + ?Sized>(
    spec: &DetectSpec,
    lookup: &mut L,
    patterns: &mut PatternCache,
) -> Result<bool> {
    for group in spec.groups() {
        let mut group_holds = true;
        for atom in group {
            let value = lookup.lookup(&atom.oid).await?;
            if !atom.holds_with(value.as_deref(), patterns)? {
                group_holds = false;
                break;
            }
        }
        if group_holds {
            return Ok(true);
        }
    }
    Ok(false)
}

/// What to do when evaluating a section fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Return the error.
    #[default]
    Raise,
    /// Log a warning and treat the section as not applicable.
    Warn,
    /// Treat the section as not applicable.
    Ignore,
}

impl std::str::FromStr for OnError {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raise" => Ok(Self::Raise),
            "warn" => Ok(Self::Warn),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("unknown error policy '{}'", other)),
        }
    }
}

impl OnError {
    /// Apply the policy to a failed step.
    ///
    /// Transport errors are returned under every policy.
    pub fn handle<T>(self, result: Result<T>, what: &str) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_transport() => Err(e),
            Err(e) => match self {
                Self::Raise => Err(e),
                Self::Warn => {
                    tracing::warn!(snmp.section = %what, error = %e, "detection failed, skipping");
                    Ok(None)
                }
                Self::Ignore => {
                    tracing::debug!(snmp.section = %what, error = %e, "detection failed, skipping");
                    Ok(None)
                }
            },
        }
    }
}

/// Sections whose detect spec holds, in the order given.
pub async fn detect_sections<'s, L: ValueLookup + ?Sized>(
    sections: impl IntoIterator<Item = (&'s SectionName, &'s DetectSpec)>,
    lookup: &mut L,
    on_error: OnError,
) -> Result<Vec<SectionName>> {
    let mut patterns = PatternCache::default();
    let mut found = Vec::new();
    for (name, spec) in sections {
        let result = evaluate_with(spec, lookup, &mut patterns).await;
        if on_error.handle(result, name.as_str())? == Some(true) {
            tracing::debug!(snmp.section = %name, "section detected");
            found.push(name.clone());
        }
    }
    Ok(found)
}

/// Fetch `sysDescr.0` and `sysObjectID.0` ahead of detection.
///
/// Hosts not flagged with `missing_sys_description` must have both;
/// otherwise this fails with [`Error::MissingSysObject`].
pub async fn prefetch_system_oids<L: ValueLookup + ?Sized>(
    lookup: &mut L,
    config: &HostConfig,
) -> Result<()> {
    let system = [
        ("description", crate::oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)),
        ("object", crate::oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)),
    ];
    for (name, oid) in system {
        let scalar = ScalarOid::exact(oid);
        let value = lookup.lookup(&scalar).await?;
        if value.is_none() && !config.missing_sys_description {
            return Err(Error::MissingSysObject {
                hostname: config.hostname.clone(),
                oid: scalar.to_string(),
                name,
            });
        }
    }
    Ok(())
}
