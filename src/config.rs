//! Per-host acquisition configuration.
//!
//! A [`HostConfig`] is built once per polling cycle, either through
//! [`HostConfig::builder()`] or by deserializing the JSON handed over by the
//! configuration layer. It is immutable afterwards.
//!
//! # Examples
//!
//! ```
//! use snmp_acquire::config::{Credentials, HostConfig};
//! use std::time::Duration;
//!
//! let config = HostConfig::builder("switch01", "10.1.1.1")
//!     .credentials(Credentials::community("private"))
//!     .bulkwalk(true)
//!     .bulk_size(25)
//!     .timeout(Duration::from_millis(2500))
//!     .retries(2)
//!     .build();
//!
//! assert_eq!(config.port, 161);
//! assert_eq!(config.bulk_size, 25);
//! ```

use crate::error::{Error, Result};
use crate::v3::{AuthProtocol, PrivProtocol, SecurityLevel};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Default SNMP port; omitted from the command line target.
pub const DEFAULT_PORT: u16 = 161;

/// Default number of repetitions per bulk request.
pub const DEFAULT_BULK_SIZE: u32 = 10;

/// Deadline for a single `get` process when none is configured.
pub const DEFAULT_GET_DEADLINE: Duration = Duration::from_secs(60);

/// Deadline for a single walk process when none is configured.
pub const DEFAULT_WALK_DEADLINE: Duration = Duration::from_secs(300);

/// A secret string (community or passphrase), wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plain text, for handing to the external command.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(***)")
    }
}

/// SNMPv3 user-based security credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsmCredentials {
    pub level: SecurityLevel,
    pub security_name: String,
    pub auth: Option<(AuthProtocol, Secret)>,
    pub privacy: Option<(PrivProtocol, Secret)>,
}

/// Host credentials.
///
/// In configuration files these are either a community string or a 2, 4 or
/// 6 element array for SNMPv3:
///
/// - `[level, security_name]`
/// - `[level, auth_protocol, security_name, auth_password]`
/// - `[level, auth_protocol, security_name, auth_password, priv_protocol, priv_password]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CredentialsRepr", into = "CredentialsRepr")]
pub enum Credentials {
    /// SNMPv1/v2c community.
    Community(Secret),
    /// SNMPv3 USM.
    Usm(UsmCredentials),
}

impl Credentials {
    /// Community-based credentials.
    pub fn community(community: impl Into<String>) -> Self {
        Self::Community(Secret::new(community))
    }

    /// Parse the v3 tuple shape.
    ///
    /// ```
    /// use snmp_acquire::config::Credentials;
    ///
    /// let creds = Credentials::from_tuple(&["authNoPriv", "md5", "monitor", "secret123"]).unwrap();
    /// assert!(creds.is_v3());
    /// assert!(Credentials::from_tuple(&["authNoPriv", "md5", "monitor"]).is_err());
    /// ```
    pub fn from_tuple<S: AsRef<str>>(parts: &[S]) -> Result<Self> {
        let parts: Vec<&str> = parts.iter().map(AsRef::as_ref).collect();
        let invalid = |reason: String| Error::InvalidCredentials { reason };

        let level = |s: &str| {
            s.parse::<SecurityLevel>()
                .map_err(|e| invalid(e.to_string()))
        };
        let auth = |proto: &str, pass: &str| {
            proto
                .parse::<AuthProtocol>()
                .map(|p| (p, Secret::new(pass)))
                .map_err(|e| invalid(e.to_string()))
        };
        let privacy = |proto: &str, pass: &str| {
            proto
                .parse::<PrivProtocol>()
                .map(|p| (p, Secret::new(pass)))
                .map_err(|e| invalid(e.to_string()))
        };

        let usm = match parts[..] {
            [lvl, name] => UsmCredentials {
                level: level(lvl)?,
                security_name: name.to_string(),
                auth: None,
                privacy: None,
            },
            [lvl, auth_proto, name, auth_pass] => UsmCredentials {
                level: level(lvl)?,
                security_name: name.to_string(),
                auth: Some(auth(auth_proto, auth_pass)?),
                privacy: None,
            },
            [lvl, auth_proto, name, auth_pass, priv_proto, priv_pass] => UsmCredentials {
                level: level(lvl)?,
                security_name: name.to_string(),
                auth: Some(auth(auth_proto, auth_pass)?),
                privacy: Some(privacy(priv_proto, priv_pass)?),
            },
            _ => {
                return Err(invalid(format!(
                    "must be a string, 2-tuple, 4-tuple or 6-tuple, got {} elements",
                    parts.len()
                )));
            }
        };
        Ok(Self::Usm(usm))
    }

    /// Whether these are SNMPv3 credentials.
    pub fn is_v3(&self) -> bool {
        matches!(self, Self::Usm(_))
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::community("public")
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CredentialsRepr {
    Community(String),
    Tuple(Vec<String>),
}

impl TryFrom<CredentialsRepr> for Credentials {
    type Error = Error;

    fn try_from(repr: CredentialsRepr) -> Result<Self> {
        match repr {
            CredentialsRepr::Community(c) => Ok(Self::community(c)),
            CredentialsRepr::Tuple(parts) => Self::from_tuple(&parts),
        }
    }
}

impl From<Credentials> for CredentialsRepr {
    fn from(creds: Credentials) -> Self {
        match &creds {
            Credentials::Community(c) => Self::Community(c.expose().to_string()),
            Credentials::Usm(usm) => {
                let mut parts = vec![usm.level.to_string()];
                match &usm.auth {
                    Some((proto, pass)) => {
                        parts.push(proto.to_string());
                        parts.push(usm.security_name.clone());
                        parts.push(pass.expose().to_string());
                    }
                    None => parts.push(usm.security_name.clone()),
                }
                if let Some((proto, pass)) = &usm.privacy {
                    parts.push(proto.to_string());
                    parts.push(pass.expose().to_string());
                }
                Self::Tuple(parts)
            }
        }
    }
}

/// Timeout and retry settings passed to the net-snmp tools, plus the hard
/// deadline after which a running command is killed.
///
/// Deserializing rejects negative and non-finite seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimingRepr")]
pub struct Timing {
    /// Per-request timeout in seconds (`-t`).
    pub timeout: Option<f64>,
    /// Retry count (`-r`).
    pub retries: Option<u32>,
    /// Deadline in seconds for one command; kills the process when exceeded.
    pub deadline: Option<f64>,
}

impl Timing {
    /// Deadline for a get. Values that are not a valid duration fall back to
    /// [`DEFAULT_GET_DEADLINE`].
    pub fn get_deadline(&self) -> Duration {
        self.deadline
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(DEFAULT_GET_DEADLINE)
    }

    pub fn walk_deadline(&self) -> Duration {
        self.deadline
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(DEFAULT_WALK_DEADLINE)
    }

    /// Check that `timeout` and `deadline` are usable durations.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("timeout", self.timeout), ("deadline", self.deadline)] {
            if let Some(secs) = value {
                seconds(name, secs)?;
            }
        }
        Ok(())
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct TimingRepr {
    timeout: Option<f64>,
    retries: Option<u32>,
    deadline: Option<f64>,
}

impl TryFrom<TimingRepr> for Timing {
    type Error = Error;

    fn try_from(repr: TimingRepr) -> Result<Self> {
        let timing = Self {
            timeout: repr.timeout,
            retries: repr.retries,
            deadline: repr.deadline,
        };
        timing.validate()?;
        Ok(timing)
    }
}

/// Convert a configured number of seconds named `name` into a [`Duration`].
pub fn seconds(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| Error::InvalidConfig {
        reason: format!("{} must be non-negative seconds, got {}", name, secs),
    })
}

/// Restricts which rows of a walk are kept, by position in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeLimit {
    /// The first `n` rows.
    First(usize),
    /// The last `n` rows.
    Last(usize),
    /// `n` rows starting at row `from` (zero based).
    Mid(usize, usize),
}

impl RangeLimit {
    /// Whether row `index` of a walk with `total` rows lies in this range.
    pub fn contains(&self, index: usize, total: usize) -> bool {
        match *self {
            Self::First(n) => index < n,
            Self::Last(n) => index >= total.saturating_sub(n),
            Self::Mid(from, n) => index >= from && index < from.saturating_add(n),
        }
    }
}

/// SNMPv3 contexts to query for a section (or all sections when `section` is unset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRule {
    #[serde(default)]
    pub section: Option<String>,
    pub contexts: Vec<String>,
}

/// Which backend serves this host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Run the net-snmp command line tools.
    #[default]
    Classic,
    /// Read a previously captured walk from disk.
    StoredWalk,
}

/// Immutable per-host parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub hostname: String,
    pub address: String,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub is_ipv6_primary: bool,
    #[serde(default)]
    pub bulkwalk: bool,
    #[serde(default)]
    pub snmpv2c: bool,
    #[serde(default = "default_bulk_size")]
    pub bulk_size: u32,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub character_encoding: Option<String>,
    #[serde(default)]
    pub oid_range_limits: BTreeMap<String, Vec<RangeLimit>>,
    #[serde(default)]
    pub snmpv3_contexts: Vec<ContextRule>,
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub missing_sys_description: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bulk_size() -> u32 {
    DEFAULT_BULK_SIZE
}

impl HostConfig {
    /// Start building a configuration for `hostname` reachable at `address`.
    pub fn builder(hostname: impl Into<String>, address: impl Into<String>) -> HostConfigBuilder {
        HostConfigBuilder::new(hostname, address)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| Error::Format { path: None, source })
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| Error::format(path, e))
    }

    /// The protocol version the command line tools are invoked with.
    ///
    /// Bulk walk implies v2c for community-based hosts.
    pub fn version(&self) -> Version {
        match &self.credentials {
            Credentials::Usm(_) => Version::V3,
            Credentials::Community(_) if self.bulkwalk || self.snmpv2c => Version::V2c,
            Credentials::Community(_) => Version::V1,
        }
    }

    /// Contexts to query when walking for `section`.
    ///
    /// `None` in the result means "no `-n` flag". Community-based hosts always
    /// get a single context-less query.
    pub fn contexts_for(&self, section: Option<&str>) -> Vec<Option<String>> {
        if !self.credentials.is_v3() {
            return vec![None];
        }
        self.snmpv3_contexts
            .iter()
            .find(|rule| match (&rule.section, section) {
                (None, _) => true,
                (Some(wanted), Some(actual)) => wanted == actual,
                (Some(_), None) => false,
            })
            .map(|rule| rule.contexts.iter().cloned().map(Some).collect())
            .unwrap_or_else(|| vec![None])
    }

    /// Row range limits configured for `section`, if any.
    pub fn range_limits(&self, section: Option<&str>) -> Option<&[RangeLimit]> {
        section
            .and_then(|s| self.oid_range_limits.get(s))
            .map(Vec::as_slice)
            .filter(|limits| !limits.is_empty())
    }
}

/// Builder for [`HostConfig`].
#[derive(Debug, Clone)]
pub struct HostConfigBuilder {
    config: HostConfig,
}

impl HostConfigBuilder {
    fn new(hostname: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            config: HostConfig {
                hostname: hostname.into(),
                address: address.into(),
                credentials: Credentials::default(),
                port: DEFAULT_PORT,
                is_ipv6_primary: false,
                bulkwalk: false,
                snmpv2c: false,
                bulk_size: DEFAULT_BULK_SIZE,
                timing: Timing::default(),
                character_encoding: None,
                oid_range_limits: BTreeMap::new(),
                snmpv3_contexts: Vec::new(),
                backend: BackendKind::default(),
                missing_sys_description: false,
            },
        }
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = credentials;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn ipv6(mut self, enabled: bool) -> Self {
        self.config.is_ipv6_primary = enabled;
        self
    }

    pub fn bulkwalk(mut self, enabled: bool) -> Self {
        self.config.bulkwalk = enabled;
        self
    }

    pub fn snmpv2c(mut self, enabled: bool) -> Self {
        self.config.snmpv2c = enabled;
        self
    }

    pub fn bulk_size(mut self, size: u32) -> Self {
        self.config.bulk_size = size;
        self
    }

    /// Set the per-request timeout (`-t`).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timing.timeout = Some(timeout.as_secs_f64());
        self
    }

    /// Set the retry count (`-r`).
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.timing.retries = Some(retries);
        self
    }

    /// Set the deadline after which a running command is killed.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config.timing.deadline = Some(deadline.as_secs_f64());
        self
    }

    pub fn character_encoding(mut self, label: impl Into<String>) -> Self {
        self.config.character_encoding = Some(label.into());
        self
    }

    pub fn range_limits(mut self, section: impl Into<String>, limits: Vec<RangeLimit>) -> Self {
        self.config.oid_range_limits.insert(section.into(), limits);
        self
    }

    pub fn v3_contexts(mut self, section: Option<&str>, contexts: Vec<String>) -> Self {
        self.config.snmpv3_contexts.push(ContextRule {
            section: section.map(str::to_string),
            contexts,
        });
        self
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn missing_sys_description(mut self, missing: bool) -> Self {
        self.config.missing_sys_description = missing;
        self
    }

    pub fn build(self) -> HostConfig {
        self.config
    }
}

/// Locations of the on-disk caches and stored walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub var_dir: PathBuf,
}

impl Paths {
    pub fn new(var_dir: impl Into<PathBuf>) -> Self {
        Self {
            var_dir: var_dir.into(),
        }
    }

    /// Directory holding one walk cache file per fetch OID.
    pub fn walk_cache_dir(&self, hostname: &str) -> PathBuf {
        self.var_dir.join("snmp_cache").join(hostname)
    }

    /// Single-value cache file for a hostname/address pair.
    pub fn scan_cache_file(&self, hostname: &str, address: &str) -> PathBuf {
        self.var_dir
            .join("snmp_scan_cache")
            .join(format!("{}.{}", hostname, address))
    }

    /// Stored walk of a host.
    pub fn stored_walk_file(&self, hostname: &str) -> PathBuf {
        self.var_dir.join("snmpwalks").join(hostname)
    }
}
