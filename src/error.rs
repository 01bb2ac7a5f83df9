//! Error types for snmp-acquire.
//!
//! All errors are `#[non_exhaustive]` to allow adding new variants without breaking changes.

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID string.
    Empty,
    /// Arc is not a decimal u32.
    InvalidArc,
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidArc => write!(f, "invalid arc value"),
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The external SNMP command exited unsuccessfully.
    #[error("SNMP error from {address}: {message}")]
    Transport { address: String, message: String },

    /// The external SNMP command exceeded its deadline and was killed.
    #[error("timeout after {elapsed:?} waiting for {address}")]
    Timeout { address: String, elapsed: Duration },

    /// The host cycle was cancelled while a command was running.
    #[error("request to {address} cancelled")]
    Cancelled { address: String },

    /// The external SNMP command could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored walk for a host is missing or unreadable.
    #[error("cannot read stored walk {}: {source}", path.display())]
    StoredWalk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error on a cache or output file.
    #[error("I/O error{}: {source}", path.as_ref().map(|p| format!(" on {}", p.display())).unwrap_or_default())]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// A cache or configuration file could not be (de)serialized.
    #[error("invalid data in {}: {source}", path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<input>".into()))]
    Format {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid OID format.
    #[error("invalid OID{}: {kind}", input.as_ref().map(|i| format!(" '{}'", i)).unwrap_or_default())]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>,
    },

    /// Credentials do not match any supported shape.
    #[error("invalid SNMP credentials: {reason}")]
    InvalidCredentials { reason: String },

    /// A host configuration value is out of range.
    #[error("invalid host configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A tree declares an unusable column layout.
    #[error("invalid tree {base}: {reason}")]
    InvalidTree { base: String, reason: String },

    /// An OID suffix cannot be represented as bytes.
    #[error("cannot derive binary index from {oid}: arc above 255")]
    InvalidIndex { oid: String },

    /// A detect pattern is not a valid regular expression.
    #[error("invalid detect pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// Unknown character encoding label in host configuration.
    #[error("unknown character encoding '{label}'")]
    UnknownEncoding { label: String },

    /// sysDescr or sysObjectID could not be retrieved before detection.
    #[error("cannot fetch system {name} ({oid}) of host {hostname}")]
    MissingSysObject {
        hostname: String,
        oid: String,
        name: &'static str,
    },
}

impl Error {
    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Create an I/O error tied to a file.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Create a serialization error tied to a file.
    pub fn format(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Format {
            path: Some(path.into()),
            source,
        }
    }

    /// Create a tree configuration error.
    pub fn invalid_tree(base: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidTree {
            base: base.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error comes from the transport layer.
    ///
    /// Transport errors are fatal for the host's whole cycle and are never
    /// downgraded by a detection error policy.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Timeout { .. }
                | Self::Cancelled { .. }
                | Self::Spawn { .. }
                | Self::StoredWalk { .. }
        )
    }

    /// Get the device address if this error has one.
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Transport { address, .. } => Some(address),
            Self::Timeout { address, .. } => Some(address),
            Self::Cancelled { address } => Some(address),
            _ => None,
        }
    }
}
