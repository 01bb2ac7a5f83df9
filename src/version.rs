//! SNMP version enumeration.

use serde::{Deserialize, Serialize};

/// SNMP protocol version used towards a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Version {
    /// SNMPv1 (RFC 1157)
    #[default]
    #[serde(rename = "v1")]
    V1,
    /// SNMPv2c (RFC 1901)
    #[serde(rename = "v2c")]
    V2c,
    /// SNMPv3 (RFC 3411-3418)
    #[serde(rename = "v3")]
    V3,
}

impl Version {
    /// The net-snmp command line flag selecting this version.
    pub const fn flag(self) -> &'static str {
        match self {
            Version::V1 => "-v1",
            Version::V2c => "-v2c",
            Version::V3 => "-v3",
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::V1 => write!(f, "SNMPv1"),
            Version::V2c => write!(f, "SNMPv2c"),
            Version::V3 => write!(f, "SNMPv3"),
        }
    }
}
