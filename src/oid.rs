//! Object Identifier (OID) types.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation for common OIDs.
//! The canonical text form carries a leading dot (`.1.3.6.1.2.1.1.1.0`), which is
//! what the net-snmp tools print with `-On` and what stored walks contain.
//!
//! Ordering is numeric per arc, so `.1.3.6.1.10` sorts after `.1.3.6.1.9`.

use crate::error::{Error, OidErrorKind, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

/// Object Identifier.
///
/// Stored as a sequence of arc values (u32). Uses SmallVec to avoid
/// heap allocation for OIDs with 16 or fewer arcs.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted notation.
    ///
    /// The leading dot is optional: `.1.3.6.1` and `1.3.6.1` parse to the same
    /// OID. Surrounding whitespace is ignored. An empty string (or a lone `.`)
    /// parses to the empty OID.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_acquire::oid::Oid;
    ///
    /// let oid = Oid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
    /// assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    /// assert_eq!(oid.to_string(), ".1.3.6.1.2.1.1.1.0");
    ///
    /// assert!(Oid::parse(".1.3..6").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if body.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();
        for part in body.split('.') {
            let arc: u32 = part.parse().map_err(|_| {
                Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s.to_string())
            })?;
            arcs.push(arc);
        }

        Ok(Self { arcs })
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Check if this OID starts with another OID.
    ///
    /// An OID always starts with itself, and any OID starts with an empty OID.
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.len() >= other.arcs.len() && self.arcs[..other.arcs.len()] == other.arcs[..]
    }

    /// Check if this OID lies strictly below `prefix` in the tree.
    pub fn is_below(&self, prefix: &Oid) -> bool {
        self.arcs.len() > prefix.arcs.len() && self.starts_with(prefix)
    }

    /// Arcs remaining after `prefix`, if this OID starts with it.
    ///
    /// ```
    /// use snmp_acquire::oid;
    ///
    /// let column = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 6);
    /// let row = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 6, 2);
    /// assert_eq!(row.strip_prefix(&column).unwrap().to_relative_string(), "2");
    /// ```
    pub fn strip_prefix(&self, prefix: &Oid) -> Option<Oid> {
        if self.starts_with(prefix) {
            Some(Oid::from_slice(&self.arcs[prefix.arcs.len()..]))
        } else {
            None
        }
    }

    /// Append another OID's arcs.
    pub fn join(&self, suffix: &Oid) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.extend_from_slice(&suffix.arcs);
        Oid { arcs }
    }

    /// Create a child OID by appending a single arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Dotted form without the leading dot, as used for end-OIDs.
    pub fn to_relative_string(&self) -> String {
        let mut out = String::with_capacity(self.arcs.len() * 3);
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(&arc.to_string());
        }
        out
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for arc in &self.arcs {
            write!(f, ".{}", arc)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Oid::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// OID requested by a scalar lookup.
///
/// A trailing `.*` turns the lookup into "first value below this prefix"
/// (a GETNEXT whose answer must still lie under the prefix).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScalarOid {
    oid: Oid,
    next: bool,
}

impl ScalarOid {
    /// Exact lookup of `oid`.
    pub fn exact(oid: Oid) -> Self {
        Self { oid, next: false }
    }

    /// First value below `prefix`.
    pub fn next_below(prefix: Oid) -> Self {
        Self {
            oid: prefix,
            next: true,
        }
    }

    /// Parse `.1.3.6.1.2.1.1.1.0` or `.1.3.6.1.4.1.9.*`.
    ///
    /// ```
    /// use snmp_acquire::oid::ScalarOid;
    ///
    /// let scalar = ScalarOid::parse(".1.3.6.1.4.1.9.*").unwrap();
    /// assert!(scalar.is_next());
    /// assert_eq!(scalar.oid().to_string(), ".1.3.6.1.4.1.9");
    /// assert_eq!(scalar.to_string(), ".1.3.6.1.4.1.9.*");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_oid(OidErrorKind::Empty));
        }
        match trimmed.strip_suffix(".*") {
            Some(prefix) => Ok(Self::next_below(Oid::parse(prefix)?)),
            None => Ok(Self::exact(Oid::parse(trimmed)?)),
        }
    }

    /// The OID (or the prefix, for next lookups).
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Whether this is a `.*` lookup.
    pub fn is_next(&self) -> bool {
        self.next
    }
}

impl fmt::Debug for ScalarOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScalarOid({})", self)
    }
}

impl fmt::Display for ScalarOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.next {
            write!(f, "{}.*", self.oid)
        } else {
            write!(f, "{}", self.oid)
        }
    }
}

impl std::str::FromStr for ScalarOid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Oid> for ScalarOid {
    fn from(oid: Oid) -> Self {
        Self::exact(oid)
    }
}

impl Serialize for ScalarOid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScalarOid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ScalarOid::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Macro to create an OID at compile time.
///
/// # Examples
///
/// ```
/// use snmp_acquire::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), ".1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_leading_dot() {
        let a = Oid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
        let b = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Oid::parse(".1.3.x").is_err());
        assert!(Oid::parse(".1..3").is_err());
        assert!(Oid::parse(".1.3.").is_err());
        assert!(Oid::parse("1.3.-1").is_err());
    }

    #[test]
    fn test_parse_empty() {
        assert!(Oid::parse("").unwrap().is_empty());
        assert!(Oid::parse(".").unwrap().is_empty());
    }

    #[test]
    fn test_display_has_leading_dot() {
        assert_eq!(oid!(1, 3, 6, 1).to_string(), ".1.3.6.1");
        assert_eq!(oid!(1, 3, 6, 1).to_relative_string(), "1.3.6.1");
        assert_eq!(Oid::empty().to_string(), "");
    }

    #[test]
    fn test_numeric_ordering() {
        // Lexicographic string order would put .10 before .9
        let nine = Oid::parse(".1.3.6.1.9").unwrap();
        let ten = Oid::parse(".1.3.6.1.10").unwrap();
        assert!(nine < ten);

        // A prefix sorts before anything below it
        assert!(oid!(1, 3, 6) < oid!(1, 3, 6, 0));
    }

    #[test]
    fn test_is_below() {
        let column = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
        assert!(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 1).is_below(&column));
        assert!(!column.is_below(&column));
        assert!(!oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 20).is_below(&column));
    }

    #[test]
    fn test_strip_prefix_and_join() {
        let base = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1);
        let column = oid!(6);
        let fetch = base.join(&column);
        assert_eq!(fetch.to_string(), ".1.3.6.1.2.1.2.2.1.6");

        let row = fetch.child(2);
        assert_eq!(row.strip_prefix(&fetch), Some(oid!(2)));
        assert_eq!(fetch.strip_prefix(&row), None);
    }

    #[test]
    fn test_scalar_oid() {
        let exact = ScalarOid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
        assert!(!exact.is_next());
        assert_eq!(exact.to_string(), ".1.3.6.1.2.1.1.1.0");

        let next = ScalarOid::parse("1.3.6.1.4.1.9.*").unwrap();
        assert!(next.is_next());
        assert_eq!(next.oid(), &oid!(1, 3, 6, 1, 4, 1, 9));
        assert_eq!(next.to_string(), ".1.3.6.1.4.1.9.*");

        assert!(ScalarOid::parse("").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let oid = oid!(1, 3, 6, 1, 2, 1);
        let json = serde_json::to_string(&oid).unwrap();
        assert_eq!(json, "\".1.3.6.1.2.1\"");
        let back: Oid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, oid);

        let scalar: ScalarOid = serde_json::from_str("\".1.3.6.1.4.1.*\"").unwrap();
        assert!(scalar.is_next());
    }

    #[test]
    fn test_macro() {
        let oid = oid!(1, 3, 6, 1);
        assert_eq!(oid.arcs(), &[1, 3, 6, 1]);
    }
}
