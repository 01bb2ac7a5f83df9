//! Variable binding (VarBind) type.
//!
//! A VarBind pairs an OID with the raw bytes of its value.

use crate::oid::Oid;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Variable binding - an OID and its raw value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value, as bytes.
    pub value: Bytes,
}

impl VarBind {
    /// Create a new VarBind.
    pub fn new(oid: Oid, value: impl Into<Bytes>) -> Self {
        Self {
            oid,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {}",
            self.oid,
            crate::value::render_value(&self.value)
        )
    }
}

/// Rows of one walk, ascending by OID without duplicates.
pub type RowInfo = Vec<VarBind>;

/// Bring walk output into ascending order and drop repeated OIDs.
///
/// Some agents answer a walk by repeating one OID endlessly; in that case only
/// the first row is kept. Otherwise rows are stably sorted and later rows with
/// an OID already seen are discarded.
pub fn sanitize_rows(mut rows: RowInfo) -> RowInfo {
    if rows.len() > 1 && rows[0].oid == rows[1].oid {
        tracing::debug!(
            snmp.oid = %rows[0].oid,
            snmp.rows = rows.len(),
            "agent repeats the same OID, keeping the first row only"
        );
        rows.truncate(1);
        return rows;
    }

    if rows.windows(2).all(|w| w[0].oid < w[1].oid) {
        return rows;
    }

    rows.sort_by(|a, b| a.oid.cmp(&b.oid));
    let before = rows.len();
    rows.dedup_by(|later, earlier| {
        if later.oid == earlier.oid {
            tracing::debug!(snmp.oid = %later.oid, "dropping duplicate OID in walk response");
            true
        } else {
            false
        }
    });
    if rows.len() != before {
        tracing::debug!(
            snmp.dropped = before - rows.len(),
            "removed duplicate rows from walk response"
        );
    }
    rows
}
