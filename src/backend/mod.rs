//! Data sources answering `get` and `walk` for one host.
//!
//! [`Backend`] is a closed set of transports selected by
//! [`HostConfig::backend`](crate::config::HostConfig::backend):
//!
//! - [`ProcessBackend`] runs the net-snmp command line tools.
//! - [`StoredWalkBackend`] answers from a walk captured earlier.
//!
//! Both return row info in the same shape: numerically ascending, no
//! duplicate OIDs, range limits of the requesting section applied.

mod command;
mod process;
mod stored;

pub use command::{CommandKind, CommandOutput, SnmpCommand};
pub use process::{ProcessBackend, parse_response};
pub use stored::StoredWalkBackend;

use crate::config::{BackendKind, HostConfig, Paths, RangeLimit};
use crate::error::Result;
use crate::oid::{Oid, ScalarOid};
use crate::varbind::{RowInfo, sanitize_rows};
use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One host's transport.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Backend {
    Process(ProcessBackend),
    StoredWalk(StoredWalkBackend),
}

impl Backend {
    /// The backend configured for `config`.
    ///
    /// Stored walks are looked up under `paths`; process commands are killed
    /// when `cancel` fires.
    pub fn for_host(config: Arc<HostConfig>, paths: &Paths, cancel: CancellationToken) -> Self {
        match config.backend {
            BackendKind::Classic => Self::Process(ProcessBackend::new(config, cancel)),
            BackendKind::StoredWalk => {
                let path = paths.stored_walk_file(&config.hostname);
                Self::StoredWalk(StoredWalkBackend::open(config, path))
            }
        }
    }

    pub fn config(&self) -> &HostConfig {
        match self {
            Self::Process(b) => b.config(),
            Self::StoredWalk(b) => b.config(),
        }
    }

    /// Fetch one scalar value.
    ///
    /// A [`ScalarOid`] ending in `.*` returns the first value strictly below
    /// the prefix. Soft misses are `Ok(None)`.
    pub async fn get(&self, oid: &ScalarOid, context: Option<&str>) -> Result<Option<Bytes>> {
        tracing::trace!(snmp.host = %self.config().hostname, snmp.oid = %oid, "get");
        match self {
            Self::Process(b) => b.get(oid, context).await,
            Self::StoredWalk(b) => b.get(oid).await,
        }
    }

    /// Walk the subtree below `oid`.
    ///
    /// `section` selects the range limits to apply. `base` is the tree the
    /// walk belongs to and only shows up in logs.
    pub async fn walk(
        &self,
        oid: &Oid,
        section: Option<&str>,
        base: Option<&Oid>,
        context: Option<&str>,
    ) -> Result<RowInfo> {
        let config = self.config();
        tracing::debug!(
            snmp.host = %config.hostname,
            snmp.oid = %oid,
            snmp.base = ?base,
            snmp.context = ?context,
            "walk"
        );

        let rows = match self {
            Self::Process(b) => b.walk(oid, context).await?,
            Self::StoredWalk(b) => b.walk(oid).await?,
        };
        let rows = sanitize_rows(rows);

        Ok(match config.range_limits(section) {
            Some(limits) => apply_range_limits(rows, limits, oid),
            None => rows,
        })
    }

    /// Walk `oid` once per SNMPv3 context configured for `section`.
    ///
    /// Results of all contexts are concatenated; an OID seen in an earlier
    /// context wins over later ones.
    pub async fn walk_contexts(
        &self,
        oid: &Oid,
        section: Option<&str>,
        base: Option<&Oid>,
    ) -> Result<RowInfo> {
        let contexts = self.config().contexts_for(section);
        if let [single] = contexts.as_slice() {
            return self.walk(oid, section, base, single.as_deref()).await;
        }

        let mut rows = RowInfo::new();
        for context in &contexts {
            rows.extend(self.walk(oid, section, base, context.as_deref()).await?);
        }
        Ok(sanitize_rows(rows))
    }
}

/// Keep only rows whose position falls in at least one of `limits`.
fn apply_range_limits(rows: RowInfo, limits: &[RangeLimit], oid: &Oid) -> RowInfo {
    let total = rows.len();
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            if limits.iter().any(|l| l.contains(index, total)) {
                Some(row)
            } else {
                tracing::debug!(
                    snmp.oid = %oid,
                    snmp.row = %row.oid,
                    "row outside configured OID range, skipped"
                );
                None
            }
        })
        .collect()
}
