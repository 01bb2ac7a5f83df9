//! Backend reading a previously captured walk from disk.
//!
//! # File Format
//!
//! ```text
//! .1.3.6.1.2.1.1.1.0 "Linux sw1 5.10.0"
//! .1.3.6.1.2.1.1.2.0 .1.3.6.1.4.1.8072.3.2.10
//! .1.3.6.1.2.1.1.9.1.3.1 "first line
//! second line"
//! ```
//!
//! A line starting with `.` begins a new `<oid> <value>` record; any other
//! line belongs to the previous record's value (joined with a newline).

use crate::config::HostConfig;
use crate::error::{Error, Result};
use crate::oid::{Oid, ScalarOid};
use crate::value::strip_value;
use crate::varbind::{RowInfo, VarBind};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Debug, Clone)]
struct Record {
    oid: Oid,
    /// Value text as written in the dump, not yet stripped.
    raw: Vec<u8>,
}

/// Serves `get`/`walk` from a stored walk file.
///
/// The file is read on first use and kept in memory, ordered numerically by
/// OID so lookups are binary searches.
#[derive(Debug, Clone)]
pub struct StoredWalkBackend {
    config: Arc<HostConfig>,
    path: PathBuf,
    records: Arc<OnceCell<Vec<Record>>>,
}

impl StoredWalkBackend {
    /// Backend for the dump at `path`. A missing file is reported on first use.
    pub fn open(config: Arc<HostConfig>, path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            path: path.into(),
            records: Arc::new(OnceCell::new()),
        }
    }

    /// Backend over dump text already in memory.
    pub fn from_text(config: Arc<HostConfig>, text: impl AsRef<[u8]>) -> Self {
        Self {
            config,
            path: PathBuf::from("<memory>"),
            records: Arc::new(OnceCell::from(parse_dump(text.as_ref()))),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn records(&self) -> Result<&[Record]> {
        let records = self
            .records
            .get_or_try_init(|| async {
                let data = tokio::fs::read(&self.path)
                    .await
                    .map_err(|source| Error::StoredWalk {
                        path: self.path.clone(),
                        source,
                    })?;
                let records = parse_dump(&data);
                tracing::debug!(
                    snmp.host = %self.config.hostname,
                    snmp.path = %self.path.display(),
                    snmp.records = records.len(),
                    "loaded stored walk"
                );
                Ok::<_, Error>(records)
            })
            .await?;
        Ok(records)
    }

    /// All records equal to or below `oid`.
    pub async fn walk(&self, oid: &Oid) -> Result<RowInfo> {
        let records = self.records().await?;
        Ok(matching(records, oid)
            .iter()
            .map(|r| VarBind::new(r.oid.clone(), strip_value(&r.raw)))
            .collect())
    }

    /// Exact lookup, or the first record below the prefix for `.*` lookups.
    pub async fn get(&self, oid: &ScalarOid) -> Result<Option<Bytes>> {
        let rows = self.walk(oid.oid()).await?;
        if oid.is_next() {
            return Ok(rows
                .into_iter()
                .find(|vb| vb.oid.is_below(oid.oid()))
                .map(|vb| vb.value));
        }
        match rows.as_slice() {
            [only] if only.oid == *oid.oid() => Ok(Some(only.value.clone())),
            _ => Ok(None),
        }
    }
}

/// Contiguous run of records sharing the prefix `oid`.
///
/// Records are ordered numerically, so everything under a prefix sits between
/// the first record not less than the prefix and the first one that no longer
/// starts with it.
fn matching<'a>(records: &'a [Record], oid: &Oid) -> &'a [Record] {
    let start = records.partition_point(|r| r.oid < *oid);
    let len = records[start..]
        .iter()
        .take_while(|r| r.oid.starts_with(oid))
        .count();
    &records[start..start + len]
}

fn parse_dump(data: &[u8]) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();
    let mut skipping = false;

    for line in data.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            let (oid_text, value) = match line.iter().position(|&b| b == b' ') {
                Some(space) => (&line[..space], &line[space + 1..]),
                None => (line, &line[line.len()..]),
            };
            match std::str::from_utf8(oid_text).map(Oid::parse) {
                Ok(Ok(oid)) => {
                    records.push(Record {
                        oid,
                        raw: value.to_vec(),
                    });
                    skipping = false;
                }
                _ => {
                    tracing::debug!(
                        snmp.line = %String::from_utf8_lossy(line),
                        "skipping stored walk record with invalid OID"
                    );
                    skipping = true;
                }
            }
        } else if !skipping && let Some(last) = records.last_mut() {
            last.raw.push(b'\n');
            last.raw.extend_from_slice(line);
        }
    }

    // Trailing newline of the file is not part of the last value
    if let Some(last) = records.last_mut()
        && data.ends_with(b"\n")
        && last.raw.last() == Some(&b'\n')
    {
        last.raw.pop();
    }

    records.sort_by(|a, b| a.oid.cmp(&b.oid));
    records
}
