//! Per-host memo of walk results, keyed by fetch OID.

use crate::backend::Backend;
use crate::error::Result;
use crate::oid::Oid;
use crate::tree::TreeSpec;
use crate::util::{read_json, write_json};
use crate::varbind::RowInfo;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct CachedWalk {
    save: bool,
    rows: RowInfo,
}

/// Walk results of one host cycle.
///
/// Overlapping trees that walk the same fetch OID share one walk. Entries
/// whose first requester asked for caching are written to
/// `<dir>/OID<fetch-oid>` by [`save`](Self::save) and can be read back by
/// [`load`](Self::load) in a later cycle.
#[derive(Debug, Clone, Default)]
pub struct WalkCache {
    dir: Option<PathBuf>,
    entries: BTreeMap<Oid, CachedWalk>,
}

impl WalkCache {
    /// In-memory cache without persistence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache persisted below `dir` (usually [`Paths::walk_cache_dir`](crate::config::Paths::walk_cache_dir)).
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            entries: BTreeMap::new(),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// File holding the cached rows of `oid` below `dir`.
    pub fn file_path(dir: &Path, oid: &Oid) -> PathBuf {
        dir.join(format!("OID{}", oid))
    }

    /// Read cached walks for the fetch OIDs of `trees`.
    ///
    /// A fetch OID is only read from disk when every column requesting it
    /// allows caching; one column asking for live data keeps it live for all.
    /// Missing files are skipped, unreadable ones are skipped with a warning.
    /// Returns the number of entries loaded.
    pub async fn load<'a>(
        &mut self,
        trees: impl IntoIterator<Item = &'a TreeSpec>,
    ) -> Result<usize> {
        let Some(dir) = self.dir.clone() else {
            return Ok(0);
        };

        let mut wanted: BTreeMap<Oid, bool> = BTreeMap::new();
        for tree in trees {
            for (oid, save) in tree.fetch_oids() {
                wanted
                    .entry(oid)
                    .and_modify(|cached| *cached &= save)
                    .or_insert(save);
            }
        }

        let mut loaded = 0;
        for (oid, cached) in wanted {
            if !cached {
                tracing::trace!(snmp.oid = %oid, "live data requested, not reading walk cache");
                continue;
            }
            if self.entries.contains_key(&oid) {
                continue;
            }

            let path = Self::file_path(&dir, &oid);
            match read_json::<RowInfo>(&path).await {
                Ok(Some(rows)) => {
                    tracing::trace!(snmp.oid = %oid, snmp.rows = rows.len(), "walk cache hit on disk");
                    self.entries.insert(oid, CachedWalk { save: true, rows });
                    loaded += 1;
                }
                Ok(None) => {
                    tracing::debug!(snmp.oid = %oid, "no walk cache file");
                }
                Err(e) => {
                    tracing::warn!(snmp.oid = %oid, error = %e, "ignoring unreadable walk cache file");
                }
            }
        }
        Ok(loaded)
    }

    /// Rows of `oid`, walking through `backend` on a miss.
    ///
    /// `save` is recorded for entries created by this call; an existing entry
    /// keeps its flag.
    pub async fn fetch(
        &mut self,
        backend: &Backend,
        oid: &Oid,
        save: bool,
        section: Option<&str>,
        base: Option<&Oid>,
    ) -> Result<RowInfo> {
        if let Some(cached) = self.entries.get(oid) {
            tracing::trace!(snmp.oid = %oid, "walk cache hit");
            return Ok(cached.rows.clone());
        }

        let rows = backend.walk_contexts(oid, section, base).await?;
        if let Entry::Vacant(slot) = self.entries.entry(oid.clone()) {
            slot.insert(CachedWalk {
                save,
                rows: rows.clone(),
            });
        }
        Ok(rows)
    }

    /// Cached rows of `oid`, if any.
    pub fn get(&self, oid: &Oid) -> Option<&RowInfo> {
        self.entries.get(oid).map(|e| &e.rows)
    }

    /// Write every entry flagged for caching. Returns the number written.
    pub async fn save(&self) -> Result<usize> {
        let Some(dir) = &self.dir else {
            return Ok(0);
        };
        let mut written = 0;
        for (oid, entry) in self.entries.iter().filter(|(_, e)| e.save) {
            write_json(&Self::file_path(dir, oid), &entry.rows).await?;
            written += 1;
        }
        tracing::debug!(snmp.dir = %dir.display(), snmp.entries = written, "saved walk cache");
        Ok(written)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
