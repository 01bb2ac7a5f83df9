//! Memo of scalar lookups made during detection.

use crate::backend::Backend;
use crate::config::Paths;
use crate::detect::{BoxFuture, ValueLookup};
use crate::error::Result;
use crate::oid::ScalarOid;
use crate::util::{read_json, write_json};
use crate::value::TextDecoder;
use std::collections::BTreeMap;

/// Hit and miss counts of a [`SingleValueCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Decoded scalar values of one host/address pair.
///
/// Absent values are cached too. The cache remembers which host and address
/// it belongs to; a lookup or load for another pair empties it first.
#[derive(Debug, Clone, Default)]
pub struct SingleValueCache {
    host: Option<(String, String)>,
    values: BTreeMap<ScalarOid, Option<String>>,
    stats: CacheStats,
}

impl SingleValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host and address the cached values belong to.
    pub fn host(&self) -> Option<(&str, &str)> {
        self.host.as_ref().map(|(h, a)| (h.as_str(), a.as_str()))
    }

    /// Switch to `hostname`/`address`, dropping values of any other pair.
    pub fn select_host(&mut self, hostname: &str, address: &str) {
        if self.host() == Some((hostname, address)) {
            return;
        }
        if !self.values.is_empty() {
            tracing::debug!(
                snmp.host = %hostname,
                snmp.address = %address,
                snmp.dropped = self.values.len(),
                "host changed, clearing single value cache"
            );
        }
        self.values.clear();
        self.host = Some((hostname.to_string(), address.to_string()));
    }

    /// Cached value of `oid`, fetching and decoding it through `backend` on
    /// a miss.
    pub async fn get(&mut self, backend: &Backend, oid: &ScalarOid) -> Result<Option<String>> {
        let config = backend.config();
        self.select_host(&config.hostname, &config.address);

        if let Some(value) = self.values.get(oid) {
            self.stats.hits += 1;
            tracing::trace!(snmp.host = %config.hostname, snmp.oid = %oid, "single value cache hit");
            return Ok(value.clone());
        }

        self.stats.misses += 1;
        let decoder = TextDecoder::for_label(config.character_encoding.as_deref())?;
        let value = backend
            .get(oid, None)
            .await?
            .map(|raw| decoder.decode(&raw));
        self.values.insert(oid.clone(), value.clone());
        Ok(value)
    }

    /// Cached value without fetching. `None` means not cached.
    pub fn peek(&self, oid: &ScalarOid) -> Option<Option<&str>> {
        self.values.get(oid).map(Option::as_deref)
    }

    /// Record a value for the current host.
    pub fn insert(&mut self, oid: ScalarOid, value: Option<String>) {
        self.values.insert(oid, value);
    }

    /// Lookup adapter for [`evaluate`](crate::detect::evaluate).
    pub fn with_backend<'a>(&'a mut self, backend: &'a Backend) -> BackendLookup<'a> {
        BackendLookup {
            cache: self,
            backend,
        }
    }

    /// Replace the cache with the file of `hostname`/`address`.
    ///
    /// Returns whether a file was read. Unreadable files are ignored with a
    /// warning and leave the cache empty.
    pub async fn load(&mut self, paths: &Paths, hostname: &str, address: &str) -> Result<bool> {
        self.select_host(hostname, address);
        self.values.clear();

        let path = paths.scan_cache_file(hostname, address);
        match read_json::<BTreeMap<ScalarOid, Option<String>>>(&path).await {
            Ok(Some(values)) => {
                tracing::debug!(
                    snmp.host = %hostname,
                    snmp.entries = values.len(),
                    "loaded single value cache"
                );
                self.values = values;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                tracing::warn!(snmp.host = %hostname, error = %e, "ignoring unreadable single value cache");
                Ok(false)
            }
        }
    }

    /// Write the values of the current host to its cache file.
    pub async fn save(&self, paths: &Paths) -> Result<()> {
        let Some((hostname, address)) = self.host() else {
            return Ok(());
        };
        write_json(&paths.scan_cache_file(hostname, address), &self.values).await
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// [`SingleValueCache`] paired with the backend that fills it.
#[derive(Debug)]
pub struct BackendLookup<'a> {
    cache: &'a mut SingleValueCache,
    backend: &'a Backend,
}

impl ValueLookup for BackendLookup<'_> {
    fn lookup<'a>(&'a mut self, oid: &'a ScalarOid) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(self.cache.get(self.backend, oid))
    }
}
