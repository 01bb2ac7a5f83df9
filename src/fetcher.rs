//! One host's acquisition cycle.

use crate::backend::Backend;
use crate::cache::{SingleValueCache, WalkCache};
use crate::config::{HostConfig, Paths};
use crate::detect::{OnError, detect_sections, prefetch_system_oids};
use crate::error::Result;
use crate::section::{SectionName, SectionStore};
use crate::table::{Table, build_table};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Backend and caches of one host, plus the cycle's cancellation token.
///
/// # Example
///
/// ```no_run
/// use snmp_acquire::config::{HostConfig, Paths};
/// use snmp_acquire::detect::OnError;
/// use snmp_acquire::fetcher::HostFetcher;
/// use snmp_acquire::section::SectionStore;
///
/// # async fn example() -> snmp_acquire::Result<()> {
/// let store = SectionStore::load("sections.json".as_ref())?;
/// let config = HostConfig::builder("sw1", "10.0.0.1").bulkwalk(true).build();
/// let mut fetcher = HostFetcher::new(config, Paths::new("/var/lib/acquire"));
///
/// let sections = fetcher.detect(&store, OnError::Warn, true).await?;
/// for (name, tables) in fetcher.fetch(&store, &sections).await? {
///     println!("{}: {} tables", name, tables.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HostFetcher {
    backend: Backend,
    paths: Paths,
    single: SingleValueCache,
    walks: WalkCache,
    cancel: CancellationToken,
}

impl HostFetcher {
    /// Fetcher using the backend configured for the host.
    pub fn new(config: HostConfig, paths: Paths) -> Self {
        Self::with_cancel(config, paths, CancellationToken::new())
    }

    /// Fetcher whose running commands are killed when `cancel` fires.
    pub fn with_cancel(config: HostConfig, paths: Paths, cancel: CancellationToken) -> Self {
        let backend = Backend::for_host(Arc::new(config), &paths, cancel.clone());
        Self::with_backend(backend, paths, cancel)
    }

    /// Fetcher around an existing backend.
    pub fn with_backend(backend: Backend, paths: Paths, cancel: CancellationToken) -> Self {
        let walks = WalkCache::with_dir(paths.walk_cache_dir(&backend.config().hostname));
        Self {
            backend,
            paths,
            single: SingleValueCache::new(),
            walks,
            cancel,
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn config(&self) -> &HostConfig {
        self.backend.config()
    }

    pub fn single_value_cache(&self) -> &SingleValueCache {
        &self.single
    }

    pub fn walk_cache(&self) -> &WalkCache {
        &self.walks
    }

    /// Token cancelling every command of this cycle.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Sections of `store` whose detect spec holds for this host.
    ///
    /// With `use_scan_cache` the single value cache is read from disk first
    /// and written back afterwards. System description and object are
    /// fetched before any spec is evaluated; `on_error` decides what happens
    /// when they are missing as well as when a single section fails.
    pub async fn detect(
        &mut self,
        store: &SectionStore,
        on_error: OnError,
        use_scan_cache: bool,
    ) -> Result<Vec<SectionName>> {
        let config = self.backend.config();
        if use_scan_cache {
            self.single
                .load(&self.paths, &config.hostname, &config.address)
                .await?;
        } else {
            self.single.select_host(&config.hostname, &config.address);
        }

        let mut lookup = self.single.with_backend(&self.backend);
        let result = prefetch_system_oids(&mut lookup, config).await;
        let prefetched = on_error.handle(result, "system")?;

        let found = match prefetched {
            Some(()) => detect_sections(store.detect_specs(), &mut lookup, on_error).await?,
            None => Vec::new(),
        };

        tracing::debug!(
            snmp.host = %config.hostname,
            snmp.sections = found.len(),
            snmp.lookups = self.single.stats().misses,
            "detection finished"
        );

        if use_scan_cache && let Err(e) = self.single.save(&self.paths).await {
            tracing::warn!(snmp.host = %config.hostname, error = %e, "cannot save single value cache");
        }
        Ok(found)
    }

    /// Tables of the given sections, in store order.
    ///
    /// Names missing from `store` are skipped. Cached walks are read before
    /// the first table is built and the walk cache is written afterwards.
    pub async fn fetch(
        &mut self,
        store: &SectionStore,
        sections: &[SectionName],
    ) -> Result<BTreeMap<SectionName, Vec<Table>>> {
        for name in sections {
            if store.get(name.as_str()).is_none() {
                tracing::debug!(snmp.section = %name, "unknown section, skipped");
            }
        }

        let selected: Vec<_> = store
            .iter()
            .filter(|(name, _)| sections.contains(name))
            .collect();

        self.walks
            .load(selected.iter().flat_map(|(_, spec)| &spec.trees))
            .await?;

        let mut tables = BTreeMap::new();
        for (name, spec) in selected {
            let mut section_tables = Vec::with_capacity(spec.trees.len());
            for tree in &spec.trees {
                let table =
                    build_table(tree, &self.backend, &mut self.walks, Some(name.as_str())).await?;
                section_tables.push(table);
            }
            tables.insert(name.clone(), section_tables);
        }

        if let Err(e) = self.walks.save().await {
            tracing::warn!(
                snmp.host = %self.backend.config().hostname,
                error = %e,
                "cannot save walk cache"
            );
        }
        Ok(tables)
    }
}
