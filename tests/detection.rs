//! Detection against stored walks, with and without the single value cache.

mod common;

use common::*;
use snmp_acquire::backend::StoredWalkBackend;
use snmp_acquire::cache::SingleValueCache;
use snmp_acquire::config::{HostConfig, Paths};
use snmp_acquire::detect::{DetectAtom, DetectSpec, OnError, detect_sections, evaluate};
use snmp_acquire::fetcher::HostFetcher;
use snmp_acquire::section::{SectionName, SectionSpec, SectionStore};
use snmp_acquire::{Backend, Error, ScalarOid};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn scalar(s: &str) -> ScalarOid {
    ScalarOid::parse(s).unwrap()
}

fn detect_only(detect: DetectSpec) -> SectionSpec {
    SectionSpec {
        trees: Vec::new(),
        detect,
    }
}

fn store() -> SectionStore {
    let netsnmp = r"\.1\.3\.6\.1\.4\.1\.8072\..*";
    let mut store = SectionStore::new();
    // net-snmp agents: object ID below the net-snmp enterprise
    store.insert(
        "netsnmp_mem",
        detect_only(DetectSpec::all(vec![
            DetectAtom::matches(scalar(".1.3.6.1.2.1.1.2.0"), netsnmp),
            DetectAtom::exists(scalar(".1.3.6.1.4.1.2021.4.5.0")),
        ])),
    );
    // either a Cisco or anything with ifX
    store.insert(
        "if64",
        detect_only(DetectSpec::new(vec![
            vec![DetectAtom::matches(scalar(".1.3.6.1.2.1.1.1.0"), "cisco.*")],
            vec![DetectAtom::exists(scalar(".1.3.6.1.2.1.31.1.1.1.1.*"))],
        ])),
    );
    store.insert(
        "hp_proliant",
        detect_only(DetectSpec::all(vec![DetectAtom::matches(
            scalar(".1.3.6.1.2.1.1.1.0"),
            ".*proliant.*",
        )])),
    );
    store.insert(
        "no_hr",
        detect_only(DetectSpec::all(vec![
            DetectAtom::matches(scalar(".1.3.6.1.2.1.1.1.0"), "linux.*"),
            DetectAtom::not_exists(scalar(".1.3.6.1.2.1.25.1.1.0")),
        ])),
    );
    store
}

#[tokio::test]
async fn test_sections_detected() {
    let backend = stored_backend(SWITCH_WALK);
    let mut cache = SingleValueCache::new();
    let store = store();

    let mut lookup = cache.with_backend(&backend);
    let found = detect_sections(store.detect_specs(), &mut lookup, OnError::Raise)
        .await
        .unwrap();
    assert_eq!(
        found,
        vec![
            SectionName::from("if64"),
            SectionName::from("netsnmp_mem"),
            SectionName::from("no_hr"),
        ]
    );
}

#[tokio::test]
async fn test_values_fetched_once() {
    let backend = stored_backend(SWITCH_WALK);
    let mut cache = SingleValueCache::new();
    let store = store();

    let mut lookup = cache.with_backend(&backend);
    detect_sections(store.detect_specs(), &mut lookup, OnError::Raise)
        .await
        .unwrap();
    let first = cache.stats();
    assert!(first.hits > 0);

    // sysDescr, sysObjectID, memTotal, ifName.*, hrSystemUptime
    assert_eq!(cache.len(), 5);
    assert_eq!(cache.peek(&scalar(".1.3.6.1.2.1.25.1.1.0")), Some(None));
    assert_eq!(cache.peek(&scalar(".1.3.6.1.2.1.1.5.0")), None);

    let mut lookup = cache.with_backend(&backend);
    detect_sections(store.detect_specs(), &mut lookup, OnError::Raise)
        .await
        .unwrap();
    assert_eq!(cache.stats().misses, first.misses);
}

#[tokio::test]
async fn test_invalid_pattern_follows_policy() {
    let backend = stored_backend(SWITCH_WALK);
    let mut store = store();
    store.insert(
        "broken",
        detect_only(DetectSpec::all(vec![DetectAtom::matches(
            scalar(".1.3.6.1.2.1.1.1.0"),
            "linux([",
        )])),
    );

    let mut cache = SingleValueCache::new();
    let mut lookup = cache.with_backend(&backend);
    let err = detect_sections(store.detect_specs(), &mut lookup, OnError::Raise)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPattern { .. }));

    for policy in [OnError::Warn, OnError::Ignore] {
        let found = detect_sections(store.detect_specs(), &mut lookup, policy)
            .await
            .unwrap();
        assert_eq!(found.len(), 3);
        assert!(!found.contains(&SectionName::from("broken")));
    }
}

#[tokio::test]
async fn test_transport_error_raised_under_every_policy() {
    let config = Arc::new(switch_config());
    let walk = StoredWalkBackend::open(config, "/nonexistent/sw1");
    let backend = Backend::StoredWalk(walk);
    let store = store();
    for policy in [OnError::Raise, OnError::Warn, OnError::Ignore] {
        let mut cache = SingleValueCache::new();
        let mut lookup = cache.with_backend(&backend);
        let result = detect_sections(store.detect_specs(), &mut lookup, policy).await;
        assert!(matches!(result, Err(Error::StoredWalk { .. })));
    }
}

#[tokio::test]
async fn test_empty_spec_never_holds() {
    let backend = stored_backend(SWITCH_WALK);
    let mut cache = SingleValueCache::new();
    let mut lookup = cache.with_backend(&backend);
    let holds = evaluate(&DetectSpec::default(), &mut lookup).await;
    assert!(!holds.unwrap());
}

#[tokio::test]
async fn test_scan_cache_reused_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let store = store();

    let mut first = HostFetcher::with_backend(
        stored_backend(SWITCH_WALK),
        paths.clone(),
        CancellationToken::new(),
    );
    let live = first.detect(&store, OnError::Raise, true).await.unwrap();

    // Same host, device now silent: every answer comes from the cache file
    let mut second =
        HostFetcher::with_backend(stored_backend(""), paths.clone(), CancellationToken::new());
    let cached = second.detect(&store, OnError::Raise, true).await.unwrap();
    assert_eq!(cached, live);
    assert_eq!(second.single_value_cache().stats().misses, 0);

    // Without the cache the silent device has no system description
    let mut third = HostFetcher::with_backend(stored_backend(""), paths, CancellationToken::new());
    let err = third.detect(&store, OnError::Raise, false).await;
    assert!(matches!(err.unwrap_err(), Error::MissingSysObject { .. }));
}

#[tokio::test]
async fn test_missing_sys_description_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let config = HostConfig::builder("printer", "192.0.2.20")
        .missing_sys_description(true)
        .build();
    let dump = ".1.3.6.1.2.1.31.1.1.1.1.1 \"lo\"\n";
    let walk = StoredWalkBackend::from_text(Arc::new(config), dump);
    let backend = Backend::StoredWalk(walk);
    let mut fetcher =
        HostFetcher::with_backend(backend, Paths::new(dir.path()), CancellationToken::new());
    let found = fetcher.detect(&store(), OnError::Raise, false).await;
    assert_eq!(found.unwrap(), vec![SectionName::from("if64")]);
}
