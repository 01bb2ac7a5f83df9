//! Stored walk backend tests.

mod common;

use common::*;
use snmp_acquire::backend::{Backend, StoredWalkBackend};
use snmp_acquire::{Error, ScalarOid, oid};
use std::sync::Arc;

#[tokio::test]
async fn test_get_exact() {
    let backend = stored_backend(SWITCH_WALK);
    let value = backend.get(&sys_name(), None).await.unwrap().unwrap();
    assert_eq!(&value[..], b"sw1");
}

#[tokio::test]
async fn test_get_missing_is_none() {
    let backend = stored_backend(SWITCH_WALK);
    let absent = ScalarOid::parse(".1.3.6.1.2.1.1.9.0").unwrap();
    assert!(backend.get(&absent, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_wildcard_returns_first_below() {
    let backend = stored_backend(SWITCH_WALK);
    let descr = ScalarOid::parse(".1.3.6.1.2.1.2.2.1.2.*").unwrap();
    let value = backend.get(&descr, None).await.unwrap().unwrap();
    assert_eq!(&value[..], b"lo");

    let nothing = ScalarOid::parse(".1.3.6.1.2.1.2.2.1.99.*").unwrap();
    assert!(backend.get(&nothing, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_walk_subtree() {
    let backend = stored_backend(SWITCH_WALK);
    let rows = backend
        .walk(&if_entry().child(2), None, None, None)
        .await
        .unwrap();
    let values: Vec<&[u8]> = rows.iter().map(|r| &r.value[..]).collect();
    assert_eq!(values, vec![&b"lo"[..], &b"eth0"[..], &b"eth1"[..]]);
}

#[tokio::test]
async fn test_walk_does_not_match_sibling_prefix() {
    // .1.3.6.1.2.1.2.2.1.1 must not pick up .1.3.6.1.2.1.2.2.1.10..
    let dump = format!("{}.1.3.6.1.2.1.2.2.1.10.1 5000\n", SWITCH_WALK);
    let backend = stored_backend(&dump);
    let rows = backend
        .walk(&if_entry().child(1), None, None, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_hex_dump_value_is_binary() {
    let backend = stored_backend(SWITCH_WALK);
    let rows = backend
        .walk(&if_entry().child(6), None, None, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].value.is_empty());
    assert_eq!(&rows[1].value[..], &[0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E]);
}

#[tokio::test]
async fn test_multiline_value() {
    let dump = ".1.3.6.1.2.1.1.1.0 \"first line\nsecond line\"\n.1.3.6.1.2.1.1.5.0 \"sw1\"\n";
    let backend = stored_backend(dump);
    let value = backend.get(&sys_descr(), None).await.unwrap().unwrap();
    assert_eq!(&value[..], b"first line\nsecond line");
}

#[tokio::test]
async fn test_unsorted_dump_is_searchable() {
    let dump = ".1.3.6.1.2.1.1.5.0 \"sw1\"\n.1.3.6.1.2.1.1.1.0 \"descr\"\n";
    let backend = stored_backend(dump);
    let subtree = system_subtree();
    let rows = backend.walk(&subtree, None, None, None).await.unwrap();
    assert_eq!(rows[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
    assert_eq!(rows[1].oid, oid!(1, 3, 6, 1, 2, 1, 1, 5, 0));
}

#[tokio::test]
async fn test_missing_dump_file() {
    let backend = Backend::StoredWalk(StoredWalkBackend::open(
        Arc::new(switch_config()),
        "/nonexistent/sw1",
    ));
    let err = backend.get(&sys_descr(), None).await.unwrap_err();
    assert!(matches!(err, Error::StoredWalk { .. }));
}

#[tokio::test]
async fn test_dump_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sw1");
    std::fs::write(&path, SWITCH_WALK).unwrap();

    let backend = Backend::StoredWalk(StoredWalkBackend::open(Arc::new(switch_config()), &path));
    let rows = backend.walk(&if_x_entry(), None, None, None).await.unwrap();
    assert_eq!(rows.len(), 2);
}
