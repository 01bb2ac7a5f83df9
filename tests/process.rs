//! Process backend tests against fake net-snmp tools.
#![cfg(unix)]

mod common;

use common::*;
use snmp_acquire::backend::{Backend, ProcessBackend};
use snmp_acquire::config::HostConfig;
use snmp_acquire::{Error, ScalarOid, oid};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// `SWITCH_WALK` as the tools print it with `-On -OQ`.
fn walk_output() -> String {
    let mut out = String::new();
    for line in SWITCH_WALK.lines() {
        let (oid, value) = line.split_once(' ').unwrap();
        out.push_str(&format!("{} = {}\n", oid, value));
    }
    out
}

fn process_backend(tools: &FakeTools, config: HostConfig, cancel: CancellationToken) -> Backend {
    let process = ProcessBackend::new(Arc::new(config), cancel);
    Backend::Process(process.with_tools_dir(tools.dir()))
}

#[tokio::test]
async fn test_walk_matches_stored_walk() {
    init_tracing();
    let tools = FakeTools::new();
    tools.respond("snmpwalk", &walk_output(), 0);
    let live = process_backend(&tools, switch_config(), CancellationToken::new());
    let stored = stored_backend(SWITCH_WALK);

    for oid in [if_entry(), if_x_entry(), system_subtree()] {
        assert_eq!(
            live.walk(&oid, None, None, None).await.unwrap(),
            stored.walk(&oid, None, None, None).await.unwrap(),
            "rows of {} differ",
            oid
        );
    }
}

#[tokio::test]
async fn test_get_value() {
    let tools = FakeTools::new();
    tools.respond("snmpget", ".1.3.6.1.2.1.1.5.0 = \"sw1\"\n", 0);
    let backend = process_backend(&tools, switch_config(), CancellationToken::new());
    let value = backend.get(&sys_name(), None).await.unwrap().unwrap();
    assert_eq!(&value[..], b"sw1");
}

#[tokio::test]
async fn test_get_soft_miss() {
    let tools = FakeTools::new();
    tools.respond(
        "snmpget",
        ".1.3.6.1.2.1.1.9.0 = No Such Object available on this agent at this OID\n",
        0,
    );
    let backend = process_backend(&tools, switch_config(), CancellationToken::new());
    let oid = ScalarOid::parse(".1.3.6.1.2.1.1.9.0").unwrap();
    assert!(backend.get(&oid, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_getnext_outside_subtree_is_none() {
    let tools = FakeTools::new();
    tools.respond("snmpgetnext", ".1.3.6.1.2.1.2.2.1.3.1 = 24\n", 0);
    let backend = process_backend(&tools, switch_config(), CancellationToken::new());
    let oid = ScalarOid::parse(".1.3.6.1.2.1.2.2.1.2.*").unwrap();
    assert!(backend.get(&oid, None).await.unwrap().is_none());

    tools.respond("snmpgetnext", ".1.3.6.1.2.1.2.2.1.2.1 = \"lo\"\n", 0);
    let value = backend.get(&oid, None).await.unwrap().unwrap();
    assert_eq!(&value[..], b"lo");
}

#[tokio::test]
async fn test_tool_failure_is_transport_error() {
    let tools = FakeTools::new();
    tools.fail("snmpwalk", "Timeout: No Response from 192.0.2.10");
    let backend = process_backend(&tools, switch_config(), CancellationToken::new());

    let entry = if_entry();
    let err = backend.walk(&entry, None, None, None).await.unwrap_err();
    assert!(err.is_transport());
    match err {
        Error::Transport { message, .. } => assert!(message.contains("No Response")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_tool() {
    let tools = FakeTools::new();
    let backend = process_backend(&tools, switch_config(), CancellationToken::new());
    let err = backend.get(&sys_descr(), None).await.unwrap_err();
    assert!(matches!(err, Error::Spawn { .. }));
}

#[tokio::test]
async fn test_deadline_kills_tool() {
    init_tracing();
    let tools = FakeTools::new();
    tools.hang("snmpbulkwalk");
    let config = HostConfig::builder("sw1", "192.0.2.10")
        .bulkwalk(true)
        .deadline(Duration::from_millis(200))
        .build();
    let backend = process_backend(&tools, config, CancellationToken::new());

    let entry = if_entry();
    let err = backend.walk(&entry, None, None, None).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
}

#[tokio::test]
async fn test_cancel_kills_tool() {
    let tools = FakeTools::new();
    tools.hang("snmpget");
    let cancel = CancellationToken::new();
    let backend = process_backend(&tools, switch_config(), cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });
    let err = backend.get(&sys_descr(), None).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled { .. }));
}

#[tokio::test]
async fn test_bulkwalk_command_line() {
    let tools = FakeTools::new();
    let args_file = tools.record_args("snmpbulkwalk");
    let config = HostConfig::builder("sw1", "192.0.2.10")
        .bulkwalk(true)
        .bulk_size(25)
        .build();
    let backend = process_backend(&tools, config, CancellationToken::new());

    let descr = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
    let rows = backend.walk(&descr, None, None, None).await.unwrap();
    assert!(rows.is_empty());

    let args = std::fs::read_to_string(args_file).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert!(args.contains(&"-Cr25"));
    assert!(args.contains(&"-v2c"));
    assert!(args.contains(&"-On"));
    let target = &args[args.len() - 2..];
    assert_eq!(target, ["192.0.2.10", ".1.3.6.1.2.1.2.2.1.2"]);
}
