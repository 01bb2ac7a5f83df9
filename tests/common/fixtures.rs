//! Common test fixtures and constants.

use snmp_acquire::backend::{Backend, StoredWalkBackend};
use snmp_acquire::config::HostConfig;
use snmp_acquire::{Oid, ScalarOid, oid};
use std::sync::Arc;

// =============================================================================
// Standard system MIB OIDs (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> ScalarOid {
    ScalarOid::exact(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))
}
pub fn sys_object_id() -> ScalarOid {
    ScalarOid::exact(oid!(1, 3, 6, 1, 2, 1, 1, 2, 0))
}
pub fn sys_name() -> ScalarOid {
    ScalarOid::exact(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0))
}

// =============================================================================
// Subtree roots (for walks)
// =============================================================================

/// System subtree root: 1.3.6.1.2.1.1
pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// ifEntry: 1.3.6.1.2.1.2.2.1
pub fn if_entry() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1)
}

/// ifXEntry: 1.3.6.1.2.1.31.1.1.1
pub fn if_x_entry() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1)
}

// =============================================================================
// Stored walks
// =============================================================================

/// A small switch: system group, three interfaces, two ifX rows.
///
/// Interface 3 has no ifName, so ifX columns are shorter than ifEntry ones.
pub const SWITCH_WALK: &str = "\
.1.3.6.1.2.1.1.1.0 \"Linux sw1 5.10.0 #1 SMP x86_64\"
.1.3.6.1.2.1.1.2.0 .1.3.6.1.4.1.8072.3.2.10
.1.3.6.1.2.1.1.3.0 1234567
.1.3.6.1.2.1.1.5.0 \"sw1\"
.1.3.6.1.2.1.1.6.0 \"Zürich, rack 4\"
.1.3.6.1.2.1.2.2.1.1.1 1
.1.3.6.1.2.1.2.2.1.1.2 2
.1.3.6.1.2.1.2.2.1.1.3 3
.1.3.6.1.2.1.2.2.1.2.1 \"lo\"
.1.3.6.1.2.1.2.2.1.2.2 \"eth0\"
.1.3.6.1.2.1.2.2.1.2.3 \"eth1\"
.1.3.6.1.2.1.2.2.1.6.1 \"\"
.1.3.6.1.2.1.2.2.1.6.2 \"00 1A 2B 3C 4D 5E \"
.1.3.6.1.2.1.2.2.1.6.3 \"00 1A 2B 3C 4D 5F \"
.1.3.6.1.2.1.2.2.1.8.1 1
.1.3.6.1.2.1.2.2.1.8.2 1
.1.3.6.1.2.1.2.2.1.8.3 2
.1.3.6.1.2.1.31.1.1.1.1.1 \"lo\"
.1.3.6.1.2.1.31.1.1.1.1.2 \"eth0\"
.1.3.6.1.4.1.2021.4.5.0 8048236
.1.3.6.1.4.1.2021.4.6.0 1204932
";

/// Config for the host in [`SWITCH_WALK`].
pub fn switch_config() -> HostConfig {
    HostConfig::builder("sw1", "192.0.2.10").build()
}

/// Stored walk backend over `text` for the `sw1` host.
pub fn stored_backend(text: &str) -> Backend {
    let config = Arc::new(switch_config());
    Backend::StoredWalk(StoredWalkBackend::from_text(config, text))
}
