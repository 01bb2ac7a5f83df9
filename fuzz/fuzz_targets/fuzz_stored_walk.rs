#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_acquire::backend::StoredWalkBackend;
use snmp_acquire::config::HostConfig;
use snmp_acquire::oid;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let config = Arc::new(HostConfig::builder("fuzz", "192.0.2.1").build());
    let backend = StoredWalkBackend::from_text(config, data);
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    rt.block_on(async {
        let rows = backend.walk(&oid!(1, 3, 6, 1)).await.unwrap();
        assert!(rows.windows(2).all(|w| w[0].oid <= w[1].oid));
    });
});
