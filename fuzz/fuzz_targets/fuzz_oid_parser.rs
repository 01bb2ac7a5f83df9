#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_acquire::oid::{Oid, ScalarOid};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that parses must print back to something that parses equal
        if let Ok(oid) = Oid::parse(s) {
            assert_eq!(Oid::parse(&oid.to_string()).ok(), Some(oid));
        }
        let _ = ScalarOid::parse(s);
    }
});
