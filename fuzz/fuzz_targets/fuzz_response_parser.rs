#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_acquire::backend::parse_response;
use snmp_acquire::value::{render_value, strip_value};

fuzz_target!(|data: &[u8]| {
    for row in parse_response(data) {
        let rendered = render_value(&row.value);
        assert_eq!(strip_value(rendered), row.value);
    }
});
