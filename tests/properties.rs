//! Property tests for value rendering, row sanitizing and gap filling.

use proptest::prelude::*;
use snmp_acquire::oid::Oid;
use snmp_acquire::table::{Cell, fill_gaps};
use snmp_acquire::value::{render_value, strip_value};
use snmp_acquire::varbind::{VarBind, sanitize_rows};
use std::collections::BTreeSet;

fn arb_oid() -> impl Strategy<Value = Oid> {
    prop::collection::vec(0u32..20, 1..5).prop_map(|arcs| Oid::new(arcs))
}

proptest! {
    #[test]
    fn rendered_values_read_back(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(&strip_value(render_value(&bytes))[..], &bytes[..]);
    }

    #[test]
    fn sanitized_rows_strictly_ascending(oids in prop::collection::vec(arb_oid(), 0..32)) {
        let rows = oids
            .iter()
            .map(|oid| VarBind::new(oid.clone(), &b"x"[..]))
            .collect();
        let rows = sanitize_rows(rows);
        prop_assert!(rows.windows(2).all(|w| w[0].oid < w[1].oid));
    }

    #[test]
    fn filled_columns_cover_union(
        columns in prop::collection::vec(prop::collection::btree_set(arb_oid(), 0..16), 1..4)
    ) {
        let union: BTreeSet<&Oid> = columns.iter().flatten().collect();
        let keyed = columns
            .iter()
            .map(|oids| {
                let cells = oids
                    .iter()
                    .map(|oid| (oid.clone(), Cell::Text(oid.to_string())))
                    .collect();
                (cells, Cell::Text(String::new()))
            })
            .collect();

        let filled = fill_gaps(keyed);
        for (column, oids) in filled.iter().zip(&columns) {
            prop_assert_eq!(column.len(), union.len());
            for (cell, oid) in column.iter().zip(&union) {
                if oids.contains(*oid) {
                    prop_assert_eq!(cell, &Cell::Text(oid.to_string()));
                } else {
                    prop_assert!(cell.is_empty());
                }
            }
        }
    }
}
