//! Assembling walk results into aligned tables.
//!
//! Each fetched column of a [`TreeSpec`] is walked separately. Rows are
//! matched across columns by their end-OID, the part of the row OID below
//! the column's fetch OID. Devices that leave out rows in some columns get an
//! empty cell in those places, so every column ends up with one cell per
//! end-OID seen in any column.

use crate::backend::Backend;
use crate::cache::WalkCache;
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::tree::{SpecialColumn, TreeSpec, ValueEncoding};
use crate::value::TextDecoder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One decoded table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Binary(Vec<u8>),
}

impl Cell {
    /// Empty cell of the given kind, used where a device left out a row.
    pub fn placeholder(binary: bool) -> Self {
        if binary {
            Self::Binary(Vec::new())
        } else {
            Self::Text(String::new())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Binary(b) => b.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Binary(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:02X}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// Row-major table; every row has one cell per tree column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec<Cell>> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Vec<Cell>;
    type IntoIter = std::slice::Iter<'a, Vec<Cell>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Cells of one column keyed by end-OID, plus the cell used for gaps.
pub type KeyedColumn = (Vec<(Oid, Cell)>, Cell);

/// Fetch and assemble the table described by `tree`.
///
/// Walks go through `walk_cache`, so columns shared with other trees of the
/// same host cycle are only walked once. `section` selects range limits and
/// SNMPv3 contexts.
pub async fn build_table(
    tree: &TreeSpec,
    backend: &Backend,
    walk_cache: &mut WalkCache,
    section: Option<&str>,
) -> Result<Table> {
    tree.validate()?;
    let decoder = TextDecoder::for_label(backend.config().character_encoding.as_deref())?;

    let mut columns: Vec<Option<KeyedColumn>> = Vec::with_capacity(tree.columns.len());
    // Fetch OID and row OIDs of the column with the most rows
    let mut largest: Option<(Oid, Vec<Oid>)> = None;

    for column in &tree.columns {
        if column.is_special() {
            columns.push(None);
            continue;
        }

        let fetch_oid = tree.base.join(&column.oid);
        let save = column.save_to_cache;
        let base = Some(&tree.base);
        let rows = walk_cache
            .fetch(backend, &fetch_oid, save, section, base)
            .await?;

        let widest = largest.as_ref().map(|(_, oids)| oids.len());
        if widest.is_none_or(|len| rows.len() > len) {
            let oids = rows.iter().map(|r| r.oid.clone()).collect();
            largest = Some((fetch_oid.clone(), oids));
        }

        let binary = column.encoding == ValueEncoding::Binary;
        let cells = rows
            .into_iter()
            .map(|row| {
                let cell = match column.encoding {
                    ValueEncoding::String => Cell::Text(decoder.decode(&row.value)),
                    ValueEncoding::Binary => Cell::Binary(row.value.to_vec()),
                };
                (end_oid(&fetch_oid, &row.oid), cell)
            })
            .collect();
        columns.push(Some((cells, Cell::placeholder(binary))));
    }

    if let Some((special_pos, kind)) = tree.special_column() {
        let (cells, fetch_oid) = match &largest {
            Some((fetch_oid, oids)) => {
                let cells = oids
                    .iter()
                    .map(|oid| {
                        let index = derive_index(kind, fetch_oid, oid)?;
                        Ok((end_oid(fetch_oid, oid), index))
                    })
                    .collect::<Result<Vec<_>>>()?;
                (cells, Some(fetch_oid))
            }
            None => (Vec::new(), None),
        };
        tracing::trace!(
            snmp.base = %tree.base,
            snmp.index_from = ?fetch_oid,
            snmp.rows = cells.len(),
            "derived index column"
        );
        columns[special_pos] = Some((cells, Cell::placeholder(kind.is_binary())));
    }

    let columns: Vec<KeyedColumn> = columns.into_iter().flatten().collect();
    let table = Table::from_rows(transpose(fill_gaps(columns)));
    tracing::debug!(
        snmp.host = %backend.config().hostname,
        snmp.base = %tree.base,
        snmp.rows = table.len(),
        "built table"
    );
    Ok(table)
}

/// Row OID below `fetch_oid`; the complete OID if it is not below it.
fn end_oid(fetch_oid: &Oid, row_oid: &Oid) -> Oid {
    row_oid
        .strip_prefix(fetch_oid)
        .unwrap_or_else(|| row_oid.clone())
}

/// Value of a special column for the row at `row_oid`.
///
/// ```
/// use snmp_acquire::oid;
/// use snmp_acquire::table::{derive_index, Cell};
/// use snmp_acquire::tree::SpecialColumn;
///
/// let fetch = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 6);
/// let row = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 6, 2);
/// assert_eq!(derive_index(SpecialColumn::End, &fetch, &row).unwrap(), Cell::Text("2".into()));
/// ```
pub fn derive_index(kind: SpecialColumn, fetch_oid: &Oid, row_oid: &Oid) -> Result<Cell> {
    let end = || end_oid(fetch_oid, row_oid);
    Ok(match kind {
        SpecialColumn::End => Cell::Text(end().to_relative_string()),
        SpecialColumn::String => Cell::Text(row_oid.to_string()),
        SpecialColumn::Bin => Cell::Binary(oid_to_bytes(row_oid)?),
        SpecialColumn::EndBin => Cell::Binary(oid_to_bytes(&end())?),
        SpecialColumn::EndOctetString => {
            let bytes = oid_to_bytes(&end())?;
            Cell::Binary(bytes.get(1..).map(<[u8]>::to_vec).unwrap_or_default())
        }
    })
}

/// One byte per arc.
fn oid_to_bytes(oid: &Oid) -> Result<Vec<u8>> {
    oid.arcs()
        .iter()
        .map(|&arc| {
            u8::try_from(arc).map_err(|_| Error::InvalidIndex {
                oid: oid.to_string(),
            })
        })
        .collect()
}

/// Align columns on the sorted union of their end-OIDs.
///
/// Each column must be ascending by end-OID. A column with fewer cells than
/// the union gets its placeholder wherever an end-OID is missing; every
/// column is padded at the end to the union's length. Columns whose row sets
/// are disjoint are aligned the same way, each showing placeholders for the
/// other's rows.
///
/// ```
/// use snmp_acquire::oid;
/// use snmp_acquire::table::{fill_gaps, Cell};
///
/// let text = |s: &str| Cell::Text(s.into());
/// let a = (vec![(oid!(1), text("a1")), (oid!(2), text("a2")), (oid!(3), text("a3"))], text(""));
/// let b = (vec![(oid!(1), text("b1")), (oid!(3), text("b3"))], text(""));
/// let filled = fill_gaps(vec![a, b]);
/// assert_eq!(filled[1], vec![text("b1"), text(""), text("b3")]);
/// ```
pub fn fill_gaps(columns: Vec<KeyedColumn>) -> Vec<Vec<Cell>> {
    let union: Vec<Oid> = columns
        .iter()
        .flat_map(|(cells, _)| cells.iter().map(|(oid, _)| oid.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    columns
        .into_iter()
        .map(|(cells, placeholder)| {
            let complete = cells.len() == union.len();
            let mut filled = Vec::with_capacity(union.len());
            let mut i = 0;
            for (oid, cell) in cells {
                if !complete {
                    while i < union.len() && union[i] != oid {
                        filled.push(placeholder.clone());
                        i += 1;
                    }
                }
                filled.push(cell);
                i += 1;
            }
            while i < union.len() {
                filled.push(placeholder.clone());
                i += 1;
            }
            filled
        })
        .collect()
}

/// Turn columns into rows. The shortest column bounds the row count.
pub fn transpose(columns: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    let mut iters: Vec<_> = columns.into_iter().map(Vec::into_iter).collect();
    (0..rows)
        .map(|_| iters.iter_mut().filter_map(Iterator::next).collect())
        .collect()
}
