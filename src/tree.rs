//! Declarative description of one SNMP table to fetch.
//!
//! A [`TreeSpec`] names a base OID and the columns below it. Each column is
//! either fetched (`base + column`) or, for at most one column per tree,
//! derived from the row OIDs of the other columns ([`SpecialColumn`]).

use crate::error::{Error, Result};
use crate::oid::Oid;
use serde::{Deserialize, Serialize};

/// How fetched bytes of a column are turned into cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueEncoding {
    /// Decode as text with the host's character encoding.
    #[default]
    String,
    /// Keep the raw bytes.
    Binary,
}

/// Column whose values come from the row OIDs instead of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecialColumn {
    /// Row OID below the fetched column, as dotted text (`"2"`, `"1.4"`).
    End,
    /// Complete row OID as dotted text.
    String,
    /// Complete row OID, one byte per arc.
    Bin,
    /// Row OID below the fetched column, one byte per arc.
    EndBin,
    /// Like [`EndBin`](Self::EndBin) without the leading length byte.
    EndOctetString,
}

impl SpecialColumn {
    /// Whether derived values are bytes rather than text.
    pub fn is_binary(self) -> bool {
        matches!(self, Self::Bin | Self::EndBin | Self::EndOctetString)
    }
}

/// One column of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// OID suffix below the tree's base. Unused for special columns.
    #[serde(default)]
    pub oid: Oid,
    #[serde(default)]
    pub encoding: ValueEncoding,
    /// Keep the walk result on disk across cycles.
    #[serde(default)]
    pub save_to_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<SpecialColumn>,
}

impl ColumnSpec {
    /// Text column at `suffix` below the base.
    pub fn new(suffix: Oid) -> Self {
        Self {
            oid: suffix,
            encoding: ValueEncoding::String,
            save_to_cache: false,
            special: None,
        }
    }

    /// Binary column at `suffix` below the base.
    pub fn binary(suffix: Oid) -> Self {
        Self {
            encoding: ValueEncoding::Binary,
            ..Self::new(suffix)
        }
    }

    /// Column derived from row OIDs.
    pub fn special(kind: SpecialColumn) -> Self {
        Self {
            special: Some(kind),
            ..Self::new(Oid::empty())
        }
    }

    /// Mark the column's walk for the on-disk cache.
    pub fn cached(mut self) -> Self {
        self.save_to_cache = true;
        self
    }

    pub fn is_special(&self) -> bool {
        self.special.is_some()
    }
}

/// Base OID plus ordered columns; the unit of one table fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSpec {
    pub base: Oid,
    pub columns: Vec<ColumnSpec>,
}

impl TreeSpec {
    /// Build and validate a tree.
    ///
    /// ```
    /// use snmp_acquire::oid;
    /// use snmp_acquire::tree::{ColumnSpec, SpecialColumn, TreeSpec};
    ///
    /// let tree = TreeSpec::new(
    ///     oid!(1, 3, 6, 1, 2, 1, 2, 2, 1),
    ///     vec![
    ///         ColumnSpec::special(SpecialColumn::End),
    ///         ColumnSpec::new(oid!(2)),
    ///         ColumnSpec::binary(oid!(6)),
    ///     ],
    /// )
    /// .unwrap();
    /// assert_eq!(tree.fetch_oids().count(), 2);
    /// ```
    pub fn new(base: Oid, columns: Vec<ColumnSpec>) -> Result<Self> {
        let tree = Self { base, columns };
        tree.validate()?;
        Ok(tree)
    }

    /// Check the column layout.
    ///
    /// A tree needs a base, at least one fetched column and at most one
    /// special column.
    pub fn validate(&self) -> Result<()> {
        if self.base.is_empty() {
            return Err(Error::invalid_tree(&self.base, "empty base OID"));
        }
        let specials = self.columns.iter().filter(|c| c.is_special()).count();
        if specials > 1 {
            return Err(Error::invalid_tree(
                &self.base,
                format!("{} special index columns, at most one allowed", specials),
            ));
        }
        if specials == self.columns.len() {
            return Err(Error::invalid_tree(&self.base, "no column to fetch"));
        }
        Ok(())
    }

    /// Position and kind of the special column, if any.
    pub fn special_column(&self) -> Option<(usize, SpecialColumn)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(i, c)| c.special.map(|kind| (i, kind)))
    }

    /// Fully qualified OIDs walked for this tree, with their cache flag.
    pub fn fetch_oids(&self) -> impl Iterator<Item = (Oid, bool)> + '_ {
        self.columns
            .iter()
            .filter(|c| !c.is_special())
            .map(|c| (self.base.join(&c.oid), c.save_to_cache))
    }
}
