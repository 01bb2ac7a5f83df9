//! Prelude module for convenient imports.
//!
//! This module provides a convenient set of commonly-used types and traits
//! for working with the snmp-acquire library.
//!
//! # Usage
//!
//! ```rust,no_run
//! use snmp_acquire::prelude::*;
//! ```
//!
//! This imports:
//! - Host setup: [`HostConfig`], [`Credentials`], [`Paths`], [`HostFetcher`]
//! - Transport: [`Backend`], [`Oid`], [`ScalarOid`], [`VarBind`]
//! - Section definitions: [`SectionStore`], [`SectionSpec`], [`TreeSpec`], [`ColumnSpec`], [`DetectSpec`]
//! - Error handling: [`Error`], [`Result`], [`OnError`]
//! - The [`oid!`] macro for OID construction

pub use crate::backend::Backend;
pub use crate::config::{Credentials, HostConfig, Paths};
pub use crate::detect::{DetectAtom, DetectSpec, OnError};
pub use crate::error::{Error, Result};
pub use crate::fetcher::HostFetcher;
pub use crate::oid::{Oid, ScalarOid};
pub use crate::section::{SectionName, SectionSpec, SectionStore};
pub use crate::table::{Cell, Table};
pub use crate::tree::{ColumnSpec, SpecialColumn, TreeSpec};
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
