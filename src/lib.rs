//! # snmp-acquire
//!
//! SNMP data acquisition for monitoring agents.
//!
//! The crate answers two questions for a host: which monitoring sections
//! apply to it (detection) and what the tables of those sections contain
//! (fetching). Values come from the net-snmp command line tools or from a
//! stored walk captured earlier.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp_acquire::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let store = SectionStore::load("sections.json".as_ref())?;
//! let config = HostConfig::builder("sw1", "192.0.2.1")
//!     .credentials(Credentials::community("public"))
//!     .bulkwalk(true)
//!     .build();
//!
//! let mut fetcher = HostFetcher::new(config, Paths::new("/var/lib/acquire"));
//! let sections = fetcher.detect(&store, OnError::Warn, true).await?;
//! let tables = fetcher.fetch(&store, &sections).await?;
//! for (name, tables) in &tables {
//!     println!("{}: {} tables", name, tables.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Backends
//!
//! - [`backend::ProcessBackend`] runs `snmpget`, `snmpwalk` or
//!   `snmpbulkwalk` per request and parses their numeric output.
//! - [`backend::StoredWalkBackend`] answers from a text dump with one
//!   `<oid> <value>` line per row, sorted by OID.
//!
//! ## Caches
//!
//! - [`cache::SingleValueCache`] keeps detection values per host and address.
//! - [`cache::WalkCache`] keeps walked columns between fetch cycles for
//!   columns flagged to be cached.
//!
//! ## Feature Flags
//!
//! - `cli`: the `acq-get`, `acq-walk` and `acq-fetch` tools.

pub mod backend;
pub mod cache;
pub mod config;
pub mod detect;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod oid;
pub mod prelude;
pub mod section;
pub mod table;
pub mod tree;
pub mod v3;
pub mod value;
pub mod varbind;
pub mod version;

#[cfg(feature = "cli")]
pub mod cli;

pub(crate) mod util;

pub use backend::Backend;
pub use config::{Credentials, HostConfig, Paths};
pub use error::{Error, Result};
pub use fetcher::HostFetcher;
pub use oid::{Oid, ScalarOid};
pub use varbind::VarBind;
pub use version::Version;
