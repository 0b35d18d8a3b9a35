//! Scoped, indexed record tables for docgraph.
//!
//! A [`Table`] is a namespaced, ordered key/value store of one record type.
//! Each row has a `u64` primary key and any number of secondary index keys
//! declared by the record type. Documents and edges are both stored this way.
//!
//! # Storage Backends
//!
//! All backends implement the [`Table`] trait:
//!
//! - [`InMemoryTable`] -- `BTreeMap`-based table for tests and embedding
//!
//! # Design Rules
//!
//! 1. Every operation on a table is atomic, index maintenance included.
//! 2. Primary keys are unique per scope; unique indexes are checked before any write.
//! 3. Allocated primary keys grow monotonically and are never handed out twice.
//! 4. Rows are stored encoded and decoded on read; callers own what they get back.
//! 5. Scopes never see each other's rows.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryTable;
pub use traits::{IndexKey, IndexSpec, Record, Table};
