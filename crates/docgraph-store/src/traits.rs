use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use docgraph_types::{AccountName, Checksum256};

use crate::error::StoreResult;

/// A secondary index key.
///
/// Keys of different kinds never compare equal, so one index may mix kinds
/// without false matches (though in practice each index uses one kind).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexKey {
    Int(u64),
    Hash(Checksum256),
    Account(AccountName),
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Hash(h) => write!(f, "{}", h.short_hex()),
            Self::Account(a) => write!(f, "{a}"),
        }
    }
}

impl From<u64> for IndexKey {
    fn from(v: u64) -> Self {
        Self::Int(v)
    }
}

impl From<Checksum256> for IndexKey {
    fn from(v: Checksum256) -> Self {
        Self::Hash(v)
    }
}

impl From<AccountName> for IndexKey {
    fn from(v: AccountName) -> Self {
        Self::Account(v)
    }
}

/// Declaration of one secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    /// At most one row per key.
    pub unique: bool,
}

impl IndexSpec {
    pub const fn unique(name: &'static str) -> Self {
        Self { name, unique: true }
    }

    pub const fn non_unique(name: &'static str) -> Self {
        Self {
            name,
            unique: false,
        }
    }
}

/// A row type that can live in a [`Table`].
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table name, used in errors and logs.
    const TABLE: &'static str;

    /// Secondary indexes maintained for this record type.
    const INDEXES: &'static [IndexSpec];

    fn primary_key(&self) -> u64;

    /// The row's key under every declared index.
    ///
    /// Must return exactly one entry per [`Record::INDEXES`] element.
    fn index_keys(&self) -> Vec<(&'static str, IndexKey)>;
}

/// Namespaced, ordered, keyed store of one record type.
///
/// All implementations must satisfy these invariants:
/// - Each call is atomic: either every row and index change lands or none does.
/// - `insert` and `update` check primary-key and unique-index constraints
///   before writing anything.
/// - Keys from `insert_with` are strictly increasing per scope and never reused,
///   even after the row holding the highest key is deleted.
/// - Reads return owned copies; mutating them does not touch the table.
pub trait Table<R: Record>: Send + Sync {
    /// Insert a row under its own primary key.
    fn insert(&self, scope: &AccountName, record: &R) -> StoreResult<()>;

    /// Allocate the next primary key, build the row with it, and insert it.
    fn insert_with(&self, scope: &AccountName, build: &dyn Fn(u64) -> R) -> StoreResult<R>;

    /// Point lookup by primary key.
    fn get(&self, scope: &AccountName, key: u64) -> StoreResult<Option<R>>;

    /// Every row whose `index` key equals `key`, in primary-key order.
    fn find(&self, scope: &AccountName, index: &str, key: &IndexKey) -> StoreResult<Vec<R>>;

    /// Replace an existing row (matched by primary key), reindexing it.
    fn update(&self, scope: &AccountName, record: &R) -> StoreResult<()>;

    /// Remove a row, returning it.
    fn delete(&self, scope: &AccountName, key: u64) -> StoreResult<R>;

    /// Every row in the scope, in primary-key order.
    fn scan(&self, scope: &AccountName) -> StoreResult<Vec<R>>;

    /// Number of rows in the scope.
    fn len(&self, scope: &AccountName) -> StoreResult<usize>;

    fn contains(&self, scope: &AccountName, key: u64) -> StoreResult<bool> {
        Ok(self.get(scope, key)?.is_some())
    }

    /// First row under `key` in `index`, if any.
    fn find_one(&self, scope: &AccountName, index: &str, key: &IndexKey) -> StoreResult<Option<R>> {
        Ok(self.find(scope, index, key)?.into_iter().next())
    }

    fn is_empty(&self, scope: &AccountName) -> StoreResult<bool> {
        Ok(self.len(scope)? == 0)
    }
}
