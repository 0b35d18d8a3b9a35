use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::marker::PhantomData;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;

use docgraph_types::AccountName;

use crate::error::{StoreError, StoreResult};
use crate::traits::{IndexKey, Record, Table};

/// Rows and indexes of one scope.
#[derive(Default)]
struct ScopeState {
    rows: BTreeMap<u64, Vec<u8>>,
    indexes: HashMap<&'static str, BTreeSet<(IndexKey, u64)>>,
    next_key: u64,
}

impl ScopeState {
    fn holders<'a>(&'a self, index: &str, key: &'a IndexKey) -> impl Iterator<Item = u64> + 'a {
        self.indexes
            .get(index)
            .into_iter()
            .flat_map(move |set| {
                set.range((key.clone(), 0)..=(key.clone(), u64::MAX))
                    .map(|(_, pk)| *pk)
            })
    }

    fn add_to_indexes(&mut self, pk: u64, keys: Vec<(&'static str, IndexKey)>) {
        for (index, key) in keys {
            self.indexes.entry(index).or_default().insert((key, pk));
        }
    }

    fn remove_from_indexes(&mut self, pk: u64, keys: Vec<(&'static str, IndexKey)>) {
        for (index, key) in keys {
            if let Some(set) = self.indexes.get_mut(index) {
                set.remove(&(key, pk));
            }
        }
    }
}

/// In-memory, `BTreeMap`-based table.
///
/// Intended for tests and embedding. Rows are stored as bincode bytes behind
/// a `RwLock`, so every read decodes a fresh copy and every record type is
/// exercised through its storage encoding.
pub struct InMemoryTable<R> {
    scopes: RwLock<HashMap<AccountName, ScopeState>>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> InMemoryTable<R> {
    pub fn new() -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
            _record: PhantomData,
        }
    }

    /// Scopes that currently hold at least one row.
    pub fn scopes(&self) -> StoreResult<Vec<AccountName>> {
        let map = self.read()?;
        let mut scopes: Vec<AccountName> = map
            .iter()
            .filter(|(_, state)| !state.rows.is_empty())
            .map(|(scope, _)| scope.clone())
            .collect();
        scopes.sort();
        Ok(scopes)
    }

    /// Remove every row in every scope. Allocation counters are kept.
    pub fn clear(&self) -> StoreResult<()> {
        let mut map = self.write()?;
        for state in map.values_mut() {
            state.rows.clear();
            state.indexes.clear();
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<AccountName, ScopeState>>> {
        self.scopes.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<AccountName, ScopeState>>> {
        self.scopes.write().map_err(|_| StoreError::LockPoisoned)
    }

    fn encode(record: &R) -> StoreResult<Vec<u8>> {
        bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> StoreResult<R> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn check_index(index: &str) -> StoreResult<()> {
        if R::INDEXES.iter().any(|spec| spec.name == index) {
            Ok(())
        } else {
            Err(StoreError::UnknownIndex {
                table: R::TABLE,
                index: index.to_string(),
            })
        }
    }

    /// Fail if any unique index key of `record` is held by a row other than
    /// the record itself.
    fn check_unique(state: &ScopeState, record: &R) -> StoreResult<()> {
        let pk = record.primary_key();
        for (index, key) in record.index_keys() {
            let unique = R::INDEXES
                .iter()
                .any(|spec| spec.name == index && spec.unique);
            if !unique {
                continue;
            }
            if let Some(existing) = state.holders(index, &key).find(|holder| *holder != pk) {
                return Err(StoreError::UniqueViolation {
                    table: R::TABLE,
                    index,
                    key: key.to_string(),
                    existing,
                });
            }
        }
        Ok(())
    }

    fn insert_into(state: &mut ScopeState, record: &R) -> StoreResult<()> {
        let pk = record.primary_key();
        if state.rows.contains_key(&pk) {
            return Err(StoreError::DuplicateKey {
                table: R::TABLE,
                key: pk,
            });
        }
        Self::check_unique(state, record)?;
        let bytes = Self::encode(record)?;
        state.rows.insert(pk, bytes);
        state.add_to_indexes(pk, record.index_keys());
        state.next_key = state.next_key.max(pk.saturating_add(1));
        Ok(())
    }
}

impl<R: Record> Default for InMemoryTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Table<R> for InMemoryTable<R> {
    fn insert(&self, scope: &AccountName, record: &R) -> StoreResult<()> {
        let mut map = self.write()?;
        let state = map.entry(scope.clone()).or_default();
        Self::insert_into(state, record)?;
        trace!(table = R::TABLE, scope = %scope, key = record.primary_key(), "row inserted");
        Ok(())
    }

    fn insert_with(&self, scope: &AccountName, build: &dyn Fn(u64) -> R) -> StoreResult<R> {
        let mut map = self.write()?;
        let state = map.entry(scope.clone()).or_default();
        let record = build(state.next_key);
        Self::insert_into(state, &record)?;
        trace!(table = R::TABLE, scope = %scope, key = record.primary_key(), "row allocated");
        Ok(record)
    }

    fn get(&self, scope: &AccountName, key: u64) -> StoreResult<Option<R>> {
        let map = self.read()?;
        match map.get(scope).and_then(|state| state.rows.get(&key)) {
            Some(bytes) => Ok(Some(Self::decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn find(&self, scope: &AccountName, index: &str, key: &IndexKey) -> StoreResult<Vec<R>> {
        Self::check_index(index)?;
        let map = self.read()?;
        let Some(state) = map.get(scope) else {
            return Ok(Vec::new());
        };
        state
            .holders(index, key)
            .filter_map(|pk| state.rows.get(&pk))
            .map(|bytes| Self::decode(bytes))
            .collect()
    }

    fn find_one(&self, scope: &AccountName, index: &str, key: &IndexKey) -> StoreResult<Option<R>> {
        Self::check_index(index)?;
        let map = self.read()?;
        let Some(state) = map.get(scope) else {
            return Ok(None);
        };
        let found = state
            .holders(index, key)
            .find_map(|pk| state.rows.get(&pk))
            .map(|bytes| Self::decode(bytes))
            .transpose();
        found
    }

    fn update(&self, scope: &AccountName, record: &R) -> StoreResult<()> {
        let pk = record.primary_key();
        let not_found = || StoreError::NotFound {
            table: R::TABLE,
            key: pk,
        };
        let mut map = self.write()?;
        let state = map.get_mut(scope).ok_or_else(not_found)?;
        let previous = match state.rows.get(&pk) {
            Some(bytes) => Self::decode(bytes)?,
            None => return Err(not_found()),
        };
        Self::check_unique(state, record)?;
        let bytes = Self::encode(record)?;
        state.remove_from_indexes(pk, previous.index_keys());
        state.rows.insert(pk, bytes);
        state.add_to_indexes(pk, record.index_keys());
        trace!(table = R::TABLE, scope = %scope, key = pk, "row updated");
        Ok(())
    }

    fn delete(&self, scope: &AccountName, key: u64) -> StoreResult<R> {
        let not_found = || StoreError::NotFound {
            table: R::TABLE,
            key,
        };
        let mut map = self.write()?;
        let state = map.get_mut(scope).ok_or_else(not_found)?;
        let record = match state.rows.get(&key) {
            Some(bytes) => Self::decode(bytes)?,
            None => return Err(not_found()),
        };
        state.rows.remove(&key);
        state.remove_from_indexes(key, record.index_keys());
        trace!(table = R::TABLE, scope = %scope, key, "row deleted");
        Ok(record)
    }

    fn scan(&self, scope: &AccountName) -> StoreResult<Vec<R>> {
        let map = self.read()?;
        let Some(state) = map.get(scope) else {
            return Ok(Vec::new());
        };
        state.rows.values().map(|bytes| Self::decode(bytes)).collect()
    }

    fn len(&self, scope: &AccountName) -> StoreResult<usize> {
        let map = self.read()?;
        Ok(map.get(scope).map_or(0, |state| state.rows.len()))
    }
}

impl<R> std::fmt::Debug for InMemoryTable<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (scopes, rows) = match self.scopes.read() {
            Ok(map) => (map.len(), map.values().map(|s| s.rows.len()).sum::<usize>()),
            Err(_) => (0, 0),
        };
        f.debug_struct("InMemoryTable")
            .field("scope_count", &scopes)
            .field("row_count", &rows)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::IndexSpec;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u64,
        slug: String,
        author: AccountName,
        rank: u64,
    }

    impl Record for Note {
        const TABLE: &'static str = "notes";
        const INDEXES: &'static [IndexSpec] = &[
            IndexSpec::unique("slug"),
            IndexSpec::non_unique("author"),
            IndexSpec::non_unique("rank"),
        ];

        fn primary_key(&self) -> u64 {
            self.id
        }

        fn index_keys(&self) -> Vec<(&'static str, IndexKey)> {
            vec![
                ("slug", IndexKey::Hash(docgraph_types::Checksum256::digest(self.slug.as_bytes()))),
                ("author", IndexKey::Account(self.author.clone())),
                ("rank", IndexKey::Int(self.rank)),
            ]
        }
    }

    fn scope(name: &str) -> AccountName {
        AccountName::new(name).unwrap()
    }

    fn note(id: u64, slug: &str, author: &str, rank: u64) -> Note {
        Note {
            id,
            slug: slug.into(),
            author: scope(author),
            rank,
        }
    }

    fn slug_key(slug: &str) -> IndexKey {
        IndexKey::Hash(docgraph_types::Checksum256::digest(slug.as_bytes()))
    }

    // -----------------------------------------------------------------------
    // Insert and get
    // -----------------------------------------------------------------------

    #[test]
    fn insert_then_get() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(1, "a", "alice", 5)).unwrap();
        assert_eq!(table.get(&s, 1).unwrap(), Some(note(1, "a", "alice", 5)));
        assert_eq!(table.get(&s, 2).unwrap(), None);
        assert!(table.contains(&s, 1).unwrap());
        assert_eq!(table.len(&s).unwrap(), 1);
    }

    #[test]
    fn duplicate_primary_key_rejected() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(1, "a", "alice", 5)).unwrap();
        let err = table.insert(&s, &note(1, "b", "bob", 5)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { key: 1, .. }));
        // The failed insert left no index entries behind.
        assert!(table.find(&s, "slug", &slug_key("b")).unwrap().is_empty());
    }

    #[test]
    fn unique_index_rejected_atomically() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(1, "a", "alice", 5)).unwrap();
        let err = table.insert(&s, &note(2, "a", "bob", 6)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniqueViolation {
                index: "slug",
                existing: 1,
                ..
            }
        ));
        assert_eq!(table.len(&s).unwrap(), 1);
        assert!(table.find(&s, "rank", &IndexKey::Int(6)).unwrap().is_empty());
    }

    #[test]
    fn scopes_are_isolated() {
        let table = InMemoryTable::<Note>::new();
        table.insert(&scope("one"), &note(1, "a", "alice", 1)).unwrap();
        table.insert(&scope("two"), &note(1, "a", "alice", 1)).unwrap();
        assert_eq!(table.len(&scope("one")).unwrap(), 1);
        assert_eq!(table.get(&scope("three"), 1).unwrap(), None);
        assert_eq!(table.scopes().unwrap(), vec![scope("one"), scope("two")]);
    }

    // -----------------------------------------------------------------------
    // Key allocation
    // -----------------------------------------------------------------------

    #[test]
    fn allocated_keys_are_never_reused() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        let first = table.insert_with(&s, &|id| note(id, "a", "alice", 0)).unwrap();
        let second = table.insert_with(&s, &|id| note(id, "b", "alice", 0)).unwrap();
        assert_eq!(second.id, first.id + 1);

        table.delete(&s, second.id).unwrap();
        let third = table.insert_with(&s, &|id| note(id, "c", "alice", 0)).unwrap();
        assert!(third.id > second.id);
    }

    #[test]
    fn explicit_keys_advance_allocator() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(10, "a", "alice", 0)).unwrap();
        let next = table.insert_with(&s, &|id| note(id, "b", "alice", 0)).unwrap();
        assert_eq!(next.id, 11);
    }

    #[test]
    fn failed_allocation_does_not_consume_key() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        let first = table.insert_with(&s, &|id| note(id, "a", "alice", 0)).unwrap();
        assert!(table.insert_with(&s, &|id| note(id, "a", "bob", 0)).is_err());
        let next = table.insert_with(&s, &|id| note(id, "b", "bob", 0)).unwrap();
        assert_eq!(next.id, first.id + 1);
    }

    // -----------------------------------------------------------------------
    // Secondary indexes
    // -----------------------------------------------------------------------

    #[test]
    fn find_by_non_unique_index() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(3, "c", "alice", 1)).unwrap();
        table.insert(&s, &note(1, "a", "alice", 2)).unwrap();
        table.insert(&s, &note(2, "b", "bob", 1)).unwrap();

        let alice = table
            .find(&s, "author", &IndexKey::Account(scope("alice")))
            .unwrap();
        assert_eq!(alice.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 3]);

        let ranked = table.find(&s, "rank", &IndexKey::Int(1)).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(
            table.find_one(&s, "slug", &slug_key("b")).unwrap().map(|n| n.id),
            Some(2)
        );
    }

    #[test]
    fn find_one_returns_lowest_key_holder() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(9, "c", "alice", 4)).unwrap();
        table.insert(&s, &note(5, "a", "alice", 4)).unwrap();

        let first = table.find_one(&s, "rank", &IndexKey::Int(4)).unwrap();
        assert_eq!(first.map(|n| n.id), Some(5));
        assert_eq!(table.find_one(&s, "rank", &IndexKey::Int(7)).unwrap(), None);
        assert_eq!(
            table.find_one(&scope("other"), "rank", &IndexKey::Int(4)).unwrap(),
            None
        );
    }

    #[test]
    fn unknown_index_is_an_error() {
        let table = InMemoryTable::<Note>::new();
        let err = table
            .find(&scope("dao"), "nope", &IndexKey::Int(0))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownIndex { .. }));
        let err = table
            .find_one(&scope("dao"), "nope", &IndexKey::Int(0))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownIndex { .. }));
    }

    #[test]
    fn update_reindexes() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(1, "a", "alice", 1)).unwrap();
        table.update(&s, &note(1, "z", "bob", 9)).unwrap();

        assert!(table.find(&s, "slug", &slug_key("a")).unwrap().is_empty());
        assert!(table.find(&s, "rank", &IndexKey::Int(1)).unwrap().is_empty());
        assert_eq!(table.find(&s, "slug", &slug_key("z")).unwrap().len(), 1);
        assert_eq!(table.get(&s, 1).unwrap().unwrap().author, scope("bob"));
    }

    #[test]
    fn update_keeps_own_unique_key() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(1, "a", "alice", 1)).unwrap();
        table.update(&s, &note(1, "a", "alice", 2)).unwrap();
        assert_eq!(table.get(&s, 1).unwrap().unwrap().rank, 2);
    }

    #[test]
    fn update_rejects_unique_collision_and_missing_rows() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(1, "a", "alice", 1)).unwrap();
        table.insert(&s, &note(2, "b", "alice", 1)).unwrap();
        assert!(matches!(
            table.update(&s, &note(2, "a", "alice", 1)),
            Err(StoreError::UniqueViolation { .. })
        ));
        assert_eq!(table.get(&s, 2).unwrap().unwrap().slug, "b");
        assert!(matches!(
            table.update(&s, &note(9, "q", "alice", 1)),
            Err(StoreError::NotFound { key: 9, .. })
        ));
    }

    #[test]
    fn delete_removes_index_entries() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(1, "a", "alice", 1)).unwrap();
        let removed = table.delete(&s, 1).unwrap();
        assert_eq!(removed.slug, "a");
        assert!(table.find(&s, "slug", &slug_key("a")).unwrap().is_empty());
        assert!(table.is_empty(&s).unwrap());
        assert!(matches!(table.delete(&s, 1), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn scan_and_clear() {
        let table = InMemoryTable::<Note>::new();
        let s = scope("dao");
        table.insert(&s, &note(2, "b", "alice", 1)).unwrap();
        table.insert(&s, &note(1, "a", "alice", 1)).unwrap();
        let ids: Vec<u64> = table.scan(&s).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
        table.clear().unwrap();
        assert!(table.scan(&s).unwrap().is_empty());
    }

    #[test]
    fn concurrent_unique_inserts_admit_one() {
        let table = Arc::new(InMemoryTable::<Note>::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    table
                        .insert_with(&scope("dao"), &|id| note(id, "same", "alice", i))
                        .is_ok()
                })
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(table.len(&scope("dao")).unwrap(), 1);
    }

    #[test]
    fn debug_reports_counts() {
        let table = InMemoryTable::<Note>::new();
        table.insert(&scope("dao"), &note(1, "a", "alice", 1)).unwrap();
        let debug = format!("{table:?}");
        assert!(debug.contains("row_count: 1"));
    }
}
