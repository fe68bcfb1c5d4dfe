use crate::query::QueryOptions;
use docmap_core::{
    key::{EntityKey, KeyId},
    mapper::StoredEntity,
    value::Document,
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use thiserror::Error as ThisError;
use tracing::trace;

///
/// StoreError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    #[error("entity {key} already exists")]
    AlreadyExists { key: EntityKey },

    #[error("entity {key} not found")]
    NotFound { key: EntityKey },

    /// Only update, lookup and delete need a complete key.
    #[error("key of kind '{kind}' is incomplete")]
    IncompleteKey { kind: String },

    #[error("kind '{kind}' has exhausted its identity space")]
    IdentityExhausted { kind: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

///
/// Store
///
/// Document store client capability. Incomplete keys passed to `insert`
/// are completed by the store; the returned keys follow input order.
///

pub trait Store: Send + Sync {
    fn insert(&self, entities: Vec<StoredEntity>) -> StoreResult<Vec<EntityKey>>;

    /// Replace an existing entity.
    fn update(&self, entity: StoredEntity) -> StoreResult<()>;

    fn lookup(&self, key: &EntityKey) -> StoreResult<Option<StoredEntity>>;

    /// Delete by key. Missing keys are ignored.
    fn delete(&self, keys: &[EntityKey]) -> StoreResult<()>;

    /// Entities of `kind` matching the options' filter, sorted by its order
    /// (key order when none is given) and cut to its limit.
    fn run_query(&self, kind: &str, options: &QueryOptions) -> StoreResult<Vec<StoredEntity>>;

    fn insert_one(&self, entity: StoredEntity) -> StoreResult<EntityKey> {
        let key = entity.key.clone();

        self.insert(vec![entity])?
            .pop()
            .ok_or(StoreError::NotFound { key })
    }

    fn exists(&self, key: &EntityKey) -> StoreResult<bool> {
        Ok(self.lookup(key)?.is_some())
    }
}

///
/// MemoryStore
///
/// In-process store keyed by kind then identity. Integer identities are
/// allocated per kind, skipping any id already taken by a caller-supplied key.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    kinds: RwLock<HashMap<String, KindTable>>,
}

#[derive(Debug, Default)]
struct KindTable {
    next_id: i64,
    rows: BTreeMap<KeyId, Document>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored entities across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().values().map(|table| table.rows.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, KindTable>> {
        self.kinds.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, KindTable>> {
        self.kinds.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// advance `next` to the first integer identity not already taken
fn allocate(kind: &str, next: &mut i64, taken: impl Fn(&KeyId) -> bool) -> StoreResult<KeyId> {
    loop {
        *next = next
            .checked_add(1)
            .ok_or_else(|| StoreError::IdentityExhausted {
                kind: kind.to_string(),
            })?;

        let id = KeyId::Id(*next);
        if !taken(&id) {
            return Ok(id);
        }
    }
}

fn complete_id(key: &EntityKey) -> StoreResult<&KeyId> {
    key.id().ok_or_else(|| StoreError::IncompleteKey {
        kind: key.kind().to_string(),
    })
}

impl Store for MemoryStore {
    fn insert(&self, entities: Vec<StoredEntity>) -> StoreResult<Vec<EntityKey>> {
        let mut kinds = self.write();

        // plan every identity first; a failure leaves the store untouched
        let mut claimed: HashSet<(&str, KeyId)> = HashSet::new();
        for entity in &entities {
            if let Some(id) = entity.key.id() {
                let taken = !claimed.insert((entity.key.kind(), id.clone()))
                    || kinds
                        .get(entity.key.kind())
                        .is_some_and(|table| table.rows.contains_key(id));

                if taken {
                    return Err(StoreError::AlreadyExists {
                        key: entity.key.clone(),
                    });
                }
            }
        }

        let mut counters: HashMap<&str, i64> = HashMap::new();
        let mut planned = Vec::with_capacity(entities.len());
        for entity in &entities {
            let kind = entity.key.kind();
            let id = match entity.key.id() {
                Some(id) => id.clone(),
                None => {
                    let table = kinds.get(kind);
                    let next = counters
                        .entry(kind)
                        .or_insert_with(|| table.map_or(0, |t| t.next_id));

                    allocate(kind, next, |id| {
                        claimed.contains(&(kind, id.clone()))
                            || table.is_some_and(|t| t.rows.contains_key(id))
                    })?
                }
            };
            planned.push(id);
        }

        for (kind, next) in counters {
            kinds.entry(kind.to_string()).or_default().next_id = next;
        }

        let mut keys = Vec::with_capacity(entities.len());
        for (StoredEntity { key, document }, id) in entities.into_iter().zip(planned) {
            trace!(kind = key.kind(), %id, "memory store insert");

            kinds
                .entry(key.kind().to_string())
                .or_default()
                .rows
                .insert(id.clone(), document);
            keys.push(key.with_id(id));
        }

        Ok(keys)
    }

    fn update(&self, entity: StoredEntity) -> StoreResult<()> {
        let id = complete_id(&entity.key)?;
        let mut kinds = self.write();

        let row = kinds
            .get_mut(entity.key.kind())
            .and_then(|table| table.rows.get_mut(id));

        match row {
            Some(row) => {
                *row = entity.document;
                Ok(())
            }
            None => Err(StoreError::NotFound { key: entity.key }),
        }
    }

    fn lookup(&self, key: &EntityKey) -> StoreResult<Option<StoredEntity>> {
        let id = complete_id(key)?;
        let kinds = self.read();

        Ok(kinds
            .get(key.kind())
            .and_then(|table| table.rows.get(id))
            .map(|document| StoredEntity::new(key.clone(), document.clone())))
    }

    fn delete(&self, keys: &[EntityKey]) -> StoreResult<()> {
        let ids = keys.iter().map(complete_id).collect::<StoreResult<Vec<_>>>()?;
        let mut kinds = self.write();

        for (key, id) in keys.iter().zip(ids) {
            if let Some(table) = kinds.get_mut(key.kind()) {
                table.rows.remove(id);
            }
        }

        Ok(())
    }

    fn run_query(&self, kind: &str, options: &QueryOptions) -> StoreResult<Vec<StoredEntity>> {
        let kinds = self.read();
        let Some(table) = kinds.get(kind) else {
            return Ok(Vec::new());
        };

        let mut found: Vec<StoredEntity> = table
            .rows
            .iter()
            .map(|(id, document)| {
                StoredEntity::new(EntityKey::complete(kind, id.clone()), document.clone())
            })
            .filter(|entity| options.matches(entity))
            .collect();
        options.apply(&mut found);

        Ok(found)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filter::Filter, query::Direction};

    fn entity(key: EntityKey, name: &str) -> StoredEntity {
        StoredEntity::new(key, Document::new().with("name", name))
    }

    #[test]
    fn incomplete_keys_get_sequential_ids() {
        let store = MemoryStore::new();
        let keys = store
            .insert(vec![
                entity(EntityKey::incomplete("Item"), "a"),
                entity(EntityKey::incomplete("Item"), "b"),
            ])
            .expect("insert");

        assert_eq!(
            keys,
            [EntityKey::complete("Item", 1), EntityKey::complete("Item", 2)]
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn allocation_skips_caller_supplied_ids() {
        let store = MemoryStore::new();
        store
            .insert_one(entity(EntityKey::complete("Item", 1), "manual"))
            .expect("manual insert");

        let key = store
            .insert_one(entity(EntityKey::incomplete("Item"), "auto"))
            .expect("auto insert");
        assert_eq!(key, EntityKey::complete("Item", 2));
    }

    #[test]
    fn duplicate_key_rejects_the_whole_batch() {
        let store = MemoryStore::new();
        let taken = EntityKey::complete("orders", "A-1");
        store.insert_one(entity(taken.clone(), "first")).expect("insert");

        let err = store
            .insert(vec![
                entity(EntityKey::complete("orders", "A-2"), "fresh"),
                entity(taken.clone(), "again"),
            ])
            .expect_err("A-1 exists");

        assert_eq!(err, StoreError::AlreadyExists { key: taken });
        assert_eq!(store.len(), 1, "nothing from the batch was written");
    }

    #[test]
    fn update_requires_an_existing_complete_key() {
        let store = MemoryStore::new();

        let err = store
            .update(entity(EntityKey::incomplete("Item"), "x"))
            .expect_err("incomplete");
        assert!(matches!(err, StoreError::IncompleteKey { .. }));

        let err = store
            .update(entity(EntityKey::complete("Item", 9), "x"))
            .expect_err("missing");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn query_is_scoped_to_kind_and_filter() {
        let store = MemoryStore::new();
        store
            .insert(vec![
                entity(EntityKey::incomplete("Item"), "a"),
                entity(EntityKey::incomplete("Item"), "b"),
                entity(EntityKey::incomplete("Other"), "a"),
            ])
            .expect("insert");

        let all = store.run_query("Item", &QueryOptions::new()).expect("query");
        assert_eq!(all.len(), 2);

        let options = QueryOptions::from(Filter::equal("name", "a"));
        let found = store.run_query("Item", &options).expect("query");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, EntityKey::complete("Item", 1));

        assert!(
            store
                .run_query("Missing", &QueryOptions::new())
                .expect("query")
                .is_empty()
        );
    }

    #[test]
    fn query_sorts_before_applying_the_limit() {
        let store = MemoryStore::new();
        store
            .insert(vec![
                entity(EntityKey::incomplete("Item"), "b"),
                entity(EntityKey::incomplete("Item"), "c"),
                entity(EntityKey::incomplete("Item"), "a"),
            ])
            .expect("insert");

        let options = QueryOptions::new()
            .order_by("name", Direction::Descending)
            .limit(2);
        let found = store.run_query("Item", &options).expect("query");

        assert_eq!(
            found.iter().map(|e| e.key.clone()).collect::<Vec<_>>(),
            [EntityKey::complete("Item", 2), EntityKey::complete("Item", 1)]
        );
    }

    #[test]
    fn exhausted_identity_space_writes_nothing() {
        let store = MemoryStore::new();
        store.write().entry("Item".to_string()).or_default().next_id = i64::MAX - 1;

        let err = store
            .insert(vec![
                entity(EntityKey::complete("Item", 5), "manual"),
                entity(EntityKey::incomplete("Item"), "last"),
                entity(EntityKey::incomplete("Item"), "one too many"),
            ])
            .expect_err("only one identity left");

        assert!(matches!(err, StoreError::IdentityExhausted { .. }));
        assert!(store.is_empty(), "no row from the batch was written");
        assert_eq!(store.read()["Item"].next_id, i64::MAX - 1);
    }

    #[test]
    fn allocation_skips_ids_supplied_later_in_the_same_batch() {
        let store = MemoryStore::new();
        let keys = store
            .insert(vec![
                entity(EntityKey::incomplete("Item"), "auto"),
                entity(EntityKey::complete("Item", 1), "manual"),
            ])
            .expect("insert");

        assert_eq!(
            keys,
            [EntityKey::complete("Item", 2), EntityKey::complete("Item", 1)]
        );
    }

    #[test]
    fn delete_ignores_missing_keys() {
        let store = MemoryStore::new();
        let key = store
            .insert_one(entity(EntityKey::incomplete("Item"), "a"))
            .expect("insert");

        store
            .delete(&[key.clone(), EntityKey::complete("Item", 77)])
            .expect("delete");

        assert!(!store.exists(&key).expect("lookup"));
        assert!(store.is_empty());
    }
}
