use crate::{Error, filter::Filter, query::QueryOptions, store::Store};
use docmap_core::{
    MapError,
    key::{EntityKey, KeyId},
    mapper::{Mapper, StoredEntity},
    registry::Registry,
    traits::Mapped,
    value::Value,
};
use tracing::debug;

/// Largest number of identities a single `delete` call accepts.
pub const BULK_DELETE_LIMIT: usize = 1000;

///
/// Kind
///
/// CRUD over one entity kind: instances are mapped through the kind's
/// `Mapper` and written to, or read back from, a `Store`.
///

pub struct Kind<'r, E, S: ?Sized> {
    mapper: Mapper<'r, E>,
    store: &'r S,
}

impl<E, S: ?Sized> Clone for Kind<'_, E, S> {
    fn clone(&self) -> Self {
        Self {
            mapper: self.mapper.clone(),
            store: self.store,
        }
    }
}

impl<'r, E: Mapped, S: Store + ?Sized> Kind<'r, E, S> {
    /// Fails if `E` is not a valid entity.
    pub fn new(registry: &'r Registry, store: &'r S) -> Result<Self, Error> {
        Ok(Self {
            mapper: registry.mapper::<E>()?,
            store,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.mapper.kind()
    }

    #[must_use]
    pub const fn mapper(&self) -> &Mapper<'r, E> {
        &self.mapper
    }

    //
    // Writes
    //

    /// Insert one entity. A store-assigned identity is written back into the
    /// entity's key property and returned.
    pub fn insert_one(&self, entity: &mut E) -> Result<KeyId, Error> {
        let stored = self.mapper.to_entity(entity, false)?;
        let key = self.store.insert_one(stored)?;

        debug!(kind = self.name(), %key, "inserted entity");

        self.settle(entity, &key)
    }

    /// Insert a batch. Identities come back in input order. Every returned
    /// key is checked before any entity is touched, so a bad key leaves the
    /// whole batch as it was.
    pub fn insert(&self, entities: &mut [E]) -> Result<Vec<KeyId>, Error> {
        let stored = entities
            .iter()
            .map(|e| self.mapper.to_entity(e, false))
            .collect::<Result<Vec<_>, _>>()?;
        let keys = self.store.insert(stored)?;

        debug!(kind = self.name(), count = keys.len(), "inserted entities");

        let ids = keys
            .iter()
            .map(|key| self.id_of(key))
            .collect::<Result<Vec<_>, _>>()?;
        self.mapper.assign_keys(entities, &keys)?;

        Ok(ids)
    }

    /// Replace the stored entity under the instance's current key.
    pub fn update(&self, entity: &E) -> Result<(), Error> {
        let stored = self.mapper.to_entity(entity, true)?;
        debug!(kind = self.name(), key = %stored.key, "updating entity");

        self.store.update(stored)?;

        Ok(())
    }

    pub fn delete_one(&self, id: impl Into<KeyId>) -> Result<(), Error> {
        let key = self.mapper.build_key(id)?;
        debug!(kind = self.name(), %key, "deleting entity");

        self.store.delete(&[key])?;

        Ok(())
    }

    /// Delete by identity. At most `BULK_DELETE_LIMIT` identities per call.
    pub fn delete<I>(&self, ids: impl IntoIterator<Item = I>) -> Result<(), Error>
    where
        I: Into<KeyId>,
    {
        let ids: Vec<KeyId> = ids.into_iter().map(Into::into).collect();
        if ids.len() > BULK_DELETE_LIMIT {
            return Err(Error::BulkDeleteLimit {
                requested: ids.len(),
                limit: BULK_DELETE_LIMIT,
            });
        }

        let keys = ids
            .into_iter()
            .map(|id| self.mapper.build_key(id))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(kind = self.name(), count = keys.len(), "deleting entities");

        self.store.delete(&keys)?;

        Ok(())
    }

    /// Delete every entity matching the filter and return how many matched.
    pub fn delete_where(&self, filter: &Filter) -> Result<usize, Error> {
        let keys = self.find_keys(filter)?;
        debug!(kind = self.name(), count = keys.len(), "deleting matching entities");

        self.store.delete(&keys)?;

        Ok(keys.len())
    }

    //
    // Reads
    //

    pub fn find(&self, id: impl Into<KeyId>) -> Result<Option<E>, Error> {
        let key = self.mapper.build_key(id)?;

        self.store
            .lookup(&key)?
            .map(|stored| self.restore(&stored))
            .transpose()
    }

    /// Entities matching every field against any of its values.
    ///
    /// Each field contributes one equality per value; the combinations are
    /// AND-ed across fields, so `[("a", [1, 2]), ("b", [3])]` runs
    /// `a=1 AND b=3` then `a=2 AND b=3`. One query per combination, results
    /// concatenated in that order. No fields, or a field without values,
    /// finds nothing.
    pub fn find_in<'f>(
        &self,
        fields: impl IntoIterator<Item = (&'f str, Vec<Value>)>,
    ) -> Result<Vec<E>, Error> {
        let mut combinations: Vec<Vec<Filter>> = Vec::new();

        for (index, (property, values)) in fields.into_iter().enumerate() {
            let prefixes = if index == 0 {
                vec![Vec::new()]
            } else {
                std::mem::take(&mut combinations)
            };

            combinations = prefixes
                .iter()
                .flat_map(|prefix| {
                    values.iter().map(move |value| {
                        let mut clauses = prefix.clone();
                        clauses.push(Filter::equal(property, value.clone()));
                        clauses
                    })
                })
                .collect();
        }

        let mut found = Vec::new();
        for clauses in combinations {
            found.extend(self.find_where(&Filter::and(clauses))?);
        }

        Ok(found)
    }

    pub fn find_where(&self, filter: &Filter) -> Result<Vec<E>, Error> {
        self.find_with(&QueryOptions::from(filter.clone()))
    }

    /// Filtered, ordered and limited read.
    pub fn find_with(&self, options: &QueryOptions) -> Result<Vec<E>, Error> {
        self.store
            .run_query(self.name(), options)?
            .iter()
            .map(|stored| self.restore(stored))
            .collect()
    }

    pub fn find_keys(&self, filter: &Filter) -> Result<Vec<EntityKey>, Error> {
        Ok(self
            .store
            .run_query(self.name(), &QueryOptions::from(filter.clone()))?
            .into_iter()
            .map(|stored| stored.key)
            .collect())
    }

    pub fn get_all(&self) -> Result<Vec<E>, Error> {
        self.find_with(&QueryOptions::new())
    }

    pub fn count(&self) -> Result<usize, Error> {
        self.count_with(&QueryOptions::new())
    }

    /// Number of entities the options select, limit included.
    pub fn count_with(&self, options: &QueryOptions) -> Result<usize, Error> {
        Ok(self.store.run_query(self.name(), options)?.len())
    }

    fn restore(&self, stored: &StoredEntity) -> Result<E, Error> {
        Ok(self.mapper.from_entity(stored)?)
    }

    // write the stored identity back and hand it to the caller
    fn settle(&self, entity: &mut E, key: &EntityKey) -> Result<KeyId, Error> {
        let id = self.id_of(key)?;
        self.mapper.assign_key(entity, key)?;

        Ok(id)
    }

    fn id_of(&self, key: &EntityKey) -> Result<KeyId, Error> {
        let id = self
            .mapper
            .key_descriptor()
            .extract_id(key)
            .map_err(MapError::from)?;

        Ok(id.clone())
    }
}
