use crate::{
    error::{MapError, TypeMismatchError},
    key::{EntityKey, KeyDescriptor, KeyId},
    registry::Registry,
    traits::Mapped,
    value::Document,
};
use serde::{Deserialize, Serialize};
use std::{marker::PhantomData, sync::Arc};

///
/// StoredEntity
/// A document plus the key it is stored under.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StoredEntity {
    pub key: EntityKey,
    pub document: Document,
}

impl StoredEntity {
    #[must_use]
    pub const fn new(key: EntityKey, document: Document) -> Self {
        Self { key, document }
    }
}

///
/// Mapper
///
/// Typed entry point for one entity type: encode, decode and every key
/// operation, all against the same validated descriptors.
///

pub struct Mapper<'r, E> {
    registry: &'r Registry,
    key: Arc<KeyDescriptor>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Mapper<'_, E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry,
            key: Arc::clone(&self.key),
            _entity: PhantomData,
        }
    }
}

impl<'r, E: Mapped> Mapper<'r, E> {
    pub(crate) const fn new(registry: &'r Registry, key: Arc<KeyDescriptor>) -> Self {
        Self {
            registry,
            key,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &'r Registry {
        self.registry
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        self.key.kind()
    }

    #[must_use]
    pub fn key_descriptor(&self) -> &KeyDescriptor {
        &self.key
    }

    //
    // Values
    //

    /// Encode an entity, excluding its key property.
    pub fn encode(&self, entity: &E) -> Result<Document, MapError> {
        self.registry
            .encoder()
            .encode_entity(entity, self.key.entity())
    }

    pub fn decode(&self, document: &Document) -> Result<E, MapError> {
        self.registry.decoder().decode_entity(document)
    }

    //
    // Keys
    //

    pub fn build_key(&self, id: impl Into<KeyId>) -> Result<EntityKey, MapError> {
        Ok(self.key.build_key(id)?)
    }

    /// Typed identity of a complete key, e.g. `i64` or `String`.
    pub fn extract_id<I: Mapped>(&self, key: &EntityKey) -> Result<I, MapError> {
        let id = self.key.extract_id(key)?;

        self.registry
            .decoder()
            .decode::<I>(&id.to_value())
    }

    /// Current identity of an instance.
    pub fn id_of(&self, entity: &E) -> Result<KeyId, MapError> {
        self.key.current_id(entity)
    }

    pub fn key_for_write(&self, entity: &E, is_update: bool) -> Result<EntityKey, MapError> {
        self.key.key_for_write(entity, is_update)
    }

    pub fn assign_key(&self, entity: &mut E, key: &EntityKey) -> Result<(), MapError> {
        self.key.assign_key(entity, key)
    }

    /// Assign one key per entity, in order. Every key is checked before any
    /// entity is touched.
    pub fn assign_keys(&self, entities: &mut [E], keys: &[EntityKey]) -> Result<(), MapError> {
        if entities.len() != keys.len() {
            return Err(TypeMismatchError::KeyCount {
                expected: entities.len(),
                found: keys.len(),
            }
            .into());
        }

        let ids = keys
            .iter()
            .map(|key| self.key.decode_id(key))
            .collect::<Result<Vec<_>, _>>()?;

        for (entity, id) in entities.iter_mut().zip(ids) {
            self.key.set_id(entity, id)?;
        }

        Ok(())
    }

    //
    // Entities
    //

    /// Document and write key for an instance.
    pub fn to_entity(&self, entity: &E, is_update: bool) -> Result<StoredEntity, MapError> {
        let key = self.key_for_write(entity, is_update)?;
        let document = self.encode(entity)?;

        Ok(StoredEntity::new(key, document))
    }

    /// Decode a stored entity and write its key back into the instance.
    pub fn from_entity(&self, stored: &StoredEntity) -> Result<E, MapError> {
        if !stored.key.is_complete() {
            return Err(TypeMismatchError::IncompleteKey {
                kind: stored.key.kind().to_string(),
            }
            .into());
        }

        let mut entity = self.decode(&stored.document)?;
        self.assign_key(&mut entity, &stored.key)?;

        Ok(entity)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_fixtures::*, value::Value};

    #[test]
    fn item_scenario_encodes_without_key_then_assigns_store_id() {
        let registry = Registry::new();
        let mapper = registry.mapper::<Item>().expect("Item is a valid entity");
        let mut item = Item {
            id: 0,
            name: "a".to_string(),
            tags: vec!["x".to_string(), "y".to_string()],
        };

        let stored = mapper.to_entity(&item, false).expect("item should map");
        assert!(!stored.key.is_complete(), "fresh insert leaves the id to the store");
        assert_eq!(
            stored.document,
            Document::new()
                .with("Name", "a")
                .with("Tags", Value::Array(vec![Value::from("x"), Value::from("y")]))
        );

        // the store answers with identity 42
        let assigned = stored.key.with_id(42);
        mapper.assign_key(&mut item, &assigned).expect("assign");
        assert_eq!(item.id, 42);
    }

    #[test]
    fn from_entity_restores_key_and_fields() {
        let registry = Registry::new();
        let mapper = registry.mapper::<Order>().expect("Order mapper");
        let order = Order {
            code: "Z-9".to_string(),
            note: Some("n".to_string()),
            ..Order::default()
        };

        let stored = mapper.to_entity(&order, true).expect("to entity");
        assert_eq!(stored.key, EntityKey::complete("orders", "Z-9"));

        let restored = mapper.from_entity(&stored).expect("from entity");
        assert_eq!(restored, order);
    }

    #[test]
    fn from_entity_requires_complete_key() {
        let registry = Registry::new();
        let mapper = registry.mapper::<Item>().expect("Item mapper");
        let stored = StoredEntity::new(EntityKey::incomplete("Item"), Document::new());

        let err = mapper.from_entity(&stored).expect_err("incomplete key");
        assert!(matches!(
            err,
            MapError::TypeMismatch(TypeMismatchError::IncompleteKey { .. })
        ));
    }

    #[test]
    fn assign_keys_checks_every_key_first() {
        let registry = Registry::new();
        let mapper = registry.mapper::<Item>().expect("Item mapper");
        let mut items = vec![Item::default(), Item::default()];

        let err = mapper
            .assign_keys(
                &mut items,
                &[EntityKey::complete("Item", 7), EntityKey::complete("Item", "x")],
            )
            .expect_err("second key has the wrong branch");
        assert_eq!(err.class(), crate::error::ErrorClass::TypeMismatch);
        assert_eq!(items[0].id, 0, "first entity untouched when a later key fails");

        let err = mapper
            .assign_keys(&mut items, &[EntityKey::complete("Item", 7)])
            .expect_err("one key for two entities");
        assert!(matches!(
            err,
            MapError::TypeMismatch(TypeMismatchError::KeyCount {
                expected: 2,
                found: 1
            })
        ));

        mapper
            .assign_keys(
                &mut items,
                &[EntityKey::complete("Item", 7), EntityKey::complete("Item", 8)],
            )
            .expect("both keys fit");
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), [7, 8]);
    }

    #[test]
    fn extract_id_returns_typed_identity() {
        let registry = Registry::new();
        let items = registry.mapper::<Item>().expect("Item mapper");
        let orders = registry.mapper::<Order>().expect("Order mapper");

        let id: i64 = items
            .extract_id(&items.build_key(12).expect("key"))
            .expect("typed id");
        let code: String = orders
            .extract_id(&orders.build_key("C-3").expect("key"))
            .expect("typed code");

        assert_eq!(id, 12);
        assert_eq!(code, "C-3");
        assert_eq!(items.kind(), "Item");
        assert_eq!(orders.kind(), "orders");
    }

    #[test]
    fn build_key_type_error_is_uniform() {
        let registry = Registry::new();
        let items = registry.mapper::<Item>().expect("Item mapper");

        let err = items.build_key("x").expect_err("wrong branch");
        assert_eq!(err.class(), crate::error::ErrorClass::TypeMismatch);
    }

    #[test]
    fn misconfigured_entities_never_get_a_mapper() {
        let registry = Registry::new();

        for err in [
            registry.mapper::<NoKey>().err(),
            registry.mapper::<TwoKeys>().err(),
            registry.mapper::<WithMap>().err(),
        ] {
            let err = err.expect("mapper should be refused");
            assert!(
                matches!(
                    err.class(),
                    crate::error::ErrorClass::Configuration | crate::error::ErrorClass::Unsupported
                ),
                "unexpected error class for {err}"
            );
        }
    }
}
