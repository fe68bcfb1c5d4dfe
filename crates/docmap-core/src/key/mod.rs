
use crate::{
    config::IntegerNarrowing,
    error::{ConfigurationError, MapError, TypeMismatchError},
    model::{
        Instance, PropertyDescriptor, ScalarDescriptor, Shape, TypeDescriptor, spec::ScalarKind,
    },
    registry::Registry,
    value::Value,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{any::Any, fmt, sync::Arc};

///
/// KeyOptions
/// Payload of the key marker.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct KeyOptions {
    auto_generated: bool,
}

impl KeyOptions {
    /// Identity is assigned by the store on insert.
    #[must_use]
    pub const fn auto_generated() -> Self {
        Self {
            auto_generated: true,
        }
    }

    /// Identity is always supplied by the caller.
    #[must_use]
    pub const fn manual() -> Self {
        Self {
            auto_generated: false,
        }
    }

    #[must_use]
    pub const fn is_auto_generated(self) -> bool {
        self.auto_generated
    }
}

///
/// KeyType
/// Which identity branch a kind uses.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum KeyType {
    #[display("integer")]
    Id,

    #[display("string")]
    Name,
}

///
/// KeyId
/// Identity value of a complete key: numeric id or string name, never both.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum KeyId {
    #[display("{_0}")]
    Id(i64),

    #[display("{_0:?}")]
    Name(String),
}

impl KeyId {
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        match self {
            Self::Id(_) => KeyType::Id,
            Self::Name(_) => KeyType::Name,
        }
    }

    #[must_use]
    pub const fn as_id(&self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Name(_) => None,
        }
    }

    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Name(name) => Some(name),
        }
    }

    /// Read an identity out of an encoded key property.
    pub fn from_value(value: &Value) -> Result<Self, TypeMismatchError> {
        match value {
            Value::Integer(id) => Ok(Self::Id(*id)),
            Value::String(name) => Ok(Self::Name(name.clone())),
            other => Err(TypeMismatchError::variant("key identity", other.tag())),
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Id(id) => Value::Integer(*id),
            Self::Name(name) => Value::String(name.clone()),
        }
    }
}

impl From<i64> for KeyId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<i32> for KeyId {
    fn from(id: i32) -> Self {
        Self::Id(i64::from(id))
    }
}

impl From<&str> for KeyId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for KeyId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

///
/// EntityKey
///
/// Store identity of one entity. An incomplete key carries only the kind;
/// the store assigns its identity on insert.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct EntityKey {
    kind: String,
    id: Option<KeyId>,
}

impl EntityKey {
    #[must_use]
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    #[must_use]
    pub fn complete(kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.into()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub const fn id(&self) -> Option<&KeyId> {
        self.id.as_ref()
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.id.is_some()
    }

    /// Complete this key with a store-assigned identity.
    #[must_use]
    pub fn with_id(self, id: impl Into<KeyId>) -> Self {
        Self::complete(self.kind, id)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}({id})", self.kind),
            None => write!(f, "{}(incomplete)", self.kind),
        }
    }
}

///
/// KeyDescriptor
///
/// Key metadata for one entity type: kind name, key property, declared
/// identity branch and the auto-generated flag. Also carries the key
/// operations, since each of them is a function of this metadata alone.
///

pub struct KeyDescriptor {
    kind: String,
    property: &'static str,
    auto_generated: bool,
    key_type: KeyType,
    narrowing: IntegerNarrowing,
    entity: Arc<TypeDescriptor>,
    index: usize,
    value_type: Arc<TypeDescriptor>,
}

impl KeyDescriptor {
    /// Validate key metadata for an entity descriptor.
    ///
    /// The entity must be a record with exactly one key property whose type
    /// is an integer or string scalar; auto-generated keys must be integers.
    pub(crate) fn describe(
        entity: Arc<TypeDescriptor>,
        registry: &Registry,
    ) -> Result<Self, MapError> {
        let Some(record) = entity.record() else {
            return Err(ConfigurationError::NotAnEntity {
                type_name: entity.name().to_string(),
            }
            .into());
        };

        let keyed: Vec<(usize, &PropertyDescriptor)> = record
            .properties()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_key())
            .collect();

        let (index, property, options) = match keyed.as_slice() {
            [] => {
                return Err(ConfigurationError::MissingKey {
                    entity: entity.name().to_string(),
                }
                .into());
            }
            [(index, property)] => (*index, property.name(), property.key().unwrap_or_default()),
            many => {
                return Err(ConfigurationError::MultipleKeys {
                    entity: entity.name().to_string(),
                    properties: many.iter().map(|(_, p)| p.name().to_string()).collect(),
                }
                .into());
            }
        };

        let declared = record.properties()[index].type_ref();
        let value_type = registry
            .resolve(declared.id())
            .ok_or_else(|| MapError::unregistered(declared.type_name()))?;

        let key_type = match value_type.shape() {
            Shape::Scalar(scalar) if scalar.kind() == ScalarKind::Integer => KeyType::Id,
            Shape::Scalar(scalar) if scalar.kind() == ScalarKind::String => KeyType::Name,
            _ => {
                return Err(ConfigurationError::UnsupportedKeyType {
                    entity: entity.name().to_string(),
                    property: property.to_string(),
                    type_name: declared.short_name(),
                }
                .into());
            }
        };

        if options.is_auto_generated() && key_type != KeyType::Id {
            return Err(ConfigurationError::AutoGeneratedNameKey {
                entity: entity.name().to_string(),
                property: property.to_string(),
            }
            .into());
        }

        Ok(Self {
            kind: record.kind_name().to_string(),
            property,
            auto_generated: options.is_auto_generated(),
            key_type,
            narrowing: registry.config().integer_narrowing,
            entity,
            index,
            value_type,
        })
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Name of the key property.
    #[must_use]
    pub const fn property(&self) -> &'static str {
        self.property
    }

    #[must_use]
    pub const fn is_auto_generated(&self) -> bool {
        self.auto_generated
    }

    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Descriptor of the entity this key belongs to.
    #[must_use]
    pub fn entity(&self) -> &TypeDescriptor {
        &self.entity
    }

    ///
    /// Key operations
    ///

    /// Build a complete key for this kind. The identity must match the
    /// declared key type.
    pub fn build_key(&self, id: impl Into<KeyId>) -> Result<EntityKey, TypeMismatchError> {
        let id = id.into();
        self.check_key_type(&id)?;

        Ok(EntityKey::complete(self.kind.clone(), id))
    }

    /// Read the identity of a complete key of this kind.
    pub fn extract_id<'k>(&self, key: &'k EntityKey) -> Result<&'k KeyId, TypeMismatchError> {
        if key.kind() != self.kind {
            return Err(TypeMismatchError::KindMismatch {
                expected: self.kind.clone(),
                found: key.kind().to_string(),
            });
        }

        let id = key.id().ok_or_else(|| TypeMismatchError::IncompleteKey {
            kind: self.kind.clone(),
        })?;
        self.check_key_type(id)?;

        Ok(id)
    }

    /// Current identity held by the instance's key property.
    pub fn current_id(&self, instance: &dyn Any) -> Result<KeyId, MapError> {
        let property = self.key_property();
        let value = property
            .get(instance)
            .and_then(|v| self.scalar()?.encode(v).map_err(MapError::from))
            .map_err(|err| err.in_property(self.property))?;

        let id = KeyId::from_value(&value).map_err(|err| MapError::from(err).in_property(self.property))?;
        self.check_key_type(&id)?;

        Ok(id)
    }

    /// Key to write an instance under. A fresh insert of an auto-generated
    /// kind gets an incomplete key; everything else is keyed by the
    /// instance's current identity.
    pub fn key_for_write(&self, instance: &dyn Any, is_update: bool) -> Result<EntityKey, MapError> {
        if self.auto_generated && !is_update {
            return Ok(EntityKey::incomplete(self.kind.clone()));
        }

        let id = self.current_id(instance)?;

        Ok(EntityKey::complete(self.kind.clone(), id))
    }

    /// Write a key's identity back into the instance's key property.
    pub fn assign_key(&self, instance: &mut dyn Any, key: &EntityKey) -> Result<(), MapError> {
        let decoded = self.decode_id(key)?;

        self.key_property().set(instance, decoded)
    }

    /// Identity of a key as a value of the key property's type, checked
    /// against the declared branch and the narrowing policy. Touches no
    /// instance, so a batch can be validated before any of it is assigned.
    pub fn decode_id(&self, key: &EntityKey) -> Result<Instance, MapError> {
        let id = self.extract_id(key)?;

        self.scalar()?
            .decode(&id.to_value(), self.narrowing)
            .map_err(|err| MapError::from(err).in_property(self.property))
    }

    /// Set a value produced by [`Self::decode_id`].
    pub fn set_id(&self, instance: &mut dyn Any, id: Instance) -> Result<(), MapError> {
        self.key_property().set(instance, id)
    }

    fn check_key_type(&self, id: &KeyId) -> Result<(), TypeMismatchError> {
        if id.key_type() == self.key_type {
            Ok(())
        } else {
            Err(TypeMismatchError::KeyKind {
                kind: self.kind.clone(),
                expected: self.key_type,
                found: id.key_type(),
            })
        }
    }

    fn key_property(&self) -> &PropertyDescriptor {
        &self.entity.properties()[self.index]
    }

    fn scalar(&self) -> Result<&ScalarDescriptor, MapError> {
        match self.value_type.shape() {
            Shape::Scalar(scalar) => Ok(scalar),
            _ => Err(TypeMismatchError::downcast(self.value_type.name()).into()),
        }
    }
}

impl fmt::Debug for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDescriptor")
            .field("kind", &self.kind)
            .field("property", &self.property)
            .field("auto_generated", &self.auto_generated)
            .field("key_type", &self.key_type)
            .finish_non_exhaustive()
    }
}
