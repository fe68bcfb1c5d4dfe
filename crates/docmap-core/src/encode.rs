//! Typed instance → tagged value.
//!
//! Encoding is a pure walk over published descriptors: it never mutates the
//! source instance and never builds metadata. Callers build the root type
//! first (the mapper and `Encoder::encode` both do, and both validate the
//! entity's key before anything is encoded).

use crate::{
    error::{ConfigurationError, MapError, TypeMismatchError},
    model::{RecordDescriptor, Shape, TypeDescriptor},
    registry::Registry,
    traits::{Mapped, TypeRef},
    value::{Document, DocumentField, Value},
};
use std::{any::Any, sync::Arc};

///
/// Encoder
///

#[derive(Clone, Copy)]
pub struct Encoder<'r> {
    registry: &'r Registry,
}

impl<'r> Encoder<'r> {
    #[must_use]
    pub const fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Encode an entity instance into a document, excluding its key property.
    ///
    /// `T` must be a valid entity: a record with exactly one supported key.
    pub fn encode<T: Mapped>(&self, instance: &T) -> Result<Document, MapError> {
        let key = self.registry.describe_key::<T>()?;

        self.encode_entity(instance, key.entity())
    }

    /// Erased form of [`Self::encode`].
    pub fn encode_entity(
        &self,
        instance: &dyn Any,
        descriptor: &TypeDescriptor,
    ) -> Result<Document, MapError> {
        match descriptor.shape() {
            Shape::Record(record) => self.encode_record(instance, descriptor, record, true),
            Shape::Family(_) => self.encode_member(instance, descriptor, true),
            _ => Err(ConfigurationError::NotAnEntity {
                type_name: descriptor.name().to_string(),
            }
            .into()),
        }
    }

    /// Encode any value of a mapped type.
    pub fn encode_value<T: Mapped>(&self, instance: &T) -> Result<Value, MapError> {
        let descriptor = self.registry.build::<T>()?;

        self.encode_any(instance, &descriptor)
    }

    /// Encode an erased value with its descriptor. Nested records keep every
    /// property, including any key-marked ones.
    pub fn encode_any(
        &self,
        value: &dyn Any,
        descriptor: &TypeDescriptor,
    ) -> Result<Value, MapError> {
        match descriptor.shape() {
            Shape::Scalar(scalar) => Ok(scalar.encode(value)?),

            Shape::Enumeration(enumeration) => (enumeration.ordinal)(value)
                .map(Value::Integer)
                .ok_or_else(|| TypeMismatchError::downcast(descriptor.name()).into()),

            Shape::Optional(optional) => {
                let inner = (optional.get)(value)
                    .ok_or_else(|| TypeMismatchError::downcast(descriptor.name()))?;

                match inner {
                    None => Ok(Value::Null),
                    Some(inner) => {
                        let inner_descriptor = self.resolve(optional.inner())?;
                        self.encode_any(inner, &inner_descriptor)
                    }
                }
            }

            Shape::Collection(collection) => {
                let items = (collection.items)(value)
                    .ok_or_else(|| TypeMismatchError::downcast(descriptor.name()))?;
                let element = self.resolve(collection.element())?;

                let encoded = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.encode_any(item, &element)
                            .map_err(|err| err.in_property(i.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Value::Array(encoded))
            }

            Shape::Record(record) => self
                .encode_record(value, descriptor, record, false)
                .map(Value::Document),

            Shape::Family(_) => self
                .encode_member(value, descriptor, false)
                .map(Value::Document),
        }
    }

    // project a family value onto the member it holds
    fn encode_member(
        &self,
        base: &dyn Any,
        descriptor: &TypeDescriptor,
        skip_key: bool,
    ) -> Result<Document, MapError> {
        let (member, inner) = descriptor
            .family()
            .and_then(|family| family.project(base))
            .ok_or_else(|| TypeMismatchError::UndeclaredMember {
                family: descriptor.name().to_string(),
            })?;
        let member = self.resolve(member.type_ref())?;
        let record = member
            .record()
            .ok_or_else(|| TypeMismatchError::downcast(member.name()))?;

        self.encode_record(inner, &member, record, skip_key)
    }

    // discriminator first, then properties in declaration order
    fn encode_record(
        &self,
        instance: &dyn Any,
        descriptor: &TypeDescriptor,
        record: &RecordDescriptor,
        skip_key: bool,
    ) -> Result<Document, MapError> {
        let mut document = Document::with_capacity(record.properties().len() + 1);

        if let Some(discriminator) = descriptor.discriminator() {
            document.insert(
                self.registry.config().discriminator_field.as_str(),
                discriminator,
            );
        }

        for property in record.properties() {
            if skip_key && property.is_key() {
                continue;
            }

            let value = property.get(instance).and_then(|v| {
                let declared = self.resolve(property.type_ref())?;
                self.encode_any(v, &declared)
            });
            let value = value.map_err(|err| err.in_property(property.name()))?;

            document.insert_field(
                DocumentField::new(property.name(), value)
                    .exclude_from_indexes(property.exclude_from_index()),
            );
        }

        Ok(document)
    }

    fn resolve(&self, ty: TypeRef) -> Result<Arc<TypeDescriptor>, MapError> {
        self.registry
            .resolve(ty.id())
            .ok_or_else(|| MapError::unregistered(ty.type_name()))
    }
}

///
/// TESTS
///
