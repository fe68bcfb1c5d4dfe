//! Tagged value → typed instance.
//!
//! Dispatch follows the descriptor of the requested type and checks the
//! stored variant against it. A document carrying a discriminator is always
//! decoded as the member that discriminator names.

use crate::{
    error::{MapError, TypeMismatchError},
    model::{Instance, RecordDescriptor, Shape, TypeDescriptor},
    registry::Registry,
    traits::{Mapped, TypeRef},
    value::{Document, Value, ValueTag},
};
use std::sync::Arc;
use tracing::trace;

///
/// Decoder
///

#[derive(Clone, Copy)]
pub struct Decoder<'r> {
    registry: &'r Registry,
}

impl<'r> Decoder<'r> {
    #[must_use]
    pub const fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Decode a stored value into `T`.
    pub fn decode<T: Mapped>(&self, value: &Value) -> Result<T, MapError> {
        let descriptor = self.registry.build::<T>()?;
        let instance = self.decode_any(value, &descriptor)?;

        downcast(instance, descriptor.type_ref())
    }

    /// Decode a document into `T`; fields the type does not declare are
    /// dropped.
    pub fn decode_document<T: Mapped>(&self, document: &Document) -> Result<T, MapError> {
        let descriptor = self.registry.build::<T>()?;
        let instance = self.decode_fields(document, &descriptor)?;

        downcast(instance, descriptor.type_ref())
    }

    /// Decode a stored entity document into `T`. Key metadata is validated
    /// first, so a misconfigured entity never decodes.
    pub fn decode_entity<T: Mapped>(&self, document: &Document) -> Result<T, MapError> {
        let key = self.registry.describe_key::<T>()?;
        let instance = self.decode_fields(document, key.entity())?;

        downcast(instance, key.entity().type_ref())
    }

    /// Decode an erased value with the descriptor of the requested type.
    pub fn decode_any(
        &self,
        value: &Value,
        descriptor: &TypeDescriptor,
    ) -> Result<Instance, MapError> {
        match descriptor.shape() {
            Shape::Scalar(scalar) => Ok(scalar.decode(value, self.registry.config().integer_narrowing)?),

            Shape::Enumeration(enumeration) => {
                let ordinal = value
                    .as_integer()
                    .ok_or_else(|| TypeMismatchError::variant(descriptor.name(), value.tag()))?;

                (enumeration.from_ordinal)(ordinal).ok_or_else(|| {
                    TypeMismatchError::UnknownOrdinal {
                        enumeration: descriptor.name().to_string(),
                        ordinal,
                    }
                    .into()
                })
            }

            Shape::Optional(optional) => {
                if value.is_null() {
                    return Ok((optional.none)());
                }

                let inner = self.resolve(optional.inner())?;
                let decoded = self.decode_any(value, &inner)?;

                (optional.some)(decoded)
                    .map_err(|_| TypeMismatchError::downcast(inner.name()).into())
            }

            Shape::Collection(collection) => {
                let Value::Array(items) = value else {
                    return Err(TypeMismatchError::variant(descriptor.name(), value.tag()).into());
                };
                let element = self.resolve(collection.element())?;

                let mut decoded = collection.construct();
                for (i, item) in items.iter().enumerate() {
                    let item = self
                        .decode_any(item, &element)
                        .map_err(|err| err.in_property(i.to_string()))?;
                    collection.add(&mut *decoded, item)?;
                }

                Ok(decoded)
            }

            Shape::Record(_) | Shape::Family(_) => {
                let Value::Document(document) = value else {
                    return Err(TypeMismatchError::variant(descriptor.name(), value.tag()).into());
                };

                self.decode_fields(document, descriptor)
            }
        }
    }

    /// Decode a document against a record or family descriptor.
    pub fn decode_fields(
        &self,
        document: &Document,
        descriptor: &TypeDescriptor,
    ) -> Result<Instance, MapError> {
        let concrete = self.concrete_member(document, descriptor)?;

        match (descriptor.shape(), concrete) {
            (Shape::Family(family), Some(member)) => {
                let record = member
                    .record()
                    .ok_or_else(|| TypeMismatchError::downcast(member.name()))?;
                let decoded = self.decode_record(document, record)?;

                family
                    .member(member.type_ref())
                    .ok_or_else(|| TypeMismatchError::downcast(member.name()))?
                    .inject(decoded)
            }
            (Shape::Record(record), _) => self.decode_record(document, record),
            _ => Err(TypeMismatchError::variant(descriptor.name(), ValueTag::Document).into()),
        }
    }

    // Resolve the member a document's discriminator names, and check that it
    // is acceptable for the requested type. Families require a discriminator;
    // plain records accept none, or their own.
    fn concrete_member(
        &self,
        document: &Document,
        requested: &TypeDescriptor,
    ) -> Result<Option<Arc<TypeDescriptor>>, MapError> {
        let field = self.registry.config().discriminator_field.as_str();
        let family = requested.family();

        let discriminator = match document.get(field) {
            Some(Value::String(discriminator)) => discriminator,
            Some(other) => {
                return Err(TypeMismatchError::variant("discriminator", other.tag()).into());
            }
            None if family.is_some() => {
                return Err(TypeMismatchError::MissingDiscriminator {
                    family: requested.name().to_string(),
                    field: field.to_string(),
                }
                .into());
            }
            None => return Ok(None),
        };

        let member = self
            .registry
            .resolve_by_discriminator(discriminator)
            .ok_or_else(|| TypeMismatchError::UnknownDiscriminator {
                discriminator: discriminator.clone(),
            })?;

        let accepted = match family {
            Some(family) => family.member(member.type_ref()).is_some(),
            None => member.type_ref() == requested.type_ref(),
        };
        if !accepted {
            return Err(TypeMismatchError::DiscriminatorMismatch {
                discriminator: discriminator.clone(),
                expected: requested.name().to_string(),
                found: member.name().to_string(),
            }
            .into());
        }

        Ok(Some(member))
    }

    // construct, then populate every declared property present in the document
    fn decode_record(
        &self,
        document: &Document,
        record: &RecordDescriptor,
    ) -> Result<Instance, MapError> {
        let discriminator_field = self.registry.config().discriminator_field.as_str();
        let mut instance = (record.constructor)();

        for field in document {
            let Some(property) = record.properties().iter().find(|p| p.name() == field.name) else {
                if field.name != discriminator_field {
                    trace!(record = record.name(), field = %field.name, "unknown field dropped");
                }
                continue;
            };

            let declared = self
                .resolve(property.type_ref())
                .map_err(|err| err.in_property(property.name()))?;
            let decoded = self
                .decode_any(&field.value, &declared)
                .map_err(|err| err.in_property(property.name()))?;

            property.set(&mut *instance, decoded)?;
        }

        Ok(instance)
    }

    fn resolve(&self, ty: TypeRef) -> Result<Arc<TypeDescriptor>, MapError> {
        self.registry
            .resolve(ty.id())
            .ok_or_else(|| MapError::unregistered(ty.type_name()))
    }
}

fn downcast<T: 'static>(instance: Instance, ty: TypeRef) -> Result<T, MapError> {
    instance
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| TypeMismatchError::downcast(ty.type_name()).into())
}

///
/// TESTS
///
