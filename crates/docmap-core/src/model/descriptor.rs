use crate::{
    config::IntegerNarrowing,
    error::{MapError, TypeMismatchError},
    key::KeyOptions,
    model::access::{Constructor, Instance, MemberAccess, PropertyAccess},
    model::spec::ScalarKind,
    traits::TypeRef,
    value::Value,
};
use std::{any::Any, fmt};

///
/// TypeDescriptor
///
/// Immutable metadata for one mapped type. Built once per type by the
/// registry and shared behind an `Arc` for the registry's lifetime.
///

pub struct TypeDescriptor {
    ty: TypeRef,
    name: String,
    discriminator: Option<String>,
    shape: Shape,
}

impl TypeDescriptor {
    pub(crate) const fn new(
        ty: TypeRef,
        name: String,
        discriminator: Option<String>,
        shape: Shape,
    ) -> Self {
        Self {
            ty,
            name,
            discriminator,
            shape,
        }
    }

    #[must_use]
    pub const fn type_ref(&self) -> TypeRef {
        self.ty
    }

    /// Declared name (records, enumerations, families) or short type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Discriminator tag, present only for members of a declared family.
    #[must_use]
    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Zero-argument constructor for records and collections.
    #[must_use]
    pub const fn constructor(&self) -> Option<Constructor> {
        match &self.shape {
            Shape::Record(record) => Some(record.constructor),
            Shape::Collection(collection) => Some(collection.construct),
            _ => None,
        }
    }

    /// Ordered properties; empty for anything that is not a record.
    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        match &self.shape {
            Shape::Record(record) => &record.properties,
            _ => &[],
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties().iter().find(|p| p.name == name)
    }

    #[must_use]
    pub const fn collection(&self) -> Option<&CollectionDescriptor> {
        match &self.shape {
            Shape::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    #[must_use]
    pub const fn record(&self) -> Option<&RecordDescriptor> {
        match &self.shape {
            Shape::Record(record) => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub const fn family(&self) -> Option<&FamilyDescriptor> {
        match &self.shape {
            Shape::Family(family) => Some(family),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type", &self.ty)
            .field("name", &self.name)
            .field("discriminator", &self.discriminator)
            .field("shape", &self.shape)
            .finish()
    }
}

///
/// Shape
///
/// How a type is mapped onto tagged values.
///

pub enum Shape {
    Scalar(ScalarDescriptor),
    Enumeration(EnumDescriptor),
    Optional(OptionalDescriptor),
    Collection(CollectionDescriptor),
    Record(RecordDescriptor),
    Family(FamilyDescriptor),
}

impl Shape {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Enumeration(_) => "enumeration",
            Self::Optional(_) => "optional",
            Self::Collection(_) => "collection",
            Self::Record(_) => "record",
            Self::Family(_) => "family",
        }
    }

    /// Types this shape refers to; the registry follows these edges.
    pub(crate) fn edges(&self) -> Vec<TypeRef> {
        match self {
            Self::Scalar(_) | Self::Enumeration(_) => Vec::new(),
            Self::Optional(optional) => vec![optional.inner],
            Self::Collection(collection) => vec![collection.element],
            Self::Record(record) => record
                .properties
                .iter()
                .map(|p| p.ty)
                .chain(record.family)
                .collect(),
            Self::Family(family) => family.members.iter().map(|m| m.ty).collect(),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => f.debug_tuple("Scalar").field(&scalar.kind).finish(),
            Self::Enumeration(_) => f.write_str("Enumeration"),
            Self::Optional(optional) => f.debug_tuple("Optional").field(&optional.inner).finish(),
            Self::Collection(collection) => f
                .debug_tuple("Collection")
                .field(&collection.element)
                .finish(),
            Self::Record(record) => f
                .debug_struct("Record")
                .field("kind", &record.kind)
                .field("properties", &record.properties)
                .finish(),
            Self::Family(family) => f
                .debug_struct("Family")
                .field("name", &family.name)
                .field("members", &family.members)
                .finish(),
        }
    }
}

///
/// ScalarDescriptor
///

pub struct ScalarDescriptor {
    pub(crate) kind: ScalarKind,
    pub(crate) encode: fn(&dyn Any) -> Result<Value, TypeMismatchError>,
    pub(crate) decode: fn(&Value, IntegerNarrowing) -> Result<Instance, TypeMismatchError>,
}

impl ScalarDescriptor {
    #[must_use]
    pub const fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn encode(&self, value: &dyn Any) -> Result<Value, TypeMismatchError> {
        (self.encode)(value)
    }

    pub fn decode(
        &self,
        value: &Value,
        narrowing: IntegerNarrowing,
    ) -> Result<Instance, TypeMismatchError> {
        (self.decode)(value, narrowing)
    }
}

///
/// EnumDescriptor
/// Fieldless enumeration stored as its ordinal.
///

pub struct EnumDescriptor {
    pub(crate) ordinal: fn(&dyn Any) -> Option<i64>,
    pub(crate) from_ordinal: fn(i64) -> Option<Instance>,
}

///
/// OptionalDescriptor
///

pub struct OptionalDescriptor {
    pub(crate) inner: TypeRef,
    pub(crate) get: for<'a> fn(&'a dyn Any) -> Option<Option<&'a dyn Any>>,
    pub(crate) none: Constructor,
    pub(crate) some: fn(Instance) -> Result<Instance, Instance>,
}

impl OptionalDescriptor {
    #[must_use]
    pub const fn inner(&self) -> TypeRef {
        self.inner
    }
}

///
/// CollectionDescriptor
///
/// Collection with exactly one element type.
///

pub struct CollectionDescriptor {
    pub(crate) element: TypeRef,
    pub(crate) construct: Constructor,
    pub(crate) add: fn(&mut dyn Any, Instance) -> Result<(), Instance>,
    pub(crate) items: for<'a> fn(&'a dyn Any) -> Option<Vec<&'a dyn Any>>,
}

impl CollectionDescriptor {
    #[must_use]
    pub const fn element(&self) -> TypeRef {
        self.element
    }

    #[must_use]
    pub fn construct(&self) -> Instance {
        (self.construct)()
    }

    pub fn add(&self, collection: &mut dyn Any, element: Instance) -> Result<(), MapError> {
        (self.add)(collection, element)
            .map_err(|_| TypeMismatchError::downcast(self.element.type_name()).into())
    }
}

///
/// RecordDescriptor
///

pub struct RecordDescriptor {
    pub(crate) name: &'static str,
    pub(crate) kind: Option<&'static str>,
    pub(crate) family: Option<TypeRef>,
    pub(crate) constructor: Constructor,
    pub(crate) properties: Vec<PropertyDescriptor>,
}

impl RecordDescriptor {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Kind name override, if declared.
    #[must_use]
    pub const fn kind(&self) -> Option<&'static str> {
        self.kind
    }

    /// Family base this record declared membership of, if any.
    #[must_use]
    pub const fn family(&self) -> Option<TypeRef> {
        self.family
    }

    /// Resolved kind name: the override, else the record name.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        self.kind.unwrap_or(self.name)
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }
}

///
/// PropertyDescriptor
///

pub struct PropertyDescriptor {
    pub(crate) name: &'static str,
    pub(crate) ty: TypeRef,
    pub(crate) key: Option<KeyOptions>,
    pub(crate) exclude_from_index: bool,
    pub(crate) access: Box<dyn PropertyAccess>,
}

impl PropertyDescriptor {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared property type.
    #[must_use]
    pub const fn type_ref(&self) -> TypeRef {
        self.ty
    }

    #[must_use]
    pub const fn key(&self) -> Option<KeyOptions> {
        self.key
    }

    #[must_use]
    pub const fn is_key(&self) -> bool {
        self.key.is_some()
    }

    #[must_use]
    pub const fn exclude_from_index(&self) -> bool {
        self.exclude_from_index
    }

    pub fn get<'a>(&self, owner: &'a dyn Any) -> Result<&'a dyn Any, MapError> {
        self.access
            .get(owner)
            .ok_or_else(|| TypeMismatchError::downcast("property owner").into())
    }

    pub fn set(&self, owner: &mut dyn Any, value: Instance) -> Result<(), MapError> {
        self.access
            .set(owner, value)
            .map_err(|_| MapError::from(TypeMismatchError::downcast(self.ty.type_name())))
            .map_err(|err| err.in_property(self.name))
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("type", &self.ty)
            .field("key", &self.key)
            .field("exclude_from_index", &self.exclude_from_index)
            .finish_non_exhaustive()
    }
}

///
/// FamilyDescriptor
///
/// Closed inheritance family: a base type and its declared members.
///

pub struct FamilyDescriptor {
    pub(crate) name: Option<&'static str>,
    pub(crate) members: Vec<FamilyMember>,
}

impl FamilyDescriptor {
    /// Declared family name, if any.
    #[must_use]
    pub const fn name(&self) -> Option<&'static str> {
        self.name
    }

    #[must_use]
    pub fn members(&self) -> &[FamilyMember] {
        &self.members
    }

    #[must_use]
    pub fn member(&self, ty: TypeRef) -> Option<&FamilyMember> {
        self.members.iter().find(|m| m.ty == ty)
    }

    /// Find the member a base value currently holds.
    #[must_use]
    pub fn project<'a>(&self, base: &'a dyn Any) -> Option<(&FamilyMember, &'a dyn Any)> {
        self.members
            .iter()
            .find_map(|member| member.access.project(base).map(|inner| (member, inner)))
    }
}

///
/// FamilyMember
///

pub struct FamilyMember {
    pub(crate) ty: TypeRef,
    pub(crate) discriminator: String,
    pub(crate) access: Box<dyn MemberAccess>,
}

impl FamilyMember {
    #[must_use]
    pub const fn type_ref(&self) -> TypeRef {
        self.ty
    }

    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Wrap a decoded member instance into the family base type.
    pub fn inject(&self, member: Instance) -> Result<Instance, MapError> {
        self.access
            .inject(member)
            .map_err(|_| TypeMismatchError::downcast(self.ty.type_name()).into())
    }
}

impl fmt::Debug for FamilyMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyMember")
            .field("type", &self.ty)
            .field("discriminator", &self.discriminator)
            .finish_non_exhaustive()
    }
}
