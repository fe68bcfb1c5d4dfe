use crate::{
    error::UnsupportedReason,
    key::KeyOptions,
    model::{
        access::{self, FieldAccess, VariantAccess},
        descriptor::{
            CollectionDescriptor, EnumDescriptor, FamilyDescriptor, FamilyMember,
            OptionalDescriptor, PropertyDescriptor, RecordDescriptor, ScalarDescriptor, Shape,
        },
    },
    traits::{CollectionShape, EnumOrdinal, Mapped, ScalarValue, TypeRef},
};
use derive_more::Display;
use std::marker::PhantomData;

///
/// ScalarKind
/// The single `Value` variant a scalar type maps to.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[remain::sorted]
pub enum ScalarKind {
    Boolean,
    Double,
    Integer,
    String,
    Timestamp,
}

///
/// TypeSpec
///
/// What a mapped type declares about itself. Unsupported declarations are
/// carried through so the registry can reject them at build time.
///

pub enum TypeSpec {
    Mapped {
        name: Option<&'static str>,
        shape: Shape,
    },
    Unsupported(UnsupportedReason),
}

impl TypeSpec {
    #[must_use]
    pub fn scalar<T: ScalarValue>() -> Self {
        Self::anonymous(Shape::Scalar(ScalarDescriptor {
            kind: T::KIND,
            encode: access::encode_scalar::<T>,
            decode: access::decode_scalar::<T>,
        }))
    }

    #[must_use]
    pub fn optional<T: Mapped>() -> Self {
        Self::anonymous(Shape::Optional(OptionalDescriptor {
            inner: TypeRef::of::<T>(),
            get: access::option_get::<T>,
            none: access::option_none::<T>,
            some: access::option_some::<T>,
        }))
    }

    #[must_use]
    pub fn collection<C: CollectionShape>() -> Self {
        Self::anonymous(Shape::Collection(CollectionDescriptor {
            element: TypeRef::of::<C::Element>(),
            construct: access::construct_default::<C>,
            add: access::collection_add::<C>,
            items: access::collection_items::<C>,
        }))
    }

    #[must_use]
    pub const fn unsupported(reason: UnsupportedReason) -> Self {
        Self::Unsupported(reason)
    }

    const fn anonymous(shape: Shape) -> Self {
        Self::Mapped { name: None, shape }
    }
}

///
/// EnumSpec
///

pub struct EnumSpec {
    name: &'static str,
    descriptor: EnumDescriptor,
}

impl EnumSpec {
    #[must_use]
    pub fn of<T: EnumOrdinal>(name: &'static str) -> Self {
        Self {
            name,
            descriptor: EnumDescriptor {
                ordinal: access::enum_ordinal::<T>,
                from_ordinal: access::enum_from_ordinal::<T>,
            },
        }
    }
}

impl From<EnumSpec> for TypeSpec {
    fn from(spec: EnumSpec) -> Self {
        Self::Mapped {
            name: Some(spec.name),
            shape: Shape::Enumeration(spec.descriptor),
        }
    }
}

///
/// RecordSpec
///
/// Builder for a record: a constructible type with named properties.
///
/// ```ignore
/// RecordSpec::<Item>::new("Item")
///     .key("id", |i| &i.id, |i, v| i.id = v, KeyOptions::auto_generated())
///     .field("name", |i| &i.name, |i, v| i.name = v)
///     .into()
/// ```
///

pub struct RecordSpec<T> {
    name: &'static str,
    kind: Option<&'static str>,
    family: Option<TypeRef>,
    constructor: Option<fn() -> access::Instance>,
    properties: Vec<PropertyDescriptor>,
    _owner: PhantomData<fn() -> T>,
}

impl<T: 'static> RecordSpec<T> {
    #[must_use]
    pub fn new(name: &'static str) -> Self
    where
        T: Default,
    {
        Self {
            constructor: Some(access::construct_default::<T>),
            ..Self::without_constructor(name)
        }
    }

    /// A record the mapper can encode but never construct; the registry
    /// rejects it as unsupported.
    #[must_use]
    pub const fn without_constructor(name: &'static str) -> Self {
        Self {
            name,
            kind: None,
            family: None,
            constructor: None,
            properties: Vec::new(),
            _owner: PhantomData,
        }
    }

    /// Override the kind name used when this record is stored as an entity.
    #[must_use]
    pub const fn kind(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Declare the family this record belongs to, so building the record
    /// alone still builds the family and assigns its discriminator.
    #[must_use]
    pub fn member_of<B: Mapped>(mut self) -> Self {
        self.family = Some(TypeRef::of::<B>());
        self
    }

    #[must_use]
    pub fn field<F: Mapped>(
        self,
        name: &'static str,
        get: fn(&T) -> &F,
        set: fn(&mut T, F),
    ) -> Self {
        self.push(name, get, set, None, false)
    }

    /// A property the store should not index.
    #[must_use]
    pub fn unindexed<F: Mapped>(
        self,
        name: &'static str,
        get: fn(&T) -> &F,
        set: fn(&mut T, F),
    ) -> Self {
        self.push(name, get, set, None, true)
    }

    /// The identity property of an entity.
    #[must_use]
    pub fn key<F: Mapped>(
        self,
        name: &'static str,
        get: fn(&T) -> &F,
        set: fn(&mut T, F),
        options: KeyOptions,
    ) -> Self {
        self.push(name, get, set, Some(options), false)
    }

    fn push<F: Mapped>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &F,
        set: fn(&mut T, F),
        key: Option<KeyOptions>,
        exclude_from_index: bool,
    ) -> Self {
        self.properties.push(PropertyDescriptor {
            name,
            ty: TypeRef::of::<F>(),
            key,
            exclude_from_index,
            access: Box::new(FieldAccess { get, set }),
        });
        self
    }
}

impl<T: 'static> From<RecordSpec<T>> for TypeSpec {
    fn from(spec: RecordSpec<T>) -> Self {
        let Some(constructor) = spec.constructor else {
            return Self::Unsupported(UnsupportedReason::MissingConstructor);
        };

        Self::Mapped {
            name: Some(spec.name),
            shape: Shape::Record(RecordDescriptor {
                name: spec.name,
                kind: spec.kind,
                family: spec.family,
                constructor,
                properties: spec.properties,
            }),
        }
    }
}

///
/// FamilySpec
///
/// Builder for a closed inheritance family. The base type (usually an enum
/// wrapping each member record) lists its members explicitly; each member
/// gets the discriminator `family.tag`, or just `tag` for unnamed families.
///

pub struct FamilySpec<B> {
    base_name: &'static str,
    family: Option<&'static str>,
    members: Vec<FamilyMember>,
    _base: PhantomData<fn() -> B>,
}

impl<B: 'static> FamilySpec<B> {
    /// A family without a declared name; discriminators are bare tags.
    #[must_use]
    pub const fn new(base_name: &'static str) -> Self {
        Self {
            base_name,
            family: None,
            members: Vec::new(),
            _base: PhantomData,
        }
    }

    /// A named family; discriminators are dotted with the family name.
    #[must_use]
    pub const fn named(base_name: &'static str, family: &'static str) -> Self {
        Self {
            base_name,
            family: Some(family),
            members: Vec::new(),
            _base: PhantomData,
        }
    }

    #[must_use]
    pub fn member<M: Mapped>(
        mut self,
        tag: &'static str,
        project: fn(&B) -> Option<&M>,
        inject: fn(M) -> B,
    ) -> Self {
        let discriminator = match self.family {
            Some(family) if !family.is_empty() => format!("{family}.{tag}"),
            _ => tag.to_string(),
        };

        self.members.push(FamilyMember {
            ty: TypeRef::of::<M>(),
            discriminator,
            access: Box::new(VariantAccess { project, inject }),
        });
        self
    }
}

impl<B: 'static> From<FamilySpec<B>> for TypeSpec {
    fn from(spec: FamilySpec<B>) -> Self {
        Self::Mapped {
            name: Some(spec.base_name),
            shape: Shape::Family(FamilyDescriptor {
                name: spec.family,
                members: spec.members,
            }),
        }
    }
}
