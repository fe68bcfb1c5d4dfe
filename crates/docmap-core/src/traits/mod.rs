mod collection;
mod scalar;

use crate::{
    config::IntegerNarrowing,
    error::TypeMismatchError,
    model::spec::{ScalarKind, TypeSpec},
    value::Value,
};
use std::{
    any::{TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
};

// ============================================================================
// DESCRIBE CAPABILITY
// ============================================================================
//
// Every mapped type describes itself once; the registry walks the
// descriptions and never inspects types at runtime.
//

///
/// Mapped
///
/// A type the registry can build a descriptor for.
///

pub trait Mapped: Sized + 'static {
    fn type_spec() -> TypeSpec;
}

///
/// TypeRef
///
/// Identity of a mapped type plus the function that describes it.
/// This is the edge the registry follows when discovering a type closure.
///

#[derive(Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    type_name: &'static str,
    describe: fn() -> TypeSpec,
}

impl TypeRef {
    #[must_use]
    pub fn of<T: Mapped>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            describe: T::type_spec,
        }
    }

    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Fully-qualified Rust type name (for diagnostics).
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without module paths, e.g. `Vec<String>`.
    #[must_use]
    pub fn short_name(&self) -> String {
        short_type_name(self.type_name)
    }

    #[must_use]
    pub fn describe(&self) -> TypeSpec {
        (self.describe)()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.type_name).finish()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// strip module paths from every segment of a type name
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();

    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            segment.push(c);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or_default());
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or_default());

    out
}

// ============================================================================
// SHAPE TRAITS
// ============================================================================

///
/// ScalarValue
///
/// A leaf type stored as exactly one scalar `Value` variant.
///

pub trait ScalarValue: Sized + 'static {
    const KIND: ScalarKind;

    fn to_value(&self) -> Result<Value, TypeMismatchError>;

    fn from_value(value: &Value, narrowing: IntegerNarrowing) -> Result<Self, TypeMismatchError>;
}

///
/// EnumOrdinal
///
/// A fieldless enumeration stored as its integer ordinal.
///

pub trait EnumOrdinal: Sized + 'static {
    fn ordinal(&self) -> i64;

    fn from_ordinal(ordinal: i64) -> Option<Self>;
}

///
/// CollectionShape
///
/// A constructible collection with exactly one element type.
///

pub trait CollectionShape: Default + 'static {
    type Element: Mapped;

    fn push_element(&mut self, element: Self::Element);

    fn elements(&self) -> Vec<&Self::Element>;
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_strips_every_path_segment() {
        assert_eq!(
            short_type_name("alloc::vec::Vec<alloc::string::String>"),
            "Vec<String>"
        );
        assert_eq!(
            short_type_name("core::option::Option<my_app::model::Item>"),
            "Option<Item>"
        );
        assert_eq!(short_type_name("i64"), "i64");
    }

    #[test]
    fn type_refs_compare_by_type_identity() {
        assert_eq!(TypeRef::of::<i64>(), TypeRef::of::<i64>());
        assert_ne!(TypeRef::of::<i64>(), TypeRef::of::<i32>());
        assert_eq!(TypeRef::of::<Vec<String>>().short_name(), "Vec<String>");
    }
}
