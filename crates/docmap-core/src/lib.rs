//! Core runtime for docmap: tagged values, type descriptors, the type
//! registry, the value encoder/decoder, and entity key management.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod key;
pub mod mapper;
pub mod model;
pub mod registry;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Document field that carries the discriminator of a family member.
pub const DEFAULT_DISCRIMINATOR_FIELD: &str = "__InheritedType";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No encoders, decoders, or registry internals are re-exported here.
///

pub mod prelude {
    pub use crate::{
        key::{EntityKey, KeyId, KeyOptions},
        mapper::{Mapper, StoredEntity},
        model::spec::{EnumSpec, FamilySpec, RecordSpec, TypeSpec},
        registry::Registry,
        traits::{EnumOrdinal, Mapped},
        value::{Document, Value},
    };
}

pub use error::MapError;
