//! Runtime type metadata.
//!
//! - `spec` is what a mapped type *declares* about itself (builders).
//! - `descriptor` is what the registry *publishes* after validating a whole
//!   type closure. Descriptors are immutable once published.
//! - `access` holds the type-erased get/set/construct thunks shared by both.
pub(crate) mod access;
pub mod descriptor;
pub mod spec;

pub use access::{Constructor, Instance};
pub use descriptor::{
    CollectionDescriptor, EnumDescriptor, FamilyDescriptor, FamilyMember, OptionalDescriptor,
    PropertyDescriptor, RecordDescriptor, ScalarDescriptor, Shape, TypeDescriptor,
};
