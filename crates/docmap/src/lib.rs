//! docmap: typed entities over a schemaless document store.
//!
//! Downstream users depend on **docmap** only. It re-exports the mapping
//! runtime from `docmap-core` and adds the store capability, typed filters,
//! query options and the per-kind CRUD layer on top of it.

pub use docmap_core as core;

pub mod error;
pub mod filter;
pub mod kind;
pub mod query;
pub mod store;

pub use docmap_core::{DEFAULT_DISCRIMINATOR_FIELD, MapError};
pub use docmap_derive::Mapped;
pub use error::Error;

//
// Prelude
//

pub mod prelude {
    pub use crate::{
        Error,
        filter::Filter,
        kind::Kind,
        query::{Direction, QueryOptions},
        store::{MemoryStore, Store},
    };
    pub use docmap_core::{prelude::*, traits::Mapped};
    pub use docmap_derive::Mapped;
}
