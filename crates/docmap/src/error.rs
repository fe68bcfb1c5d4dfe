use crate::store::StoreError;
use docmap_core::error::{ErrorClass, MapError};
use thiserror::Error as ThisError;

///
/// Error
/// Failure of a kind-level operation.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("bulk delete of {requested} entities exceeds the limit of {limit}")]
    BulkDeleteLimit { requested: usize, limit: usize },
}

impl Error {
    /// Class of the underlying mapping error, if any.
    #[must_use]
    pub fn map_class(&self) -> Option<ErrorClass> {
        match self {
            Self::Map(err) => Some(err.class()),
            _ => None,
        }
    }
}
