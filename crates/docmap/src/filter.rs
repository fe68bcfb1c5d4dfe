use docmap_core::value::{Document, Value};

///
/// Filter
///
/// Property filter over stored documents. Values use the same closed
/// `Value` variant as documents, so a comparison is always between two
/// tagged values.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Equal { property: String, value: Value },
    And(Vec<Self>),
}

impl Filter {
    #[must_use]
    pub fn equal(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            property: property.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = Self>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// A missing property never matches, not even `Null`. An empty `And`
    /// matches everything.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Equal { property, value } => document.get(property) == Some(value),
            Self::And(filters) => filters.iter().all(|f| f.matches(document)),
        }
    }
}

///
/// TESTS
///
