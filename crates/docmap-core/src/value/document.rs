use crate::value::Value;
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::ops::Not;

///
/// Document
///
/// Ordered name → value mapping. Field order is insertion order, so the
/// discriminator written first stays first on the wire.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, IntoIterator, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document {
    #[into_iterator(owned, ref)]
    fields: Vec<DocumentField>,
}

impl Document {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Insert an indexed field, replacing any previous value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.insert_field(DocumentField::new(name, value))
    }

    /// Insert a field, replacing any previous value in place.
    pub fn insert_field(&mut self, field: DocumentField) -> Option<Value> {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => {
                existing.exclude_from_indexes = field.exclude_from_indexes;
                Some(std::mem::replace(&mut existing.value, field.value))
            }
            None => {
                self.fields.push(field);
                None
            }
        }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).map(|f| &f.value)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&DocumentField> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|f| f.name == name)?;

        Some(self.fields.remove(index).value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl<N, V> FromIterator<(N, V)> for Document
where
    N: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut doc = Self::new();
        for (name, value) in iter {
            doc.insert(name, value);
        }

        doc
    }
}

///
/// DocumentField
///
/// One named value. `exclude_from_indexes` is a storage hint for the store
/// client; decoding ignores it.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DocumentField {
    pub name: String,
    pub value: Value,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub exclude_from_indexes: bool,
}

impl DocumentField {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            exclude_from_indexes: false,
        }
    }

    #[must_use]
    pub const fn exclude_from_indexes(mut self, exclude: bool) -> Self {
        self.exclude_from_indexes = exclude;
        self
    }
}
