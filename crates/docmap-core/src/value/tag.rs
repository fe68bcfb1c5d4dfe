use crate::value::Value;
use derive_more::Display;

///
/// ValueTag
///
/// Variant tag of a `Value`, used for diagnostics and decode dispatch.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ValueTag {
    Array,
    Boolean,
    Document,
    Double,
    Integer,
    Null,
    String,
    Timestamp,
}

impl ValueTag {
    /// Stable human-readable value kind label for diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Array => "Array",
            Self::Boolean => "Boolean",
            Self::Document => "Document",
            Self::Double => "Double",
            Self::Integer => "Integer",
            Self::Null => "Null",
            Self::String => "String",
            Self::Timestamp => "Timestamp",
        }
    }
}

#[must_use]
pub(super) const fn tag_of(value: &Value) -> ValueTag {
    match value {
        Value::Array(_) => ValueTag::Array,
        Value::Boolean(_) => ValueTag::Boolean,
        Value::Document(_) => ValueTag::Document,
        Value::Double(_) => ValueTag::Double,
        Value::Integer(_) => ValueTag::Integer,
        Value::Null => ValueTag::Null,
        Value::String(_) => ValueTag::String,
        Value::Timestamp(_) => ValueTag::Timestamp,
    }
}
