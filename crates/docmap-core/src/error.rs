use crate::{key::KeyType, value::ValueTag};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// MapError
///
/// Every failure raised by the mapping core. Errors are synchronous and
/// local to the call that raised them; nothing here is retried.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MapError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedTypeError),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatchError),

    #[error("type '{type_name}' is not registered")]
    Unregistered { type_name: String },

    #[error("property '{property}': {source}")]
    Property {
        property: String,
        source: Box<Self>,
    },
}

impl MapError {
    pub(crate) fn unregistered(type_name: impl Into<String>) -> Self {
        Self::Unregistered {
            type_name: type_name.into(),
        }
    }

    /// Wrap this error with the property it was raised under.
    #[must_use]
    pub fn in_property(self, property: impl Into<String>) -> Self {
        Self::Property {
            property: property.into(),
            source: Box::new(self),
        }
    }

    /// Strip property context and return the error that started the chain.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Property { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Dotted property path leading to the root cause, if any.
    #[must_use]
    pub fn property_path(&self) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = self;
        while let Self::Property { property, source } = current {
            segments.push(property.as_str());
            current = source;
        }

        (!segments.is_empty()).then(|| segments.join("."))
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self.root_cause() {
            Self::Configuration(_) => ErrorClass::Configuration,
            Self::Unsupported(_) => ErrorClass::Unsupported,
            Self::TypeMismatch(_) => ErrorClass::TypeMismatch,
            Self::Unregistered { .. } | Self::Property { .. } => ErrorClass::NotFound,
        }
    }
}

///
/// ConfigurationError
///
/// Fatal metadata errors raised while building a type closure or a key
/// descriptor. Cached by the registry; never retried.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigurationError {
    #[error(
        "entity '{entity}' has no key property; mark exactly one property as the key"
    )]
    MissingKey { entity: String },

    #[error(
        "entity '{entity}' declares too many keys ({}); only one allowed",
        .properties.join(", ")
    )]
    MultipleKeys {
        entity: String,
        properties: Vec<String>,
    },

    #[error("key property '{entity}.{property}' has type '{type_name}'; keys must be integer or string")]
    UnsupportedKeyType {
        entity: String,
        property: String,
        type_name: String,
    },

    #[error("key property '{entity}.{property}' is auto-generated but is not an integer")]
    AutoGeneratedNameKey { entity: String, property: String },

    #[error("type '{type_name}' is not a record and cannot be stored as an entity")]
    NotAnEntity { type_name: String },

    #[error("member '{type_name}' of family '{family}' must be a record")]
    FamilyMemberNotRecord { family: String, type_name: String },

    #[error("record '{type_name}' claims membership of family '{family}', which does not list it")]
    UndeclaredFamilyMember { family: String, type_name: String },

    #[error(
        "type '{type_name}' is registered with discriminator {existing:?}, cannot tag it '{requested}'"
    )]
    DiscriminatorConflict {
        type_name: String,
        existing: Option<String>,
        requested: String,
    },

    #[error("record '{record}' declares property '{property}', which is reserved for the discriminator")]
    ReservedPropertyName { record: String, property: String },

    #[error("discriminator '{discriminator}' is claimed by both '{first}' and '{second}'")]
    DuplicateDiscriminator {
        discriminator: String,
        first: String,
        second: String,
    },
}

///
/// UnsupportedTypeError
///
/// A reachable type whose shape cannot be mapped.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("type '{type_name}' is unsupported: {reason}")]
pub struct UnsupportedTypeError {
    pub type_name: String,
    pub reason: UnsupportedReason,
}

///
/// UnsupportedReason
///

#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum UnsupportedReason {
    #[display("collections must take exactly one type parameter, found {parameters}")]
    CollectionArity { parameters: usize },

    #[display("no zero-argument constructor")]
    MissingConstructor,

    #[display("{_0}")]
    Declared(String),
}

///
/// TypeMismatchError
///
/// A stored value, instance, or key identity that does not fit the type it
/// was asked to become.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TypeMismatchError {
    #[error("expected {expected}, found {found} value")]
    Variant { expected: String, found: ValueTag },

    #[error("integer {value} does not fit in {target}")]
    Overflow { value: String, target: &'static str },

    #[error("ordinal {ordinal} is not a variant of '{enumeration}'")]
    UnknownOrdinal { enumeration: String, ordinal: i64 },

    #[error("discriminator '{discriminator}' is not registered")]
    UnknownDiscriminator { discriminator: String },

    #[error("document for family '{family}' has no discriminator field '{field}'")]
    MissingDiscriminator { family: String, field: String },

    #[error("discriminator '{discriminator}' names '{found}', expected '{expected}'")]
    DiscriminatorMismatch {
        discriminator: String,
        expected: String,
        found: String,
    },

    #[error("value of family '{family}' matches no declared member")]
    UndeclaredMember { family: String },

    #[error("kind '{kind}' expects {expected} identities, got {found}")]
    KeyKind {
        kind: String,
        expected: KeyType,
        found: KeyType,
    },

    #[error("key of kind '{found}' used for kind '{expected}'")]
    KindMismatch { expected: String, found: String },

    #[error("key for kind '{kind}' is incomplete")]
    IncompleteKey { kind: String },

    #[error("expected {expected} keys, got {found}")]
    KeyCount { expected: usize, found: usize },

    #[error("instance is not a '{expected}'")]
    Downcast { expected: String },
}

impl TypeMismatchError {
    pub(crate) fn variant(expected: impl Into<String>, found: ValueTag) -> Self {
        Self::Variant {
            expected: expected.into(),
            found,
        }
    }

    pub(crate) fn downcast(expected: impl Into<String>) -> Self {
        Self::Downcast {
            expected: expected.into(),
        }
    }
}

///
/// ErrorClass
/// Error taxonomy for caller-side classification.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorClass {
    #[display("configuration")]
    Configuration,

    #[display("not_found")]
    NotFound,

    #[display("type_mismatch")]
    TypeMismatch,

    #[display("unsupported")]
    Unsupported,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_context_keeps_root_cause_and_path() {
        let err = MapError::from(TypeMismatchError::variant("i64", ValueTag::String))
            .in_property("qty")
            .in_property("lines");

        assert_eq!(err.class(), ErrorClass::TypeMismatch);
        assert_eq!(err.property_path().as_deref(), Some("lines.qty"));
        assert!(
            matches!(
                err.root_cause(),
                MapError::TypeMismatch(TypeMismatchError::Variant { .. })
            ),
            "root cause should survive property wrapping"
        );
        assert_eq!(
            err.to_string(),
            "property 'lines': property 'qty': expected i64, found String value"
        );
    }

    #[test]
    fn multiple_keys_message_lists_properties() {
        let err = ConfigurationError::MultipleKeys {
            entity: "Order".to_string(),
            properties: vec!["id".to_string(), "code".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "entity 'Order' declares too many keys (id, code); only one allowed"
        );
    }

    #[test]
    fn unsupported_reason_renders_parameter_count() {
        let err = UnsupportedTypeError {
            type_name: "BTreeMap<String, i64>".to_string(),
            reason: UnsupportedReason::CollectionArity { parameters: 2 },
        };

        assert_eq!(
            err.to_string(),
            "type 'BTreeMap<String, i64>' is unsupported: collections must take exactly one type parameter, found 2"
        );
        assert_eq!(MapError::from(err).class(), ErrorClass::Unsupported);
    }

    #[test]
    fn error_class_labels_are_snake_case() {
        assert_eq!(ErrorClass::NotFound.to_string(), "not_found");
        assert_eq!(ErrorClass::TypeMismatch.to_string(), "type_mismatch");
    }
}
