use crate::{DEFAULT_DISCRIMINATOR_FIELD, error::TypeMismatchError};
use serde::Deserialize;

///
/// MapperConfig
///
/// Registry-wide mapping policy. Fixed for the registry's lifetime so every
/// descriptor is encoded and decoded under the same rules.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct MapperConfig {
    /// Document field written first for family members.
    pub discriminator_field: String,

    /// What to do when a stored integer does not fit a narrower target.
    pub integer_narrowing: IntegerNarrowing,
}

impl MapperConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_discriminator_field(mut self, field: impl Into<String>) -> Self {
        self.discriminator_field = field.into();
        self
    }

    #[must_use]
    pub const fn with_integer_narrowing(mut self, narrowing: IntegerNarrowing) -> Self {
        self.integer_narrowing = narrowing;
        self
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            discriminator_field: DEFAULT_DISCRIMINATOR_FIELD.to_string(),
            integer_narrowing: IntegerNarrowing::default(),
        }
    }
}

///
/// IntegerNarrowing
///
/// Overflow policy for decoding a stored 64-bit integer into a narrower
/// integer or an unsigned target.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum IntegerNarrowing {
    /// Fail with an overflow type mismatch.
    #[default]
    Reject,

    /// Clamp to the target's bounds.
    Saturate,
}

impl IntegerNarrowing {
    /// Narrow `value` into `T`, clamping to `min`/`max` when saturating.
    pub fn narrow<T>(
        self,
        value: i64,
        min: T,
        max: T,
        target: &'static str,
    ) -> Result<T, TypeMismatchError>
    where
        T: TryFrom<i64>,
    {
        match T::try_from(value) {
            Ok(narrowed) => Ok(narrowed),
            Err(_) => match self {
                Self::Reject => Err(TypeMismatchError::Overflow {
                    value: value.to_string(),
                    target,
                }),
                Self::Saturate => Ok(if value < 0 { min } else { max }),
            },
        }
    }
}

///
/// TESTS
///
