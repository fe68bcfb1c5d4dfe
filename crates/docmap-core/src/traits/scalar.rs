use crate::{
    config::IntegerNarrowing,
    error::TypeMismatchError,
    model::spec::{ScalarKind, TypeSpec},
    traits::{EnumOrdinal, Mapped, ScalarValue},
    value::Value,
};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

// integral types widen losslessly to i64; u64 is checked on the way in
macro_rules! impl_integer_scalar {
    ( $( $ty:ty ),* $(,)? ) => {
        $(
            impl ScalarValue for $ty {
                const KIND: ScalarKind = ScalarKind::Integer;

                fn to_value(&self) -> Result<Value, TypeMismatchError> {
                    i64::try_from(*self)
                        .map(Value::Integer)
                        .map_err(|_| TypeMismatchError::Overflow {
                            value: self.to_string(),
                            target: "i64",
                        })
                }

                fn from_value(
                    value: &Value,
                    narrowing: IntegerNarrowing,
                ) -> Result<Self, TypeMismatchError> {
                    let stored = value
                        .as_integer()
                        .ok_or_else(|| TypeMismatchError::variant(stringify!($ty), value.tag()))?;

                    narrowing.narrow(stored, <$ty>::MIN, <$ty>::MAX, stringify!($ty))
                }
            }

            impl Mapped for $ty {
                fn type_spec() -> TypeSpec {
                    TypeSpec::scalar::<Self>()
                }
            }
        )*
    };
}

impl_integer_scalar!(i8, i16, i32, i64, u8, u16, u32, u64);

// Everything below maps onto exactly one variant with no conversion rules
// beyond the ones spelled out per type.
macro_rules! impl_mapped_scalar {
    ( $( $ty:ty ),* $(,)? ) => {
        $(
            impl Mapped for $ty {
                fn type_spec() -> TypeSpec {
                    TypeSpec::scalar::<Self>()
                }
            }
        )*
    };
}

impl_mapped_scalar!(
    f32,
    f64,
    bool,
    String,
    DateTime<Utc>,
    DateTime<FixedOffset>,
    NaiveDateTime
);

impl ScalarValue for f64 {
    const KIND: ScalarKind = ScalarKind::Double;

    fn to_value(&self) -> Result<Value, TypeMismatchError> {
        Ok(Value::Double(*self))
    }

    fn from_value(value: &Value, _: IntegerNarrowing) -> Result<Self, TypeMismatchError> {
        value
            .as_double()
            .ok_or_else(|| TypeMismatchError::variant("f64", value.tag()))
    }
}

impl ScalarValue for f32 {
    const KIND: ScalarKind = ScalarKind::Double;

    fn to_value(&self) -> Result<Value, TypeMismatchError> {
        Ok(Value::Double(f64::from(*self)))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: &Value, _: IntegerNarrowing) -> Result<Self, TypeMismatchError> {
        value
            .as_double()
            .map(|v| v as Self)
            .ok_or_else(|| TypeMismatchError::variant("f32", value.tag()))
    }
}

impl ScalarValue for bool {
    const KIND: ScalarKind = ScalarKind::Boolean;

    fn to_value(&self) -> Result<Value, TypeMismatchError> {
        Ok(Value::Boolean(*self))
    }

    fn from_value(value: &Value, _: IntegerNarrowing) -> Result<Self, TypeMismatchError> {
        value
            .as_bool()
            .ok_or_else(|| TypeMismatchError::variant("bool", value.tag()))
    }
}

impl ScalarValue for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn to_value(&self) -> Result<Value, TypeMismatchError> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value, _: IntegerNarrowing) -> Result<Self, TypeMismatchError> {
        value
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| TypeMismatchError::variant("String", value.tag()))
    }
}

//
// Timestamps
// Stored as UTC instants. Offsets are normalized away; naive datetimes are
// taken to be UTC already.
//

impl ScalarValue for DateTime<Utc> {
    const KIND: ScalarKind = ScalarKind::Timestamp;

    fn to_value(&self) -> Result<Value, TypeMismatchError> {
        Ok(Value::Timestamp(*self))
    }

    fn from_value(value: &Value, _: IntegerNarrowing) -> Result<Self, TypeMismatchError> {
        value
            .as_timestamp()
            .copied()
            .ok_or_else(|| TypeMismatchError::variant("DateTime<Utc>", value.tag()))
    }
}

impl ScalarValue for DateTime<FixedOffset> {
    const KIND: ScalarKind = ScalarKind::Timestamp;

    fn to_value(&self) -> Result<Value, TypeMismatchError> {
        Ok(Value::Timestamp(self.with_timezone(&Utc)))
    }

    fn from_value(value: &Value, _: IntegerNarrowing) -> Result<Self, TypeMismatchError> {
        value
            .as_timestamp()
            .map(DateTime::fixed_offset)
            .ok_or_else(|| TypeMismatchError::variant("DateTime<FixedOffset>", value.tag()))
    }
}

impl ScalarValue for NaiveDateTime {
    const KIND: ScalarKind = ScalarKind::Timestamp;

    fn to_value(&self) -> Result<Value, TypeMismatchError> {
        Ok(Value::Timestamp(self.and_utc()))
    }

    fn from_value(value: &Value, _: IntegerNarrowing) -> Result<Self, TypeMismatchError> {
        value
            .as_timestamp()
            .map(DateTime::naive_utc)
            .ok_or_else(|| TypeMismatchError::variant("NaiveDateTime", value.tag()))
    }
}

//
// Option
//

impl<T: Mapped> Mapped for Option<T> {
    fn type_spec() -> TypeSpec {
        TypeSpec::optional::<T>()
    }
}

// Ordinals for plain `Ordering`-style enums are common enough in entities to
// ship one impl as a reference for application enums.
impl EnumOrdinal for std::cmp::Ordering {
    fn ordinal(&self) -> i64 {
        i64::from(*self as i8)
    }

    fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            -1 => Some(Self::Less),
            0 => Some(Self::Equal),
            1 => Some(Self::Greater),
            _ => None,
        }
    }
}

impl Mapped for std::cmp::Ordering {
    fn type_spec() -> TypeSpec {
        crate::model::spec::EnumSpec::of::<Self>("Ordering").into()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn narrow_integers_widen_to_i64() {
        assert_eq!(7i8.to_value(), Ok(Value::Integer(7)));
        assert_eq!((-3i16).to_value(), Ok(Value::Integer(-3)));
        assert_eq!(u32::MAX.to_value(), Ok(Value::Integer(i64::from(u32::MAX))));
    }

    #[test]
    fn u64_above_i64_max_is_rejected_on_encode() {
        let err = u64::MAX
            .to_value()
            .expect_err("u64::MAX cannot be stored as a signed 64-bit integer");

        assert!(matches!(err, TypeMismatchError::Overflow { target: "i64", .. }));
    }

    #[test]
    fn i32_decode_rejects_overflow_by_default() {
        let stored = Value::Integer(i64::from(i32::MAX) + 10);
        let err = i32::from_value(&stored, IntegerNarrowing::Reject)
            .expect_err("value above i32::MAX should not narrow");

        assert!(matches!(err, TypeMismatchError::Overflow { target: "i32", .. }));
        assert_eq!(
            i32::from_value(&stored, IntegerNarrowing::Saturate),
            Ok(i32::MAX)
        );
    }

    #[test]
    fn integer_decode_requires_integer_variant() {
        let err = i64::from_value(&Value::from("12"), IntegerNarrowing::Reject)
            .expect_err("strings are not integers");

        assert_eq!(
            err,
            TypeMismatchError::Variant {
                expected: "i64".to_string(),
                found: crate::value::ValueTag::String,
            }
        );
    }

    #[test]
    fn offset_timestamps_normalize_to_the_same_instant() {
        let offset = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        let local = offset
            .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .expect("unambiguous local time");

        let stored = local.to_value().expect("timestamps always encode");
        let expected = Utc
            .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
            .single()
            .expect("unambiguous utc time");
        assert_eq!(stored, Value::Timestamp(expected));

        let decoded = DateTime::<FixedOffset>::from_value(&stored, IntegerNarrowing::Reject)
            .expect("timestamp should decode");
        assert_eq!(decoded, local, "decoded value should be the same instant");
    }

    #[test]
    fn naive_datetime_is_treated_as_utc() {
        let naive = Utc
            .with_ymd_and_hms(2023, 12, 31, 23, 59, 58)
            .single()
            .expect("valid time")
            .naive_utc();

        let stored = naive.to_value().expect("timestamps always encode");
        let decoded = NaiveDateTime::from_value(&stored, IntegerNarrowing::Reject)
            .expect("timestamp should decode");

        assert_eq!(decoded, naive);
    }

    #[test]
    fn ordering_ordinals_round_trip() {
        for ordering in [
            std::cmp::Ordering::Less,
            std::cmp::Ordering::Equal,
            std::cmp::Ordering::Greater,
        ] {
            assert_eq!(
                std::cmp::Ordering::from_ordinal(ordering.ordinal()),
                Some(ordering)
            );
        }
        assert_eq!(std::cmp::Ordering::from_ordinal(2), None);
    }
}
