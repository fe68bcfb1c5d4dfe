use crate::value::{Document, Value};
use std::cmp::Ordering;

/// Total order over stored values, used to sort query results.
///
/// Values of different variants order by rank alone: null, integers,
/// timestamps, booleans, strings, doubles, arrays, documents. Within a
/// variant the natural order applies; doubles use IEEE total order, arrays
/// and documents compare element by element.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = canonical_rank(left).cmp(&canonical_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    match (left, right) {
        (Value::Array(a), Value::Array(b)) => cmp_arrays(a, b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::Document(a), Value::Document(b)) => cmp_documents(a, b),
        (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[must_use]
pub const fn canonical_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Integer(_) => 1,
        Value::Timestamp(_) => 2,
        Value::Boolean(_) => 3,
        Value::String(_) => 4,
        Value::Double(_) => 5,
        Value::Array(_) => 6,
        Value::Document(_) => 7,
    }
}

fn cmp_arrays(left: &[Value], right: &[Value]) -> Ordering {
    left.iter()
        .zip(right)
        .map(|(a, b)| canonical_cmp(a, b))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| left.len().cmp(&right.len()))
}

fn cmp_documents(left: &Document, right: &Document) -> Ordering {
    left.iter()
        .zip(right.iter())
        .map(|(a, b)| a.name.cmp(&b.name).then_with(|| canonical_cmp(&a.value, &b.value)))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| left.len().cmp(&right.len()))
}
