use crate::filter::Filter;
use docmap_core::{
    mapper::StoredEntity,
    value::{Value, canonical_cmp},
};
use std::cmp::Ordering;

///
/// Direction
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

///
/// QueryOptions
///
/// Filter, sort order and limit for one query over a kind. Without an
/// order, results come back in key order.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryOptions {
    pub filter: Option<Filter>,
    pub order: Vec<(String, Direction)>,
    pub limit: Option<usize>,
}

impl QueryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Add a sort property; earlier properties take precedence.
    #[must_use]
    pub fn order_by(mut self, property: impl Into<String>, direction: Direction) -> Self {
        self.order.push((property.into(), direction));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn matches(&self, entity: &StoredEntity) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter.matches(&entity.document))
    }

    /// Sort by the ordered properties, then truncate to the limit. The sort
    /// is stable, so ties keep their incoming order. A missing property
    /// sorts as `Null`.
    pub fn apply(&self, entities: &mut Vec<StoredEntity>) {
        if !self.order.is_empty() {
            entities.sort_by(|a, b| self.compare(a, b));
        }
        if let Some(limit) = self.limit {
            entities.truncate(limit);
        }
    }

    fn compare(&self, a: &StoredEntity, b: &StoredEntity) -> Ordering {
        for (property, direction) in &self.order {
            let left = a.document.get(property).unwrap_or(&Value::Null);
            let right = b.document.get(property).unwrap_or(&Value::Null);

            let ord = match direction {
                Direction::Ascending => canonical_cmp(left, right),
                Direction::Descending => canonical_cmp(right, left),
            };
            if ord.is_ne() {
                return ord;
            }
        }

        Ordering::Equal
    }
}

impl From<Filter> for QueryOptions {
    fn from(filter: Filter) -> Self {
        Self::new().filter(filter)
    }
}

///
/// TESTS
///
