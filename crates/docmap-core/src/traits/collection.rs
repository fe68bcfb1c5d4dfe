use crate::{
    error::UnsupportedReason,
    model::spec::TypeSpec,
    traits::{CollectionShape, Mapped},
};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    hash::BuildHasher,
};

//
// Single-parameter collections
//

impl<T: Mapped> CollectionShape for Vec<T> {
    type Element = T;

    fn push_element(&mut self, element: T) {
        self.push(element);
    }

    fn elements(&self) -> Vec<&T> {
        self.iter().collect()
    }
}

impl<T: Mapped> Mapped for Vec<T> {
    fn type_spec() -> TypeSpec {
        TypeSpec::collection::<Self>()
    }
}

impl<T: Mapped> CollectionShape for VecDeque<T> {
    type Element = T;

    fn push_element(&mut self, element: T) {
        self.push_back(element);
    }

    fn elements(&self) -> Vec<&T> {
        self.iter().collect()
    }
}

impl<T: Mapped> Mapped for VecDeque<T> {
    fn type_spec() -> TypeSpec {
        TypeSpec::collection::<Self>()
    }
}

// sets encode in iteration order, which for BTreeSet is sorted
impl<T: Mapped + Ord> CollectionShape for BTreeSet<T> {
    type Element = T;

    fn push_element(&mut self, element: T) {
        self.insert(element);
    }

    fn elements(&self) -> Vec<&T> {
        self.iter().collect()
    }
}

impl<T: Mapped + Ord> Mapped for BTreeSet<T> {
    fn type_spec() -> TypeSpec {
        TypeSpec::collection::<Self>()
    }
}

//
// Maps
// Two type parameters; reported so the registry can reject them.
//

impl<K: 'static, V: 'static> Mapped for BTreeMap<K, V> {
    fn type_spec() -> TypeSpec {
        TypeSpec::unsupported(UnsupportedReason::CollectionArity { parameters: 2 })
    }
}

impl<K: 'static, V: 'static, S: BuildHasher + 'static> Mapped for HashMap<K, V, S> {
    fn type_spec() -> TypeSpec {
        TypeSpec::unsupported(UnsupportedReason::CollectionArity { parameters: 2 })
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_elements_iterate_sorted() {
        let mut set = BTreeSet::new();
        set.push_element(3_i64);
        set.push_element(1);
        set.push_element(3);

        assert_eq!(set.elements(), vec![&1, &3]);
    }

    #[test]
    fn maps_declare_themselves_unsupported() {
        let spec = <BTreeMap<String, i64> as Mapped>::type_spec();

        assert!(
            matches!(
                spec,
                TypeSpec::Unsupported(UnsupportedReason::CollectionArity { parameters: 2 })
            ),
            "maps should be rejected with the parameter count"
        );
    }
}
