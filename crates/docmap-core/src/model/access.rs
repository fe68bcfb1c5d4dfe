use crate::{
    config::IntegerNarrowing,
    error::TypeMismatchError,
    traits::{CollectionShape, EnumOrdinal, ScalarValue},
    value::Value,
};
use std::any::{Any, type_name};

/// Type-erased instance produced by constructors and decoders.
pub type Instance = Box<dyn Any>;

/// Zero-argument constructor thunk.
pub type Constructor = fn() -> Instance;

///
/// PropertyAccess
///
/// Erased get/set pair for one record property.
///

pub(crate) trait PropertyAccess: Send + Sync {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any>;

    /// Hands the value back when either the owner or the value has the
    /// wrong type.
    fn set(&self, owner: &mut dyn Any, value: Instance) -> Result<(), Instance>;
}

pub(crate) struct FieldAccess<T, F> {
    pub(crate) get: fn(&T) -> &F,
    pub(crate) set: fn(&mut T, F),
}

impl<T: 'static, F: 'static> PropertyAccess for FieldAccess<T, F> {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        let owner = owner.downcast_ref::<T>()?;

        Some((self.get)(owner) as &dyn Any)
    }

    fn set(&self, owner: &mut dyn Any, value: Instance) -> Result<(), Instance> {
        let Some(owner) = owner.downcast_mut::<T>() else {
            return Err(value);
        };
        let value = value.downcast::<F>()?;
        (self.set)(owner, *value);

        Ok(())
    }
}

///
/// MemberAccess
///
/// Erased projection/injection between a family base and one member.
///

pub(crate) trait MemberAccess: Send + Sync {
    fn project<'a>(&self, base: &'a dyn Any) -> Option<&'a dyn Any>;

    fn inject(&self, member: Instance) -> Result<Instance, Instance>;
}

pub(crate) struct VariantAccess<B, M> {
    pub(crate) project: fn(&B) -> Option<&M>,
    pub(crate) inject: fn(M) -> B,
}

impl<B: 'static, M: 'static> MemberAccess for VariantAccess<B, M> {
    fn project<'a>(&self, base: &'a dyn Any) -> Option<&'a dyn Any> {
        let base = base.downcast_ref::<B>()?;
        let member = (self.project)(base)?;

        Some(member as &dyn Any)
    }

    fn inject(&self, member: Instance) -> Result<Instance, Instance> {
        let member = member.downcast::<M>()?;

        Ok(Box::new((self.inject)(*member)) as Instance)
    }
}

//
// Generic thunks, monomorphised per mapped type and stored as fn pointers.
//

pub(crate) fn construct_default<T: Default + 'static>() -> Instance {
    Box::new(T::default())
}

pub(crate) fn encode_scalar<T: ScalarValue>(value: &dyn Any) -> Result<Value, TypeMismatchError> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| TypeMismatchError::downcast(type_name::<T>()))?
        .to_value()
}

pub(crate) fn decode_scalar<T: ScalarValue>(
    value: &Value,
    narrowing: IntegerNarrowing,
) -> Result<Instance, TypeMismatchError> {
    let decoded = T::from_value(value, narrowing)?;

    Ok(Box::new(decoded) as Instance)
}

pub(crate) fn enum_ordinal<T: EnumOrdinal>(value: &dyn Any) -> Option<i64> {
    value.downcast_ref::<T>().map(EnumOrdinal::ordinal)
}

pub(crate) fn enum_from_ordinal<T: EnumOrdinal>(ordinal: i64) -> Option<Instance> {
    T::from_ordinal(ordinal).map(|v| Box::new(v) as Instance)
}

pub(crate) fn option_get<T: 'static>(value: &dyn Any) -> Option<Option<&dyn Any>> {
    let option = value.downcast_ref::<Option<T>>()?;

    Some(option.as_ref().map(|inner| inner as &dyn Any))
}

pub(crate) fn option_none<T: 'static>() -> Instance {
    Box::new(None::<T>)
}

pub(crate) fn option_some<T: 'static>(inner: Instance) -> Result<Instance, Instance> {
    let inner = inner.downcast::<T>()?;

    Ok(Box::new(Some(*inner)) as Instance)
}

pub(crate) fn collection_items<C: CollectionShape>(value: &dyn Any) -> Option<Vec<&dyn Any>> {
    let collection = value.downcast_ref::<C>()?;

    Some(
        collection
            .elements()
            .into_iter()
            .map(|element| element as &dyn Any)
            .collect(),
    )
}

pub(crate) fn collection_add<C: CollectionShape>(
    collection: &mut dyn Any,
    element: Instance,
) -> Result<(), Instance> {
    let Some(collection) = collection.downcast_mut::<C>() else {
        return Err(element);
    };
    let element = element.downcast::<C::Element>()?;
    collection.push_element(*element);

    Ok(())
}
