//! Per-thread cache of constructor sets.
//!
//! [`Element::constructors`] may allocate, and copy construction looks the
//! same set up once per slot, so each thread keeps the sets it has seen.
//! Constructors hold `Rc` closures, which is why the cache is thread-local.

use alloc::rc::Rc;
use core::any::{Any, TypeId};
use std::cell::RefCell;

use hashbrown::HashMap;

use crate::constructor::ConstructorSet;
use crate::element::Element;

thread_local! {
    static CONSTRUCTORS: RefCell<HashMap<TypeId, Rc<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Returns `T`'s constructor set, building and caching it on first use.
pub(crate) fn constructors_of<T: Element>() -> Rc<ConstructorSet<T>> {
    let cached = CONSTRUCTORS.with(|cache| cache.borrow().get(&TypeId::of::<T>()).cloned());
    if let Some(set) = cached.and_then(|set| set.downcast::<ConstructorSet<T>>().ok()) {
        return set;
    }

    // Built outside the borrow: constructor sets may look up other sets.
    let set = Rc::new(T::constructors());
    tracing::trace!(
        ty = %structarray_model::TypeDesc::of::<T>(),
        count = set.len(),
        "caching constructor set"
    );
    CONSTRUCTORS.with(|cache| {
        cache
            .borrow_mut()
            .insert(TypeId::of::<T>(), set.clone() as Rc<dyn Any>);
    });
    set
}

#[cfg(test)]
pub(crate) fn cached_count() -> usize {
    CONSTRUCTORS.with(|cache| cache.borrow().len())
}
