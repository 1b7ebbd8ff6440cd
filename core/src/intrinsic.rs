//! Intrinsic slots: single-assignment fields that a host object fills in
//! after its own construction, with an element or an array built in place.

use core::fmt;

use once_cell::unsync::OnceCell;
use structarray_model::TypeDesc;
use tracing::trace;

use crate::api::error::{Error, Result};
use crate::array::StructuredArrayType;
use crate::builder::{ArrayBuilder, PrimitiveArrayBuilder};
use crate::constructor::CtorAndArgs;
use crate::engine;
use crate::primitive::PrimitiveArrayType;

/// A field that is constructed at most once.
pub struct IntrinsicSlot<T> {
    cell: OnceCell<T>,
}

impl<T> Default for IntrinsicSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntrinsicSlot<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn into_inner(self) -> Option<T> {
        self.cell.into_inner()
    }

    fn ensure_empty(&self) -> Result<()> {
        if self.is_initialized() {
            return Err(Error::AlreadyInitialized { index: 0 });
        }
        Ok(())
    }

    fn install(&self, value: T) -> Result<&T>
    where
        T: 'static,
    {
        match self.cell.try_insert(value) {
            Ok(value) => {
                trace!(ty = %TypeDesc::of::<T>(), "intrinsic slot initialized");
                Ok(value)
            }
            Err(_) => Err(Error::AlreadyInitialized { index: 0 }),
        }
    }
}

impl<T: 'static> IntrinsicSlot<T> {
    /// Constructs the value with `ctor_and_args`. Fails with
    /// [`Error::AlreadyInitialized`] if the slot is already set.
    pub fn construct_within(&self, ctor_and_args: &CtorAndArgs<'_, T>) -> Result<&T> {
        self.ensure_empty()?;
        let value = ctor_and_args.invoke()?;
        self.install(value)
    }
}

impl<S: StructuredArrayType> IntrinsicSlot<S> {
    /// Builds a structured array from `builder` into the slot.
    pub fn construct_array_within(&self, builder: ArrayBuilder<'_, S>) -> Result<&S> {
        self.ensure_empty()?;
        let array = engine::instantiate(builder)?;
        self.install(array)
    }
}

impl<A: PrimitiveArrayType> IntrinsicSlot<A> {
    /// Builds a primitive array from `builder` into the slot.
    pub fn construct_primitive_array_within(
        &self,
        builder: PrimitiveArrayBuilder<'_, A>,
    ) -> Result<&A> {
        self.ensure_empty()?;
        let array = builder.build()?;
        self.install(array)
    }
}

impl<T: fmt::Debug> fmt::Debug for IntrinsicSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("IntrinsicSlot").field(value).finish(),
            None => f.write_str("IntrinsicSlot(<uninit>)"),
        }
    }
}
