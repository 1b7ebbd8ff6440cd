//! Entry points for creating structured arrays.
//!
//! Every function here goes through the construction engine: elements are
//! populated in index order through constructors, and the array's own
//! constructor runs last, taking the populated storage by placement.
//!
//! # Example
//!
//! ```
//! use structarray_core::api::{new_instance_with, copy_range};
//! use structarray_core::{factory, Arg, ConstructorSet, CtorAndArgs, Element};
//!
//! #[derive(Clone)]
//! struct Sample {
//!     value: f64,
//! }
//!
//! impl Element for Sample {
//!     fn constructors() -> ConstructorSet<Self> {
//!         ConstructorSet::new()
//!             .ctor(|(value,): (f64,)| Sample { value })
//!             .copy_ctor(Sample::clone)
//!     }
//! }
//!
//! let samples = new_instance_with(
//!     10,
//!     factory::from_fn(|ctx| CtorAndArgs::<Sample>::from_args([Arg::value(ctx.index() as f64)])),
//! )
//! .unwrap();
//!
//! let middle = copy_range(&samples, 2, 3).unwrap();
//! assert_eq!(middle.len(), 3);
//! assert_eq!(middle[0].value, 2.0);
//! ```

pub mod error;
pub mod options;

pub use error::{Error, Result};
pub use options::{BuildOptions, BuildOptionsOverride};

pub use crate::copy::{copy_instance, copy_instance_ranges, copy_range, new_instance_from_collection};
pub use crate::shallow::{shallow_copy, shallow_copy_within};

use crate::array::{StructuredArray, StructuredArrayType};
use crate::builder::ArrayBuilder;
use crate::element::Element;
use crate::engine;
use crate::factory::ElementFactory;

/// A `StructuredArray<T>` of `length` default-constructed elements.
pub fn new_instance<T: Element>(length: usize) -> Result<StructuredArray<T>> {
    new_instance_of::<StructuredArray<T>>(length)
}

/// A `StructuredArray<T>` whose elements come from `factory`.
pub fn new_instance_with<'a, T: Element>(
    length: usize,
    factory: impl ElementFactory<'a, T> + 'a,
) -> Result<StructuredArray<T>> {
    new_instance_of_with::<StructuredArray<T>>(length, factory)
}

/// An array of type `S` with `length` default-constructed elements.
pub fn new_instance_of<S: StructuredArrayType>(length: usize) -> Result<S> {
    engine::instantiate(ArrayBuilder::<S>::new(length))
}

pub fn new_instance_of_with<'a, S: StructuredArrayType>(
    length: usize,
    factory: impl ElementFactory<'a, S::Elem> + 'a,
) -> Result<S> {
    engine::instantiate(ArrayBuilder::<S>::new(length).element_factory(factory))
}

/// Builds whatever `builder` describes, nested levels included.
pub fn new_instance_from_builder<S: StructuredArrayType>(builder: ArrayBuilder<'_, S>) -> Result<S> {
    engine::instantiate(builder)
}
