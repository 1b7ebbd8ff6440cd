//! Construction engine for structured arrays.
//!
//! A structured array is a fixed-length container of elements, each built
//! through one of its type's registered constructors while the array itself
//! is being constructed. Arrays can nest, ending in either plain elements or
//! primitive scalar buffers, and every level is described by a shared
//! [`ArrayModel`].
//!
//! Start from [`new_instance`] or an [`ArrayBuilder`]; element types
//! implement [`Element`].

extern crate alloc;

pub mod api;
mod array;
mod builder;
mod constructor;
mod context;
pub mod copy;
mod element;
pub mod engine;
pub mod factory;
mod intrinsic;
mod primitive;
mod registry;
pub mod shallow;
mod slots;

pub use api::{
    BuildOptions, BuildOptionsOverride, Error, Result, copy_instance, copy_instance_ranges,
    copy_range, new_instance, new_instance_from_builder, new_instance_from_collection,
    new_instance_of, new_instance_of_with, new_instance_with, shallow_copy, shallow_copy_within,
};
pub use array::{ElementIter, StructuredArray, StructuredArrayType};
pub use builder::{ArrayBuilder, PrimitiveArrayBuilder, SubArrayBuilder};
pub use constructor::{Arg, ArgTuple, Constructor, ConstructorSet, CtorAndArgs};
pub use context::ConstructionContext;
pub use copy::{CopyFactory, CopyRanges};
pub use element::Element;
pub use engine::{PlacementInfo, current_placement};
pub use factory::{ConstantFactory, ElementFactory};
pub use intrinsic::IntrinsicSlot;
pub use primitive::{Primitive, PrimitiveArray, PrimitiveArrayType};
pub use shallow::{FieldDesc, ShallowCopy};

pub use structarray_model as model;
pub use structarray_model::{ArrayModel, NestedModel, PrimitiveArrayModel, Signature, TypeDesc};

#[cfg(test)]
mod builder_test;
#[cfg(test)]
mod engine_test;
#[cfg(test)]
mod shallow_test;
