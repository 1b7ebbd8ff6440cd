//! structarray - arrays of objects built element by element through
//! constructors, with shared shape models and nesting.
//!
//! # Overview
//!
//! A structured array is a fixed-length container whose slots are filled
//! exactly once, while the array itself is constructed, by calling one of the
//! element type's registered constructors per slot. Arrays can contain
//! arrays, down to plain elements or primitive scalar buffers, and every
//! level is described by a shared, immutable [`ArrayModel`].
//!
//! # Quick Start
//!
//! ```
//! use structarray::{Arg, ConstructorSet, CtorAndArgs, Element, copy_range, factory, new_instance_with};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Reading {
//!     sensor: u32,
//!     value: f64,
//! }
//!
//! impl Element for Reading {
//!     fn constructors() -> ConstructorSet<Self> {
//!         ConstructorSet::new()
//!             .ctor(|(sensor, value): (u32, f64)| Reading { sensor, value })
//!             .copy_ctor(Reading::clone)
//!     }
//! }
//!
//! // One reading per sensor, built in index order.
//! let readings = new_instance_with(
//!     8,
//!     factory::from_fn(|ctx| {
//!         CtorAndArgs::<Reading>::from_args([Arg::value(ctx.index() as u32), Arg::value(0.5)])
//!     }),
//! )
//! .unwrap();
//! assert_eq!(readings[7].sensor, 7);
//!
//! // Copies go through the copy constructor, one element at a time.
//! let tail = copy_range(&readings, 5, 3).unwrap();
//! assert_eq!(tail.len(), 3);
//! assert_eq!(tail[0], readings[5]);
//! ```
//!
//! # Nested arrays
//!
//! ```
//! use structarray::{ArrayBuilder, PrimitiveArray, PrimitiveArrayBuilder, StructuredArray};
//!
//! let frames = ArrayBuilder::<StructuredArray<PrimitiveArray<u16>>>::new(4)
//!     .primitive_sub_array_builder(PrimitiveArrayBuilder::new(320))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(frames.model().to_string(), "[4][320]u16");
//! assert_eq!(frames[3].len(), 320);
//! ```

// Re-export the public API from structarray_core
pub use structarray_core::api::{
    BuildOptions, BuildOptionsOverride, Error, Result, copy_instance, copy_instance_ranges,
    copy_range, new_instance, new_instance_from_builder, new_instance_from_collection,
    new_instance_of, new_instance_of_with, new_instance_with, shallow_copy, shallow_copy_within,
};
pub use structarray_core::{
    Arg, ArgTuple, ArrayBuilder, ConstantFactory, ConstructionContext, Constructor,
    ConstructorSet, CopyFactory, CopyRanges, CtorAndArgs, Element, ElementFactory, ElementIter,
    FieldDesc, IntrinsicSlot, PlacementInfo, Primitive, PrimitiveArray, PrimitiveArrayBuilder,
    PrimitiveArrayType, ShallowCopy, StructuredArray, StructuredArrayType, SubArrayBuilder,
    current_placement, shallow_copy_fields,
};
pub use structarray_core::{copy, engine, factory};

// Re-export the shape descriptions
pub use structarray_model::{
    ArrayModel, NestedModel, ParamType, PrimitiveArrayModel, Signature, TypeDesc,
};
