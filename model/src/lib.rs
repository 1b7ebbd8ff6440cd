//! Shape descriptions for structured arrays.
//!
//! This crate holds the purely descriptive half of structarray: runtime type
//! tokens, constructor signatures and the array model tree. Nothing in here
//! can build a value; builders and the construction engine live in
//! `structarray-core` and only read these descriptions.
//!
//! # Example
//!
//! ```
//! use structarray_model::{ArrayModel, NestedModel, PrimitiveArrayModel, TypeDesc};
//!
//! struct Row;
//! struct Grid;
//!
//! let cells = PrimitiveArrayModel::new(TypeDesc::of::<Row>(), TypeDesc::of::<i64>(), 8, 16);
//! let grid = ArrayModel::nested(TypeDesc::of::<Grid>(), NestedModel::Primitive(cells), 4);
//!
//! assert_eq!(grid.length(), 4);
//! assert_eq!(grid.element_type(), TypeDesc::of::<Row>());
//! assert_eq!(grid.total_leaf_count(), Some(64));
//! assert_eq!(grid.to_string(), "[4][16]i64");
//! ```

#![no_std]
extern crate alloc;

mod array_model;
mod signature;
mod type_desc;

pub use array_model::{ArrayModel, Levels, NestedModel, PrimitiveArrayModel};
pub use signature::{ParamType, Signature};
pub use type_desc::TypeDesc;
