//! Tests for builder resolution

use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::api::error::Error;
use crate::{
    ArrayBuilder, ArrayModel, BuildOptions, BuildOptionsOverride, ConstructorSet, Element,
    PrimitiveArray, PrimitiveArrayBuilder, PrimitiveArrayType, StructuredArray,
    StructuredArrayType, TypeDesc,
};

#[derive(Clone, Default)]
struct Cell;

impl Element for Cell {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new()
            .default_ctor(Cell::default)
            .copy_ctor(Cell::clone)
    }
}

type Row = StructuredArray<Cell>;
type Grid = StructuredArray<Row>;

#[test]
fn test_resolve_leaf() {
    let mut builder = ArrayBuilder::<Row>::new(6);
    let model = builder.resolve().unwrap().clone();

    assert_eq!(model.length(), 6);
    assert_eq!(model.array_type(), TypeDesc::of::<Row>());
    assert_eq!(model.element_type(), TypeDesc::of::<Cell>());
    assert!(model.is_leaf());
}

#[test]
fn test_resolve_is_idempotent() {
    let mut builder = ArrayBuilder::<Grid>::new(2).sub_array_builder(ArrayBuilder::new(3));
    assert!(!builder.is_resolved());

    let first = builder.resolve().unwrap().clone();
    let second = builder.resolve().unwrap().clone();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.to_string(), "[2][3]Cell");
}

#[test]
fn test_resolve_fills_nested_models() {
    let mut builder = ArrayBuilder::<Grid>::new(4).sub_array_builder(ArrayBuilder::new(5));
    let model = builder.resolve().unwrap();

    let sub = model.structured_sub_model().unwrap();
    assert_eq!(sub.array_type(), model.element_type());
    assert_eq!(sub.length(), 5);
    assert_eq!(model.total_leaf_count(), Some(20));
}

#[test]
fn test_resolve_huge_shape_without_allocating() {
    let mut builder =
        ArrayBuilder::<Grid>::new(usize::MAX / 2).sub_array_builder(ArrayBuilder::new(4));
    let model = builder.resolve().unwrap();

    assert_eq!(model.length(), usize::MAX / 2);
    assert_eq!(model.total_leaf_count(), None);
}

#[test]
fn test_declared_model_must_match() {
    let declared = Arc::new(ArrayModel::leaf(
        TypeDesc::of::<Grid>(),
        TypeDesc::of::<Row>(),
        3,
    ));

    // Without a nested builder the resolved model is the declared one.
    let mut builder = ArrayBuilder::<Grid>::from_model(declared.clone());
    assert!(Arc::ptr_eq(builder.resolve().unwrap(), &declared));

    // A nested builder makes the resolved model differ from the declared one.
    let mut builder =
        ArrayBuilder::<Grid>::from_model(declared).sub_array_builder(ArrayBuilder::new(2));
    assert!(matches!(builder.resolve(), Err(Error::ModelMismatch(_))));
}

#[test]
fn test_nesting_limit() {
    let options = BuildOptions::default().override_with(&BuildOptionsOverride {
        max_nesting_depth: Some(1),
    });
    assert_eq!(options.max_nesting_depth, 1);

    let mut builder = ArrayBuilder::<Grid>::new(2)
        .options(options)
        .sub_array_builder(ArrayBuilder::new(2));

    assert!(matches!(
        builder.resolve(),
        Err(Error::NestingTooDeep { depth: 2, max: 1 })
    ));
}

#[test]
fn test_default_options() {
    let options = BuildOptions::default();
    assert_eq!(options.override_with(&BuildOptionsOverride::default()), options);
    assert_eq!(options.max_nesting_depth, 64);
}

#[test]
fn test_primitive_sub_builder() {
    let mut builder = ArrayBuilder::<StructuredArray<PrimitiveArray<u16>>>::new(3)
        .primitive_sub_array_builder(PrimitiveArrayBuilder::new(8));
    let model = builder.resolve().unwrap();

    let cells = model.primitive_sub_model().unwrap();
    assert_eq!(cells.element_width(), 2);
    assert_eq!(cells.byte_len(), Some(16));
    assert_eq!(model.nesting_depth(), 1);
}

/// An element type that can be either kind of nested array.
struct Hybrid {
    cells: StructuredArray<Cell>,
    bytes: PrimitiveArray<u8>,
}

impl Element for Hybrid {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new()
    }
}

impl StructuredArrayType for Hybrid {
    type Elem = Cell;

    fn structured(&self) -> &StructuredArray<Cell> {
        &self.cells
    }

    fn structured_mut(&mut self) -> &mut StructuredArray<Cell> {
        &mut self.cells
    }
}

impl PrimitiveArrayType for Hybrid {
    type Item = u8;

    fn primitive(&self) -> &PrimitiveArray<u8> {
        &self.bytes
    }

    fn primitive_mut(&mut self) -> &mut PrimitiveArray<u8> {
        &mut self.bytes
    }
}

#[test]
fn test_both_sub_builders_are_rejected() {
    let mut builder = ArrayBuilder::<StructuredArray<Hybrid>>::new(2)
        .sub_array_builder(ArrayBuilder::new(2))
        .primitive_sub_array_builder(PrimitiveArrayBuilder::new(2));

    assert!(matches!(builder.resolve(), Err(Error::ModelMismatch(_))));
}

#[test]
fn test_resolve_requires_default_constructors() {
    // Hybrid has no default constructor, and no factory was given.
    let mut builder = ArrayBuilder::<StructuredArray<Hybrid>>::new(2);
    assert!(matches!(
        builder.resolve(),
        Err(Error::NoConstructorFound { .. })
    ));
}
