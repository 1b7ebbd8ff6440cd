//! Tests for shallow copies between leaf arrays

use pretty_assertions::assert_eq;

use crate::api::error::Error;
use crate::{
    Arg, ArrayBuilder, ConstructorSet, CtorAndArgs, Element, ShallowCopy, StructuredArray,
    factory, new_instance, new_instance_with, shallow_copy, shallow_copy_fields,
    shallow_copy_within,
};

#[derive(Clone, Debug, Default, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

impl Element for Point {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new()
            .default_ctor(Point::default)
            .ctor(|(x, y): (i64, i64)| Point { x, y })
            .copy_ctor(Point::clone)
    }
}

shallow_copy_fields!(Point { x, y });

#[derive(Clone, Debug, Default, PartialEq)]
struct Account {
    id: u64,
    balance: i64,
}

impl Element for Account {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new().ctor(|(id, balance): (u64, i64)| Account { id, balance })
    }
}

shallow_copy_fields!(Account { #[immutable] id, balance });

fn numbered(length: usize) -> StructuredArray<Point> {
    new_instance_with(
        length,
        factory::from_fn(|ctx| {
            let i = ctx.index() as i64;
            CtorAndArgs::<Point>::from_args([Arg::value(i), Arg::value(i * 100)])
        }),
    )
    .unwrap()
}

fn xs(points: &StructuredArray<Point>) -> Vec<i64> {
    points.iter().map(|p| p.x).collect()
}

fn accounts(length: usize) -> StructuredArray<Account> {
    new_instance_with(
        length,
        factory::from_fn(|ctx| {
            CtorAndArgs::<Account>::from_args([
                Arg::value(ctx.index() as u64),
                Arg::value(ctx.index() as i64 * 10),
            ])
        }),
    )
    .unwrap()
}

#[test]
fn test_field_descriptors() {
    assert_eq!(Point::FIELDS.len(), 2);
    assert_eq!(Point::FIELDS[1].name, "y");
    assert!(!Point::FIELDS[0].immutable);
    assert!(Account::FIELDS[0].immutable);
}

#[test]
fn test_copy_between_arrays() {
    let src = numbered(5);
    let mut dst = new_instance::<Point>(5).unwrap();

    shallow_copy(&src, 1, &mut dst, 2, 3, false).unwrap();

    assert_eq!(xs(&dst), [0, 0, 1, 2, 3]);
    assert_eq!(dst[4], Point { x: 3, y: 300 });
}

#[test]
fn test_overlapping_forward_copy_matches_buffered_copy() {
    let mut points = numbered(8);
    let mut expected = xs(&points);
    expected.copy_within(1..6, 3);

    shallow_copy_within(&mut points, 1, 3, 5, false).unwrap();

    assert_eq!(xs(&points), expected);
}

#[test]
fn test_shift_up_by_one_matches_buffered_copy() {
    let mut points = numbered(6);
    let mut expected = xs(&points);
    expected.copy_within(0..5, 1);

    shallow_copy_within(&mut points, 0, 1, 5, false).unwrap();

    assert_eq!(xs(&points), expected);
    assert_eq!(xs(&points), [0, 0, 1, 2, 3, 4]);
    assert_eq!(points[5], Point { x: 4, y: 400 });
}

#[test]
fn test_overlapping_backward_copy_matches_buffered_copy() {
    let mut points = numbered(8);
    let mut expected = xs(&points);
    expected.copy_within(3..8, 0);

    shallow_copy_within(&mut points, 3, 0, 5, false).unwrap();

    assert_eq!(xs(&points), expected);
}

#[test]
fn test_copy_onto_itself_is_a_no_op() {
    let mut points = numbered(4);

    shallow_copy_within(&mut points, 0, 0, 4, false).unwrap();

    assert_eq!(xs(&points), [0, 1, 2, 3]);
}

#[test]
fn test_ranges_are_checked() {
    let src = numbered(4);
    let mut dst = numbered(4);

    assert!(matches!(
        shallow_copy(&src, 2, &mut dst, 0, 3, false),
        Err(Error::RangeExceeded { offset: 2, count: 3, length: 4, .. })
    ));
    assert!(matches!(
        shallow_copy_within(&mut dst, 0, 2, 3, false),
        Err(Error::RangeExceeded { .. })
    ));
    assert_eq!(xs(&dst), [0, 1, 2, 3]);
}

#[test]
fn test_immutable_fields_need_permission() {
    let src = accounts(3);
    let mut dst = accounts(3);

    let err = shallow_copy(&src, 0, &mut dst, 1, 2, false).unwrap_err();
    assert!(matches!(
        err,
        Error::ImmutableFieldViolation { field: "id", .. }
    ));
    assert_eq!(dst[1].id, 1);

    shallow_copy(&src, 0, &mut dst, 1, 2, true).unwrap();
    assert_eq!(dst[1], Account { id: 0, balance: 0 });
    assert_eq!(dst[2], Account { id: 1, balance: 10 });
}

#[test]
fn test_nested_arrays_are_rejected() {
    struct Row {
        points: StructuredArray<Point>,
    }

    impl Element for Row {
        fn constructors() -> ConstructorSet<Self> {
            ConstructorSet::new().try_default_ctor(|| {
                Ok(Row {
                    points: StructuredArray::placement()?,
                })
            })
        }
    }

    impl crate::StructuredArrayType for Row {
        type Elem = Point;

        fn structured(&self) -> &StructuredArray<Point> {
            &self.points
        }

        fn structured_mut(&mut self) -> &mut StructuredArray<Point> {
            &mut self.points
        }
    }

    impl ShallowCopy for Row {
        const FIELDS: &'static [crate::FieldDesc] = &[];

        fn copy_field(&mut self, _source: &Self, _field: usize) {}
    }

    let mut grid = ArrayBuilder::<StructuredArray<Row>>::new(2)
        .sub_array_builder(ArrayBuilder::new(2))
        .build()
        .unwrap();

    assert!(matches!(
        shallow_copy_within(&mut grid, 0, 1, 1, false),
        Err(Error::UnsupportedNesting { .. })
    ));
}
