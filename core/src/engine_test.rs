//! Tests for the construction engine and placement

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Barrier, LazyLock};
use std::thread;

use pretty_assertions::assert_eq;

use crate::api::error::Error;
use crate::engine::{current_placement, is_constructing};
use crate::test_utils::init_test_logging;
use crate::{
    Arg, ArrayBuilder, Constructor, ConstructorSet, CtorAndArgs, Element, PrimitiveArray,
    StructuredArray, StructuredArrayType, TypeDesc, factory, new_instance, new_instance_of,
    new_instance_with,
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

/// Array type that remembers where it was placed.
struct Tagged {
    path: Vec<usize>,
    points: StructuredArray<Point>,
}

impl Element for Tagged {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new().try_default_ctor(|| {
            let path = current_placement()
                .map(|info| info.index_path().to_vec())
                .unwrap_or_default();
            Ok(Tagged {
                path,
                points: StructuredArray::placement()?,
            })
        })
    }
}

impl StructuredArrayType for Tagged {
    type Elem = Point;

    fn structured(&self) -> &StructuredArray<Point> {
        &self.points
    }

    fn structured_mut(&mut self) -> &mut StructuredArray<Point> {
        &mut self.points
    }
}

/// Array type whose constructor builds a fresh array instead of taking its placement.
#[derive(Debug)]
struct Sneaky {
    points: StructuredArray<Point>,
}

impl Element for Sneaky {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new().try_default_ctor(|| {
            Ok(Sneaky {
                points: new_instance(1)?,
            })
        })
    }
}

impl StructuredArrayType for Sneaky {
    type Elem = Point;

    fn structured(&self) -> &StructuredArray<Point> {
        &self.points
    }

    fn structured_mut(&mut self) -> &mut StructuredArray<Point> {
        &mut self.points
    }
}

/// Array type whose constructor asks for the wrong kind of placement.
#[derive(Debug)]
struct Confused {
    points: StructuredArray<Point>,
}

impl Element for Confused {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new().try_default_ctor(|| {
            PrimitiveArray::<u8>::placement()?;
            Ok(Confused {
                points: StructuredArray::placement()?,
            })
        })
    }
}

impl StructuredArrayType for Confused {
    type Elem = Point;

    fn structured(&self) -> &StructuredArray<Point> {
        &self.points
    }

    fn structured_mut(&mut self) -> &mut StructuredArray<Point> {
        &mut self.points
    }
}

/// Array type whose constructor panics while its storage is armed.
struct Explosive {
    points: StructuredArray<Point>,
}

impl Element for Explosive {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new().try_default_ctor(|| {
            assert!(is_constructing());
            panic!("explosive array constructor");
        })
    }
}

impl StructuredArrayType for Explosive {
    type Elem = Point;

    fn structured(&self) -> &StructuredArray<Point> {
        &self.points
    }

    fn structured_mut(&mut self) -> &mut StructuredArray<Point> {
        &mut self.points
    }
}

static GATE: LazyLock<Barrier> = LazyLock::new(|| Barrier::new(2));

/// Array type whose constructor waits for another thread while armed.
struct Gated {
    before: Option<crate::PlacementInfo>,
    after: Option<crate::PlacementInfo>,
    points: StructuredArray<Point>,
}

impl Element for Gated {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new().try_default_ctor(|| {
            let before = current_placement();
            GATE.wait();
            let after = current_placement();
            Ok(Gated {
                before,
                after,
                points: StructuredArray::placement()?,
            })
        })
    }
}

impl StructuredArrayType for Gated {
    type Elem = Point;

    fn structured(&self) -> &StructuredArray<Point> {
        &self.points
    }

    fn structured_mut(&mut self) -> &mut StructuredArray<Point> {
        &mut self.points
    }
}

#[test]
fn test_slots_are_distinct_and_populated() {
    init_test_logging();

    let points = new_instance::<Point>(5).unwrap();

    assert_eq!(points.len(), 5);
    for (i, a) in points.iter().enumerate() {
        assert_eq!(a, &Point::default());
        for b in points.iter().skip(i + 1) {
            assert!(!std::ptr::eq(a, b));
        }
    }
}

#[test]
fn test_empty_array() {
    let points = new_instance::<Point>(0).unwrap();

    assert!(points.is_empty());
    assert_eq!(points.model().length(), 0);
    assert_eq!(points.iter().count(), 0);
}

#[test]
fn test_factory_sees_indices_in_order() {
    let mut seen = Vec::new();
    let points = new_instance_with(
        4,
        factory::from_fn(|ctx| {
            seen.push(ctx.index());
            let i = ctx.index() as i64;
            CtorAndArgs::<Point>::from_args([Arg::value(i), Arg::value(-i)])
        }),
    )
    .unwrap();

    assert_eq!(seen, [0, 1, 2, 3]);
    assert_eq!(points[3], Point { x: 3, y: -3 });
}

#[test]
fn test_nested_factory_sees_enclosing_context() {
    let mut seen = Vec::new();
    let inner = ArrayBuilder::<StructuredArray<Point>>::new(3).element_factory(factory::from_fn(
        |ctx| {
            let outer = ctx.containing_context().map(|outer| outer.index());
            seen.push((outer, ctx.index(), ctx.depth()));
            CtorAndArgs::<Point>::default_ctor()
        },
    ));
    let grid = ArrayBuilder::<StructuredArray<StructuredArray<Point>>>::new(2)
        .sub_array_builder(inner)
        .build()
        .unwrap();

    assert_eq!(grid.len(), 2);
    assert_eq!(
        seen,
        [
            (Some(0), 0, 1),
            (Some(0), 1, 1),
            (Some(0), 2, 1),
            (Some(1), 0, 1),
            (Some(1), 1, 1),
            (Some(1), 2, 1),
        ]
    );
}

#[test]
fn test_nested_arrays_share_their_model() {
    let grid = ArrayBuilder::<StructuredArray<StructuredArray<Point>>>::new(4)
        .sub_array_builder(ArrayBuilder::new(5))
        .build()
        .unwrap();

    let sub_model = grid.model().structured_sub_model().unwrap();
    for row in &grid {
        assert!(std::sync::Arc::ptr_eq(row.model(), sub_model));
        assert_eq!(row.len(), 5);
    }
}

#[test]
fn test_placement_outside_construction() {
    assert!(!is_constructing());
    assert!(matches!(
        StructuredArray::<Point>::placement(),
        Err(Error::IllegalDirectConstruction { .. })
    ));

    let ctor = StructuredArray::<Point>::constructors()
        .default_constructor()
        .unwrap();
    assert!(matches!(
        ctor.invoke(&[]),
        Err(Error::IllegalDirectConstruction { .. })
    ));
}

#[test]
fn test_placement_info_tracks_nesting() {
    let top = new_instance_of::<Tagged>(3).unwrap();
    assert!(top.path.is_empty());
    assert_eq!(top.points.len(), 3);

    let grid = ArrayBuilder::<StructuredArray<Tagged>>::new(3)
        .sub_array_builder(ArrayBuilder::new(2))
        .build()
        .unwrap();
    let paths: Vec<Vec<usize>> = grid.iter().map(|tagged| tagged.path.clone()).collect();
    assert_eq!(paths, [vec![0], vec![1], vec![2]]);
    assert!(current_placement().is_none());
}

#[test]
fn test_constructor_must_take_its_placement() {
    let err = new_instance_of::<Sneaky>(2).unwrap_err();

    match err {
        Error::PlacementSkipped { ty } => assert_eq!(ty, TypeDesc::of::<Sneaky>()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!is_constructing());
}

#[test]
fn test_wrong_placement_kind() {
    let err = new_instance_of::<Confused>(2).unwrap_err();

    match err {
        Error::ElementTypeMismatch { expected, found } => {
            assert_eq!(expected, TypeDesc::of::<StructuredArray<Point>>());
            assert_eq!(found, TypeDesc::of::<PrimitiveArray<u8>>());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_converting_constructor_is_rejected_for_slots() {
    struct Origin;
    impl From<Origin> for Point {
        fn from(_: Origin) -> Self {
            Point::default()
        }
    }
    impl Element for Origin {
        fn constructors() -> ConstructorSet<Self> {
            ConstructorSet::new().default_ctor(|| Origin)
        }
    }

    let converting = Constructor::<Point>::converting(
        Origin::constructors().default_constructor().unwrap(),
    );
    let err = new_instance_with(
        2,
        factory::ConstantFactory::new(CtorAndArgs::new(converting, std::iter::empty()).unwrap()),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::ElementTypeMismatch { expected, found }
            if expected == TypeDesc::of::<Point>() && found == TypeDesc::of::<Origin>()
    ));
}

#[test]
fn test_factory_failure_aborts_construction() {
    let result = new_instance_with(
        5,
        factory::from_fn(|ctx| {
            if ctx.index() == 2 {
                Err(Error::constructor::<Point>("third slot refused"))
            } else {
                CtorAndArgs::<Point>::default_ctor()
            }
        }),
    );

    assert!(matches!(result, Err(Error::Constructor { .. })));
    assert!(current_placement().is_none());
}

#[test]
fn test_primitive_array_standalone() {
    let mut bytes = PrimitiveArray::<u32>::new_instance(4).unwrap();

    assert_eq!(bytes.as_slice(), &[0, 0, 0, 0]);
    assert_eq!(bytes.element_width(), 4);
    bytes.set(1, 7).unwrap();
    assert_eq!(bytes.get(1), Some(7));
    assert!(matches!(bytes.set(4, 1), Err(Error::RangeExceeded { .. })));
}

#[test]
fn test_panicking_array_constructor_disarms() {
    let result = catch_unwind(AssertUnwindSafe(|| new_instance_of::<Explosive>(3)));
    assert!(result.is_err());

    assert!(!is_constructing());
    assert!(current_placement().is_none());
    assert!(matches!(
        StructuredArray::<Point>::placement(),
        Err(Error::IllegalDirectConstruction { .. })
    ));

    let points = new_instance::<Point>(2).unwrap();
    assert_eq!(points.len(), 2);
}

#[test]
fn test_nested_panic_disarms_every_level() {
    let result = catch_unwind(AssertUnwindSafe(|| {
        ArrayBuilder::<StructuredArray<Explosive>>::new(2)
            .sub_array_builder(ArrayBuilder::new(2))
            .build()
    }));
    assert!(result.is_err());

    assert!(!is_constructing());
    let grid = ArrayBuilder::<StructuredArray<StructuredArray<Point>>>::new(2)
        .sub_array_builder(ArrayBuilder::new(2))
        .build()
        .unwrap();
    assert_eq!(grid[1].len(), 2);
}

#[test]
fn test_placement_state_is_per_thread() {
    fn build(base: i64) -> StructuredArray<Gated> {
        let rows = ArrayBuilder::<Gated>::new(4).element_factory(factory::from_fn(move |ctx| {
            thread::yield_now();
            let row = ctx.containing_context().map_or(0, |outer| outer.index()) as i64;
            let x = base + row * 10 + ctx.index() as i64;
            CtorAndArgs::<Point>::from_args([Arg::value(x), Arg::value(base)])
        }));
        ArrayBuilder::<StructuredArray<Gated>>::new(3)
            .sub_array_builder(rows)
            .build()
            .unwrap()
    }

    let (first, second) = thread::scope(|s| {
        let first = s.spawn(|| build(1000));
        let second = s.spawn(|| build(2000));
        (first.join().unwrap(), second.join().unwrap())
    });

    for (grid, base) in [(&first, 1000), (&second, 2000)] {
        assert_eq!(grid.len(), 3);
        for (row, gated) in grid.iter().enumerate() {
            let expected_path = [row];
            for placement in [&gated.before, &gated.after] {
                let placement = placement.as_ref().unwrap();
                assert_eq!(placement.array_type(), TypeDesc::of::<Gated>());
                assert_eq!(placement.index_path(), &expected_path);
            }
            let xs: Vec<i64> = gated.points.iter().map(|p| p.x).collect();
            let row = row as i64;
            assert_eq!(xs, [0, 1, 2, 3].map(|i| base + row * 10 + i));
            assert!(gated.points.iter().all(|p| p.y == base));
        }
    }
    assert!(!is_constructing());
}
