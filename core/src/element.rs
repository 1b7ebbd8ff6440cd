use alloc::format;

use structarray_model::{NestedModel, TypeDesc};

use crate::api::error::{Error, Result};
use crate::builder::SubArrayBuilder;
use crate::constructor::ConstructorSet;
use crate::copy::CopyRanges;

/// A type that can occupy the slots of a structured array.
///
/// ```
/// use structarray_core::{ConstructorSet, Element};
///
/// #[derive(Clone, Default)]
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// impl Element for Point {
///     fn constructors() -> ConstructorSet<Self> {
///         ConstructorSet::new()
///             .default_ctor(Point::default)
///             .ctor(|(x, y): (i64, i64)| Point { x, y })
///             .copy_ctor(Point::clone)
///     }
/// }
///
/// let points = structarray_core::new_instance::<Point>(3).unwrap();
/// assert_eq!(points.len(), 3);
/// ```
pub trait Element: Sized + 'static {
    /// Every constructor this type offers. Looked up once per thread.
    fn constructors() -> ConstructorSet<Self>;

    /// Builder for a nested level of this type, used when a copy has to
    /// rebuild arrays of this type from `sub_model`.
    ///
    /// Only array types support this. The implementations for
    /// [`StructuredArray`](crate::StructuredArray) and
    /// [`PrimitiveArray`](crate::PrimitiveArray) forward to
    /// [`copy::structured_sub_builder`](crate::copy::structured_sub_builder) and
    /// [`copy::primitive_sub_builder`](crate::copy::primitive_sub_builder); custom
    /// array types do the same.
    fn copying_sub_builder<'a>(
        sub_model: &NestedModel,
        _ranges: CopyRanges<'_>,
    ) -> Result<SubArrayBuilder<'a, Self>> {
        Err(Error::ModelMismatch(format!(
            "{} is not an array type and cannot hold the nested level {}",
            TypeDesc::of::<Self>(),
            sub_model.array_type(),
        )))
    }
}
