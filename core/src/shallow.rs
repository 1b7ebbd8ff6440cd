//! Field-by-field copies between the elements of leaf arrays.

use structarray_model::{ArrayModel, TypeDesc};
use tracing::debug;

use crate::api::error::{Error, Result, check_range};
use crate::array::StructuredArray;
use crate::element::Element;

/// One copyable field of a [`ShallowCopy`] type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDesc {
    pub name: &'static str,
    /// Immutable fields are only overwritten when the caller explicitly
    /// allows it.
    pub immutable: bool,
}

impl FieldDesc {
    pub const fn mutable(name: &'static str) -> Self {
        Self {
            name,
            immutable: false,
        }
    }

    pub const fn immutable(name: &'static str) -> Self {
        Self {
            name,
            immutable: true,
        }
    }
}

/// Element types whose instance fields can be copied one at a time.
///
/// Usually implemented with [`shallow_copy_fields!`](crate::shallow_copy_fields).
pub trait ShallowCopy: Element {
    /// Every instance field, in declaration order.
    const FIELDS: &'static [FieldDesc];

    /// Overwrites field number `field` of `self` with the value in `source`.
    fn copy_field(&mut self, source: &Self, field: usize);
}

/// Implements [`ShallowCopy`] for a struct by cloning the listed fields.
/// Fields marked `#[immutable]` are skipped unless the copy allows
/// overwriting them.
///
/// ```
/// use structarray_core::{shallow_copy_fields, ConstructorSet, Element, ShallowCopy};
///
/// #[derive(Clone, Default)]
/// struct Account {
///     id: u64,
///     balance: i64,
/// }
///
/// impl Element for Account {
///     fn constructors() -> ConstructorSet<Self> {
///         ConstructorSet::new().default_ctor(Account::default)
///     }
/// }
///
/// shallow_copy_fields!(Account { #[immutable] id, balance });
///
/// assert_eq!(Account::FIELDS.len(), 2);
/// assert!(Account::FIELDS[0].immutable);
/// ```
#[macro_export]
macro_rules! shallow_copy_fields {
    ($ty:ty { $( $(#[$marker:ident])? $field:ident ),* $(,)? }) => {
        impl $crate::ShallowCopy for $ty {
            const FIELDS: &'static [$crate::FieldDesc] = &[
                $( $crate::shallow_copy_fields!(@desc $field $($marker)?) ),*
            ];

            fn copy_field(&mut self, source: &Self, field: usize) {
                const COPIERS: &[fn(&mut $ty, &$ty)] = &[
                    $( |dst: &mut $ty, src: &$ty| dst.$field = ::core::clone::Clone::clone(&src.$field) ),*
                ];
                if let Some(copy) = COPIERS.get(field) {
                    copy(self, source);
                }
            }
        }
    };
    (@desc $field:ident immutable) => {
        $crate::FieldDesc::immutable(stringify!($field))
    };
    (@desc $field:ident) => {
        $crate::FieldDesc::mutable(stringify!($field))
    };
}

#[derive(Clone, Copy)]
enum Order {
    Forward,
    Reverse,
}

fn copy_fields<T: ShallowCopy>(dst: &mut T, src: &T, order: Order) {
    match order {
        Order::Forward => (0..T::FIELDS.len()).for_each(|field| dst.copy_field(src, field)),
        Order::Reverse => (0..T::FIELDS.len())
            .rev()
            .for_each(|field| dst.copy_field(src, field)),
    }
}

fn check_copyable<T: ShallowCopy>(model: &ArrayModel, allow_immutable_overwrite: bool) -> Result<()> {
    if !model.is_leaf() {
        return Err(Error::UnsupportedNesting {
            ty: model.array_type(),
        });
    }
    if !allow_immutable_overwrite {
        if let Some(field) = T::FIELDS.iter().find(|field| field.immutable) {
            return Err(Error::ImmutableFieldViolation {
                ty: TypeDesc::of::<T>(),
                field: field.name,
            });
        }
    }
    Ok(())
}

/// Copies the fields of `count` elements of `src`, starting at `src_offset`,
/// onto the elements of `dst` starting at `dst_offset`.
///
/// Both arrays must be leaf arrays. Fails with
/// [`Error::ImmutableFieldViolation`] if `T` has immutable fields and
/// `allow_immutable_overwrite` is false.
pub fn shallow_copy<T: ShallowCopy>(
    src: &StructuredArray<T>,
    src_offset: usize,
    dst: &mut StructuredArray<T>,
    dst_offset: usize,
    count: usize,
    allow_immutable_overwrite: bool,
) -> Result<()> {
    check_copyable::<T>(src.model(), allow_immutable_overwrite)?;
    check_copyable::<T>(dst.model(), allow_immutable_overwrite)?;
    check_range(0, src_offset, count, src.len())?;
    check_range(0, dst_offset, count, dst.len())?;
    debug!(src_offset, dst_offset, count, "shallow copy");

    let sources = &src.as_slice()[src_offset..src_offset + count];
    let targets = &mut dst.elements_mut()[dst_offset..dst_offset + count];
    for (dst, src) in targets.iter_mut().zip(sources) {
        copy_fields(dst, src, Order::Forward);
    }
    Ok(())
}

/// [`shallow_copy`] within a single array. Overlapping ranges behave as if
/// the source range were first copied to a temporary buffer.
pub fn shallow_copy_within<T: ShallowCopy>(
    array: &mut StructuredArray<T>,
    src_offset: usize,
    dst_offset: usize,
    count: usize,
    allow_immutable_overwrite: bool,
) -> Result<()> {
    check_copyable::<T>(array.model(), allow_immutable_overwrite)?;
    check_range(0, src_offset, count, array.len())?;
    check_range(0, dst_offset, count, array.len())?;
    debug!(src_offset, dst_offset, count, "shallow copy within array");

    let elements = array.elements_mut();
    if dst_offset >= src_offset {
        for i in (0..count).rev() {
            copy_between(elements, src_offset + i, dst_offset + i, Order::Reverse);
        }
    } else {
        for i in 0..count {
            copy_between(elements, src_offset + i, dst_offset + i, Order::Forward);
        }
    }
    Ok(())
}

fn copy_between<T: ShallowCopy>(elements: &mut [T], src: usize, dst: usize, order: Order) {
    if src < dst {
        let (head, tail) = elements.split_at_mut(dst);
        copy_fields(&mut tail[0], &head[src], order);
    } else if src > dst {
        let (head, tail) = elements.split_at_mut(src);
        copy_fields(&mut head[dst], &tail[0], order);
    }
}
