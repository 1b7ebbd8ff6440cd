//! Primitive arrays: fixed-length, zero-initialised scalar buffers that can
//! stand as the innermost level of a structured array.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec;
use core::fmt;
use core::ops::Index;

use structarray_model::{NestedModel, PrimitiveArrayModel};

use crate::api::error::{Error, Result, check_range};
use crate::builder::{PrimitiveArrayBuilder, SubArrayBuilder};
use crate::constructor::ConstructorSet;
use crate::copy::{self, CopyRanges};
use crate::element::Element;
use crate::engine;

/// Scalar types a [`PrimitiveArray`] can hold.
pub trait Primitive: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Width of one value, in bytes.
    const WIDTH: usize = core::mem::size_of::<Self>();
}

macro_rules! impl_primitive {
    ($($ty:ty),*) => {
        $(impl Primitive for $ty {})*
    };
}

impl_primitive!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

pub struct PrimitiveArray<P> {
    model: PrimitiveArrayModel,
    values: Box<[P]>,
}

static_assertions::assert_impl_all!(PrimitiveArray<f64>: Send, Sync);
static_assertions::const_assert_eq!(<u16 as Primitive>::WIDTH, 2);

impl<P: Primitive> PrimitiveArray<P> {
    pub(crate) fn zeroed(model: PrimitiveArrayModel) -> Self {
        Self {
            model,
            values: vec![P::default(); model.length()].into_boxed_slice(),
        }
    }

    /// Takes the zeroed buffer armed for the primitive array now being
    /// constructed.
    pub fn placement() -> Result<Self> {
        engine::take_placement::<Self>()
    }

    /// A standalone zeroed array of `length` values.
    pub fn new_instance(length: usize) -> Result<Self> {
        PrimitiveArrayBuilder::<Self>::new(length).build()
    }

    pub fn new_instance_from_builder(builder: PrimitiveArrayBuilder<'_, Self>) -> Result<Self> {
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn model(&self) -> &PrimitiveArrayModel {
        &self.model
    }

    pub fn element_width(&self) -> usize {
        P::WIDTH
    }

    pub fn get(&self, index: usize) -> Option<P> {
        self.values.get(index).copied()
    }

    pub fn set(&mut self, index: usize, value: P) -> Result<()> {
        check_range(0, index, 1, self.values.len())?;
        self.values[index] = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[P] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [P] {
        &mut self.values
    }

    /// Overwrites every value with the matching value of `source`.
    pub fn copy_from(&mut self, source: &PrimitiveArray<P>) -> Result<()> {
        if source.len() != self.len() {
            return Err(Error::ModelMismatch(format!(
                "cannot copy {} values into a primitive array of length {}",
                source.len(),
                self.len()
            )));
        }
        self.values.copy_from_slice(&source.values);
        Ok(())
    }
}

impl<P: Primitive> Element for PrimitiveArray<P> {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new()
            .try_default_ctor(Self::placement)
            .try_copy_ctor(|source: &Self| {
                let mut array = Self::placement()?;
                array.copy_from(source)?;
                Ok(array)
            })
    }

    fn copying_sub_builder<'a>(
        sub_model: &NestedModel,
        _ranges: CopyRanges<'_>,
    ) -> Result<SubArrayBuilder<'a, Self>> {
        copy::primitive_sub_builder::<Self>(sub_model)
    }
}

/// A type that is, or wraps, a primitive array.
pub trait PrimitiveArrayType: Element {
    type Item: Primitive;

    fn primitive(&self) -> &PrimitiveArray<Self::Item>;
    fn primitive_mut(&mut self) -> &mut PrimitiveArray<Self::Item>;
}

impl<P: Primitive> PrimitiveArrayType for PrimitiveArray<P> {
    type Item = P;

    fn primitive(&self) -> &PrimitiveArray<P> {
        self
    }

    fn primitive_mut(&mut self) -> &mut PrimitiveArray<P> {
        self
    }
}

impl<P> Index<usize> for PrimitiveArray<P> {
    type Output = P;

    fn index(&self, index: usize) -> &P {
        &self.values[index]
    }
}

impl<P: fmt::Debug> fmt::Debug for PrimitiveArray<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrimitiveArray[{}] ", self.values.len())?;
        f.debug_list().entries(self.values.iter()).finish()
    }
}
