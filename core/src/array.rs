//! Structured arrays.
//!
//! A [`StructuredArray<T>`] is a fixed-length container whose slots are
//! populated exactly once, at construction, and never replaced afterwards.
//! Elements themselves may be mutated through shallow copies, but the
//! array never hands out a slot for reassignment.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;
use core::ops::Index;

use structarray_model::{ArrayModel, NestedModel, TypeDesc};

use crate::api::error::{Result, check_range};
use crate::builder::SubArrayBuilder;
use crate::constructor::ConstructorSet;
use crate::copy::{self, CopyRanges};
use crate::element::Element;
use crate::engine;

pub struct StructuredArray<T> {
    model: Arc<ArrayModel>,
    elements: Box<[T]>,
}

static_assertions::assert_impl_all!(StructuredArray<u64>: Send, Sync);
static_assertions::assert_not_impl_any!(StructuredArray<alloc::rc::Rc<u64>>: Send, Sync);

impl<T> StructuredArray<T> {
    pub(crate) fn from_parts(model: Arc<ArrayModel>, elements: Box<[T]>) -> Self {
        Self { model, elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The model this array was built from, shared with every array built
    /// from the same builder.
    pub fn model(&self) -> &Arc<ArrayModel> {
        &self.model
    }

    pub fn element_type(&self) -> TypeDesc {
        self.model.element_type()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn iter(&self) -> ElementIter<'_, T> {
        ElementIter::new(self, 0, self.len())
    }

    /// Iterates `count` elements starting at `offset`.
    pub fn iter_range(&self, offset: usize, count: usize) -> Result<ElementIter<'_, T>> {
        check_range(0, offset, count, self.len())?;
        Ok(ElementIter::new(self, offset, offset + count))
    }

    /// Whether `element` is one of this array's own slots. Compares
    /// identity, not value.
    pub fn contains_element(&self, element: &T) -> bool {
        self.elements
            .iter()
            .any(|slot| core::ptr::eq(slot, element))
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [T] {
        &mut self.elements
    }
}

impl<T: Element> StructuredArray<T> {
    /// Takes the storage the engine populated for the array now being
    /// constructed. Array type constructors call this exactly once; anywhere
    /// else it fails with
    /// [`Error::IllegalDirectConstruction`](crate::Error::IllegalDirectConstruction).
    pub fn placement() -> Result<Self> {
        engine::take_placement::<Self>()
    }
}

impl<T: Element> Element for StructuredArray<T> {
    fn constructors() -> ConstructorSet<Self> {
        ConstructorSet::new()
            .try_default_ctor(Self::placement)
            .try_copy_ctor(|_source: &Self| Self::placement())
    }

    fn copying_sub_builder<'a>(
        sub_model: &NestedModel,
        ranges: CopyRanges<'_>,
    ) -> Result<SubArrayBuilder<'a, Self>> {
        copy::structured_sub_builder::<Self>(sub_model, ranges)
    }
}

/// A type that is, or wraps, a structured array.
///
/// Custom array types hold a [`StructuredArray`] obtained from
/// [`StructuredArray::placement`] inside each of their constructors.
pub trait StructuredArrayType: Element {
    type Elem: Element;

    fn structured(&self) -> &StructuredArray<Self::Elem>;
    fn structured_mut(&mut self) -> &mut StructuredArray<Self::Elem>;
}

impl<T: Element> StructuredArrayType for StructuredArray<T> {
    type Elem = T;

    fn structured(&self) -> &StructuredArray<T> {
        self
    }

    fn structured_mut(&mut self) -> &mut StructuredArray<T> {
        self
    }
}

impl<T> Index<usize> for StructuredArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.elements[index]
    }
}

impl<'s, T> IntoIterator for &'s StructuredArray<T> {
    type Item = &'s T;
    type IntoIter = ElementIter<'s, T>;

    fn into_iter(self) -> ElementIter<'s, T> {
        ElementIter::new(self, 0, self.len())
    }
}

impl<T: fmt::Debug> fmt::Debug for StructuredArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructuredArray{} ", self.model)?;
        f.debug_list().entries(self.elements.iter()).finish()
    }
}

/// Iterator over a range of a structured array's elements.
///
/// Unlike a slice iterator it remembers where it started, so it can be
/// rewound with [`reset`](Self::reset).
#[derive(Clone)]
pub struct ElementIter<'s, T> {
    elements: &'s [T],
    start: usize,
    cursor: usize,
    end: usize,
}

impl<'s, T> ElementIter<'s, T> {
    fn new(array: &'s StructuredArray<T>, start: usize, end: usize) -> Self {
        Self {
            elements: &array.elements,
            start,
            cursor: start,
            end,
        }
    }

    /// Index of the element the next call to `next` returns.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rewinds to the start of the range.
    pub fn reset(&mut self) {
        self.cursor = self.start;
    }
}

impl<'s, T> Iterator for ElementIter<'s, T> {
    type Item = &'s T;

    fn next(&mut self) -> Option<&'s T> {
        if self.cursor >= self.end {
            return None;
        }
        let element = self.elements.get(self.cursor)?;
        self.cursor += 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.cursor;
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for ElementIter<'_, T> {}
