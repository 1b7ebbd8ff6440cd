//! The array model tree.
//!
//! An [`ArrayModel`] describes one level of a structured array: which array
//! type holds the elements, which element type occupies the slots, how many
//! slots there are, and (optionally) what every element looks like when the
//! elements are arrays themselves. Models are built bottom-up and never
//! change afterwards; every array instance built from a model shares it.

use alloc::sync::Arc;
use core::fmt;

use crate::TypeDesc;

/// Shape of a fixed-width scalar buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveArrayModel {
    array_type: TypeDesc,
    element_type: TypeDesc,
    element_width: usize,
    length: usize,
}

impl PrimitiveArrayModel {
    pub fn new(
        array_type: TypeDesc,
        element_type: TypeDesc,
        element_width: usize,
        length: usize,
    ) -> Self {
        Self {
            array_type,
            element_type,
            element_width,
            length,
        }
    }

    pub fn array_type(&self) -> TypeDesc {
        self.array_type
    }

    pub fn element_type(&self) -> TypeDesc {
        self.element_type
    }

    /// Width of one scalar, in bytes.
    pub fn element_width(&self) -> usize {
        self.element_width
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Total payload size in bytes, or `None` if it does not fit in a `usize`.
    pub fn byte_len(&self) -> Option<usize> {
        self.element_width.checked_mul(self.length)
    }
}

/// What every element of a nesting array looks like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NestedModel {
    Structured(Arc<ArrayModel>),
    Primitive(PrimitiveArrayModel),
}

impl NestedModel {
    /// The array type of the nested level, which is the element type of the
    /// level that contains it.
    pub fn array_type(&self) -> TypeDesc {
        match self {
            NestedModel::Structured(model) => model.array_type(),
            NestedModel::Primitive(model) => model.array_type(),
        }
    }

    pub fn length(&self) -> usize {
        match self {
            NestedModel::Structured(model) => model.length(),
            NestedModel::Primitive(model) => model.length(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayModel {
    array_type: TypeDesc,
    element_type: TypeDesc,
    length: usize,
    sub_model: Option<NestedModel>,
}

impl ArrayModel {
    /// A single-level array whose elements are plain objects.
    pub fn leaf(array_type: TypeDesc, element_type: TypeDesc, length: usize) -> Self {
        Self {
            array_type,
            element_type,
            length,
            sub_model: None,
        }
    }

    /// An array whose elements are arrays described by `sub_model`.
    ///
    /// The element type is taken from the sub-model, so the parent/child
    /// consistency invariant holds by construction.
    pub fn nested(array_type: TypeDesc, sub_model: NestedModel, length: usize) -> Self {
        Self {
            array_type,
            element_type: sub_model.array_type(),
            length,
            sub_model: Some(sub_model),
        }
    }

    pub fn array_type(&self) -> TypeDesc {
        self.array_type
    }

    pub fn element_type(&self) -> TypeDesc {
        self.element_type
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn sub_model(&self) -> Option<&NestedModel> {
        self.sub_model.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.sub_model.is_none()
    }

    pub fn structured_sub_model(&self) -> Option<&Arc<ArrayModel>> {
        match &self.sub_model {
            Some(NestedModel::Structured(model)) => Some(model),
            _ => None,
        }
    }

    pub fn primitive_sub_model(&self) -> Option<&PrimitiveArrayModel> {
        match &self.sub_model {
            Some(NestedModel::Primitive(model)) => Some(model),
            _ => None,
        }
    }

    /// Number of structured levels, this one included. Primitive buffers at
    /// the bottom do not count: a plain leaf array has depth 1, and so does an
    /// array of primitive buffers.
    pub fn nesting_depth(&self) -> usize {
        let mut depth = 1;
        let mut model = self;
        while let Some(sub) = model.structured_sub_model() {
            depth += 1;
            model = sub;
        }
        depth
    }

    /// Number of leaf slots (objects or scalars) across the whole tree, or
    /// `None` if the count overflows a `usize`.
    ///
    /// Resolving a model allocates nothing, so a valid model can describe
    /// more slots than could ever be built.
    pub fn total_leaf_count(&self) -> Option<usize> {
        match &self.sub_model {
            None => Some(self.length),
            Some(NestedModel::Structured(sub)) => self.length.checked_mul(sub.total_leaf_count()?),
            Some(NestedModel::Primitive(sub)) => self.length.checked_mul(sub.length()),
        }
    }

    /// Iterates this model and every structured model below it, outermost first.
    pub fn levels(&self) -> Levels<'_> {
        Levels { next: Some(self) }
    }
}

pub struct Levels<'m> {
    next: Option<&'m ArrayModel>,
}

impl<'m> Iterator for Levels<'m> {
    type Item = &'m ArrayModel;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.structured_sub_model().map(|sub| &**sub);
        Some(current)
    }
}

/// Renders the shape as C-style extents followed by the leaf type, e.g.
/// `[4][5]Point` or `[3][16]u8`.
impl fmt::Display for ArrayModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut model = self;
        loop {
            write!(f, "[{}]", model.length)?;
            match &model.sub_model {
                None => return write!(f, "{}", model.element_type),
                Some(NestedModel::Primitive(sub)) => {
                    return write!(f, "[{}]{}", sub.length(), sub.element_type());
                }
                Some(NestedModel::Structured(sub)) => model = sub,
            }
        }
    }
}
