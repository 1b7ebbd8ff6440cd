//! Deep copies.
//!
//! Copying an array never copies storage directly. Instead a builder is
//! derived from the source's model, with a [`CopyFactory`] at every
//! structured level that feeds each slot its source element through the
//! element type's copy constructor. Nested levels find their source through
//! the context cookie: each copied element is the cookie of the level it
//! heads.

use alloc::format;
use alloc::vec::Vec;
use core::marker::PhantomData;

use structarray_model::{ArrayModel, NestedModel, TypeDesc};
use tracing::debug;

use crate::api::error::{Error, Result, check_range};
use crate::array::StructuredArrayType;
use crate::builder::{ArrayBuilder, PrimitiveArrayBuilder, SubArrayBuilder};
use crate::constructor::{Arg, Constructor, CtorAndArgs};
use crate::context::ConstructionContext;
use crate::element::Element;
use crate::engine;
use crate::factory::{ElementFactory, SourceFactory};
use crate::primitive::PrimitiveArrayType;
use crate::registry;

/// Per-level source offsets and counts, outermost level first. Levels past
/// the end of the lists are copied whole.
#[derive(Clone, Copy, Debug, Default)]
pub struct CopyRanges<'r> {
    offsets: &'r [usize],
    counts: &'r [usize],
    depth: usize,
}

impl<'r> CopyRanges<'r> {
    pub fn new(offsets: &'r [usize], counts: &'r [usize]) -> Result<Self> {
        if offsets.len() != counts.len() {
            return Err(Error::MismatchedRanges {
                offsets: offsets.len(),
                counts: counts.len(),
            });
        }
        Ok(Self {
            offsets,
            counts,
            depth: 0,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Source offset at the current level.
    pub fn offset(&self) -> usize {
        self.offsets.get(self.depth).copied().unwrap_or(0)
    }

    /// Number of elements to copy at the current level, whose source has
    /// `length` elements.
    pub fn count(&self, length: usize) -> usize {
        self.counts.get(self.depth).copied().unwrap_or(length)
    }

    /// The ranges as seen from one level further down.
    pub fn descend(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    /// Checks every range against `model`'s levels.
    fn validate(&self, model: &ArrayModel) -> Result<()> {
        let mut levels = model.levels();
        for (depth, (&offset, &count)) in self.offsets.iter().zip(self.counts).enumerate() {
            let Some(level) = levels.next() else {
                return Err(Error::DepthExceeded {
                    requested: self.counts.len(),
                    depth: model.nesting_depth(),
                });
            };
            check_range(depth, offset, count, level.length())?;
        }
        Ok(())
    }
}

/// Feeds every slot of a level the matching element of the source array
/// found in the context cookie, starting at a fixed source offset.
pub struct CopyFactory<'a, S: StructuredArrayType> {
    offset: usize,
    copy_ctor: Constructor<S::Elem>,
    spare: Option<CtorAndArgs<'a, S::Elem>>,
    _source: PhantomData<fn() -> S>,
}

impl<'a, S: StructuredArrayType> CopyFactory<'a, S> {
    /// Fails with [`Error::NoConstructorFound`] if the element type has no
    /// copy constructor.
    pub fn new(offset: usize) -> Result<Self> {
        Ok(Self {
            offset,
            copy_ctor: registry::constructors_of::<S::Elem>().copy_constructor()?,
            spare: None,
            _source: PhantomData,
        })
    }
}

impl<'a, S: StructuredArrayType> ElementFactory<'a, S::Elem> for CopyFactory<'a, S> {
    fn produce(&mut self, context: ConstructionContext<'_, 'a>) -> Result<CtorAndArgs<'a, S::Elem>> {
        let source = context.cookie::<S>().ok_or_else(|| {
            Error::ModelMismatch(format!(
                "copy of {} found no source in its construction context",
                TypeDesc::of::<S>()
            ))
        })?;
        let source = source.structured();
        let element = source.get(self.offset + context.index()).ok_or_else(|| {
            Error::range(
                context.depth(),
                self.offset,
                context.index() + 1,
                source.len(),
            )
        })?;

        let mut ctor_and_args = match self.spare.take() {
            Some(mut spare) => {
                spare.set_args([Arg::borrowed(element)])?;
                spare
            }
            None => CtorAndArgs::new(self.copy_ctor.clone(), [Arg::borrowed(element)])?,
        };
        ctor_and_args.set_context_cookie(Some(element));
        Ok(ctor_and_args)
    }

    fn recycle(&mut self, ctor_and_args: CtorAndArgs<'a, S::Elem>) {
        self.spare = Some(ctor_and_args);
    }
}

/// A resolved builder that copies the part of a level described by `model`
/// and `ranges`.
pub fn copying_builder<'a, S: StructuredArrayType>(
    model: &ArrayModel,
    ranges: CopyRanges<'_>,
) -> Result<ArrayBuilder<'a, S>> {
    let offset = ranges.offset();
    let count = ranges.count(model.length());
    check_range(ranges.depth(), offset, count, model.length())?;

    let mut builder = ArrayBuilder::<S>::new(count).element_factory(CopyFactory::<S>::new(offset)?);
    if let Some(sub_model) = model.sub_model() {
        builder = builder.nested(<S::Elem as Element>::copying_sub_builder(
            sub_model,
            ranges.descend(),
        )?);
    }
    builder.resolve()?;
    Ok(builder)
}

/// [`Element::copying_sub_builder`] for structured array types.
pub fn structured_sub_builder<'a, S: StructuredArrayType>(
    sub_model: &NestedModel,
    ranges: CopyRanges<'_>,
) -> Result<SubArrayBuilder<'a, S>> {
    match sub_model {
        NestedModel::Structured(model) => Ok(copying_builder::<S>(model, ranges)?.into()),
        NestedModel::Primitive(model) => Err(Error::ModelMismatch(format!(
            "{} is a structured array type, but the source nests primitive arrays {}",
            TypeDesc::of::<S>(),
            model.array_type()
        ))),
    }
}

/// [`Element::copying_sub_builder`] for primitive array types. Primitive
/// levels are always copied whole.
pub fn primitive_sub_builder<'a, A: PrimitiveArrayType>(
    sub_model: &NestedModel,
) -> Result<SubArrayBuilder<'a, A>> {
    match sub_model {
        NestedModel::Primitive(model) => {
            let mut builder = PrimitiveArrayBuilder::<A>::new(model.length());
            builder.resolve()?;
            Ok(builder.into())
        }
        NestedModel::Structured(model) => Err(Error::ModelMismatch(format!(
            "{} is a primitive array type, but the source nests {}",
            TypeDesc::of::<A>(),
            model.array_type()
        ))),
    }
}

/// Copies `source` and every array nested in it.
pub fn copy_instance<S: StructuredArrayType>(source: &S) -> Result<S> {
    copy_instance_ranges(source, &[], &[])
}

/// Copies `count` top-level elements of `source`, starting at `offset`.
/// Nested levels are copied whole.
pub fn copy_range<S: StructuredArrayType>(source: &S, offset: usize, count: usize) -> Result<S> {
    copy_instance_ranges(source, &[offset], &[count])
}

/// Copies a sub-range at each of the outermost `offsets.len()` levels of
/// `source`; deeper levels are copied whole.
///
/// Fails with [`Error::MismatchedRanges`] if the two lists differ in length,
/// [`Error::DepthExceeded`] if they are longer than the source is deep and
/// [`Error::RangeExceeded`] if a range doesn't fit its level.
pub fn copy_instance_ranges<S: StructuredArrayType>(
    source: &S,
    offsets: &[usize],
    counts: &[usize],
) -> Result<S> {
    let ranges = CopyRanges::new(offsets, counts)?;
    let model = source.structured().model();
    ranges.validate(model)?;
    debug!(model = %model, ?offsets, ?counts, "copying structured array");

    let builder = copying_builder::<S>(model, ranges)?
        .array_ctor_and_args(CtorAndArgs::copy_of(source)?)
        .context_cookie(source);
    engine::instantiate(builder)
}

/// A new array holding copies of `items`, in iteration order.
pub fn new_instance_from_collection<'a, S: StructuredArrayType>(
    items: impl IntoIterator<Item = &'a S::Elem>,
) -> Result<S> {
    let items: Vec<&'a S::Elem> = items.into_iter().collect();
    let builder = ArrayBuilder::<S>::new(items.len()).element_factory(SourceFactory::new(items)?);
    engine::instantiate(builder)
}
