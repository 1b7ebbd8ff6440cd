//! Element factories.
//!
//! The engine asks a factory for one [`CtorAndArgs`] per slot, in index
//! order, and hands each one back through [`ElementFactory::recycle`] once
//! the element exists.

use alloc::vec::{IntoIter, Vec};

use structarray_model::TypeDesc;

use crate::api::error::{Error, Result};
use crate::constructor::{Arg, Constructor, CtorAndArgs};
use crate::context::ConstructionContext;
use crate::element::Element;
use crate::registry;

pub trait ElementFactory<'a, T> {
    /// The constructor and arguments for the slot `context` points at.
    fn produce(&mut self, context: ConstructionContext<'_, 'a>) -> Result<CtorAndArgs<'a, T>>;

    /// Takes back a `CtorAndArgs` after its element was constructed. The
    /// default drops it.
    fn recycle(&mut self, ctor_and_args: CtorAndArgs<'a, T>) {
        drop(ctor_and_args);
    }
}

impl<'a, T, F: ElementFactory<'a, T> + ?Sized> ElementFactory<'a, T> for &mut F {
    fn produce(&mut self, context: ConstructionContext<'_, 'a>) -> Result<CtorAndArgs<'a, T>> {
        (**self).produce(context)
    }

    fn recycle(&mut self, ctor_and_args: CtorAndArgs<'a, T>) {
        (**self).recycle(ctor_and_args)
    }
}

/// Uses the same constructor and arguments for every slot.
#[derive(Clone, Debug)]
pub struct ConstantFactory<'a, T> {
    ctor_and_args: CtorAndArgs<'a, T>,
}

impl<'a, T: 'static> ConstantFactory<'a, T> {
    pub fn new(ctor_and_args: CtorAndArgs<'a, T>) -> Self {
        Self { ctor_and_args }
    }
}

impl<'a, T: 'static> ElementFactory<'a, T> for ConstantFactory<'a, T> {
    fn produce(&mut self, _context: ConstructionContext<'_, 'a>) -> Result<CtorAndArgs<'a, T>> {
        Ok(self.ctor_and_args.clone())
    }
}

/// A factory backed by a closure over the construction context.
#[derive(Clone, Debug)]
pub struct FromFn<F>(F);

/// Builds a factory from a closure, e.g. to vary arguments by slot index:
///
/// ```
/// use structarray_core::{factory, Arg, ConstructorSet, CtorAndArgs, Element};
///
/// struct Id(usize);
///
/// impl Element for Id {
///     fn constructors() -> ConstructorSet<Self> {
///         ConstructorSet::new().ctor(|(n,): (usize,)| Id(n))
///     }
/// }
///
/// let ids = structarray_core::new_instance_with(
///     4,
///     factory::from_fn(|ctx| CtorAndArgs::<Id>::from_args([Arg::value(ctx.index() * 10)])),
/// )
/// .unwrap();
/// assert_eq!(ids[3].0, 30);
/// ```
pub fn from_fn<'a, T, F>(f: F) -> FromFn<F>
where
    F: FnMut(ConstructionContext<'_, 'a>) -> Result<CtorAndArgs<'a, T>>,
{
    FromFn(f)
}

impl<'a, T, F> ElementFactory<'a, T> for FromFn<F>
where
    F: FnMut(ConstructionContext<'_, 'a>) -> Result<CtorAndArgs<'a, T>>,
{
    fn produce(&mut self, context: ConstructionContext<'_, 'a>) -> Result<CtorAndArgs<'a, T>> {
        (self.0)(context)
    }
}

/// Copy-constructs one slot per item of a pre-collected source list.
pub(crate) struct SourceFactory<'a, T> {
    copy_ctor: Constructor<T>,
    sources: IntoIter<&'a T>,
    length: usize,
    spare: Option<CtorAndArgs<'a, T>>,
}

impl<'a, T: Element> SourceFactory<'a, T> {
    pub(crate) fn new(sources: Vec<&'a T>) -> Result<Self> {
        Ok(Self {
            copy_ctor: registry::constructors_of::<T>().copy_constructor()?,
            length: sources.len(),
            sources: sources.into_iter(),
            spare: None,
        })
    }
}

impl<'a, T: Element> ElementFactory<'a, T> for SourceFactory<'a, T> {
    fn produce(&mut self, context: ConstructionContext<'_, 'a>) -> Result<CtorAndArgs<'a, T>> {
        let Some(source) = self.sources.next() else {
            return Err(Error::range(
                context.depth(),
                context.index(),
                1,
                self.length,
            ));
        };
        let mut ctor_and_args = match self.spare.take() {
            Some(mut spare) => {
                spare.set_args([Arg::borrowed(source)])?;
                spare
            }
            None => CtorAndArgs::new(self.copy_ctor.clone(), [Arg::borrowed(source)])?,
        };
        ctor_and_args.set_context_cookie(Some(source));
        Ok(ctor_and_args)
    }

    fn recycle(&mut self, ctor_and_args: CtorAndArgs<'a, T>) {
        self.spare = Some(ctor_and_args);
    }
}

pub(crate) fn default_factory<'a, T: Element>() -> Result<ConstantFactory<'a, T>> {
    let ctor_and_args = CtorAndArgs::<T>::default_ctor()?;
    tracing::trace!(ty = %TypeDesc::of::<T>(), "using default element constructor");
    Ok(ConstantFactory::new(ctor_and_args))
}
