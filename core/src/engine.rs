//! The construction engine.
//!
//! Building a level happens in two steps. First every slot is populated, in
//! index order, into fresh storage. Then the storage is armed on a
//! thread-local placement stack and the array type's constructor runs; the
//! constructor takes the storage with [`StructuredArray::placement`] or
//! [`PrimitiveArray::placement`]. Outside of this window placement fails
//! with [`Error::IllegalDirectConstruction`], so user code cannot conjure an
//! array that skipped population.
//!
//! The placement stack is strictly per thread. Constructors that build other
//! arrays push their own entries on top and pop them before returning.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use std::cell::RefCell;

use smallvec::SmallVec;
use structarray_model::{ArrayModel, PrimitiveArrayModel, TypeDesc};
use tracing::{debug, trace};

use crate::api::error::{Error, Result};
use crate::array::{StructuredArray, StructuredArrayType};
use crate::builder::ArrayBuilder;
use crate::constructor::CtorAndArgs;
use crate::context::{ContextStack, Frame};
use crate::primitive::{PrimitiveArray, PrimitiveArrayType};
use crate::slots::Slots;

/// Where the array currently awaiting placement sits in its construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementInfo {
    array_type: TypeDesc,
    index_path: SmallVec<[usize; 4]>,
}

impl PlacementInfo {
    pub(crate) fn new(array_type: TypeDesc, index_path: SmallVec<[usize; 4]>) -> Self {
        Self {
            array_type,
            index_path,
        }
    }

    /// The array type whose constructor is running.
    pub fn array_type(&self) -> TypeDesc {
        self.array_type
    }

    /// Number of enclosing arrays: 0 for a top-level construction.
    pub fn depth(&self) -> usize {
        self.index_path.len()
    }

    /// Slot indices of the enclosing arrays, outermost first.
    pub fn index_path(&self) -> &[usize] {
        &self.index_path
    }
}

struct Armed {
    /// Type of the storage being placed.
    storage_type: TypeDesc,
    storage: Option<Box<dyn Any>>,
    info: PlacementInfo,
}

thread_local! {
    static ARMED: RefCell<Vec<Armed>> = const { RefCell::new(Vec::new()) };
}

/// Pops the entry pushed by [`with_placement`], even if the constructor panics.
struct ArmGuard {
    height: usize,
}

impl Drop for ArmGuard {
    fn drop(&mut self) {
        let _ = ARMED.try_with(|armed| armed.borrow_mut().truncate(self.height));
    }
}

/// Arms `storage` for placement and runs `construct`.
fn with_placement<P: Any, R>(
    storage: P,
    info: PlacementInfo,
    construct: impl FnOnce() -> Result<R>,
) -> Result<R> {
    let storage_type = TypeDesc::of::<P>();
    let array_type = info.array_type;
    let height = ARMED.with(|armed| {
        let mut armed = armed.borrow_mut();
        armed.push(Armed {
            storage_type,
            storage: Some(Box::new(storage)),
            info,
        });
        armed.len() - 1
    });
    let guard = ArmGuard { height };

    let result = construct();
    let consumed = ARMED.with(|armed| {
        armed
            .borrow()
            .get(height)
            .is_none_or(|entry| entry.storage.is_none())
    });
    drop(guard);

    let value = result?;
    if !consumed {
        return Err(Error::PlacementSkipped { ty: array_type });
    }
    Ok(value)
}

/// Takes the storage armed for the running array constructor.
pub(crate) fn take_placement<P: Any>() -> Result<P> {
    let requested = TypeDesc::of::<P>();
    ARMED.with(|armed| {
        let mut armed = armed.borrow_mut();
        let Some(entry) = armed.last_mut().filter(|entry| entry.storage.is_some()) else {
            return Err(Error::IllegalDirectConstruction { ty: requested });
        };
        if entry.storage_type != requested {
            return Err(Error::ElementTypeMismatch {
                expected: entry.storage_type,
                found: requested,
            });
        }
        let storage = entry
            .storage
            .take()
            .and_then(|storage| storage.downcast::<P>().ok());
        match storage {
            Some(storage) => {
                trace!(ty = %entry.info.array_type, "placement taken");
                Ok(*storage)
            }
            None => Err(Error::IllegalDirectConstruction { ty: requested }),
        }
    })
}

/// The construction waiting for placement on this thread, if any.
///
/// Array type constructors can call this to learn where in a nested
/// construction they are being built.
pub fn current_placement() -> Option<PlacementInfo> {
    ARMED.with(|armed| {
        armed
            .borrow()
            .last()
            .filter(|entry| entry.storage.is_some())
            .map(|entry| entry.info.clone())
    })
}

/// Whether an array constructor is currently running on this thread.
pub fn is_constructing() -> bool {
    current_placement().is_some()
}

/// Resolves `builder` and builds the top-level array.
pub(crate) fn instantiate<'a, S: StructuredArrayType>(mut builder: ArrayBuilder<'a, S>) -> Result<S> {
    let model = builder.resolve()?.clone();
    debug!(model = %model, ty = %model.array_type(), "instantiating structured array");
    let ctor_and_args = builder.take_array_ctor_and_args()?;
    let cookie = builder.cookie();
    let mut stack = ContextStack::new();
    build_level(&mut builder, &mut stack, &ctor_and_args, cookie)
}

/// Builds one structured array at the position `stack` points at.
pub(crate) fn build_level<'a, S: StructuredArrayType>(
    builder: &mut ArrayBuilder<'a, S>,
    stack: &mut ContextStack<'a>,
    ctor_and_args: &CtorAndArgs<'a, S>,
    cookie: Option<&'a (dyn Any + 'static)>,
) -> Result<S> {
    let model = builder.resolved_model()?.clone();
    let info = stack.placement_info(model.array_type());

    stack.push(Frame::new(model.array_type(), model.length(), cookie));
    let populated = populate(builder, &model, stack);
    stack.pop();

    let storage = populated?;
    with_placement(storage, info, || ctor_and_args.invoke())
}

fn populate<'a, S: StructuredArrayType>(
    builder: &mut ArrayBuilder<'a, S>,
    model: &Arc<ArrayModel>,
    stack: &mut ContextStack<'a>,
) -> Result<StructuredArray<S::Elem>> {
    let (factory, mut nested) = builder.population_parts()?;
    let mut slots = Slots::new(model.length());

    for index in 0..model.length() {
        stack.set_index(index);
        let ctor_and_args = factory.produce(stack.current())?;
        let declared = ctor_and_args.constructor().declaring_type();
        if declared != model.element_type() {
            return Err(Error::ElementTypeMismatch {
                expected: model.element_type(),
                found: declared,
            });
        }

        let element = match nested.as_deref_mut() {
            None => ctor_and_args.invoke()?,
            Some(sub) => sub.construct(stack, &ctor_and_args)?,
        };
        slots.install(index, element)?;
        trace!(index, depth = stack.depth(), "slot populated");
        factory.recycle(ctor_and_args);
    }

    Ok(StructuredArray::from_parts(model.clone(), slots.finish()?))
}

/// Builds one primitive array at the position `stack` points at.
pub(crate) fn place_primitive<'a, A: PrimitiveArrayType>(
    model: PrimitiveArrayModel,
    stack: &ContextStack<'a>,
    ctor_and_args: &CtorAndArgs<'a, A>,
) -> Result<A> {
    let storage = PrimitiveArray::<A::Item>::zeroed(model);
    with_placement(storage, stack.placement_info(model.array_type()), || {
        ctor_and_args.invoke()
    })
}
