//! Construction contexts.
//!
//! While an array is being populated the engine keeps one [`Frame`] per
//! level under construction. Factories see the stack through a
//! [`ConstructionContext`], which exposes the current slot index, the
//! level's cookie and the chain of enclosing levels.

use core::any::Any;
use core::fmt;

use smallvec::SmallVec;
use structarray_model::TypeDesc;

use crate::engine::PlacementInfo;

#[derive(Clone, Copy)]
pub(crate) struct Frame<'a> {
    array_type: TypeDesc,
    length: usize,
    index: usize,
    cookie: Option<&'a (dyn Any + 'static)>,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(
        array_type: TypeDesc,
        length: usize,
        cookie: Option<&'a (dyn Any + 'static)>,
    ) -> Self {
        Self {
            array_type,
            length,
            index: 0,
            cookie,
        }
    }
}

#[derive(Default)]
pub(crate) struct ContextStack<'a> {
    frames: SmallVec<[Frame<'a>; 4]>,
}

impl<'a> ContextStack<'a> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, frame: Frame<'a>) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Points the innermost level at `index`.
    pub(crate) fn set_index(&mut self, index: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.index = index;
        }
    }

    /// The context of the innermost level. Only valid while a level is pushed.
    pub(crate) fn current(&self) -> ConstructionContext<'_, 'a> {
        ConstructionContext {
            frames: &self.frames,
        }
    }

    /// Where an array about to be placed sits: one level below every frame
    /// currently on the stack.
    pub(crate) fn placement_info(&self, array_type: TypeDesc) -> PlacementInfo {
        PlacementInfo::new(
            array_type,
            self.frames.iter().map(|frame| frame.index).collect(),
        )
    }
}

/// A view of the level currently being populated.
#[derive(Clone, Copy)]
pub struct ConstructionContext<'s, 'a> {
    frames: &'s [Frame<'a>],
}

impl<'s, 'a> ConstructionContext<'s, 'a> {
    fn frame(&self) -> Option<&'s Frame<'a>> {
        self.frames.last()
    }

    /// Index of the slot being populated.
    pub fn index(&self) -> usize {
        self.frame().map_or(0, |frame| frame.index)
    }

    pub fn array_type(&self) -> Option<TypeDesc> {
        self.frame().map(|frame| frame.array_type)
    }

    /// Length of the array being populated.
    pub fn length(&self) -> usize {
        self.frame().map_or(0, |frame| frame.length)
    }

    /// Number of enclosing levels: 0 for the outermost array.
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// The context of the array whose element is being populated, if any.
    pub fn containing_context(&self) -> Option<ConstructionContext<'s, 'a>> {
        match self.frames {
            [] | [_] => None,
            [enclosing @ .., _] => Some(ConstructionContext { frames: enclosing }),
        }
    }

    pub fn context_cookie(&self) -> Option<&'a (dyn Any + 'static)> {
        self.frame().and_then(|frame| frame.cookie)
    }

    /// The cookie, if there is one and it is a `C`.
    pub fn cookie<C: Any>(&self) -> Option<&'a C> {
        self.context_cookie()
            .and_then(|cookie| cookie.downcast_ref::<C>())
    }

    /// Slot indices from the outermost level down to this one.
    pub fn index_path(&self) -> SmallVec<[usize; 4]> {
        self.frames.iter().map(|frame| frame.index).collect()
    }
}

impl fmt::Debug for ConstructionContext<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionContext")
            .field("array_type", &self.array_type())
            .field("index_path", &self.index_path())
            .field("length", &self.length())
            .finish()
    }
}
