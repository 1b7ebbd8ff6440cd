use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::api::error::{Error, Result};

/// Storage for a level under construction. Every slot is written exactly once.
pub(crate) struct Slots<T> {
    slots: Vec<Option<T>>,
}

impl<T> Slots<T> {
    pub(crate) fn new(length: usize) -> Self {
        let mut slots = Vec::with_capacity(length);
        slots.resize_with(length, || None);
        Self { slots }
    }

    pub(crate) fn install(&mut self, index: usize, value: T) -> Result<()> {
        let length = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::range(0, index, 1, length))?;
        if slot.is_some() {
            return Err(Error::AlreadyInitialized { index });
        }
        *slot = Some(value);
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<Box<[T]>> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(Error::Uninitialized { index }))
            .collect()
    }
}
