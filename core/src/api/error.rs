//! Public error type for structured array construction and copying.
//!
//! Every fallible operation in this crate returns [`Error`]. Errors raised
//! while populating a slot abort the whole construction; nothing partially
//! built escapes to the caller.

use alloc::string::String;

use structarray_model::{Signature, TypeDesc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No registered constructor of `ty` takes `signature`.
    #[error("{ty} has no constructor taking {signature}")]
    NoConstructorFound { ty: TypeDesc, signature: Signature },

    /// A slot constructor (or a placement) belongs to a different type than
    /// the one the model expects.
    #[error("expected a constructor of {expected}, found one declared by {found}")]
    ElementTypeMismatch { expected: TypeDesc, found: TypeDesc },

    /// Inconsistent builder or model configuration.
    #[error("model mismatch: {0}")]
    ModelMismatch(String),

    #[error("range {offset}..{offset}+{count} exceeds length {length} at nesting depth {depth}")]
    RangeExceeded {
        depth: usize,
        offset: usize,
        count: usize,
        length: usize,
    },

    /// More copy ranges than the source has structured levels.
    #[error("{requested} copy ranges given, but the source only nests {depth} levels deep")]
    DepthExceeded { requested: usize, depth: usize },

    #[error("{offsets} source offsets given for {counts} counts")]
    MismatchedRanges { offsets: usize, counts: usize },

    #[error("slot {index} is already initialized")]
    AlreadyInitialized { index: usize },

    /// A slot was left empty after population finished.
    #[error("slot {index} was never initialized")]
    Uninitialized { index: usize },

    /// An array placement was requested outside of a construction.
    #[error("{ty} cannot be constructed directly, build it through new_instance or a builder")]
    IllegalDirectConstruction { ty: TypeDesc },

    /// An array type's constructor returned without taking its placement.
    #[error("constructor of {ty} returned without taking its placement")]
    PlacementSkipped { ty: TypeDesc },

    #[error("cannot shallow copy into immutable field `{field}` of {ty}")]
    ImmutableFieldViolation { ty: TypeDesc, field: &'static str },

    #[error("shallow copy needs leaf arrays, but {ty} nests arrays")]
    UnsupportedNesting { ty: TypeDesc },

    #[error("nesting depth {depth} exceeds the configured maximum of {max}")]
    NestingTooDeep { depth: usize, max: usize },

    /// A user constructor failed for its own reasons.
    #[error("constructor of {ty} failed: {message}")]
    Constructor { ty: TypeDesc, message: String },
}

impl Error {
    /// Wraps a failure raised by user construction code.
    pub fn constructor<T: 'static>(message: impl Into<String>) -> Self {
        Error::Constructor {
            ty: TypeDesc::of::<T>(),
            message: message.into(),
        }
    }

    pub(crate) fn range(depth: usize, offset: usize, count: usize, length: usize) -> Self {
        Error::RangeExceeded {
            depth,
            offset,
            count,
            length,
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Fails with [`Error::RangeExceeded`] unless `offset..offset + count` fits in `length`.
pub(crate) fn check_range(depth: usize, offset: usize, count: usize, length: usize) -> Result<()> {
    match offset.checked_add(count) {
        Some(end) if end <= length => Ok(()),
        _ => Err(Error::range(depth, offset, count, length)),
    }
}
