use core::fmt;

use smallvec::SmallVec;

use crate::TypeDesc;

/// One constructor parameter: an owned value or a borrow of a source value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    Value(TypeDesc),
    Ref(TypeDesc),
}

impl ParamType {
    pub fn value_of<T: 'static>() -> Self {
        ParamType::Value(TypeDesc::of::<T>())
    }

    pub fn ref_of<T: 'static>() -> Self {
        ParamType::Ref(TypeDesc::of::<T>())
    }

    pub fn type_desc(&self) -> TypeDesc {
        match self {
            ParamType::Value(ty) | ParamType::Ref(ty) => *ty,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Value(ty) => write!(f, "{ty}"),
            ParamType::Ref(ty) => write!(f, "&{ty}"),
        }
    }
}

/// Ordered parameter list of a constructor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature(SmallVec<[ParamType; 3]>);

impl Signature {
    /// The no-argument signature.
    pub const fn empty() -> Self {
        Signature(SmallVec::new_const())
    }

    /// `(&T)`: the signature every copy constructor of `T` has.
    pub fn copy_of(ty: TypeDesc) -> Self {
        let mut params = SmallVec::new();
        params.push(ParamType::Ref(ty));
        Signature(params)
    }

    pub fn params(&self) -> &[ParamType] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this is the copy-constructor signature for `ty`.
    pub fn is_copy_of(&self, ty: TypeDesc) -> bool {
        matches!(self.params(), [ParamType::Ref(p)] if *p == ty)
    }
}

impl FromIterator<ParamType> for Signature {
    fn from_iter<I: IntoIterator<Item = ParamType>>(iter: I) -> Self {
        Signature(iter.into_iter().collect())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}
