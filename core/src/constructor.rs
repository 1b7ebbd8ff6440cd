//! Runtime constructors.
//!
//! A [`Constructor`] is a callable that produces one value of its declaring
//! type from a list of type-erased [`Arg`]s, tagged with the [`Signature`] it
//! accepts. Element types publish their constructors as a [`ConstructorSet`]
//! (see [`Element::constructors`]); factories pair a constructor with concrete
//! arguments in a [`CtorAndArgs`].

use alloc::rc::Rc;
use core::any::Any;
use core::fmt;

use smallvec::SmallVec;
use structarray_model::{ParamType, Signature, TypeDesc};

use crate::api::error::{Error, Result};
use crate::element::Element;
use crate::registry;

/// One constructor argument.
#[derive(Clone)]
pub enum Arg<'a> {
    /// An owned value, shared between every construction that reuses it.
    Value { ty: TypeDesc, value: Rc<dyn Any> },
    /// A borrowed source value, typically the element being copied.
    Ref {
        ty: TypeDesc,
        value: &'a (dyn Any + 'static),
    },
}

impl<'a> Arg<'a> {
    pub fn value<A: Any>(value: A) -> Self {
        Arg::Value {
            ty: TypeDesc::of::<A>(),
            value: Rc::new(value),
        }
    }

    pub fn borrowed<A: Any>(value: &'a A) -> Self {
        Arg::Ref {
            ty: TypeDesc::of::<A>(),
            value,
        }
    }

    pub fn param_type(&self) -> ParamType {
        match self {
            Arg::Value { ty, .. } => ParamType::Value(*ty),
            Arg::Ref { ty, .. } => ParamType::Ref(*ty),
        }
    }

    /// The owned value, if this is a by-value argument of type `A`.
    pub fn downcast_value<A: Any>(&self) -> Option<&A> {
        match self {
            Arg::Value { value, .. } => value.downcast_ref(),
            Arg::Ref { .. } => None,
        }
    }

    /// The borrowed value, if this is a by-reference argument of type `A`.
    pub fn downcast_ref<A: Any>(&self) -> Option<&'a A> {
        match *self {
            Arg::Ref { value, .. } => value.downcast_ref(),
            Arg::Value { .. } => None,
        }
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Arg({})", self.param_type())
    }
}

pub(crate) fn signature_of(args: &[Arg<'_>]) -> Signature {
    args.iter().map(Arg::param_type).collect()
}

/// Tuples of owned argument values a constructor can be declared over.
pub trait ArgTuple: Sized + 'static {
    fn signature() -> Signature;
    fn from_args(args: &[Arg<'_>]) -> Option<Self>;
}

impl ArgTuple for () {
    fn signature() -> Signature {
        Signature::empty()
    }

    fn from_args(args: &[Arg<'_>]) -> Option<Self> {
        args.is_empty().then_some(())
    }
}

macro_rules! impl_arg_tuple {
    ($($ty:ident $var:ident),+) => {
        impl<$($ty: Any + Clone),+> ArgTuple for ($($ty,)+) {
            fn signature() -> Signature {
                [$(ParamType::value_of::<$ty>()),+].into_iter().collect()
            }

            fn from_args(args: &[Arg<'_>]) -> Option<Self> {
                let [$($var),+] = args else {
                    return None;
                };
                Some(($($var.downcast_value::<$ty>()?.clone(),)+))
            }
        }
    };
}

impl_arg_tuple!(A a);
impl_arg_tuple!(A a, B b);
impl_arg_tuple!(A a, B b, C c);
impl_arg_tuple!(A a, B b, C c, D d);

type Invoke<T> = dyn Fn(&[Arg<'_>]) -> Result<T>;

/// A constructor producing `T`.
///
/// The declaring type is normally `T` itself. [`Constructor::converting`]
/// produces constructors declared by another type, which arrays refuse to
/// use for their slots.
pub struct Constructor<T> {
    declaring_type: TypeDesc,
    signature: Signature,
    invoke: Rc<Invoke<T>>,
}

impl<T> Clone for Constructor<T> {
    fn clone(&self) -> Self {
        Self {
            declaring_type: self.declaring_type,
            signature: self.signature.clone(),
            invoke: self.invoke.clone(),
        }
    }
}

impl<T: 'static> Constructor<T> {
    pub fn new<A: ArgTuple>(f: impl Fn(A) -> T + 'static) -> Self {
        Self::fallible(move |args: A| Ok(f(args)))
    }

    pub fn fallible<A: ArgTuple>(f: impl Fn(A) -> Result<T> + 'static) -> Self {
        Self {
            declaring_type: TypeDesc::of::<T>(),
            signature: A::signature(),
            invoke: Rc::new(move |args: &[Arg<'_>]| match A::from_args(args) {
                Some(args) => f(args),
                None => Err(no_constructor::<T>(args)),
            }),
        }
    }

    /// A copy constructor: takes `&T` and returns a new `T`.
    pub fn copy(f: impl Fn(&T) -> T + 'static) -> Self {
        Self::fallible_copy(move |source: &T| Ok(f(source)))
    }

    pub fn fallible_copy(f: impl Fn(&T) -> Result<T> + 'static) -> Self {
        Self {
            declaring_type: TypeDesc::of::<T>(),
            signature: Signature::copy_of(TypeDesc::of::<T>()),
            invoke: Rc::new(move |args: &[Arg<'_>]| {
                let source = match args {
                    [arg] => arg.downcast_ref::<T>(),
                    _ => None,
                };
                match source {
                    Some(source) => f(source),
                    None => Err(no_constructor::<T>(args)),
                }
            }),
        }
    }

    /// Wraps a constructor of `U` so that it yields `T`, keeping `U` as the
    /// declaring type.
    pub fn converting<U: Into<T> + 'static>(ctor: Constructor<U>) -> Self {
        let inner = ctor.invoke;
        Self {
            declaring_type: ctor.declaring_type,
            signature: ctor.signature,
            invoke: Rc::new(move |args: &[Arg<'_>]| inner(args).map(Into::into)),
        }
    }

    pub fn declaring_type(&self) -> TypeDesc {
        self.declaring_type
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_copy(&self) -> bool {
        self.signature.is_copy_of(self.declaring_type)
    }

    /// Whether `args` match this constructor's signature.
    pub fn accepts(&self, args: &[Arg<'_>]) -> bool {
        args.len() == self.signature.arity()
            && args
                .iter()
                .zip(self.signature.params())
                .all(|(arg, param)| arg.param_type() == *param)
    }

    pub fn invoke(&self, args: &[Arg<'_>]) -> Result<T> {
        (self.invoke)(args)
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.declaring_type, self.signature)
    }
}

fn no_constructor<T: 'static>(args: &[Arg<'_>]) -> Error {
    Error::NoConstructorFound {
        ty: TypeDesc::of::<T>(),
        signature: signature_of(args),
    }
}

/// The constructors an element type offers, at most one per signature.
pub struct ConstructorSet<T> {
    constructors: SmallVec<[Constructor<T>; 4]>,
}

impl<T: 'static> Default for ConstructorSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ConstructorSet<T> {
    pub fn new() -> Self {
        Self {
            constructors: SmallVec::new(),
        }
    }

    /// Adds `ctor`, replacing any constructor with the same signature.
    pub fn with(mut self, ctor: Constructor<T>) -> Self {
        self.constructors
            .retain(|existing| existing.signature != ctor.signature);
        self.constructors.push(ctor);
        self
    }

    pub fn default_ctor(self, f: impl Fn() -> T + 'static) -> Self {
        self.with(Constructor::new(move |(): ()| f()))
    }

    pub fn try_default_ctor(self, f: impl Fn() -> Result<T> + 'static) -> Self {
        self.with(Constructor::fallible(move |(): ()| f()))
    }

    pub fn ctor<A: ArgTuple>(self, f: impl Fn(A) -> T + 'static) -> Self {
        self.with(Constructor::new(f))
    }

    pub fn try_ctor<A: ArgTuple>(self, f: impl Fn(A) -> Result<T> + 'static) -> Self {
        self.with(Constructor::fallible(f))
    }

    pub fn copy_ctor(self, f: impl Fn(&T) -> T + 'static) -> Self {
        self.with(Constructor::copy(f))
    }

    pub fn try_copy_ctor(self, f: impl Fn(&T) -> Result<T> + 'static) -> Self {
        self.with(Constructor::fallible_copy(f))
    }

    pub fn find(&self, signature: &Signature) -> Result<Constructor<T>> {
        self.constructors
            .iter()
            .find(|ctor| ctor.signature == *signature)
            .cloned()
            .ok_or_else(|| Error::NoConstructorFound {
                ty: TypeDesc::of::<T>(),
                signature: signature.clone(),
            })
    }

    pub fn default_constructor(&self) -> Result<Constructor<T>> {
        self.find(&Signature::empty())
    }

    pub fn copy_constructor(&self) -> Result<Constructor<T>> {
        self.find(&Signature::copy_of(TypeDesc::of::<T>()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constructor<T>> {
        self.constructors.iter()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

/// A constructor together with the arguments to call it with.
///
/// The optional context cookie is opaque to the engine. It is handed to the
/// construction contexts of any nested level the constructed element heads,
/// which is how copy factories find their source.
pub struct CtorAndArgs<'a, T> {
    constructor: Constructor<T>,
    args: SmallVec<[Arg<'a>; 2]>,
    context_cookie: Option<&'a (dyn Any + 'static)>,
}

impl<T> Clone for CtorAndArgs<'_, T> {
    fn clone(&self) -> Self {
        Self {
            constructor: self.constructor.clone(),
            args: self.args.clone(),
            context_cookie: self.context_cookie,
        }
    }
}

impl<'a, T: 'static> CtorAndArgs<'a, T> {
    /// Pairs `constructor` with `args`, failing with
    /// [`Error::NoConstructorFound`] if they don't match its signature.
    pub fn new(
        constructor: Constructor<T>,
        args: impl IntoIterator<Item = Arg<'a>>,
    ) -> Result<Self> {
        let mut ctor_and_args = Self {
            constructor,
            args: SmallVec::new(),
            context_cookie: None,
        };
        ctor_and_args.set_args(args)?;
        Ok(ctor_and_args)
    }

    pub fn constructor(&self) -> &Constructor<T> {
        &self.constructor
    }

    pub fn args(&self) -> &[Arg<'a>] {
        &self.args
    }

    /// Replaces the arguments, keeping constructor and cookie. Factories that
    /// recycle their `CtorAndArgs` use this between slots.
    pub fn set_args(&mut self, args: impl IntoIterator<Item = Arg<'a>>) -> Result<()> {
        self.args.clear();
        self.args.extend(args);
        if self.constructor.accepts(&self.args) {
            Ok(())
        } else {
            Err(Error::NoConstructorFound {
                ty: self.constructor.declaring_type(),
                signature: signature_of(&self.args),
            })
        }
    }

    pub fn context_cookie(&self) -> Option<&'a (dyn Any + 'static)> {
        self.context_cookie
    }

    pub fn set_context_cookie(&mut self, cookie: Option<&'a (dyn Any + 'static)>) {
        self.context_cookie = cookie;
    }

    pub fn with_context_cookie(mut self, cookie: &'a (dyn Any + 'static)) -> Self {
        self.context_cookie = Some(cookie);
        self
    }

    pub fn invoke(&self) -> Result<T> {
        self.constructor.invoke(&self.args)
    }
}

impl<'a, T: Element> CtorAndArgs<'a, T> {
    /// `T`'s no-argument constructor.
    pub fn default_ctor() -> Result<Self> {
        Self::new(
            registry::constructors_of::<T>().default_constructor()?,
            core::iter::empty(),
        )
    }

    /// Looks up `T`'s constructor matching the argument types.
    pub fn from_args(args: impl IntoIterator<Item = Arg<'a>>) -> Result<Self> {
        let args: SmallVec<[Arg<'a>; 2]> = args.into_iter().collect();
        let ctor = registry::constructors_of::<T>().find(&signature_of(&args))?;
        Self::new(ctor, args)
    }

    /// `T`'s copy constructor applied to `source`.
    pub fn copy_of(source: &'a T) -> Result<Self> {
        Self::new(
            registry::constructors_of::<T>().copy_constructor()?,
            [Arg::borrowed(source)],
        )
    }
}

impl<T> fmt::Debug for CtorAndArgs<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CtorAndArgs")
            .field("constructor", &self.constructor)
            .field("args", &self.args)
            .field("has_cookie", &self.context_cookie.is_some())
            .finish()
    }
}
