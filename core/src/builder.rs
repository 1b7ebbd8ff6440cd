//! Array builders.
//!
//! An [`ArrayBuilder`] collects everything needed to instantiate one
//! structured array type: the length, the array's own constructor, the
//! element factory and, for arrays of arrays, a builder for the nested
//! level. Resolving a builder fills in defaults and produces the
//! [`ArrayModel`] every instance built from it shares.

use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use structarray_model::{ArrayModel, NestedModel, PrimitiveArrayModel, TypeDesc};

use crate::api::error::{Error, Result};
use crate::api::options::BuildOptions;
use crate::array::StructuredArrayType;
use crate::constructor::CtorAndArgs;
use crate::context::ContextStack;
use crate::engine;
use crate::factory::{self, ElementFactory};
use crate::primitive::{Primitive, PrimitiveArrayType};

pub struct ArrayBuilder<'a, S: StructuredArrayType> {
    length: usize,
    options: BuildOptions,
    declared_model: Option<Arc<ArrayModel>>,
    array_ctor_and_args: Option<CtorAndArgs<'a, S>>,
    element_factory: Option<Box<dyn ElementFactory<'a, S::Elem> + 'a>>,
    structured_sub: Option<SubArrayBuilder<'a, S::Elem>>,
    primitive_sub: Option<SubArrayBuilder<'a, S::Elem>>,
    context_cookie: Option<&'a (dyn Any + 'static)>,
    model: Option<Arc<ArrayModel>>,
}

impl<'a, S: StructuredArrayType> ArrayBuilder<'a, S> {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            options: BuildOptions::default(),
            declared_model: None,
            array_ctor_and_args: None,
            element_factory: None,
            structured_sub: None,
            primitive_sub: None,
            context_cookie: None,
            model: None,
        }
    }

    /// A builder that must resolve to exactly `model`.
    ///
    /// The length comes from the model; nested levels still need their own
    /// builders and are checked against the model on resolution.
    pub fn from_model(model: Arc<ArrayModel>) -> Self {
        let mut builder = Self::new(model.length());
        builder.declared_model = Some(model);
        builder
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Constructor and arguments for the array object itself. Defaults to
    /// the array type's no-argument constructor.
    pub fn array_ctor_and_args(mut self, ctor_and_args: CtorAndArgs<'a, S>) -> Self {
        self.array_ctor_and_args = Some(ctor_and_args);
        self
    }

    /// Factory producing the element constructors. Defaults to the element
    /// type's no-argument constructor for every slot.
    pub fn element_factory(mut self, factory: impl ElementFactory<'a, S::Elem> + 'a) -> Self {
        self.element_factory = Some(Box::new(factory));
        self
    }

    /// Opaque value visible to the element factory through
    /// [`ConstructionContext::context_cookie`](crate::ConstructionContext::context_cookie).
    pub fn context_cookie(mut self, cookie: &'a (dyn Any + 'static)) -> Self {
        self.context_cookie = Some(cookie);
        self
    }

    /// Builder for every element, when the elements are structured arrays.
    pub fn sub_array_builder(mut self, builder: ArrayBuilder<'a, S::Elem>) -> Self
    where
        S::Elem: StructuredArrayType,
    {
        self.structured_sub = Some(builder.into());
        self
    }

    /// Builder for every element, when the elements are primitive arrays.
    pub fn primitive_sub_array_builder(mut self, builder: PrimitiveArrayBuilder<'a, S::Elem>) -> Self
    where
        S::Elem: PrimitiveArrayType,
    {
        self.primitive_sub = Some(builder.into());
        self
    }

    pub(crate) fn nested(mut self, builder: SubArrayBuilder<'a, S::Elem>) -> Self {
        if builder.is_primitive() {
            self.primitive_sub = Some(builder);
        } else {
            self.structured_sub = Some(builder);
        }
        self
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn is_resolved(&self) -> bool {
        self.model.is_some()
    }

    /// The resolved model, once [`resolve`](Self::resolve) has succeeded.
    pub fn model(&self) -> Option<&Arc<ArrayModel>> {
        self.model.as_ref()
    }

    /// Fills in default constructors, resolves nested builders and computes
    /// the model. Calling it again returns the same model.
    pub fn resolve(&mut self) -> Result<&Arc<ArrayModel>> {
        if self.model.is_none() {
            let model = self.resolve_model()?;
            self.model = Some(model);
        }
        self.resolved_model()
    }

    pub(crate) fn resolved_model(&self) -> Result<&Arc<ArrayModel>> {
        self.model.as_ref().ok_or_else(|| {
            Error::ModelMismatch(format!(
                "builder for {} has not been resolved",
                TypeDesc::of::<S>()
            ))
        })
    }

    fn resolve_model(&mut self) -> Result<Arc<ArrayModel>> {
        let array_type = TypeDesc::of::<S>();
        let element_type = TypeDesc::of::<S::Elem>();

        let sub_model = match (&mut self.structured_sub, &mut self.primitive_sub) {
            (Some(_), Some(_)) => {
                return Err(Error::ModelMismatch(format!(
                    "{array_type} has both a structured and a primitive sub-array builder"
                )));
            }
            (Some(sub), None) | (None, Some(sub)) => Some(sub.resolve()?),
            (None, None) => None,
        };
        if let Some(sub) = &sub_model {
            if sub.array_type() != element_type {
                return Err(Error::ModelMismatch(format!(
                    "sub-array builder builds {}, but {array_type} holds {element_type}",
                    sub.array_type()
                )));
            }
        }

        if self.array_ctor_and_args.is_none() {
            self.array_ctor_and_args = Some(CtorAndArgs::default_ctor()?);
        }
        if self.element_factory.is_none() {
            self.element_factory = Some(Box::new(factory::default_factory::<S::Elem>()?));
        }

        let model = match sub_model {
            None => ArrayModel::leaf(array_type, element_type, self.length),
            Some(sub) => ArrayModel::nested(array_type, sub, self.length),
        };
        let model = match &self.declared_model {
            Some(declared) if **declared != model => {
                return Err(Error::ModelMismatch(format!(
                    "builder resolves to {model}, but the declared model is {declared}"
                )));
            }
            Some(declared) => declared.clone(),
            None => Arc::new(model),
        };

        let depth = model.nesting_depth();
        if depth > self.options.max_nesting_depth {
            return Err(Error::NestingTooDeep {
                depth,
                max: self.options.max_nesting_depth,
            });
        }

        tracing::debug!(model = %model, ty = %array_type, "resolved array builder");
        Ok(model)
    }

    /// Instantiates the array this builder describes.
    pub fn build(self) -> Result<S> {
        engine::instantiate(self)
    }

    pub(crate) fn take_array_ctor_and_args(&mut self) -> Result<CtorAndArgs<'a, S>> {
        match self.array_ctor_and_args.take() {
            Some(ctor_and_args) => Ok(ctor_and_args),
            None => CtorAndArgs::default_ctor(),
        }
    }

    pub(crate) fn cookie(&self) -> Option<&'a (dyn Any + 'static)> {
        self.context_cookie
    }

    /// The element factory and nested builder, borrowed together for population.
    #[allow(clippy::type_complexity)]
    pub(crate) fn population_parts(
        &mut self,
    ) -> Result<(
        &mut (dyn ElementFactory<'a, S::Elem> + 'a),
        Option<&mut SubArrayBuilder<'a, S::Elem>>,
    )> {
        let nested = self.structured_sub.as_mut().or(self.primitive_sub.as_mut());
        match self.element_factory.as_deref_mut() {
            Some(factory) => Ok((factory, nested)),
            None => Err(Error::ModelMismatch(format!(
                "builder for {} has no element factory",
                TypeDesc::of::<S>()
            ))),
        }
    }
}

impl<S: StructuredArrayType> fmt::Debug for ArrayBuilder<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayBuilder")
            .field("array_type", &TypeDesc::of::<S>())
            .field("length", &self.length)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Builder for a primitive array type.
pub struct PrimitiveArrayBuilder<'a, A: PrimitiveArrayType> {
    length: usize,
    array_ctor_and_args: Option<CtorAndArgs<'a, A>>,
    model: Option<PrimitiveArrayModel>,
}

impl<'a, A: PrimitiveArrayType> PrimitiveArrayBuilder<'a, A> {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            array_ctor_and_args: None,
            model: None,
        }
    }

    /// Only used when this builder builds a top-level array. Nested primitive
    /// arrays are constructed with whatever the enclosing factory provides.
    pub fn array_ctor_and_args(mut self, ctor_and_args: CtorAndArgs<'a, A>) -> Self {
        self.array_ctor_and_args = Some(ctor_and_args);
        self
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn model(&self) -> Option<PrimitiveArrayModel> {
        self.model
    }

    pub fn resolve(&mut self) -> Result<PrimitiveArrayModel> {
        if let Some(model) = self.model {
            return Ok(model);
        }
        let model = PrimitiveArrayModel::new(
            TypeDesc::of::<A>(),
            TypeDesc::of::<A::Item>(),
            <A::Item as Primitive>::WIDTH,
            self.length,
        );
        self.model = Some(model);
        Ok(model)
    }

    pub fn build(mut self) -> Result<A> {
        let model = self.resolve()?;
        let ctor_and_args = match self.array_ctor_and_args.take() {
            Some(ctor_and_args) => ctor_and_args,
            None => CtorAndArgs::default_ctor()?,
        };
        tracing::debug!(model = ?model, "building primitive array");
        engine::place_primitive(model, &ContextStack::new(), &ctor_and_args)
    }
}

impl<A: PrimitiveArrayType> fmt::Debug for PrimitiveArrayBuilder<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveArrayBuilder")
            .field("array_type", &TypeDesc::of::<A>())
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// A builder for the nested level of an array of arrays, with the concrete
/// array kind erased.
pub struct SubArrayBuilder<'a, T> {
    inner: Box<dyn NestedBuilder<'a, T> + 'a>,
    primitive: bool,
}

impl<'a, T> SubArrayBuilder<'a, T> {
    pub fn is_primitive(&self) -> bool {
        self.primitive
    }

    pub(crate) fn resolve(&mut self) -> Result<NestedModel> {
        self.inner.resolve()
    }

    /// Builds one nested array, as the element of the slot the stack points at.
    pub(crate) fn construct(
        &mut self,
        stack: &mut ContextStack<'a>,
        ctor_and_args: &CtorAndArgs<'a, T>,
    ) -> Result<T> {
        self.inner.construct(stack, ctor_and_args)
    }
}

impl<'a, S: StructuredArrayType> From<ArrayBuilder<'a, S>> for SubArrayBuilder<'a, S> {
    fn from(builder: ArrayBuilder<'a, S>) -> Self {
        Self {
            inner: Box::new(builder),
            primitive: false,
        }
    }
}

impl<'a, A: PrimitiveArrayType> From<PrimitiveArrayBuilder<'a, A>> for SubArrayBuilder<'a, A> {
    fn from(builder: PrimitiveArrayBuilder<'a, A>) -> Self {
        Self {
            inner: Box::new(builder),
            primitive: true,
        }
    }
}

pub(crate) trait NestedBuilder<'a, T> {
    fn resolve(&mut self) -> Result<NestedModel>;
    fn construct(
        &mut self,
        stack: &mut ContextStack<'a>,
        ctor_and_args: &CtorAndArgs<'a, T>,
    ) -> Result<T>;
}

impl<'a, S: StructuredArrayType> NestedBuilder<'a, S> for ArrayBuilder<'a, S> {
    fn resolve(&mut self) -> Result<NestedModel> {
        ArrayBuilder::resolve(self).map(|model| NestedModel::Structured(model.clone()))
    }

    fn construct(
        &mut self,
        stack: &mut ContextStack<'a>,
        ctor_and_args: &CtorAndArgs<'a, S>,
    ) -> Result<S> {
        engine::build_level(self, stack, ctor_and_args, ctor_and_args.context_cookie())
    }
}

impl<'a, A: PrimitiveArrayType> NestedBuilder<'a, A> for PrimitiveArrayBuilder<'a, A> {
    fn resolve(&mut self) -> Result<NestedModel> {
        PrimitiveArrayBuilder::resolve(self).map(NestedModel::Primitive)
    }

    fn construct(
        &mut self,
        stack: &mut ContextStack<'a>,
        ctor_and_args: &CtorAndArgs<'a, A>,
    ) -> Result<A> {
        let model = PrimitiveArrayBuilder::resolve(self)?;
        engine::place_primitive(model, stack, ctor_and_args)
    }
}
