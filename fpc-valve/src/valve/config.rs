//! Valve configuration: combine function, passthrough transform, input type
//!
//! A configuration is immutable once built. Replacing it on a running valve
//! goes through [`MergeValve::set_configuration`](super::MergeValve::set_configuration),
//! which rebuilds the pipeline so the new functions take effect.

use crate::error::BoxError;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

/// Number of inputs the merge step combines
pub const ARITY: usize = 2;

/// Combine function: `(primary, secondary) -> merged`
pub type CombineFn<T, R> = Rc<dyn Fn(&T, &T) -> Result<R, BoxError>>;

/// Passthrough transform applied to each forwarded value
pub type TransformFn<T, P> = Rc<dyn Fn(&T) -> Result<P, BoxError>>;

/// Values that can report a runtime kind
///
/// Used to build a [`DeclaredType`] filter from a kind value instead of a
/// hand-written predicate.
pub trait Kinded {
    type Kind: PartialEq + fmt::Debug + Clone + 'static;

    fn kind(&self) -> Self::Kind;
}

/// Runtime type filter applied on passthrough routes
///
/// Values the filter rejects are silently dropped from the route. The merge
/// path never consults the filter.
pub struct DeclaredType<T> {
    name: Cow<'static, str>,
    accepts: Option<Rc<dyn Fn(&T) -> bool>>,
}

impl<T> DeclaredType<T> {
    /// Filter that accepts every value
    pub fn any() -> Self {
        Self {
            name: Cow::Borrowed("any"),
            accepts: None,
        }
    }

    /// Filter backed by a predicate
    pub fn matching<F>(name: impl Into<Cow<'static, str>>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        Self {
            name: name.into(),
            accepts: Some(Rc::new(predicate)),
        }
    }

    /// Filter accepting values whose kind equals `kind`
    pub fn kind(kind: <T as Kinded>::Kind) -> Self
    where
        T: Kinded + 'static,
    {
        let name = format!("{:?}", kind);
        Self {
            name: Cow::Owned(name),
            accepts: Some(Rc::new(move |value: &T| value.kind() == kind)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepts(&self, value: &T) -> bool {
        match &self.accepts {
            Some(predicate) => predicate(value),
            None => true,
        }
    }
}

impl<T> Clone for DeclaredType<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            accepts: self.accepts.clone(),
        }
    }
}

impl<T> Default for DeclaredType<T> {
    fn default() -> Self {
        Self::any()
    }
}

impl<T> fmt::Debug for DeclaredType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeclaredType").field(&self.name).finish()
    }
}

/// Complete valve configuration
///
/// `T` is the input type, `R` the merged output type and `P` the passthrough
/// output type (defaults to `T`).
pub struct ValveConfig<T, R, P = T> {
    combine: CombineFn<T, R>,
    passthrough: TransformFn<T, P>,
    input_type: DeclaredType<T>,
}

impl<T, R> ValveConfig<T, R, T>
where
    T: Clone + 'static,
    R: 'static,
{
    /// Configuration with the given combine function, an identity passthrough
    /// and no input type restriction
    pub fn new<F>(combine: F) -> Self
    where
        F: Fn(&T, &T) -> Result<R, BoxError> + 'static,
    {
        Self {
            combine: Rc::new(combine),
            passthrough: Rc::new(identity::<T>),
            input_type: DeclaredType::any(),
        }
    }
}

fn identity<T: Clone>(value: &T) -> Result<T, BoxError> {
    Ok(value.clone())
}

impl<T, R, P> ValveConfig<T, R, P>
where
    T: 'static,
    R: 'static,
    P: 'static,
{
    /// Replace the passthrough transform, possibly changing its output type
    pub fn with_passthrough<Q, F>(self, transform: F) -> ValveConfig<T, R, Q>
    where
        Q: 'static,
        F: Fn(&T) -> Result<Q, BoxError> + 'static,
    {
        ValveConfig {
            combine: self.combine,
            passthrough: Rc::new(transform),
            input_type: self.input_type,
        }
    }

    /// Replace the combine function
    pub fn with_combine<F>(mut self, combine: F) -> Self
    where
        F: Fn(&T, &T) -> Result<R, BoxError> + 'static,
    {
        self.combine = Rc::new(combine);
        self
    }

    /// Restrict passthrough routes to values matching `input_type`
    pub fn with_input_type(mut self, input_type: DeclaredType<T>) -> Self {
        self.input_type = input_type;
        self
    }

    /// Number of inputs the combine function takes
    pub fn arity(&self) -> usize {
        ARITY
    }

    pub fn input_type(&self) -> &DeclaredType<T> {
        &self.input_type
    }

    pub(crate) fn combine_fn(&self) -> CombineFn<T, R> {
        Rc::clone(&self.combine)
    }

    pub(crate) fn passthrough_fn(&self) -> TransformFn<T, P> {
        Rc::clone(&self.passthrough)
    }
}

impl<T, R, P> Clone for ValveConfig<T, R, P> {
    fn clone(&self) -> Self {
        Self {
            combine: Rc::clone(&self.combine),
            passthrough: Rc::clone(&self.passthrough),
            input_type: self.input_type.clone(),
        }
    }
}

impl<T, R, P> fmt::Debug for ValveConfig<T, R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValveConfig")
            .field("arity", &ARITY)
            .field("input_type", &self.input_type)
            .finish_non_exhaustive()
    }
}
