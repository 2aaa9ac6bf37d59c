//! Ready-made fallback implementations.

use crate::core::{BreakerError, FailureKind, ProtectedCall};
use crate::fallback::Fallback;

use async_trait::async_trait;
use std::fmt;
use std::future::Future;

/// A fallback that always returns a clone of one value.
#[derive(Debug, Clone)]
pub struct FixedFallback<O> {
    value: O,
}

/// Creates a fallback that always returns `value`.
pub fn fixed<O>(value: O) -> FixedFallback<O>
where
    O: Clone + Send + Sync,
{
    FixedFallback { value }
}

#[async_trait]
impl<C> Fallback<C> for FixedFallback<C::Output>
where
    C: ProtectedCall,
    C::Output: Clone + Sync,
{
    async fn fallback(
        &self,
        _input: C::Input,
        _cause: &BreakerError<C::Error>,
    ) -> Result<C::Output, C::Error> {
        Ok(self.value.clone())
    }
}

/// A fallback backed by a synchronous, infallible closure.
pub struct FnFallback<F> {
    f: F,
}

/// Creates a fallback that computes its result from the call input.
pub fn from_fn<I, O, F>(f: F) -> FnFallback<F>
where
    F: Fn(I) -> O + Send + Sync,
{
    FnFallback { f }
}

impl<F> fmt::Debug for FnFallback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFallback").finish_non_exhaustive()
    }
}

#[async_trait]
impl<C, F> Fallback<C> for FnFallback<F>
where
    C: ProtectedCall,
    F: Fn(C::Input) -> C::Output + Send + Sync,
{
    async fn fallback(
        &self,
        input: C::Input,
        _cause: &BreakerError<C::Error>,
    ) -> Result<C::Output, C::Error> {
        Ok((self.f)(input))
    }
}

/// A fallback backed by an asynchronous, fallible closure.
///
/// The closure receives the call input and the kind of failure that
/// triggered it.
pub struct AsyncFallback<F> {
    f: F,
}

/// Creates a fallback from an async closure.
pub fn from_async<I, O, E, F, Fut>(f: F) -> AsyncFallback<F>
where
    F: Fn(I, FailureKind) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
{
    AsyncFallback { f }
}

impl<F> fmt::Debug for AsyncFallback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFallback").finish_non_exhaustive()
    }
}

#[async_trait]
impl<C, F, Fut> Fallback<C> for AsyncFallback<F>
where
    C: ProtectedCall,
    F: Fn(C::Input, FailureKind) -> Fut + Send + Sync,
    Fut: Future<Output = Result<C::Output, C::Error>> + Send + 'static,
{
    async fn fallback(
        &self,
        input: C::Input,
        cause: &BreakerError<C::Error>,
    ) -> Result<C::Output, C::Error> {
        (self.f)(input, cause.kind()).await
    }
}
