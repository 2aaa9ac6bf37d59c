//! Core traits for the breakwater library.
//!
//! This module defines the `ProtectedCall` trait that every guarded
//! operation implements, and `FnCall`, an adapter that turns an async
//! closure into a protected call.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// An asynchronous downstream operation guarded by a circuit breaker.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; one breaker is shared by many callers.
/// - The breaker enforces its own call timeout. An implementation may also
///   apply a tighter timeout of its own (e.g. an HTTP client timeout); it
///   simply surfaces as an error.
/// - The future returned by `call` may be dropped at any await point when
///   the breaker's timeout fires.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use breakwater::core::ProtectedCall;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct OrderLookup {
///     base_url: String,
/// }
///
/// #[async_trait]
/// impl ProtectedCall for OrderLookup {
///     type Input = u64;
///     type Output = Vec<Order>;
///     type Error = LookupError;
///
///     fn name(&self) -> &str {
///         "orders"
///     }
///
///     async fn call(&self, user_id: u64) -> Result<Vec<Order>, LookupError> {
///         // Perform the request...
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait ProtectedCall: Send + Sync + fmt::Debug {
    /// The argument passed to each invocation.
    type Input: Send + 'static;

    /// The value produced by a successful invocation.
    type Output: Send + 'static;

    /// The error produced by a failed invocation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the name of this operation.
    ///
    /// Used as the breaker name in errors, logs and transition events.
    fn name(&self) -> &str;

    /// Invokes the downstream operation.
    async fn call(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}

/// A protected call backed by an async closure.
///
/// ```rust,ignore
/// let lookup = FnCall::new("orders", |user_id: u64| async move {
///     client.fetch_orders(user_id).await
/// });
/// ```
pub struct FnCall<F, I> {
    name: String,
    f: F,
    _input: PhantomData<fn(I)>,
}

impl<F, I> FnCall<F, I> {
    /// Wraps `f` as a protected call named `name`.
    ///
    /// The input type is taken from the closure's argument.
    pub fn new<Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(I) -> Fut,
    {
        Self {
            name: name.into(),
            f,
            _input: PhantomData,
        }
    }
}

impl<F, I> fmt::Debug for FnCall<F, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCall").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, Fut, I, O, E> ProtectedCall for FnCall<F, I>
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    I: Send + 'static,
    O: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Input = I;
    type Output = O;
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, input: I) -> Result<O, E> {
        (self.f)(input).await
    }
}
