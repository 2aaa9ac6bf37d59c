//! Fallback actions for denied or failed calls.
//!
//! A fallback substitutes a safe default result whenever the breaker denies
//! a call or the protected call fails or times out. It never runs for a
//! successful call, and it runs at most once per call.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use breakwater::fallback;
//!
//! // A fixed default
//! breaker.set_fallback(fallback::fixed(Vec::<Order>::new()));
//!
//! // A synchronous computation from the input
//! breaker.set_fallback(fallback::from_fn(|user_id: u64| cached_orders(user_id)));
//!
//! // An asynchronous, fallible computation
//! breaker.set_fallback(fallback::from_async(|user_id: u64, _kind| async move {
//!     replica.fetch_orders(user_id).await
//! }));
//! ```

mod dispatcher;
mod handlers;

pub use dispatcher::FallbackDispatcher;
pub use handlers::{from_async, from_fn, fixed, AsyncFallback, FixedFallback, FnFallback};

use crate::core::{BreakerError, ProtectedCall};

use async_trait::async_trait;
use std::sync::Arc;

/// A computation that produces a default result for a protected call.
///
/// If the fallback itself fails, its error reaches the caller as
/// [`BreakerError::FallbackFailed`]; it is never retried or masked.
#[async_trait]
pub trait Fallback<C: ProtectedCall>: Send + Sync {
    /// Produces a result for `input` after `cause` prevented a downstream result.
    async fn fallback(
        &self,
        input: C::Input,
        cause: &BreakerError<C::Error>,
    ) -> Result<C::Output, C::Error>;
}

/// An arc-wrapped fallback for shared ownership.
pub type ArcFallback<C> = Arc<dyn Fallback<C>>;
