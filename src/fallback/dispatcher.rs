//! Routes denied and failed calls to the configured fallback.

use crate::core::{BreakerError, ProtectedCall};
use crate::fallback::{ArcFallback, Fallback};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Holds the optional fallback of one breaker and invokes it.
pub struct FallbackDispatcher<C: ProtectedCall> {
    fallback: RwLock<Option<ArcFallback<C>>>,
    invocations: AtomicU64,
    failures: AtomicU64,
}

impl<C: ProtectedCall> FallbackDispatcher<C> {
    /// Creates a dispatcher with no fallback configured.
    pub fn new() -> Self {
        Self {
            fallback: RwLock::new(None),
            invocations: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Sets the fallback, replacing any previous one.
    pub fn set<F: Fallback<C> + 'static>(&self, fallback: F) {
        self.set_arc(Arc::new(fallback));
    }

    /// Sets an arc-wrapped fallback, replacing any previous one.
    pub fn set_arc(&self, fallback: ArcFallback<C>) {
        *self
            .fallback
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(fallback);
    }

    /// Removes the fallback; failures propagate to the caller again.
    pub fn clear(&self) {
        *self
            .fallback
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// Returns `true` if a fallback is configured.
    pub fn is_configured(&self) -> bool {
        self.fallback
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Returns the number of fallback invocations.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Returns the number of fallback invocations that failed.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Resets the invocation counters.
    pub fn reset_counters(&self) {
        self.invocations.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
    }

    /// Resolves a denied or failed call.
    ///
    /// Without a fallback the cause is returned unchanged. With one, the
    /// fallback runs exactly once and its result (or its own error, wrapped
    /// as `FallbackFailed`) is returned.
    pub async fn dispatch(
        &self,
        input: C::Input,
        cause: BreakerError<C::Error>,
    ) -> Result<C::Output, BreakerError<C::Error>> {
        let Some(fallback) = self.current() else {
            return Err(cause);
        };

        self.invocations.fetch_add(1, Ordering::Relaxed);
        let trigger = cause.kind();
        tracing::debug!(
            breaker = cause.breaker(),
            trigger = %trigger,
            cause = %cause,
            "Invoking fallback"
        );

        match fallback.fallback(input, &cause).await {
            Ok(output) => Ok(output),
            Err(source) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    breaker = cause.breaker(),
                    trigger = %trigger,
                    error = %source,
                    "Fallback failed"
                );
                Err(BreakerError::FallbackFailed {
                    breaker: cause.breaker().to_string(),
                    trigger,
                    source,
                })
            }
        }
    }

    fn current(&self) -> Option<ArcFallback<C>> {
        self.fallback
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<C: ProtectedCall> Default for FallbackDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ProtectedCall> fmt::Debug for FallbackDispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackDispatcher")
            .field("configured", &self.is_configured())
            .field("invocations", &self.invocations())
            .finish()
    }
}
