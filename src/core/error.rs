//! Error types for the breakwater library.
//!
//! This module provides structured, typed errors for every way a guarded
//! call can end without a downstream result. The library never panics;
//! all errors are returned as `Result` values.

use crate::core::types::{CircuitState, FailureKind};

use std::time::Duration;
use thiserror::Error;

/// The error returned by a circuit breaker call.
///
/// `E` is the protected call's own error type. Denials and timeouts carry
/// no `E` because no downstream error exists for them.
#[derive(Debug, Error)]
pub enum BreakerError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The breaker refused the call; nothing was sent downstream.
    #[error("circuit breaker '{breaker}' is {state}; call denied")]
    Denied {
        /// Name of the breaker that denied the call.
        breaker: String,
        /// State the breaker was in when it denied the call.
        state: CircuitState,
        /// Time until the breaker will admit a probe, if known.
        retry_in: Option<Duration>,
    },

    /// The protected call completed with an error.
    #[error("call through breaker '{breaker}' failed: {source}")]
    Downstream {
        /// Name of the breaker.
        breaker: String,
        /// The protected call's error.
        #[source]
        source: E,
    },

    /// The protected call did not complete within the call timeout.
    #[error("call through breaker '{breaker}' timed out after {timeout:?}")]
    Timeout {
        /// Name of the breaker.
        breaker: String,
        /// The call timeout that was exceeded.
        timeout: Duration,
    },

    /// The fallback itself failed after a denial or a failed call.
    #[error("fallback for breaker '{breaker}' failed after {trigger}: {source}")]
    FallbackFailed {
        /// Name of the breaker.
        breaker: String,
        /// What caused the fallback to run.
        trigger: FailureKind,
        /// The fallback's error.
        #[source]
        source: E,
    },
}

impl<E> BreakerError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Returns `true` if no downstream call was attempted.
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }

    /// Returns `true` if the protected call timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the fallback failed.
    pub fn is_fallback_failure(&self) -> bool {
        matches!(self, Self::FallbackFailed { .. })
    }

    /// Returns the kind of failure that produced this error.
    ///
    /// For a fallback failure this is the original trigger.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Denied { .. } => FailureKind::Denied,
            Self::Downstream { .. } => FailureKind::Failure,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::FallbackFailed { trigger, .. } => *trigger,
        }
    }

    /// Returns the name of the breaker that produced this error.
    pub fn breaker(&self) -> &str {
        match self {
            Self::Denied { breaker, .. }
            | Self::Downstream { breaker, .. }
            | Self::Timeout { breaker, .. }
            | Self::FallbackFailed { breaker, .. } => breaker,
        }
    }

    /// Consumes the error and returns the underlying call or fallback error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Downstream { source, .. } | Self::FallbackFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Creates a `Denied` error.
    pub fn denied(
        breaker: impl Into<String>,
        state: CircuitState,
        retry_in: Option<Duration>,
    ) -> Self {
        Self::Denied {
            breaker: breaker.into(),
            state,
            retry_in,
        }
    }

    /// Creates a `Downstream` error.
    pub fn downstream(breaker: impl Into<String>, source: E) -> Self {
        Self::Downstream {
            breaker: breaker.into(),
            source,
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(breaker: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            breaker: breaker.into(),
            timeout,
        }
    }
}

/// Error type for breaker configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The error threshold is not a percentage.
    #[error("error threshold percentage must be within 0..=100, got {0}")]
    ThresholdOutOfRange(f64),

    /// The minimum sample size is zero.
    #[error("minimum samples must be at least 1")]
    ZeroMinimumSamples,

    /// A duration option is zero.
    #[error("{option} must be greater than zero")]
    ZeroDuration {
        /// Name of the offending option.
        option: &'static str,
    },

    /// The window entry cap is zero.
    #[error("max window entries must be at least 1")]
    ZeroWindowCapacity,

    /// The options document could not be parsed.
    #[error("invalid breaker options: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A specialized `Result` type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
