//! Core types used throughout the breakwater library.
//!
//! This module defines the circuit states visible to callers, the outcome
//! of a single protected call, and the reasons a fallback can be triggered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The externally visible state of a circuit breaker.
///
/// - `Closed`: calls pass through to the protected operation
/// - `Open`: calls are denied without touching the protected operation
/// - `HalfOpen`: a single probe call is testing whether the downstream recovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls pass through normally.
    Closed,
    /// Calls are denied until the reset timeout elapses.
    Open,
    /// One probe call decides whether to close or reopen.
    HalfOpen,
}

impl CircuitState {
    /// Returns the name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The outcome of one protected call, as recorded in the rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The call completed successfully.
    Success,
    /// The call completed with an error.
    Failure,
    /// The call did not complete within the call timeout.
    Timeout,
}

impl Outcome {
    /// Returns `true` for any outcome that counts against the error rate.
    ///
    /// A timeout is a failure; it is only kept apart for observability.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure | Self::Timeout)
    }

    /// Returns the name of the outcome.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a call did not produce a downstream result.
///
/// Passed to fallbacks so they can tell a short-circuited call from one
/// that actually reached the downstream and failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The breaker denied the call; nothing was sent downstream.
    Denied,
    /// The protected call returned an error.
    Failure,
    /// The protected call exceeded the call timeout.
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Denied => "denial",
            Self::Failure => "downstream failure",
            Self::Timeout => "downstream timeout",
        };
        f.write_str(s)
    }
}
