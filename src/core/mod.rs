//! Core types and traits for the breakwater library.
//!
//! This module provides the fundamental building blocks used throughout
//! the library:
//!
//! - [`types`] - Circuit states, call outcomes and failure kinds
//! - [`traits`] - The `ProtectedCall` trait and the `FnCall` adapter
//! - [`error`] - Structured error types

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types at the core level
pub use error::{BreakerError, ConfigError, ConfigResult};
pub use traits::{FnCall, ProtectedCall};
pub use types::{CircuitState, FailureKind, Outcome};
