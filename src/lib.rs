//! # Breakwater
//!
//! An async circuit breaker that guards remote calls, short-circuits them
//! to a fallback while the downstream is unhealthy, and reports every state
//! transition.
//!
//! ## Overview
//!
//! Breakwater sits in front of a remote call and lets you:
//!
//! - Enforce a timeout on every call
//! - Track the error rate of recent calls over a rolling window
//! - Stop sending calls to a failing downstream, then probe it for recovery
//! - Substitute a fallback result for denied or failed calls
//! - Observe transitions through callbacks and structured logs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use breakwater::{fallback, CircuitBreaker, CircuitBreakerConfig, FnCall, TransitionKind};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lookup = FnCall::new("orders", |user_id: u64| async move {
//!         fetch_orders(user_id).await
//!     });
//!
//!     let config = CircuitBreakerConfig::default()
//!         .with_call_timeout(Duration::from_millis(3500))
//!         .with_error_threshold_percentage(50.0)
//!         .with_reset_timeout(Duration::from_secs(10));
//!
//!     let breaker = CircuitBreaker::try_new(lookup, config)?
//!         .with_fallback(fallback::fixed(Vec::new()));
//!
//!     breaker.on_transition(TransitionKind::Opened, |event| {
//!         eprintln!("{} opened at {}% errors", event.breaker, event.error_rate);
//!     });
//!
//!     let orders = breaker.execute(42).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Core**: The `ProtectedCall` trait, states, outcomes and errors
//! - **Circuit Breaker**: Rolling window, state machine and call executor
//! - **Fallback**: Default results for denied and failed calls
//! - **Events**: Transition events, observers and structured logging
//! - **Downstream**: Protected call implementations for tests and demos

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod circuit_breaker;
pub mod core;
pub mod downstream;
pub mod events;
pub mod fallback;

// Re-export commonly used types at the crate root
pub use crate::core::{
    BreakerError, CircuitState, ConfigError, FailureKind, FnCall, Outcome, ProtectedCall,
};

pub use crate::circuit_breaker::{
    BreakerHealth, BreakerMetrics, BreakerOptions, CircuitBreaker, CircuitBreakerConfig,
};
pub use crate::events::{TransitionEvent, TransitionKind};
pub use crate::fallback::Fallback;

/// Prelude module for convenient imports.
///
/// ```rust
/// use breakwater::prelude::*;
/// ```
pub mod prelude {
    pub use crate::circuit_breaker::{
        BreakerHealth, BreakerMetrics, CircuitBreaker, CircuitBreakerConfig,
    };
    pub use crate::core::{
        BreakerError, CircuitState, FailureKind, FnCall, Outcome, ProtectedCall,
    };
    pub use crate::events::{TransitionEvent, TransitionKind};
    pub use crate::fallback::{self, Fallback};
}
