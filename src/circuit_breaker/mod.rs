//! Circuit breaker implementation for protecting remote calls.
//!
//! The circuit breaker pattern prevents cascading failures by temporarily
//! stopping traffic to a failing downstream and probing it to detect
//! recovery.
//!
//! ## States
//!
//! - **Closed**: Normal operation; calls pass through.
//! - **Open**: The downstream is failing; calls are denied immediately.
//! - **Half-Open**: A single probe call tests whether the downstream recovered.
//!
//! ## Components
//!
//! - [`RollingWindow`] - recent outcomes and the error rate over them
//! - [`StateMachine`] - the transition rules and single-probe admission
//! - [`CircuitBreaker`] - runs calls with a timeout and ties everything together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use breakwater::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use breakwater::downstream::MockCall;
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig::default()
//!     .with_error_threshold_percentage(50.0)
//!     .with_reset_timeout(Duration::from_secs(10));
//!
//! let breaker = CircuitBreaker::new(MockCall::new(), config);
//! ```

mod breaker;
mod config;
mod state;
mod window;

pub use breaker::{BreakerHealth, CircuitBreaker};
pub use config::{BreakerOptions, CircuitBreakerConfig};
pub use state::{
    Admission, BreakerMetrics, BreakerState, Completion, StateMachine, Ticket, Transition,
};
pub use window::RollingWindow;
