//! State-transition events for external monitoring.
//!
//! Every transition is logged as a structured `tracing` record on the
//! `breakwater::events` target and delivered to registered observers.
//! Events are side effects only; nothing here feeds back into the breaker.

mod notifier;
mod types;

pub use notifier::{EventNotifier, TransitionHandler};
pub use types::{emit_transition, TransitionEvent, TransitionKind};
