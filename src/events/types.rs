//! Transition event types and emission functions.

use crate::circuit_breaker::Transition;
use crate::core::CircuitState;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The kind of a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// The circuit opened (from closed, or again from half-open).
    #[serde(rename = "opened")]
    Opened,
    /// The circuit moved to half-open and admitted a probe.
    #[serde(rename = "halfOpen")]
    HalfOpened,
    /// The circuit closed again.
    #[serde(rename = "closed")]
    Closed,
}

impl TransitionKind {
    /// Returns the kind of transition that ends in `state`.
    pub fn entering(state: CircuitState) -> Self {
        match state {
            CircuitState::Open => Self::Opened,
            CircuitState::HalfOpen => Self::HalfOpened,
            CircuitState::Closed => Self::Closed,
        }
    }

    /// Returns the event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::HalfOpened => "halfOpen",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An observable record of one state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Unique event ID.
    pub id: Uuid,

    /// Name of the breaker that transitioned.
    pub breaker: String,

    /// Kind of transition.
    pub kind: TransitionKind,

    /// State before the transition.
    pub from: CircuitState,

    /// State after the transition.
    pub to: CircuitState,

    /// Window error rate (0-100) when the transition happened.
    pub error_rate: f64,

    /// Wall-clock time of the transition.
    pub timestamp: DateTime<Utc>,
}

impl TransitionEvent {
    /// Creates an event describing `transition` on the named breaker.
    pub fn new(breaker: impl Into<String>, transition: &Transition) -> Self {
        Self {
            id: Uuid::new_v4(),
            breaker: breaker.into(),
            kind: TransitionKind::entering(transition.to),
            from: transition.from,
            to: transition.to,
            error_rate: transition.error_rate,
            timestamp: Utc::now(),
        }
    }
}

/// Emits a structured log record for a transition.
pub fn emit_transition(event: &TransitionEvent) {
    match event.kind {
        TransitionKind::Opened => tracing::warn!(
            target: "breakwater::events",
            event_id = %event.id,
            breaker = %event.breaker,
            event_type = %event.kind,
            from = %event.from,
            to = %event.to,
            error_rate = event.error_rate,
            "Circuit opened"
        ),
        TransitionKind::HalfOpened => tracing::info!(
            target: "breakwater::events",
            event_id = %event.id,
            breaker = %event.breaker,
            event_type = %event.kind,
            from = %event.from,
            to = %event.to,
            "Circuit half-open; probing downstream"
        ),
        TransitionKind::Closed => tracing::info!(
            target: "breakwater::events",
            event_id = %event.id,
            breaker = %event.breaker,
            event_type = %event.kind,
            from = %event.from,
            to = %event.to,
            "Circuit closed; downstream recovered"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_target_state() {
        assert_eq!(
            TransitionKind::entering(CircuitState::Open),
            TransitionKind::Opened
        );
        assert_eq!(
            TransitionKind::entering(CircuitState::HalfOpen),
            TransitionKind::HalfOpened
        );
        assert_eq!(
            TransitionKind::entering(CircuitState::Closed),
            TransitionKind::Closed
        );
    }

    #[test]
    fn test_event_from_transition() {
        let transition = Transition {
            from: CircuitState::Closed,
            to: CircuitState::Open,
            error_rate: 75.0,
        };
        let event = TransitionEvent::new("orders", &transition);

        assert_eq!(event.breaker, "orders");
        assert_eq!(event.kind, TransitionKind::Opened);
        assert_eq!(event.error_rate, 75.0);
    }

    #[test]
    fn test_event_serialization() {
        let transition = Transition {
            from: CircuitState::Open,
            to: CircuitState::HalfOpen,
            error_rate: 0.0,
        };
        let event = TransitionEvent::new("orders", &transition);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "halfOpen");
        assert_eq!(json["from"], "open");
        assert_eq!(json["to"], "half_open");
    }
}
