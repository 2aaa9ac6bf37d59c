//! Observer registry for transition events.

use crate::events::types::{emit_transition, TransitionEvent, TransitionKind};

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

/// A callback invoked with each matching transition event.
pub type TransitionHandler = Arc<dyn Fn(&TransitionEvent) + Send + Sync>;

struct Observer {
    /// `None` subscribes to every kind.
    kind: Option<TransitionKind>,
    handler: TransitionHandler,
}

/// Broadcasts transition events to registered observers.
///
/// Observers run synchronously on the thread that caused the transition,
/// after the transition is complete and outside the breaker's lock. A
/// panicking observer is isolated and logged; it cannot affect the breaker
/// or the other observers.
#[derive(Default)]
pub struct EventNotifier {
    observers: RwLock<Vec<Observer>>,
}

impl EventNotifier {
    /// Creates a notifier with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one kind of transition.
    pub fn on_transition<F>(&self, kind: TransitionKind, handler: F)
    where
        F: Fn(&TransitionEvent) + Send + Sync + 'static,
    {
        self.register(Some(kind), Arc::new(handler));
    }

    /// Registers a handler for every transition.
    pub fn on_any_transition<F>(&self, handler: F)
    where
        F: Fn(&TransitionEvent) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(handler));
    }

    /// Returns the number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Logs the event and delivers it to every matching observer.
    ///
    /// Returns the number of observers that completed without panicking.
    pub fn notify(&self, event: &TransitionEvent) -> usize {
        emit_transition(event);

        let handlers: Vec<TransitionHandler> = self
            .observers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|observer| observer.kind.map_or(true, |kind| kind == event.kind))
            .map(|observer| Arc::clone(&observer.handler))
            .collect();

        let mut delivered = 0;
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::error!(
                        breaker = %event.breaker,
                        event_type = %event.kind,
                        "Transition observer panicked; ignoring"
                    );
                }
            }
        }
        delivered
    }

    fn register(&self, kind: Option<TransitionKind>, handler: TransitionHandler) {
        self.observers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Observer { kind, handler });
    }
}

impl fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventNotifier")
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::Transition;
    use crate::core::CircuitState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn opened() -> TransitionEvent {
        TransitionEvent::new(
            "orders",
            &Transition {
                from: CircuitState::Closed,
                to: CircuitState::Open,
                error_rate: 100.0,
            },
        )
    }

    #[test]
    fn test_notify_without_observers() {
        let notifier = EventNotifier::new();
        assert_eq!(notifier.notify(&opened()), 0);
    }

    #[test]
    fn test_handlers_filtered_by_kind() {
        let notifier = EventNotifier::new();
        let opened_count = Arc::new(AtomicUsize::new(0));
        let closed_count = Arc::new(AtomicUsize::new(0));
        let any_count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&opened_count);
        notifier.on_transition(TransitionKind::Opened, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&closed_count);
        notifier.on_transition(TransitionKind::Closed, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&any_count);
        notifier.on_any_transition(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(notifier.observer_count(), 3);
        assert_eq!(notifier.notify(&opened()), 2);
        assert_eq!(opened_count.load(Ordering::SeqCst), 1);
        assert_eq!(closed_count.load(Ordering::SeqCst), 0);
        assert_eq!(any_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let notifier = EventNotifier::new();
        let reached = Arc::new(AtomicUsize::new(0));

        notifier.on_any_transition(|_| panic!("observer failure"));
        let counter = Arc::clone(&reached);
        notifier.on_any_transition(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(notifier.notify(&opened()), 1);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }
}
