//! Circuit breaker implementation.

use crate::circuit_breaker::config::CircuitBreakerConfig;
use crate::circuit_breaker::state::{
    Admission, BreakerMetrics, BreakerState, Completion, StateMachine, Ticket, Transition,
};
use crate::core::{BreakerError, CircuitState, ConfigResult, Outcome, ProtectedCall};
use crate::events::{EventNotifier, TransitionEvent, TransitionKind};
use crate::fallback::{Fallback, FallbackDispatcher};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// A circuit breaker wrapped around a protected call.
///
/// The circuit breaker tracks the error rate of recent calls and, once it
/// crosses the configured threshold, denies calls for a while instead of
/// sending them to an unhealthy downstream.
///
/// # States
///
/// - **Closed**: Normal operation. Calls pass through, outcomes are recorded.
/// - **Open**: The downstream is failing. Calls are denied immediately.
/// - **Half-Open**: Probing. One call is allowed through to test whether
///   the downstream has recovered.
///
/// A breaker is meant to be shared (e.g. in an `Arc`) by every caller of the
/// protected operation. No lock is held across an `.await`.
///
/// # Example
///
/// ```rust,ignore
/// use breakwater::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
/// use breakwater::downstream::MockCall;
/// use breakwater::fallback;
///
/// let breaker = CircuitBreaker::new(MockCall::new(), CircuitBreakerConfig::default())
///     .with_fallback(fallback::fixed(0u64));
///
/// let value = breaker.execute(42).await?;
/// ```
pub struct CircuitBreaker<C: ProtectedCall> {
    /// The wrapped call.
    inner: C,
    /// State, window and transition rules.
    machine: Mutex<StateMachine>,
    /// Configuration.
    config: CircuitBreakerConfig,
    /// Metrics.
    metrics: RwLock<BreakerMetrics>,
    /// Fallback for denied and failed calls.
    fallback: FallbackDispatcher<C>,
    /// Transition observers.
    notifier: EventNotifier,
}

impl<C: ProtectedCall> CircuitBreaker<C> {
    /// Creates a new circuit breaker around `call` with the given configuration.
    ///
    /// The configuration is not rejected here; an invalid one (e.g. a
    /// threshold above 100, which never opens) is only logged. Use
    /// [`try_new`](Self::try_new) to refuse it.
    pub fn new(call: C, config: CircuitBreakerConfig) -> Self {
        if let Err(error) = config.validate() {
            tracing::warn!(
                breaker = call.name(),
                error = %error,
                "Circuit breaker created with invalid configuration"
            );
        }
        Self {
            inner: call,
            machine: Mutex::new(StateMachine::new(&config)),
            config,
            metrics: RwLock::new(BreakerMetrics::new()),
            fallback: FallbackDispatcher::new(),
            notifier: EventNotifier::new(),
        }
    }

    /// Creates a new circuit breaker after validating the configuration.
    pub fn try_new(call: C, config: CircuitBreakerConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::new(call, config))
    }

    /// Creates a new circuit breaker with default configuration.
    pub fn with_defaults(call: C) -> Self {
        Self::new(call, CircuitBreakerConfig::default())
    }

    /// Sets the fallback and returns the breaker.
    pub fn with_fallback<F: Fallback<C> + 'static>(self, fallback: F) -> Self {
        self.fallback.set(fallback);
        self
    }

    /// Sets the fallback, replacing any previous one.
    pub fn set_fallback<F: Fallback<C> + 'static>(&self, fallback: F) {
        self.fallback.set(fallback);
    }

    /// Removes the fallback; denials and failures reach the caller as errors.
    pub fn clear_fallback(&self) {
        self.fallback.clear();
    }

    /// Registers an observer for one kind of transition.
    pub fn on_transition<F>(&self, kind: TransitionKind, handler: F)
    where
        F: Fn(&TransitionEvent) + Send + Sync + 'static,
    {
        self.notifier.on_transition(kind, handler);
    }

    /// Registers an observer for every transition.
    pub fn on_any_transition<F>(&self, handler: F)
    where
        F: Fn(&TransitionEvent) + Send + Sync + 'static,
    {
        self.notifier.on_any_transition(handler);
    }

    /// Returns the breaker's name (the protected call's name).
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the current state of the circuit breaker.
    pub fn state(&self) -> BreakerState {
        self.lock_machine().state().clone()
    }

    /// Returns the current externally visible state.
    pub fn circuit_state(&self) -> CircuitState {
        self.lock_machine().state().circuit_state()
    }

    /// Returns a copy of the current metrics.
    pub fn metrics(&self) -> BreakerMetrics {
        let mut metrics = self
            .metrics
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        metrics.fallbacks = self.fallback.invocations();
        metrics.fallback_failures = self.fallback.failures();
        metrics
    }

    /// Returns a point-in-time health snapshot.
    pub fn health(&self) -> BreakerHealth {
        let now = Instant::now();
        let mut machine = self.lock_machine();
        BreakerHealth {
            name: self.name().to_string(),
            state: machine.state().circuit_state(),
            error_rate: machine.error_rate(now),
            samples: machine.samples(now),
            retry_in: machine.retry_in(now),
            fallback_configured: self.fallback.is_configured(),
        }
    }

    /// Returns a reference to the wrapped call.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Forces the circuit into the open state, restarting the reset clock.
    pub fn force_open(&self) {
        let transition = self.lock_machine().force_open(Instant::now());
        self.publish(transition);
    }

    /// Forces the circuit into the closed state and clears the window.
    pub fn force_close(&self) {
        let transition = self.lock_machine().force_close(Instant::now());
        if let Some(transition) = transition {
            self.publish(transition);
        }
    }

    /// Resets the circuit breaker state, window and metrics.
    pub fn reset(&self) {
        self.force_close();
        *self
            .metrics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = BreakerMetrics::new();
        self.fallback.reset_counters();
    }

    /// Runs the protected call through the breaker, with fallback.
    ///
    /// Denied, failed and timed-out calls are routed to the fallback when
    /// one is configured. Otherwise, and when the fallback itself fails,
    /// the error reaches the caller.
    pub async fn execute(&self, input: C::Input) -> Result<C::Output, BreakerError<C::Error>>
    where
        C::Input: Clone,
    {
        if !self.fallback.is_configured() {
            return self.call(input).await;
        }

        match self.call(input.clone()).await {
            Ok(output) => Ok(output),
            Err(cause) => self.fallback.dispatch(input, cause).await,
        }
    }

    /// Runs the protected call through the breaker, without fallback.
    ///
    /// The call is raced against the call timeout. On timeout the call's
    /// future is dropped, so its eventual result can never be recorded.
    ///
    /// A panic inside the protected call is recorded as a failure and then
    /// resumed on the caller.
    pub async fn call(&self, input: C::Input) -> Result<C::Output, BreakerError<C::Error>> {
        let permit = self.acquire()?;

        let guarded = AssertUnwindSafe(self.inner.call(input)).catch_unwind();
        let result = tokio::time::timeout(self.config.call_timeout, guarded).await;
        let (outcome, result) = match result {
            Ok(Ok(Ok(output))) => (Outcome::Success, Ok(output)),
            Ok(Ok(Err(source))) => (
                Outcome::Failure,
                Err(BreakerError::downstream(self.name(), source)),
            ),
            Ok(Err(panic)) => {
                tracing::error!(breaker = self.name(), "Protected call panicked");
                self.finish(permit, Outcome::Failure);
                std::panic::resume_unwind(panic);
            }
            Err(_) => (
                Outcome::Timeout,
                Err(BreakerError::timeout(self.name(), self.config.call_timeout)),
            ),
        };

        self.finish(permit, outcome);
        result
    }

    /// Asks the state machine for permission to run a call.
    fn acquire(&self) -> Result<Permit<'_>, BreakerError<C::Error>> {
        let admission = self.lock_machine().admit(Instant::now());

        match admission {
            Admission::Allowed { ticket, transition } => {
                if let Some(transition) = transition {
                    self.publish(transition);
                }
                if ticket.is_probe() {
                    tracing::debug!(breaker = self.name(), "Admitting probe call");
                }
                Ok(Permit::new(&self.machine, ticket))
            }

            Admission::Denied { state, retry_in } => {
                self.metrics
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .record_rejected();
                tracing::debug!(
                    breaker = self.name(),
                    state = %state,
                    retry_in = ?retry_in,
                    "Call rejected"
                );
                Err(BreakerError::denied(self.name(), state, retry_in))
            }
        }
    }

    /// Records the outcome of an admitted call and publishes any transition.
    fn finish(&self, permit: Permit<'_>, outcome: Outcome) {
        let completion = permit.complete(outcome, Instant::now());

        self.metrics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_outcome(outcome);

        match outcome {
            Outcome::Success => tracing::debug!(breaker = self.name(), "Call succeeded"),
            Outcome::Failure => tracing::debug!(breaker = self.name(), "Call failed"),
            Outcome::Timeout => tracing::warn!(
                breaker = self.name(),
                timeout_ms = self.config.call_timeout.as_millis() as u64,
                "Call timed out"
            ),
        }

        if !completion.recorded {
            tracing::debug!(
                breaker = self.name(),
                outcome = %outcome,
                "Ignoring outcome admitted under an earlier state"
            );
        }

        if let Some(transition) = completion.transition {
            self.publish(transition);
        }
    }

    /// Counts and broadcasts a transition. Must be called without the machine lock held.
    fn publish(&self, transition: Transition) {
        self.metrics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_transition(&transition);
        let event = TransitionEvent::new(self.name(), &transition);
        self.notifier.notify(&event);
    }

    fn lock_machine(&self) -> MutexGuard<'_, StateMachine> {
        self.machine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<C: ProtectedCall> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("inner", &self.inner)
            .field("state", &self.state())
            .field("config", &self.config)
            .field("fallback", &self.fallback)
            .field("notifier", &self.notifier)
            .finish()
    }
}

/// Permission to run one call, handed back exactly once.
///
/// Dropping a permit without completing it (the caller cancelled the call)
/// releases a held probe slot.
struct Permit<'a> {
    machine: &'a Mutex<StateMachine>,
    ticket: Option<Ticket>,
}

impl<'a> Permit<'a> {
    fn new(machine: &'a Mutex<StateMachine>, ticket: Ticket) -> Self {
        Self {
            machine,
            ticket: Some(ticket),
        }
    }

    fn complete(mut self, outcome: Outcome, now: Instant) -> Completion {
        match self.ticket.take() {
            Some(ticket) => self
                .machine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .complete(ticket, outcome, now),
            None => Default::default(),
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.machine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .abandon(ticket);
        }
    }
}

/// A point-in-time view of a breaker for health endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerHealth {
    /// Breaker name.
    pub name: String,
    /// Current state.
    pub state: CircuitState,
    /// Window error rate (0-100).
    pub error_rate: f64,
    /// Outcomes currently in the window.
    pub samples: usize,
    /// Time until a probe is admitted, when open.
    pub retry_in: Option<Duration>,
    /// Whether a fallback is configured.
    pub fallback_configured: bool,
}

impl BreakerHealth {
    /// Returns `true` if the breaker is passing calls through.
    pub fn is_healthy(&self) -> bool {
        self.state == CircuitState::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConfigError, FnCall};
    use crate::downstream::{MockCall, MockStep};
    use crate::fallback;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn scenario_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig::default()
            .with_error_threshold_percentage(50.0)
            .with_minimum_samples(4)
            .with_call_timeout(Duration::from_millis(3000))
            .with_reset_timeout(Duration::from_millis(10000))
    }

    async fn trip(breaker: &CircuitBreaker<MockCall>) {
        for _ in 0..4 {
            breaker.inner().push(MockStep::Fail);
            let _ = breaker.call(1).await;
        }
        assert!(breaker.state().is_open());
    }

    #[tokio::test]
    async fn test_circuit_breaker_passes_through() {
        let breaker = CircuitBreaker::with_defaults(MockCall::new());

        assert_eq!(breaker.execute(7).await.unwrap(), 7);
        assert!(breaker.state().is_closed());
        assert_eq!(breaker.metrics().successful_calls, 1);
    }

    #[tokio::test]
    async fn test_all_successes_never_transition_or_fall_back() {
        let breaker =
            CircuitBreaker::with_defaults(MockCall::new()).with_fallback(fallback::fixed(0u64));

        for i in 0..50 {
            assert_eq!(breaker.execute(i).await.unwrap(), i);
        }

        let metrics = breaker.metrics();
        assert!(breaker.state().is_closed());
        assert_eq!(metrics.fallbacks, 0);
        assert_eq!(metrics.times_opened, 0);
    }

    #[tokio::test]
    async fn test_circuit_opens_on_error_rate() {
        let call = MockCall::new().with_script([
            MockStep::Fail,
            MockStep::Fail,
            MockStep::Succeed,
            MockStep::Fail,
        ]);
        let breaker = CircuitBreaker::new(call, scenario_config());

        for _ in 0..3 {
            let _ = breaker.call(1).await;
            assert!(breaker.state().is_closed());
        }
        let _ = breaker.call(1).await;

        assert!(breaker.state().is_open());
        assert_eq!(breaker.metrics().times_opened, 1);
    }

    #[tokio::test]
    async fn test_circuit_rejects_when_open() {
        let breaker = CircuitBreaker::with_defaults(MockCall::new());

        breaker.force_open();
        assert!(breaker.state().is_open());

        for _ in 0..5 {
            let result = breaker.call(1).await;
            assert!(matches!(result, Err(BreakerError::Denied { .. })));
        }
        assert_eq!(breaker.inner().call_count(), 0);
        assert_eq!(breaker.metrics().rejected_calls, 5);
    }

    #[tokio::test]
    async fn test_open_circuit_returns_fixed_fallback() {
        let breaker =
            CircuitBreaker::with_defaults(MockCall::new()).with_fallback(fallback::fixed(0u64));
        breaker.force_open();

        assert_eq!(breaker.execute(42).await.unwrap(), 0);
        assert_eq!(breaker.inner().call_count(), 0);
        assert_eq!(breaker.metrics().fallbacks, 1);
    }

    #[tokio::test]
    async fn test_failure_routes_to_fallback_once() {
        let breaker = CircuitBreaker::with_defaults(MockCall::failing())
            .with_fallback(fallback::from_fn(|input: u64| input + 1000));

        assert_eq!(breaker.execute(1).await.unwrap(), 1001);
        assert_eq!(breaker.inner().call_count(), 1);
        assert_eq!(breaker.metrics().fallbacks, 1);
    }

    #[tokio::test]
    async fn test_without_fallback_errors_propagate() {
        let breaker = CircuitBreaker::with_defaults(MockCall::failing());
        let result = breaker.execute(1).await;
        assert!(matches!(result, Err(BreakerError::Downstream { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure_and_discards_late_result() {
        let call = MockCall::new().with_script([MockStep::Slow(Duration::from_secs(4))]);
        let breaker = CircuitBreaker::new(call, scenario_config());

        let result = breaker.call(1).await;
        assert!(matches!(result, Err(BreakerError::Timeout { .. })));

        tokio::time::sleep(Duration::from_secs(5)).await;

        let metrics = breaker.metrics();
        assert_eq!(metrics.timed_out_calls, 1);
        assert_eq!(metrics.failed_calls, 1);
        assert_eq!(metrics.successful_calls, 0);
        assert_eq!(breaker.inner().call_count(), 1);
        assert_eq!(breaker.inner().completed_count(), 0);
        assert_eq!(breaker.health().samples, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_transitions_to_half_open_after_reset_timeout() {
        let breaker = CircuitBreaker::new(MockCall::new(), scenario_config());
        trip(&breaker).await;

        tokio::time::advance(Duration::from_millis(9999)).await;
        assert!(breaker.call(1).await.is_err());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(breaker.call(1).await.is_ok());
        assert!(breaker.state().is_closed());

        let metrics = breaker.metrics();
        assert_eq!(metrics.times_half_opened, 1);
        assert_eq!(metrics.times_closed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_probe_resets_window() {
        let breaker = CircuitBreaker::new(MockCall::new(), scenario_config());
        trip(&breaker).await;

        tokio::time::advance(Duration::from_secs(10)).await;
        breaker.call(1).await.unwrap();
        assert_eq!(breaker.health().samples, 0);

        breaker.inner().push(MockStep::Fail);
        let _ = breaker.call(1).await;
        assert!(breaker.state().is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_probe_reopens_and_restarts_clock() {
        let breaker = CircuitBreaker::new(MockCall::new(), scenario_config());
        trip(&breaker).await;

        tokio::time::advance(Duration::from_secs(10)).await;
        breaker.inner().push(MockStep::Slow(Duration::from_secs(5)));
        let result = breaker.call(1).await;
        assert!(matches!(result, Err(BreakerError::Timeout { .. })));
        assert!(breaker.state().is_open());

        let health = breaker.health();
        assert_eq!(health.retry_in, Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_millis(9999)).await;
        assert!(breaker.call(1).await.unwrap_err().is_denied());
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(breaker.call(1).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_admit_single_probe() {
        let call = MockCall::new().with_latency(Duration::from_millis(100));
        let breaker = CircuitBreaker::new(call, scenario_config());
        breaker.force_open();

        tokio::time::advance(Duration::from_secs(10)).await;

        let results = futures::future::join_all((0..8).map(|i| breaker.call(i))).await;

        let admitted = results.iter().filter(|r| r.is_ok()).count();
        let denied = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_denied()))
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(denied, 7);
        assert_eq!(breaker.inner().call_count(), 1);
        assert!(breaker.state().is_closed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_probe_admission_under_thread_contention() {
        let call = MockCall::new().with_latency(Duration::from_millis(250));
        let config = scenario_config().with_reset_timeout(Duration::from_millis(20));
        let breaker = Arc::new(CircuitBreaker::new(call, config));
        breaker.force_open();

        tokio::time::sleep(Duration::from_millis(30)).await;

        let barrier = Arc::new(tokio::sync::Barrier::new(16));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let breaker = Arc::clone(&breaker);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    breaker.call(i).await.is_ok()
                })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(breaker.inner().call_count(), 1);
    }

    #[tokio::test]
    async fn test_panicking_call_counts_as_failure() {
        let call = FnCall::new("panicky", |input: u64| async move {
            assert!(input > 100, "adapter bug");
            Ok::<_, crate::downstream::MockError>(input)
        });
        let breaker = CircuitBreaker::new(call, scenario_config());

        for _ in 0..4 {
            let result = AssertUnwindSafe(breaker.call(1)).catch_unwind().await;
            assert!(result.is_err());
        }

        assert!(breaker.state().is_open());
        let metrics = breaker.metrics();
        assert_eq!(metrics.failed_calls, 4);
        assert_eq!(metrics.times_opened, 1);
        assert!(breaker.call(500).await.unwrap_err().is_denied());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_probe_releases_slot() {
        let call = MockCall::new().with_script([MockStep::Slow(Duration::from_secs(1))]);
        let breaker = CircuitBreaker::new(call, scenario_config());
        breaker.force_open();
        tokio::time::advance(Duration::from_secs(10)).await;

        let probe = tokio::time::timeout(Duration::from_millis(10), breaker.call(1)).await;
        assert!(probe.is_err());
        assert_eq!(
            breaker.state(),
            BreakerState::HalfOpen {
                probe_in_flight: false
            }
        );

        assert!(breaker.call(2).await.is_ok());
        assert!(breaker.state().is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_completion_does_not_move_state() {
        let call = MockCall::new().with_script([MockStep::Slow(Duration::from_secs(2))]);
        let breaker = CircuitBreaker::new(call, scenario_config());

        let (result, ()) = tokio::join!(breaker.call(1), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            breaker.force_open();
        });

        assert!(result.is_ok());
        assert!(breaker.state().is_open());
        assert_eq!(breaker.health().samples, 0);
        assert_eq!(breaker.metrics().successful_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_events_in_order() {
        let breaker = CircuitBreaker::new(MockCall::new(), scenario_config());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        breaker.on_any_transition(move |event| {
            log.lock().unwrap().push(event.kind);
        });

        trip(&breaker).await;
        tokio::time::advance(Duration::from_secs(10)).await;
        breaker.call(1).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                TransitionKind::Opened,
                TransitionKind::HalfOpened,
                TransitionKind::Closed
            ]
        );
    }

    #[tokio::test]
    async fn test_observer_sees_new_state() {
        let breaker = Arc::new(CircuitBreaker::new(MockCall::new(), scenario_config()));
        let observed_open = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&breaker);
        let counter = Arc::clone(&observed_open);
        breaker.on_transition(TransitionKind::Opened, move |_| {
            if let Some(breaker) = weak.upgrade() {
                if breaker.state().is_open() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        trip(&breaker).await;
        assert_eq!(observed_open.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_observer_does_not_affect_call() {
        let breaker = CircuitBreaker::new(MockCall::new(), scenario_config())
            .with_fallback(fallback::fixed(0u64));
        breaker.on_transition(TransitionKind::Opened, |_| panic!("observer failure"));

        for _ in 0..3 {
            breaker.inner().push(MockStep::Fail);
            assert_eq!(breaker.execute(1).await.unwrap(), 0);
        }
        breaker.inner().push(MockStep::Fail);
        assert_eq!(breaker.execute(1).await.unwrap(), 0);

        assert!(breaker.state().is_open());
        assert_eq!(breaker.metrics().fallbacks, 4);
    }

    #[test]
    fn test_force_open_close() {
        let breaker = CircuitBreaker::with_defaults(MockCall::new());

        assert!(breaker.state().is_closed());

        breaker.force_open();
        assert!(breaker.state().is_open());

        breaker.force_close();
        assert!(breaker.state().is_closed());
    }

    #[tokio::test]
    async fn test_reset_clears_metrics() {
        let breaker = CircuitBreaker::with_defaults(MockCall::failing())
            .with_fallback(fallback::fixed(0u64));
        let _ = breaker.execute(1).await;
        breaker.force_open();

        breaker.reset();

        assert!(breaker.state().is_closed());
        assert_eq!(breaker.metrics(), BreakerMetrics::new());
        assert_eq!(breaker.health().samples, 0);
    }

    #[test]
    fn test_try_new_validates_config() {
        let config = CircuitBreakerConfig::default().with_minimum_samples(0);
        assert!(CircuitBreaker::try_new(MockCall::new(), config).is_err());

        let config = CircuitBreakerConfig::default().with_error_threshold_percentage(150.0);
        assert!(matches!(
            CircuitBreaker::try_new(MockCall::new(), config),
            Err(ConfigError::ThresholdOutOfRange(_))
        ));
    }

    #[test]
    fn test_health_snapshot() {
        let breaker = CircuitBreaker::with_defaults(MockCall::new().with_name("orders"));
        let health = breaker.health();

        assert_eq!(health.name, "orders");
        assert!(health.is_healthy());
        assert_eq!(health.retry_in, None);
        assert!(!health.fallback_configured);
    }
}
