//! Circuit breaker state machine.

use crate::circuit_breaker::config::CircuitBreakerConfig;
use crate::circuit_breaker::window::RollingWindow;
use crate::core::{CircuitState, Outcome};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// The current state of a circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakerState {
    /// Circuit is closed; calls pass through normally.
    Closed,

    /// Circuit is open; calls are denied.
    Open {
        /// When the circuit was opened.
        opened_at: Instant,
        /// When the circuit will admit a probe.
        until: Instant,
    },

    /// Circuit is half-open; a single probe decides the next state.
    HalfOpen {
        /// Whether the probe call is currently running.
        probe_in_flight: bool,
    },
}

impl BreakerState {
    /// Creates a new closed state.
    pub fn closed() -> Self {
        Self::Closed
    }

    /// Creates an open state that admits a probe after `reset_timeout`.
    pub fn open_at(now: Instant, reset_timeout: Duration) -> Self {
        Self::Open {
            opened_at: now,
            until: now + reset_timeout,
        }
    }

    /// Returns `true` if the circuit is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if the circuit is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Returns `true` if the circuit is half-open.
    pub fn is_half_open(&self) -> bool {
        matches!(self, Self::HalfOpen { .. })
    }

    /// Returns the externally visible state.
    pub fn circuit_state(&self) -> CircuitState {
        match self {
            Self::Closed => CircuitState::Closed,
            Self::Open { .. } => CircuitState::Open,
            Self::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Returns the name of the state.
    pub fn name(&self) -> &'static str {
        self.circuit_state().name()
    }
}

impl Default for BreakerState {
    fn default() -> Self {
        Self::closed()
    }
}

/// A state change, reported so callers can emit events after releasing the lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// State before the change.
    pub from: CircuitState,
    /// State after the change.
    pub to: CircuitState,
    /// Window error rate at the time of the change.
    pub error_rate: f64,
}

/// Permission to run one protected call.
///
/// The epoch ties the call to the state exposure that admitted it, so a
/// completion from an earlier exposure cannot move the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    probe: bool,
}

impl Ticket {
    /// Returns `true` if this ticket admits the half-open probe.
    pub fn is_probe(&self) -> bool {
        self.probe
    }
}

/// The state machine's answer to a call attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// The call may proceed.
    Allowed {
        /// Ticket to hand back with the call's outcome.
        ticket: Ticket,
        /// Set when admitting this call moved the circuit to half-open.
        transition: Option<Transition>,
    },
    /// The call must not reach the downstream.
    Denied {
        /// State that caused the denial.
        state: CircuitState,
        /// Time until a probe will be admitted, if known.
        retry_in: Option<Duration>,
    },
}

/// What happened when an outcome was handed back.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Completion {
    /// Whether the outcome was recorded into the window.
    pub recorded: bool,
    /// Set when the outcome moved the circuit.
    pub transition: Option<Transition>,
}

/// State, window and transition rules of one breaker.
///
/// All methods are synchronous and meant to run under the breaker's lock.
#[derive(Debug)]
pub struct StateMachine {
    state: BreakerState,
    window: RollingWindow,
    epoch: u64,
    error_threshold_percentage: f64,
    minimum_samples: usize,
    reset_timeout: Duration,
}

impl StateMachine {
    /// Creates a closed state machine from the given configuration.
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            state: BreakerState::closed(),
            window: RollingWindow::new(config.rolling_window, config.max_window_entries),
            epoch: 0,
            error_threshold_percentage: config.error_threshold_percentage,
            minimum_samples: config.minimum_samples.max(1) as usize,
            reset_timeout: config.reset_timeout,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &BreakerState {
        &self.state
    }

    /// Returns the current window error rate.
    pub fn error_rate(&mut self, now: Instant) -> f64 {
        self.window.error_rate(now)
    }

    /// Returns the number of outcomes in the window.
    pub fn samples(&mut self, now: Instant) -> usize {
        self.window.len(now)
    }

    /// Returns the time until the circuit admits a probe, if it is open.
    pub fn retry_in(&self, now: Instant) -> Option<Duration> {
        match self.state {
            BreakerState::Open { until, .. } => Some(until.saturating_duration_since(now)),
            _ => None,
        }
    }

    /// Decides whether a call may proceed.
    ///
    /// The open to half-open move and the probe admission happen in this
    /// one step, so only one caller can ever win the probe.
    pub fn admit(&mut self, now: Instant) -> Admission {
        match self.state {
            BreakerState::Closed => Admission::Allowed {
                ticket: self.ticket(false),
                transition: None,
            },

            BreakerState::Open { until, .. } => {
                if now >= until {
                    let transition =
                        self.transition_to(BreakerState::HalfOpen { probe_in_flight: true }, now);
                    Admission::Allowed {
                        ticket: self.ticket(true),
                        transition: Some(transition),
                    }
                } else {
                    Admission::Denied {
                        state: CircuitState::Open,
                        retry_in: Some(until - now),
                    }
                }
            }

            BreakerState::HalfOpen { probe_in_flight } => {
                if probe_in_flight {
                    Admission::Denied {
                        state: CircuitState::HalfOpen,
                        retry_in: None,
                    }
                } else {
                    self.state = BreakerState::HalfOpen {
                        probe_in_flight: true,
                    };
                    Admission::Allowed {
                        ticket: self.ticket(true),
                        transition: None,
                    }
                }
            }
        }
    }

    /// Records the outcome of an admitted call and re-evaluates the state.
    ///
    /// Outcomes from an earlier state exposure are ignored.
    pub fn complete(&mut self, ticket: Ticket, outcome: Outcome, now: Instant) -> Completion {
        if ticket.epoch != self.epoch {
            return Completion::default();
        }

        match (self.state.circuit_state(), ticket.probe) {
            (CircuitState::Closed, false) => {
                self.window.record(outcome, now);
                let transition = self.should_open(now).then(|| {
                    self.transition_to(BreakerState::open_at(now, self.reset_timeout), now)
                });
                Completion {
                    recorded: true,
                    transition,
                }
            }

            (CircuitState::HalfOpen, true) => {
                self.window.record(outcome, now);
                let transition = if outcome.is_failure() {
                    self.transition_to(BreakerState::open_at(now, self.reset_timeout), now)
                } else {
                    let transition = self.transition_to(BreakerState::closed(), now);
                    self.window.clear();
                    transition
                };
                Completion {
                    recorded: true,
                    transition: Some(transition),
                }
            }

            _ => Completion::default(),
        }
    }

    /// Releases a ticket whose call ended without an outcome.
    ///
    /// A released probe frees the half-open slot for the next caller.
    pub fn abandon(&mut self, ticket: Ticket) {
        if ticket.probe && ticket.epoch == self.epoch && self.state.is_half_open() {
            self.state = BreakerState::HalfOpen {
                probe_in_flight: false,
            };
        }
    }

    /// Forces the circuit open, restarting the reset clock.
    pub fn force_open(&mut self, now: Instant) -> Transition {
        self.transition_to(BreakerState::open_at(now, self.reset_timeout), now)
    }

    /// Forces the circuit closed and clears the window.
    pub fn force_close(&mut self, now: Instant) -> Option<Transition> {
        let transition = (!self.state.is_closed())
            .then(|| self.transition_to(BreakerState::closed(), now));
        self.window.clear();
        transition
    }

    fn should_open(&mut self, now: Instant) -> bool {
        let samples = self.window.len(now);
        samples >= self.minimum_samples
            && self.window.failures(now) > 0
            && self.window.error_rate(now) >= self.error_threshold_percentage
    }

    fn transition_to(&mut self, next: BreakerState, now: Instant) -> Transition {
        let transition = Transition {
            from: self.state.circuit_state(),
            to: next.circuit_state(),
            error_rate: self.window.error_rate(now),
        };
        self.state = next;
        self.epoch += 1;
        transition
    }

    fn ticket(&self, probe: bool) -> Ticket {
        Ticket {
            epoch: self.epoch,
            probe,
        }
    }
}

/// Metrics about circuit breaker behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakerMetrics {
    /// Total number of calls attempted through the breaker.
    pub total_calls: u64,
    /// Number of successful calls.
    pub successful_calls: u64,
    /// Number of failed calls, timeouts included.
    pub failed_calls: u64,
    /// Number of calls that timed out.
    pub timed_out_calls: u64,
    /// Number of calls denied by the breaker.
    pub rejected_calls: u64,
    /// Number of fallback invocations.
    ///
    /// Filled in from the fallback dispatcher when a snapshot is taken.
    pub fallbacks: u64,
    /// Number of fallback invocations that failed.
    pub fallback_failures: u64,
    /// Number of times the circuit has opened.
    pub times_opened: u64,
    /// Number of times the circuit has moved to half-open.
    pub times_half_opened: u64,
    /// Number of times the circuit has closed again.
    pub times_closed: u64,
}

impl BreakerMetrics {
    /// Creates new empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call outcome.
    pub fn record_outcome(&mut self, outcome: Outcome) {
        self.total_calls += 1;
        match outcome {
            Outcome::Success => self.successful_calls += 1,
            Outcome::Failure => self.failed_calls += 1,
            Outcome::Timeout => {
                self.failed_calls += 1;
                self.timed_out_calls += 1;
            }
        }
    }

    /// Records a denied call.
    pub fn record_rejected(&mut self) {
        self.total_calls += 1;
        self.rejected_calls += 1;
    }

    /// Records a state transition.
    pub fn record_transition(&mut self, transition: &Transition) {
        match transition.to {
            CircuitState::Open => self.times_opened += 1,
            CircuitState::HalfOpen => self.times_half_opened += 1,
            CircuitState::Closed => self.times_closed += 1,
        }
    }

    /// Returns the success rate (0.0 to 1.0) over all calls.
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 1.0;
        }
        self.successful_calls as f64 / self.total_calls as f64
    }

    /// Returns the failure rate (0.0 to 1.0) over all calls.
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }
        self.failed_calls as f64 / self.total_calls as f64
    }
}
