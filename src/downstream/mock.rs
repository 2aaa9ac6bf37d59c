//! Mock protected call for testing.
//!
//! This module provides a configurable fake downstream operation that can
//! be used in tests and demos to simulate successes, failures and slow
//! responses without a real remote service.

use crate::core::ProtectedCall;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// The error returned by a [`MockCall`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{operation}' failed: {reason}")]
pub struct MockError {
    /// Name of the mock operation.
    pub operation: String,
    /// Why the call failed.
    pub reason: String,
}

impl MockError {
    /// Creates a new mock error.
    pub fn new(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// One scripted response of a [`MockCall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStep {
    /// Return the input immediately.
    Succeed,
    /// Return an error immediately.
    Fail,
    /// Return the input after the given delay.
    Slow(Duration),
    /// Return an error after the given delay.
    SlowFail(Duration),
}

/// A mock protected call that echoes its input.
///
/// Responses come from a script first; once it runs out, the mock fails
/// according to its fail rate and otherwise succeeds after its latency.
///
/// # Examples
///
/// ```rust
/// use breakwater::downstream::{MockCall, MockStep};
/// use std::time::Duration;
///
/// // Always succeeds
/// let call = MockCall::new();
///
/// // Fails twice, then succeeds slowly
/// let call = MockCall::new()
///     .with_script([MockStep::Fail, MockStep::Fail])
///     .with_latency(Duration::from_millis(100));
/// ```
#[derive(Debug)]
pub struct MockCall {
    /// Name of this operation.
    name: String,
    /// Responses consumed in order before the defaults apply.
    script: Mutex<VecDeque<MockStep>>,
    /// Simulated latency for unscripted calls.
    latency: Option<Duration>,
    /// Probability of failure (0.0 to 1.0) for unscripted calls.
    fail_rate: f32,
    /// Number of invocations started.
    call_count: AtomicU64,
    /// Number of invocations that ran to completion.
    completed_count: AtomicU64,
}

impl MockCall {
    /// Creates a mock that always succeeds immediately.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            script: Mutex::new(VecDeque::new()),
            latency: None,
            fail_rate: 0.0,
            call_count: AtomicU64::new(0),
            completed_count: AtomicU64::new(0),
        }
    }

    /// Creates a mock that always fails.
    pub fn failing() -> Self {
        Self::new().with_fail_rate(1.0)
    }

    /// Sets the name of this operation.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the scripted responses.
    pub fn with_script(self, steps: impl IntoIterator<Item = MockStep>) -> Self {
        self.lock_script().extend(steps);
        self
    }

    /// Sets the simulated latency for unscripted calls.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Sets the probability of failure for unscripted calls.
    pub fn with_fail_rate(mut self, rate: f32) -> Self {
        self.fail_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Appends a scripted response.
    pub fn push(&self, step: MockStep) {
        self.lock_script().push_back(step);
    }

    /// Returns the number of invocations started.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Returns the number of invocations that ran to completion.
    ///
    /// Invocations dropped by a timeout never complete.
    pub fn completed_count(&self) -> u64 {
        self.completed_count.load(Ordering::SeqCst)
    }

    fn next_step(&self, count: u64) -> MockStep {
        if let Some(step) = self.lock_script().pop_front() {
            return step;
        }
        let fail = self.should_fail(count);
        match (self.latency, fail) {
            (None, false) => MockStep::Succeed,
            (None, true) => MockStep::Fail,
            (Some(latency), false) => MockStep::Slow(latency),
            (Some(latency), true) => MockStep::SlowFail(latency),
        }
    }

    fn should_fail(&self, count: u64) -> bool {
        if self.fail_rate <= 0.0 {
            return false;
        }
        if self.fail_rate >= 1.0 {
            return true;
        }
        // Simple deterministic "randomness" based on call count
        (count as f32 * 0.618_034) % 1.0 < self.fail_rate
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<MockStep>> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockCall {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtectedCall for MockCall {
    type Input = u64;
    type Output = u64;
    type Error = MockError;

    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, input: u64) -> Result<u64, MockError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);

        let result = match self.next_step(count) {
            MockStep::Succeed => Ok(input),
            MockStep::Fail => Err(MockError::new(&self.name, "simulated failure")),
            MockStep::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(input)
            }
            MockStep::SlowFail(delay) => {
                tokio::time::sleep(delay).await;
                Err(MockError::new(&self.name, "simulated slow failure"))
            }
        };

        self.completed_count.fetch_add(1, Ordering::SeqCst);
        result
    }
}
