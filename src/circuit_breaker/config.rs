//! Circuit breaker configuration.

use crate::core::{ConfigError, ConfigResult};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a circuit breaker.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Maximum duration of a single protected call before it counts as a timeout.
    pub call_timeout: Duration,

    /// Error rate (0-100) in the rolling window at which the circuit opens.
    pub error_threshold_percentage: f64,

    /// How long the circuit stays open before a probe is allowed.
    pub reset_timeout: Duration,

    /// Number of outcomes the window must hold before the circuit may open.
    pub minimum_samples: u32,

    /// Retention horizon of the rolling window.
    pub rolling_window: Duration,

    /// Hard cap on the number of outcomes kept in the window.
    pub max_window_entries: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(3),
            error_threshold_percentage: 50.0,
            reset_timeout: Duration::from_secs(10),
            minimum_samples: 4,
            rolling_window: Duration::from_secs(10),
            max_window_entries: 1024,
        }
    }
}

impl CircuitBreakerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the error threshold percentage.
    pub fn with_error_threshold_percentage(mut self, percentage: f64) -> Self {
        self.error_threshold_percentage = percentage;
        self
    }

    /// Sets the reset timeout.
    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    /// Sets the minimum sample size.
    pub fn with_minimum_samples(mut self, samples: u32) -> Self {
        self.minimum_samples = samples;
        self
    }

    /// Sets the rolling window retention horizon.
    pub fn with_rolling_window(mut self, window: Duration) -> Self {
        self.rolling_window = window;
        self
    }

    /// Sets the cap on window entries.
    pub fn with_max_window_entries(mut self, max: usize) -> Self {
        self.max_window_entries = max;
        self
    }

    /// Creates a configuration that trips early and recovers slowly.
    ///
    /// This configuration:
    /// - Opens at a 25% error rate over at least 3 calls
    /// - Keeps circuits open longer (60 seconds)
    /// - Uses a short call timeout (1 second)
    pub fn strict() -> Self {
        Self {
            call_timeout: Duration::from_secs(1),
            error_threshold_percentage: 25.0,
            reset_timeout: Duration::from_secs(60),
            minimum_samples: 3,
            ..Self::default()
        }
    }

    /// Creates a configuration optimized for high availability.
    ///
    /// This configuration:
    /// - Opens only at a 75% error rate over at least 20 calls
    /// - Probes again after 5 seconds
    /// - Tolerates slower calls (10 seconds)
    pub fn high_availability() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            error_threshold_percentage: 75.0,
            reset_timeout: Duration::from_secs(5),
            minimum_samples: 20,
            rolling_window: Duration::from_secs(30),
            ..Self::default()
        }
    }

    /// Parses and validates a JSON options document.
    ///
    /// ```rust
    /// use breakwater::CircuitBreakerConfig;
    ///
    /// let config = CircuitBreakerConfig::from_json(
    ///     r#"{ "callTimeout": 3500, "errorThresholdPercentage": 50, "resetTimeout": 10000 }"#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.minimum_samples, 4);
    /// ```
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let options: BreakerOptions = serde_json::from_str(json)?;
        Self::try_from(options)
    }

    /// Checks that every option is within its allowed range.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=100.0).contains(&self.error_threshold_percentage) {
            return Err(ConfigError::ThresholdOutOfRange(
                self.error_threshold_percentage,
            ));
        }
        if self.minimum_samples == 0 {
            return Err(ConfigError::ZeroMinimumSamples);
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                option: "call_timeout",
            });
        }
        if self.reset_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                option: "reset_timeout",
            });
        }
        if self.rolling_window.is_zero() {
            return Err(ConfigError::ZeroDuration {
                option: "rolling_window",
            });
        }
        if self.max_window_entries == 0 {
            return Err(ConfigError::ZeroWindowCapacity);
        }
        Ok(())
    }
}

/// Serializable breaker options, with durations in milliseconds.
///
/// Option names follow the camelCase convention used by HTTP-facing
/// configuration files. Missing options take the defaults of
/// [`CircuitBreakerConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct BreakerOptions {
    /// Call timeout in milliseconds.
    pub call_timeout: u64,
    /// Error threshold percentage (0-100).
    pub error_threshold_percentage: f64,
    /// Reset timeout in milliseconds.
    pub reset_timeout: u64,
    /// Minimum sample size before the circuit may open.
    pub minimum_samples: u32,
    /// Rolling window horizon in milliseconds.
    pub rolling_window: u64,
    /// Cap on window entries.
    pub max_window_entries: usize,
}

impl Default for BreakerOptions {
    fn default() -> Self {
        Self::from(&CircuitBreakerConfig::default())
    }
}

impl From<&CircuitBreakerConfig> for BreakerOptions {
    fn from(config: &CircuitBreakerConfig) -> Self {
        Self {
            call_timeout: saturating_millis(config.call_timeout),
            error_threshold_percentage: config.error_threshold_percentage,
            reset_timeout: saturating_millis(config.reset_timeout),
            minimum_samples: config.minimum_samples,
            rolling_window: saturating_millis(config.rolling_window),
            max_window_entries: config.max_window_entries,
        }
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl TryFrom<BreakerOptions> for CircuitBreakerConfig {
    type Error = ConfigError;

    fn try_from(options: BreakerOptions) -> Result<Self, Self::Error> {
        let config = Self {
            call_timeout: Duration::from_millis(options.call_timeout),
            error_threshold_percentage: options.error_threshold_percentage,
            reset_timeout: Duration::from_millis(options.reset_timeout),
            minimum_samples: options.minimum_samples,
            rolling_window: Duration::from_millis(options.rolling_window),
            max_window_entries: options.max_window_entries,
        };
        config.validate()?;
        Ok(config)
    }
}
