//! Per-device controller configuration and its bounds.
//!
//! A [`DifferentialConfig`] can only be obtained through its builder, which
//! enforces every bound. Out-of-range values are configuration errors and
//! never reach the controller at runtime.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::id::DeviceId;

/// Smallest accepted switching differential, in degrees.
pub const MIN_DIFFERENTIAL: f64 = 0.1;
/// Largest accepted switching differential, in degrees.
pub const MAX_DIFFERENTIAL: f64 = 5.0;
/// Differentials are quantized to this step.
pub const DIFFERENTIAL_STEP: f64 = 0.1;

/// Longest accepted hold delay.
pub const MAX_DELAY: Duration = Duration::from_secs(3600);
/// Longest accepted flip timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);
/// Flip timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Quiet period after a completed cycle used when none is configured.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);
/// Longest accepted cooldown.
pub const MAX_COOLDOWN: Duration = Duration::from_secs(3600);
/// How long a trigger must stand before a cycle starts, when not configured.
pub const DEFAULT_STABLE_FOR: Duration = Duration::from_secs(15);
/// Longest accepted trigger stability window.
pub const MAX_STABLE_FOR: Duration = Duration::from_secs(3600);
/// Differential used when none is configured.
pub const DEFAULT_DIFFERENTIAL: f64 = 0.5;

/// A validated switching differential in `[0.1, 5.0]`, quantized to `0.1`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SwitchingDifferential(f64);

impl SwitchingDifferential {
    /// Quantize `value` to the nearest step, then range-check it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DifferentialOutOfRange`] when the
    /// quantized value is outside the bounds (NaN included).
    pub fn new(value: f64) -> Result<Self, ConfigurationError> {
        let steps = (value / DIFFERENTIAL_STEP).round();
        let quantized = steps / (1.0 / DIFFERENTIAL_STEP);
        if (MIN_DIFFERENTIAL..=MAX_DIFFERENTIAL).contains(&quantized) {
            Ok(Self(quantized))
        } else {
            Err(ConfigurationError::DifferentialOutOfRange {
                value,
                min: MIN_DIFFERENTIAL,
                max: MAX_DIFFERENTIAL,
            })
        }
    }

    /// The differential in degrees.
    #[must_use]
    pub fn degrees(self) -> f64 {
        self.0
    }
}

/// What to do with triggers that arrive while a device already has a cycle running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Drop them.
    #[default]
    Ignore,
    /// Collapse them into one re-evaluation once the running cycle ends.
    Coalesce,
}

/// Immutable configuration of one controlled thermostat.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentialConfig {
    device: DeviceId,
    differential: SwitchingDifferential,
    delay: Duration,
    timeout: Duration,
    cooldown: Duration,
    stable_for: Duration,
    window: Option<DeviceId>,
}

impl DifferentialConfig {
    /// Create a builder for the given thermostat.
    #[must_use]
    pub fn builder(device: DeviceId) -> DifferentialConfigBuilder {
        DifferentialConfigBuilder {
            device,
            differential: DEFAULT_DIFFERENTIAL,
            delay: Duration::ZERO,
            timeout: DEFAULT_TIMEOUT,
            cooldown: DEFAULT_COOLDOWN,
            stable_for: DEFAULT_STABLE_FOR,
            window: None,
        }
    }

    #[must_use]
    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    #[must_use]
    pub fn differential(&self) -> SwitchingDifferential {
        self.differential
    }

    /// How long the adjusted setpoint is held before the flip wait starts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Upper bound on the flip wait; restoration happens when it elapses.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Quiet period after a cycle that issued commands. Device triggers
    /// arriving within it are dropped, which keeps the device's report of
    /// the restored target from starting the next cycle.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// How long a device trigger must go unchanged before a cycle starts.
    #[must_use]
    pub fn stable_for(&self) -> Duration {
        self.stable_for
    }

    /// Window contact that blocks new adjustments while open.
    #[must_use]
    pub fn window(&self) -> Option<&DeviceId> {
        self.window.as_ref()
    }
}

/// Step-by-step builder for [`DifferentialConfig`].
#[derive(Debug)]
pub struct DifferentialConfigBuilder {
    device: DeviceId,
    differential: f64,
    delay: Duration,
    timeout: Duration,
    cooldown: Duration,
    stable_for: Duration,
    window: Option<DeviceId>,
}

impl DifferentialConfigBuilder {
    #[must_use]
    pub fn differential(mut self, degrees: f64) -> Self {
        self.differential = degrees;
        self
    }

    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    #[must_use]
    pub fn stable_for(mut self, stable_for: Duration) -> Self {
        self.stable_for = stable_for;
        self
    }

    #[must_use]
    pub fn window(mut self, window: DeviceId) -> Self {
        self.window = Some(window);
        self
    }

    /// Consume the builder, validate, and return a [`DifferentialConfig`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if any value is out of bounds.
    pub fn build(self) -> Result<DifferentialConfig, ConfigurationError> {
        let differential = SwitchingDifferential::new(self.differential)?;
        if self.delay > MAX_DELAY {
            return Err(ConfigurationError::DelayOutOfRange {
                secs: self.delay.as_secs(),
                max_secs: MAX_DELAY.as_secs(),
            });
        }
        if self.timeout.is_zero() || self.timeout > MAX_TIMEOUT {
            return Err(ConfigurationError::TimeoutOutOfRange {
                secs: self.timeout.as_secs(),
                max_secs: MAX_TIMEOUT.as_secs(),
            });
        }
        if self.cooldown > MAX_COOLDOWN {
            return Err(ConfigurationError::CooldownOutOfRange {
                secs: self.cooldown.as_secs(),
                max_secs: MAX_COOLDOWN.as_secs(),
            });
        }
        if self.stable_for > MAX_STABLE_FOR {
            return Err(ConfigurationError::StabilityOutOfRange {
                secs: self.stable_for.as_secs(),
                max_secs: MAX_STABLE_FOR.as_secs(),
            });
        }
        Ok(DifferentialConfig {
            device: self.device,
            differential,
            delay: self.delay,
            timeout: self.timeout,
            cooldown: self.cooldown,
            stable_for: self.stable_for,
            window: self.window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DeviceId {
        "climate.bedroom".parse().unwrap()
    }

    #[test]
    fn should_accept_lower_bound() {
        let d = SwitchingDifferential::new(0.1).unwrap();
        assert!((d.degrees() - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn should_accept_upper_bound() {
        let d = SwitchingDifferential::new(5.0).unwrap();
        assert!((d.degrees() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_quantize_to_nearest_step() {
        let d = SwitchingDifferential::new(0.34).unwrap();
        assert!((d.degrees() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn should_reject_value_below_range() {
        assert!(matches!(
            SwitchingDifferential::new(0.04),
            Err(ConfigurationError::DifferentialOutOfRange { .. })
        ));
    }

    #[test]
    fn should_reject_value_above_range() {
        assert!(SwitchingDifferential::new(5.1).is_err());
    }

    #[test]
    fn should_reject_nan() {
        assert!(SwitchingDifferential::new(f64::NAN).is_err());
    }

    #[test]
    fn should_build_with_defaults() {
        let config = DifferentialConfig::builder(device()).build().unwrap();
        assert_eq!(config.device(), &device());
        assert!((config.differential().degrees() - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.delay(), Duration::ZERO);
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.cooldown(), Duration::from_secs(60));
        assert_eq!(config.stable_for(), Duration::from_secs(15));
        assert!(config.window().is_none());
    }

    #[test]
    fn should_build_with_window() {
        let window: DeviceId = "binary_sensor.bedroom_window".parse().unwrap();
        let config = DifferentialConfig::builder(device())
            .window(window.clone())
            .build()
            .unwrap();
        assert_eq!(config.window(), Some(&window));
    }

    #[test]
    fn should_reject_delay_above_maximum() {
        let result = DifferentialConfig::builder(device())
            .delay(Duration::from_secs(3601))
            .build();
        assert!(matches!(
            result,
            Err(ConfigurationError::DelayOutOfRange { secs: 3601, .. })
        ));
    }

    #[test]
    fn should_accept_zero_cooldown_and_stability() {
        let config = DifferentialConfig::builder(device())
            .cooldown(Duration::ZERO)
            .stable_for(Duration::ZERO)
            .build()
            .unwrap();
        assert!(config.cooldown().is_zero());
        assert!(config.stable_for().is_zero());
    }

    #[test]
    fn should_reject_cooldown_above_maximum() {
        let result = DifferentialConfig::builder(device())
            .cooldown(Duration::from_secs(7200))
            .build();
        assert!(matches!(
            result,
            Err(ConfigurationError::CooldownOutOfRange { secs: 7200, .. })
        ));
    }

    #[test]
    fn should_reject_stability_window_above_maximum() {
        let result = DifferentialConfig::builder(device())
            .stable_for(Duration::from_secs(3601))
            .build();
        assert!(matches!(
            result,
            Err(ConfigurationError::StabilityOutOfRange { secs: 3601, .. })
        ));
    }

    #[test]
    fn should_reject_zero_timeout() {
        let result = DifferentialConfig::builder(device())
            .timeout(Duration::ZERO)
            .build();
        assert!(matches!(
            result,
            Err(ConfigurationError::TimeoutOutOfRange { .. })
        ));
    }

    #[test]
    fn should_reject_out_of_range_differential_at_build_time() {
        let result = DifferentialConfig::builder(device())
            .differential(7.5)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn should_default_overlap_policy_to_ignore() {
        assert_eq!(OverlapPolicy::default(), OverlapPolicy::Ignore);
    }

    #[test]
    fn should_deserialize_overlap_policy() {
        let policy: OverlapPolicy = serde_json::from_str("\"coalesce\"").unwrap();
        assert_eq!(policy, OverlapPolicy::Coalesce);
    }
}
