//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `thermodiff.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use thermodiff_adapter_mqtt::config::MqttConfig;
use thermodiff_domain::differential::{
    DEFAULT_COOLDOWN, DEFAULT_DIFFERENTIAL, DEFAULT_STABLE_FOR, DEFAULT_TIMEOUT,
    DifferentialConfig, OverlapPolicy,
};
use thermodiff_domain::error::ConfigurationError;
use thermodiff_domain::id::DeviceId;

pub const DEFAULT_LOG_FILTER: &str = "thermodiffd=info,thermodiff=info,tower_http=debug";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Settings shared by every controller.
    pub controller: ControllerConfig,
    /// Zigbee2MQTT connection.
    pub mqtt: MqttConfig,
    /// Simulated devices, used when MQTT is disabled.
    #[serde(rename = "virtual")]
    pub simulation: VirtualConfig,
    /// One entry per controlled thermostat.
    pub thermostats: Vec<ThermostatConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// What to do with triggers that arrive while a cycle is running.
    pub overlap: OverlapPolicy,
}

/// Virtual device simulation.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    pub enabled: bool,
    /// Room temperature every virtual thermostat starts at.
    pub initial_temperature: f64,
    /// Target every virtual thermostat starts with.
    pub initial_target: f64,
    /// Seconds between simulation steps.
    pub tick_secs: u64,
    /// Degrees a room warms (heating) or cools (idle) per step.
    pub drift_per_tick: f64,
}

/// One `[[thermostats]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ThermostatConfig {
    pub device: String,
    #[serde(default = "default_differential")]
    pub switching_differential: f64,
    #[serde(default)]
    pub delay_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Quiet period after a cycle that issued commands.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// How long a temperature change must stand before a cycle starts.
    #[serde(default = "default_stable_for_secs")]
    pub stable_for_secs: u64,
    /// Contact sensor whose open state blocks adjustments.
    #[serde(default)]
    pub window: Option<String>,
}

fn default_differential() -> f64 {
    DEFAULT_DIFFERENTIAL
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN.as_secs()
}

fn default_stable_for_secs() -> u64 {
    DEFAULT_STABLE_FOR.as_secs()
}

impl ThermostatConfig {
    /// Validate this entry into a controller configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for a blank device or window id, or
    /// any out-of-range value.
    pub fn to_differential(&self) -> Result<DifferentialConfig, ConfigurationError> {
        let mut builder = DifferentialConfig::builder(self.device.parse()?)
            .differential(self.switching_differential)
            .delay(Duration::from_secs(self.delay_secs))
            .timeout(Duration::from_secs(self.timeout_secs))
            .cooldown(Duration::from_secs(self.cooldown_secs))
            .stable_for(Duration::from_secs(self.stable_for_secs));
        if let Some(window) = &self.window {
            builder = builder.window(window.parse()?);
        }
        builder.build()
    }
}

impl Config {
    /// Load configuration from `thermodiff.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("thermodiff.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("THERMODIFF_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("THERMODIFF_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Some(val) = var("THERMODIFF_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("THERMODIFF_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("THERMODIFF_MQTT_HOST") {
            self.mqtt.broker_host = val;
            self.mqtt.enabled = true;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if !self.mqtt.enabled && self.simulation.enabled && self.simulation.tick_secs == 0 {
            return Err(ConfigError::Validation(
                "virtual tick_secs must be non-zero".to_string(),
            ));
        }
        if !self.mqtt.enabled && !self.simulation.enabled {
            return Err(ConfigError::Validation(
                "enable either [mqtt] or [virtual]".to_string(),
            ));
        }
        self.differential_configs()?;
        Ok(())
    }

    /// Validated controller configurations, one per `[[thermostats]]` entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Thermostat`] for the first invalid entry,
    /// including a device listed twice.
    pub fn differential_configs(&self) -> Result<Vec<DifferentialConfig>, ConfigError> {
        let mut seen: HashSet<DeviceId> = HashSet::new();
        let mut configs = Vec::with_capacity(self.thermostats.len());
        for entry in &self.thermostats {
            let config = entry.to_differential()?;
            if !seen.insert(config.device().clone()) {
                return Err(ConfigurationError::DuplicateDevice(config.device().clone()).into());
            }
            configs.push(config);
        }
        Ok(configs)
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_temperature: 20.5,
            initial_target: 21.0,
            tick_secs: 30,
            drift_per_tick: 0.05,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// A `[[thermostats]]` entry is invalid.
    #[error("invalid thermostat: {0}")]
    Thermostat(#[from] ConfigurationError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn with_thermostats(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.controller.overlap, OverlapPolicy::Ignore);
        assert!(!config.mqtt.enabled);
        assert!(config.simulation.enabled);
        assert!(config.thermostats.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_full_toml() {
        let config = with_thermostats(
            "
            [server]
            host = '127.0.0.1'
            port = 9090

            [logging]
            filter = 'debug'

            [controller]
            overlap = 'coalesce'

            [mqtt]
            enabled = true
            broker_host = 'broker.lan'
            base_topic = 'z2m'

            [virtual]
            enabled = false

            [[thermostats]]
            device = 'living_room_trv'
            switching_differential = 0.3
            delay_secs = 10
            timeout_secs = 300
            cooldown_secs = 90
            stable_for_secs = 0
            window = 'living_room_window'

            [[thermostats]]
            device = 'bedroom_trv'
        ",
        );
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.controller.overlap, OverlapPolicy::Coalesce);
        assert!(config.mqtt.enabled);
        assert_eq!(config.mqtt.broker_host, "broker.lan");
        assert_eq!(config.mqtt.base_topic, "z2m");
        assert!(!config.simulation.enabled);

        let configs = config.differential_configs().unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].device().as_str(), "living_room_trv");
        assert!((configs[0].differential().degrees() - 0.3).abs() < 1e-9);
        assert_eq!(configs[0].delay(), Duration::from_secs(10));
        assert_eq!(configs[0].timeout(), Duration::from_secs(300));
        assert_eq!(configs[0].cooldown(), Duration::from_secs(90));
        assert!(configs[0].stable_for().is_zero());
        assert_eq!(
            configs[0].window().map(DeviceId::as_str),
            Some("living_room_window")
        );
        assert!((configs[1].differential().degrees() - 0.5).abs() < 1e-9);
        assert_eq!(configs[1].timeout(), Duration::from_secs(120));
        assert_eq!(configs[1].cooldown(), Duration::from_secs(60));
        assert_eq!(configs[1].stable_for(), Duration::from_secs(15));
        assert_eq!(configs[1].window(), None);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_differential_out_of_range() {
        let config = with_thermostats(
            "
            [[thermostats]]
            device = 'climate.office'
            switching_differential = 5.5
        ",
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Thermostat(
                ConfigurationError::DifferentialOutOfRange { .. }
            ))
        ));
    }

    #[test]
    fn should_reject_cooldown_out_of_range() {
        let config = with_thermostats(
            "
            [[thermostats]]
            device = 'climate.office'
            cooldown_secs = 86400
        ",
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Thermostat(
                ConfigurationError::CooldownOutOfRange { secs: 86400, .. }
            ))
        ));
    }

    #[test]
    fn should_reject_duplicate_thermostats() {
        let config = with_thermostats(
            "
            [[thermostats]]
            device = 'climate.office'

            [[thermostats]]
            device = 'climate.office'
        ",
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Thermostat(ConfigurationError::DuplicateDevice(_)))
        ));
    }

    #[test]
    fn should_reject_blank_device() {
        let config = with_thermostats(
            "
            [[thermostats]]
            device = '  '
        ",
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Thermostat(ConfigurationError::EmptyDeviceId))
        ));
    }

    #[test]
    fn should_reject_missing_adapter() {
        let mut config = Config::default();
        config.simulation.enabled = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("THERMODIFF_BIND", "127.0.0.1:8088"),
            ("THERMODIFF_LOG", "trace"),
            ("THERMODIFF_MQTT_HOST", "mqtt.lan"),
        ]));
        assert_eq!(config.bind_addr(), "127.0.0.1:8088");
        assert_eq!(config.logging.filter, "trace");
        assert_eq!(config.mqtt.broker_host, "mqtt.lan");
        assert!(config.mqtt.enabled);
    }

    #[test]
    fn should_prefer_rust_log_over_thermodiff_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("THERMODIFF_LOG", "trace"), ("RUST_LOG", "warn")]));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_ignore_unparsable_port_override() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("THERMODIFF_PORT", "http")]));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_format_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
