//! MQTT integration configuration.

use serde::Deserialize;

/// Configuration for the MQTT integration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Whether the daemon talks to a broker at all.
    pub enabled: bool,
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Base topic under which Zigbee2MQTT publishes device state.
    pub base_topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "thermodiff".to_string(),
            base_topic: "zigbee2mqtt".to_string(),
            keep_alive_secs: 30,
        }
    }
}
