//! MQTT adapter error types.

use thermodiff_domain::error::ThermodiffError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// Failed to parse an incoming MQTT payload as JSON.
    #[error("failed to parse MQTT payload")]
    PayloadParse(#[source] serde_json::Error),
}

impl From<MqttError> for ThermodiffError {
    fn from(err: MqttError) -> Self {
        ThermodiffError::Adapter(Box::new(err))
    }
}
