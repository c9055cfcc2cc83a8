//! Zigbee2MQTT payloads.

use serde::{Deserialize, Deserializer};

use thermodiff_domain::thermostat::HvacAction;

use crate::error::MqttError;

/// The subset of a device state message this adapter reads. Every field is
/// optional: thermostats and contact sensors publish different subsets.
///
/// Temperatures distinguish a missing key (`None`) from an explicit `null`
/// (`Some(None)`), which clears the cached value.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct StatePayload {
    #[serde(default, deserialize_with = "present")]
    pub local_temperature: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub occupied_heating_setpoint: Option<Option<f64>>,
    pub running_state: Option<String>,
    /// `false` means the contact is open.
    pub contact: Option<bool>,
}

impl StatePayload {
    /// Parse a state message.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::PayloadParse`] when the body is not a JSON object.
    pub fn parse(body: &[u8]) -> Result<Self, MqttError> {
        serde_json::from_slice(body).map_err(MqttError::PayloadParse)
    }

    /// The hvac action, if the message reports one.
    #[must_use]
    pub fn hvac_action(&self) -> Option<HvacAction> {
        self.running_state.as_deref().map(|state| match state {
            "heat" | "heating" => HvacAction::Heating,
            "idle" => HvacAction::Idle,
            _ => HvacAction::Unknown,
        })
    }

    /// Whether this message comes from a contact sensor, and its state.
    #[must_use]
    pub fn window_open(&self) -> Option<bool> {
        self.contact.map(|closed| !closed)
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
struct AvailabilityPayload {
    state: String,
}

/// Parse an availability message: either plain `online` / `offline` or
/// `{"state": "online"}`. Returns `None` for anything else.
#[must_use]
pub fn parse_availability(body: &[u8]) -> Option<bool> {
    let text = std::str::from_utf8(body).ok()?.trim();
    let state = match serde_json::from_str::<AvailabilityPayload>(text) {
        Ok(payload) => payload.state,
        Err(_) => text.to_string(),
    };
    match state.as_str() {
        "online" => Some(true),
        "offline" => Some(false),
        _ => None,
    }
}

/// Body of a set-target command.
#[must_use]
pub fn setpoint_command(temperature: f64) -> Vec<u8> {
    serde_json::json!({ "occupied_heating_setpoint": temperature })
        .to_string()
        .into_bytes()
}
