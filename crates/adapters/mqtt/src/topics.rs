//! Zigbee2MQTT topic layout.
//!
//! - `<base>/<device>` carries the device state as JSON
//! - `<base>/<device>/availability` carries `online` / `offline`
//! - `<base>/<device>/set` accepts commands
//! - `<base>/bridge/state` reports the bridge itself

use thermodiff_domain::id::DeviceId;

const BRIDGE: &str = "bridge";

/// What an incoming topic refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    State(DeviceId),
    Availability(DeviceId),
    BridgeState,
}

/// Topic names under one base prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    base: String,
}

impl Topics {
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Filters to subscribe to.
    #[must_use]
    pub fn subscriptions(&self) -> [String; 3] {
        [
            format!("{}/+", self.base),
            format!("{}/+/availability", self.base),
            format!("{}/{BRIDGE}/state", self.base),
        ]
    }

    #[must_use]
    pub fn set(&self, device: &DeviceId) -> String {
        format!("{}/{device}/set", self.base)
    }

    /// Classify an incoming topic. Returns `None` for anything this adapter
    /// does not consume.
    #[must_use]
    pub fn parse(&self, topic: &str) -> Option<Topic> {
        let rest = topic.strip_prefix(&self.base)?.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let name = parts.next()?;
        let suffix = parts.next();
        if parts.next().is_some() {
            return None;
        }
        match (name, suffix) {
            (BRIDGE, Some("state")) => Some(Topic::BridgeState),
            (BRIDGE, _) => None,
            (name, None) => name.parse().ok().map(Topic::State),
            (name, Some("availability")) => name.parse().ok().map(Topic::Availability),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Topics {
        Topics::new("zigbee2mqtt/")
    }

    fn device(name: &str) -> DeviceId {
        name.parse().unwrap()
    }

    #[test]
    fn should_build_command_topic() {
        assert_eq!(topics().set(&device("bedroom_trv")), "zigbee2mqtt/bedroom_trv/set");
    }

    #[test]
    fn should_list_subscriptions() {
        assert_eq!(
            topics().subscriptions(),
            [
                "zigbee2mqtt/+".to_string(),
                "zigbee2mqtt/+/availability".to_string(),
                "zigbee2mqtt/bridge/state".to_string(),
            ]
        );
    }

    #[test]
    fn should_parse_state_topic() {
        assert_eq!(
            topics().parse("zigbee2mqtt/bedroom_trv"),
            Some(Topic::State(device("bedroom_trv")))
        );
    }

    #[test]
    fn should_parse_availability_topic() {
        assert_eq!(
            topics().parse("zigbee2mqtt/bedroom_trv/availability"),
            Some(Topic::Availability(device("bedroom_trv")))
        );
    }

    #[test]
    fn should_parse_bridge_state_topic() {
        assert_eq!(topics().parse("zigbee2mqtt/bridge/state"), Some(Topic::BridgeState));
        assert_eq!(topics().parse("zigbee2mqtt/bridge"), None);
    }

    #[test]
    fn should_ignore_commands_and_foreign_topics() {
        assert_eq!(topics().parse("zigbee2mqtt/bedroom_trv/set"), None);
        assert_eq!(topics().parse("zigbee2mqtt/a/b/c"), None);
        assert_eq!(topics().parse("other/bedroom_trv"), None);
        assert_eq!(topics().parse("zigbee2mqttx/bedroom_trv"), None);
    }
}
