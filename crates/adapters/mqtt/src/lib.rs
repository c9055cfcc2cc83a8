//! # thermodiff-adapter-mqtt
//!
//! MQTT adapter: talks to thermostats and window contacts exposed by
//! Zigbee2MQTT.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker and (re-)subscribe on every connection
//! - Cache the latest state per device and publish diff events on the bus
//! - Serve [`StateSource`] from the cache
//! - Publish set-target commands ([`CommandSink`])
//!
//! ## Dependency rule
//! Same as other adapters: depends on `thermodiff-app` and `thermodiff-domain`.

pub mod cache;
pub mod config;
pub mod error;
pub mod payload;
pub mod topics;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, Incoming, MqttOptions, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use thermodiff_app::ports::{CommandSink, EventPublisher, StateSource};
use thermodiff_app::shutdown::ShutdownSignal;
use thermodiff_domain::error::{CommandFailure, NotFoundError, ThermodiffError};
use thermodiff_domain::event::Event;
use thermodiff_domain::id::DeviceId;
use thermodiff_domain::thermostat::ThermostatReading;

use cache::DeviceCache;
use config::MqttConfig;
use error::MqttError;
use payload::{StatePayload, parse_availability, setpoint_command};
use topics::{Topic, Topics};

const REQUEST_CAPACITY: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const MIN_KEEP_ALIVE_SECS: u16 = 5;

/// Cache plus topic layout; turns incoming messages into events.
#[derive(Debug)]
pub struct MessageHandler {
    topics: Topics,
    cache: Mutex<DeviceCache>,
}

impl MessageHandler {
    #[must_use]
    pub fn new(topics: Topics) -> Self {
        Self {
            topics,
            cache: Mutex::default(),
        }
    }

    /// Update the cache from one message and return the resulting events.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::PayloadParse`] when a state message is not JSON.
    pub fn handle(&self, topic: &str, body: &[u8]) -> Result<Vec<Event>, MqttError> {
        let Some(topic) = self.topics.parse(topic) else {
            return Ok(Vec::new());
        };
        let events = match topic {
            Topic::State(device) => {
                let state = StatePayload::parse(body)?;
                let changes = self.lock().apply_state(&device, &state);
                changes
                    .into_iter()
                    .map(|kind| Event::new(device.clone(), kind))
                    .collect()
            }
            Topic::Availability(device) => match parse_availability(body) {
                Some(available) => self
                    .lock()
                    .apply_availability(&device, available)
                    .into_iter()
                    .map(|kind| Event::new(device.clone(), kind))
                    .collect(),
                None => {
                    debug!(device = %device, "ignoring unrecognised availability payload");
                    Vec::new()
                }
            },
            Topic::BridgeState => match parse_availability(body) {
                Some(true) => {
                    info!("bridge online, re-evaluating every thermostat");
                    vec![Event::started()]
                }
                _ => Vec::new(),
            },
        };
        Ok(events)
    }

    #[must_use]
    pub fn reading(&self, device: &DeviceId) -> Option<ThermostatReading> {
        self.lock().reading(device)
    }

    #[must_use]
    pub fn window_open(&self, device: &DeviceId) -> Option<bool> {
        self.lock().window_open(device)
    }

    fn lock(&self) -> MutexGuard<'_, DeviceCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Connection to a Zigbee2MQTT broker. Clones share the client and cache.
#[derive(Clone)]
pub struct MqttIntegration {
    client: AsyncClient,
    topics: Topics,
    handler: Arc<MessageHandler>,
}

impl MqttIntegration {
    /// Create the client and spawn the task driving its event loop.
    ///
    /// The task publishes an event for every observed change and stops
    /// once `shutdown` fires.
    pub fn connect<P>(
        config: &MqttConfig,
        publisher: P,
        shutdown: ShutdownSignal,
    ) -> (Self, JoinHandle<()>)
    where
        P: EventPublisher + 'static,
    {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(
            config.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS),
        )));
        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);

        let topics = Topics::new(&config.base_topic);
        let integration = Self {
            client,
            handler: Arc::new(MessageHandler::new(topics.clone())),
            topics,
        };
        info!(
            host = %config.broker_host,
            port = config.broker_port,
            base_topic = %config.base_topic,
            "connecting to MQTT broker"
        );
        let task = tokio::spawn(integration.clone().run(event_loop, publisher, shutdown));
        (integration, task)
    }

    async fn run<P: EventPublisher>(
        self,
        mut event_loop: EventLoop,
        publisher: P,
        mut shutdown: ShutdownSignal,
    ) {
        loop {
            let notification = tokio::select! {
                () = shutdown.triggered() => break,
                notification = event_loop.poll() => notification,
            };
            match notification {
                Ok(rumqttc::Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("connected to MQTT broker");
                    self.subscribe();
                }
                Ok(rumqttc::Event::Incoming(Incoming::Publish(message))) => {
                    match self.handler.handle(&message.topic, &message.payload) {
                        Ok(events) => {
                            for event in events {
                                if let Err(err) = publisher.publish(event).await {
                                    warn!(error = %err, "failed to publish device event");
                                }
                            }
                        }
                        Err(err) => {
                            debug!(topic = %message.topic, error = %err, "ignoring MQTT message");
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "MQTT connection error, retrying");
                    tokio::select! {
                        () = shutdown.triggered() => break,
                        () = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                }
            }
        }
        if let Err(err) = self.client.try_disconnect() {
            debug!(error = %err, "MQTT disconnect failed");
        }
        debug!("MQTT event loop stopped");
    }

    fn subscribe(&self) {
        for filter in self.topics.subscriptions() {
            // The event loop task must not block on its own request queue.
            if let Err(err) = self.client.try_subscribe(filter.as_str(), QoS::AtLeastOnce) {
                warn!(filter = %filter, error = %err, "failed to subscribe");
            }
        }
    }
}

impl StateSource for MqttIntegration {
    async fn read(&self, device: &DeviceId) -> Result<ThermostatReading, ThermodiffError> {
        self.handler.reading(device).ok_or_else(|| {
            NotFoundError {
                entity: "Thermostat",
                id: device.to_string(),
            }
            .into()
        })
    }

    async fn window_open(&self, sensor: &DeviceId) -> Result<bool, ThermodiffError> {
        self.handler.window_open(sensor).ok_or_else(|| {
            NotFoundError {
                entity: "Window",
                id: sensor.to_string(),
            }
            .into()
        })
    }
}

impl CommandSink for MqttIntegration {
    async fn set_target(&self, device: &DeviceId, temperature: f64) -> Result<(), CommandFailure> {
        debug!(device = %device, temperature, "publishing setpoint");
        self.client
            .publish(
                self.topics.set(device),
                QoS::AtLeastOnce,
                false,
                setpoint_command(temperature),
            )
            .await
            .map_err(|err| CommandFailure::new(device.clone(), temperature, MqttError::Client(err)))
    }
}
