//! # thermodiffd, the thermodiff daemon
//!
//! Composition root that wires the controllers to an adapter and starts the
//! status server.
//!
//! ## Responsibilities
//! - Load configuration (`thermodiff.toml` + env vars)
//! - Initialise tracing
//! - Connect the MQTT adapter, or seed virtual devices when MQTT is disabled
//! - Spawn the supervisor and trigger an initial evaluation
//! - Serve the HTTP status API
//! - Handle graceful shutdown (SIGTERM/SIGINT): restore pending targets
//!   before the adapter goes away
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer, no domain logic belongs here.

mod config;

use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use thermodiff_adapter_http_axum::router;
use thermodiff_adapter_http_axum::state::AppState;
use thermodiff_adapter_mqtt::MqttIntegration;
use thermodiff_adapter_virtual::{VirtualHub, VirtualThermostat, VirtualWindow};
use thermodiff_app::event_bus::InProcessEventBus;
use thermodiff_app::ports::{CommandSink, EventPublisher, StateSource};
use thermodiff_app::shutdown::Shutdown;
use thermodiff_app::supervisor::Supervisor;
use thermodiff_domain::differential::DifferentialConfig;
use thermodiff_domain::event::Event;

use config::{Config, DEFAULT_LOG_FILTER};

const EVENT_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {:?}: {err}", config.logging.filter);
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let controllers = config.differential_configs()?;
    if controllers.is_empty() {
        warn!("no [[thermostats]] configured, nothing to control");
    }

    let bus = InProcessEventBus::new(EVENT_CAPACITY);
    let background = Shutdown::new();

    if config.mqtt.enabled {
        let (mqtt, task) = MqttIntegration::connect(&config.mqtt, bus.clone(), background.signal());
        run(&config, controllers, mqtt, bus, background, vec![task]).await
    } else {
        let hub = VirtualHub::new(bus.clone());
        seed_virtual_devices(&hub, &config, &controllers);
        let task = hub.spawn_simulation(
            Duration::from_secs(config.simulation.tick_secs),
            config.simulation.drift_per_tick,
            background.signal(),
        );
        info!(devices = controllers.len(), "running against virtual devices");
        run(&config, controllers, hub, bus, background, vec![task]).await
    }
}

fn seed_virtual_devices(
    hub: &VirtualHub<InProcessEventBus>,
    config: &Config,
    controllers: &[DifferentialConfig],
) {
    for controller in controllers {
        hub.add_thermostat(
            controller.device().clone(),
            VirtualThermostat::new(
                config.simulation.initial_temperature,
                config.simulation.initial_target,
            ),
        );
        if let Some(window) = controller.window() {
            hub.add_window(window.clone(), VirtualWindow::default());
        }
    }
}

async fn run<A>(
    config: &Config,
    controllers: Vec<DifferentialConfig>,
    adapter: A,
    bus: InProcessEventBus,
    background: Shutdown,
    tasks: Vec<JoinHandle<()>>,
) -> anyhow::Result<()>
where
    A: StateSource + CommandSink + Clone + 'static,
{
    let supervisor = Supervisor::spawn(
        controllers,
        config.controller.overlap,
        adapter.clone(),
        adapter,
        bus.clone(),
    )?;
    bus.publish(Event::started()).await?;

    let app = router::build(AppState::new(supervisor.status()));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "thermodiffd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down, restoring pending targets");
    supervisor.shutdown().await;
    background.trigger();
    for task in tasks {
        if let Err(err) = task.await {
            warn!(error = %err, "background task failed");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
