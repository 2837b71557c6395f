use crate::app_config::AppConfig;
use crate::client::UtilitySyncClient;
use crate::domain::events::Event;
use crate::store::Store;
use crate::store_listener::store_listener;
use crate::ws::CommandDispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tokio::{select, signal, task, time};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app_config;
mod client;
mod console;
mod domain;
mod message_reducer;
mod pending_updates;
mod poller;
mod render;
mod store;
mod store_listener;
mod weather;
mod ws;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Arc::new(AppConfig::load()?);
    info!("✅  Loaded configuration");

    let (events_tx, events_rx) = mpsc::channel::<Event>(config.core().event_buffer_size());
    let mut store = Store::new(events_rx, config.device().error_policy());
    let notifier_rx = store.notifier();
    let snapshot_rx = store.notifier();

    task::spawn(async move {
        store_listener(notifier_rx).await;
    });
    info!("✅  Initialized store listener");

    task::spawn(async move {
        store.listen().await;
    });
    info!("✅  Initialized store");

    let (link_tx, link_rx) = watch::channel(None);
    let dispatcher = CommandDispatcher::new(link_rx, events_tx.clone(), config.device().request_ids());

    let ws_config = ws::Config {
        url: config.device().url().to_string(),
        retry_ms: config.device().retry_ms(),
        retry_max_delay: config.device().retry_max_delay_ms(),
        stale_connection_timeout: config.device().stale_connection_timeout_ms(),
        buffer_size: config.core().event_buffer_size(),
    };
    let connection_dispatcher = dispatcher.clone();
    let mut connection = task::spawn(async move { ws::connect(link_tx, connection_dispatcher, events_tx, &ws_config).await });
    info!("✅  Initialized device connection");

    let poll_dispatcher = dispatcher.clone();
    let poll_interval = config.device().poll_interval_ms();
    task::spawn(async move {
        poller::poll(poll_dispatcher, poll_interval).await;
    });
    info!("✅  Initialized poller");

    if config.weather().api_key().is_empty() {
        info!("🌥️ No weather API key configured, weather readout disabled");
    } else {
        let weather_client = weather::new_client()?;
        let weather_config = Arc::clone(&config);
        task::spawn(async move {
            weather::observe(weather_client, weather_config).await;
        });
        info!("✅  Initialized weather observer");
    }

    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));

    let client = UtilitySyncClient::new(dispatcher.clone(), snapshot_rx);
    select! {
        result = console::run(BufReader::new(tokio::io::stdin()), &client) => result?,
        result = signal::ctrl_c() => {
            result?;
            info!("👋 Interrupted");
        }
    }

    dispatcher.close().await;
    match time::timeout(SHUTDOWN_TIMEOUT, &mut connection).await {
        Ok(Ok(Ok(()))) => info!("✅  Device connection closed"),
        Ok(Ok(Err(e))) => warn!("⚠️ Device connection ended with an error: {}", e),
        Ok(Err(e)) => warn!("⚠️ Device connection task failed: {}", e),
        Err(_) => {
            warn!("⚠️ Device connection did not close in time");
            connection.abort();
        }
    }

    Ok(())
}
