mod client;
mod weather_response;

pub use client::{fetch_weather, new_client};

use crate::app_config::AppConfig;
use reqwest::Client;
use std::sync::Arc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, instrument, warn};

/// Refreshes the weather readout forever. Failures are logged and the previous report stays on display.
#[instrument(skip_all)]
pub async fn observe(client: Client, config: Arc<AppConfig>) {
    let mut ticker = interval(config.weather().refresh_interval_ms());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match fetch_weather(&client, &config).await {
            Ok(report) => match &report.icon_url {
                Some(icon_url) => info!(icon_url, "🌤️ {}", report),
                None => info!("🌤️ {}", report),
            },
            Err(e) => warn!("⚠️ Could not fetch the weather: {}", e),
        }
    }
}
