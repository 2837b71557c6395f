use crate::domain::{ErrorPolicy, GeoLocation};
use config::{Config, ConfigError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    core: Core,
    device: Device,
    weather: Weather,
    location: GeoLocation,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    fn load_from(name: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::with_name(name).required(true))
            .add_source(config::File::with_name(&format!("{}_local", name)).required(false))
            .add_source(config::Environment::with_prefix("UTILITY_SYNC").separator("__"))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Rejects values that would make a channel or a timer panic at runtime.
    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("core.event_buffer_size", self.core.event_buffer_size as u64),
            ("device.retry_ms", self.device.retry_ms),
            ("device.stale_connection_timeout_ms", self.device.stale_connection_timeout_ms),
            ("device.poll_interval_ms", self.device.poll_interval_ms),
            ("weather.refresh_interval_ms", self.weather.refresh_interval_ms),
        ];

        match positive.iter().find(|(_, value)| *value == 0) {
            Some((key, _)) => Err(ConfigError::Message(format!("{} must be greater than 0", key))),
            None => Ok(()),
        }
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn weather(&self) -> &Weather {
        &self.weather
    }

    pub fn geo_location(&self) -> &GeoLocation {
        &self.location
    }
}

#[derive(Debug, Deserialize)]
pub struct Core {
    event_buffer_size: usize,
}

impl Core {
    pub fn event_buffer_size(&self) -> usize {
        self.event_buffer_size
    }
}

#[derive(Debug, Deserialize)]
pub struct Device {
    url: String,
    retry_ms: u64,
    retry_max_delay_ms: u64,
    stale_connection_timeout_ms: u64,
    poll_interval_ms: u64,
    #[serde(default)]
    request_ids: bool,
    #[serde(default)]
    error_policy: ErrorPolicy,
}

impl Device {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    pub fn retry_max_delay_ms(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn stale_connection_timeout_ms(&self) -> Duration {
        Duration::from_millis(self.stale_connection_timeout_ms)
    }

    pub fn poll_interval_ms(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_ids(&self) -> bool {
        self.request_ids
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }
}

#[derive(Debug, Deserialize)]
pub struct Weather {
    url: String,
    icon_url: String,
    api_key: String,
    refresh_interval_ms: u64,
}

impl Weather {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn icon_url(&self) -> &str {
        &self.icon_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn refresh_interval_ms(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core { event_buffer_size: 16 },
                device: Device {
                    url: "ws://127.0.0.1:8000".to_string(),
                    retry_ms: 10,
                    retry_max_delay_ms: 50,
                    stale_connection_timeout_ms: 30_000,
                    poll_interval_ms: 5_000,
                    request_ids: false,
                    error_policy: ErrorPolicy::Rollback,
                },
                weather: Weather {
                    url: "https://weather.url".to_string(),
                    icon_url: "https://weather.url/img/wn".to_string(),
                    api_key: "key".to_string(),
                    refresh_interval_ms: 600_000,
                },
                location: GeoLocation {
                    latitude: 47.14,
                    longitude: 7.25,
                },
            },
        }
    }

    pub fn weather_url(mut self, url: String) -> Self {
        self.config.weather.url = url;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
