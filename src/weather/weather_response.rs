use serde::Deserialize;
use std::fmt::Display;

const ZERO_CELSIUS_IN_KELVIN: f64 = 273.15;

#[derive(Debug, Deserialize)]
pub struct WeatherResponse {
    pub main: Main,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct Main {
    /// In Kelvin.
    pub temp: f64,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub icon: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeatherReport {
    pub celsius: f64,
    pub icon_url: Option<String>,
}

impl WeatherReport {
    pub fn from_response(response: WeatherResponse, icon_base_url: &str) -> Self {
        WeatherReport {
            celsius: response.main.temp - ZERO_CELSIUS_IN_KELVIN,
            icon_url: response
                .weather
                .first()
                .map(|condition| format!("{}/{}.png", icon_base_url.trim_end_matches('/'), condition.icon)),
        }
    }
}

impl Display for WeatherReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Weather: {:.0} °C", self.celsius)
    }
}
