use crate::app_config::AppConfig;
use crate::weather::weather_response::{WeatherReport, WeatherResponse};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn new_client() -> Result<Client, WeatherError> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(client)
}

#[instrument(skip_all)]
pub async fn fetch_weather(client: &Client, config: &AppConfig) -> Result<WeatherReport, WeatherError> {
    info!("Retrieving weather...");

    let location = config.geo_location();
    let response = client
        .get(format!("{}/data/2.5/weather", config.weather().url()))
        .query(&[
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("appid", config.weather().api_key().to_string()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let weather_response = response.json::<WeatherResponse>().await?;
    let report = WeatherReport::from_response(weather_response, config.weather().icon_url());
    info!("Retrieving weather... OK, {}", report);

    Ok(report)
}

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::AppConfigBuilder;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn fetch_weather_returns_the_report_for_the_configured_location() -> Result<(), WeatherError> {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("lat".into(), "47.14".into()),
                Matcher::UrlEncoded("lon".into(), "7.25".into()),
                Matcher::UrlEncoded("appid".into(), "key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(include_str!("../../tests/resources/weather_response.json"))
            .create_async()
            .await;

        let config = AppConfigBuilder::new().weather_url(server.url()).build();
        let report = fetch_weather(&new_client()?, &config).await?;

        mock.assert();
        assert_eq!(report.to_string(), "Weather: 22 °C");
        assert_eq!(report.icon_url.as_deref(), Some("https://weather.url/img/wn/04d.png"));
        Ok(())
    }

    #[tokio::test]
    async fn fetch_weather_fails_on_an_error_status() -> Result<(), WeatherError> {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"cod":401,"message":"Invalid API key"}"#)
            .create_async()
            .await;

        let config = AppConfigBuilder::new().weather_url(server.url()).build();
        let result = fetch_weather(&new_client()?, &config).await;

        mock.assert();
        assert!(matches!(result, Err(WeatherError::RequestError(e)) if e.status() == Some(reqwest::StatusCode::UNAUTHORIZED)));
        Ok(())
    }
}
