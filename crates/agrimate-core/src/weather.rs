//! Weather provider client (OpenWeatherMap current-weather API)

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{GatewayError, Result};
use crate::http_client::{build_http_client, build_http_client_with_timeout, response_to_error};

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Current conditions pulled from a provider payload.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherContext {
    pub description: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_percent: f64,
}

impl WeatherContext {
    /// Extract conditions from a provider payload.
    ///
    /// `None` when `main` or any of its core fields is missing, or when
    /// `weather[0].description` is absent.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let main = payload.get("main")?;
        let description = payload
            .get("weather")?
            .get(0)?
            .get("description")?
            .as_str()?;

        Some(Self {
            description: description.to_string(),
            temperature_c: main.get("temp")?.as_f64()?,
            feels_like_c: main.get("feels_like")?.as_f64()?,
            humidity_percent: main.get("humidity")?.as_f64()?,
        })
    }

    /// One-line summary folded into a prompt.
    pub fn sentence(&self, location: &str) -> String {
        format!(
            "Weather in {}: {}, temp {}°C, feels like {}°C, humidity {}%.",
            location,
            self.description,
            number(self.temperature_c),
            number(self.feels_like_c),
            number(self.humidity_percent),
        )
    }
}

// Integral values print without a fractional part, as they do in JSON.
fn number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

/// Raw provider answer, passed through by the gateway's weather route.
#[derive(Debug, Clone)]
pub struct WeatherReport {
    pub status: u16,
    pub body: Value,
}

/// Weather provider client
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl WeatherClient {
    /// A client with no request deadline.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            api_key: api_key.into(),
            base_url: DEFAULT_WEATHER_URL.to_string(),
        })
    }

    /// A client whose lookups fail once `timeout` has passed.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client_with_timeout(timeout)?,
            api_key: api_key.into(),
            base_url: DEFAULT_WEATHER_URL.to_string(),
        })
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn current_weather_url(&self, city: &str) -> Result<Url> {
        Ok(Url::parse_with_params(
            &format!("{}/weather", self.base_url),
            &[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ],
        )?)
    }

    /// Fetch the provider's JSON for `city` whatever its status.
    pub async fn fetch_report(&self, city: &str) -> Result<WeatherReport> {
        let response = self
            .client
            .get(self.current_weather_url(city)?)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.json::<Value>().await?;

        Ok(WeatherReport { status, body })
    }

    /// Fetch current conditions for `city`.
    pub async fn current(&self, city: &str) -> Result<WeatherContext> {
        let response = self
            .client
            .get(self.current_weather_url(city)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response, "Weather provider").await);
        }

        let payload = response.json::<Value>().await?;
        WeatherContext::from_payload(&payload).ok_or_else(|| {
            GatewayError::InvalidPayload("weather payload is missing main conditions".to_string())
        })
    }
}
