//! Reverse geocoding (Nominatim `reverse` endpoint)

use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::http_client::{build_http_client, response_to_error};

pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org";

/// Address keys checked for a usable place name, most specific first.
const PLACE_KEYS: [&str; 4] = ["city", "town", "village", "county"];

/// Pick the place name out of a reverse-geocoding payload.
pub fn place_name(payload: &Value) -> Option<String> {
    let address = payload.get("address")?;
    PLACE_KEYS
        .iter()
        .filter_map(|key| address.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

/// Reverse geocoding client
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: DEFAULT_GEOCODE_URL.to_string(),
        })
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Resolve coordinates to a city-level place name.
    ///
    /// `Ok(None)` when the provider answers but names no city, town,
    /// village or county.
    pub async fn locate(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        let url = Url::parse_with_params(
            &format!("{}/reverse", self.base_url),
            &[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ],
        )?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(response_to_error(response, "Geocoder").await);
        }

        let payload = response.json::<Value>().await?;
        let name = place_name(&payload);
        tracing::debug!(lat, lon, place = ?name, "Reverse geocoded location");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_place_name_precedence() {
        let payload = json!({"address": {
            "county": "Haveli", "village": "Wagholi", "town": "Lohegaon", "city": "Pune"
        }});
        assert_eq!(place_name(&payload).as_deref(), Some("Pune"));

        let payload = json!({"address": {"county": "Haveli", "village": "Wagholi", "town": "Lohegaon"}});
        assert_eq!(place_name(&payload).as_deref(), Some("Lohegaon"));

        let payload = json!({"address": {"county": "Haveli", "village": "Wagholi"}});
        assert_eq!(place_name(&payload).as_deref(), Some("Wagholi"));

        let payload = json!({"address": {"county": "Haveli", "state": "Maharashtra"}});
        assert_eq!(place_name(&payload).as_deref(), Some("Haveli"));
    }

    #[test]
    fn test_place_name_missing() {
        assert_eq!(place_name(&json!({"error": "Unable to geocode"})), None);
        assert_eq!(place_name(&json!({"address": {"state": "Goa"}})), None);
        assert_eq!(place_name(&json!({"address": {"city": ""}})), None);
    }

    #[tokio::test]
    async fn test_locate_queries_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("format", "json"))
            .and(query_param("lat", "18.52"))
            .and(query_param("lon", "73.85"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"address": {"city": "Pune"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GeocodeClient::new().unwrap().with_base_url(server.uri());
        let name = client.locate(18.52, 73.85).await.unwrap();
        assert_eq!(name.as_deref(), Some("Pune"));
    }

    #[tokio::test]
    async fn test_locate_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = GeocodeClient::new().unwrap().with_base_url(server.uri());
        assert!(client.locate(0.0, 0.0).await.is_err());
    }
}
