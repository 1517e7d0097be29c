pub mod chat;
pub mod lookup;

use agrimate_core::GeocodeClient;

use crate::cli::LocationArgs;

/// Location for weather context: the explicit name, else the place found
/// at the given coordinates. Detection failures leave it unknown.
pub async fn resolve_location(args: &LocationArgs) -> Option<String> {
    if let Some(name) = args.location.as_deref().map(str::trim)
        && !name.is_empty()
    {
        return Some(name.to_string());
    }

    let (lat, lon) = (args.coordinates.lat?, args.coordinates.lon?);
    let geocoder = match GeocodeClient::new() {
        Ok(client) => client.with_base_url(&args.coordinates.geocode_url),
        Err(err) => {
            tracing::warn!(error = %err, "Could not build geocoding client");
            return None;
        }
    };

    match geocoder.locate(lat, lon).await {
        Ok(name) => name,
        Err(err) => {
            tracing::warn!(lat, lon, error = %err, "Location detection failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OptionalCoordinates;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn coordinates(lat: f64, lon: f64, geocode_url: String) -> LocationArgs {
        LocationArgs {
            location: None,
            coordinates: OptionalCoordinates {
                lat: Some(lat),
                lon: Some(lon),
                geocode_url,
            },
        }
    }

    #[tokio::test]
    async fn test_explicit_location_wins() {
        let args = LocationArgs {
            location: Some(" Nagpur ".to_string()),
            ..LocationArgs::default()
        };
        assert_eq!(resolve_location(&args).await.as_deref(), Some("Nagpur"));
    }

    #[tokio::test]
    async fn test_no_location_and_no_coordinates() {
        assert_eq!(resolve_location(&LocationArgs::default()).await, None);
    }

    #[tokio::test]
    async fn test_coordinates_are_reverse_geocoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"address": {"village": "Ralegan Siddhi", "county": "Parner"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let args = coordinates(19.0, 74.4, server.uri());
        assert_eq!(
            resolve_location(&args).await.as_deref(),
            Some("Ralegan Siddhi")
        );
    }

    #[tokio::test]
    async fn test_geocoding_failure_leaves_location_unknown() {
        let args = coordinates(19.0, 74.4, "http://127.0.0.1:9".to_string());
        assert_eq!(resolve_location(&args).await, None);
    }
}
