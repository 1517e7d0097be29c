//! Best-effort weather context for prompts

use crate::models::GenerationRequest;
use crate::weather::WeatherClient;

/// Append a context sentence to the user's prompt.
pub fn augment_prompt(prompt: &str, context: Option<&str>) -> String {
    match context {
        Some(sentence) => format!("{prompt}\n\nContext: {sentence}"),
        None => prompt.to_string(),
    }
}

/// Folds current weather for the request's location into its prompt.
#[derive(Debug, Clone)]
pub struct ContextEnricher {
    weather: WeatherClient,
}

impl ContextEnricher {
    pub fn new(weather: WeatherClient) -> Self {
        Self { weather }
    }

    /// The weather sentence for `location`, or `None` on any failure.
    pub async fn weather_sentence(&self, location: &str) -> Option<String> {
        match self.weather.current(location).await {
            Ok(context) => Some(context.sentence(location)),
            Err(err) => {
                tracing::warn!(location, error = %err, "Skipping weather enrichment");
                None
            }
        }
    }

    /// The final prompt for generation.
    ///
    /// Failures never surface; the original prompt is returned unchanged.
    pub async fn enrich(&self, request: &GenerationRequest) -> String {
        let Some(location) = request.location() else {
            return request.prompt.clone();
        };

        let sentence = self.weather_sentence(location).await;
        augment_prompt(&request.prompt, sentence.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn enricher_for(server: &MockServer) -> ContextEnricher {
        ContextEnricher::new(
            WeatherClient::new("test-key")
                .unwrap()
                .with_base_url(server.uri()),
        )
    }

    fn request(location: Option<&str>) -> GenerationRequest {
        GenerationRequest::new("Any tips?", location.map(str::to_string)).unwrap()
    }

    #[test]
    fn test_augment_prompt() {
        assert_eq!(augment_prompt("Q", None), "Q");
        assert_eq!(augment_prompt("Q", Some("S")), "Q\n\nContext: S");
    }

    #[tokio::test]
    async fn test_enrich_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Pune"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "main": {"temp": 30, "feels_like": 33, "humidity": 40},
                "weather": [{"description": "clear sky"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prompt = enricher_for(&server).await.enrich(&request(Some("Pune"))).await;

        assert_eq!(
            prompt,
            "Any tips?\n\nContext: Weather in Pune: clear sky, temp 30°C, feels like 33°C, humidity 40%."
        );
    }

    #[tokio::test]
    async fn test_enrich_provider_error_keeps_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let prompt = enricher_for(&server).await.enrich(&request(Some("Pune"))).await;
        assert_eq!(prompt, "Any tips?");
    }

    #[tokio::test]
    async fn test_enrich_missing_main_keeps_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"cod": "404", "message": "city not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let prompt = enricher_for(&server).await.enrich(&request(Some("Pune"))).await;
        assert_eq!(prompt, "Any tips?");
    }

    #[tokio::test]
    async fn test_enrich_without_location_skips_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let enricher = enricher_for(&server).await;
        assert_eq!(enricher.enrich(&request(None)).await, "Any tips?");
        assert_eq!(enricher.enrich(&request(Some("   "))).await, "Any tips?");
    }

    #[tokio::test]
    async fn test_enrich_unreachable_provider_keeps_prompt() {
        let enricher = ContextEnricher::new(
            WeatherClient::new("k")
                .unwrap()
                .with_base_url("http://127.0.0.1:9"),
        );
        assert_eq!(enricher.enrich(&request(Some("Pune"))).await, "Any tips?");
    }
}
