//! Agrimate core - streaming gateway for an agricultural assistant
//!
//! This crate provides:
//! - Ollama generation client with a mockable trait seam
//! - NDJSON relay that extracts text deltas in arrival order
//! - Best-effort weather enrichment of prompts
//! - Reverse geocoding and a mock mandi price book
//! - Word-buffered rendering of streamed answers for clients

pub mod enrich;
pub mod error;
pub mod generation;
pub mod geocode;
mod http_client;
pub mod models;
pub mod prices;
pub mod relay;
pub mod render;
pub mod weather;

use std::sync::Arc;

use tracing::info;

pub use enrich::{ContextEnricher, augment_prompt};
pub use error::{GatewayError, Result};
pub use generation::{ByteStream, GenerationClient, OllamaClient};
pub use geocode::GeocodeClient;
pub use http_client::build_http_client;
pub use models::{ConversationMessage, GenerationRequest, Role, StreamDelta};
pub use prices::{CropPrice, PriceBook, PriceLookup};
pub use relay::{DeltaStream, LineDecoder, relay_deltas};
pub use render::{AskPhase, ChatSession, Transcript, Utf8Decoder, WordBuffer};
pub use weather::{WeatherClient, WeatherContext, WeatherReport};

/// Collaborators shared by every gateway request. Immutable once built.
pub struct GatewayCore {
    pub generator: Arc<dyn GenerationClient>,
    pub weather: WeatherClient,
    pub enricher: ContextEnricher,
    pub prices: PriceBook,
}

impl GatewayCore {
    pub fn new(generator: Arc<dyn GenerationClient>, weather: WeatherClient) -> Self {
        if !weather.has_api_key() {
            tracing::warn!("No weather API key configured; weather lookups will fail");
        }
        info!(model = generator.model(), "Initializing Agrimate gateway");

        Self {
            generator,
            enricher: ContextEnricher::new(weather.clone()),
            weather,
            prices: PriceBook::default(),
        }
    }

    pub fn with_prices(mut self, prices: PriceBook) -> Self {
        self.prices = prices;
        self
    }

    /// Enrich the prompt and open the upstream call.
    ///
    /// Errors here happen before any delta exists; once the stream is
    /// returned, failures arrive as its items.
    pub async fn open_relay(&self, request: &GenerationRequest) -> Result<DeltaStream> {
        request.validate()?;
        let prompt = self.enricher.enrich(request).await;
        let body = self.generator.generate_stream(&prompt).await?;
        Ok(relay_deltas(body))
    }
}
