//! HTTP client for the Agrimate gateway

use agrimate_core::{ByteStream, GatewayError, GenerationRequest, build_http_client};
use futures::TryStreamExt;
use reqwest::{Client, Response, Url};
use serde_json::Value;

pub struct GatewayClient {
    client: Client,
    base_url: String,
}

/// JSON body and status of a lookup route.
#[derive(Debug)]
pub struct Lookup {
    pub status: u16,
    pub body: Value,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> agrimate_core::Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Open `/ask` and hand back the plain-text body as it arrives.
    pub async fn ask(&self, request: &GenerationRequest) -> agrimate_core::Result<ByteStream> {
        let response = self
            .client
            .post(format!("{}/ask", self.base_url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(gateway_error(response).await);
        }

        Ok(Box::pin(
            response.bytes_stream().map_err(GatewayError::from),
        ))
    }

    pub async fn weather(&self, city: &str) -> agrimate_core::Result<Lookup> {
        self.lookup(&["api", "weather", city.trim()]).await
    }

    pub async fn price(&self, crop: &str) -> agrimate_core::Result<Lookup> {
        self.lookup(&["api", "mcps", crop.trim()]).await
    }

    async fn lookup(&self, segments: &[&str]) -> agrimate_core::Result<Lookup> {
        let response = self.client.get(self.route(segments)?).send().await?;
        let status = response.status().as_u16();
        let body = response.json::<Value>().await?;
        Ok(Lookup { status, body })
    }

    // Path segments are percent-encoded, so "Navi Mumbai" stays one segment.
    fn route(&self, segments: &[&str]) -> agrimate_core::Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::InvalidRequest(format!("invalid gateway URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn gateway_error(response: Response) -> GatewayError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text);

    GatewayError::Upstream {
        service: "Gateway".to_string(),
        status,
        message,
    }
}
