//! Upstream text-generation clients

#[cfg(any(test, feature = "test-utils"))]
mod mock;
mod ollama;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::Result;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockGenerationClient, MockStep};
pub use ollama::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL, OllamaClient};

/// Raw response body of a streaming generation call.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A service that turns a prompt into a newline-delimited JSON byte stream.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Get model name
    fn model(&self) -> &str;

    /// Open one streaming generation call.
    ///
    /// Returns once the service has accepted the request; the body is then
    /// read lazily from the returned stream. There is no deadline and no
    /// abort path: the stream ends when the service closes the connection.
    async fn generate_stream(&self, prompt: &str) -> Result<ByteStream>;
}
