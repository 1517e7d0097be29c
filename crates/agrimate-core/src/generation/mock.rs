//! Deterministic mock generation client for relay tests.

use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

use super::{ByteStream, GenerationClient};
use crate::error::{GatewayError, Result};

/// One scripted piece of a mock response body.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Deliver these bytes as one chunk.
    Chunk(Bytes),
    /// Break the connection mid-body.
    Fail(String),
    /// Wait before the next step.
    Delay(u64),
}

impl MockStep {
    pub fn chunk(bytes: impl Into<Bytes>) -> Self {
        Self::Chunk(bytes.into())
    }

    /// One newline-terminated `{"response": text}` record.
    pub fn record(text: &str) -> Self {
        let mut line = serde_json::json!({ "response": text }).to_string();
        line.push('\n');
        Self::Chunk(Bytes::from(line))
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

/// A mock generation client that replays a scripted body for every call.
#[derive(Debug, Clone)]
pub struct MockGenerationClient {
    model: String,
    steps: Vec<MockStep>,
    unreachable: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerationClient {
    pub fn from_steps(steps: Vec<MockStep>) -> Self {
        Self {
            model: "mock-model".to_string(),
            steps,
            unreachable: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A client whose calls fail before any byte is produced.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::from_steps(Vec::new())
        }
    }

    /// Prompts received so far, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_stream(&self, prompt: &str) -> Result<ByteStream> {
        self.prompts.lock().await.push(prompt.to_string());

        if self.unreachable {
            return Err(GatewayError::Stream("mock connection refused".to_string()));
        }

        let steps = self.steps.clone();
        Ok(Box::pin(stream! {
            for step in steps {
                match step {
                    MockStep::Chunk(bytes) => yield Ok(bytes),
                    MockStep::Fail(message) => {
                        yield Err(GatewayError::Stream(message));
                        return;
                    }
                    MockStep::Delay(ms) => sleep(Duration::from_millis(ms)).await,
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn mock_client_replays_steps_and_records_prompt() {
        let client = MockGenerationClient::from_steps(vec![
            MockStep::chunk("a"),
            MockStep::Delay(1),
            MockStep::chunk("b"),
            MockStep::fail("gone"),
            MockStep::chunk("never"),
        ]);

        let items: Vec<_> = client.generate_stream("ping").await.unwrap().collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), &Bytes::from("a"));
        assert_eq!(items[1].as_ref().unwrap(), &Bytes::from("b"));
        assert!(items[2].is_err());
        assert_eq!(client.prompts().await, vec!["ping".to_string()]);
    }

    #[tokio::test]
    async fn unreachable_mock_fails_on_open() {
        let client = MockGenerationClient::unreachable();
        assert!(client.generate_stream("ping").await.is_err());
    }
}
